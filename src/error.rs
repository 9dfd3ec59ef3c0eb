use thiserror::Error;

use crate::renderer::device::{BufferId, DeviceError};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    #[error("failed to create {kind} buffer for {count} elements: {source}")]
    BufferCreation {
        kind: &'static str,
        count: u32,
        #[source]
        source: DeviceError,
    },

    #[error("failed to create texture {name}: {source}")]
    TextureCreation {
        name: String,
        #[source]
        source: DeviceError,
    },

    #[error("begin_frame called while a frame is already in progress")]
    FrameAlreadyBegun,

    #[error("finish_frame called without a frame in progress")]
    NoFrameInProgress,

    #[error("index elements are {actual} bytes, the range holds {expected}-byte indices")]
    IndexSizeMismatch { expected: u64, actual: u64 },

    #[error("vertex elements are {actual} bytes, the range holds {expected}-byte vertices")]
    VertexSizeMismatch { expected: u64, actual: u64 },

    #[error("buffer {0:?} was not allocated from the transient pool")]
    ForeignRange(BufferId),

    #[error("end called without a matching begin_2d or begin_3d")]
    NoProjectionScope,

    #[error("{count} elements do not fit in a range of {capacity}")]
    RangeOverflow { count: u32, capacity: u32 },
}
