pub mod buffer;
pub mod camera;
pub mod device;
pub mod immediate;
pub mod layer;
pub mod lights;
pub mod pass;
pub mod pool;
pub mod program;
pub mod queue;
pub mod recording;
#[allow(clippy::module_inception)]
pub mod renderer;
pub mod stage;
pub mod state;
pub mod stats;
pub mod style;
pub mod texture;
pub mod vertex;

pub use buffer::{IndexRange, IndexType, VertexRange};
pub use camera::Camera;
pub use device::{
    BufferId, Capability, Device, DeviceError, MaterialColor, ProgramId, Rect, TextureDescriptor,
    TextureId, TextureParameter,
};
pub use immediate::Rectangle;
pub use layer::{CombineMode, LayerState, TextureLayer, TextureStack};
pub use lights::{Light, LightKind};
pub use pass::{CullMode, PassState, RenderPass};
pub use pool::{SlotInfo, TransientBufferPool};
pub use program::{ProgramRef, SamplerType, ShaderProgram};
pub use queue::{RenderOperation, RenderQueue};
pub use recording::{DeviceCall, RecordingDevice};
pub use renderer::Renderer;
pub use stage::{GroupStage, RenderStage, RenderStageStack};
pub use state::{DeviceStateTracker, UnitCache};
pub use stats::{FrameStats, RenderStats};
pub use style::RenderStyle;
pub use texture::{MinFilter, SamplerCache, Texture, TextureFlags};
pub use vertex::{ColorVertex, Vertex, Vertex2D, VertexFormat};
