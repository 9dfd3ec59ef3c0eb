// renderer/buffer.rs
use crate::renderer::device::BufferId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexType {
    #[default]
    U8,
    U16,
    U32,
}

impl IndexType {
    pub const fn size(self) -> u64 {
        match self {
            IndexType::U8 => 1,
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }
}

/// A window of `count` vertices starting at `start` in a vertex buffer.
///
/// Ranges handed out by the transient pool are only valid until the end of
/// the frame they were allocated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VertexRange {
    pub buffer: BufferId,
    pub start: u32,
    pub count: u32,
}

impl VertexRange {
    pub fn new(buffer: BufferId, start: u32, count: u32) -> Self {
        Self {
            buffer,
            start,
            count,
        }
    }

    /// One past the last vertex in the range.
    pub fn end(&self) -> u32 {
        self.start + self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IndexRange {
    pub buffer: BufferId,
    pub index_type: IndexType,
    pub start: u32,
    pub count: u32,
}

impl IndexRange {
    pub fn new(buffer: BufferId, index_type: IndexType, start: u32, count: u32) -> Self {
        Self {
            buffer,
            index_type,
            start,
            count,
        }
    }

    pub fn end(&self) -> u32 {
        self.start + self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}
