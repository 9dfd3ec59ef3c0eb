// renderer/pool.rs
//! Per-frame bump allocator over reusable vertex and index buffers.
//!
//! Each slot owns one device buffer and hands out consecutive ranges of it
//! until it runs out.  Nothing is ever freed individually: `reset` at the end
//! of the frame makes every slot fully available again.  Ranges must not be
//! used after the reset that follows their allocation.

use crate::error::RenderError;
use crate::renderer::buffer::{IndexRange, IndexType, VertexRange};
use crate::renderer::device::{BufferId, Device};
use crate::renderer::vertex::VertexFormat;

pub const DEFAULT_SLOT_SIZE: u32 = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotInfo {
    pub buffer: BufferId,
    pub capacity: u32,
    pub available: u32,
}

#[derive(Debug)]
struct Slot<K> {
    buffer: BufferId,
    key: K,
    capacity: u32,
    available: u32,
}

impl<K: PartialEq> Slot<K> {
    fn fits(&self, key: &K, count: u32) -> bool {
        self.key == *key && self.available >= count
    }

    /// Takes `count` elements from the unused tail and returns the start.
    fn carve(&mut self, count: u32) -> u32 {
        let start = self.capacity - self.available;
        self.available -= count;
        start
    }

    fn info(&self) -> SlotInfo {
        SlotInfo {
            buffer: self.buffer,
            capacity: self.capacity,
            available: self.available,
        }
    }
}

#[derive(Debug)]
pub struct TransientBufferPool {
    slot_size: u32,
    vertex_slots: Vec<Slot<VertexFormat>>,
    index_slots: Vec<Slot<IndexType>>,
}

impl TransientBufferPool {
    pub fn new(slot_size: u32) -> Self {
        Self {
            slot_size: slot_size.max(1),
            vertex_slots: Vec::new(),
            index_slots: Vec::new(),
        }
    }

    pub fn allocate_vertices<D: Device>(
        &mut self,
        device: &mut D,
        count: u32,
        format: &VertexFormat,
    ) -> Result<VertexRange, RenderError> {
        if let Some(slot) = self
            .vertex_slots
            .iter_mut()
            .find(|slot| slot.fits(format, count))
        {
            let start = slot.carve(count);
            return Ok(VertexRange::new(slot.buffer, start, count));
        }

        let capacity = self.slot_size.max(count);
        let buffer = device
            .create_vertex_buffer(capacity, format)
            .map_err(|source| RenderError::BufferCreation {
                kind: "vertex",
                count: capacity,
                source,
            })?;
        log::info!(
            "Created transient vertex buffer for {} vertices of stride {}",
            capacity,
            format.stride()
        );

        let mut slot = Slot {
            buffer,
            key: format.clone(),
            capacity,
            available: capacity,
        };
        let start = slot.carve(count);
        self.vertex_slots.push(slot);
        Ok(VertexRange::new(buffer, start, count))
    }

    pub fn allocate_indices<D: Device>(
        &mut self,
        device: &mut D,
        count: u32,
        index_type: IndexType,
    ) -> Result<IndexRange, RenderError> {
        if let Some(slot) = self
            .index_slots
            .iter_mut()
            .find(|slot| slot.fits(&index_type, count))
        {
            let start = slot.carve(count);
            return Ok(IndexRange::new(slot.buffer, index_type, start, count));
        }

        let capacity = self.slot_size.max(count);
        let buffer = device
            .create_index_buffer(capacity, index_type)
            .map_err(|source| RenderError::BufferCreation {
                kind: "index",
                count: capacity,
                source,
            })?;
        log::info!(
            "Created transient index buffer for {} {:?} indices",
            capacity,
            index_type
        );

        let mut slot = Slot {
            buffer,
            key: index_type,
            capacity,
            available: capacity,
        };
        let start = slot.carve(count);
        self.index_slots.push(slot);
        Ok(IndexRange::new(buffer, index_type, start, count))
    }

    /// Makes every slot fully available again.
    pub fn reset(&mut self) {
        for slot in &mut self.vertex_slots {
            slot.available = slot.capacity;
        }
        for slot in &mut self.index_slots {
            slot.available = slot.capacity;
        }
    }

    pub fn slot_size(&self) -> u32 {
        self.slot_size
    }

    pub fn vertex_slot_count(&self) -> usize {
        self.vertex_slots.len()
    }

    pub fn index_slot_count(&self) -> usize {
        self.index_slots.len()
    }

    pub fn vertex_slots(&self) -> impl Iterator<Item = SlotInfo> + '_ {
        self.vertex_slots.iter().map(Slot::info)
    }

    pub fn index_slots(&self) -> impl Iterator<Item = SlotInfo> + '_ {
        self.index_slots.iter().map(Slot::info)
    }

    /// Vertex format the slot holding `buffer` was created for.
    pub fn vertex_format(&self, buffer: BufferId) -> Option<&VertexFormat> {
        self.vertex_slots
            .iter()
            .find(|slot| slot.buffer == buffer)
            .map(|slot| &slot.key)
    }

    /// Slot holding `buffer`, if it belongs to this pool.
    pub fn slot_for(&self, buffer: BufferId) -> Option<SlotInfo> {
        self.vertex_slots
            .iter()
            .map(Slot::info)
            .chain(self.index_slots.iter().map(Slot::info))
            .find(|info| info.buffer == buffer)
    }
}

impl Default for TransientBufferPool {
    fn default() -> Self {
        Self::new(DEFAULT_SLOT_SIZE)
    }
}
