// renderer/recording.rs
//! A [`Device`] that records every call instead of driving hardware.
//!
//! Used by the tests to assert on exact state traffic, and handy for
//! inspecting what a frame actually sends to the driver.

use std::collections::VecDeque;

use glam::{Mat4, Vec4};
use wgpu::{
    BlendFactor, CompareFunction, PolygonMode, PrimitiveTopology, StencilOperation,
    TextureDimension,
};

use crate::renderer::buffer::{IndexRange, IndexType, VertexRange};
use crate::renderer::device::{
    BufferId, Capability, Device, DeviceError, MaterialColor, ProgramId, Rect, TextureDescriptor,
    TextureId, TextureParameter,
};
use crate::renderer::layer::CombineMode;
use crate::renderer::lights::Light;
use crate::renderer::pass::CullMode;
use crate::renderer::vertex::VertexFormat;

#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    SetCapability(Capability, bool),
    CullFace(CullMode),
    BlendFunc(BlendFactor, BlendFactor),
    PolygonMode(PolygonMode),
    LineWidth(f32),
    DepthMask(bool),
    DepthFunc(CompareFunction),
    StencilFunc(CompareFunction, u32, u32),
    StencilOp(StencilOperation, StencilOperation, StencilOperation),
    ColorMask(bool),
    MaterialColor(MaterialColor, Vec4),
    Shininess(f32),
    FlatColor(Vec4),
    UseProgram(Option<ProgramId>),
    SetSampler {
        program: ProgramId,
        location: u32,
        unit: u32,
    },
    ActiveTextureUnit(u32),
    BindTexture(TextureDimension, TextureId),
    CombineMode(CombineMode),
    CombineColor(Vec4),
    TextureParameter(TextureDimension, TextureParameter),
    CreateTexture {
        id: TextureId,
        dimension: TextureDimension,
        mip_level_count: u32,
    },
    CreateVertexBuffer {
        id: BufferId,
        count: u32,
    },
    CreateIndexBuffer {
        id: BufferId,
        count: u32,
        index_type: IndexType,
    },
    WriteBuffer {
        buffer: BufferId,
        byte_offset: u64,
        len: usize,
    },
    ClearColor(Vec4),
    ClearDepth(f32),
    ClearStencil(u32),
    Viewport(Rect),
    Scissor(Rect),
    SetProjection(Mat4),
    PushTransform(Mat4),
    PopTransform,
    SetLight(u32, bool),
    Draw(PrimitiveTopology, VertexRange),
    DrawIndexed(PrimitiveTopology, VertexRange, IndexRange),
}

impl DeviceCall {
    /// Whether this call changes render state, as opposed to creating
    /// resources, uploading data, clearing buffers, or drawing.
    pub fn is_state_change(&self) -> bool {
        !matches!(
            self,
            DeviceCall::CreateTexture { .. }
                | DeviceCall::CreateVertexBuffer { .. }
                | DeviceCall::CreateIndexBuffer { .. }
                | DeviceCall::WriteBuffer { .. }
                | DeviceCall::ClearColor(_)
                | DeviceCall::ClearDepth(_)
                | DeviceCall::ClearStencil(_)
                | DeviceCall::Draw(..)
                | DeviceCall::DrawIndexed(..)
        )
    }
}

pub struct RecordingDevice {
    calls: Vec<DeviceCall>,
    unit_count: u32,
    canvas_size: (u32, u32),
    errors: VecDeque<DeviceError>,
    fail_buffer_creation: bool,
    next_id: u32,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            unit_count: 4,
            canvas_size: (800, 600),
            errors: VecDeque::new(),
            fail_buffer_creation: false,
            next_id: 1,
        }
    }

    pub fn with_unit_count(mut self, unit_count: u32) -> Self {
        self.unit_count = unit_count;
        self
    }

    pub fn with_canvas_size(mut self, width: u32, height: u32) -> Self {
        self.canvas_size = (width, height);
        self
    }

    pub fn calls(&self) -> &[DeviceCall] {
        &self.calls
    }

    /// Returns the calls recorded so far and starts a fresh trace.
    pub fn take_calls(&mut self) -> Vec<DeviceCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    /// Queues an error for the next [`Device::take_error`].
    pub fn push_error(&mut self, error: DeviceError) {
        self.errors.push_back(error);
    }

    /// Makes every following buffer creation fail with `OutOfMemory`.
    pub fn set_buffer_creation_failing(&mut self, failing: bool) {
        self.fail_buffer_creation = failing;
    }

    /// Simulates a recreated context with a different unit count.
    pub fn set_unit_count(&mut self, unit_count: u32) {
        self.unit_count = unit_count;
    }

    fn record(&mut self, call: DeviceCall) {
        log::trace!("device: {:?}", call);
        self.calls.push(call);
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl Default for RecordingDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl Device for RecordingDevice {
    fn texture_unit_count(&self) -> u32 {
        self.unit_count
    }

    fn canvas_size(&self) -> (u32, u32) {
        self.canvas_size
    }

    fn take_error(&mut self) -> Option<DeviceError> {
        self.errors.pop_front()
    }

    fn set_capability(&mut self, capability: Capability, enabled: bool) {
        self.record(DeviceCall::SetCapability(capability, enabled));
    }

    fn cull_face(&mut self, mode: CullMode) {
        self.record(DeviceCall::CullFace(mode));
    }

    fn blend_func(&mut self, src: BlendFactor, dst: BlendFactor) {
        self.record(DeviceCall::BlendFunc(src, dst));
    }

    fn polygon_mode(&mut self, mode: PolygonMode) {
        self.record(DeviceCall::PolygonMode(mode));
    }

    fn line_width(&mut self, width: f32) {
        self.record(DeviceCall::LineWidth(width));
    }

    fn depth_mask(&mut self, enabled: bool) {
        self.record(DeviceCall::DepthMask(enabled));
    }

    fn depth_func(&mut self, function: CompareFunction) {
        self.record(DeviceCall::DepthFunc(function));
    }

    fn stencil_func(&mut self, function: CompareFunction, reference: u32, mask: u32) {
        self.record(DeviceCall::StencilFunc(function, reference, mask));
    }

    fn stencil_op(
        &mut self,
        stencil_failed: StencilOperation,
        depth_failed: StencilOperation,
        depth_passed: StencilOperation,
    ) {
        self.record(DeviceCall::StencilOp(
            stencil_failed,
            depth_failed,
            depth_passed,
        ));
    }

    fn color_mask(&mut self, enabled: bool) {
        self.record(DeviceCall::ColorMask(enabled));
    }

    fn material_color(&mut self, slot: MaterialColor, color: Vec4) {
        self.record(DeviceCall::MaterialColor(slot, color));
    }

    fn shininess(&mut self, value: f32) {
        self.record(DeviceCall::Shininess(value));
    }

    fn flat_color(&mut self, color: Vec4) {
        self.record(DeviceCall::FlatColor(color));
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        self.record(DeviceCall::UseProgram(program));
    }

    fn set_sampler(&mut self, program: ProgramId, location: u32, unit: u32) {
        self.record(DeviceCall::SetSampler {
            program,
            location,
            unit,
        });
    }

    fn active_texture_unit(&mut self, unit: u32) {
        self.record(DeviceCall::ActiveTextureUnit(unit));
    }

    fn bind_texture(&mut self, dimension: TextureDimension, texture: TextureId) {
        self.record(DeviceCall::BindTexture(dimension, texture));
    }

    fn combine_mode(&mut self, mode: CombineMode) {
        self.record(DeviceCall::CombineMode(mode));
    }

    fn combine_color(&mut self, color: Vec4) {
        self.record(DeviceCall::CombineColor(color));
    }

    fn texture_parameter(&mut self, dimension: TextureDimension, parameter: TextureParameter) {
        self.record(DeviceCall::TextureParameter(dimension, parameter));
    }

    fn create_texture(
        &mut self,
        descriptor: &TextureDescriptor<'_>,
    ) -> Result<TextureId, DeviceError> {
        let id = TextureId(self.allocate_id());
        self.record(DeviceCall::CreateTexture {
            id,
            dimension: descriptor.dimension,
            mip_level_count: descriptor.mip_level_count,
        });
        Ok(id)
    }

    fn create_vertex_buffer(
        &mut self,
        count: u32,
        _format: &VertexFormat,
    ) -> Result<BufferId, DeviceError> {
        if self.fail_buffer_creation {
            return Err(DeviceError::OutOfMemory);
        }
        let id = BufferId(self.allocate_id());
        self.record(DeviceCall::CreateVertexBuffer { id, count });
        Ok(id)
    }

    fn create_index_buffer(
        &mut self,
        count: u32,
        index_type: IndexType,
    ) -> Result<BufferId, DeviceError> {
        if self.fail_buffer_creation {
            return Err(DeviceError::OutOfMemory);
        }
        let id = BufferId(self.allocate_id());
        self.record(DeviceCall::CreateIndexBuffer {
            id,
            count,
            index_type,
        });
        Ok(id)
    }

    fn write_buffer(&mut self, buffer: BufferId, byte_offset: u64, data: &[u8]) {
        self.record(DeviceCall::WriteBuffer {
            buffer,
            byte_offset,
            len: data.len(),
        });
    }

    fn clear_color(&mut self, color: Vec4) {
        self.record(DeviceCall::ClearColor(color));
    }

    fn clear_depth(&mut self, depth: f32) {
        self.record(DeviceCall::ClearDepth(depth));
    }

    fn clear_stencil(&mut self, value: u32) {
        self.record(DeviceCall::ClearStencil(value));
    }

    fn viewport(&mut self, area: Rect) {
        self.record(DeviceCall::Viewport(area));
    }

    fn scissor(&mut self, area: Rect) {
        self.record(DeviceCall::Scissor(area));
    }

    fn set_projection(&mut self, matrix: Mat4) {
        self.record(DeviceCall::SetProjection(matrix));
    }

    fn push_transform(&mut self, matrix: Mat4) {
        self.record(DeviceCall::PushTransform(matrix));
    }

    fn pop_transform(&mut self) {
        self.record(DeviceCall::PopTransform);
    }

    fn set_light(&mut self, slot: u32, light: Option<&Light>) {
        self.record(DeviceCall::SetLight(slot, light.is_some()));
    }

    fn draw(&mut self, mode: PrimitiveTopology, vertices: &VertexRange) {
        self.record(DeviceCall::Draw(mode, *vertices));
    }

    fn draw_indexed(
        &mut self,
        mode: PrimitiveTopology,
        vertices: &VertexRange,
        indices: &IndexRange,
    ) {
        self.record(DeviceCall::DrawIndexed(mode, *vertices, *indices));
    }
}
