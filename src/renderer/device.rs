// renderer/device.rs
//! The stateful immediate-mode device the state caches sit in front of.
//!
//! Every method that changes device state is a single "state-transition
//! call".  The pass and texture-layer caches exist to keep the number of
//! these calls to a minimum, so implementations should forward them to the
//! driver without any caching of their own.

use glam::{Mat4, Vec4};
use thiserror::Error;
use wgpu::{
    AddressMode, BlendFactor, CompareFunction, FilterMode, PolygonMode, PrimitiveTopology,
    StencilOperation, TextureDimension,
};

use crate::renderer::buffer::{IndexRange, IndexType, VertexRange};
use crate::renderer::layer::CombineMode;
use crate::renderer::lights::Light;
use crate::renderer::pass::CullMode;
use crate::renderer::texture::MinFilter;
use crate::renderer::vertex::VertexFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BufferId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

/// Boolean device capabilities toggled by the state caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    CullFace,
    Lighting,
    Blend,
    DepthTest,
    StencilTest,
    ScissorTest,
    /// Texturing for the given target on the active texture unit.
    Texture(TextureDimension),
    /// Sphere-map texture coordinate generation on the active texture unit.
    SphereMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialColor {
    Ambient,
    Diffuse,
    Specular,
}

/// Per-object sampling state, applied to the texture bound on the active unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureParameter {
    MinFilter(MinFilter),
    MagFilter(FilterMode),
    AddressMode(AddressMode),
}

/// Error reported by the device's error query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("invalid enum")]
    InvalidEnum,
    #[error("invalid value")]
    InvalidValue,
    #[error("invalid operation")]
    InvalidOperation,
    #[error("out of memory")]
    OutOfMemory,
    #[error("{0}")]
    Other(String),
}

/// A rectangle of canvas pixels, origin at the bottom left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the rectangle covers a whole canvas of the given size.
    pub fn covers(&self, (width, height): (u32, u32)) -> bool {
        self.x == 0 && self.y == 0 && self.width >= width && self.height >= height
    }
}

pub struct TextureDescriptor<'a> {
    pub label: &'a str,
    pub dimension: TextureDimension,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub mip_level_count: u32,
    /// Tightly packed RGBA8 texels for the base level.
    pub texels: &'a [u8],
}

pub trait Device {
    /// Number of texture units the device exposes.
    fn texture_unit_count(&self) -> u32;

    /// Physical size, in pixels, of the current canvas.
    fn canvas_size(&self) -> (u32, u32);

    /// Returns and clears the oldest pending device error, if any.
    fn take_error(&mut self) -> Option<DeviceError>;

    fn set_capability(&mut self, capability: Capability, enabled: bool);
    fn cull_face(&mut self, mode: CullMode);
    fn blend_func(&mut self, src: BlendFactor, dst: BlendFactor);
    fn polygon_mode(&mut self, mode: PolygonMode);
    fn line_width(&mut self, width: f32);
    fn depth_mask(&mut self, enabled: bool);
    fn depth_func(&mut self, function: CompareFunction);
    fn stencil_func(&mut self, function: CompareFunction, reference: u32, mask: u32);
    fn stencil_op(
        &mut self,
        stencil_failed: StencilOperation,
        depth_failed: StencilOperation,
        depth_passed: StencilOperation,
    );
    fn color_mask(&mut self, enabled: bool);
    fn material_color(&mut self, slot: MaterialColor, color: Vec4);
    fn shininess(&mut self, value: f32);
    /// Vertex color used when lighting is disabled.
    fn flat_color(&mut self, color: Vec4);
    /// Binds a program, or the fixed-function pipeline for `None`.
    fn use_program(&mut self, program: Option<ProgramId>);
    /// Points a sampler uniform of `program` at a texture unit.
    fn set_sampler(&mut self, program: ProgramId, location: u32, unit: u32);

    fn active_texture_unit(&mut self, unit: u32);
    fn bind_texture(&mut self, dimension: TextureDimension, texture: TextureId);
    fn combine_mode(&mut self, mode: CombineMode);
    fn combine_color(&mut self, color: Vec4);
    fn texture_parameter(&mut self, dimension: TextureDimension, parameter: TextureParameter);

    /// Creates a texture object.  Must leave every piece of bound state
    /// (active unit, per-unit bindings) untouched.
    fn create_texture(&mut self, descriptor: &TextureDescriptor<'_>)
        -> Result<TextureId, DeviceError>;
    fn create_vertex_buffer(
        &mut self,
        count: u32,
        format: &VertexFormat,
    ) -> Result<BufferId, DeviceError>;
    fn create_index_buffer(
        &mut self,
        count: u32,
        index_type: IndexType,
    ) -> Result<BufferId, DeviceError>;
    fn write_buffer(&mut self, buffer: BufferId, byte_offset: u64, data: &[u8]);

    /// Clears are subject to the color, depth and stencil write masks.
    fn clear_color(&mut self, color: Vec4);
    fn clear_depth(&mut self, depth: f32);
    fn clear_stencil(&mut self, value: u32);
    fn viewport(&mut self, area: Rect);
    fn scissor(&mut self, area: Rect);

    fn set_projection(&mut self, matrix: Mat4);
    fn push_transform(&mut self, matrix: Mat4);
    fn pop_transform(&mut self);
    /// Enables the light in `slot` with the given parameters, or disables it.
    fn set_light(&mut self, slot: u32, light: Option<&Light>);

    fn draw(&mut self, mode: PrimitiveTopology, vertices: &VertexRange);
    fn draw_indexed(&mut self, mode: PrimitiveTopology, vertices: &VertexRange, indices: &IndexRange);
}
