// renderer/renderer.rs
use bytemuck::Pod;
use glam::Mat4;
use wgpu::{PrimitiveTopology, TextureDimension};

use crate::asset::{Handle, ResourceCache};
use crate::error::RenderError;
use crate::renderer::buffer::{IndexRange, IndexType, VertexRange};
use crate::renderer::device::{Device, DeviceError, Rect, TextureDescriptor};
use crate::renderer::pass::{CullMode, RenderPass};
use crate::renderer::pool::TransientBufferPool;
use crate::renderer::program::{ProgramRef, ShaderProgram};
use crate::renderer::queue::RenderOperation;
use crate::renderer::state::DeviceStateTracker;
use crate::renderer::stats::RenderStats;
use crate::renderer::style::RenderStyle;
use crate::renderer::texture::{checker_texels, SamplerCache, Texture, TextureFlags};
use crate::renderer::vertex::VertexFormat;
use crate::settings::RenderSettings;

pub const DEFAULT_TEXTURE_NAME: &str = "default";

const DEFAULT_BASE_COLOR: [u8; 4] = [255, 0, 255, 255];
const DEFAULT_CHECKER_COLOR: [u8; 4] = [0, 255, 0, 255];

/// Owns the device and everything that has to agree with it: the state
/// tracker, textures and programs, the transient buffer pool and the stats.
pub struct Renderer<D: Device> {
    pub(crate) device: D,
    pub(crate) tracker: DeviceStateTracker,
    pub(crate) textures: ResourceCache<Texture>,
    pub(crate) programs: ResourceCache<ShaderProgram>,
    pool: TransientBufferPool,
    stats: RenderStats,
    settings: RenderSettings,
    in_frame: bool,
    default_texture: Handle<Texture>,
    default_style: RenderStyle,
    pub(crate) immediate_pass: RenderPass,
    pub(crate) projection: Mat4,
    pub(crate) projection_stack: Vec<Mat4>,
    pub(crate) viewport_area: Rect,
    pub(crate) scissor_area: Rect,
}

impl<D: Device> Renderer<D> {
    pub fn new(mut device: D, settings: RenderSettings) -> Result<Self, RenderError> {
        let settings = settings.validate();
        let tracker = DeviceStateTracker::for_device(&device, settings.max_texture_units);
        log::info!(
            "Creating renderer with {} texture units",
            tracker.unit_count()
        );

        let mut textures = ResourceCache::default();
        let mut stats = RenderStats::new(settings.stats_window);
        let default_texture = Self::upload_texture(
            &mut device,
            &mut textures,
            DEFAULT_TEXTURE_NAME,
            TextureDimension::D2,
            (2, 2, 1),
            TextureFlags::default(),
            &checker_texels(2, DEFAULT_BASE_COLOR, DEFAULT_CHECKER_COLOR),
        )?;
        stats.add_texture();

        let mut default_style = RenderStyle::new("default");
        let pass = default_style.create_pass("");
        pass.set_cull_mode(CullMode::None);
        pass.create_texture_layer()
            .set_texture(Some(default_texture))
            .set_sphere_mapped(true);

        let (width, height) = device.canvas_size();
        let canvas_area = Rect::new(0, 0, width, height);

        Ok(Self {
            device,
            tracker,
            textures,
            programs: ResourceCache::default(),
            pool: TransientBufferPool::new(settings.transient_slot_size),
            stats,
            settings,
            in_frame: false,
            default_texture,
            default_style,
            immediate_pass: RenderPass::new(""),
            projection: Mat4::IDENTITY,
            projection_stack: Vec::new(),
            viewport_area: canvas_area,
            scissor_area: canvas_area,
        })
    }

    pub fn begin_frame(&mut self) -> Result<(), RenderError> {
        if self.in_frame {
            return Err(RenderError::FrameAlreadyBegun);
        }
        self.in_frame = true;
        Ok(())
    }

    /// Ends the frame: every transient range handed out since the last
    /// finish becomes invalid and the pool is reused from the start.
    pub fn finish_frame(&mut self) -> Result<(), RenderError> {
        if !self.in_frame {
            return Err(RenderError::NoFrameInProgress);
        }
        self.in_frame = false;
        self.pool.reset();
        self.stats.add_frame();
        Ok(())
    }

    pub fn is_in_frame(&self) -> bool {
        self.in_frame
    }

    /// Forgets all tracked device state.  Call after the device context has
    /// been recreated or after state was changed without going through the
    /// renderer; the next pass applied forces its full state.
    pub fn invalidate_state(&mut self) {
        let unit_count =
            DeviceStateTracker::query_unit_count(&self.device, self.settings.max_texture_units);
        self.tracker.invalidate(unit_count);
        for texture in self.textures.iter_mut() {
            texture.sampler = SamplerCache::UNKNOWN;
        }
        log::info!(
            "Invalidated device state cache ({} texture units)",
            unit_count
        );
    }

    /// Creates a texture from tightly packed RGBA8 texels.
    pub fn create_texture(
        &mut self,
        name: &str,
        dimension: TextureDimension,
        size: (u32, u32, u32),
        flags: TextureFlags,
        texels: &[u8],
    ) -> Result<Handle<Texture>, RenderError> {
        let handle = Self::upload_texture(
            &mut self.device,
            &mut self.textures,
            name,
            dimension,
            size,
            flags,
            texels,
        )?;
        self.stats.add_texture();
        Ok(handle)
    }

    fn upload_texture(
        device: &mut D,
        textures: &mut ResourceCache<Texture>,
        name: &str,
        dimension: TextureDimension,
        (width, height, depth): (u32, u32, u32),
        flags: TextureFlags,
        texels: &[u8],
    ) -> Result<Handle<Texture>, RenderError> {
        let expected = width as u64 * height as u64 * depth as u64 * 4;
        if texels.len() as u64 != expected || expected == 0 {
            log::error!(
                "Texture {} has {} bytes of texels, expected {}",
                name,
                texels.len(),
                expected
            );
            return Err(RenderError::TextureCreation {
                name: name.to_owned(),
                source: DeviceError::InvalidValue,
            });
        }

        let size = (width, height, depth);
        let id = device
            .create_texture(&TextureDescriptor {
                label: name,
                dimension,
                width,
                height,
                depth,
                mip_level_count: Texture::mip_levels_for(flags, size),
                texels,
            })
            .map_err(|source| RenderError::TextureCreation {
                name: name.to_owned(),
                source,
            })?;

        let texture = Texture::new(id, name, dimension, size, flags);
        Ok(textures.insert(name, texture))
    }

    pub fn add_program(&mut self, program: ShaderProgram) -> Handle<ShaderProgram> {
        let name = program.name().to_owned();
        self.stats.add_program();
        self.programs.insert(&name, program)
    }

    pub fn find_texture(&self, name: &str) -> Option<Handle<Texture>> {
        self.textures.find(name)
    }

    pub fn find_program(&self, name: &str) -> Option<Handle<ShaderProgram>> {
        self.programs.find(name)
    }

    pub fn texture(&self, handle: Handle<Texture>) -> Option<&Texture> {
        self.textures.get(handle)
    }

    pub fn program(&self, handle: Handle<ShaderProgram>) -> Option<&ShaderProgram> {
        self.programs.get(handle)
    }

    /// Resolves a program name for a pass.  The empty name is the
    /// fixed-function pipeline.
    pub fn resolve_program(&self, name: &str) -> ProgramRef {
        ProgramRef::resolve(name, &self.programs)
    }

    pub fn allocate_vertices(
        &mut self,
        count: u32,
        format: &VertexFormat,
    ) -> Result<VertexRange, RenderError> {
        self.pool.allocate_vertices(&mut self.device, count, format)
    }

    pub fn allocate_indices(
        &mut self,
        count: u32,
        index_type: IndexType,
    ) -> Result<IndexRange, RenderError> {
        self.pool.allocate_indices(&mut self.device, count, index_type)
    }

    /// Uploads vertices to the start of `range`.  `T` must match the vertex
    /// format the range was allocated with in size.
    pub fn write_vertices<T: Pod>(
        &mut self,
        range: &VertexRange,
        vertices: &[T],
    ) -> Result<(), RenderError> {
        let stride = self
            .pool
            .vertex_format(range.buffer)
            .ok_or(RenderError::ForeignRange(range.buffer))?
            .stride();
        let element_size = std::mem::size_of::<T>() as u64;
        if element_size != stride {
            return Err(RenderError::VertexSizeMismatch {
                expected: stride,
                actual: element_size,
            });
        }

        let count = vertices.len() as u32;
        if count > range.count {
            return Err(RenderError::RangeOverflow {
                count,
                capacity: range.count,
            });
        }

        self.device.write_buffer(
            range.buffer,
            range.start as u64 * stride,
            bytemuck::cast_slice(vertices),
        );
        Ok(())
    }

    /// Uploads indices to the start of `range`.  `T` must match the range's
    /// index type in size.
    pub fn write_indices<T: Pod>(
        &mut self,
        range: &IndexRange,
        indices: &[T],
    ) -> Result<(), RenderError> {
        let stride = std::mem::size_of::<T>() as u64;
        if stride != range.index_type.size() {
            return Err(RenderError::IndexSizeMismatch {
                expected: range.index_type.size(),
                actual: stride,
            });
        }

        let count = indices.len() as u32;
        if count > range.count {
            return Err(RenderError::RangeOverflow {
                count,
                capacity: range.count,
            });
        }

        self.device.write_buffer(
            range.buffer,
            range.start as u64 * stride,
            bytemuck::cast_slice(indices),
        );
        Ok(())
    }

    /// Style used for geometry that has none of its own: unculled, with the
    /// default checker texture sphere-mapped on unit 0.
    pub fn default_style(&self) -> &RenderStyle {
        &self.default_style
    }

    pub fn default_texture(&self) -> Handle<Texture> {
        self.default_texture
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Direct device access.  State changed through this reference is
    /// invisible to the tracker; follow such changes with
    /// [`invalidate_state`](Self::invalidate_state).
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn tracker(&self) -> &DeviceStateTracker {
        &self.tracker
    }

    pub fn stats(&self) -> &RenderStats {
        &self.stats
    }

    pub fn pool(&self) -> &TransientBufferPool {
        &self.pool
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Sends `projection` and records it as the current projection.
    pub fn set_projection(&mut self, projection: Mat4) {
        self.projection = projection;
        self.device.set_projection(projection);
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub(crate) fn report_device_errors(&mut self, context: &str) {
        if !self.settings.check_errors {
            return;
        }
        while let Some(error) = self.device.take_error() {
            log::warn!("Error when {}: {}", context, error);
        }
    }

    pub(crate) fn count_operation(&mut self) {
        self.stats.add_operation();
    }

    /// Issues the draw for one pass of `operation`.
    pub(crate) fn draw_operation(&mut self, operation: &RenderOperation<'_>) {
        match &operation.indices {
            Some(indices) => {
                self.device
                    .draw_indexed(operation.render_mode, &operation.vertices, indices)
            }
            None => self.device.draw(operation.render_mode, &operation.vertices),
        }
        self.stats.add_pass();
        self.stats
            .add_primitives(operation.render_mode, operation.element_count());
    }

    pub(crate) fn draw_vertices(&mut self, topology: PrimitiveTopology, vertices: &VertexRange) {
        self.device.draw(topology, vertices);
        self.stats.add_pass();
        self.stats.add_primitives(topology, vertices.count);
    }
}
