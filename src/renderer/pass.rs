// renderer/pass.rs
//! Render passes: a bundle of fixed-function and program state plus a stack
//! of texture layers, applied by diffing against the device state tracker.

use std::cell::Cell;

use glam::Vec4;
use wgpu::{BlendFactor, CompareFunction, PolygonMode, StencilOperation};

use crate::asset::ResourceCache;
use crate::renderer::device::{Capability, Device, MaterialColor};
use crate::renderer::layer::{TextureLayer, TextureStack};
use crate::renderer::program::{ProgramRef, ShaderProgram};
use crate::renderer::renderer::Renderer;
use crate::renderer::state::DeviceStateTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullMode {
    None,
    Front,
    Back,
    Both,
}

impl Default for CullMode {
    fn default() -> Self {
        CullMode::Back
    }
}

/// Desired device state of a pass, and the shape of the tracker's mirror.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassState {
    pub cull_mode: CullMode,
    pub lighting: bool,
    pub src_factor: BlendFactor,
    pub dst_factor: BlendFactor,
    pub polygon_mode: PolygonMode,
    /// Line width in percent of the canvas height.
    pub line_width: f32,
    pub depth_testing: bool,
    pub depth_writing: bool,
    pub depth_function: CompareFunction,
    pub stencil_testing: bool,
    pub stencil_function: CompareFunction,
    pub stencil_ref: u32,
    pub stencil_mask: u32,
    pub stencil_failed: StencilOperation,
    pub depth_failed: StencilOperation,
    pub depth_passed: StencilOperation,
    pub color_writing: bool,
    pub ambient_color: Vec4,
    pub diffuse_color: Vec4,
    pub specular_color: Vec4,
    pub shininess: f32,
    pub flat_color: Vec4,
}

impl PassState {
    pub const DEFAULT: Self = Self {
        cull_mode: CullMode::Back,
        lighting: false,
        src_factor: BlendFactor::One,
        dst_factor: BlendFactor::Zero,
        polygon_mode: PolygonMode::Fill,
        line_width: 1.0,
        depth_testing: true,
        depth_writing: true,
        depth_function: CompareFunction::Less,
        stencil_testing: false,
        stencil_function: CompareFunction::Always,
        stencil_ref: 0,
        stencil_mask: !0,
        stencil_failed: StencilOperation::Keep,
        depth_failed: StencilOperation::Keep,
        depth_passed: StencilOperation::Keep,
        color_writing: true,
        ambient_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
        diffuse_color: Vec4::ONE,
        specular_color: Vec4::ONE,
        shininess: 0.0,
        flat_color: Vec4::ONE,
    };

    pub fn is_blending(&self) -> bool {
        self.src_factor != BlendFactor::One || self.dst_factor != BlendFactor::Zero
    }

    pub fn is_culling(&self) -> bool {
        self.cull_mode != CullMode::None
    }

    /// Depth function the device actually runs with.  Write-only passes
    /// fill the depth buffer unconditionally.
    fn effective_depth_function(&self) -> CompareFunction {
        if self.depth_writing && !self.depth_testing {
            CompareFunction::Always
        } else {
            self.depth_function
        }
    }
}

impl Default for PassState {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Clone)]
pub struct RenderPass {
    group: String,
    state: PassState,
    program: ProgramRef,
    textures: TextureStack,
    dirty: Cell<bool>,
}

impl RenderPass {
    /// Creates a pass with default state.  An empty `group` puts the pass in
    /// the default group rendered by the queue itself.
    pub fn new(group: &str) -> Self {
        Self {
            group: group.to_owned(),
            state: PassState::DEFAULT,
            program: ProgramRef::FixedFunction,
            textures: TextureStack::new(),
            dirty: Cell::new(true),
        }
    }

    /// Makes the device state match this pass, emitting only the calls
    /// needed to get there from the tracked state.
    pub fn apply<D: Device>(&self, renderer: &mut Renderer<D>) {
        if renderer.tracker.pass_dirty {
            self.force(renderer);
            return;
        }

        {
            let Renderer {
                device,
                tracker,
                programs,
                ..
            } = renderer;
            let data = &self.state;
            let cache = &mut tracker.pass;

            if data.cull_mode != cache.cull_mode {
                if data.is_culling() != cache.is_culling() {
                    device.set_capability(Capability::CullFace, data.is_culling());
                }
                if data.is_culling() {
                    device.cull_face(data.cull_mode);
                }
                cache.cull_mode = data.cull_mode;
            }

            if data.lighting != cache.lighting {
                device.set_capability(Capability::Lighting, data.lighting);
                cache.lighting = data.lighting;
            }

            if data.src_factor != cache.src_factor || data.dst_factor != cache.dst_factor {
                if data.is_blending() != cache.is_blending() {
                    device.set_capability(Capability::Blend, data.is_blending());
                }
                if data.is_blending() {
                    device.blend_func(data.src_factor, data.dst_factor);
                }
                cache.src_factor = data.src_factor;
                cache.dst_factor = data.dst_factor;
            }

            if data.polygon_mode != cache.polygon_mode {
                device.polygon_mode(data.polygon_mode);
                cache.polygon_mode = data.polygon_mode;
            }

            if data.line_width != cache.line_width {
                let width = scaled_line_width(&*device, data.line_width);
                device.line_width(width);
                cache.line_width = data.line_width;
            }

            let depth_was_enabled = cache.depth_testing || cache.depth_writing;
            if data.depth_testing || data.depth_writing {
                if data.depth_writing != cache.depth_writing {
                    device.depth_mask(data.depth_writing);
                }

                let function = data.effective_depth_function();
                if function != cache.depth_function {
                    device.depth_func(function);
                    cache.depth_function = function;
                }

                if !depth_was_enabled {
                    device.set_capability(Capability::DepthTest, true);
                }
            } else if depth_was_enabled {
                if cache.depth_writing {
                    device.depth_mask(false);
                }
                device.set_capability(Capability::DepthTest, false);
            }
            cache.depth_testing = data.depth_testing;
            cache.depth_writing = data.depth_writing;

            if data.stencil_testing {
                if !cache.stencil_testing {
                    device.set_capability(Capability::StencilTest, true);
                    cache.stencil_testing = true;
                }

                if data.stencil_function != cache.stencil_function
                    || data.stencil_ref != cache.stencil_ref
                    || data.stencil_mask != cache.stencil_mask
                {
                    device.stencil_func(data.stencil_function, data.stencil_ref, data.stencil_mask);
                    cache.stencil_function = data.stencil_function;
                    cache.stencil_ref = data.stencil_ref;
                    cache.stencil_mask = data.stencil_mask;
                }

                if data.stencil_failed != cache.stencil_failed
                    || data.depth_failed != cache.depth_failed
                    || data.depth_passed != cache.depth_passed
                {
                    device.stencil_op(data.stencil_failed, data.depth_failed, data.depth_passed);
                    cache.stencil_failed = data.stencil_failed;
                    cache.depth_failed = data.depth_failed;
                    cache.depth_passed = data.depth_passed;
                }
            } else if cache.stencil_testing {
                device.set_capability(Capability::StencilTest, false);
                cache.stencil_testing = false;
            }

            if data.color_writing != cache.color_writing {
                device.color_mask(data.color_writing);
                cache.color_writing = data.color_writing;
            }

            if data.lighting {
                if data.ambient_color != cache.ambient_color {
                    device.material_color(MaterialColor::Ambient, data.ambient_color);
                    cache.ambient_color = data.ambient_color;
                }
                if data.diffuse_color != cache.diffuse_color {
                    device.material_color(MaterialColor::Diffuse, data.diffuse_color);
                    cache.diffuse_color = data.diffuse_color;
                }
                if data.specular_color != cache.specular_color {
                    device.material_color(MaterialColor::Specular, data.specular_color);
                    cache.specular_color = data.specular_color;
                }
                if data.shininess != cache.shininess {
                    device.shininess(data.shininess);
                    cache.shininess = data.shininess;
                }
            } else if data.flat_color != cache.flat_color {
                device.flat_color(data.flat_color);
                cache.flat_color = data.flat_color;
            }

            self.bind_program(device, tracker, programs, false);
        }

        renderer.report_device_errors("applying render pass");
        self.textures.apply(renderer);
        self.dirty.set(false);
    }

    /// Emits every piece of pass state unconditionally and overwrites the
    /// tracker's mirror with it.
    pub fn force<D: Device>(&self, renderer: &mut Renderer<D>) {
        {
            let Renderer {
                device,
                tracker,
                programs,
                ..
            } = renderer;
            let data = &self.state;

            device.set_capability(Capability::CullFace, data.is_culling());
            if data.is_culling() {
                device.cull_face(data.cull_mode);
            }

            device.set_capability(Capability::Lighting, data.lighting);

            device.set_capability(Capability::Blend, data.is_blending());
            device.blend_func(data.src_factor, data.dst_factor);

            device.polygon_mode(data.polygon_mode);

            let width = scaled_line_width(&*device, data.line_width);
            device.line_width(width);

            device.depth_mask(data.depth_writing);
            device.set_capability(
                Capability::DepthTest,
                data.depth_testing || data.depth_writing,
            );
            let depth_function = data.effective_depth_function();
            device.depth_func(depth_function);

            device.color_mask(data.color_writing);

            device.set_capability(Capability::StencilTest, data.stencil_testing);
            device.stencil_func(data.stencil_function, data.stencil_ref, data.stencil_mask);
            device.stencil_op(data.stencil_failed, data.depth_failed, data.depth_passed);

            device.flat_color(data.flat_color);
            device.material_color(MaterialColor::Ambient, data.ambient_color);
            device.material_color(MaterialColor::Diffuse, data.diffuse_color);
            device.material_color(MaterialColor::Specular, data.specular_color);
            device.shininess(data.shininess);

            tracker.pass = PassState {
                depth_function,
                ..*data
            };

            self.bind_program(device, tracker, programs, true);
            tracker.pass_dirty = false;
        }

        renderer.report_device_errors("forcing render pass");
        self.textures.apply(renderer);
        self.dirty.set(false);
    }

    fn bind_program<D: Device>(
        &self,
        device: &mut D,
        tracker: &mut DeviceStateTracker,
        programs: &ResourceCache<ShaderProgram>,
        force: bool,
    ) {
        match &self.program {
            ProgramRef::FixedFunction => {
                if force || tracker.current_program.is_some() {
                    device.use_program(None);
                    tracker.current_program = None;
                }
            }
            ProgramRef::Resolved(handle) => {
                if !force && tracker.current_program == Some(*handle) {
                    return;
                }
                match programs.get(*handle) {
                    Some(program) => {
                        device.use_program(Some(program.id()));
                        tracker.current_program = Some(*handle);
                    }
                    None => log::error!("Render pass uses an invalid shader program handle"),
                }
            }
            ProgramRef::Missing(name) => {
                log::error!("Render pass uses non-existent shader program {}", name);
            }
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn is_default_group(&self) -> bool {
        self.group.is_empty()
    }

    pub fn state(&self) -> &PassState {
        &self.state
    }

    /// Whether a setter has been called since the last apply.
    pub fn is_modified(&self) -> bool {
        self.dirty.get()
    }

    pub fn is_blending(&self) -> bool {
        self.state.is_blending()
    }

    pub fn is_culling(&self) -> bool {
        self.state.is_culling()
    }

    pub fn is_lit(&self) -> bool {
        self.state.lighting
    }

    pub fn is_depth_testing(&self) -> bool {
        self.state.depth_testing
    }

    pub fn is_depth_writing(&self) -> bool {
        self.state.depth_writing
    }

    pub fn is_stencil_testing(&self) -> bool {
        self.state.stencil_testing
    }

    pub fn is_color_writing(&self) -> bool {
        self.state.color_writing
    }

    pub fn cull_mode(&self) -> CullMode {
        self.state.cull_mode
    }

    pub fn src_factor(&self) -> BlendFactor {
        self.state.src_factor
    }

    pub fn dst_factor(&self) -> BlendFactor {
        self.state.dst_factor
    }

    pub fn polygon_mode(&self) -> PolygonMode {
        self.state.polygon_mode
    }

    pub fn line_width(&self) -> f32 {
        self.state.line_width
    }

    pub fn depth_function(&self) -> CompareFunction {
        self.state.depth_function
    }

    pub fn stencil_function(&self) -> CompareFunction {
        self.state.stencil_function
    }

    pub fn stencil_ref(&self) -> u32 {
        self.state.stencil_ref
    }

    pub fn stencil_mask(&self) -> u32 {
        self.state.stencil_mask
    }

    pub fn stencil_ops(&self) -> (StencilOperation, StencilOperation, StencilOperation) {
        (
            self.state.stencil_failed,
            self.state.depth_failed,
            self.state.depth_passed,
        )
    }

    pub fn ambient_color(&self) -> Vec4 {
        self.state.ambient_color
    }

    pub fn diffuse_color(&self) -> Vec4 {
        self.state.diffuse_color
    }

    pub fn specular_color(&self) -> Vec4 {
        self.state.specular_color
    }

    pub fn shininess(&self) -> f32 {
        self.state.shininess
    }

    pub fn flat_color(&self) -> Vec4 {
        self.state.flat_color
    }

    pub fn program(&self) -> &ProgramRef {
        &self.program
    }

    pub fn textures(&self) -> &TextureStack {
        &self.textures
    }

    pub fn textures_mut(&mut self) -> &mut TextureStack {
        self.dirty.set(true);
        &mut self.textures
    }

    /// Shorthand for adding a layer to this pass's texture stack.
    pub fn create_texture_layer(&mut self) -> &mut TextureLayer {
        self.textures_mut().create_texture_layer()
    }

    fn modify(&mut self) -> &mut PassState {
        self.dirty.set(true);
        &mut self.state
    }

    pub fn set_cull_mode(&mut self, mode: CullMode) {
        self.modify().cull_mode = mode;
    }

    pub fn set_lit(&mut self, enabled: bool) {
        self.modify().lighting = enabled;
    }

    pub fn set_blend_factors(&mut self, src: BlendFactor, dst: BlendFactor) {
        let state = self.modify();
        state.src_factor = src;
        state.dst_factor = dst;
    }

    pub fn set_polygon_mode(&mut self, mode: PolygonMode) {
        self.modify().polygon_mode = mode;
    }

    pub fn set_line_width(&mut self, width: f32) {
        self.modify().line_width = width;
    }

    pub fn set_depth_testing(&mut self, enabled: bool) {
        self.modify().depth_testing = enabled;
    }

    pub fn set_depth_writing(&mut self, enabled: bool) {
        self.modify().depth_writing = enabled;
    }

    pub fn set_depth_function(&mut self, function: CompareFunction) {
        self.modify().depth_function = function;
    }

    pub fn set_stencil_testing(&mut self, enabled: bool) {
        self.modify().stencil_testing = enabled;
    }

    pub fn set_stencil_function(&mut self, function: CompareFunction, reference: u32, mask: u32) {
        let state = self.modify();
        state.stencil_function = function;
        state.stencil_ref = reference;
        state.stencil_mask = mask;
    }

    pub fn set_stencil_ops(
        &mut self,
        stencil_failed: StencilOperation,
        depth_failed: StencilOperation,
        depth_passed: StencilOperation,
    ) {
        let state = self.modify();
        state.stencil_failed = stencil_failed;
        state.depth_failed = depth_failed;
        state.depth_passed = depth_passed;
    }

    pub fn set_color_writing(&mut self, enabled: bool) {
        self.modify().color_writing = enabled;
    }

    pub fn set_ambient_color(&mut self, color: Vec4) {
        self.modify().ambient_color = color;
    }

    pub fn set_diffuse_color(&mut self, color: Vec4) {
        self.modify().diffuse_color = color;
    }

    pub fn set_specular_color(&mut self, color: Vec4) {
        self.modify().specular_color = color;
    }

    pub fn set_shininess(&mut self, shininess: f32) {
        self.modify().shininess = shininess;
    }

    pub fn set_flat_color(&mut self, color: Vec4) {
        self.modify().flat_color = color;
    }

    pub fn set_program(&mut self, program: ProgramRef) {
        self.dirty.set(true);
        self.program = program;
    }

    /// Resolves `name` against the renderer's programs.  An empty name
    /// selects the fixed-function pipeline.
    pub fn set_program_name<D: Device>(&mut self, name: &str, renderer: &Renderer<D>) {
        self.set_program(renderer.resolve_program(name));
    }

    /// Restores every state field to its default.  Texture layers are kept.
    pub fn set_defaults(&mut self) {
        *self.modify() = PassState::DEFAULT;
        self.program = ProgramRef::FixedFunction;
    }
}

impl Default for RenderPass {
    fn default() -> Self {
        Self::new("")
    }
}

fn scaled_line_width<D: Device>(device: &D, width: f32) -> f32 {
    let (_, height) = device.canvas_size();
    width * height as f32 / 100.0
}
