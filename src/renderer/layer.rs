// renderer/layer.rs
//! Texture layers bind one texture unit each.  Unit state (target, bound
//! object, combine mode, sphere mapping) is diffed against the tracker's
//! per-unit cache.  Sampling state (filters, address mode) belongs to the
//! texture object and is diffed against the texture's own sampler cache,
//! so a texture shared between units is configured only once.

use std::cell::Cell;
use std::collections::HashMap;

use glam::Vec4;
use wgpu::{AddressMode, FilterMode, TextureDimension};

use crate::asset::{Handle, ResourceCache};
use crate::renderer::device::{Capability, Device, ProgramId, TextureParameter};
use crate::renderer::program::ShaderProgram;
use crate::renderer::renderer::Renderer;
use crate::renderer::state::{select_unit, UnitCache};
use crate::renderer::texture::{MinFilter, Texture};

const TEXTURE_TARGETS: [TextureDimension; 3] = [
    TextureDimension::D1,
    TextureDimension::D2,
    TextureDimension::D3,
];

/// How a unit's texel is combined with the incoming fragment color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CombineMode {
    #[default]
    Modulate,
    Replace,
    Decal,
    Blend,
    Add,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerState {
    pub texture: Option<Handle<Texture>>,
    pub sphere_mapped: bool,
    pub combine_mode: CombineMode,
    pub combine_color: Vec4,
    pub min_filter: MinFilter,
    pub mag_filter: FilterMode,
    pub address_mode: AddressMode,
    /// Sampler uniform in the current program that should read this unit.
    pub sampler_name: Option<String>,
}

impl LayerState {
    pub const DEFAULT: Self = Self {
        texture: None,
        sphere_mapped: false,
        combine_mode: CombineMode::Modulate,
        combine_color: Vec4::ONE,
        min_filter: MinFilter::LINEAR_MIPMAP_LINEAR,
        mag_filter: FilterMode::Linear,
        address_mode: AddressMode::Repeat,
        sampler_name: None,
    };
}

impl Default for LayerState {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Issues unit-scoped calls, selecting the layer's unit right before the
/// first one.
struct UnitScope<'a, D: Device> {
    device: &'a mut D,
    active_unit: &'a mut Option<u32>,
    unit: u32,
}

impl<'a, D: Device> UnitScope<'a, D> {
    fn device(&mut self) -> &mut D {
        select_unit(&mut *self.device, &mut *self.active_unit, self.unit);
        &mut *self.device
    }

    /// For calls that do not depend on the active unit.
    fn unscoped(&mut self) -> &mut D {
        &mut *self.device
    }
}

#[derive(Debug, Clone)]
pub struct TextureLayer {
    unit: u32,
    state: LayerState,
    dirty: Cell<bool>,
}

impl TextureLayer {
    pub fn new(unit: u32) -> Self {
        Self {
            unit,
            state: LayerState::DEFAULT,
            dirty: Cell::new(true),
        }
    }

    pub fn apply<D: Device>(&self, renderer: &mut Renderer<D>) {
        if self.unit >= renderer.tracker.unit_count() {
            log::error!(
                "Cannot apply texture layer to non-existent texture unit {}",
                self.unit
            );
            return;
        }

        {
            let Renderer {
                device,
                tracker,
                textures,
                programs,
                ..
            } = renderer;
            let cache = &mut tracker.units[self.unit as usize];
            let mut scope = UnitScope {
                device,
                active_unit: &mut tracker.active_unit,
                unit: self.unit,
            };
            let binding = Binding {
                current_program: tracker.current_program,
                programs,
                sampler_units: &mut tracker.sampler_units,
            };

            if cache.dirty {
                self.force_unit(&mut scope, cache, textures, binding);
            } else {
                self.diff_unit(&mut scope, cache, textures, binding);
            }
        }

        renderer.report_device_errors("applying texture layer");
        self.dirty.set(false);
    }

    fn force_unit<D: Device>(
        &self,
        scope: &mut UnitScope<'_, D>,
        cache: &mut UnitCache,
        textures: &mut ResourceCache<Texture>,
        binding: Binding<'_>,
    ) {
        let data = &self.state;

        for target in TEXTURE_TARGETS {
            scope.device().set_capability(Capability::Texture(target), false);
        }
        scope
            .device()
            .set_capability(Capability::SphereMap, data.sphere_mapped);
        scope.device().combine_mode(data.combine_mode);
        scope.device().combine_color(data.combine_color);

        *cache = UnitCache {
            texture: None,
            target: None,
            combine_mode: data.combine_mode,
            combine_color: data.combine_color,
            sphere_mapped: data.sphere_mapped,
            dirty: false,
        };

        match self.resolve_texture(textures) {
            Some((handle, texture)) => {
                let target = texture.dimension();
                scope.device().set_capability(Capability::Texture(target), true);
                scope.device().bind_texture(target, texture.id());
                cache.texture = Some(handle);
                cache.target = Some(target);

                self.apply_sampling(scope, texture);
                self.bind_sampler(scope, texture, binding);
            }
            None => self.report_unbound_sampler(),
        }
    }

    fn diff_unit<D: Device>(
        &self,
        scope: &mut UnitScope<'_, D>,
        cache: &mut UnitCache,
        textures: &mut ResourceCache<Texture>,
        binding: Binding<'_>,
    ) {
        let data = &self.state;

        match self.resolve_texture(textures) {
            Some((handle, texture)) => {
                let target = texture.dimension();
                if cache.target != Some(target) {
                    if let Some(previous) = cache.target {
                        scope
                            .device()
                            .set_capability(Capability::Texture(previous), false);
                    }
                    scope.device().set_capability(Capability::Texture(target), true);
                    cache.target = Some(target);
                }

                if cache.texture != Some(handle) {
                    scope.device().bind_texture(target, texture.id());
                    cache.texture = Some(handle);
                }

                self.diff_environment(scope, cache);
                self.apply_sampling(scope, texture);
                self.bind_sampler(scope, texture, binding);
            }
            None => {
                if let Some(previous) = cache.target.take() {
                    scope
                        .device()
                        .set_capability(Capability::Texture(previous), false);
                }
                cache.texture = None;

                self.diff_environment(scope, cache);
                self.report_unbound_sampler();
            }
        }

        if data.sphere_mapped != cache.sphere_mapped {
            scope
                .device()
                .set_capability(Capability::SphereMap, data.sphere_mapped);
            cache.sphere_mapped = data.sphere_mapped;
        }
    }

    fn diff_environment<D: Device>(&self, scope: &mut UnitScope<'_, D>, cache: &mut UnitCache) {
        let data = &self.state;

        if data.combine_mode != cache.combine_mode {
            scope.device().combine_mode(data.combine_mode);
            cache.combine_mode = data.combine_mode;
        }

        if data.combine_color != cache.combine_color {
            scope.device().combine_color(data.combine_color);
            cache.combine_color = data.combine_color;
        }
    }

    /// Sends filter and address state that differs from what the texture
    /// object was last told, then records it on the texture.
    fn apply_sampling<D: Device>(&self, scope: &mut UnitScope<'_, D>, texture: &mut Texture) {
        let data = &self.state;
        let target = texture.dimension();

        let min_filter = texture.effective_min_filter(data.min_filter);
        if texture.sampler.min_filter != Some(min_filter) {
            scope
                .device()
                .texture_parameter(target, TextureParameter::MinFilter(min_filter));
            texture.sampler.min_filter = Some(min_filter);
        }

        if texture.sampler.mag_filter != Some(data.mag_filter) {
            scope
                .device()
                .texture_parameter(target, TextureParameter::MagFilter(data.mag_filter));
            texture.sampler.mag_filter = Some(data.mag_filter);
        }

        if texture.sampler.address_mode != Some(data.address_mode) {
            scope
                .device()
                .texture_parameter(target, TextureParameter::AddressMode(data.address_mode));
            texture.sampler.address_mode = Some(data.address_mode);
        }
    }

    fn bind_sampler<D: Device>(
        &self,
        scope: &mut UnitScope<'_, D>,
        texture: &Texture,
        mut binding: Binding<'_>,
    ) {
        let Some(name) = &self.state.sampler_name else {
            return;
        };

        let Some(program) = binding
            .current_program
            .and_then(|handle| binding.programs.get(handle))
        else {
            log::error!(
                "Cannot bind texture layer {} to sampler uniform {} without a current program",
                self.unit,
                name
            );
            return;
        };

        let Some(sampler) = program.sampler(name) else {
            log::error!(
                "Texture layer {} bound to non-existent sampler uniform {}",
                self.unit,
                name
            );
            return;
        };

        if sampler.kind.dimension() != texture.dimension() {
            log::warn!(
                "Type mismatch between texture {} and sampler uniform {} for texture layer {}",
                texture.name(),
                name,
                self.unit
            );
            return;
        }

        let key = (program.id(), sampler.location);
        if binding.sampler_units.get(&key) != Some(&self.unit) {
            scope
                .unscoped()
                .set_sampler(program.id(), sampler.location, self.unit);
            binding.sampler_units.insert(key, self.unit);
        }
    }

    fn report_unbound_sampler(&self) {
        if let Some(name) = &self.state.sampler_name {
            log::error!(
                "Texture layer {} with no texture bound to sampler uniform {}",
                self.unit,
                name
            );
        }
    }

    fn resolve_texture<'t>(
        &self,
        textures: &'t mut ResourceCache<Texture>,
    ) -> Option<(Handle<Texture>, &'t mut Texture)> {
        let handle = self.state.texture?;
        match textures.get_mut(handle) {
            Some(texture) => Some((handle, texture)),
            None => {
                log::error!("Texture layer {} uses an invalid texture handle", self.unit);
                None
            }
        }
    }

    pub fn unit(&self) -> u32 {
        self.unit
    }

    pub fn state(&self) -> &LayerState {
        &self.state
    }

    pub fn is_modified(&self) -> bool {
        self.dirty.get()
    }

    /// Whether the device has a unit for this layer.
    pub fn is_compatible(&self, unit_count: u32) -> bool {
        self.unit < unit_count
    }

    pub fn texture(&self) -> Option<Handle<Texture>> {
        self.state.texture
    }

    pub fn is_sphere_mapped(&self) -> bool {
        self.state.sphere_mapped
    }

    pub fn combine_mode(&self) -> CombineMode {
        self.state.combine_mode
    }

    pub fn combine_color(&self) -> Vec4 {
        self.state.combine_color
    }

    pub fn min_filter(&self) -> MinFilter {
        self.state.min_filter
    }

    pub fn mag_filter(&self) -> FilterMode {
        self.state.mag_filter
    }

    pub fn address_mode(&self) -> AddressMode {
        self.state.address_mode
    }

    pub fn sampler_name(&self) -> Option<&str> {
        self.state.sampler_name.as_deref()
    }

    fn modify(&mut self) -> &mut LayerState {
        self.dirty.set(true);
        &mut self.state
    }

    pub fn set_texture(&mut self, texture: Option<Handle<Texture>>) -> &mut Self {
        self.modify().texture = texture;
        self
    }

    pub fn set_sphere_mapped(&mut self, enabled: bool) -> &mut Self {
        self.modify().sphere_mapped = enabled;
        self
    }

    pub fn set_combine_mode(&mut self, mode: CombineMode) -> &mut Self {
        self.modify().combine_mode = mode;
        self
    }

    pub fn set_combine_color(&mut self, color: Vec4) -> &mut Self {
        self.modify().combine_color = color;
        self
    }

    pub fn set_filters(&mut self, min_filter: MinFilter, mag_filter: FilterMode) -> &mut Self {
        let state = self.modify();
        state.min_filter = min_filter;
        state.mag_filter = mag_filter;
        self
    }

    pub fn set_address_mode(&mut self, mode: AddressMode) -> &mut Self {
        self.modify().address_mode = mode;
        self
    }

    /// Names the sampler uniform to point at this unit.  An empty name
    /// clears it.
    pub fn set_sampler_name(&mut self, name: &str) -> &mut Self {
        self.modify().sampler_name = (!name.is_empty()).then(|| name.to_owned());
        self
    }

    pub fn set_defaults(&mut self) -> &mut Self {
        *self.modify() = LayerState::DEFAULT;
        self
    }
}

/// Program-side state a layer needs to point a sampler uniform at its unit.
struct Binding<'a> {
    current_program: Option<Handle<ShaderProgram>>,
    programs: &'a ResourceCache<ShaderProgram>,
    sampler_units: &'a mut HashMap<(ProgramId, u32), u32>,
}

/// Layers for units `0..n`.  Applying a stack also resets every unit past
/// the last layer to the unbound default.
#[derive(Debug, Clone, Default)]
pub struct TextureStack {
    layers: Vec<TextureLayer>,
}

impl TextureStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply<D: Device>(&self, renderer: &mut Renderer<D>) {
        let unit_count = renderer.tracker.unit_count();
        let count = self.layers.len().min(unit_count as usize);

        for layer in &self.layers[..count] {
            layer.apply(renderer);
        }

        for unit in count as u32..unit_count {
            TextureLayer::new(unit).apply(renderer);
        }
    }

    /// Appends a layer bound to the next free unit.
    pub fn create_texture_layer(&mut self) -> &mut TextureLayer {
        let unit = self.layers.len() as u32;
        self.layers.push(TextureLayer::new(unit));
        let index = self.layers.len() - 1;
        &mut self.layers[index]
    }

    pub fn destroy_texture_layers(&mut self) {
        self.layers.clear();
    }

    pub fn layers(&self) -> &[TextureLayer] {
        &self.layers
    }

    pub fn layer(&self, unit: u32) -> Option<&TextureLayer> {
        self.layers.get(unit as usize)
    }

    pub fn layer_mut(&mut self, unit: u32) -> Option<&mut TextureLayer> {
        self.layers.get_mut(unit as usize)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Whether every layer fits in the device's texture units.
    pub fn is_compatible(&self, unit_count: u32) -> bool {
        self.layers
            .iter()
            .all(|layer| layer.is_compatible(unit_count))
    }
}
