// renderer/state.rs
//! Mirror of the state currently bound on the device.
//!
//! Passes and texture layers diff their desired state against this mirror
//! and only emit calls for what differs.  The mirror is only trustworthy
//! while every state change goes through it: after the device context is
//! recreated, or after anything touches state behind its back, call
//! [`DeviceStateTracker::invalidate`] so the next apply forces everything.

use std::collections::HashMap;

use glam::Vec4;
use wgpu::TextureDimension;

use crate::asset::Handle;
use crate::renderer::device::{Device, ProgramId};
use crate::renderer::layer::CombineMode;
use crate::renderer::pass::PassState;
use crate::renderer::program::ShaderProgram;
use crate::renderer::texture::Texture;

/// What one texture unit currently has bound.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitCache {
    pub texture: Option<Handle<Texture>>,
    /// Texture target enabled on the unit.
    pub target: Option<TextureDimension>,
    pub combine_mode: CombineMode,
    pub combine_color: Vec4,
    pub sphere_mapped: bool,
    pub dirty: bool,
}

impl Default for UnitCache {
    fn default() -> Self {
        Self {
            texture: None,
            target: None,
            combine_mode: CombineMode::default(),
            combine_color: Vec4::ONE,
            sphere_mapped: false,
            dirty: true,
        }
    }
}

#[derive(Debug)]
pub struct DeviceStateTracker {
    pub(crate) pass: PassState,
    pub(crate) pass_dirty: bool,
    pub(crate) current_program: Option<Handle<ShaderProgram>>,
    pub(crate) units: Vec<UnitCache>,
    pub(crate) active_unit: Option<u32>,
    pub(crate) sampler_units: HashMap<(ProgramId, u32), u32>,
}

impl DeviceStateTracker {
    pub fn new(unit_count: u32) -> Self {
        Self {
            pass: PassState::default(),
            pass_dirty: true,
            current_program: None,
            units: vec![UnitCache::default(); unit_count as usize],
            active_unit: None,
            sampler_units: HashMap::new(),
        }
    }

    /// Queries the unit count from `device`, clamped to `max_units` if set.
    pub fn for_device<D: Device>(device: &D, max_units: Option<u32>) -> Self {
        Self::new(Self::query_unit_count(device, max_units))
    }

    pub(crate) fn query_unit_count<D: Device>(device: &D, max_units: Option<u32>) -> u32 {
        let reported = device.texture_unit_count().max(1);
        match max_units {
            Some(max) if max < reported => {
                log::info!(
                    "Clamping texture units from {} to configured maximum {}",
                    reported,
                    max
                );
                max.max(1)
            }
            _ => reported,
        }
    }

    /// Forgets everything known about the device.  The next pass and layer
    /// applies fall back to forcing their full state.
    pub fn invalidate(&mut self, unit_count: u32) {
        self.pass_dirty = true;
        self.current_program = None;
        self.units.clear();
        self.units
            .resize(unit_count as usize, UnitCache::default());
        self.active_unit = None;
        self.sampler_units.clear();
    }

    pub fn unit_count(&self) -> u32 {
        self.units.len() as u32
    }

    pub fn is_dirty(&self) -> bool {
        self.pass_dirty
    }

    pub fn pass_state(&self) -> &PassState {
        &self.pass
    }

    pub fn current_program(&self) -> Option<Handle<ShaderProgram>> {
        self.current_program
    }

    pub fn active_unit(&self) -> Option<u32> {
        self.active_unit
    }

    pub fn unit(&self, unit: u32) -> Option<&UnitCache> {
        self.units.get(unit as usize)
    }
}

/// Selects `unit` as the device's active texture unit unless it already is.
pub(crate) fn select_unit<D: Device>(device: &mut D, active_unit: &mut Option<u32>, unit: u32) {
    if *active_unit != Some(unit) {
        device.active_texture_unit(unit);
        *active_unit = Some(unit);
    }
}
