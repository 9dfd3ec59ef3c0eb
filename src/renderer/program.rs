// renderer/program.rs
use std::collections::HashMap;

use wgpu::TextureDimension;

use crate::asset::{Handle, ResourceCache};
use crate::renderer::device::ProgramId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerType {
    Sampler1D,
    Sampler2D,
    Sampler3D,
}

impl SamplerType {
    /// Texture dimension this sampler can read from.
    pub fn dimension(self) -> TextureDimension {
        match self {
            SamplerType::Sampler1D => TextureDimension::D1,
            SamplerType::Sampler2D => TextureDimension::D2,
            SamplerType::Sampler3D => TextureDimension::D3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerUniform {
    pub location: u32,
    pub kind: SamplerType,
}

/// A linked shader program as far as state binding is concerned: its device
/// id and the sampler uniforms texture layers can be pointed at.
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    id: ProgramId,
    name: String,
    samplers: HashMap<String, SamplerUniform>,
}

impl ShaderProgram {
    pub fn new(id: ProgramId, name: &str) -> Self {
        Self {
            id,
            name: name.to_owned(),
            samplers: HashMap::new(),
        }
    }

    pub fn with_sampler(mut self, name: &str, location: u32, kind: SamplerType) -> Self {
        self.samplers
            .insert(name.to_owned(), SamplerUniform { location, kind });
        self
    }

    pub fn id(&self) -> ProgramId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sampler(&self, name: &str) -> Option<SamplerUniform> {
        self.samplers.get(name).copied()
    }
}

/// Program reference held by a render pass, resolved when the pass is set up.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProgramRef {
    /// The fixed-function pipeline.
    #[default]
    FixedFunction,
    Resolved(Handle<ShaderProgram>),
    /// A program name that did not resolve.  Applying a pass holding this
    /// logs an error and leaves the current program bound.
    Missing(String),
}

impl ProgramRef {
    pub fn resolve(name: &str, programs: &ResourceCache<ShaderProgram>) -> Self {
        if name.is_empty() {
            return ProgramRef::FixedFunction;
        }

        match programs.find(name) {
            Some(handle) => ProgramRef::Resolved(handle),
            None => {
                log::warn!("Shader program {} not found at setup time", name);
                ProgramRef::Missing(name.to_owned())
            }
        }
    }
}
