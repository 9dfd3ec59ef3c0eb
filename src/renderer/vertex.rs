use bytemuck::{Pod, Zeroable};

/// Layout of one vertex as an ordered list of attribute formats.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexFormat {
    attributes: Vec<wgpu::VertexFormat>,
}

impl VertexFormat {
    pub fn new(attributes: &[wgpu::VertexFormat]) -> Self {
        Self {
            attributes: attributes.to_vec(),
        }
    }

    pub fn attributes(&self) -> &[wgpu::VertexFormat] {
        &self.attributes
    }

    /// Size in bytes of a single vertex.
    pub fn stride(&self) -> u64 {
        self.attributes.iter().map(|attribute| attribute.size()).sum()
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const ATTRS: [wgpu::VertexFormat; 3] = [
        wgpu::VertexFormat::Float32x3,
        wgpu::VertexFormat::Float32x3,
        wgpu::VertexFormat::Float32x2,
    ];

    pub fn format() -> VertexFormat {
        VertexFormat::new(&Self::ATTRS)
    }
}

/// Position and color, used for unlit debug geometry.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct ColorVertex {
    pub pos: [f32; 3],
    pub color: [f32; 4],
}

impl ColorVertex {
    pub fn format() -> VertexFormat {
        VertexFormat::new(&[wgpu::VertexFormat::Float32x3, wgpu::VertexFormat::Float32x4])
    }
}

/// Bare 2D position, used for immediate-mode drawing.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct Vertex2D {
    pub pos: [f32; 2],
}

impl Vertex2D {
    pub fn new(x: f32, y: f32) -> Self {
        Self { pos: [x, y] }
    }

    pub fn format() -> VertexFormat {
        VertexFormat::new(&[wgpu::VertexFormat::Float32x2])
    }
}
