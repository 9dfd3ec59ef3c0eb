// renderer/queue.rs
//! Per-frame list of draw requests, sorted once and submitted in order.

use glam::Mat4;
use wgpu::PrimitiveTopology;

use crate::renderer::buffer::{IndexRange, VertexRange};
use crate::renderer::camera::Camera;
use crate::renderer::device::Device;
use crate::renderer::lights::Light;
use crate::renderer::renderer::Renderer;
use crate::renderer::style::RenderStyle;

/// One batched draw: a geometry range drawn with every default-group pass
/// of a style.
#[derive(Clone, Copy)]
pub struct RenderOperation<'a> {
    pub transform: Mat4,
    pub vertices: VertexRange,
    pub indices: Option<IndexRange>,
    pub style: &'a RenderStyle,
    pub render_mode: PrimitiveTopology,
}

impl<'a> RenderOperation<'a> {
    pub fn new(style: &'a RenderStyle) -> Self {
        Self {
            transform: Mat4::IDENTITY,
            vertices: VertexRange::default(),
            indices: None,
            style,
            render_mode: PrimitiveTopology::TriangleList,
        }
    }

    /// Number of elements the draw consumes.
    pub fn element_count(&self) -> u32 {
        match &self.indices {
            Some(indices) => indices.count,
            None => self.vertices.count,
        }
    }
}

pub struct RenderQueue<'a> {
    camera: &'a Camera,
    lights: Vec<Light>,
    operations: Vec<RenderOperation<'a>>,
    order: Vec<usize>,
    sorted: bool,
}

impl<'a> RenderQueue<'a> {
    pub fn new(camera: &'a Camera) -> Self {
        Self {
            camera,
            lights: Vec::new(),
            operations: Vec::new(),
            order: Vec::new(),
            sorted: true,
        }
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    pub fn remove_lights(&mut self) {
        self.lights.clear();
    }

    /// Appends an operation drawn with `style` for the caller to fill in.
    pub fn create_operation(&mut self, style: &'a RenderStyle) -> &mut RenderOperation<'a> {
        self.sorted = false;
        self.operations.push(RenderOperation::new(style));
        let index = self.operations.len() - 1;
        &mut self.operations[index]
    }

    /// Drops every operation.  Call once per frame before repopulating.
    pub fn destroy_operations(&mut self) {
        self.operations.clear();
        self.order.clear();
        self.sorted = true;
    }

    /// Submits every operation in sorted order, drawing the passes of the
    /// default group.  Lights are enabled for the duration.
    pub fn render_operations<D: Device>(&mut self, renderer: &mut Renderer<D>) {
        self.submit(renderer, "");
    }

    /// Like [`render_operations`](Self::render_operations), but draws only
    /// the passes of `group`.
    pub fn render_group<D: Device>(&mut self, renderer: &mut Renderer<D>, group: &str) {
        self.submit(renderer, group);
    }

    fn submit<D: Device>(&mut self, renderer: &mut Renderer<D>, group: &str) {
        self.sort_operations();

        let projection = self.camera.proj_for_canvas(renderer.device().canvas_size());
        let view = self.camera.view();
        renderer.set_projection(projection);

        for (slot, light) in self.lights.iter().enumerate() {
            renderer.device_mut().set_light(slot as u32, Some(light));
        }

        for &index in &self.order {
            let operation = &self.operations[index];
            renderer.count_operation();
            renderer.device_mut().push_transform(view * operation.transform);

            for pass in operation.style.passes_in_group(group) {
                pass.apply(renderer);
                renderer.draw_operation(operation);
            }

            renderer.device_mut().pop_transform();
        }

        for slot in 0..self.lights.len() {
            renderer.device_mut().set_light(slot as u32, None);
        }
    }

    /// Rebuilds the submission order if operations were added since the
    /// last sort.  Opaque operations keep their insertion order and come
    /// before all blending ones, which keep theirs.
    pub fn sort_operations(&mut self) {
        if self.sorted {
            return;
        }

        let operations = &self.operations;
        self.order.clear();
        self.order.extend(0..operations.len());
        self.order
            .sort_by(|&a, &b| operations[a].style.draw_order(operations[b].style));
        self.sorted = true;
    }

    pub fn camera(&self) -> &Camera {
        self.camera
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// Operations in insertion order.
    pub fn operations(&self) -> &[RenderOperation<'a>] {
        &self.operations
    }

    /// Operations in submission order.
    pub fn sorted_operations(&mut self) -> impl Iterator<Item = &RenderOperation<'a>> {
        self.sort_operations();
        self.order.iter().map(|&index| &self.operations[index])
    }
}
