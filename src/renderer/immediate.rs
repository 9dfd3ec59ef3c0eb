// renderer/immediate.rs
//! Immediate-mode drawing and framebuffer setup.
//!
//! Points, lines and rectangles are drawn through a pass owned by the
//! renderer, with their vertices taken from the transient pool, so they are
//! only valid for the frame they are drawn in like any other transient
//! geometry.

use glam::{Mat4, Vec2, Vec4};
use wgpu::{PolygonMode, PrimitiveTopology};

use crate::error::RenderError;
use crate::renderer::camera::canvas_aspect;
use crate::renderer::device::{Capability, Device, Rect};
use crate::renderer::pass::RenderPass;
use crate::renderer::renderer::Renderer;
use crate::renderer::vertex::Vertex2D;

/// Axis-aligned rectangle in 2D projection units.  A negative size extends
/// the rectangle from `position` towards the origin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rectangle {
    pub position: Vec2,
    pub size: Vec2,
}

impl Rectangle {
    pub fn new(position: Vec2, size: Vec2) -> Self {
        Self { position, size }
    }

    /// Minimum and maximum corners.
    pub fn bounds(&self) -> (Vec2, Vec2) {
        let end = self.position + self.size;
        (self.position.min(end), self.position.max(end))
    }

    /// Corners of the covered pixels, or `None` when the rectangle is less
    /// than a pixel wide or high.
    fn pixel_bounds(&self) -> Option<(Vec2, Vec2)> {
        let (min, max) = self.bounds();
        if max.x - min.x < 1.0 || max.y - min.y < 1.0 {
            return None;
        }
        Some((min, max - Vec2::ONE))
    }
}

impl<D: Device> Renderer<D> {
    /// Starts drawing in a 2D space of `resolution` units with the origin at
    /// the bottom left.  Must be paired with [`end`](Self::end).
    pub fn begin_2d(&mut self, resolution: Vec2) {
        let projection = Mat4::orthographic_rh(0.0, resolution.x, 0.0, resolution.y, -1.0, 1.0);
        self.push_projection(projection);
    }

    /// Starts drawing with a perspective projection.  An `aspect` of zero
    /// uses the aspect ratio of the canvas.
    pub fn begin_3d(&mut self, fov_y_radians: f32, aspect: f32, near: f32, far: f32) {
        let aspect = if aspect == 0.0 {
            canvas_aspect(self.device.canvas_size())
        } else {
            aspect
        };
        self.push_projection(Mat4::perspective_rh(fov_y_radians, aspect, near, far));
    }

    /// Restores the projection and transform in effect before the matching
    /// `begin_2d` or `begin_3d`.
    pub fn end(&mut self) -> Result<(), RenderError> {
        let previous = self
            .projection_stack
            .pop()
            .ok_or(RenderError::NoProjectionScope)?;
        self.set_projection(previous);
        self.device.pop_transform();
        Ok(())
    }

    fn push_projection(&mut self, projection: Mat4) {
        self.projection_stack.push(self.projection);
        self.set_projection(projection);
        self.device.push_transform(Mat4::IDENTITY);
    }

    pub fn draw_point(&mut self, point: Vec2) -> Result<(), RenderError> {
        self.draw_immediate(PrimitiveTopology::PointList, &[vertex(point)])
    }

    pub fn draw_line(&mut self, start: Vec2, end: Vec2) -> Result<(), RenderError> {
        self.draw_immediate(PrimitiveTopology::LineList, &[vertex(start), vertex(end)])
    }

    /// Draws the outline of `rectangle`.  Rectangles smaller than a pixel
    /// are skipped.
    pub fn draw_rectangle(&mut self, rectangle: &Rectangle) -> Result<(), RenderError> {
        let Some((min, max)) = rectangle.pixel_bounds() else {
            return Ok(());
        };

        self.immediate_pass.set_polygon_mode(PolygonMode::Line);
        self.draw_immediate(
            PrimitiveTopology::LineStrip,
            &[
                vertex(min),
                vertex(Vec2::new(max.x, min.y)),
                vertex(max),
                vertex(Vec2::new(min.x, max.y)),
                vertex(min),
            ],
        )
    }

    /// Fills `rectangle`.  Rectangles smaller than a pixel are skipped.
    pub fn fill_rectangle(&mut self, rectangle: &Rectangle) -> Result<(), RenderError> {
        let Some((min, max)) = rectangle.pixel_bounds() else {
            return Ok(());
        };

        self.immediate_pass.set_polygon_mode(PolygonMode::Fill);
        self.draw_immediate(
            PrimitiveTopology::TriangleStrip,
            &[
                vertex(min),
                vertex(Vec2::new(max.x, min.y)),
                vertex(Vec2::new(min.x, max.y)),
                vertex(max),
            ],
        )
    }

    fn draw_immediate(
        &mut self,
        topology: PrimitiveTopology,
        vertices: &[Vertex2D],
    ) -> Result<(), RenderError> {
        let range = self.allocate_vertices(vertices.len() as u32, &Vertex2D::format())?;
        self.write_vertices(&range, vertices)?;

        let pass = std::mem::take(&mut self.immediate_pass);
        pass.apply(self);
        self.immediate_pass = pass;

        self.draw_vertices(topology, &range);
        Ok(())
    }

    /// Color of immediate-mode primitives.
    pub fn color(&self) -> Vec4 {
        self.immediate_pass.flat_color()
    }

    pub fn set_color(&mut self, color: Vec4) {
        self.immediate_pass.set_flat_color(color);
    }

    /// The pass immediate-mode primitives are drawn with.
    pub fn immediate_pass(&self) -> &RenderPass {
        &self.immediate_pass
    }

    pub fn immediate_pass_mut(&mut self) -> &mut RenderPass {
        &mut self.immediate_pass
    }

    /// Clears the color buffer.  Color writes are enabled for the clear and
    /// masked again afterwards if the current pass masks them.
    pub fn clear_color_buffer(&mut self, color: Vec4) {
        let masked = !self.tracker.pass.color_writing;
        if self.tracker.pass_dirty || masked {
            self.device.color_mask(true);
        }
        self.device.clear_color(color);
        if masked && !self.tracker.pass_dirty {
            self.device.color_mask(false);
        }
        self.report_device_errors("clearing the color buffer");
    }

    /// Clears the depth buffer, enabling depth writes for the clear in the
    /// same way as [`clear_color_buffer`](Self::clear_color_buffer).
    pub fn clear_depth_buffer(&mut self, depth: f32) {
        let masked = !self.tracker.pass.depth_writing;
        if self.tracker.pass_dirty || masked {
            self.device.depth_mask(true);
        }
        self.device.clear_depth(depth);
        if masked && !self.tracker.pass_dirty {
            self.device.depth_mask(false);
        }
        self.report_device_errors("clearing the depth buffer");
    }

    pub fn clear_stencil_buffer(&mut self, value: u32) {
        self.device.clear_stencil(value);
        self.report_device_errors("clearing the stencil buffer");
    }

    pub fn viewport_area(&self) -> Rect {
        self.viewport_area
    }

    pub fn set_viewport_area(&mut self, area: Rect) {
        self.viewport_area = area;
        self.device.viewport(area);
    }

    pub fn scissor_area(&self) -> Rect {
        self.scissor_area
    }

    /// Restricts drawing to `area`.  An area covering the whole canvas turns
    /// scissoring off.
    pub fn set_scissor_area(&mut self, area: Rect) {
        self.scissor_area = area;
        if area.covers(self.device.canvas_size()) {
            self.device.set_capability(Capability::ScissorTest, false);
        } else {
            self.device.set_capability(Capability::ScissorTest, true);
            self.device.scissor(area);
        }
    }
}

fn vertex(point: Vec2) -> Vertex2D {
    Vertex2D::new(point.x, point.y)
}
