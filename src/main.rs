use glam::{Mat4, Vec2, Vec3, Vec4};
use wendy::renderer::{Camera, Light, Rectangle, Vertex};
use wendy::{RecordingDevice, RenderError, RenderQueue, RenderSettings, RenderStyle, Renderer};

const FRAMES: usize = 3;

/// Renders a few frames of a spinning quad against the recording device and
/// logs how much state traffic each frame produced.
fn main() -> Result<(), RenderError> {
    wendy::init_logging();

    let settings = RenderSettings::load();
    let mut renderer = Renderer::new(RecordingDevice::new(), settings)?;
    let camera = Camera::looking_at(Vec3::new(0.0, 1.0, 4.0), Vec3::ZERO);

    // Queues borrow their styles for the whole submission, so take a copy
    // of the default style rather than borrowing it from the renderer.
    let default_style = renderer.default_style().clone();
    let mut overlay = RenderStyle::new("overlay");
    overlay
        .create_pass("")
        .set_blend_factors(wgpu::BlendFactor::SrcAlpha, wgpu::BlendFactor::OneMinusSrcAlpha);

    let quad = [
        Vertex { pos: [-1.0, -1.0, 0.0], normal: [0.0, 0.0, 1.0], uv: [0.0, 0.0] },
        Vertex { pos: [1.0, -1.0, 0.0], normal: [0.0, 0.0, 1.0], uv: [1.0, 0.0] },
        Vertex { pos: [1.0, 1.0, 0.0], normal: [0.0, 0.0, 1.0], uv: [1.0, 1.0] },
        Vertex { pos: [-1.0, 1.0, 0.0], normal: [0.0, 0.0, 1.0], uv: [0.0, 1.0] },
    ];
    let indices: [u16; 6] = [0, 1, 2, 0, 2, 3];

    for frame in 0..FRAMES {
        renderer.begin_frame()?;

        let vertices = renderer.allocate_vertices(quad.len() as u32, &Vertex::format())?;
        renderer.write_vertices(&vertices, &quad)?;
        let index_range =
            renderer.allocate_indices(indices.len() as u32, wendy::renderer::IndexType::U16)?;
        renderer.write_indices(&index_range, &indices)?;

        let angle = frame as f32 * 0.5;
        let mut queue = RenderQueue::new(&camera);
        queue.add_light(Light::directional(Vec3::new(-1.0, -1.0, -1.0), Vec4::ONE));

        let operation = queue.create_operation(&overlay);
        operation.transform = Mat4::from_rotation_y(angle);
        operation.vertices = vertices;
        operation.indices = Some(index_range);

        let operation = queue.create_operation(&default_style);
        operation.transform = Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0));
        operation.vertices = vertices;
        operation.indices = Some(index_range);

        renderer.device_mut().clear();
        renderer.clear_color_buffer(Vec4::new(0.1, 0.1, 0.1, 1.0));
        renderer.clear_depth_buffer(1.0);
        queue.render_operations(&mut renderer);

        renderer.begin_2d(Vec2::new(800.0, 600.0));
        renderer.set_color(Vec4::new(0.0, 0.0, 0.0, 0.5));
        renderer.fill_rectangle(&Rectangle::new(Vec2::new(8.0, 8.0), Vec2::new(160.0, 24.0)))?;
        renderer.set_color(Vec4::ONE);
        renderer.draw_rectangle(&Rectangle::new(Vec2::new(8.0, 8.0), Vec2::new(160.0, 24.0)))?;
        renderer.end()?;

        let state_calls = renderer
            .device()
            .calls()
            .iter()
            .filter(|call| call.is_state_change())
            .count();
        let stats = renderer.stats().current();
        log::info!(
            "Frame {}: {} operations, {} triangles, {} state calls",
            frame,
            stats.operation_count,
            stats.triangle_count,
            state_calls
        );

        renderer.finish_frame()?;
    }

    log::info!("Average frame rate: {:.1} fps", renderer.stats().frame_rate());
    Ok(())
}
