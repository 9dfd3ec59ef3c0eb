use glam::{Vec3, Vec4};
use wendy::renderer::{
    Camera, Capability, DeviceCall, GroupStage, Light, RenderStageStack, TextureFlags, VertexRange,
};
use wendy::{Device, RecordingDevice, RenderQueue, RenderSettings, RenderStyle, Renderer};
use wgpu::{BlendFactor, PrimitiveTopology, TextureDimension};

fn renderer() -> Renderer<RecordingDevice> {
    let mut renderer = Renderer::new(RecordingDevice::new(), RenderSettings::default()).unwrap();
    renderer.device_mut().clear();
    renderer
}

fn camera() -> Camera {
    Camera::looking_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO)
}

fn opaque(name: &str) -> RenderStyle {
    let mut style = RenderStyle::new(name);
    style.create_pass("");
    style
}

fn blended(name: &str) -> RenderStyle {
    let mut style = RenderStyle::new(name);
    style
        .create_pass("")
        .set_blend_factors(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha);
    style
}

fn drawn_starts(calls: &[DeviceCall]) -> Vec<u32> {
    calls
        .iter()
        .filter_map(|call| match call {
            DeviceCall::Draw(_, vertices) => Some(vertices.start),
            DeviceCall::DrawIndexed(_, vertices, _) => Some(vertices.start),
            _ => None,
        })
        .collect()
}

#[test]
fn blending_operations_draw_last() {
    let mut renderer = renderer();
    let camera = camera();
    let first = opaque("first");
    let glass = blended("glass");
    let third = opaque("third");

    let mut queue = RenderQueue::new(&camera);
    for (style, start) in [(&first, 0), (&glass, 10), (&third, 20)] {
        let operation = queue.create_operation(style);
        operation.vertices = VertexRange::new(Default::default(), start, 3);
    }
    queue.render_operations(&mut renderer);

    assert_eq!(drawn_starts(renderer.device().calls()), vec![0, 20, 10]);
    let current = renderer.stats().current();
    assert_eq!(current.operation_count, 3);
    assert_eq!(current.pass_count, 3);
    assert_eq!(current.triangle_count, 3);
}

#[test]
fn submission_is_wrapped_in_projection_transforms_and_lights() {
    let mut renderer = renderer();
    let camera = camera();
    let style = opaque("plain");

    let mut queue = RenderQueue::new(&camera);
    queue.add_light(Light::directional(Vec3::NEG_Y, Vec4::ONE));
    queue.add_light(Light::point(Vec3::new(0.0, 2.0, 0.0), 10.0, Vec4::ONE));
    let operation = queue.create_operation(&style);
    operation.vertices = VertexRange::new(Default::default(), 0, 4);
    operation.render_mode = PrimitiveTopology::LineList;
    queue.render_operations(&mut renderer);

    let calls = renderer.device().calls();
    let expected_projection = camera.proj_for_canvas(renderer.device().canvas_size());
    assert_eq!(calls[0], DeviceCall::SetProjection(expected_projection));
    assert!(matches!(calls[1], DeviceCall::SetLight(0, true)));
    assert!(matches!(calls[2], DeviceCall::SetLight(1, true)));
    assert_eq!(calls[3], DeviceCall::PushTransform(camera.view()));

    let len = calls.len();
    assert_eq!(
        calls[len - 4..],
        [
            DeviceCall::Draw(
                PrimitiveTopology::LineList,
                VertexRange::new(Default::default(), 0, 4)
            ),
            DeviceCall::PopTransform,
            DeviceCall::SetLight(0, false),
            DeviceCall::SetLight(1, false),
        ]
    );
    assert_eq!(renderer.stats().current().line_count, 2);
}

#[test]
fn queue_only_draws_the_default_group() {
    let mut renderer = renderer();
    let camera = camera();
    let mut style = RenderStyle::new("shadowed");
    style.create_pass("shadow").set_line_width(4.0);
    style.create_pass("");

    let mut queue = RenderQueue::new(&camera);
    queue.create_operation(&style).vertices = VertexRange::new(Default::default(), 0, 3);

    queue.render_operations(&mut renderer);
    assert_eq!(drawn_starts(renderer.device().calls()).len(), 1);
    assert!(!renderer
        .device()
        .calls()
        .iter()
        .any(|call| matches!(call, DeviceCall::LineWidth(width) if *width == 24.0)));

    renderer.device_mut().clear();
    queue.render_group(&mut renderer, "shadow");
    let calls = renderer.device().calls();
    assert_eq!(drawn_starts(calls).len(), 1);
    assert!(calls.contains(&DeviceCall::LineWidth(24.0)));
}

#[test]
fn group_stages_render_their_group() {
    let mut renderer = renderer();
    let camera = camera();
    let mut style = RenderStyle::new("outlined");
    style.create_pass("");
    style.create_pass("outline");
    style.create_pass("outline");

    let mut queue = RenderQueue::new(&camera);
    queue.create_operation(&style).vertices = VertexRange::new(Default::default(), 7, 3);

    let mut stages = RenderStageStack::new();
    stages.add_stage(Box::new(GroupStage::new("outline")));
    stages.add_stage(Box::new(GroupStage::new("missing")));
    stages.prepare(&queue);
    stages.render(&mut renderer, &mut queue);

    assert_eq!(drawn_starts(renderer.device().calls()), vec![7, 7]);
    assert_eq!(renderer.stats().current().operation_count, 2);
}

#[test]
fn operations_can_be_rebuilt_every_frame() {
    let mut renderer = renderer();
    let camera = camera();
    let style = renderer.default_style().clone();

    let mut queue = RenderQueue::new(&camera);
    for frame in 0..3u32 {
        renderer.begin_frame().unwrap();
        queue.destroy_operations();
        for i in 0..=frame {
            queue.create_operation(&style).vertices =
                VertexRange::new(Default::default(), i, 3);
        }
        assert_eq!(queue.operations().len(), frame as usize + 1);
        queue.render_operations(&mut renderer);
        renderer.finish_frame().unwrap();
    }

    let frames: Vec<u32> = renderer
        .stats()
        .completed()
        .map(|frame| frame.operation_count)
        .collect();
    assert_eq!(frames, vec![3, 2, 1]);
}

#[test]
fn repeated_frames_only_resend_what_changed() {
    let mut renderer = renderer();
    let camera = camera();
    let bricks = renderer
        .create_texture(
            "bricks",
            TextureDimension::D2,
            (2, 2, 1),
            TextureFlags::empty(),
            &[128; 16],
        )
        .unwrap();
    let bricks_id = renderer.texture(bricks).unwrap().id();
    let mut wall = RenderStyle::new("wall");
    wall.create_pass("").create_texture_layer().set_texture(Some(bricks));
    let floor = opaque("floor");

    let mut queue = RenderQueue::new(&camera);
    queue.create_operation(&wall);
    queue.create_operation(&floor);

    queue.render_operations(&mut renderer);
    renderer.device_mut().clear();
    queue.render_operations(&mut renderer);

    let state_calls: Vec<&DeviceCall> = renderer
        .device()
        .calls()
        .iter()
        .filter(|call| call.is_state_change())
        .filter(|call| {
            !matches!(
                call,
                DeviceCall::SetProjection(_)
                    | DeviceCall::PushTransform(_)
                    | DeviceCall::PopTransform
                    | DeviceCall::SetLight(..)
            )
        })
        .collect();
    assert_eq!(
        state_calls,
        vec![
            &DeviceCall::SetCapability(Capability::Texture(TextureDimension::D2), true),
            &DeviceCall::BindTexture(TextureDimension::D2, bricks_id),
            &DeviceCall::SetCapability(Capability::Texture(TextureDimension::D2), false),
        ]
    );
}
