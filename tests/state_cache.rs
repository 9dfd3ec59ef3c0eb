use glam::Vec4;
use wendy::renderer::{
    Capability, CombineMode, CullMode, DeviceCall, MaterialColor, MinFilter, ProgramId,
    ProgramRef, SamplerType, ShaderProgram, TextureFlags, TextureParameter,
};
use wendy::{Device, RecordingDevice, RenderPass, RenderSettings, Renderer};
use wgpu::{
    AddressMode, BlendFactor, CompareFunction, FilterMode, PolygonMode, StencilOperation,
    TextureDimension,
};

const CANVAS_HEIGHT: u32 = 600;

fn renderer_with_units(units: u32) -> Renderer<RecordingDevice> {
    let device = RecordingDevice::new()
        .with_unit_count(units)
        .with_canvas_size(800, CANVAS_HEIGHT);
    let mut renderer = Renderer::new(device, RenderSettings::default()).unwrap();
    renderer.device_mut().clear();
    renderer
}

fn take(renderer: &mut Renderer<RecordingDevice>) -> Vec<DeviceCall> {
    renderer.device_mut().take_calls()
}

fn default_unit_force(unit: u32) -> Vec<DeviceCall> {
    vec![
        DeviceCall::ActiveTextureUnit(unit),
        DeviceCall::SetCapability(Capability::Texture(TextureDimension::D1), false),
        DeviceCall::SetCapability(Capability::Texture(TextureDimension::D2), false),
        DeviceCall::SetCapability(Capability::Texture(TextureDimension::D3), false),
        DeviceCall::SetCapability(Capability::SphereMap, false),
        DeviceCall::CombineMode(CombineMode::Modulate),
        DeviceCall::CombineColor(Vec4::ONE),
    ]
}

fn default_pass_force(line_width: f32) -> Vec<DeviceCall> {
    vec![
        DeviceCall::SetCapability(Capability::CullFace, true),
        DeviceCall::CullFace(CullMode::Back),
        DeviceCall::SetCapability(Capability::Lighting, false),
        DeviceCall::SetCapability(Capability::Blend, false),
        DeviceCall::BlendFunc(BlendFactor::One, BlendFactor::Zero),
        DeviceCall::PolygonMode(PolygonMode::Fill),
        DeviceCall::LineWidth(line_width * CANVAS_HEIGHT as f32 / 100.0),
        DeviceCall::DepthMask(true),
        DeviceCall::SetCapability(Capability::DepthTest, true),
        DeviceCall::DepthFunc(CompareFunction::Less),
        DeviceCall::ColorMask(true),
        DeviceCall::SetCapability(Capability::StencilTest, false),
        DeviceCall::StencilFunc(CompareFunction::Always, 0, !0),
        DeviceCall::StencilOp(
            StencilOperation::Keep,
            StencilOperation::Keep,
            StencilOperation::Keep,
        ),
        DeviceCall::FlatColor(Vec4::ONE),
        DeviceCall::MaterialColor(MaterialColor::Ambient, Vec4::new(0.0, 0.0, 0.0, 1.0)),
        DeviceCall::MaterialColor(MaterialColor::Diffuse, Vec4::ONE),
        DeviceCall::MaterialColor(MaterialColor::Specular, Vec4::ONE),
        DeviceCall::Shininess(0.0),
        DeviceCall::UseProgram(None),
    ]
}

fn texture_parameters(calls: &[DeviceCall]) -> Vec<TextureParameter> {
    calls
        .iter()
        .filter_map(|call| match call {
            DeviceCall::TextureParameter(_, parameter) => Some(*parameter),
            _ => None,
        })
        .collect()
}

#[test]
fn line_width_change_between_forces() {
    let mut renderer = renderer_with_units(2);
    let mut pass = RenderPass::new("");

    pass.apply(&mut renderer);
    let mut expected = default_pass_force(1.0);
    expected.extend(default_unit_force(0));
    expected.extend(default_unit_force(1));
    assert_eq!(take(&mut renderer), expected);

    pass.apply(&mut renderer);
    assert!(take(&mut renderer).is_empty());

    pass.set_line_width(2.0);
    pass.apply(&mut renderer);
    assert_eq!(take(&mut renderer), vec![DeviceCall::LineWidth(12.0)]);

    renderer.invalidate_state();
    pass.apply(&mut renderer);
    let mut expected = default_pass_force(2.0);
    expected.extend(default_unit_force(0));
    expected.extend(default_unit_force(1));
    assert_eq!(take(&mut renderer), expected);
}

#[test]
fn switching_passes_emits_only_differences() {
    let mut renderer = renderer_with_units(1);
    let opaque = RenderPass::new("");
    let mut blended = RenderPass::new("");
    blended.set_blend_factors(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha);
    blended.set_cull_mode(CullMode::None);
    blended.set_flat_color(Vec4::new(1.0, 0.0, 0.0, 0.5));

    opaque.apply(&mut renderer);
    take(&mut renderer);

    blended.apply(&mut renderer);
    assert_eq!(
        take(&mut renderer),
        vec![
            DeviceCall::SetCapability(Capability::CullFace, false),
            DeviceCall::SetCapability(Capability::Blend, true),
            DeviceCall::BlendFunc(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha),
            DeviceCall::FlatColor(Vec4::new(1.0, 0.0, 0.0, 0.5)),
        ]
    );

    opaque.apply(&mut renderer);
    assert_eq!(
        take(&mut renderer),
        vec![
            DeviceCall::SetCapability(Capability::CullFace, true),
            DeviceCall::CullFace(CullMode::Back),
            DeviceCall::SetCapability(Capability::Blend, false),
            DeviceCall::FlatColor(Vec4::ONE),
        ]
    );
}

#[test]
fn depth_state_transitions() {
    let mut renderer = renderer_with_units(1);
    let tested = RenderPass::new("");
    let mut disabled = RenderPass::new("");
    disabled.set_depth_testing(false);
    disabled.set_depth_writing(false);
    let mut fill = RenderPass::new("");
    fill.set_depth_testing(false);

    tested.apply(&mut renderer);
    take(&mut renderer);

    disabled.apply(&mut renderer);
    assert_eq!(
        take(&mut renderer),
        vec![
            DeviceCall::DepthMask(false),
            DeviceCall::SetCapability(Capability::DepthTest, false),
        ]
    );

    fill.apply(&mut renderer);
    assert_eq!(
        take(&mut renderer),
        vec![
            DeviceCall::DepthMask(true),
            DeviceCall::DepthFunc(CompareFunction::Always),
            DeviceCall::SetCapability(Capability::DepthTest, true),
        ]
    );

    tested.apply(&mut renderer);
    assert_eq!(
        take(&mut renderer),
        vec![DeviceCall::DepthFunc(CompareFunction::Less)]
    );
}

#[test]
fn stencil_and_lighting_groups() {
    let mut renderer = renderer_with_units(1);
    let plain = RenderPass::new("");
    let mut stenciled = RenderPass::new("");
    stenciled.set_stencil_testing(true);
    stenciled.set_stencil_function(CompareFunction::Equal, 1, 0xff);
    stenciled.set_lit(true);
    stenciled.set_shininess(32.0);

    plain.apply(&mut renderer);
    take(&mut renderer);

    stenciled.apply(&mut renderer);
    assert_eq!(
        take(&mut renderer),
        vec![
            DeviceCall::SetCapability(Capability::Lighting, true),
            DeviceCall::SetCapability(Capability::StencilTest, true),
            DeviceCall::StencilFunc(CompareFunction::Equal, 1, 0xff),
            DeviceCall::Shininess(32.0),
        ]
    );

    plain.apply(&mut renderer);
    assert_eq!(
        take(&mut renderer),
        vec![
            DeviceCall::SetCapability(Capability::Lighting, false),
            DeviceCall::SetCapability(Capability::StencilTest, false),
        ]
    );
}

#[test]
fn shared_texture_filters_are_sent_once() {
    let mut renderer = renderer_with_units(2);
    let bricks = renderer
        .create_texture(
            "bricks",
            TextureDimension::D2,
            (4, 4, 1),
            TextureFlags::MIPMAPPED,
            &[0; 64],
        )
        .unwrap();
    let bricks_id = renderer.texture(bricks).unwrap().id();
    renderer.device_mut().clear();

    let mut pass = RenderPass::new("");
    for _ in 0..2 {
        pass.create_texture_layer()
            .set_texture(Some(bricks))
            .set_filters(MinFilter::NEAREST, FilterMode::Nearest);
    }

    pass.apply(&mut renderer);
    let calls = take(&mut renderer);

    assert_eq!(
        texture_parameters(&calls),
        vec![
            TextureParameter::MinFilter(MinFilter::NEAREST),
            TextureParameter::MagFilter(FilterMode::Nearest),
        ]
    );
    let second_unit = calls
        .iter()
        .position(|call| *call == DeviceCall::ActiveTextureUnit(1))
        .unwrap();
    assert!(texture_parameters(&calls[second_unit..]).is_empty());
    assert_eq!(
        calls
            .iter()
            .filter(|call| **call == DeviceCall::BindTexture(TextureDimension::D2, bricks_id))
            .count(),
        2
    );
}

#[test]
fn unmipmapped_textures_get_downgraded_min_filter() {
    let mut renderer = renderer_with_units(1);
    let flat = renderer
        .create_texture(
            "flat",
            TextureDimension::D2,
            (2, 2, 1),
            TextureFlags::empty(),
            &[0; 16],
        )
        .unwrap();

    let mut pass = RenderPass::new("");
    pass.create_texture_layer().set_texture(Some(flat));
    pass.apply(&mut renderer);

    assert_eq!(
        texture_parameters(&take(&mut renderer)),
        vec![TextureParameter::MinFilter(MinFilter::LINEAR)]
    );
}

#[test]
fn invalidation_resends_texture_sampling_state() {
    let mut renderer = renderer_with_units(1);
    let texture = renderer.default_texture();
    let mut pass = RenderPass::new("");
    pass.create_texture_layer()
        .set_texture(Some(texture))
        .set_address_mode(AddressMode::ClampToEdge);

    pass.apply(&mut renderer);
    take(&mut renderer);

    renderer.invalidate_state();
    pass.apply(&mut renderer);

    assert_eq!(
        texture_parameters(&take(&mut renderer)),
        vec![
            TextureParameter::MinFilter(MinFilter::LINEAR_MIPMAP_LINEAR),
            TextureParameter::MagFilter(FilterMode::Linear),
            TextureParameter::AddressMode(AddressMode::ClampToEdge),
        ]
    );
}

#[test]
fn layer_changes_are_diffed_per_unit() {
    let mut renderer = renderer_with_units(2);
    let texture = renderer.default_texture();
    let texture_id = renderer.texture(texture).unwrap().id();

    let plain = RenderPass::new("");
    let mut textured = RenderPass::new("");
    textured
        .create_texture_layer()
        .set_texture(Some(texture))
        .set_combine_mode(CombineMode::Replace);

    plain.apply(&mut renderer);
    take(&mut renderer);

    textured.apply(&mut renderer);
    let calls = take(&mut renderer);
    assert_eq!(
        calls[..4],
        [
            DeviceCall::ActiveTextureUnit(0),
            DeviceCall::SetCapability(Capability::Texture(TextureDimension::D2), true),
            DeviceCall::BindTexture(TextureDimension::D2, texture_id),
            DeviceCall::CombineMode(CombineMode::Replace),
        ]
    );
    assert!(!calls.contains(&DeviceCall::ActiveTextureUnit(1)));

    plain.apply(&mut renderer);
    assert_eq!(
        take(&mut renderer),
        vec![
            DeviceCall::SetCapability(Capability::Texture(TextureDimension::D2), false),
            DeviceCall::CombineMode(CombineMode::Modulate),
        ]
    );
}

#[test]
fn sampler_uniforms_are_written_once_per_program() {
    let mut renderer = renderer_with_units(1);
    renderer.add_program(
        ShaderProgram::new(ProgramId(9), "lit")
            .with_sampler("diffuse", 3, SamplerType::Sampler2D)
            .with_sampler("volume", 4, SamplerType::Sampler3D),
    );
    let texture = renderer.default_texture();

    let mut pass = RenderPass::new("");
    pass.set_program_name("lit", &renderer);
    pass.create_texture_layer()
        .set_texture(Some(texture))
        .set_sampler_name("diffuse");

    pass.apply(&mut renderer);
    let calls = take(&mut renderer);
    assert!(calls.contains(&DeviceCall::UseProgram(Some(ProgramId(9)))));
    assert_eq!(
        calls
            .iter()
            .filter(|call| matches!(call, DeviceCall::SetSampler { .. }))
            .collect::<Vec<_>>(),
        vec![&DeviceCall::SetSampler {
            program: ProgramId(9),
            location: 3,
            unit: 0
        }]
    );

    pass.apply(&mut renderer);
    assert!(take(&mut renderer).is_empty());

    let mut mismatched = RenderPass::new("");
    mismatched.set_program_name("lit", &renderer);
    mismatched
        .create_texture_layer()
        .set_texture(Some(texture))
        .set_sampler_name("volume");
    mismatched.apply(&mut renderer);
    assert!(!take(&mut renderer)
        .iter()
        .any(|call| matches!(call, DeviceCall::SetSampler { .. })));
}

#[test]
fn missing_program_keeps_previous_binding() {
    let mut renderer = renderer_with_units(1);
    renderer.add_program(ShaderProgram::new(ProgramId(5), "toon"));

    let mut toon = RenderPass::new("");
    toon.set_program_name("toon", &renderer);
    let mut broken = RenderPass::new("");
    broken.set_program_name("does-not-exist", &renderer);
    assert_eq!(
        *broken.program(),
        ProgramRef::Missing("does-not-exist".to_owned())
    );

    toon.apply(&mut renderer);
    take(&mut renderer);

    broken.apply(&mut renderer);
    assert!(take(&mut renderer).is_empty());
    assert_eq!(
        renderer.tracker().current_program(),
        renderer.find_program("toon")
    );

    RenderPass::new("").apply(&mut renderer);
    assert_eq!(take(&mut renderer), vec![DeviceCall::UseProgram(None)]);
}

#[test]
fn device_errors_are_drained_but_not_escalated() {
    let mut renderer = renderer_with_units(1);
    renderer
        .device_mut()
        .push_error(wendy::renderer::DeviceError::InvalidEnum);

    RenderPass::new("").apply(&mut renderer);

    assert_eq!(renderer.device_mut().take_error(), None);
}

#[test]
fn error_checks_can_be_disabled() {
    let settings = RenderSettings {
        check_errors: false,
        ..RenderSettings::default()
    };
    let mut renderer = Renderer::new(RecordingDevice::new(), settings).unwrap();
    renderer
        .device_mut()
        .push_error(wendy::renderer::DeviceError::OutOfMemory);

    RenderPass::new("").apply(&mut renderer);

    assert_eq!(
        renderer.device_mut().take_error(),
        Some(wendy::renderer::DeviceError::OutOfMemory)
    );
}

#[test]
fn layers_past_the_unit_count_are_ignored() {
    let mut renderer = renderer_with_units(1);
    let texture = renderer.default_texture();
    let mut pass = RenderPass::new("");
    pass.create_texture_layer().set_texture(Some(texture));
    pass.create_texture_layer().set_texture(Some(texture));
    assert!(!pass.textures().is_compatible(renderer.tracker().unit_count()));

    pass.apply(&mut renderer);

    assert!(!take(&mut renderer).contains(&DeviceCall::ActiveTextureUnit(1)));
}

#[test]
fn invalidation_picks_up_a_changed_unit_count() {
    let mut renderer = renderer_with_units(2);
    let pass = RenderPass::new("");
    pass.apply(&mut renderer);
    take(&mut renderer);

    renderer.device_mut().set_unit_count(4);
    renderer.invalidate_state();
    assert_eq!(renderer.tracker().unit_count(), 4);

    pass.apply(&mut renderer);
    let mut expected = default_pass_force(1.0);
    for unit in 0..4 {
        expected.extend(default_unit_force(unit));
    }
    assert_eq!(take(&mut renderer), expected);

    renderer.device_mut().set_unit_count(1);
    renderer.invalidate_state();
    assert_eq!(renderer.tracker().unit_count(), 1);

    pass.apply(&mut renderer);
    let mut expected = default_pass_force(1.0);
    expected.extend(default_unit_force(0));
    assert_eq!(take(&mut renderer), expected);
}
