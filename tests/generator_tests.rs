//! Shader Generator Integration Tests
//!
//! Tests for:
//! - Technique registration: idempotence, scheme conflicts, removal
//! - Scheme validation: rebuild flags, light/fog drift, failure retry
//! - Generated passes, program sharing and parameter updates
//! - Cloning shader-based techniques between materials
//! - Illumination passes, cache path and target language

mod common;

use common::{
    MockScene, add_lit_material, add_programmable_material, add_textured_material, setup,
    setup_with,
};
use glam::Mat4;
use rtshader::features::ffp::FfpFog;
use rtshader::material::{DEFAULT_GROUP, IlluminationStage};
use rtshader::program::NullBackend;
use rtshader::{
    DEFAULT_SCHEME_NAME, ErrorKind, FogMode, GeneratorSettings, LightType, ShaderStage,
};

const FORWARD: &str = "Forward";

// ============================================================================
// Technique Registration
// ============================================================================

#[test]
fn create_technique_is_idempotent() {
    let fx = setup();
    add_lit_material(&fx.materials, "rock");

    assert!(fx.generator.create_shader_based_technique("rock", DEFAULT_GROUP, "", FORWARD, false));
    assert!(fx.generator.create_shader_based_technique("rock", DEFAULT_GROUP, "", FORWARD, false));
    assert_eq!(fx.generator.technique_count(), 1);
    assert!(fx.generator.has_scheme(FORWARD));
    assert!(fx.generator.has_shader_based_technique("rock", DEFAULT_GROUP, "", FORWARD));
}

#[test]
fn unknown_material_or_scheme_is_rejected() {
    let fx = setup();
    add_lit_material(&fx.materials, "rock");

    assert!(!fx.generator.create_shader_based_technique("missing", DEFAULT_GROUP, "", FORWARD, false));
    assert!(!fx.generator.create_shader_based_technique("rock", DEFAULT_GROUP, "HighQuality", FORWARD, false));
    assert_eq!(fx.generator.technique_count(), 0);
}

#[test]
fn autodetect_group_resolves_material() {
    let fx = setup();
    add_lit_material(&fx.materials, "rock");

    assert!(fx.generator.create_shader_based_technique("rock", "Autodetect", "", FORWARD, false));
    assert!(fx.generator.has_shader_based_technique("rock", DEFAULT_GROUP, "", FORWARD));
    assert!(fx.generator.remove_all_shader_based_techniques_for("rock", "Autodetect"));
}

#[test]
fn programmable_technique_needs_over_programmable() {
    let fx = setup();
    add_programmable_material(&fx.materials, "custom");

    assert!(!fx.generator.create_shader_based_technique("custom", DEFAULT_GROUP, "", FORWARD, false));
    assert!(fx.generator.create_shader_based_technique("custom", DEFAULT_GROUP, "", FORWARD, true));

    let report = fx.generator.validate_scheme(FORWARD).unwrap();
    assert_eq!(report.acquired, 1);
    let passes = fx.generator.generated_passes("custom", DEFAULT_GROUP);
    let (vs, _) = passes[0].programs.clone().expect("programs generated over the existing ones");
    assert!(vs.starts_with("VS_"));
}

#[test]
fn remove_technique_unlinks_everywhere() {
    let fx = setup();
    add_lit_material(&fx.materials, "rock");
    fx.generator.create_shader_based_technique("rock", DEFAULT_GROUP, "", FORWARD, false);
    fx.generator.validate_scheme(FORWARD).unwrap();
    assert_eq!(fx.materials.read().by_name("rock", DEFAULT_GROUP).unwrap().technique_count(), 2);

    assert!(fx.generator.remove_shader_based_technique("rock", DEFAULT_GROUP, "", FORWARD));
    assert_eq!(fx.generator.technique_count(), 0);
    assert!(!fx.generator.has_shader_based_technique("rock", DEFAULT_GROUP, "", FORWARD));
    assert!(fx.generator.generated_passes("rock", DEFAULT_GROUP).is_empty());
    assert_eq!(fx.materials.read().by_name("rock", DEFAULT_GROUP).unwrap().technique_count(), 1);

    assert!(!fx.generator.remove_shader_based_technique("rock", DEFAULT_GROUP, "", FORWARD));
}

#[test]
fn remove_all_without_techniques_returns_false() {
    let fx = setup();
    add_lit_material(&fx.materials, "rock");
    assert!(!fx.generator.remove_all_shader_based_techniques_for("rock", DEFAULT_GROUP));
}

#[test]
fn trim_evicts_only_released_programs() {
    let fx = setup();
    add_lit_material(&fx.materials, "rock");
    add_textured_material(&fx.materials, "crate");
    fx.generator.create_shader_based_technique("rock", DEFAULT_GROUP, "", FORWARD, false);
    fx.generator.validate_scheme(FORWARD).unwrap();
    assert_eq!(fx.generator.trim_shader_cache(), 0);

    assert!(fx.materials.remove("rock", DEFAULT_GROUP));
    assert_eq!(fx.generator.trim_shader_cache(), 2);
    assert_eq!(fx.generator.shader_count(ShaderStage::Vertex), 0);
    assert_eq!(fx.backend.live_count(), 0);

    fx.generator.create_shader_based_technique("crate", DEFAULT_GROUP, "", FORWARD, false);
    fx.generator.validate_scheme(FORWARD).unwrap();
    let live = fx.backend.live_count();
    assert!(live > 0);
    assert_eq!(fx.generator.trim_shader_cache(), 0);
    assert_eq!(fx.backend.live_count(), live);
}

#[test]
fn material_removal_drops_its_techniques() {
    let fx = setup();
    add_lit_material(&fx.materials, "rock");
    fx.generator.create_shader_based_technique("rock", DEFAULT_GROUP, "", FORWARD, false);
    fx.generator.validate_scheme(FORWARD).unwrap();

    assert!(fx.materials.remove("rock", DEFAULT_GROUP));
    assert_eq!(fx.generator.technique_count(), 0);
    assert_eq!(fx.generator.shader_count(ShaderStage::Vertex), 1);
}

// ============================================================================
// Scheme Validation
// ============================================================================

#[test]
fn second_validation_rebuilds_nothing() {
    let fx = setup();
    add_lit_material(&fx.materials, "rock");
    fx.generator.create_shader_based_technique("rock", DEFAULT_GROUP, "", FORWARD, false);

    let first = fx.generator.validate_scheme(FORWARD).unwrap();
    assert_eq!((first.rebuilt, first.acquired), (1, 1));
    let created = fx.backend.created_count();

    let second = fx.generator.validate_scheme(FORWARD).unwrap();
    assert_eq!((second.rebuilt, second.acquired), (0, 0));
    assert_eq!(fx.backend.created_count(), created);
}

#[test]
fn unknown_scheme_fails_validation() {
    let fx = setup();
    let err = fx.generator.validate_scheme("Nope").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn light_count_drift_triggers_rebuild() {
    let fx = setup();
    let scene = MockScene::new("main");
    fx.generator.add_scene_manager(scene.clone());
    add_lit_material(&fx.materials, "rock");
    fx.generator.create_shader_based_technique("rock", DEFAULT_GROUP, "", FORWARD, false);

    scene.set_lights(&[LightType::Directional]);
    assert_eq!(fx.generator.validate_scheme(FORWARD).unwrap().rebuilt, 1);
    assert_eq!(fx.generator.validate_scheme(FORWARD).unwrap().rebuilt, 0);
    let (vs, _) = fx.generator.generated_passes("rock", DEFAULT_GROUP)[0]
        .programs
        .clone()
        .unwrap();
    let source = fx.backend.source_of(&vs).unwrap();
    assert!(source.contains("#define LIGHT_COUNT_DIRECTIONAL 1"), "{source}");

    scene.set_lights(&[LightType::Directional, LightType::Point]);
    assert_eq!(fx.generator.validate_scheme(FORWARD).unwrap().rebuilt, 1);

    // Same counts in a different order are not a change.
    scene.set_lights(&[LightType::Point, LightType::Directional]);
    assert_eq!(fx.generator.validate_scheme(FORWARD).unwrap().rebuilt, 0);
}

#[test]
fn explicit_global_light_count_shapes_programs() {
    let fx = setup();
    add_lit_material(&fx.materials, "rock");
    fx.generator.create_shader_based_technique("rock", DEFAULT_GROUP, "", FORWARD, false);
    fx.generator
        .with_scheme_render_state(FORWARD, |state| state.set_light_count(glam::IVec3::new(0, 2, 0)))
        .unwrap();
    fx.generator.validate_scheme(FORWARD).unwrap();

    let passes = fx.generator.generated_passes("rock", DEFAULT_GROUP);
    let (vs, _) = passes[0].programs.clone().unwrap();
    let source = fx.backend.source_of(&vs).unwrap();
    assert!(source.contains("#define LIGHT_COUNT_DIRECTIONAL 2"), "{source}");
}

#[test]
fn fog_drift_adds_fog_stage() {
    let fx = setup();
    let scene = MockScene::new("main");
    fx.generator.add_scene_manager(scene.clone());
    add_lit_material(&fx.materials, "rock");
    fx.generator.create_shader_based_technique("rock", DEFAULT_GROUP, "", FORWARD, false);

    fx.generator.validate_scheme(FORWARD).unwrap();
    let passes = fx.generator.generated_passes("rock", DEFAULT_GROUP);
    assert!(!passes[0].sub_render_states.contains(&FfpFog::TYPE));

    scene.set_fog(FogMode::Linear);
    assert_eq!(fx.generator.validate_scheme(FORWARD).unwrap().rebuilt, 1);
    let passes = fx.generator.generated_passes("rock", DEFAULT_GROUP);
    assert!(passes[0].sub_render_states.contains(&FfpFog::TYPE));
}

#[test]
fn acquisition_failure_is_reported_and_retried() {
    let fx = setup();
    add_lit_material(&fx.materials, "rock");
    fx.generator.create_shader_based_technique("rock", DEFAULT_GROUP, "", FORWARD, false);

    fx.backend.set_fail_compiles(true);
    let report = fx.generator.validate_scheme(FORWARD).unwrap();
    assert_eq!(report.acquired, 0);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].material, "rock");
    assert_eq!(report.failures[0].error.kind(), ErrorKind::Program);

    // Still dirty: the next validation retries.
    let report = fx.generator.validate_scheme(FORWARD).unwrap();
    assert_eq!(report.rebuilt, 1);
    assert!(!report.is_complete());

    fx.backend.set_fail_compiles(false);
    let report = fx.generator.validate_scheme(FORWARD).unwrap();
    assert!(report.is_complete());
    assert_eq!(report.acquired, 1);
    assert_eq!(fx.generator.validate_scheme(FORWARD).unwrap().rebuilt, 0);
}

#[test]
fn partial_acquisition_clears_only_successful_techniques() {
    let fx = setup();
    add_lit_material(&fx.materials, "rock");
    add_textured_material(&fx.materials, "crate");
    fx.generator.create_shader_based_technique("rock", DEFAULT_GROUP, "", FORWARD, false);
    fx.generator.validate_scheme(FORWARD).unwrap();

    // Rock's programs come back from the cache; crate needs new ones.
    fx.backend.set_fail_compiles(true);
    fx.generator.create_shader_based_technique("crate", DEFAULT_GROUP, "", FORWARD, false);
    fx.generator.invalidate_material(FORWARD, "rock", DEFAULT_GROUP);
    let report = fx.generator.validate_scheme(FORWARD).unwrap();
    assert_eq!(report.rebuilt, 2);
    assert_eq!(report.acquired, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].material, "crate");

    let report = fx.generator.validate_scheme(FORWARD).unwrap();
    assert_eq!(report.rebuilt, 1);
    assert_eq!(report.failures[0].material, "crate");
}

#[test]
fn invalidate_material_rebuilds_only_that_material() {
    let fx = setup();
    add_lit_material(&fx.materials, "rock");
    add_lit_material(&fx.materials, "sand");
    fx.generator.create_shader_based_technique("rock", DEFAULT_GROUP, "", FORWARD, false);
    fx.generator.create_shader_based_technique("sand", DEFAULT_GROUP, "", FORWARD, false);
    assert_eq!(fx.generator.validate_scheme(FORWARD).unwrap().rebuilt, 2);

    assert!(fx.generator.invalidate_material(FORWARD, "rock", DEFAULT_GROUP));
    assert!(!fx.generator.invalidate_material(FORWARD, "missing", DEFAULT_GROUP));
    assert_eq!(fx.generator.validate_scheme(FORWARD).unwrap().rebuilt, 1);

    fx.generator.invalidate_material(FORWARD, "sand", DEFAULT_GROUP);
    assert!(fx.generator.validate_material(FORWARD, "sand", DEFAULT_GROUP).unwrap());
    assert!(!fx.generator.validate_material(FORWARD, "sand", DEFAULT_GROUP).unwrap());
}

// ============================================================================
// Generated Passes & Programs
// ============================================================================

#[test]
fn fixed_function_round_trip() {
    let fx = setup();
    add_lit_material(&fx.materials, "rock");
    fx.generator.create_shader_based_technique("rock", DEFAULT_GROUP, "", FORWARD, false);
    fx.generator.validate_scheme(FORWARD).unwrap();

    let passes = fx.generator.generated_passes("rock", DEFAULT_GROUP);
    assert_eq!(passes.len(), 1);
    let pass = &passes[0];
    assert_eq!(pass.scheme, FORWARD);
    assert_eq!(pass.stage, None);
    assert_eq!(pass.sub_render_states, ["FFP_Transform", "FFP_Colour", "FFP_Lighting"]);

    let library = fx.materials.read();
    let material = library.by_name("rock", DEFAULT_GROUP).unwrap();
    let (technique, dst) = material.find_pass(pass.dst_pass).unwrap();
    assert_eq!(technique.scheme_name, FORWARD);
    let (vs, fs) = pass.programs.clone().unwrap();
    assert_eq!(dst.vertex_program(), Some(vs.as_str()));
    assert_eq!(dst.fragment_program(), Some(fs.as_str()));

    let info = fx.generator.technique_info(technique.id()).unwrap();
    assert_eq!(info.material, "rock");
    assert_eq!(info.dst_scheme, FORWARD);
    assert_eq!(info.pass_count, 1);
    assert!(fx.generator.is_generated_pass(pass.dst_pass));
    assert!(!fx.generator.is_generated_pass(pass.src_pass));
}

#[test]
fn identical_passes_share_programs() {
    let fx = setup();
    add_lit_material(&fx.materials, "rock");
    add_lit_material(&fx.materials, "sand");
    fx.generator.create_shader_based_technique("rock", DEFAULT_GROUP, "", FORWARD, false);
    fx.generator.create_shader_based_technique("sand", DEFAULT_GROUP, "", FORWARD, false);
    fx.generator.validate_scheme(FORWARD).unwrap();

    assert_eq!(fx.generator.shader_count(ShaderStage::Vertex), 1);
    assert_eq!(fx.generator.shader_count(ShaderStage::Fragment), 1);
    let (vs, _) = fx.generator.generated_passes("rock", DEFAULT_GROUP)[0]
        .programs
        .clone()
        .unwrap();
    assert_eq!(fx.generator.program_ref_count(&vs), 2);
}

#[test]
fn draw_notifications_need_a_validated_viewport() {
    let fx = setup();
    let scene = MockScene::new("main");
    fx.generator.add_scene_manager(scene.clone());
    assert_eq!(scene.listener_count(), 2);

    add_lit_material(&fx.materials, "rock");
    fx.generator.create_shader_based_technique("rock", DEFAULT_GROUP, "", FORWARD, false);
    fx.generator.validate_scheme(FORWARD).unwrap();
    let dst_pass = fx.generator.generated_passes("rock", DEFAULT_GROUP)[0].dst_pass;

    scene.draw(&Mat4::IDENTITY, dst_pass, &[]);
    assert_eq!(fx.backend.update_count(), 0);

    scene.begin_frame(FORWARD);
    scene.draw(&Mat4::IDENTITY, dst_pass, &[]);
    assert_eq!(fx.backend.update_count(), 2);

    // Unknown viewport scheme invalidates the fast path.
    scene.begin_frame("NoSuchScheme");
    scene.draw(&Mat4::IDENTITY, dst_pass, &[]);
    assert_eq!(fx.backend.update_count(), 2);

    fx.generator.remove_scene_manager("main");
    assert_eq!(scene.listener_count(), 0);
    assert!(fx.generator.active_scene_manager().is_none());
}

#[test]
fn flush_forces_regeneration() {
    let fx = setup();
    add_lit_material(&fx.materials, "rock");
    fx.generator.create_shader_based_technique("rock", DEFAULT_GROUP, "", FORWARD, false);
    fx.generator.validate_scheme(FORWARD).unwrap();

    fx.generator.flush_shader_cache();
    assert_eq!(fx.generator.shader_count(ShaderStage::Vertex), 0);
    assert_eq!(fx.backend.live_count(), 0);
    assert!(fx.generator.generated_passes("rock", DEFAULT_GROUP)[0].programs.is_none());

    assert_eq!(fx.generator.validate_scheme(FORWARD).unwrap().acquired, 1);
    assert_eq!(fx.backend.live_count(), 2);
}

// ============================================================================
// Custom Render States & Cloning
// ============================================================================

#[test]
fn custom_render_state_overrides_fixed_function() {
    let fx = setup();
    add_lit_material(&fx.materials, "rock");
    fx.generator.create_shader_based_technique("rock", DEFAULT_GROUP, "", FORWARD, false);
    fx.generator
        .with_pass_render_state(FORWARD, "rock", DEFAULT_GROUP, 0, |state| {
            state.add_template(Box::new(rtshader::features::ext::PerPixelLighting::default()));
        })
        .unwrap()
        .unwrap();
    fx.generator.validate_scheme(FORWARD).unwrap();

    let passes = fx.generator.generated_passes("rock", DEFAULT_GROUP);
    assert_eq!(
        passes[0].sub_render_states,
        ["FFP_Transform", "FFP_Colour", "SGX_PerPixelLighting"]
    );

    let missing = fx
        .generator
        .with_pass_render_state(FORWARD, "sand", DEFAULT_GROUP, 0, |_| ())
        .unwrap();
    assert!(missing.is_none());
}

#[test]
fn clone_deep_copies_custom_state() {
    let fx = setup();
    add_lit_material(&fx.materials, "rock");
    add_lit_material(&fx.materials, "rock_copy");
    fx.generator.create_shader_based_technique("rock", DEFAULT_GROUP, "", FORWARD, false);
    fx.generator
        .with_pass_render_state(FORWARD, "rock", DEFAULT_GROUP, 0, |state| {
            state.add_template(Box::new(FfpFog::per_pixel()));
        })
        .unwrap();

    assert!(fx.generator.clone_shader_based_techniques("rock", DEFAULT_GROUP, "rock_copy", DEFAULT_GROUP));
    assert!(fx.generator.has_shader_based_technique("rock_copy", DEFAULT_GROUP, "", FORWARD));

    fx.generator
        .with_pass_render_state(FORWARD, "rock", DEFAULT_GROUP, 0, |state| {
            state.remove_template(FfpFog::TYPE);
        })
        .unwrap();

    let copied = fx
        .generator
        .with_pass_render_state(FORWARD, "rock_copy", DEFAULT_GROUP, 0, |state| {
            state.template(FfpFog::TYPE).is_some()
        })
        .unwrap();
    assert_eq!(copied, Some(true));
}

#[test]
fn clone_onto_itself_is_rejected() {
    let fx = setup();
    add_lit_material(&fx.materials, "rock");
    fx.generator.create_shader_based_technique("rock", DEFAULT_GROUP, "", FORWARD, false);
    assert!(!fx.generator.clone_shader_based_techniques("rock", DEFAULT_GROUP, "rock", DEFAULT_GROUP));
    assert_eq!(fx.generator.technique_count(), 1);
    assert!(fx.generator.has_shader_based_technique("rock", DEFAULT_GROUP, "", FORWARD));
    assert!(!fx.generator.clone_shader_based_techniques("rock", DEFAULT_GROUP, "missing", DEFAULT_GROUP));
}

#[test]
fn clone_replaces_stale_generated_techniques() {
    let fx = setup();
    add_lit_material(&fx.materials, "rock");
    fx.generator.create_shader_based_technique("rock", DEFAULT_GROUP, "", FORWARD, false);
    fx.generator.validate_scheme(FORWARD).unwrap();

    // A plain duplicate carries the generated technique along.
    let copy = fx
        .materials
        .read()
        .by_name("rock", DEFAULT_GROUP)
        .unwrap()
        .duplicate("rock_copy", DEFAULT_GROUP);
    assert_eq!(copy.technique_count(), 2);
    fx.materials.add(copy);

    assert!(fx.generator.clone_shader_based_techniques("rock", DEFAULT_GROUP, "rock_copy", DEFAULT_GROUP));
    fx.generator.validate_scheme(FORWARD).unwrap();

    let library = fx.materials.read();
    let copy = library.by_name("rock_copy", DEFAULT_GROUP).unwrap();
    assert_eq!(copy.technique_count(), 2);
    assert_eq!(
        copy.techniques().iter().filter(|t| t.scheme_name == FORWARD).count(),
        1
    );
}

// ============================================================================
// Illumination Passes
// ============================================================================

#[test]
fn illumination_passes_are_generated_per_stage() {
    let fx = setup();
    add_textured_material(&fx.materials, "crate");
    fx.generator.create_shader_based_technique("crate", DEFAULT_GROUP, "", FORWARD, false);
    fx.generator.validate_scheme(FORWARD).unwrap();

    assert!(fx
        .generator
        .validate_material_illumination_passes(FORWARD, "crate", DEFAULT_GROUP)
        .unwrap());
    let stages: Vec<_> = fx
        .generator
        .generated_passes("crate", DEFAULT_GROUP)
        .into_iter()
        .filter_map(|p| p.stage)
        .collect();
    assert_eq!(
        stages,
        [IlluminationStage::Ambient, IlluminationStage::PerLight, IlluminationStage::Decal]
    );

    assert!(fx
        .generator
        .invalidate_material_illumination_passes(FORWARD, "crate", DEFAULT_GROUP)
        .unwrap());
    assert_eq!(fx.generator.generated_passes("crate", DEFAULT_GROUP).len(), 2);
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn shader_cache_path_is_probed_and_used() {
    let dir = tempfile::tempdir().unwrap();
    let fx = setup();
    fx.generator.set_shader_cache_path(dir.path()).unwrap();
    let path = fx.generator.shader_cache_path().unwrap();
    assert!(path.to_string_lossy().ends_with('/'));
    assert!(!dir.path().join("ShaderGenerator.tst").exists());

    add_lit_material(&fx.materials, "rock");
    fx.generator.create_shader_based_technique("rock", DEFAULT_GROUP, "", FORWARD, false);
    fx.generator.validate_scheme(FORWARD).unwrap();
    let written = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(written, 2);

    let err = fx
        .generator
        .set_shader_cache_path(dir.path().join("does/not/exist"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn settings_cache_path_must_be_writable() {
    common::init_logging();
    let settings = GeneratorSettings {
        cache_path: Some("/definitely/not/a/dir".into()),
        ..Default::default()
    };
    let result = rtshader::ShaderGenerator::initialize(
        settings,
        std::sync::Arc::new(rtshader::MaterialStore::new()),
        std::sync::Arc::new(NullBackend::new()),
    );
    assert!(matches!(result, Err(e) if e.kind() == ErrorKind::Io));
}

#[test]
fn target_language_switch_flushes() {
    let fx = setup_with(GeneratorSettings::default(), NullBackend::with_languages(&["glsl"]));
    assert_eq!(fx.generator.target_language(), "glsl");

    add_lit_material(&fx.materials, "rock");
    fx.generator.create_shader_based_technique("rock", DEFAULT_GROUP, "", FORWARD, false);
    fx.generator.validate_scheme(FORWARD).unwrap();

    let err = fx.generator.set_target_language("metal").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedLanguage);
    assert_eq!(fx.generator.shader_count(ShaderStage::Vertex), 1);

    fx.generator.set_target_language(NullBackend::LANGUAGE).unwrap();
    assert_eq!(fx.generator.shader_count(ShaderStage::Vertex), 0);
    assert_eq!(fx.generator.validate_scheme(FORWARD).unwrap().rebuilt, 1);
}

#[test]
fn profiles_round_trip() {
    let fx = setup();
    fx.generator.set_shader_profiles(ShaderStage::Vertex, "vs_4_0 vs_5_0");
    assert_eq!(fx.generator.shader_profiles(ShaderStage::Vertex), "vs_4_0 vs_5_0");
    assert_eq!(fx.generator.shader_profile_list(ShaderStage::Vertex), ["vs_4_0", "vs_5_0"]);
    assert!(fx.generator.shader_profile_list(ShaderStage::Fragment).is_empty());
}

#[test]
fn default_scheme_exists_and_schemes_are_ordered() {
    let fx = setup();
    assert!(fx.generator.has_scheme(DEFAULT_SCHEME_NAME));
    assert!(fx.generator.create_or_retrieve_scheme("Alpha"));
    assert!(!fx.generator.create_or_retrieve_scheme("Alpha"));
    assert_eq!(fx.generator.scheme_count(), 2);
    assert_eq!(fx.generator.scheme_name(0).as_deref(), Some("Alpha"));
    assert_eq!(fx.generator.scheme_name(2), None);
}
