//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;
use rtshader::material::{DEFAULT_GROUP, TextureUnit};
use rtshader::program::NullBackend;
use rtshader::scene::{Light, RenderObjectListener, Renderable, VisibilityListener};
use rtshader::{
    FogMode, GeneratorSettings, LightType, Material, MaterialStore, Pass, PassId, SceneManager,
    ShaderGenerator, Technique, Viewport,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub struct Fixture {
    pub generator: Arc<ShaderGenerator>,
    pub materials: Arc<MaterialStore>,
    pub backend: Arc<NullBackend>,
}

pub fn setup() -> Fixture {
    setup_with(GeneratorSettings::default(), NullBackend::new())
}

pub fn setup_with(settings: GeneratorSettings, backend: NullBackend) -> Fixture {
    init_logging();
    let materials = Arc::new(MaterialStore::new());
    let backend = Arc::new(backend);
    let generator = ShaderGenerator::initialize(settings, materials.clone(), backend.clone())
        .expect("generator initializes");
    Fixture {
        generator,
        materials,
        backend,
    }
}

/// One technique in the default scheme with a single lit pass.
pub fn add_lit_material(materials: &MaterialStore, name: &str) {
    let mut technique = Technique::new("");
    technique.add_pass(Pass::new("base"));
    let mut material = Material::new(name, DEFAULT_GROUP);
    material.add_technique(technique);
    materials.add(material);
}

/// One technique with a lit, textured pass and an unlit overlay pass.
pub fn add_textured_material(materials: &MaterialStore, name: &str) {
    let mut base = Pass::new("base");
    base.add_texture_unit(TextureUnit::new("albedo.png"));
    let mut overlay = Pass::new("overlay");
    overlay.lighting_enabled = false;

    let mut technique = Technique::new("");
    technique.add_pass(base);
    technique.add_pass(overlay);
    let mut material = Material::new(name, DEFAULT_GROUP);
    material.add_technique(technique);
    materials.add(material);
}

/// One technique whose only pass already carries programs.
pub fn add_programmable_material(materials: &MaterialStore, name: &str) {
    let mut pass = Pass::new("custom");
    pass.set_vertex_program("hand_written_vs");
    pass.set_fragment_program("hand_written_fs");
    let mut technique = Technique::new("");
    technique.add_pass(pass);
    let mut material = Material::new(name, DEFAULT_GROUP);
    material.add_technique(technique);
    materials.add(material);
}

/// Scene manager with settable lights and fog that dispatches frame
/// callbacks to registered listeners.
pub struct MockScene {
    name: String,
    lights: Mutex<Vec<LightType>>,
    fog: Mutex<FogMode>,
    render_listeners: Mutex<Vec<Arc<dyn RenderObjectListener>>>,
    visibility_listeners: Mutex<Vec<Arc<dyn VisibilityListener>>>,
}

impl MockScene {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            lights: Mutex::new(Vec::new()),
            fog: Mutex::new(FogMode::None),
            render_listeners: Mutex::new(Vec::new()),
            visibility_listeners: Mutex::new(Vec::new()),
        })
    }

    pub fn set_lights(&self, lights: &[LightType]) {
        *self.lights.lock() = lights.to_vec();
    }

    pub fn set_fog(&self, fog: FogMode) {
        *self.fog.lock() = fog;
    }

    pub fn listener_count(&self) -> usize {
        self.render_listeners.lock().len() + self.visibility_listeners.lock().len()
    }

    /// Runs visibility callbacks for a viewport using `scheme`.
    pub fn begin_frame(self: &Arc<Self>, scheme: &str) {
        let scene: Arc<dyn SceneManager> = self.clone();
        let viewport = Viewport::new(scheme);
        let listeners = self.visibility_listeners.lock().clone();
        for listener in listeners {
            listener.pre_find_visible_objects(&scene, &viewport);
        }
    }

    pub fn draw(&self, renderable: &dyn Renderable, pass: PassId, lights: &[Light]) {
        let listeners = self.render_listeners.lock().clone();
        for listener in listeners {
            listener.notify_render_single_object(renderable, pass, lights, false);
        }
    }
}

impl SceneManager for MockScene {
    fn name(&self) -> &str {
        &self.name
    }

    fn lights_affecting_frustum(&self) -> Vec<LightType> {
        self.lights.lock().clone()
    }

    fn fog_mode(&self) -> FogMode {
        *self.fog.lock()
    }

    fn add_render_object_listener(&self, listener: Arc<dyn RenderObjectListener>) {
        self.render_listeners.lock().push(listener);
    }

    fn remove_render_object_listener(&self, listener: &Arc<dyn RenderObjectListener>) {
        self.render_listeners
            .lock()
            .retain(|l| !Arc::ptr_eq(l, listener));
    }

    fn add_visibility_listener(&self, listener: Arc<dyn VisibilityListener>) {
        self.visibility_listeners.lock().push(listener);
    }

    fn remove_visibility_listener(&self, listener: &Arc<dyn VisibilityListener>) {
        self.visibility_listeners
            .lock()
            .retain(|l| !Arc::ptr_eq(l, listener));
    }
}
