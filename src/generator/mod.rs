//! Shader Generator
//!
//! The [`ShaderGenerator`] turns material techniques into shader-based
//! techniques. For every registered `(material, source scheme, destination
//! scheme)` it clones the source technique into a destination technique,
//! resolves each pass into a [`TargetRenderState`] (fixed-function stages,
//! then the pass's custom render state, then the scheme-global one) and
//! acquires generated programs for it.
//!
//! # Lifecycle
//!
//! ```rust,ignore
//! let generator = ShaderGenerator::initialize(settings, materials.clone(), backend)?;
//! generator.add_scene_manager(scene.clone());
//!
//! generator.create_shader_based_technique("rock", DEFAULT_GROUP, "", DEFAULT_SCHEME_NAME, false);
//! let report = generator.validate_scheme(DEFAULT_SCHEME_NAME)?;
//!
//! // ... frames: the scene calls pre_find_visible_objects / notify_render_single_object
//!
//! generator.destroy();
//! ```
//!
//! # Locking
//!
//! All generator state sits behind one mutex. Operations that touch
//! materials take the generator lock first and the material store lock
//! second. Closures handed to [`ShaderGenerator::with_scheme_render_state`]
//! and [`ShaderGenerator::with_pass_render_state`] run under the generator
//! lock and must not call back into the generator.
//!
//! [`TargetRenderState`]: crate::render_state::TargetRenderState

mod listeners;
mod material_entry;
mod pass;
mod scheme;
mod technique;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use slotmap::SlotMap;

pub use scheme::{ValidationFailure, ValidationReport};
pub use technique::TechniqueKey;

use listeners::GeneratorListener;
use material_entry::{MaterialEntries, MaterialKey};
use scheme::SgScheme;
use technique::SgTechnique;

use crate::errors::{Result, ShaderGenError};
use crate::features::register_builtin_factories;
use crate::material::{
    IlluminationStage, MaterialLibrary, MaterialStore, Pass, PassId, ResourceListener, TechniqueId,
};
use crate::program::{NullBackend, ProgramBackend, ProgramManager, ProgramTarget, ShaderStage};
use crate::render_state::{
    FactoryRegistry, RenderState, SubRenderState, SubRenderStateFactory, TargetRenderState,
};
use crate::scene::{
    FogMode, Light, RenderObjectListener, Renderable, SceneManager, Viewport, VisibilityListener,
};
use crate::script::{ObjectNode, PropertyNode, RTSHADER_SYSTEM_KEYWORD, ScriptContext, ScriptTranslator};
use crate::settings::{GeneratorSettings, LANGUAGE_PREFERENCE};

/// Scheme generated techniques are registered under when none is named.
pub const DEFAULT_SCHEME_NAME: &str = "ShaderGeneratorDefaultScheme";

/// File created and removed to check that the cache directory is writable.
const CACHE_PROBE_FILE: &str = "ShaderGenerator.tst";

/// Generated ids back to the technique that owns them.
#[derive(Debug, Default)]
pub(crate) struct Bindings {
    pub(crate) passes: FxHashMap<PassId, TechniqueKey>,
    pub(crate) techniques: FxHashMap<TechniqueId, TechniqueKey>,
}

/// Everything a technique needs while building or releasing passes.
pub(crate) struct BuildEnv<'a> {
    pub(crate) registry: &'a FactoryRegistry,
    pub(crate) programs: &'a mut ProgramManager,
    pub(crate) bindings: &'a mut Bindings,
    pub(crate) target: &'a ProgramTarget,
    /// Scheme-global render state of the scheme being built.
    pub(crate) global: Option<&'a RenderState>,
    pub(crate) fog_mode: FogMode,
    pub(crate) finalizing: bool,
}

/// A generated pass as seen from outside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPass {
    pub scheme: String,
    pub src_pass: PassId,
    pub dst_pass: PassId,
    pub stage: Option<IlluminationStage>,
    /// Sub-render-state types of the target render state, in execution order.
    pub sub_render_states: Vec<&'static str>,
    /// `(vertex, fragment)` program names, once acquired.
    pub programs: Option<(String, String)>,
}

/// The shader-based technique behind a generated destination technique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TechniqueInfo {
    pub material: String,
    pub group: String,
    pub src_scheme: String,
    pub dst_scheme: String,
    pub src_technique: TechniqueId,
    pub pass_count: usize,
}

struct GeneratorState {
    registry: FactoryRegistry,
    schemes: BTreeMap<String, SgScheme>,
    techniques: SlotMap<TechniqueKey, SgTechnique>,
    materials: MaterialEntries,
    bindings: Bindings,
    programs: ProgramManager,
    target: ProgramTarget,
    over_programmable: bool,
    scene_managers: Vec<Arc<dyn SceneManager>>,
    active_scene: Option<Arc<dyn SceneManager>>,
    finalizing: bool,
}

impl GeneratorState {
    fn scheme_mut(&mut self, name: &str) -> Result<&mut SgScheme> {
        self.schemes
            .get_mut(name)
            .ok_or_else(|| ShaderGenError::SchemeNotFound(name.to_string()))
    }

    fn create_or_retrieve_scheme(&mut self, name: &str) -> (&mut SgScheme, bool) {
        let created = !self.schemes.contains_key(name);
        if created {
            log::debug!("Creating scheme '{name}'");
        }
        let scheme = self
            .schemes
            .entry(name.to_string())
            .or_insert_with(|| SgScheme::new(name));
        (scheme, created)
    }

    /// Registers a shader-based technique. Returns the existing technique
    /// when the same source and destination are already registered, and
    /// `None` when another technique of this material already targets
    /// `dst_scheme`.
    fn create_technique(
        &mut self,
        material: MaterialKey,
        src_technique: TechniqueId,
        src_scheme: &str,
        dst_scheme: &str,
        over_programmable: bool,
    ) -> Option<TechniqueKey> {
        if let Some(entry) = self.materials.get(&material) {
            for &key in &entry.techniques {
                let Some(existing) = self.techniques.get(key) else {
                    continue;
                };
                if existing.dst_scheme == dst_scheme {
                    return (existing.src_technique == src_technique).then_some(key);
                }
            }
        }

        log::debug!(
            "Creating shader based technique for '{}' ({}): '{src_scheme}' -> '{dst_scheme}'",
            material.0,
            material.1
        );
        let key = self.techniques.insert(SgTechnique::new(
            material.clone(),
            src_technique,
            src_scheme,
            dst_scheme,
            over_programmable,
        ));
        self.materials.entry(material).techniques.push(key);
        self.create_or_retrieve_scheme(dst_scheme).0.add_technique(key);
        Some(key)
    }

    /// Tears a technique down and unlinks it from its scheme and material.
    fn destroy_technique(&mut self, key: TechniqueKey, library: &mut MaterialLibrary) -> bool {
        let Some(technique) = self.techniques.remove(key) else {
            return false;
        };
        if let Some(scheme) = self.schemes.get_mut(&technique.dst_scheme) {
            scheme.remove_technique(key);
        }
        self.materials.unlink(&technique.material, key);

        let mut env = BuildEnv {
            registry: &self.registry,
            programs: &mut self.programs,
            bindings: &mut self.bindings,
            target: &self.target,
            global: None,
            fog_mode: FogMode::None,
            finalizing: self.finalizing,
        };
        technique.teardown(library, &mut env);
        true
    }

    fn destroy_material_techniques(&mut self, material: &MaterialKey, library: &mut MaterialLibrary) -> bool {
        let keys = self
            .materials
            .get(material)
            .map(|entry| entry.techniques.clone())
            .unwrap_or_default();
        for key in &keys {
            self.destroy_technique(*key, library);
        }
        !keys.is_empty()
    }

    fn find_technique(&self, scheme: &str, name: &str, group: &str) -> Result<Option<TechniqueKey>> {
        let scheme = self
            .schemes
            .get(scheme)
            .ok_or_else(|| ShaderGenError::SchemeNotFound(scheme.to_string()))?;
        let Some((name, group)) = self.materials.resolve(name, group) else {
            return Ok(None);
        };
        Ok(scheme.find_technique(&self.techniques, &name, &group))
    }

    /// Rebuilds and re-acquires every flagged technique of a dirty scheme.
    fn validate_scheme(&mut self, name: &str, library: &mut MaterialLibrary) -> Result<ValidationReport> {
        let scene = self.active_scene.clone();
        let Self {
            schemes,
            techniques,
            registry,
            programs,
            bindings,
            target,
            finalizing,
            ..
        } = self;

        let scheme = schemes
            .get_mut(name)
            .ok_or_else(|| ShaderGenError::SchemeNotFound(name.to_string()))?;
        if let Some(scene) = &scene {
            scheme.synchronize(&**scene, techniques);
        }

        let mut report = ValidationReport::default();
        if !scheme.out_of_date {
            return Ok(report);
        }

        let flagged: Vec<TechniqueKey> = scheme
            .techniques
            .iter()
            .copied()
            .filter(|key| techniques.get(*key).is_some_and(|t| t.needs_rebuild))
            .collect();

        let mut env = BuildEnv {
            registry: &*registry,
            programs,
            bindings,
            target: &*target,
            global: scheme.render_state.as_ref(),
            fog_mode: scheme.fog_mode,
            finalizing: *finalizing,
        };

        let mut built = Vec::with_capacity(flagged.len());
        for key in flagged {
            let Some(technique) = techniques.get_mut(key) else {
                continue;
            };
            match technique.build_target_render_state(key, library, &mut env) {
                Ok(()) => {
                    report.rebuilt += 1;
                    built.push(key);
                }
                Err(error) => {
                    log::warn!(
                        "Failed to build technique of '{}' in scheme '{name}': {error}",
                        technique.material.0
                    );
                    report.failures.push(ValidationFailure {
                        material: technique.material.0.clone(),
                        group: technique.material.1.clone(),
                        error,
                    });
                }
            }
        }

        let mut acquired = Vec::with_capacity(built.len());
        for key in built {
            let Some(technique) = techniques.get_mut(key) else {
                continue;
            };
            match technique.acquire_programs(library, &mut env) {
                Ok(()) => acquired.push(key),
                Err(error) => {
                    log::warn!(
                        "Failed to acquire programs for '{}' in scheme '{name}': {error}",
                        technique.material.0
                    );
                    report.failures.push(ValidationFailure {
                        material: technique.material.0.clone(),
                        group: technique.material.1.clone(),
                        error,
                    });
                }
            }
        }

        // Flags are cleared only once every acquisition has run.
        report.acquired = acquired.len();
        for key in acquired {
            if let Some(technique) = techniques.get_mut(key) {
                technique.needs_rebuild = false;
            }
        }

        scheme.out_of_date = !report.is_complete();
        Ok(report)
    }

    /// Rebuilds the technique of one material if it is flagged.
    fn validate_material(
        &mut self,
        scheme_name: &str,
        name: &str,
        group: &str,
        library: &mut MaterialLibrary,
    ) -> Result<bool> {
        let Some(key) = self.find_technique(scheme_name, name, group)? else {
            return Ok(false);
        };
        let scene = self.active_scene.clone();
        let Self {
            schemes,
            techniques,
            registry,
            programs,
            bindings,
            target,
            finalizing,
            ..
        } = self;
        let scheme = schemes
            .get_mut(scheme_name)
            .ok_or_else(|| ShaderGenError::SchemeNotFound(scheme_name.to_string()))?;
        if let Some(scene) = &scene {
            scheme.synchronize(&**scene, techniques);
        }

        let Some(technique) = techniques.get_mut(key) else {
            return Ok(false);
        };
        if !technique.needs_rebuild {
            return Ok(false);
        }
        let mut env = BuildEnv {
            registry: &*registry,
            programs,
            bindings,
            target: &*target,
            global: scheme.render_state.as_ref(),
            fog_mode: scheme.fog_mode,
            finalizing: *finalizing,
        };
        technique.build_target_render_state(key, library, &mut env)?;
        technique.acquire_programs(library, &mut env)?;
        technique.needs_rebuild = false;
        Ok(true)
    }

    fn validate_illumination_passes(
        &mut self,
        scheme_name: &str,
        name: &str,
        group: &str,
        library: &mut MaterialLibrary,
    ) -> Result<bool> {
        let Some(key) = self.find_technique(scheme_name, name, group)? else {
            return Ok(false);
        };
        let Self {
            schemes,
            techniques,
            registry,
            programs,
            bindings,
            target,
            finalizing,
            ..
        } = self;
        let scheme = schemes
            .get(scheme_name)
            .ok_or_else(|| ShaderGenError::SchemeNotFound(scheme_name.to_string()))?;
        let Some(technique) = techniques.get_mut(key) else {
            return Ok(false);
        };
        let mut env = BuildEnv {
            registry: &*registry,
            programs,
            bindings,
            target: &*target,
            global: scheme.render_state.as_ref(),
            fog_mode: scheme.fog_mode,
            finalizing: *finalizing,
        };
        technique.build_illumination_passes(key, library, &mut env)?;
        technique.acquire_illumination_programs(library, &mut env)?;
        Ok(true)
    }

    fn invalidate_illumination_passes(
        &mut self,
        scheme_name: &str,
        name: &str,
        group: &str,
        library: &mut MaterialLibrary,
    ) -> Result<bool> {
        let Some(key) = self.find_technique(scheme_name, name, group)? else {
            return Ok(false);
        };
        let Some(technique) = self.techniques.get_mut(key) else {
            return Ok(false);
        };
        let mut env = BuildEnv {
            registry: &self.registry,
            programs: &mut self.programs,
            bindings: &mut self.bindings,
            target: &self.target,
            global: None,
            fog_mode: FogMode::None,
            finalizing: self.finalizing,
        };
        technique.destroy_illumination_passes(library, &mut env);
        Ok(true)
    }

    /// Releases all programs, flushes the program cache and marks every
    /// scheme dirty.
    fn flush_shader_cache(&mut self, library: &mut MaterialLibrary) {
        let mut env = BuildEnv {
            registry: &self.registry,
            programs: &mut self.programs,
            bindings: &mut self.bindings,
            target: &self.target,
            global: None,
            fog_mode: FogMode::None,
            finalizing: self.finalizing,
        };
        for technique in self.techniques.values_mut() {
            technique.release_programs(library, &mut env);
        }
        self.programs.flush();
        for scheme in self.schemes.values_mut() {
            scheme.invalidate(&mut self.techniques);
        }
    }
}

/// Generates shader-based techniques for materials.
///
/// Created with [`ShaderGenerator::initialize`] and shared as an `Arc`; all
/// methods take `&self`.
pub struct ShaderGenerator {
    state: Mutex<GeneratorState>,
    materials: Arc<MaterialStore>,
    active_viewport_valid: AtomicBool,
    listener: Arc<GeneratorListener>,
}

impl ShaderGenerator {
    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Creates a generator bound to a material store and program backend.
    ///
    /// Picks the target language, registers the built-in factories, creates
    /// the default scheme, checks the shader cache path and starts listening
    /// for material removal.
    pub fn initialize(
        settings: GeneratorSettings,
        materials: Arc<MaterialStore>,
        backend: Arc<dyn ProgramBackend>,
    ) -> Result<Arc<Self>> {
        let language = match &settings.target_language {
            Some(language) if backend.is_language_supported(language) => language.clone(),
            Some(language) => return Err(ShaderGenError::UnsupportedLanguage(language.clone())),
            None => match LANGUAGE_PREFERENCE
                .iter()
                .find(|l| backend.is_language_supported(l))
            {
                Some(language) => (*language).to_string(),
                None => {
                    log::warn!(
                        "Backend supports none of {LANGUAGE_PREFERENCE:?}, falling back to '{}'",
                        NullBackend::LANGUAGE
                    );
                    NullBackend::LANGUAGE.to_string()
                }
            },
        };

        let mut registry = FactoryRegistry::new();
        if settings.register_builtin_factories {
            register_builtin_factories(&mut registry)?;
        }

        log::info!("Initializing shader generator (language: {language})");
        let state = GeneratorState {
            registry,
            schemes: BTreeMap::new(),
            techniques: SlotMap::with_key(),
            materials: MaterialEntries::default(),
            bindings: Bindings::default(),
            programs: ProgramManager::new(backend),
            target: ProgramTarget {
                language,
                vertex_profiles: settings.vertex_profiles.clone(),
                fragment_profiles: settings.fragment_profiles.clone(),
            },
            over_programmable: settings.create_shader_over_programmable_pass,
            scene_managers: Vec::new(),
            active_scene: None,
            finalizing: false,
        };

        let generator = Arc::new_cyclic(|weak| Self {
            state: Mutex::new(state),
            materials: materials.clone(),
            active_viewport_valid: AtomicBool::new(false),
            listener: Arc::new(GeneratorListener::new(weak.clone())),
        });
        generator.create_scheme(DEFAULT_SCHEME_NAME);
        if let Some(path) = &settings.cache_path {
            generator.set_shader_cache_path(path)?;
        }
        materials.add_listener(generator.listener.clone());
        Ok(generator)
    }

    /// Tears everything down: techniques, material entries, schemes,
    /// factories and cached programs. Listeners are detached from scene
    /// managers and the material store.
    pub fn destroy(&self) {
        let scenes = {
            let mut guard = self.state.lock();
            let mut library = self.materials.write();
            let state = &mut *guard;
            state.finalizing = true;

            let keys: Vec<TechniqueKey> = state.techniques.keys().collect();
            for key in keys {
                state.destroy_technique(key, &mut library);
            }
            state.materials.clear();
            for scheme in state.schemes.values_mut() {
                scheme.teardown(&state.registry);
            }
            state.schemes.clear();
            state.registry.clear();
            state.programs.flush();
            state.active_scene = None;
            std::mem::take(&mut state.scene_managers)
        };
        self.active_viewport_valid.store(false, Ordering::Release);

        for scene in &scenes {
            self.detach_listeners(&**scene);
        }
        let listener: Arc<dyn ResourceListener> = self.listener.clone();
        self.materials.remove_listener(&listener);
        log::info!("Shader generator destroyed");
    }

    /// True once [`destroy`](Self::destroy) has started.
    #[must_use]
    pub fn is_finalizing(&self) -> bool {
        self.state.lock().finalizing
    }

    #[must_use]
    pub fn materials(&self) -> &Arc<MaterialStore> {
        &self.materials
    }

    // ========================================================================
    // Sub-render-state factories
    // ========================================================================

    pub fn add_sub_render_state_factory(&self, factory: Arc<dyn SubRenderStateFactory>) -> Result<()> {
        self.state.lock().registry.add(factory)
    }

    pub fn remove_sub_render_state_factory(&self, type_name: &str) -> Option<Arc<dyn SubRenderStateFactory>> {
        self.state.lock().registry.remove(type_name)
    }

    #[must_use]
    pub fn sub_render_state_factory_count(&self) -> usize {
        self.state.lock().registry.len()
    }

    pub fn sub_render_state_factory_at(&self, index: usize) -> Result<Arc<dyn SubRenderStateFactory>> {
        self.state.lock().registry.get_at(index).cloned()
    }

    #[must_use]
    pub fn sub_render_state_factory(&self, type_name: &str) -> Option<Arc<dyn SubRenderStateFactory>> {
        self.state.lock().registry.get(type_name).cloned()
    }

    pub fn create_sub_render_state(&self, type_name: &str) -> Result<Box<dyn SubRenderState>> {
        self.state.lock().registry.create(type_name)
    }

    pub fn destroy_sub_render_state(&self, instance: Box<dyn SubRenderState>) {
        self.state.lock().registry.destroy(instance);
    }

    /// Offers `property` to every factory in registration order.
    pub fn create_sub_render_state_from_property(
        &self,
        property: &PropertyNode,
        ctx: &ScriptContext<'_>,
    ) -> Result<Option<Box<dyn SubRenderState>>> {
        self.state.lock().registry.create_from_property(property, ctx)
    }

    // ========================================================================
    // Schemes
    // ========================================================================

    pub fn create_scheme(&self, name: &str) {
        self.create_or_retrieve_scheme(name);
    }

    /// Returns `true` if the scheme was created by this call.
    pub fn create_or_retrieve_scheme(&self, name: &str) -> bool {
        self.state.lock().create_or_retrieve_scheme(name).1
    }

    #[must_use]
    pub fn has_scheme(&self, name: &str) -> bool {
        self.state.lock().schemes.contains_key(name)
    }

    #[must_use]
    pub fn scheme_count(&self) -> usize {
        self.state.lock().schemes.len()
    }

    /// Scheme names are ordered lexically.
    #[must_use]
    pub fn scheme_name(&self, index: usize) -> Option<String> {
        self.state.lock().schemes.keys().nth(index).cloned()
    }

    /// Runs `f` on the scheme-global render state, creating it on first use.
    ///
    /// Changes take effect after the scheme is invalidated.
    pub fn with_scheme_render_state<R>(&self, scheme: &str, f: impl FnOnce(&mut RenderState) -> R) -> Result<R> {
        let mut state = self.state.lock();
        Ok(f(state.scheme_mut(scheme)?.render_state_mut()))
    }

    /// Runs `f` on the custom render state of one pass of the technique
    /// generated for `(name, group)` in `scheme`.
    ///
    /// Returns `Ok(None)` when the material has no technique in the scheme.
    pub fn with_pass_render_state<R>(
        &self,
        scheme: &str,
        name: &str,
        group: &str,
        pass_index: usize,
        f: impl FnOnce(&mut RenderState) -> R,
    ) -> Result<Option<R>> {
        self.configure_pass_render_state(scheme, name, group, pass_index, |state, _, _| f(state))
    }

    pub(crate) fn configure_pass_render_state<R>(
        &self,
        scheme: &str,
        name: &str,
        group: &str,
        pass_index: usize,
        f: impl FnOnce(&mut RenderState, &FactoryRegistry, Option<&Pass>) -> R,
    ) -> Result<Option<R>> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let Some(key) = state.find_technique(scheme, name, group)? else {
            return Ok(None);
        };
        let library = self.materials.read();
        let Some(technique) = state.techniques.get_mut(key) else {
            return Ok(None);
        };
        let pass = library
            .by_name(&technique.material.0, &technique.material.1)
            .and_then(|m| m.technique_by_id(technique.src_technique))
            .and_then(|t| t.pass(pass_index));
        let render_state = technique.custom_render_state_mut(pass_index);
        Ok(Some(f(render_state, &state.registry, pass)))
    }

    /// Marks every technique of the scheme for rebuild.
    pub fn invalidate_scheme(&self, name: &str) -> Result<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let scheme = state
            .schemes
            .get_mut(name)
            .ok_or_else(|| ShaderGenError::SchemeNotFound(name.to_string()))?;
        scheme.invalidate(&mut state.techniques);
        Ok(())
    }

    /// Synchronizes the scheme with the active scene, then rebuilds and
    /// re-acquires every technique flagged for rebuild.
    ///
    /// Per-technique failures are collected in the report; those techniques
    /// stay flagged and the scheme stays dirty so the next call retries.
    pub fn validate_scheme(&self, name: &str) -> Result<ValidationReport> {
        let mut state = self.state.lock();
        let mut library = self.materials.write();
        state.validate_scheme(name, &mut library)
    }

    // ========================================================================
    // Shader-based techniques
    // ========================================================================

    /// Registers a shader-based technique for a material.
    ///
    /// The source technique is the first one in `src_scheme` that has a
    /// fixed-function pass (any technique in `src_scheme` when
    /// `over_programmable` is set). Returns `true` if the technique was
    /// created or already existed, `false` if the material or source
    /// technique was not found or another technique of this material
    /// already targets `dst_scheme`.
    pub fn create_shader_based_technique(
        &self,
        name: &str,
        group: &str,
        src_scheme: &str,
        dst_scheme: &str,
        over_programmable: bool,
    ) -> bool {
        let mut state = self.state.lock();
        let library = self.materials.read();
        let Some(material) = library.resolve(name, group).and_then(|h| library.get(h)) else {
            log::debug!("Material '{name}' ({group}) not found");
            return false;
        };
        let Some(src) = material
            .techniques()
            .iter()
            .find(|t| t.scheme_name == src_scheme && (over_programmable || t.has_fixed_function_pass()))
        else {
            log::debug!("Material '{name}' has no usable technique in scheme '{src_scheme}'");
            return false;
        };
        let key = (material.name().to_string(), material.group().to_string());
        state
            .create_technique(key, src.id(), src_scheme, dst_scheme, over_programmable)
            .is_some()
    }

    /// Returns `true` if a technique matched and was removed.
    pub fn remove_shader_based_technique(&self, name: &str, group: &str, src_scheme: &str, dst_scheme: &str) -> bool {
        let mut guard = self.state.lock();
        let mut library = self.materials.write();
        let state = &mut *guard;
        let Some(material) = state.materials.resolve(name, group) else {
            return false;
        };
        let found = state.materials.get(&material).and_then(|entry| {
            entry.techniques.iter().copied().find(|key| {
                state
                    .techniques
                    .get(*key)
                    .is_some_and(|t| t.src_scheme == src_scheme && t.dst_scheme == dst_scheme)
            })
        });
        found.is_some_and(|key| state.destroy_technique(key, &mut library))
    }

    #[must_use]
    pub fn has_shader_based_technique(&self, name: &str, group: &str, src_scheme: &str, dst_scheme: &str) -> bool {
        let state = self.state.lock();
        let Some(material) = state.materials.resolve(name, group) else {
            return false;
        };
        state.materials.get(&material).is_some_and(|entry| {
            entry.techniques.iter().any(|key| {
                state
                    .techniques
                    .get(*key)
                    .is_some_and(|t| t.src_scheme == src_scheme && t.dst_scheme == dst_scheme)
            })
        })
    }

    /// Removes every shader-based technique of a material. Returns `false`
    /// if it had none.
    pub fn remove_all_shader_based_techniques_for(&self, name: &str, group: &str) -> bool {
        let mut state = self.state.lock();
        let mut library = self.materials.write();
        let Some(material) = state.materials.resolve(name, group) else {
            return false;
        };
        state.destroy_material_techniques(&material, &mut library)
    }

    pub fn remove_all_shader_based_techniques(&self) {
        let mut state = self.state.lock();
        let mut library = self.materials.write();
        let keys: Vec<TechniqueKey> = state.techniques.keys().collect();
        for key in keys {
            state.destroy_technique(key, &mut library);
        }
    }

    /// Copies the shader-based techniques of one material onto another,
    /// including deep copies of the custom render states.
    ///
    /// The destination's generated techniques, and any technique sitting in
    /// a destination scheme being cloned, are removed first. Returns `false`
    /// if either material is missing, both resolve to the same material, or
    /// a technique could not be recreated.
    pub fn clone_shader_based_techniques(
        &self,
        src_name: &str,
        src_group: &str,
        dst_name: &str,
        dst_group: &str,
    ) -> bool {
        let mut guard = self.state.lock();
        let mut library = self.materials.write();
        let state = &mut *guard;

        let (Some(src_handle), Some(dst_handle)) =
            (library.resolve(src_name, src_group), library.resolve(dst_name, dst_group))
        else {
            return false;
        };
        if src_handle == dst_handle {
            return false;
        }
        let Some(dst_key) = library
            .get(dst_handle)
            .map(|m| (m.name().to_string(), m.group().to_string()))
        else {
            return false;
        };
        let src_key = library
            .get(src_handle)
            .map(|m| (m.name().to_string(), m.group().to_string()));

        state.destroy_material_techniques(&dst_key, &mut library);

        // Snapshot the source techniques with deep-copied custom states.
        let mut clones = Vec::new();
        let src_keys = src_key
            .as_ref()
            .and_then(|key| state.materials.get(key))
            .map(|entry| entry.techniques.clone())
            .unwrap_or_default();
        for key in src_keys {
            let Some(technique) = state.techniques.get(key) else {
                continue;
            };
            let mut custom = Vec::new();
            for (index, render_state) in technique.custom_render_states() {
                let mut copy = RenderState::new();
                if let Err(e) = copy.copy_from(render_state, &state.registry) {
                    log::warn!("Failed to copy custom render state of '{src_name}': {e}");
                    return false;
                }
                custom.push((index, copy));
            }
            clones.push((
                technique.src_scheme.clone(),
                technique.dst_scheme.clone(),
                technique.over_programmable,
                custom,
            ));
        }

        let Some(dst_material) = library.get_mut(dst_handle) else {
            return false;
        };
        let stale: Vec<TechniqueId> = dst_material
            .techniques()
            .iter()
            .filter(|t| clones.iter().any(|(_, dst_scheme, _, _)| t.scheme_name == *dst_scheme))
            .map(|t| t.id())
            .collect();
        for id in stale {
            dst_material.remove_technique(id);
        }

        let mut all_cloned = true;
        for (src_scheme, dst_scheme, over_programmable, custom) in clones {
            let Some(src_technique) = dst_material
                .techniques()
                .iter()
                .find(|t| t.scheme_name == src_scheme && (over_programmable || t.has_fixed_function_pass()))
                .map(|t| t.id())
            else {
                log::warn!("Material '{dst_name}' has no technique in scheme '{src_scheme}' to clone onto");
                all_cloned = false;
                continue;
            };
            let Some(key) = state.create_technique(
                dst_key.clone(),
                src_technique,
                &src_scheme,
                &dst_scheme,
                over_programmable,
            ) else {
                all_cloned = false;
                continue;
            };
            if let Some(technique) = state.techniques.get_mut(key) {
                for (index, render_state) in custom {
                    if let Some(mut previous) = technique.set_custom_render_state(index, render_state) {
                        previous.reset(&state.registry);
                    }
                }
            }
        }
        all_cloned
    }

    // ========================================================================
    // Materials
    // ========================================================================

    /// Flags the technique generated for `(name, group)` in `scheme` for
    /// rebuild. Returns `false` if there is none.
    pub fn invalidate_material(&self, scheme: &str, name: &str, group: &str) -> bool {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let Ok(Some(key)) = state.find_technique(scheme, name, group) else {
            return false;
        };
        if let Some(technique) = state.techniques.get_mut(key) {
            technique.needs_rebuild = true;
        }
        if let Some(scheme) = state.schemes.get_mut(scheme) {
            scheme.out_of_date = true;
        }
        true
    }

    /// Rebuilds and re-acquires one material's technique if it is flagged.
    /// Returns `Ok(true)` if it was rebuilt.
    pub fn validate_material(&self, scheme: &str, name: &str, group: &str) -> Result<bool> {
        let mut state = self.state.lock();
        let mut library = self.materials.write();
        state.validate_material(scheme, name, group, &mut library)
    }

    /// Destroys the generated illumination passes of one material's
    /// technique.
    pub fn invalidate_material_illumination_passes(&self, scheme: &str, name: &str, group: &str) -> Result<bool> {
        let mut state = self.state.lock();
        let mut library = self.materials.write();
        state.invalidate_illumination_passes(scheme, name, group, &mut library)
    }

    /// Compiles illumination passes for one material's destination technique
    /// and generates programs for them.
    pub fn validate_material_illumination_passes(&self, scheme: &str, name: &str, group: &str) -> Result<bool> {
        let mut state = self.state.lock();
        let mut library = self.materials.write();
        state.validate_illumination_passes(scheme, name, group, &mut library)
    }

    // ========================================================================
    // Scene integration
    // ========================================================================

    /// Pushes per-draw parameters for a generated pass.
    ///
    /// Returns immediately unless the last visibility validation succeeded
    /// and `pass` belongs to a generated technique.
    pub fn notify_render_single_object(
        &self,
        renderable: &dyn Renderable,
        pass: PassId,
        lights: &[Light],
        suppress_render_state_changes: bool,
    ) {
        if suppress_render_state_changes || !self.active_viewport_valid.load(Ordering::Acquire) {
            return;
        }
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let Some(&key) = state.bindings.passes.get(&pass) else {
            return;
        };
        let library = self.materials.read();
        let Some(technique) = state.techniques.get_mut(key) else {
            return;
        };
        let Some((_, dst)) = library
            .by_name(&technique.material.0, &technique.material.1)
            .and_then(|m| m.find_pass(pass))
        else {
            return;
        };
        if let Some(target) = technique.find_pass_mut(pass).and_then(|p| p.target.as_mut()) {
            target.update_gpu_program_params(renderable, dst, lights, &state.programs);
        }
    }

    /// Makes `scene` the active scene manager and validates the viewport's
    /// scheme. Draw notifications are only honoured after this succeeds.
    pub fn pre_find_visible_objects(&self, scene: &Arc<dyn SceneManager>, viewport: &Viewport) {
        let valid = {
            let mut state = self.state.lock();
            let mut library = self.materials.write();
            state.active_scene = Some(scene.clone());
            match state.validate_scheme(&viewport.material_scheme, &mut library) {
                Ok(report) => {
                    if !report.is_complete() {
                        log::debug!(
                            "Scheme '{}' validated with {} failure(s)",
                            viewport.material_scheme,
                            report.failures.len()
                        );
                    }
                    true
                }
                Err(e) => {
                    log::debug!("Viewport scheme not validated: {e}");
                    false
                }
            }
        };
        self.active_viewport_valid.store(valid, Ordering::Release);
    }

    /// Starts listening to `scene`. The first scene manager added becomes
    /// the active one.
    pub fn add_scene_manager(&self, scene: Arc<dyn SceneManager>) {
        {
            let mut state = self.state.lock();
            if state.scene_managers.iter().any(|s| s.name() == scene.name()) {
                return;
            }
            state.scene_managers.push(scene.clone());
            if state.active_scene.is_none() {
                state.active_scene = Some(scene.clone());
            }
        }
        scene.add_render_object_listener(self.listener.clone());
        scene.add_visibility_listener(self.listener.clone());
    }

    pub fn remove_scene_manager(&self, name: &str) {
        let removed = {
            let mut state = self.state.lock();
            let Some(index) = state.scene_managers.iter().position(|s| s.name() == name) else {
                return;
            };
            let scene = state.scene_managers.remove(index);
            if state
                .active_scene
                .as_ref()
                .is_some_and(|active| Arc::ptr_eq(active, &scene))
            {
                state.active_scene = None;
                self.active_viewport_valid.store(false, Ordering::Release);
            }
            scene
        };
        self.detach_listeners(&*removed);
    }

    fn detach_listeners(&self, scene: &dyn SceneManager) {
        let render_listener: Arc<dyn RenderObjectListener> = self.listener.clone();
        scene.remove_render_object_listener(&render_listener);
        let visibility_listener: Arc<dyn VisibilityListener> = self.listener.clone();
        scene.remove_visibility_listener(&visibility_listener);
    }

    pub fn set_active_scene_manager(&self, scene: Option<Arc<dyn SceneManager>>) {
        let mut state = self.state.lock();
        let changed = match (&state.active_scene, &scene) {
            (Some(current), Some(next)) => !Arc::ptr_eq(current, next),
            (None, None) => false,
            _ => true,
        };
        if changed {
            self.active_viewport_valid.store(false, Ordering::Release);
        }
        state.active_scene = scene;
    }

    #[must_use]
    pub fn active_scene_manager(&self) -> Option<Arc<dyn SceneManager>> {
        self.state.lock().active_scene.clone()
    }

    #[must_use]
    pub fn scene_manager_count(&self) -> usize {
        self.state.lock().scene_managers.len()
    }

    // ========================================================================
    // Shader programs
    // ========================================================================

    /// Releases every generated program, destroys the cached programs and
    /// marks all schemes dirty.
    pub fn flush_shader_cache(&self) {
        let mut state = self.state.lock();
        let mut library = self.materials.write();
        state.flush_shader_cache(&mut library);
    }

    /// Destroys cached programs that no generated pass holds any more.
    ///
    /// Returns the number of evicted programs. Long-running hosts that churn
    /// materials call this to bound the cache without forcing a full
    /// regeneration.
    pub fn trim_shader_cache(&self) -> usize {
        let evicted = self.state.lock().programs.evict_unused();
        if evicted > 0 {
            log::info!("Evicted {evicted} unused programs from the shader cache");
        }
        evicted
    }

    /// Switches the target language, flushing the shader cache when it
    /// changes.
    pub fn set_target_language(&self, language: &str) -> Result<()> {
        let mut state = self.state.lock();
        if !state.programs.backend().is_language_supported(language) {
            return Err(ShaderGenError::UnsupportedLanguage(language.to_string()));
        }
        if state.target.language == language {
            return Ok(());
        }
        let mut library = self.materials.write();
        state.flush_shader_cache(&mut library);
        language.clone_into(&mut state.target.language);
        log::info!("Shader generator target language set to '{language}'");
        Ok(())
    }

    #[must_use]
    pub fn target_language(&self) -> String {
        self.state.lock().target.language.clone()
    }

    pub fn set_shader_profiles(&self, stage: ShaderStage, profiles: &str) {
        self.state.lock().target.set_profiles(stage, profiles);
    }

    #[must_use]
    pub fn shader_profiles(&self, stage: ShaderStage) -> String {
        self.state.lock().target.profiles(stage).to_string()
    }

    #[must_use]
    pub fn shader_profile_list(&self, stage: ShaderStage) -> Vec<String> {
        self.state.lock().target.profile_list(stage)
    }

    /// Sets the directory generated sources are written to. An empty path
    /// disables writing.
    ///
    /// The path is normalised to forward slashes with a trailing `/`, and
    /// checked by creating and removing a probe file.
    pub fn set_shader_cache_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut normalized = path.as_ref().to_string_lossy().replace('\\', "/");
        if !normalized.is_empty() && !normalized.ends_with('/') {
            normalized.push('/');
        }

        let mut state = self.state.lock();
        if normalized.is_empty() {
            state.programs.set_cache_dir(None);
            return Ok(());
        }

        let dir = PathBuf::from(&normalized);
        if state.programs.cache_dir() == Some(dir.as_path()) {
            return Ok(());
        }
        let probe = dir.join(CACHE_PROBE_FILE);
        std::fs::File::create(&probe)
            .and_then(|_| std::fs::remove_file(&probe))
            .map_err(|source| ShaderGenError::CacheDirectoryNotWritable {
                path: dir.clone(),
                source,
            })?;
        log::debug!("Shader cache path set to {normalized}");
        state.programs.set_cache_dir(Some(dir));
        Ok(())
    }

    #[must_use]
    pub fn shader_cache_path(&self) -> Option<PathBuf> {
        self.state.lock().programs.cache_dir().map(Path::to_path_buf)
    }

    /// Number of cached programs of `stage`.
    #[must_use]
    pub fn shader_count(&self, stage: ShaderStage) -> usize {
        self.state.lock().programs.shader_count(stage)
    }

    /// Reference count of the generated program called `name`.
    #[must_use]
    pub fn program_ref_count(&self, name: &str) -> usize {
        self.state.lock().programs.ref_count(name)
    }

    pub fn set_create_shader_over_programmable_pass(&self, value: bool) {
        self.state.lock().over_programmable = value;
    }

    #[must_use]
    pub fn create_shader_over_programmable_pass(&self) -> bool {
        self.state.lock().over_programmable
    }

    // ========================================================================
    // Introspection and scripting
    // ========================================================================

    /// A translator for `node` if it is an `rtshader_system` block.
    #[must_use]
    pub fn get_translator(&self, node: &ObjectNode) -> Option<ScriptTranslator> {
        (node.keyword == RTSHADER_SYSTEM_KEYWORD)
            .then(|| ScriptTranslator::new(self.listener.generator.clone()))
    }

    /// Number of registered shader-based techniques.
    #[must_use]
    pub fn technique_count(&self) -> usize {
        self.state.lock().techniques.len()
    }

    /// Shader-based technique that owns a generated destination technique.
    #[must_use]
    pub fn technique_info(&self, dst_technique: TechniqueId) -> Option<TechniqueInfo> {
        let state = self.state.lock();
        let key = state.bindings.techniques.get(&dst_technique)?;
        let technique = state.techniques.get(*key)?;
        Some(TechniqueInfo {
            material: technique.material.0.clone(),
            group: technique.material.1.clone(),
            src_scheme: technique.src_scheme.clone(),
            dst_scheme: technique.dst_scheme.clone(),
            src_technique: technique.src_technique,
            pass_count: technique.passes.len(),
        })
    }

    /// Generated passes of every shader-based technique of a material.
    #[must_use]
    pub fn generated_passes(&self, name: &str, group: &str) -> Vec<GeneratedPass> {
        let state = self.state.lock();
        let Some(material) = state.materials.resolve(name, group) else {
            return Vec::new();
        };
        let Some(entry) = state.materials.get(&material) else {
            return Vec::new();
        };
        entry
            .techniques
            .iter()
            .filter_map(|key| state.techniques.get(*key))
            .flat_map(|technique| {
                technique
                    .passes
                    .iter()
                    .chain(&technique.illumination_passes)
                    .map(move |pass| GeneratedPass {
                        scheme: technique.dst_scheme.clone(),
                        src_pass: pass.src_pass,
                        dst_pass: pass.dst_pass,
                        stage: pass.stage,
                        sub_render_states: pass
                            .target
                            .as_ref()
                            .map(|t| t.type_names())
                            .unwrap_or_default(),
                        programs: pass
                            .target
                            .as_ref()
                            .and_then(TargetRenderState::program_names)
                            .map(|(vs, fs)| (vs.to_string(), fs.to_string())),
                    })
            })
            .collect()
    }

    /// True if `pass` belongs to a generated technique.
    #[must_use]
    pub fn is_generated_pass(&self, pass: PassId) -> bool {
        let state = self.state.lock();
        state
            .bindings
            .passes
            .get(&pass)
            .and_then(|key| state.techniques.get(*key))
            .and_then(|t| t.find_pass(pass))
            .is_some()
    }
}
