use glam::IVec3;
use slotmap::SlotMap;

use super::technique::{SgTechnique, TechniqueKey};
use crate::errors::ShaderGenError;
use crate::render_state::{FactoryRegistry, RenderState};
use crate::scene::{FogMode, SceneManager, count_lights};

/// A named group of shader-based techniques validated together.
///
/// A scheme is either up to date or dirty. It becomes dirty when a technique
/// is added, on explicit invalidation, or when the scene's light count or
/// fog mode drifts from the last validated values; validation makes it up to
/// date again unless a technique failed.
#[derive(Debug)]
pub(crate) struct SgScheme {
    pub(crate) name: String,
    pub(crate) techniques: Vec<TechniqueKey>,
    /// Scheme-global render state, created on first access.
    pub(crate) render_state: Option<RenderState>,
    pub(crate) out_of_date: bool,
    light_count: IVec3,
    pub(crate) fog_mode: FogMode,
}

impl SgScheme {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            techniques: Vec::new(),
            render_state: None,
            out_of_date: true,
            light_count: IVec3::ZERO,
            fog_mode: FogMode::None,
        }
    }

    pub(crate) fn render_state_mut(&mut self) -> &mut RenderState {
        let light_count = self.light_count;
        self.render_state.get_or_insert_with(|| {
            let mut state = RenderState::new();
            state.sync_light_count(light_count);
            state
        })
    }

    pub(crate) fn add_technique(&mut self, key: TechniqueKey) {
        self.techniques.push(key);
        self.out_of_date = true;
    }

    pub(crate) fn remove_technique(&mut self, key: TechniqueKey) {
        self.techniques.retain(|&t| t != key);
    }

    /// Marks every technique for rebuild.
    pub(crate) fn invalidate(&mut self, techniques: &mut SlotMap<TechniqueKey, SgTechnique>) {
        for key in &self.techniques {
            if let Some(technique) = techniques.get_mut(*key) {
                technique.needs_rebuild = true;
            }
        }
        self.out_of_date = true;
    }

    /// Finds the technique generated for `(name, group)` in this scheme.
    pub(crate) fn find_technique(
        &self,
        techniques: &SlotMap<TechniqueKey, SgTechnique>,
        name: &str,
        group: &str,
    ) -> Option<TechniqueKey> {
        self.techniques
            .iter()
            .copied()
            .find(|key| techniques.get(*key).is_some_and(|t| t.matches_material(name, group)))
    }

    /// Compares the scene's light count and fog mode with the last seen
    /// values and invalidates the scheme on any difference.
    ///
    /// Light counting is skipped while the global render state holds an
    /// explicit light count. A drifted count is pushed into the global
    /// render state, which is created if needed.
    pub(crate) fn synchronize(
        &mut self,
        scene: &dyn SceneManager,
        techniques: &mut SlotMap<TechniqueKey, SgTechnique>,
    ) {
        let auto_update = self
            .render_state
            .as_ref()
            .is_none_or(RenderState::light_count_auto_update);
        if auto_update {
            let count = count_lights(scene.lights_affecting_frustum());
            if count != self.light_count {
                log::debug!(
                    "Scheme '{}': light count changed {} -> {}",
                    self.name,
                    self.light_count,
                    count
                );
                self.light_count = count;
                self.render_state_mut().sync_light_count(count);
                self.invalidate(techniques);
            }
        }

        let fog_mode = scene.fog_mode();
        if fog_mode != self.fog_mode {
            log::debug!("Scheme '{}': fog mode changed to {}", self.name, fog_mode.as_str());
            self.fog_mode = fog_mode;
            self.invalidate(techniques);
        }
    }

    pub(crate) fn teardown(&mut self, registry: &FactoryRegistry) {
        self.techniques.clear();
        if let Some(state) = &mut self.render_state {
            state.reset(registry);
        }
    }
}

/// A technique that could not be rebuilt or could not acquire programs.
#[derive(Debug)]
pub struct ValidationFailure {
    pub material: String,
    pub group: String,
    pub error: ShaderGenError,
}

/// Result of validating a scheme.
#[derive(Debug, Default)]
pub struct ValidationReport {
    /// Techniques whose target render states were rebuilt.
    pub rebuilt: usize,
    /// Techniques that acquired programs and are now up to date.
    pub acquired: usize,
    pub failures: Vec<ValidationFailure>,
}

impl ValidationReport {
    /// True when nothing failed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}
