use glam::IVec3;

use super::registry::FactoryRegistry;
use super::render_state::RenderState;
use super::sub_render_state::{LinkContext, ParameterUpdate, SubRenderState, execution_order};
use crate::errors::{Result, ShaderGenError};
use crate::material::Pass;
use crate::program::{ProgramManager, ProgramParameters, ProgramSet, ProgramTarget};
use crate::scene::{Light, Renderable};

/// Which layer contributed an instance to a target render state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateOrigin {
    /// Derived from the source pass by the fixed-function builder.
    FixedFunction,
    /// Linked from the pass-level custom render state.
    Custom,
    /// Linked from the scheme-global render state.
    Global,
}

#[derive(Debug)]
struct TargetEntry {
    state: Box<dyn SubRenderState>,
    origin: StateOrigin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AcquiredPrograms {
    vertex: String,
    fragment: String,
}

/// Resolved sub-render-state instances of one generated pass, plus the
/// program pair acquired for them.
#[derive(Debug)]
pub struct TargetRenderState {
    entries: Vec<TargetEntry>,
    light_count: IVec3,
    programs: Option<AcquiredPrograms>,
    params: ProgramParameters,
}

impl TargetRenderState {
    #[must_use]
    pub fn new(light_count: IVec3) -> Self {
        Self {
            entries: Vec::new(),
            light_count,
            programs: None,
            params: ProgramParameters::new(),
        }
    }

    #[must_use]
    pub fn light_count(&self) -> IVec3 {
        self.light_count
    }

    /// Adds an instance produced by the fixed-function builder.
    pub fn add_fixed_function(&mut self, state: Box<dyn SubRenderState>) {
        self.entries.push(TargetEntry {
            state,
            origin: StateOrigin::FixedFunction,
        });
        self.sort();
    }

    /// Links the templates of `source` into this target.
    ///
    /// For every template:
    /// - if it sits on a fixed-function stage slot, the instance already in
    ///   that slot decides: a builder-derived instance is replaced by a copy,
    ///   an instance from an earlier layer makes the template skip;
    /// - else if an instance of the same type is already present, the
    ///   template is skipped (the earlier layer wins);
    /// - otherwise a factory-made copy is adapted to the pass and appended.
    ///
    /// Returns the number of linked instances.
    pub fn link(
        &mut self,
        source: &RenderState,
        origin: StateOrigin,
        ctx: &LinkContext<'_>,
        registry: &FactoryRegistry,
    ) -> Result<usize> {
        let mut linked = 0;
        for template in source.templates() {
            let order = template.execution_order();
            let slot = if execution_order::is_fixed_function(order) {
                self.entries
                    .iter()
                    .position(|e| e.state.execution_order() == order)
            } else {
                None
            };

            let replace = match slot {
                Some(index) if self.entries[index].origin == StateOrigin::FixedFunction => {
                    Some(index)
                }
                Some(index) => {
                    log::debug!(
                        "Skipping {:?} template '{}': slot held by {:?} '{}'",
                        origin,
                        template.type_name(),
                        self.entries[index].origin,
                        self.entries[index].state.type_name()
                    );
                    continue;
                }
                None => None,
            };

            if replace.is_none() && self.contains(template.type_name()) {
                log::debug!(
                    "Skipping {:?} template '{}': type already present",
                    origin,
                    template.type_name()
                );
                continue;
            }

            let mut instance = registry.duplicate(&**template)?;
            if !instance.pre_add_to_render_state(ctx) {
                registry.destroy(instance);
                continue;
            }

            let entry = TargetEntry {
                state: instance,
                origin,
            };
            match replace {
                Some(index) => {
                    let replaced = std::mem::replace(&mut self.entries[index], entry);
                    registry.destroy(replaced.state);
                }
                None => self.entries.push(entry),
            }
            linked += 1;
        }
        self.sort();
        Ok(linked)
    }

    fn sort(&mut self) {
        self.entries.sort_by_key(|e| e.state.execution_order());
    }

    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        self.entries.iter().any(|e| e.state.type_name() == type_name)
    }

    #[must_use]
    pub fn sub_render_state(&self, type_name: &str) -> Option<&(dyn SubRenderState + 'static)> {
        self.entries
            .iter()
            .find(|e| e.state.type_name() == type_name)
            .map(|e| &*e.state)
    }

    /// Type names in execution order.
    #[must_use]
    pub fn type_names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.state.type_name()).collect()
    }

    #[must_use]
    pub fn origin_of(&self, type_name: &str) -> Option<StateOrigin> {
        self.entries
            .iter()
            .find(|e| e.state.type_name() == type_name)
            .map(|e| e.origin)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Instances contributed by custom or global layers.
    #[must_use]
    pub fn linked_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.origin != StateOrigin::FixedFunction)
            .count()
    }

    #[must_use]
    pub fn fixed_function_count(&self) -> usize {
        self.len() - self.linked_count()
    }

    /// Collects the program contributions of every instance.
    pub fn create_program_set(&self) -> Result<ProgramSet> {
        let mut set = ProgramSet::new();
        for entry in &self.entries {
            if !entry.state.create_cpu_sub_programs(&mut set) {
                return Err(ShaderGenError::SubProgramGeneration(
                    entry.state.type_name().to_string(),
                ));
            }
        }
        Ok(set)
    }

    /// Generates and acquires the program pair, assigning it to `dst_pass`.
    /// Does nothing when programs are already held.
    pub fn acquire_programs(
        &mut self,
        programs: &mut ProgramManager,
        target: &ProgramTarget,
        dst_pass: &mut Pass,
    ) -> Result<()> {
        if self.programs.is_some() {
            return Ok(());
        }

        let set = self.create_program_set()?;
        let vertex = programs.acquire(&set.vertex, target)?;
        let fragment = match programs.acquire(&set.fragment, target) {
            Ok(name) => name,
            Err(e) => {
                programs.release(&vertex);
                return Err(e);
            }
        };

        dst_pass.set_vertex_program(vertex.as_str());
        dst_pass.set_fragment_program(fragment.as_str());
        self.programs = Some(AcquiredPrograms { vertex, fragment });
        Ok(())
    }

    /// Releases held programs and detaches them from `dst_pass` if given.
    pub fn release_programs(&mut self, programs: &mut ProgramManager, dst_pass: Option<&mut Pass>) {
        let Some(acquired) = self.programs.take() else {
            return;
        };
        programs.release(&acquired.vertex);
        programs.release(&acquired.fragment);
        if let Some(pass) = dst_pass {
            pass.clear_programs();
        }
    }

    #[must_use]
    pub fn has_programs(&self) -> bool {
        self.programs.is_some()
    }

    /// Names of the acquired `(vertex, fragment)` programs.
    #[must_use]
    pub fn program_names(&self) -> Option<(&str, &str)> {
        self.programs
            .as_ref()
            .map(|p| (p.vertex.as_str(), p.fragment.as_str()))
    }

    /// Writes per-draw parameters and pushes them to both programs.
    pub fn update_gpu_program_params(
        &mut self,
        renderable: &dyn Renderable,
        pass: &Pass,
        lights: &[Light],
        programs: &ProgramManager,
    ) {
        let Some(acquired) = &self.programs else {
            return;
        };

        let mut update = ParameterUpdate {
            renderable,
            pass,
            lights,
            params: &mut self.params,
        };
        for entry in &self.entries {
            entry.state.update_gpu_params(&mut update);
        }

        programs.update_parameters(&acquired.vertex, &self.params);
        programs.update_parameters(&acquired.fragment, &self.params);
    }

    #[must_use]
    pub fn parameters(&self) -> &ProgramParameters {
        &self.params
    }

    /// Returns every instance to its factory.
    pub fn reset(&mut self, registry: &FactoryRegistry) {
        for entry in self.entries.drain(..) {
            registry.destroy(entry.state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::ext::{NormalMapLighting, PerPixelLighting};
    use crate::features::ffp::{FfpFog, FfpLighting, FfpTransform};
    use crate::features::register_builtin_factories;
    use crate::scene::FogMode;

    fn registry() -> FactoryRegistry {
        let mut registry = FactoryRegistry::new();
        register_builtin_factories(&mut registry).unwrap();
        registry
    }

    fn fixed_function_target() -> TargetRenderState {
        let mut target = TargetRenderState::new(IVec3::new(0, 1, 0));
        target.add_fixed_function(Box::new(FfpLighting::default()));
        target.add_fixed_function(Box::new(FfpTransform::default()));
        target.add_fixed_function(Box::new(FfpFog::per_vertex()));
        target
    }

    #[test]
    fn empty_layers_add_nothing() {
        let registry = registry();
        let pass = Pass::new("p");
        let ctx = LinkContext {
            src_pass: &pass,
            dst_pass: &pass,
            light_count: IVec3::ZERO,
            fog_mode: FogMode::Linear,
        };

        let mut target = fixed_function_target();
        let empty = RenderState::new();
        assert_eq!(target.link(&empty, StateOrigin::Custom, &ctx, &registry).unwrap(), 0);
        assert_eq!(target.link(&empty, StateOrigin::Global, &ctx, &registry).unwrap(), 0);
        assert_eq!(target.linked_count(), 0);
        assert_eq!(target.type_names(), ["FFP_Transform", "FFP_Lighting", "FFP_Fog"]);
    }

    #[test]
    fn custom_layer_wins_over_global() {
        let registry = registry();
        let pass = Pass::new("p");
        let ctx = LinkContext {
            src_pass: &pass,
            dst_pass: &pass,
            light_count: IVec3::ZERO,
            fog_mode: FogMode::Linear,
        };

        let mut custom = RenderState::new();
        custom.add_template(Box::new(FfpFog::per_pixel()));
        let mut global = RenderState::new();
        global.add_template(Box::new(FfpFog::per_vertex()));
        global.add_template(Box::new(PerPixelLighting::default()));

        let mut target = fixed_function_target();
        assert_eq!(target.link(&custom, StateOrigin::Custom, &ctx, &registry).unwrap(), 1);
        assert_eq!(target.link(&global, StateOrigin::Global, &ctx, &registry).unwrap(), 1);

        let fog = target
            .sub_render_state("FFP_Fog")
            .and_then(|s| s.downcast_ref::<FfpFog>())
            .unwrap();
        assert!(fog.per_pixel);
        assert_eq!(target.origin_of("FFP_Fog"), Some(StateOrigin::Custom));

        // Per-pixel lighting takes over the builder's lighting slot.
        assert!(!target.contains("FFP_Lighting"));
        assert_eq!(target.origin_of("SGX_PerPixelLighting"), Some(StateOrigin::Global));
        assert_eq!(target.fixed_function_count(), 1);
    }

    #[test]
    fn earlier_layer_keeps_its_slot() {
        let registry = registry();
        let pass = Pass::new("p");
        let ctx = LinkContext {
            src_pass: &pass,
            dst_pass: &pass,
            light_count: IVec3::ZERO,
            fog_mode: FogMode::Linear,
        };

        let mut custom = RenderState::new();
        custom.add_template(Box::new(PerPixelLighting::default()));
        let mut global = RenderState::new();
        global.add_template(Box::new(NormalMapLighting {
            normal_map: "n.png".into(),
            ..Default::default()
        }));

        let mut target = fixed_function_target();
        assert_eq!(target.link(&custom, StateOrigin::Custom, &ctx, &registry).unwrap(), 1);
        assert_eq!(target.link(&global, StateOrigin::Global, &ctx, &registry).unwrap(), 0);
        assert_eq!(
            target.type_names(),
            ["FFP_Transform", "SGX_PerPixelLighting", "FFP_Fog"]
        );
    }
}
