use slotmap::new_key_type;

use super::BuildEnv;
use super::material_entry::MaterialKey;
use super::pass::SgPass;
use crate::errors::Result;
use crate::material::{Material, MaterialLibrary, PassId, TechniqueId};
use crate::render_state::RenderState;

new_key_type! {
    /// Key of a shader-based technique in the generator's technique map.
    pub struct TechniqueKey;
}

/// A shader-based technique: the source technique it was derived from, the
/// generated destination technique, and one [`SgPass`] per pass.
#[derive(Debug)]
pub(crate) struct SgTechnique {
    pub(crate) material: MaterialKey,
    pub(crate) src_technique: TechniqueId,
    pub(crate) src_scheme: String,
    pub(crate) dst_scheme: String,
    pub(crate) dst_technique: Option<TechniqueId>,
    pub(crate) passes: Vec<SgPass>,
    pub(crate) illumination_passes: Vec<SgPass>,
    custom_render_states: Vec<Option<RenderState>>,
    pub(crate) needs_rebuild: bool,
    pub(crate) over_programmable: bool,
}

impl SgTechnique {
    pub(crate) fn new(
        material: MaterialKey,
        src_technique: TechniqueId,
        src_scheme: &str,
        dst_scheme: &str,
        over_programmable: bool,
    ) -> Self {
        Self {
            material,
            src_technique,
            src_scheme: src_scheme.to_string(),
            dst_scheme: dst_scheme.to_string(),
            dst_technique: None,
            passes: Vec::new(),
            illumination_passes: Vec::new(),
            custom_render_states: Vec::new(),
            needs_rebuild: true,
            over_programmable,
        }
    }

    pub(crate) fn matches_material(&self, name: &str, group: &str) -> bool {
        self.material.0 == name && self.material.1 == group
    }

    /// Custom render state of pass `index`, created on first access.
    pub(crate) fn custom_render_state_mut(&mut self, index: usize) -> &mut RenderState {
        if self.custom_render_states.len() <= index {
            self.custom_render_states.resize_with(index + 1, || None);
        }
        self.custom_render_states[index].get_or_insert_with(RenderState::new)
    }

    pub(crate) fn custom_render_states(&self) -> impl Iterator<Item = (usize, &RenderState)> {
        self.custom_render_states
            .iter()
            .enumerate()
            .filter_map(|(index, state)| state.as_ref().map(|s| (index, s)))
    }

    /// Installs `state` as the custom render state of pass `index`, returning
    /// the previous one.
    pub(crate) fn set_custom_render_state(&mut self, index: usize, state: RenderState) -> Option<RenderState> {
        if self.custom_render_states.len() <= index {
            self.custom_render_states.resize_with(index + 1, || None);
        }
        self.custom_render_states[index].replace(state)
    }

    /// Looks up a generated pass by its destination pass id.
    pub(crate) fn find_pass(&self, dst_pass: PassId) -> Option<&SgPass> {
        self.passes
            .iter()
            .chain(&self.illumination_passes)
            .find(|p| p.dst_pass == dst_pass)
    }

    pub(crate) fn find_pass_mut(&mut self, dst_pass: PassId) -> Option<&mut SgPass> {
        self.passes
            .iter_mut()
            .chain(&mut self.illumination_passes)
            .find(|p| p.dst_pass == dst_pass)
    }

    fn material_mut<'l>(&self, library: &'l mut MaterialLibrary) -> Option<&'l mut Material> {
        library.by_name_mut(&self.material.0, &self.material.1)
    }

    /// Recreates the destination technique and rebuilds every pass's target
    /// render state. Programs are not acquired here.
    pub(crate) fn build_target_render_state(
        &mut self,
        key: TechniqueKey,
        library: &mut MaterialLibrary,
        env: &mut BuildEnv<'_>,
    ) -> Result<()> {
        self.release_programs(library, env);
        self.destroy_illumination_passes(library, env);
        self.destroy_passes(env);

        let Some(material) = library.by_name_mut(&self.material.0, &self.material.1) else {
            log::warn!("Material '{}' vanished before its technique was built", self.material.0);
            return Ok(());
        };
        if let Some(old) = self.dst_technique.take() {
            material.remove_technique(old);
            env.bindings.techniques.remove(&old);
        }
        let Some(src) = material.technique_by_id(self.src_technique) else {
            log::warn!(
                "Source technique of material '{}' in scheme '{}' vanished",
                self.material.0,
                self.src_scheme
            );
            return Ok(());
        };

        let mut dst = src.duplicate();
        dst.scheme_name.clone_from(&self.dst_scheme);
        for (index, (src_pass, dst_pass)) in src.passes().iter().zip(dst.passes()).enumerate() {
            self.passes.push(SgPass::new(src_pass.id(), dst_pass.id(), None, Some(index)));
            env.bindings.passes.insert(dst_pass.id(), key);
        }
        let dst_id = material.add_technique(dst);
        env.bindings.techniques.insert(dst_id, key);
        self.dst_technique = Some(dst_id);

        let material = &*material;
        for pass in &mut self.passes {
            let custom = pass
                .custom_index
                .and_then(|i| self.custom_render_states.get(i))
                .and_then(Option::as_ref);
            pass.build_target_render_state(material, custom, self.over_programmable, env)?;
        }
        Ok(())
    }

    pub(crate) fn acquire_programs(&mut self, library: &mut MaterialLibrary, env: &mut BuildEnv<'_>) -> Result<()> {
        let Some(material) = library.by_name_mut(&self.material.0, &self.material.1) else {
            return Ok(());
        };
        for pass in &mut self.passes {
            pass.acquire_programs(material, env)?;
        }
        Ok(())
    }

    /// Releases the programs of every generated pass, illumination passes
    /// included.
    pub(crate) fn release_programs(&mut self, library: &mut MaterialLibrary, env: &mut BuildEnv<'_>) {
        let mut material = self.material_mut(library);
        for pass in self.passes.iter_mut().chain(&mut self.illumination_passes) {
            pass.release_programs(material.as_deref_mut(), env);
        }
    }

    fn destroy_passes(&mut self, env: &mut BuildEnv<'_>) {
        for mut pass in self.passes.drain(..) {
            env.bindings.passes.remove(&pass.dst_pass);
            pass.reset(env);
        }
    }

    /// Compiles the destination technique's illumination passes and builds
    /// a target render state for each generated one.
    pub(crate) fn build_illumination_passes(
        &mut self,
        key: TechniqueKey,
        library: &mut MaterialLibrary,
        env: &mut BuildEnv<'_>,
    ) -> Result<()> {
        self.destroy_illumination_passes(library, env);

        let Some(dst_id) = self.dst_technique else {
            return Ok(());
        };
        let Some(material) = library.by_name_mut(&self.material.0, &self.material.1) else {
            return Ok(());
        };
        let Some(technique) = material.technique_by_id_mut(dst_id) else {
            return Ok(());
        };

        technique.compile_illumination_passes();
        for illumination in technique.illumination_passes() {
            // Decal stages of unlit passes reuse the original pass.
            let Some(pass) = &illumination.pass else {
                continue;
            };
            let custom_index = self
                .passes
                .iter()
                .find(|p| p.dst_pass == illumination.original_pass)
                .and_then(|p| p.custom_index);
            self.illumination_passes.push(SgPass::new(
                pass.id(),
                pass.id(),
                Some(illumination.stage),
                custom_index,
            ));
            env.bindings.passes.insert(pass.id(), key);
        }

        let material = &*material;
        for pass in &mut self.illumination_passes {
            let custom = pass
                .custom_index
                .and_then(|i| self.custom_render_states.get(i))
                .and_then(Option::as_ref);
            pass.build_target_render_state(material, custom, self.over_programmable, env)?;
        }
        Ok(())
    }

    pub(crate) fn acquire_illumination_programs(
        &mut self,
        library: &mut MaterialLibrary,
        env: &mut BuildEnv<'_>,
    ) -> Result<()> {
        let Some(material) = library.by_name_mut(&self.material.0, &self.material.1) else {
            return Ok(());
        };
        for pass in &mut self.illumination_passes {
            pass.acquire_programs(material, env)?;
        }
        Ok(())
    }

    pub(crate) fn destroy_illumination_passes(&mut self, library: &mut MaterialLibrary, env: &mut BuildEnv<'_>) {
        let mut material = self.material_mut(library);
        for mut pass in self.illumination_passes.drain(..) {
            pass.release_programs(material.as_deref_mut(), env);
            env.bindings.passes.remove(&pass.dst_pass);
            pass.reset(env);
        }
        if let (Some(material), Some(id)) = (material, self.dst_technique)
            && let Some(technique) = material.technique_by_id_mut(id)
        {
            technique.clear_illumination_passes();
        }
    }

    /// Releases everything this technique holds: programs, generated passes,
    /// the destination technique and the custom render states.
    pub(crate) fn teardown(mut self, library: &mut MaterialLibrary, env: &mut BuildEnv<'_>) {
        self.release_programs(library, env);
        self.destroy_illumination_passes(library, env);
        self.destroy_passes(env);

        if let Some(id) = self.dst_technique.take() {
            env.bindings.techniques.remove(&id);
            if let Some(material) = self.material_mut(library) {
                material.remove_technique(id);
                if !env.finalizing {
                    material.touch();
                }
            }
        }

        for state in self.custom_render_states.iter_mut().flatten() {
            state.reset(env.registry);
        }
    }
}
