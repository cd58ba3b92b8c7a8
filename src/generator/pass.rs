use glam::IVec3;

use super::BuildEnv;
use crate::errors::Result;
use crate::features::FixedFunctionBuilder;
use crate::material::{IlluminationStage, Material, PassId};
use crate::render_state::{LinkContext, RenderState, StateOrigin, TargetRenderState};

/// One generated pass: the source pass it mirrors, the destination pass it
/// writes programs into, and the resolved target render state.
#[derive(Debug)]
pub(crate) struct SgPass {
    pub(crate) src_pass: PassId,
    pub(crate) dst_pass: PassId,
    /// Set for passes created from compiled illumination passes.
    pub(crate) stage: Option<IlluminationStage>,
    /// Index into the owning technique's custom render states.
    pub(crate) custom_index: Option<usize>,
    pub(crate) target: Option<TargetRenderState>,
}

impl SgPass {
    pub(crate) fn new(
        src_pass: PassId,
        dst_pass: PassId,
        stage: Option<IlluminationStage>,
        custom_index: Option<usize>,
    ) -> Self {
        Self {
            src_pass,
            dst_pass,
            stage,
            custom_index,
            target: None,
        }
    }

    /// Resolves the light count a pass is generated for: the custom render
    /// state's explicit count, else the scheme-global count, else none.
    pub(crate) fn resolve_light_count(custom: Option<&RenderState>, global: Option<&RenderState>) -> IVec3 {
        custom
            .filter(|c| !c.light_count_auto_update())
            .or(global)
            .map_or(IVec3::ZERO, RenderState::light_count)
    }

    /// Builds the target render state from scratch.
    ///
    /// Programmable source passes are left alone unless `over_programmable`
    /// is set; illumination passes are always generated.
    pub(crate) fn build_target_render_state(
        &mut self,
        material: &Material,
        custom: Option<&RenderState>,
        over_programmable: bool,
        env: &BuildEnv<'_>,
    ) -> Result<()> {
        self.reset(env);

        let Some((_, src)) = material.find_pass(self.src_pass) else {
            log::warn!("Source pass {} vanished from material '{}'", self.src_pass, material.name());
            return Ok(());
        };
        let Some((_, dst)) = material.find_pass(self.dst_pass) else {
            log::warn!("Destination pass {} vanished from material '{}'", self.dst_pass, material.name());
            return Ok(());
        };
        if src.is_programmable() && !over_programmable && self.stage.is_none() {
            log::debug!("Skipping programmable pass '{}' of '{}'", src.name, material.name());
            return Ok(());
        }

        let light_count = Self::resolve_light_count(custom, env.global);
        let ctx = LinkContext {
            src_pass: src,
            dst_pass: dst,
            light_count,
            fog_mode: env.fog_mode,
        };

        let mut target = TargetRenderState::new(light_count);
        FixedFunctionBuilder::build(&mut target, &ctx, env.registry)?;
        if let Some(custom) = custom {
            target.link(custom, StateOrigin::Custom, &ctx, env.registry)?;
        }
        if let Some(global) = env.global {
            target.link(global, StateOrigin::Global, &ctx, env.registry)?;
        }
        self.target = Some(target);
        Ok(())
    }

    /// Acquires programs for the target render state, if one was built.
    pub(crate) fn acquire_programs(&mut self, material: &mut Material, env: &mut BuildEnv<'_>) -> Result<()> {
        let Some(target) = &mut self.target else {
            return Ok(());
        };
        let Some(dst) = material.find_pass_mut(self.dst_pass) else {
            return Ok(());
        };
        target.acquire_programs(env.programs, env.target, dst)
    }

    /// Releases held programs, detaching them from the destination pass when
    /// the material still exists.
    pub(crate) fn release_programs(&mut self, material: Option<&mut Material>, env: &mut BuildEnv<'_>) {
        if let Some(target) = &mut self.target {
            let dst = material.and_then(|m| m.find_pass_mut(self.dst_pass));
            target.release_programs(env.programs, dst);
        }
    }

    /// Drops the target render state, returning its instances to their
    /// factories.
    pub(crate) fn reset(&mut self, env: &BuildEnv<'_>) {
        if let Some(mut target) = self.target.take() {
            target.reset(env.registry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_custom_count_wins() {
        let mut custom = RenderState::new();
        let mut global = RenderState::new();
        global.sync_light_count(IVec3::new(1, 1, 0));

        // Auto-updating custom state defers to the global one.
        assert_eq!(
            SgPass::resolve_light_count(Some(&custom), Some(&global)),
            IVec3::new(1, 1, 0)
        );

        custom.set_light_count(IVec3::new(0, 0, 2));
        assert_eq!(
            SgPass::resolve_light_count(Some(&custom), Some(&global)),
            IVec3::new(0, 0, 2)
        );
        assert_eq!(SgPass::resolve_light_count(None, None), IVec3::ZERO);
    }
}
