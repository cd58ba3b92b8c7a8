use super::ffp::{FfpAlphaTest, FfpColour, FfpFog, FfpLighting, FfpTexturing, FfpTransform};
use crate::errors::Result;
use crate::render_state::{FactoryRegistry, LinkContext, TargetRenderState};

/// Fixed-function stages in execution order.
const FIXED_FUNCTION_STAGES: [&str; 6] = [
    FfpTransform::TYPE,
    FfpColour::TYPE,
    FfpLighting::TYPE,
    FfpTexturing::TYPE,
    FfpFog::TYPE,
    FfpAlphaTest::TYPE,
];

/// Translates the fixed-function state of a pass into sub-render-states.
///
/// Every stage is instantiated through the registry and offered the pass;
/// stages the pass does not use decline in `pre_add_to_render_state`.
pub struct FixedFunctionBuilder;

impl FixedFunctionBuilder {
    pub fn build(
        target: &mut TargetRenderState,
        ctx: &LinkContext<'_>,
        registry: &FactoryRegistry,
    ) -> Result<()> {
        for type_name in FIXED_FUNCTION_STAGES {
            let mut state = registry.create(type_name)?;
            if state.pre_add_to_render_state(ctx) {
                target.add_fixed_function(state);
            } else {
                registry.destroy(state);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::features::register_builtin_factories;
    use crate::material::{AlphaRejection, CompareFunction, Pass, TextureUnit};
    use crate::scene::FogMode;
    use glam::IVec3;

    fn ctx(pass: &Pass, fog_mode: FogMode) -> LinkContext<'_> {
        LinkContext {
            src_pass: pass,
            dst_pass: pass,
            light_count: IVec3::new(0, 1, 0),
            fog_mode,
        }
    }

    #[test]
    fn unlit_pass_gets_transform_and_colour() {
        let mut registry = FactoryRegistry::new();
        register_builtin_factories(&mut registry).unwrap();

        let mut pass = Pass::new("unlit");
        pass.lighting_enabled = false;

        let mut target = TargetRenderState::new(IVec3::ZERO);
        FixedFunctionBuilder::build(&mut target, &ctx(&pass, FogMode::None), &registry).unwrap();
        assert_eq!(target.type_names(), ["FFP_Transform", "FFP_Colour"]);
        assert_eq!(target.linked_count(), 0);
    }

    #[test]
    fn fully_configured_pass_gets_every_stage() {
        let mut registry = FactoryRegistry::new();
        register_builtin_factories(&mut registry).unwrap();

        let mut pass = Pass::new("full");
        pass.add_texture_unit(TextureUnit::new("albedo.png"));
        pass.alpha_rejection = Some(AlphaRejection {
            function: CompareFunction::GreaterEqual,
            value: 10,
        });

        let mut target = TargetRenderState::new(IVec3::ZERO);
        FixedFunctionBuilder::build(&mut target, &ctx(&pass, FogMode::Linear), &registry)
            .unwrap();
        assert_eq!(target.type_names(), FIXED_FUNCTION_STAGES);
    }

    #[test]
    fn missing_factory_is_an_error() {
        let registry = FactoryRegistry::new();
        let pass = Pass::new("p");
        let mut target = TargetRenderState::new(IVec3::ZERO);
        let err = FixedFunctionBuilder::build(&mut target, &ctx(&pass, FogMode::None), &registry)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
