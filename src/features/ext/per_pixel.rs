use glam::{IVec3, Vec3};

use crate::errors::Result;
use crate::features::ffp::{light_count_defines, light_slots, light_type_suffix, write_light_params};
use crate::impl_sub_render_state_boilerplate;
use crate::program::{ProgramSet, UniformType};
use crate::render_state::{
    LinkContext, ParameterUpdate, SubRenderState, SubRenderStateFactory, execution_order,
};
use crate::script::{PropertyNode, ScriptContext};

/// Lighting evaluated per fragment. Occupies the lighting slot.
#[derive(Debug, Clone, Default)]
pub struct PerPixelLighting {
    pub light_count: IVec3,
    pub specular: bool,
}

impl PerPixelLighting {
    pub const TYPE: &'static str = "SGX_PerPixelLighting";
}

impl SubRenderState for PerPixelLighting {
    fn type_name(&self) -> &'static str {
        Self::TYPE
    }

    fn execution_order(&self) -> i32 {
        execution_order::LIGHTING
    }

    fn pre_add_to_render_state(&mut self, ctx: &LinkContext<'_>) -> bool {
        if !ctx.src_pass.lighting_enabled {
            return false;
        }
        self.light_count = ctx.light_count;
        self.specular =
            ctx.src_pass.shininess > 0.0 && ctx.src_pass.specular.truncate() != Vec3::ZERO;
        true
    }

    fn create_cpu_sub_programs(&self, programs: &mut ProgramSet) -> bool {
        light_count_defines(programs, self.light_count);

        programs.vertex.add_dependency("SGXLib_PerPixelLighting");
        programs.vertex.add_uniform("worldView", UniformType::Mat4);
        programs.vertex.add_invocation(
            execution_order::LIGHTING,
            "SGX_TransformNormal",
            &["worldView", "iNormal", "oViewNormal"],
        );
        programs.vertex.add_invocation(
            execution_order::LIGHTING,
            "SGX_TransformPosition",
            &["worldView", "iPos", "oViewPos"],
        );

        let fs = &mut programs.fragment;
        fs.add_dependency("SGXLib_PerPixelLighting");
        fs.add_uniform("surfaceAmbient", UniformType::Vec4);
        fs.add_uniform("surfaceDiffuse", UniformType::Vec4);
        fs.add_uniform("surfaceEmissive", UniformType::Vec4);
        if self.specular {
            fs.add_uniform("surfaceSpecular", UniformType::Vec4);
            fs.add_uniform("surfaceShininess", UniformType::Float);
        }
        fs.add_invocation(
            execution_order::LIGHTING,
            "SGX_Light_Ambient",
            &["surfaceAmbient", "surfaceEmissive", "oColour"],
        );
        for (index, light) in light_slots(self.light_count) {
            let position = format!("lightPosition{index}");
            let diffuse = format!("lightDiffuse{index}");
            let attenuation = format!("lightAttenuation{index}");
            fs.add_uniform(&position, UniformType::Vec4);
            fs.add_uniform(&diffuse, UniformType::Vec4);
            fs.add_uniform(&attenuation, UniformType::Vec4);
            let lighting = if self.specular { "DiffuseSpecular" } else { "Diffuse" };
            fs.add_invocation(
                execution_order::LIGHTING + 1,
                &format!("SGX_Light_{}_{lighting}", light_type_suffix(light)),
                &[
                    "iViewNormal",
                    "iViewPos",
                    position.as_str(),
                    diffuse.as_str(),
                    attenuation.as_str(),
                    "oColour",
                ],
            );
        }
        true
    }

    fn update_gpu_params(&self, update: &mut ParameterUpdate<'_>) {
        write_light_params(update, self.light_count);
    }

    impl_sub_render_state_boilerplate!();
}

pub struct PerPixelLightingFactory;

impl SubRenderStateFactory for PerPixelLightingFactory {
    fn type_name(&self) -> &'static str {
        PerPixelLighting::TYPE
    }

    fn create_instance(&self) -> Box<dyn SubRenderState> {
        Box::new(PerPixelLighting::default())
    }

    fn create_from_property(
        &self,
        property: &PropertyNode,
        _ctx: &ScriptContext<'_>,
    ) -> Result<Option<Box<dyn SubRenderState>>> {
        if property.name == "lighting_stage" && property.value(0) == Some("per_pixel") {
            return Ok(Some(self.create_instance()));
        }
        Ok(None)
    }
}
