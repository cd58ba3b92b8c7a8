use glam::IVec3;

use crate::errors::Result;
use crate::features::ffp::{light_count_defines, light_slots, light_type_suffix, write_light_params};
use crate::impl_sub_render_state_boilerplate;
use crate::program::{ProgramSet, UniformType};
use crate::render_state::{
    LinkContext, ParameterUpdate, SubRenderState, SubRenderStateFactory, execution_order,
};
use crate::script::{PropertyNode, ScriptContext};

/// Space the normal map is authored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NormalMapSpace {
    #[default]
    Tangent,
    Object,
}

impl NormalMapSpace {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            NormalMapSpace::Tangent => "tangent_space",
            NormalMapSpace::Object => "object_space",
        }
    }
}

/// Per-pixel lighting with normals fetched from a texture.
#[derive(Debug, Clone, Default)]
pub struct NormalMapLighting {
    pub normal_map: String,
    pub space: NormalMapSpace,
    pub tex_coord_index: u32,
    pub light_count: IVec3,
}

impl NormalMapLighting {
    pub const TYPE: &'static str = "SGX_NormalMapLighting";
}

impl SubRenderState for NormalMapLighting {
    fn type_name(&self) -> &'static str {
        Self::TYPE
    }

    fn execution_order(&self) -> i32 {
        execution_order::LIGHTING
    }

    fn pre_add_to_render_state(&mut self, ctx: &LinkContext<'_>) -> bool {
        if !ctx.src_pass.lighting_enabled || self.normal_map.is_empty() {
            return false;
        }
        self.light_count = ctx.light_count;
        true
    }

    fn create_cpu_sub_programs(&self, programs: &mut ProgramSet) -> bool {
        light_count_defines(programs, self.light_count);
        let coord = format!("iTexcoord{}", self.tex_coord_index);

        let vs = &mut programs.vertex;
        vs.add_dependency("SGXLib_NormalMapLighting");
        match self.space {
            NormalMapSpace::Tangent => {
                vs.add_invocation(
                    execution_order::LIGHTING,
                    "SGX_ConstructTBNMatrix",
                    &["iNormal", "iTangent", "oTBN"],
                );
            }
            NormalMapSpace::Object => {
                vs.add_uniform("worldInverse", UniformType::Mat4);
                vs.add_invocation(
                    execution_order::LIGHTING,
                    "SGX_ObjectSpaceBasis",
                    &["worldInverse", "oTBN"],
                );
            }
        }
        vs.add_invocation(
            execution_order::LIGHTING,
            "FFP_Assign",
            &[coord.as_str(), "oNormalMapCoord"],
        );

        let fs = &mut programs.fragment;
        fs.add_dependency("SGXLib_NormalMapLighting");
        fs.add_uniform("gNormalMapSampler", UniformType::Sampler2D);
        fs.add_invocation(
            execution_order::LIGHTING,
            "SGX_FetchNormal",
            &["gNormalMapSampler", "iNormalMapCoord", "iTBN", "lNormal"],
        );
        for (index, light) in light_slots(self.light_count) {
            let position = format!("lightPosition{index}");
            let diffuse = format!("lightDiffuse{index}");
            fs.add_uniform(&position, UniformType::Vec4);
            fs.add_uniform(&diffuse, UniformType::Vec4);
            fs.add_invocation(
                execution_order::LIGHTING + 1,
                &format!("SGX_Light_{}_Diffuse", light_type_suffix(light)),
                &["lNormal", position.as_str(), diffuse.as_str(), "oColour"],
            );
        }
        true
    }

    fn update_gpu_params(&self, update: &mut ParameterUpdate<'_>) {
        write_light_params(update, self.light_count);
    }

    impl_sub_render_state_boilerplate!();
}

pub struct NormalMapLightingFactory;

impl SubRenderStateFactory for NormalMapLightingFactory {
    fn type_name(&self) -> &'static str {
        NormalMapLighting::TYPE
    }

    fn create_instance(&self) -> Box<dyn SubRenderState> {
        Box::new(NormalMapLighting::default())
    }

    /// `lighting_stage normal_map <texture> [tangent_space|object_space] [texcoord]`
    fn create_from_property(
        &self,
        property: &PropertyNode,
        _ctx: &ScriptContext<'_>,
    ) -> Result<Option<Box<dyn SubRenderState>>> {
        if property.name != "lighting_stage" || property.value(0) != Some("normal_map") {
            return Ok(None);
        }

        let Some(texture) = property.value(1) else {
            return Err(property.invalid("missing normal map texture name"));
        };
        let space = match property.value(2) {
            None | Some("tangent_space") => NormalMapSpace::Tangent,
            Some("object_space") => NormalMapSpace::Object,
            Some(other) => {
                return Err(property.invalid(format!("unknown normal map space '{other}'")));
            }
        };
        let tex_coord_index = match property.value(3) {
            Some(_) => property.parse_value::<u32>(3)?,
            None => 0,
        };

        Ok(Some(Box::new(NormalMapLighting {
            normal_map: texture.to_string(),
            space,
            tex_coord_index,
            light_count: IVec3::ZERO,
        })))
    }
}
