use crate::errors::Result;
use crate::impl_sub_render_state_boilerplate;
use crate::program::{ParamValue, ProgramSet, UniformType};
use crate::render_state::{
    LinkContext, ParameterUpdate, SubRenderState, SubRenderStateFactory, execution_order,
};
use crate::script::{PropertyNode, ScriptContext};

pub const MAX_BONE_COUNT: u16 = 256;
pub const MAX_WEIGHT_COUNT: u16 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SkinningType {
    #[default]
    Linear,
    DualQuaternion,
}

/// Vertex skinning on the GPU. Takes over the transform slot.
#[derive(Debug, Clone)]
pub struct HardwareSkinning {
    pub bone_count: u16,
    pub weight_count: u16,
    pub kind: SkinningType,
}

impl Default for HardwareSkinning {
    fn default() -> Self {
        Self {
            bone_count: 0,
            weight_count: 1,
            kind: SkinningType::Linear,
        }
    }
}

impl HardwareSkinning {
    pub const TYPE: &'static str = "SGX_HardwareSkinning";
}

impl SubRenderState for HardwareSkinning {
    fn type_name(&self) -> &'static str {
        Self::TYPE
    }

    fn execution_order(&self) -> i32 {
        execution_order::TRANSFORM
    }

    fn pre_add_to_render_state(&mut self, _ctx: &LinkContext<'_>) -> bool {
        self.bone_count > 0 && (1..=MAX_WEIGHT_COUNT).contains(&self.weight_count)
    }

    fn create_cpu_sub_programs(&self, programs: &mut ProgramSet) -> bool {
        let vs = &mut programs.vertex;
        vs.defines.set("SKIN_BONE_COUNT", &self.bone_count.to_string());
        vs.defines.set("SKIN_WEIGHT_COUNT", &self.weight_count.to_string());
        vs.add_dependency("SGXLib_HardwareSkinning");
        vs.add_uniform("worldViewProj", UniformType::Mat4);
        vs.add_uniform("boneCount", UniformType::Int);

        let (library_call, palette) = match self.kind {
            SkinningType::Linear => ("SGX_LinearBlendSkinning", "worldMatrix3x4Array"),
            SkinningType::DualQuaternion => ("SGX_DualQuaternionSkinning", "worldDualQuaternion2x4Array"),
        };
        vs.add_uniform(palette, UniformType::Vec4);
        vs.add_invocation(
            execution_order::TRANSFORM,
            library_call,
            &[palette, "iBlendIndices", "iBlendWeights", "iPos", "lPos"],
        );
        vs.add_invocation(
            execution_order::TRANSFORM + 1,
            "FFP_Transform",
            &["worldViewProj", "lPos", "oPos"],
        );
        true
    }

    fn update_gpu_params(&self, update: &mut ParameterUpdate<'_>) {
        let bones = update.renderable.bone_count().min(usize::from(self.bone_count));
        update
            .params
            .set("boneCount", ParamValue::Int(i32::try_from(bones).unwrap_or(i32::MAX)));
        update.params.set(
            "worldMatrix",
            ParamValue::Mat4(update.renderable.world_transform()),
        );
    }

    impl_sub_render_state_boilerplate!();
}

pub struct HardwareSkinningFactory;

impl SubRenderStateFactory for HardwareSkinningFactory {
    fn type_name(&self) -> &'static str {
        HardwareSkinning::TYPE
    }

    fn create_instance(&self) -> Box<dyn SubRenderState> {
        Box::new(HardwareSkinning::default())
    }

    /// `hardware_skinning <bones> <weights> [linear|dual_quaternion]`
    fn create_from_property(
        &self,
        property: &PropertyNode,
        _ctx: &ScriptContext<'_>,
    ) -> Result<Option<Box<dyn SubRenderState>>> {
        if property.name != "hardware_skinning" {
            return Ok(None);
        }

        let bone_count = property.parse_value::<u16>(0)?;
        let weight_count = property.parse_value::<u16>(1)?;
        if bone_count == 0 || bone_count > MAX_BONE_COUNT {
            return Err(property.invalid(format!(
                "bone count must be within 1..={MAX_BONE_COUNT}"
            )));
        }
        if weight_count == 0 || weight_count > MAX_WEIGHT_COUNT {
            return Err(property.invalid(format!(
                "weight count must be within 1..={MAX_WEIGHT_COUNT}"
            )));
        }
        let kind = match property.value(2) {
            None | Some("linear") => SkinningType::Linear,
            Some("dual_quaternion") => SkinningType::DualQuaternion,
            Some(other) => {
                return Err(property.invalid(format!("unknown skinning type '{other}'")));
            }
        };

        Ok(Some(Box::new(HardwareSkinning {
            bone_count,
            weight_count,
            kind,
        })))
    }
}
