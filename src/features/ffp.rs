//! Fixed-function pipeline stages expressed as sub-render-states.
//!
//! One state per classic stage. Each adapts itself to the source pass in
//! `pre_add_to_render_state` and refuses to be added when the pass does not
//! use the stage (an unlit pass gets no lighting, and so on).

use glam::{IVec3, Vec3};

use crate::errors::Result;
use crate::impl_sub_render_state_boilerplate;
use crate::material::{CompareFunction, TrackVertexColour};
use crate::program::{ParamValue, ProgramSet, UniformType};
use crate::render_state::{
    LinkContext, ParameterUpdate, SubRenderState, SubRenderStateFactory, execution_order,
};
use crate::scene::{FogMode, LightType};
use crate::script::{PropertyNode, ScriptContext};

// ============================================================================
// Transform
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct FfpTransform;

impl FfpTransform {
    pub const TYPE: &'static str = "FFP_Transform";
}

impl SubRenderState for FfpTransform {
    fn type_name(&self) -> &'static str {
        Self::TYPE
    }

    fn execution_order(&self) -> i32 {
        execution_order::TRANSFORM
    }

    fn create_cpu_sub_programs(&self, programs: &mut ProgramSet) -> bool {
        let vs = &mut programs.vertex;
        vs.add_dependency("FFPLib_Transform");
        vs.add_uniform("worldViewProj", UniformType::Mat4);
        vs.add_invocation(
            execution_order::TRANSFORM,
            "FFP_Transform",
            &["worldViewProj", "iPos", "oPos"],
        );
        true
    }

    fn update_gpu_params(&self, update: &mut ParameterUpdate<'_>) {
        update.params.set(
            "worldMatrix",
            ParamValue::Mat4(update.renderable.world_transform()),
        );
    }

    impl_sub_render_state_boilerplate!();
}

pub struct FfpTransformFactory;

impl SubRenderStateFactory for FfpTransformFactory {
    fn type_name(&self) -> &'static str {
        FfpTransform::TYPE
    }

    fn create_instance(&self) -> Box<dyn SubRenderState> {
        Box::new(FfpTransform)
    }

    fn create_from_property(
        &self,
        property: &PropertyNode,
        _ctx: &ScriptContext<'_>,
    ) -> Result<Option<Box<dyn SubRenderState>>> {
        if property.name == "transform_stage" && property.value(0) == Some("ffp") {
            return Ok(Some(self.create_instance()));
        }
        Ok(None)
    }
}

// ============================================================================
// Colour
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct FfpColour {
    pub tracking: TrackVertexColour,
}

impl FfpColour {
    pub const TYPE: &'static str = "FFP_Colour";
}

impl SubRenderState for FfpColour {
    fn type_name(&self) -> &'static str {
        Self::TYPE
    }

    fn execution_order(&self) -> i32 {
        execution_order::COLOUR
    }

    fn pre_add_to_render_state(&mut self, ctx: &LinkContext<'_>) -> bool {
        self.tracking = ctx.src_pass.vertex_colour_tracking;
        true
    }

    fn create_cpu_sub_programs(&self, programs: &mut ProgramSet) -> bool {
        let source = if self.tracking.contains(TrackVertexColour::DIFFUSE) {
            "iColour"
        } else {
            "1.0"
        };
        programs.vertex.add_dependency("FFPLib_Common");
        programs.vertex.add_invocation(
            execution_order::COLOUR,
            "FFP_Assign",
            &[source, "oColour"],
        );
        programs.fragment.add_dependency("FFPLib_Common");
        programs.fragment.add_invocation(
            execution_order::COLOUR,
            "FFP_Assign",
            &["iColour", "oColour"],
        );
        true
    }

    impl_sub_render_state_boilerplate!();
}

pub struct FfpColourFactory;

impl SubRenderStateFactory for FfpColourFactory {
    fn type_name(&self) -> &'static str {
        FfpColour::TYPE
    }

    fn create_instance(&self) -> Box<dyn SubRenderState> {
        Box::new(FfpColour::default())
    }
}

// ============================================================================
// Lighting
// ============================================================================

/// Per-vertex Gouraud lighting, unrolled for a fixed light count.
#[derive(Debug, Clone, Default)]
pub struct FfpLighting {
    pub light_count: IVec3,
    pub tracking: TrackVertexColour,
    pub specular: bool,
}

impl FfpLighting {
    pub const TYPE: &'static str = "FFP_Lighting";
}

/// Light slots in emission order: all point lights, then directional, then spot.
pub(crate) fn light_slots(light_count: IVec3) -> impl Iterator<Item = (usize, LightType)> {
    let point = std::iter::repeat_n(LightType::Point, light_count.x.max(0) as usize);
    let directional =
        std::iter::repeat_n(LightType::Directional, light_count.y.max(0) as usize);
    let spot = std::iter::repeat_n(LightType::Spotlight, light_count.z.max(0) as usize);
    point.chain(directional).chain(spot).enumerate()
}

pub(crate) fn light_count_defines(programs: &mut ProgramSet, light_count: IVec3) {
    for program in [&mut programs.vertex, &mut programs.fragment] {
        program
            .defines
            .set("LIGHT_COUNT_POINT", &light_count.x.to_string());
        program
            .defines
            .set("LIGHT_COUNT_DIRECTIONAL", &light_count.y.to_string());
        program
            .defines
            .set("LIGHT_COUNT_SPOT", &light_count.z.to_string());
    }
}

pub(crate) fn light_type_suffix(light: LightType) -> &'static str {
    match light {
        LightType::Point => "Point",
        LightType::Directional => "Directional",
        LightType::Spotlight => "Spot",
    }
}

/// Writes surface and per-light parameters shared by the lighting states.
pub(crate) fn write_light_params(update: &mut ParameterUpdate<'_>, light_count: IVec3) {
    let total = (light_count.x + light_count.y + light_count.z).max(0) as usize;
    let pass = update.pass;
    update.params.set("surfaceAmbient", ParamValue::Vec4(pass.ambient));
    update.params.set("surfaceDiffuse", ParamValue::Vec4(pass.diffuse));
    update.params.set("surfaceSpecular", ParamValue::Vec4(pass.specular));
    update.params.set("surfaceEmissive", ParamValue::Vec4(pass.emissive));
    update.params.set("surfaceShininess", ParamValue::Float(pass.shininess));

    for (index, light) in update.lights.iter().take(total).enumerate() {
        let position = match light.light_type() {
            LightType::Directional => (-light.direction).extend(0.0),
            _ => light.position.extend(1.0),
        };
        update
            .params
            .set(&format!("lightPosition{index}"), ParamValue::Vec4(position));
        update
            .params
            .set(&format!("lightDiffuse{index}"), ParamValue::Vec4(light.diffuse()));
        update.params.set(
            &format!("lightAttenuation{index}"),
            ParamValue::Vec4(light.attenuation()),
        );
    }
}

impl SubRenderState for FfpLighting {
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
        self.tracking = ctx.src_pass.vertex_colour_tracking;
        self.specular = ctx.src_pass.shininess > 0.0
            && ctx.src_pass.specular.truncate() != Vec3::ZERO;
        true
    }

    fn create_cpu_sub_programs(&self, programs: &mut ProgramSet) -> bool {
        light_count_defines(programs, self.light_count);

        let vs = &mut programs.vertex;
        vs.add_dependency("FFPLib_Lighting");
        vs.add_uniform("surfaceAmbient", UniformType::Vec4);
        vs.add_uniform("surfaceDiffuse", UniformType::Vec4);
        vs.add_uniform("surfaceEmissive", UniformType::Vec4);
        if self.specular {
            vs.add_uniform("surfaceSpecular", UniformType::Vec4);
            vs.add_uniform("surfaceShininess", UniformType::Float);
        }
        vs.add_invocation(
            execution_order::LIGHTING,
            "FFP_Light_Ambient",
            &["surfaceAmbient", "surfaceEmissive", "oColour"],
        );

        for (index, light) in light_slots(self.light_count) {
            let position = format!("lightPosition{index}");
            let diffuse = format!("lightDiffuse{index}");
            let attenuation = format!("lightAttenuation{index}");
            vs.add_uniform(&position, UniformType::Vec4);
            vs.add_uniform(&diffuse, UniformType::Vec4);
            vs.add_uniform(&attenuation, UniformType::Vec4);

            let function = if self.specular {
                format!("FFP_Light_{}_DiffuseSpecular", light_type_suffix(light))
            } else {
                format!("FFP_Light_{}_Diffuse", light_type_suffix(light))
            };
            vs.add_invocation(
                execution_order::LIGHTING + 1,
                &function,
                &[position.as_str(), diffuse.as_str(), attenuation.as_str(), "oColour"],
            );
        }
        true
    }

    fn update_gpu_params(&self, update: &mut ParameterUpdate<'_>) {
        write_light_params(update, self.light_count);
    }

    impl_sub_render_state_boilerplate!();
}

pub struct FfpLightingFactory;

impl SubRenderStateFactory for FfpLightingFactory {
    fn type_name(&self) -> &'static str {
        FfpLighting::TYPE
    }

    fn create_instance(&self) -> Box<dyn SubRenderState> {
        Box::new(FfpLighting::default())
    }

    fn create_from_property(
        &self,
        property: &PropertyNode,
        _ctx: &ScriptContext<'_>,
    ) -> Result<Option<Box<dyn SubRenderState>>> {
        if property.name == "lighting_stage" && property.value(0) == Some("ffp") {
            return Ok(Some(self.create_instance()));
        }
        Ok(None)
    }
}

// ============================================================================
// Texturing
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct FfpTexturing {
    /// Texture coordinate set of each texture unit.
    pub tex_coord_sets: Vec<u32>,
}

impl FfpTexturing {
    pub const TYPE: &'static str = "FFP_Texturing";
}

impl SubRenderState for FfpTexturing {
    fn type_name(&self) -> &'static str {
        Self::TYPE
    }

    fn execution_order(&self) -> i32 {
        execution_order::TEXTURING
    }

    fn pre_add_to_render_state(&mut self, ctx: &LinkContext<'_>) -> bool {
        self.tex_coord_sets = ctx
            .src_pass
            .texture_units
            .iter()
            .map(|unit| unit.tex_coord_set)
            .collect();
        !self.tex_coord_sets.is_empty()
    }

    fn create_cpu_sub_programs(&self, programs: &mut ProgramSet) -> bool {
        programs.fragment.add_dependency("FFPLib_Texturing");
        for (unit, set) in self.tex_coord_sets.iter().enumerate() {
            let sampler = format!("gTextureSampler{unit}");
            let coord = format!("iTexcoord{set}");
            let texel = format!("texel{unit}");
            programs.vertex.add_invocation(
                execution_order::TEXTURING,
                "FFP_TransformTexCoord",
                &[coord.as_str(), coord.as_str()],
            );
            programs.fragment.add_uniform(&sampler, UniformType::Sampler2D);
            programs.fragment.add_invocation(
                execution_order::TEXTURING,
                "FFP_SampleTexture",
                &[sampler.as_str(), coord.as_str(), texel.as_str()],
            );
            programs.fragment.add_invocation(
                execution_order::TEXTURING + 1,
                "FFP_Modulate",
                &[texel.as_str(), "oColour"],
            );
        }
        true
    }

    impl_sub_render_state_boilerplate!();
}

pub struct FfpTexturingFactory;

impl SubRenderStateFactory for FfpTexturingFactory {
    fn type_name(&self) -> &'static str {
        FfpTexturing::TYPE
    }

    fn create_instance(&self) -> Box<dyn SubRenderState> {
        Box::new(FfpTexturing::default())
    }
}

// ============================================================================
// Fog
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct FfpFog {
    /// Evaluate the fog factor in the fragment program instead of per vertex.
    pub per_pixel: bool,
    pub mode: FogMode,
}

impl FfpFog {
    pub const TYPE: &'static str = "FFP_Fog";

    #[must_use]
    pub fn per_vertex() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn per_pixel() -> Self {
        Self {
            per_pixel: true,
            ..Self::default()
        }
    }

    fn function_suffix(&self) -> &'static str {
        match self.mode {
            FogMode::None => "None",
            FogMode::Exp => "Exp",
            FogMode::Exp2 => "Exp2",
            FogMode::Linear => "Linear",
        }
    }
}

impl SubRenderState for FfpFog {
    fn type_name(&self) -> &'static str {
        Self::TYPE
    }

    fn execution_order(&self) -> i32 {
        execution_order::FOG
    }

    fn pre_add_to_render_state(&mut self, ctx: &LinkContext<'_>) -> bool {
        self.mode = ctx.src_pass.effective_fog(ctx.fog_mode);
        self.mode != FogMode::None
    }

    fn create_cpu_sub_programs(&self, programs: &mut ProgramSet) -> bool {
        if self.mode == FogMode::None {
            return false;
        }
        let suffix = self.function_suffix();
        if self.per_pixel {
            let fs = &mut programs.fragment;
            fs.add_dependency("FFPLib_Fog");
            fs.add_uniform("fogParams", UniformType::Vec4);
            fs.add_uniform("fogColour", UniformType::Vec4);
            fs.add_invocation(
                execution_order::FOG,
                &format!("FFP_PixelFog_{suffix}"),
                &["iDepth", "fogParams", "fogColour", "oColour"],
            );
        } else {
            let vs = &mut programs.vertex;
            vs.add_dependency("FFPLib_Fog");
            vs.add_uniform("fogParams", UniformType::Vec4);
            vs.add_invocation(
                execution_order::FOG,
                &format!("FFP_VertexFog_{suffix}"),
                &["oPos", "fogParams", "oFogFactor"],
            );
            let fs = &mut programs.fragment;
            fs.add_dependency("FFPLib_Fog");
            fs.add_uniform("fogColour", UniformType::Vec4);
            fs.add_invocation(
                execution_order::FOG,
                "FFP_ApplyFog",
                &["iFogFactor", "fogColour", "oColour"],
            );
        }
        true
    }

    impl_sub_render_state_boilerplate!();
}

pub struct FfpFogFactory;

impl SubRenderStateFactory for FfpFogFactory {
    fn type_name(&self) -> &'static str {
        FfpFog::TYPE
    }

    fn create_instance(&self) -> Box<dyn SubRenderState> {
        Box::new(FfpFog::default())
    }

    fn create_from_property(
        &self,
        property: &PropertyNode,
        _ctx: &ScriptContext<'_>,
    ) -> Result<Option<Box<dyn SubRenderState>>> {
        if property.name != "fog_stage" || property.value(0) != Some("ffp") {
            return Ok(None);
        }
        let fog = match property.value(1) {
            None | Some("per_vertex") => FfpFog::per_vertex(),
            Some("per_pixel") => FfpFog::per_pixel(),
            Some(other) => {
                return Err(property.invalid(format!("unknown fog calculation mode '{other}'")));
            }
        };
        Ok(Some(Box::new(fog)))
    }
}

// ============================================================================
// Alpha test
// ============================================================================

#[derive(Debug, Clone)]
pub struct FfpAlphaTest {
    pub function: CompareFunction,
    pub reference: u8,
}

impl Default for FfpAlphaTest {
    fn default() -> Self {
        Self {
            function: CompareFunction::AlwaysPass,
            reference: 0,
        }
    }
}

impl FfpAlphaTest {
    pub const TYPE: &'static str = "FFP_AlphaTest";
}

impl SubRenderState for FfpAlphaTest {
    fn type_name(&self) -> &'static str {
        Self::TYPE
    }

    fn execution_order(&self) -> i32 {
        execution_order::ALPHA_TEST
    }

    fn pre_add_to_render_state(&mut self, ctx: &LinkContext<'_>) -> bool {
        match ctx.src_pass.alpha_rejection {
            Some(rejection) if rejection.function != CompareFunction::AlwaysPass => {
                self.function = rejection.function;
                self.reference = rejection.value;
                true
            }
            _ => false,
        }
    }

    fn create_cpu_sub_programs(&self, programs: &mut ProgramSet) -> bool {
        let fs = &mut programs.fragment;
        fs.add_dependency("FFPLib_AlphaTest");
        fs.add_uniform("alphaReference", UniformType::Float);
        fs.add_invocation(
            execution_order::ALPHA_TEST,
            "FFP_AlphaTest",
            &[self.function.as_str(), "alphaReference", "oColour"],
        );
        true
    }

    fn update_gpu_params(&self, update: &mut ParameterUpdate<'_>) {
        update.params.set(
            "alphaReference",
            ParamValue::Float(f32::from(self.reference) / 255.0),
        );
    }

    impl_sub_render_state_boilerplate!();
}

pub struct FfpAlphaTestFactory;

impl SubRenderStateFactory for FfpAlphaTestFactory {
    fn type_name(&self) -> &'static str {
        FfpAlphaTest::TYPE
    }

    fn create_instance(&self) -> Box<dyn SubRenderState> {
        Box::new(FfpAlphaTest::default())
    }
}
