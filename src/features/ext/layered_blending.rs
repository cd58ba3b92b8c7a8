use std::str::FromStr;

use crate::errors::{Result, ShaderGenError};
use crate::impl_sub_render_state_boilerplate;
use crate::program::{ProgramSet, UniformType};
use crate::render_state::{
    LinkContext, SubRenderState, SubRenderStateFactory, execution_order,
};
use crate::script::{PropertyNode, ScriptContext, ScriptScope};

/// Photoshop-style layer blend applied between consecutive texture units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendMode {
    Normal,
    Lighten,
    Darken,
    Multiply,
    Average,
    Add,
    Subtract,
    Difference,
    Negation,
    Exclusion,
    Screen,
    Overlay,
    SoftLight,
    HardLight,
    ColorDodge,
    ColorBurn,
    LinearDodge,
    LinearBurn,
    LinearLight,
    VividLight,
    PinLight,
    HardMix,
    Reflect,
    Glow,
    Phoenix,
    Saturation,
    Color,
    Luminosity,
}

const BLEND_MODE_NAMES: [(&str, BlendMode); 29] = [
    ("default", BlendMode::Normal),
    ("normal", BlendMode::Normal),
    ("lighten", BlendMode::Lighten),
    ("darken", BlendMode::Darken),
    ("multiply", BlendMode::Multiply),
    ("average", BlendMode::Average),
    ("add", BlendMode::Add),
    ("subtract", BlendMode::Subtract),
    ("difference", BlendMode::Difference),
    ("negation", BlendMode::Negation),
    ("exclusion", BlendMode::Exclusion),
    ("screen", BlendMode::Screen),
    ("overlay", BlendMode::Overlay),
    ("soft_light", BlendMode::SoftLight),
    ("hard_light", BlendMode::HardLight),
    ("color_dodge", BlendMode::ColorDodge),
    ("color_burn", BlendMode::ColorBurn),
    ("linear_dodge", BlendMode::LinearDodge),
    ("linear_burn", BlendMode::LinearBurn),
    ("linear_light", BlendMode::LinearLight),
    ("vivid_light", BlendMode::VividLight),
    ("pin_light", BlendMode::PinLight),
    ("hard_mix", BlendMode::HardMix),
    ("reflect", BlendMode::Reflect),
    ("glow", BlendMode::Glow),
    ("phoenix", BlendMode::Phoenix),
    ("saturation", BlendMode::Saturation),
    ("color", BlendMode::Color),
    ("luminosity", BlendMode::Luminosity),
];

impl BlendMode {
    /// Name of the blend function in the shader library.
    #[must_use]
    pub fn function_name(self) -> &'static str {
        match self {
            BlendMode::Normal => "SGX_blend_normal",
            BlendMode::Lighten => "SGX_blend_lighten",
            BlendMode::Darken => "SGX_blend_darken",
            BlendMode::Multiply => "SGX_blend_multiply",
            BlendMode::Average => "SGX_blend_average",
            BlendMode::Add => "SGX_blend_add",
            BlendMode::Subtract => "SGX_blend_subtract",
            BlendMode::Difference => "SGX_blend_difference",
            BlendMode::Negation => "SGX_blend_negation",
            BlendMode::Exclusion => "SGX_blend_exclusion",
            BlendMode::Screen => "SGX_blend_screen",
            BlendMode::Overlay => "SGX_blend_overlay",
            BlendMode::SoftLight => "SGX_blend_softLight",
            BlendMode::HardLight => "SGX_blend_hardLight",
            BlendMode::ColorDodge => "SGX_blend_colorDodge",
            BlendMode::ColorBurn => "SGX_blend_colorBurn",
            BlendMode::LinearDodge => "SGX_blend_linearDodge",
            BlendMode::LinearBurn => "SGX_blend_linearBurn",
            BlendMode::LinearLight => "SGX_blend_linearLight",
            BlendMode::VividLight => "SGX_blend_vividLight",
            BlendMode::PinLight => "SGX_blend_pinLight",
            BlendMode::HardMix => "SGX_blend_hardMix",
            BlendMode::Reflect => "SGX_blend_reflect",
            BlendMode::Glow => "SGX_blend_glow",
            BlendMode::Phoenix => "SGX_blend_phoenix",
            BlendMode::Saturation => "SGX_blend_saturation",
            BlendMode::Color => "SGX_blend_color",
            BlendMode::Luminosity => "SGX_blend_luminosity",
        }
    }
}

impl FromStr for BlendMode {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        BLEND_MODE_NAMES
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, mode)| *mode)
            .ok_or(())
    }
}

/// Texturing with a per-unit blend mode. Replaces fixed-function texturing.
#[derive(Debug, Clone, Default)]
pub struct LayeredBlending {
    /// Blend mode per texture unit; `None` keeps plain modulation.
    pub blend_modes: Vec<Option<BlendMode>>,
    pub tex_coord_sets: Vec<u32>,
}

impl LayeredBlending {
    pub const TYPE: &'static str = "SGX_LayeredBlending";

    pub fn set_blend_mode(&mut self, texture_unit: usize, mode: BlendMode) {
        if self.blend_modes.len() <= texture_unit {
            self.blend_modes.resize(texture_unit + 1, None);
        }
        self.blend_modes[texture_unit] = Some(mode);
    }

    #[must_use]
    pub fn blend_mode(&self, texture_unit: usize) -> Option<BlendMode> {
        self.blend_modes.get(texture_unit).copied().flatten()
    }
}

impl SubRenderState for LayeredBlending {
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
        let fs = &mut programs.fragment;
        fs.add_dependency("FFPLib_Texturing");
        fs.add_dependency("SGXLib_LayeredBlending");
        for (unit, set) in self.tex_coord_sets.iter().enumerate() {
            let sampler = format!("gTextureSampler{unit}");
            let coord = format!("iTexcoord{set}");
            let texel = format!("texel{unit}");
            fs.add_uniform(&sampler, UniformType::Sampler2D);
            fs.add_invocation(
                execution_order::TEXTURING,
                "FFP_SampleTexture",
                &[sampler.as_str(), coord.as_str(), texel.as_str()],
            );
            let function = self
                .blend_mode(unit)
                .map_or("FFP_Modulate", BlendMode::function_name);
            fs.add_invocation(
                execution_order::TEXTURING + 1,
                function,
                &[texel.as_str(), "oColour", "oColour"],
            );
        }
        true
    }

    impl_sub_render_state_boilerplate!();
}

pub struct LayeredBlendingFactory;

impl SubRenderStateFactory for LayeredBlendingFactory {
    fn type_name(&self) -> &'static str {
        LayeredBlending::TYPE
    }

    fn create_instance(&self) -> Box<dyn SubRenderState> {
        Box::new(LayeredBlending::default())
    }

    /// `layered_blend <mode>` inside a texture unit. Blend modes accumulate on
    /// the pass's existing layered-blending template.
    fn create_from_property(
        &self,
        property: &PropertyNode,
        ctx: &ScriptContext<'_>,
    ) -> Result<Option<Box<dyn SubRenderState>>> {
        if property.name != "layered_blend" {
            return Ok(None);
        }
        let ScriptScope::TextureUnit { texture_unit, .. } = ctx.scope else {
            return Err(property.invalid("only valid inside a texture unit"));
        };
        let Some(name) = property.value(0) else {
            return Err(property.invalid("missing blend mode"));
        };
        let mode = name.parse::<BlendMode>().map_err(|()| ShaderGenError::InvalidProperty {
            property: property.name.clone(),
            reason: format!("unknown blend mode '{name}'"),
        })?;

        let mut blending = ctx
            .render_state
            .template(LayeredBlending::TYPE)
            .and_then(|t| t.downcast_ref::<LayeredBlending>())
            .cloned()
            .unwrap_or_default();
        blending.set_blend_mode(texture_unit, mode);
        Ok(Some(Box::new(blending)))
    }
}
