use bitflags::bitflags;
use glam::Vec4;
use smallvec::SmallVec;

use super::ids::PassId;
use crate::scene::FogMode;

bitflags! {
    /// Material colour channels sourced from the vertex colour.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct TrackVertexColour: u32 {
        const AMBIENT  = 1 << 0;
        const DIFFUSE  = 1 << 1;
        const SPECULAR = 1 << 2;
        const EMISSIVE = 1 << 3;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareFunction {
    AlwaysFail,
    AlwaysPass,
    Less,
    LessEqual,
    Equal,
    NotEqual,
    GreaterEqual,
    Greater,
}

impl CompareFunction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CompareFunction::AlwaysFail => "always_fail",
            CompareFunction::AlwaysPass => "always_pass",
            CompareFunction::Less => "less",
            CompareFunction::LessEqual => "less_equal",
            CompareFunction::Equal => "equal",
            CompareFunction::NotEqual => "not_equal",
            CompareFunction::GreaterEqual => "greater_equal",
            CompareFunction::Greater => "greater",
        }
    }
}

/// Fixed-function alpha rejection: discard when `alpha <function> value` fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AlphaRejection {
    pub function: CompareFunction,
    pub value: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureUnit {
    pub name: String,
    pub texture: String,
    pub tex_coord_set: u32,
}

impl TextureUnit {
    #[must_use]
    pub fn new(texture: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            texture: texture.into(),
            tex_coord_set: 0,
        }
    }
}

/// One render pass of a technique.
///
/// A pass is *programmable* once it has a vertex or fragment program
/// assigned; otherwise it describes fixed-function state that the generator
/// translates into programs.
#[derive(Debug)]
pub struct Pass {
    id: PassId,
    pub name: String,

    // --- Lighting ---
    pub lighting_enabled: bool,
    pub vertex_colour_tracking: TrackVertexColour,
    pub ambient: Vec4,
    pub diffuse: Vec4,
    pub specular: Vec4,
    pub emissive: Vec4,
    pub shininess: f32,
    pub iterate_per_light: bool,

    // --- Fog & alpha ---
    /// Overrides the scene fog when set.
    pub fog_override: Option<FogMode>,
    pub alpha_rejection: Option<AlphaRejection>,

    pub texture_units: SmallVec<[TextureUnit; 4]>,

    vertex_program: Option<String>,
    fragment_program: Option<String>,
}

impl Pass {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: PassId::next(),
            name: name.into(),
            lighting_enabled: true,
            vertex_colour_tracking: TrackVertexColour::empty(),
            ambient: Vec4::ONE,
            diffuse: Vec4::ONE,
            specular: Vec4::new(0.0, 0.0, 0.0, 1.0),
            emissive: Vec4::new(0.0, 0.0, 0.0, 1.0),
            shininess: 0.0,
            iterate_per_light: false,
            fog_override: None,
            alpha_rejection: None,
            texture_units: SmallVec::new(),
            vertex_program: None,
            fragment_program: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> PassId {
        self.id
    }

    /// Copies all state into a new pass with a fresh identity.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        Self {
            id: PassId::next(),
            name: self.name.clone(),
            lighting_enabled: self.lighting_enabled,
            vertex_colour_tracking: self.vertex_colour_tracking,
            ambient: self.ambient,
            diffuse: self.diffuse,
            specular: self.specular,
            emissive: self.emissive,
            shininess: self.shininess,
            iterate_per_light: self.iterate_per_light,
            fog_override: self.fog_override,
            alpha_rejection: self.alpha_rejection,
            texture_units: self.texture_units.clone(),
            vertex_program: self.vertex_program.clone(),
            fragment_program: self.fragment_program.clone(),
        }
    }

    pub fn add_texture_unit(&mut self, unit: TextureUnit) -> usize {
        self.texture_units.push(unit);
        self.texture_units.len() - 1
    }

    #[must_use]
    pub fn is_programmable(&self) -> bool {
        self.vertex_program.is_some() || self.fragment_program.is_some()
    }

    #[must_use]
    pub fn vertex_program(&self) -> Option<&str> {
        self.vertex_program.as_deref()
    }

    #[must_use]
    pub fn fragment_program(&self) -> Option<&str> {
        self.fragment_program.as_deref()
    }

    pub fn set_vertex_program(&mut self, name: impl Into<String>) {
        self.vertex_program = Some(name.into());
    }

    pub fn set_fragment_program(&mut self, name: impl Into<String>) {
        self.fragment_program = Some(name.into());
    }

    pub fn clear_programs(&mut self) {
        self.vertex_program = None;
        self.fragment_program = None;
    }

    /// Fog mode this pass renders with, given the scene fog.
    #[must_use]
    pub fn effective_fog(&self, scene_fog: FogMode) -> FogMode {
        self.fog_override.unwrap_or(scene_fog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_gets_fresh_identity() {
        let mut pass = Pass::new("base");
        pass.add_texture_unit(TextureUnit::new("rock.png"));
        pass.set_vertex_program("custom_vs");

        let copy = pass.duplicate();
        assert_ne!(copy.id(), pass.id());
        assert_eq!(copy.texture_units, pass.texture_units);
        assert!(copy.is_programmable());
    }

    #[test]
    fn fog_override_wins_over_scene() {
        let mut pass = Pass::new("p");
        assert_eq!(pass.effective_fog(FogMode::Linear), FogMode::Linear);
        pass.fog_override = Some(FogMode::None);
        assert_eq!(pass.effective_fog(FogMode::Linear), FogMode::None);
    }
}
