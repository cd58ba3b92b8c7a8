use glam::Vec4;

use super::ids::{PassId, TechniqueId};
use super::pass::Pass;

/// Stage of a multi-pass illumination decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IlluminationStage {
    /// Ambient and emissive contribution, rendered once.
    Ambient,
    /// Diffuse and specular contribution, rendered once per light.
    PerLight,
    /// Texture modulation applied on top of the lit result.
    Decal,
}

impl IlluminationStage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            IlluminationStage::Ambient => "ambient",
            IlluminationStage::PerLight => "per_light",
            IlluminationStage::Decal => "decal",
        }
    }
}

/// One entry of a compiled illumination sequence.
///
/// `pass` is `Some` when the entry was generated from `original_pass`;
/// `None` means the original pass is rendered as is for this stage.
#[derive(Debug)]
pub struct IlluminationPass {
    pub stage: IlluminationStage,
    pub original_pass: PassId,
    pub pass: Option<Pass>,
}

impl IlluminationPass {
    #[inline]
    #[must_use]
    pub fn is_generated(&self) -> bool {
        self.pass.is_some()
    }
}

#[derive(Debug)]
pub struct Technique {
    id: TechniqueId,
    pub scheme_name: String,
    passes: Vec<Pass>,
    illumination_passes: Vec<IlluminationPass>,
}

impl Technique {
    #[must_use]
    pub fn new(scheme_name: impl Into<String>) -> Self {
        Self {
            id: TechniqueId::next(),
            scheme_name: scheme_name.into(),
            passes: Vec::new(),
            illumination_passes: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> TechniqueId {
        self.id
    }

    /// Clones passes and scheme into a new technique with fresh identities.
    ///
    /// Compiled illumination passes are not carried over; they belong to a
    /// concrete technique and are recompiled on demand.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        Self {
            id: TechniqueId::next(),
            scheme_name: self.scheme_name.clone(),
            passes: self.passes.iter().map(Pass::duplicate).collect(),
            illumination_passes: Vec::new(),
        }
    }

    pub fn add_pass(&mut self, pass: Pass) -> PassId {
        let id = pass.id();
        self.passes.push(pass);
        id
    }

    #[must_use]
    pub fn passes(&self) -> &[Pass] {
        &self.passes
    }

    #[must_use]
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    #[must_use]
    pub fn pass(&self, index: usize) -> Option<&Pass> {
        self.passes.get(index)
    }

    pub fn pass_mut(&mut self, index: usize) -> Option<&mut Pass> {
        self.passes.get_mut(index)
    }

    /// Index of the pass with `id` in the regular pass list.
    #[must_use]
    pub fn pass_index(&self, id: PassId) -> Option<usize> {
        self.passes.iter().position(|p| p.id() == id)
    }

    /// Looks up a pass among regular and generated illumination passes.
    #[must_use]
    pub fn find_pass(&self, id: PassId) -> Option<&Pass> {
        self.passes.iter().find(|p| p.id() == id).or_else(|| {
            self.illumination_passes
                .iter()
                .filter_map(|ip| ip.pass.as_ref())
                .find(|p| p.id() == id)
        })
    }

    pub fn find_pass_mut(&mut self, id: PassId) -> Option<&mut Pass> {
        if let Some(index) = self.pass_index(id) {
            return self.passes.get_mut(index);
        }
        self.illumination_passes
            .iter_mut()
            .filter_map(|ip| ip.pass.as_mut())
            .find(|p| p.id() == id)
    }

    /// `true` when at least one pass is not programmable.
    #[must_use]
    pub fn has_fixed_function_pass(&self) -> bool {
        self.passes.iter().any(|p| !p.is_programmable())
    }

    #[must_use]
    pub fn illumination_passes(&self) -> &[IlluminationPass] {
        &self.illumination_passes
    }

    /// Splits every pass into its illumination stages.
    ///
    /// Lit passes yield generated Ambient and PerLight passes, plus a Decal
    /// pass when they sample textures. Unlit passes are rendered as is in
    /// the Decal stage. Any previously compiled sequence is replaced.
    pub fn compile_illumination_passes(&mut self) {
        self.clear_illumination_passes();

        let mut compiled = Vec::with_capacity(self.passes.len() * 3);
        for pass in &self.passes {
            if !pass.lighting_enabled {
                compiled.push(IlluminationPass {
                    stage: IlluminationStage::Decal,
                    original_pass: pass.id(),
                    pass: None,
                });
                continue;
            }

            let mut ambient = pass.duplicate();
            ambient.texture_units.clear();
            ambient.diffuse = Vec4::new(0.0, 0.0, 0.0, pass.diffuse.w);
            ambient.specular = Vec4::new(0.0, 0.0, 0.0, pass.specular.w);
            ambient.iterate_per_light = false;
            compiled.push(IlluminationPass {
                stage: IlluminationStage::Ambient,
                original_pass: pass.id(),
                pass: Some(ambient),
            });

            let mut per_light = pass.duplicate();
            per_light.texture_units.clear();
            per_light.ambient = Vec4::new(0.0, 0.0, 0.0, pass.ambient.w);
            per_light.emissive = Vec4::new(0.0, 0.0, 0.0, pass.emissive.w);
            per_light.iterate_per_light = true;
            compiled.push(IlluminationPass {
                stage: IlluminationStage::PerLight,
                original_pass: pass.id(),
                pass: Some(per_light),
            });

            if !pass.texture_units.is_empty() {
                let mut decal = pass.duplicate();
                decal.lighting_enabled = false;
                decal.iterate_per_light = false;
                compiled.push(IlluminationPass {
                    stage: IlluminationStage::Decal,
                    original_pass: pass.id(),
                    pass: Some(decal),
                });
            }
        }
        self.illumination_passes = compiled;
    }

    pub fn clear_illumination_passes(&mut self) {
        self.illumination_passes.clear();
    }
}
