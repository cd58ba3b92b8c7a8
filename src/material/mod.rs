//! Host material model.
//!
//! A [`Material`] owns an ordered list of [`Technique`]s, each owning its
//! [`Pass`]es. The generator clones source techniques into destination
//! techniques inside the same material and tracks them by id.

pub mod ids;
pub mod library;
pub mod pass;
pub mod technique;

pub use ids::{PassId, TechniqueId};
pub use library::{
    AUTODETECT_GROUP, DEFAULT_GROUP, INTERNAL_GROUP, MaterialHandle, MaterialLibrary,
    MaterialStore, ResourceKind, ResourceListener,
};
pub use pass::{AlphaRejection, CompareFunction, Pass, TextureUnit, TrackVertexColour};
pub use technique::{IlluminationPass, IlluminationStage, Technique};

#[derive(Debug)]
pub struct Material {
    name: String,
    group: String,
    techniques: Vec<Technique>,
    load_generation: u64,
}

impl Material {
    #[must_use]
    pub fn new(name: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: group.into(),
            techniques: Vec::new(),
            load_generation: 0,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Copies every technique (generated ones included) under a new identity.
    #[must_use]
    pub fn duplicate(&self, name: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: group.into(),
            techniques: self.techniques.iter().map(Technique::duplicate).collect(),
            load_generation: 0,
        }
    }

    pub fn add_technique(&mut self, technique: Technique) -> TechniqueId {
        let id = technique.id();
        self.techniques.push(technique);
        id
    }

    #[must_use]
    pub fn techniques(&self) -> &[Technique] {
        &self.techniques
    }

    #[must_use]
    pub fn technique_count(&self) -> usize {
        self.techniques.len()
    }

    #[must_use]
    pub fn technique(&self, index: usize) -> Option<&Technique> {
        self.techniques.get(index)
    }

    pub fn technique_mut(&mut self, index: usize) -> Option<&mut Technique> {
        self.techniques.get_mut(index)
    }

    #[must_use]
    pub fn technique_by_id(&self, id: TechniqueId) -> Option<&Technique> {
        self.techniques.iter().find(|t| t.id() == id)
    }

    pub fn technique_by_id_mut(&mut self, id: TechniqueId) -> Option<&mut Technique> {
        self.techniques.iter_mut().find(|t| t.id() == id)
    }

    pub fn remove_technique(&mut self, id: TechniqueId) -> Option<Technique> {
        let index = self.techniques.iter().position(|t| t.id() == id)?;
        Some(self.techniques.remove(index))
    }

    /// Locates a pass (illumination passes included) in any technique.
    #[must_use]
    pub fn find_pass(&self, id: PassId) -> Option<(&Technique, &Pass)> {
        self.techniques
            .iter()
            .find_map(|t| t.find_pass(id).map(|p| (t, p)))
    }

    pub fn find_pass_mut(&mut self, id: PassId) -> Option<&mut Pass> {
        self.techniques.iter_mut().find_map(|t| t.find_pass_mut(id))
    }

    /// Marks the material as reloaded after a structural change.
    pub fn touch(&mut self) {
        self.load_generation += 1;
    }

    /// Number of times [`touch`](Self::touch) was called.
    #[must_use]
    pub fn load_generation(&self) -> u64 {
        self.load_generation
    }
}
