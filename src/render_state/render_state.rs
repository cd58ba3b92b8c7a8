use glam::IVec3;

use super::registry::FactoryRegistry;
use super::sub_render_state::SubRenderState;
use crate::errors::Result;

/// Ordered set of sub-render-state templates, at most one per type.
///
/// Used at scheme scope (applied to every generated pass of the scheme) and
/// at pass scope (custom state authored for one pass of one technique).
#[derive(Debug)]
pub struct RenderState {
    templates: Vec<Box<dyn SubRenderState>>,
    light_count: IVec3,
    light_count_auto_update: bool,
}

impl Default for RenderState {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            templates: Vec::new(),
            light_count: IVec3::ZERO,
            light_count_auto_update: true,
        }
    }

    /// Adds a template, replacing any template of the same type.
    ///
    /// Returns the replaced template so the caller can hand it back to its
    /// factory.
    pub fn add_template(
        &mut self,
        template: Box<dyn SubRenderState>,
    ) -> Option<Box<dyn SubRenderState>> {
        match self
            .templates
            .iter()
            .position(|t| t.type_name() == template.type_name())
        {
            Some(index) => Some(std::mem::replace(&mut self.templates[index], template)),
            None => {
                self.templates.push(template);
                None
            }
        }
    }

    pub fn remove_template(&mut self, type_name: &str) -> Option<Box<dyn SubRenderState>> {
        let index = self
            .templates
            .iter()
            .position(|t| t.type_name() == type_name)?;
        Some(self.templates.remove(index))
    }

    #[must_use]
    pub fn template(&self, type_name: &str) -> Option<&(dyn SubRenderState + 'static)> {
        self.templates
            .iter()
            .find(|t| t.type_name() == type_name)
            .map(|t| &**t)
    }

    pub fn template_mut(&mut self, type_name: &str) -> Option<&mut (dyn SubRenderState + 'static)> {
        self.templates
            .iter_mut()
            .find(|t| t.type_name() == type_name)
            .map(|t| &mut **t)
    }

    #[must_use]
    pub fn templates(&self) -> &[Box<dyn SubRenderState>] {
        &self.templates
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Removes every template, returning them to `registry`.
    pub fn reset(&mut self, registry: &FactoryRegistry) {
        for template in self.templates.drain(..) {
            registry.destroy(template);
        }
    }

    /// Fixes the light count and disables auto update.
    pub fn set_light_count(&mut self, count: IVec3) {
        self.light_count = count;
        self.light_count_auto_update = false;
    }

    /// Light count used when auto update is on; leaves the flag untouched.
    pub(crate) fn sync_light_count(&mut self, count: IVec3) {
        self.light_count = count;
    }

    #[must_use]
    pub fn light_count(&self) -> IVec3 {
        self.light_count
    }

    pub fn set_light_count_auto_update(&mut self, auto_update: bool) {
        self.light_count_auto_update = auto_update;
    }

    #[must_use]
    pub fn light_count_auto_update(&self) -> bool {
        self.light_count_auto_update
    }

    /// Replaces this state's templates with factory-made deep copies of
    /// `other`'s templates and copies its light-count settings.
    pub fn copy_from(&mut self, other: &RenderState, registry: &FactoryRegistry) -> Result<()> {
        let mut copies = Vec::with_capacity(other.templates.len());
        for template in &other.templates {
            copies.push(registry.duplicate(&**template)?);
        }
        self.reset(registry);
        self.templates = copies;
        self.light_count = other.light_count;
        self.light_count_auto_update = other.light_count_auto_update;
        Ok(())
    }
}
