use std::sync::{Arc, Weak};

use super::ShaderGenerator;
use crate::material::{PassId, ResourceKind, ResourceListener};
use crate::scene::{
    Light, RenderObjectListener, Renderable, SceneManager, Viewport, VisibilityListener,
};

/// Routes scene and resource callbacks to the generator.
///
/// Holds only a weak reference, so registering it with scene managers and
/// the material store does not keep the generator alive.
pub(crate) struct GeneratorListener {
    pub(crate) generator: Weak<ShaderGenerator>,
}

impl GeneratorListener {
    pub(crate) fn new(generator: Weak<ShaderGenerator>) -> Self {
        Self { generator }
    }
}

impl RenderObjectListener for GeneratorListener {
    fn notify_render_single_object(
        &self,
        renderable: &dyn Renderable,
        pass: PassId,
        lights: &[Light],
        suppress_render_state_changes: bool,
    ) {
        if let Some(generator) = self.generator.upgrade() {
            generator.notify_render_single_object(
                renderable,
                pass,
                lights,
                suppress_render_state_changes,
            );
        }
    }
}

impl VisibilityListener for GeneratorListener {
    fn pre_find_visible_objects(&self, scene: &Arc<dyn SceneManager>, viewport: &Viewport) {
        if let Some(generator) = self.generator.upgrade() {
            generator.pre_find_visible_objects(scene, viewport);
        }
    }
}

impl ResourceListener for GeneratorListener {
    fn resource_removed(&self, kind: ResourceKind, name: &str, group: &str) {
        if kind != ResourceKind::Material {
            return;
        }
        if let Some(generator) = self.generator.upgrade() {
            generator.remove_all_shader_based_techniques_for(name, group);
        }
    }
}
