use std::sync::Arc;

use glam::Mat4;

use super::light::{FogMode, Light, LightType};
use crate::material::PassId;

/// A draw target that asks for one material scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewport {
    pub material_scheme: String,
}

impl Viewport {
    #[must_use]
    pub fn new(material_scheme: impl Into<String>) -> Self {
        Self {
            material_scheme: material_scheme.into(),
        }
    }
}

/// Object about to be drawn with a generated pass.
pub trait Renderable {
    fn world_transform(&self) -> Mat4;

    /// Number of bones influencing this object, `0` for rigid geometry.
    fn bone_count(&self) -> usize {
        0
    }
}

impl Renderable for Mat4 {
    fn world_transform(&self) -> Mat4 {
        *self
    }
}

/// Called once per object per frame by the scene driver.
pub trait RenderObjectListener: Send + Sync {
    fn notify_render_single_object(
        &self,
        renderable: &dyn Renderable,
        pass: PassId,
        lights: &[Light],
        suppress_render_state_changes: bool,
    );
}

/// Called once per viewport per frame before visibility is resolved.
pub trait VisibilityListener: Send + Sync {
    fn pre_find_visible_objects(&self, scene: &Arc<dyn SceneManager>, viewport: &Viewport);
}

/// The scene driver contract consumed by the generator.
///
/// The generator never renders; it only queries light and fog state and
/// registers its listeners. The attach/detach hooks default to no-ops for
/// hosts that dispatch callbacks themselves.
pub trait SceneManager: Send + Sync {
    fn name(&self) -> &str;

    /// Types of the lights currently affecting the camera frustum.
    fn lights_affecting_frustum(&self) -> Vec<LightType>;

    fn fog_mode(&self) -> FogMode;

    fn add_render_object_listener(&self, _listener: Arc<dyn RenderObjectListener>) {}

    fn remove_render_object_listener(&self, _listener: &Arc<dyn RenderObjectListener>) {}

    fn add_visibility_listener(&self, _listener: Arc<dyn VisibilityListener>) {}

    fn remove_visibility_listener(&self, _listener: &Arc<dyn VisibilityListener>) {}
}
