//! Scene driver contracts.
//!
//! The generator consumes the scene through narrow interfaces only:
//! - [`SceneManager`]: light and fog queries plus listener registration
//! - [`RenderObjectListener`] / [`VisibilityListener`]: per-frame callbacks
//! - [`Renderable`], [`Light`], [`Viewport`]: per-draw inputs

pub mod light;
pub mod manager;

pub use light::{FogMode, Light, LightKind, LightType, PointLight, SpotLight, count_lights};
pub use manager::{RenderObjectListener, Renderable, SceneManager, Viewport, VisibilityListener};
