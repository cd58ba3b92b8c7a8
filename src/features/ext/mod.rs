//! Extension sub-render-states beyond the fixed-function stages.

pub mod layered_blending;
pub mod normal_map;
pub mod per_pixel;
pub mod skinning;

pub use layered_blending::{BlendMode, LayeredBlending, LayeredBlendingFactory};
pub use normal_map::{NormalMapLighting, NormalMapLightingFactory, NormalMapSpace};
pub use per_pixel::{PerPixelLighting, PerPixelLightingFactory};
pub use skinning::{HardwareSkinning, HardwareSkinningFactory, SkinningType};
