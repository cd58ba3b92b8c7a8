//! Built-in shader feature modules.
//!
//! - [`ffp`]: the fixed-function stages
//! - [`ext`]: per-pixel and normal-map lighting, layered blending, skinning
//! - [`FixedFunctionBuilder`]: derives the fixed-function stages of a pass

pub mod builder;
pub mod ext;
pub mod ffp;

use std::sync::Arc;

pub use builder::FixedFunctionBuilder;

use crate::errors::Result;
use crate::render_state::{FactoryRegistry, SubRenderStateFactory};

/// Built-in factories in registration order.
///
/// This order is also the order in which declarative properties are offered
/// to factories; extension factories added later are tried after these.
#[must_use]
pub fn builtin_factories() -> Vec<Arc<dyn SubRenderStateFactory>> {
    vec![
        Arc::new(ffp::FfpTransformFactory),
        Arc::new(ffp::FfpColourFactory),
        Arc::new(ffp::FfpLightingFactory),
        Arc::new(ffp::FfpTexturingFactory),
        Arc::new(ffp::FfpFogFactory),
        Arc::new(ffp::FfpAlphaTestFactory),
        Arc::new(ext::PerPixelLightingFactory),
        Arc::new(ext::NormalMapLightingFactory),
        Arc::new(ext::LayeredBlendingFactory),
        Arc::new(ext::HardwareSkinningFactory),
    ]
}

pub fn register_builtin_factories(registry: &mut FactoryRegistry) -> Result<()> {
    for factory in builtin_factories() {
        registry.add(factory)?;
    }
    Ok(())
}
