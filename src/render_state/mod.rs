//! Render-state composition.
//!
//! - [`SubRenderState`] / [`SubRenderStateFactory`]: pluggable shader features
//! - [`FactoryRegistry`]: factories by type name, in registration order
//! - [`RenderState`]: template layer (scheme-global or pass-custom)
//! - [`TargetRenderState`]: resolved per-pass instances and their programs

pub mod registry;
#[allow(clippy::module_inception)]
pub mod render_state;
pub mod sub_render_state;
pub mod target;

pub use registry::FactoryRegistry;
pub use render_state::RenderState;
pub use sub_render_state::{
    LinkContext, ParameterUpdate, SubRenderState, SubRenderStateFactory, execution_order,
};
pub use target::{StateOrigin, TargetRenderState};
