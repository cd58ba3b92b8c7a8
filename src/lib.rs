#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

//! Run-time shader generation.
//!
//! Derives shader-based techniques from fixed-function material techniques:
//! each pass is resolved into an ordered set of sub-render-states, which
//! together emit a vertex and fragment program.
//!
//! - [`generator`]: the [`ShaderGenerator`] and its schemes
//! - [`render_state`]: sub-render-states, factories and render-state layers
//! - [`features`]: built-in fixed-function and extension sub-render-states
//! - [`program`]: program description, source rendering and caching
//! - [`material`] / [`scene`]: the host contracts the generator works on
//! - [`script`]: declarative `rtshader_system` configuration

pub mod errors;
pub mod features;
pub mod generator;
pub mod material;
pub mod program;
pub mod render_state;
pub mod scene;
pub mod script;
pub mod settings;

pub use errors::{ErrorKind, Result, ShaderGenError};
pub use generator::{
    DEFAULT_SCHEME_NAME, GeneratedPass, ShaderGenerator, TechniqueInfo, ValidationFailure,
    ValidationReport,
};
pub use material::{Material, MaterialStore, Pass, PassId, Technique, TechniqueId};
pub use program::{NullBackend, ProgramBackend, ShaderStage};
pub use render_state::{
    FactoryRegistry, RenderState, SubRenderState, SubRenderStateFactory, TargetRenderState,
};
pub use scene::{FogMode, Light, LightType, SceneManager, Viewport};
pub use script::{ObjectNode, PropertyNode, ScriptTranslator};
pub use settings::GeneratorSettings;
