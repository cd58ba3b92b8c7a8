//! Program generation.
//!
//! Sub-render-states describe their contribution as a [`ProgramSet`]; the
//! [`writer`] renders it to source and the [`ProgramManager`] hands the
//! source to a [`ProgramBackend`], caching by content hash.

pub mod backend;
pub mod defines;
pub mod manager;
pub mod program_set;
pub mod writer;

pub use backend::{NullBackend, ProgramBackend, ProgramDesc, ProgramHandle};
pub use defines::ShaderDefines;
pub use manager::{ProgramManager, ProgramTarget};
pub use program_set::{
    FunctionInvocation, ParamValue, Program, ProgramParameters, ProgramSet, ShaderStage,
    UniformParameter, UniformType,
};
