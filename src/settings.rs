//! Shader Generator Settings
//!
//! Start-up configuration for [`ShaderGenerator::initialize`].
//!
//! ```rust,ignore
//! use rtshader::GeneratorSettings;
//!
//! let settings = GeneratorSettings {
//!     target_language: Some("glsl".into()),
//!     vertex_profiles: "glsl330".into(),
//!     fragment_profiles: "glsl330".into(),
//!     ..Default::default()
//! };
//! ```
//!
//! Settings are plain data and can be loaded from JSON (or any other serde
//! format) by the host application.
//!
//! [`ShaderGenerator::initialize`]: crate::generator::ShaderGenerator::initialize

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Languages probed, in order, when no target language is configured.
pub const LANGUAGE_PREFERENCE: [&str; 4] = ["wgsl", "glsles", "glsl", "hlsl"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    /// Target shader language. `None` picks the first language of
    /// [`LANGUAGE_PREFERENCE`] the backend supports.
    pub target_language: Option<String>,

    /// Whitespace-separated vertex profile list.
    pub vertex_profiles: String,

    /// Whitespace-separated fragment profile list.
    pub fragment_profiles: String,

    /// Directory generated program sources are written to. Must be writable.
    pub cache_path: Option<PathBuf>,

    /// Whether passes that already carry programs are still rewritten.
    pub create_shader_over_programmable_pass: bool,

    /// Registers the built-in sub-render-state factories at start-up.
    pub register_builtin_factories: bool,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            target_language: None,
            vertex_profiles: String::new(),
            fragment_profiles: String::new(),
            cache_path: None,
            create_shader_over_programmable_pass: false,
            register_builtin_factories: true,
        }
    }
}
