//! Error Types
//!
//! This module defines the error types used throughout the shader generator.
//!
//! # Overview
//!
//! The main error type [`ShaderGenError`] covers all failure modes including:
//! - Sub-render-state factory registration and lookup
//! - Scheme lookup
//! - Target language and cache directory configuration
//! - Program generation and compilation
//! - Declarative (script) configuration
//!
//! Lookups where absence is a normal state (materials, techniques, passes)
//! return `Option` or `bool` instead of an error.
//!
//! # Usage
//!
//! All fallible public APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, ShaderGenError>`.
//!
//! ```rust,ignore
//! use rtshader::errors::{ErrorKind, ShaderGenError};
//!
//! match generator.set_target_language("metal") {
//!     Err(e) if e.kind() == ErrorKind::UnsupportedLanguage => { /* fall back */ }
//!     other => other?,
//! }
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Coarse classification of [`ShaderGenError`] variants.
///
/// Lets callers branch on the failure family without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Something with the same identity is already registered.
    DuplicateType,
    /// A named or indexed item does not exist.
    NotFound,
    /// The requested shader language is not available in the backend.
    UnsupportedLanguage,
    /// File system failure.
    Io,
    /// Program source generation or compilation failed.
    Program,
    /// A declarative property could not be applied.
    Script,
}

/// The main error type for the shader generator.
#[derive(Error, Debug)]
pub enum ShaderGenError {
    // ========================================================================
    // Registry Errors
    // ========================================================================
    /// A factory for this sub-render-state type is already registered.
    #[error("A sub-render-state factory of type '{0}' already exists")]
    DuplicateFactory(String),

    /// No factory is registered for this sub-render-state type.
    #[error("No sub-render-state factory of type '{0}' is registered")]
    FactoryNotFound(String),

    /// Factory index out of bounds.
    #[error("Sub-render-state factory index out of bounds: {index} (count: {count})")]
    FactoryIndexOutOfRange {
        /// The invalid index
        index: usize,
        /// Number of registered factories
        count: usize,
    },

    /// The requested scheme does not exist.
    #[error("Scheme not found: {0}")]
    SchemeNotFound(String),

    /// The shader generator behind a handle has been destroyed.
    #[error("The shader generator has been destroyed")]
    GeneratorDestroyed,

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// The target shader language is not supported by the program backend.
    #[error("Shader language '{0}' is not supported")]
    UnsupportedLanguage(String),

    /// The shader cache directory failed the writability probe.
    #[error("Could not create output files in the shader cache path '{}': {source}", path.display())]
    CacheDirectoryNotWritable {
        /// The probed directory
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    // ========================================================================
    // Program Errors
    // ========================================================================
    /// A sub-render-state refused to emit its program fragments.
    #[error("Sub-render-state '{0}' failed to generate its sub programs")]
    SubProgramGeneration(String),

    /// The program backend rejected a generated program.
    #[error("Failed to compile program '{name}': {reason}")]
    ProgramCompile {
        /// Generated program name
        name: String,
        /// Backend-provided reason
        reason: String,
    },

    /// Program source template rendering failed.
    #[error("Program template error: {0}")]
    Template(#[from] minijinja::Error),

    // ========================================================================
    // Script Errors
    // ========================================================================
    /// A declarative property had malformed arguments.
    #[error("Invalid property '{property}': {reason}")]
    InvalidProperty {
        /// Property name
        property: String,
        /// What was wrong with it
        reason: String,
    },
}

impl ShaderGenError {
    /// Returns the failure family of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateFactory(_) => ErrorKind::DuplicateType,
            Self::FactoryNotFound(_)
            | Self::FactoryIndexOutOfRange { .. }
            | Self::SchemeNotFound(_)
            | Self::GeneratorDestroyed => ErrorKind::NotFound,
            Self::UnsupportedLanguage(_) => ErrorKind::UnsupportedLanguage,
            Self::CacheDirectoryNotWritable { .. } => ErrorKind::Io,
            Self::SubProgramGeneration(_) | Self::ProgramCompile { .. } | Self::Template(_) => {
                ErrorKind::Program
            }
            Self::InvalidProperty { .. } => ErrorKind::Script,
        }
    }
}

/// Alias for `Result<T, ShaderGenError>`.
pub type Result<T> = std::result::Result<T, ShaderGenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(
            ShaderGenError::DuplicateFactory("FFP_Fog".into()).kind(),
            ErrorKind::DuplicateType
        );
        assert_eq!(
            ShaderGenError::FactoryIndexOutOfRange { index: 9, count: 2 }.kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            ShaderGenError::SchemeNotFound("Forward".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            ShaderGenError::UnsupportedLanguage("metal".into()).kind(),
            ErrorKind::UnsupportedLanguage
        );
    }

    #[test]
    fn cache_path_error_mentions_path() {
        let err = ShaderGenError::CacheDirectoryNotWritable {
            path: PathBuf::from("/nope/"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.to_string().contains("/nope/"));
    }
}
