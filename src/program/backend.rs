use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use super::program_set::{ProgramParameters, ShaderStage};
use crate::errors::{Result, ShaderGenError};

/// Opaque id of a program created by a [`ProgramBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u64);

/// Everything a backend needs to create one program.
#[derive(Debug, Clone, Copy)]
pub struct ProgramDesc<'a> {
    pub name: &'a str,
    pub stage: ShaderStage,
    pub language: &'a str,
    pub profiles: &'a [String],
    pub source: &'a str,
}

/// GPU program manager contract.
///
/// The generator hands over finished source text; compiling, storing and
/// binding programs is the backend's business.
pub trait ProgramBackend: Send + Sync {
    fn is_language_supported(&self, language: &str) -> bool;

    fn create_program(&self, desc: &ProgramDesc<'_>) -> Result<ProgramHandle>;

    fn destroy_program(&self, handle: ProgramHandle);

    /// Pushes per-draw parameter values to a created program.
    fn update_parameters(&self, _program: &str, _params: &ProgramParameters) {}

    /// Drops any backend-side compiled program cache.
    fn flush_cache(&self) {}
}

/// Backend that compiles nothing.
///
/// Supports the `null` language (plus any extra languages given at
/// construction), keeps the source of every live program and counts calls.
/// [`set_fail_compiles`](Self::set_fail_compiles) makes every creation fail.
pub struct NullBackend {
    languages: Vec<String>,
    next_handle: AtomicU64,
    fail_compiles: AtomicBool,
    live: Mutex<FxHashMap<ProgramHandle, (String, String)>>,
    created: AtomicUsize,
    destroyed: AtomicUsize,
    updates: AtomicUsize,
    flushes: AtomicUsize,
}

impl Default for NullBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl NullBackend {
    pub const LANGUAGE: &'static str = "null";

    #[must_use]
    pub fn new() -> Self {
        Self::with_languages(&[])
    }

    #[must_use]
    pub fn with_languages(extra: &[&str]) -> Self {
        let mut languages = vec![Self::LANGUAGE.to_string()];
        languages.extend(extra.iter().map(|l| (*l).to_string()));
        Self {
            languages,
            next_handle: AtomicU64::new(1),
            fail_compiles: AtomicBool::new(false),
            live: Mutex::new(FxHashMap::default()),
            created: AtomicUsize::new(0),
            destroyed: AtomicUsize::new(0),
            updates: AtomicUsize::new(0),
            flushes: AtomicUsize::new(0),
        }
    }

    pub fn set_fail_compiles(&self, fail: bool) {
        self.fail_compiles.store(fail, Ordering::Relaxed);
    }

    #[must_use]
    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn destroyed_count(&self) -> usize {
        self.destroyed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.lock().len()
    }

    #[must_use]
    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::Relaxed)
    }

    /// Source of the live program called `name`.
    #[must_use]
    pub fn source_of(&self, name: &str) -> Option<String> {
        self.live
            .lock()
            .values()
            .find(|(n, _)| n == name)
            .map(|(_, source)| source.clone())
    }
}

impl ProgramBackend for NullBackend {
    fn is_language_supported(&self, language: &str) -> bool {
        self.languages.iter().any(|l| l == language)
    }

    fn create_program(&self, desc: &ProgramDesc<'_>) -> Result<ProgramHandle> {
        if self.fail_compiles.load(Ordering::Relaxed) {
            return Err(ShaderGenError::ProgramCompile {
                name: desc.name.to_string(),
                reason: "compilation disabled".to_string(),
            });
        }
        let handle = ProgramHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.live
            .lock()
            .insert(handle, (desc.name.to_string(), desc.source.to_string()));
        self.created.fetch_add(1, Ordering::Relaxed);
        Ok(handle)
    }

    fn destroy_program(&self, handle: ProgramHandle) {
        if self.live.lock().remove(&handle).is_some() {
            self.destroyed.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn update_parameters(&self, _program: &str, _params: &ProgramParameters) {
        self.updates.fetch_add(1, Ordering::Relaxed);
    }

    fn flush_cache(&self) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
    }
}
