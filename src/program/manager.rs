//! Generated Program Cache
//!
//! Deduplicates generated programs by hashing the **final** rendered source
//! with xxh3-128. Passes that end up with identical feature sets share one
//! backend program; each acquisition bumps a reference count.
//!
//! Released programs stay cached (with a zero count) until
//! [`ProgramManager::evict_unused`] or [`ProgramManager::flush`], so a
//! rebuild that regenerates the same source does not recompile it. Between
//! evictions the cache holds at most one entry per distinct source ever
//! generated.
//!
//! When a cache directory is configured, every newly created program's
//! source is also written there as `<name>.<language>`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use xxhash_rust::xxh3::xxh3_128;

use super::backend::{ProgramBackend, ProgramDesc, ProgramHandle};
use super::program_set::{Program, ProgramParameters, ShaderStage};
use super::writer::render_program;
use crate::errors::Result;

/// Target language and per-stage profile lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramTarget {
    pub language: String,
    pub vertex_profiles: String,
    pub fragment_profiles: String,
}

impl ProgramTarget {
    /// Raw whitespace-separated profile string of `stage`.
    #[must_use]
    pub fn profiles(&self, stage: ShaderStage) -> &str {
        match stage {
            ShaderStage::Vertex => &self.vertex_profiles,
            ShaderStage::Fragment => &self.fragment_profiles,
        }
    }

    pub fn set_profiles(&mut self, stage: ShaderStage, profiles: &str) {
        let slot = match stage {
            ShaderStage::Vertex => &mut self.vertex_profiles,
            ShaderStage::Fragment => &mut self.fragment_profiles,
        };
        profiles.clone_into(slot);
    }

    /// Profile string of `stage` split into individual profiles.
    #[must_use]
    pub fn profile_list(&self, stage: ShaderStage) -> Vec<String> {
        self.profiles(stage)
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }
}

struct CachedProgram {
    handle: ProgramHandle,
    stage: ShaderStage,
    name: String,
    ref_count: usize,
}

pub struct ProgramManager {
    backend: Arc<dyn ProgramBackend>,
    /// xxh3-128 of rendered source → program.
    cache: FxHashMap<u128, CachedProgram>,
    by_name: FxHashMap<String, u128>,
    cache_dir: Option<PathBuf>,
}

impl ProgramManager {
    #[must_use]
    pub fn new(backend: Arc<dyn ProgramBackend>) -> Self {
        Self {
            backend,
            cache: FxHashMap::default(),
            by_name: FxHashMap::default(),
            cache_dir: None,
        }
    }

    pub fn set_cache_dir(&mut self, dir: Option<PathBuf>) {
        self.cache_dir = dir;
    }

    #[must_use]
    pub fn cache_dir(&self) -> Option<&Path> {
        self.cache_dir.as_deref()
    }

    #[must_use]
    pub fn backend(&self) -> &Arc<dyn ProgramBackend> {
        &self.backend
    }

    /// Renders `program`, creating it in the backend on a cache miss.
    ///
    /// Returns the generated program name.
    pub fn acquire(&mut self, program: &Program, target: &ProgramTarget) -> Result<String> {
        let stage = program.stage();
        let profiles = target.profile_list(stage);
        let source = render_program(program, &target.language, &profiles)?;
        let hash = xxh3_128(source.as_bytes());

        if let Some(cached) = self.cache.get_mut(&hash) {
            cached.ref_count += 1;
            log::debug!(
                "Program cache hit: {} (refs: {})",
                cached.name,
                cached.ref_count
            );
            return Ok(cached.name.clone());
        }

        let name = format!("{}_{hash:032x}", stage.prefix());
        let handle = self.backend.create_program(&ProgramDesc {
            name: &name,
            stage,
            language: &target.language,
            profiles: &profiles,
            source: &source,
        })?;
        log::debug!("Created {} program {name}", stage.as_str());

        if let Some(dir) = &self.cache_dir {
            let path = dir.join(format!("{name}.{}", target.language));
            if let Err(e) = std::fs::write(&path, &source) {
                log::warn!("Failed to write program source {}: {e}", path.display());
            }
        }

        self.by_name.insert(name.clone(), hash);
        self.cache.insert(
            hash,
            CachedProgram {
                handle,
                stage,
                name: name.clone(),
                ref_count: 1,
            },
        );
        Ok(name)
    }

    /// Drops one reference to the program called `name`.
    pub fn release(&mut self, name: &str) {
        let Some(hash) = self.by_name.get(name) else {
            return;
        };
        if let Some(cached) = self.cache.get_mut(hash) {
            cached.ref_count = cached.ref_count.saturating_sub(1);
        }
    }

    #[must_use]
    pub fn ref_count(&self, name: &str) -> usize {
        self.by_name
            .get(name)
            .and_then(|hash| self.cache.get(hash))
            .map_or(0, |c| c.ref_count)
    }

    /// Destroys the programs no pass references any more.
    ///
    /// Returns the number of evicted programs.
    pub fn evict_unused(&mut self) -> usize {
        let unused: Vec<u128> = self
            .cache
            .iter()
            .filter(|(_, c)| c.ref_count == 0)
            .map(|(hash, _)| *hash)
            .collect();
        for hash in &unused {
            if let Some(cached) = self.cache.remove(hash) {
                log::debug!("Evicting unused program {}", cached.name);
                self.by_name.remove(&cached.name);
                self.backend.destroy_program(cached.handle);
            }
        }
        unused.len()
    }

    /// Destroys every cached program and flushes the backend cache.
    pub fn flush(&mut self) {
        for (_, cached) in self.cache.drain() {
            self.backend.destroy_program(cached.handle);
        }
        self.by_name.clear();
        self.backend.flush_cache();
    }

    #[must_use]
    pub fn shader_count(&self, stage: ShaderStage) -> usize {
        self.cache.values().filter(|c| c.stage == stage).count()
    }

    pub fn update_parameters(&self, name: &str, params: &ProgramParameters) {
        self.backend.update_parameters(name, params);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::NullBackend;

    fn target() -> ProgramTarget {
        ProgramTarget {
            language: NullBackend::LANGUAGE.to_string(),
            vertex_profiles: "vs_1 vs_2".to_string(),
            fragment_profiles: String::new(),
        }
    }

    #[test]
    fn identical_sources_share_one_program() {
        let backend = Arc::new(NullBackend::new());
        let mut manager = ProgramManager::new(backend.clone());

        let mut program = Program::new(ShaderStage::Vertex);
        program.add_invocation(100, "FFP_Transform", &[]);

        let a = manager.acquire(&program, &target()).unwrap();
        let b = manager.acquire(&program, &target()).unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with("VS_"));
        assert_eq!(backend.created_count(), 1);
        assert_eq!(manager.ref_count(&a), 2);

        manager.release(&a);
        manager.release(&a);
        manager.release(&a);
        assert_eq!(manager.ref_count(&a), 0);
        assert_eq!(manager.shader_count(ShaderStage::Vertex), 1);

        manager.flush();
        assert_eq!(manager.shader_count(ShaderStage::Vertex), 0);
        assert_eq!(backend.live_count(), 0);
        assert_eq!(backend.flush_count(), 1);
    }

    #[test]
    fn evict_unused_keeps_referenced_programs() {
        let backend = Arc::new(NullBackend::new());
        let mut manager = ProgramManager::new(backend.clone());

        let mut kept = Program::new(ShaderStage::Vertex);
        kept.add_invocation(100, "FFP_Transform", &[]);
        let dropped = Program::new(ShaderStage::Fragment);

        let kept = manager.acquire(&kept, &target()).unwrap();
        let dropped = manager.acquire(&dropped, &target()).unwrap();
        manager.release(&dropped);

        assert_eq!(manager.evict_unused(), 1);
        assert_eq!(manager.ref_count(&kept), 1);
        assert_eq!(manager.shader_count(ShaderStage::Fragment), 0);
        assert_eq!(backend.live_count(), 1);
        assert_eq!(manager.evict_unused(), 0);

        // Releasing an evicted name is a no-op.
        manager.release(&dropped);
        assert_eq!(manager.ref_count(&dropped), 0);
    }

    #[test]
    fn flush_after_eviction_destroys_the_rest() {
        let backend = Arc::new(NullBackend::new());
        let mut manager = ProgramManager::new(backend.clone());
        let name = manager.acquire(&Program::new(ShaderStage::Vertex), &target()).unwrap();
        manager.evict_unused();
        assert_eq!(manager.ref_count(&name), 1);

        manager.flush();
        assert_eq!(backend.live_count(), 0);
        assert_eq!(backend.flush_count(), 1);
    }

    #[test]
    fn new_programs_are_written_to_cache_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = ProgramManager::new(Arc::new(NullBackend::new()));
        manager.set_cache_dir(Some(dir.path().to_path_buf()));

        let program = Program::new(ShaderStage::Fragment);
        let name = manager.acquire(&program, &target()).unwrap();
        let written = std::fs::read_to_string(dir.path().join(format!("{name}.null"))).unwrap();
        assert!(written.contains("void main()"));
    }

    #[test]
    fn profiles_split_on_whitespace() {
        let target = target();
        assert_eq!(target.profile_list(ShaderStage::Vertex), ["vs_1", "vs_2"]);
        assert!(target.profile_list(ShaderStage::Fragment).is_empty());
    }
}
