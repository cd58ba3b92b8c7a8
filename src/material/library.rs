use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use slotmap::{SlotMap, new_key_type};

use super::Material;

/// Resource group used when none is given.
pub const DEFAULT_GROUP: &str = "General";
/// Resource group of engine-internal materials.
pub const INTERNAL_GROUP: &str = "Internal";
/// Wildcard group: resolves to the first group holding the material name.
pub const AUTODETECT_GROUP: &str = "Autodetect";

new_key_type! {
    pub struct MaterialHandle;
}

/// Kind of resource reported by [`ResourceListener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Material,
    Texture,
    GpuProgram,
}

/// Notified after a resource has been removed from its library.
pub trait ResourceListener: Send + Sync {
    fn resource_removed(&self, kind: ResourceKind, name: &str, group: &str);
}

// Materials keyed by (name, group). The ordered index makes group
// auto-detection a lower-bound lookup.
#[derive(Default)]
pub struct MaterialLibrary {
    map: SlotMap<MaterialHandle, Material>,
    lookup: BTreeMap<(String, String), MaterialHandle>,
}

impl MaterialLibrary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a material, replacing any material with the same name and group.
    pub fn add(&mut self, material: Material) -> MaterialHandle {
        let key = (material.name().to_string(), material.group().to_string());
        if let Some(&handle) = self.lookup.get(&key)
            && let Some(slot) = self.map.get_mut(handle)
        {
            log::debug!("Replacing material '{}' in group '{}'", key.0, key.1);
            *slot = material;
            return handle;
        }
        let handle = self.map.insert(material);
        self.lookup.insert(key, handle);
        handle
    }

    /// Resolves `(name, group)` to a handle. [`AUTODETECT_GROUP`] picks the
    /// first group (in lexical order) holding a material with that name.
    #[must_use]
    pub fn resolve(&self, name: &str, group: &str) -> Option<MaterialHandle> {
        if group == AUTODETECT_GROUP {
            let lower = (name.to_string(), String::new());
            let ((found, _), handle) = self.lookup.range(lower..).next()?;
            return (found == name).then_some(*handle);
        }
        self.lookup
            .get(&(name.to_string(), group.to_string()))
            .copied()
    }

    #[must_use]
    pub fn get(&self, handle: MaterialHandle) -> Option<&Material> {
        self.map.get(handle)
    }

    pub fn get_mut(&mut self, handle: MaterialHandle) -> Option<&mut Material> {
        self.map.get_mut(handle)
    }

    #[must_use]
    pub fn by_name(&self, name: &str, group: &str) -> Option<&Material> {
        self.resolve(name, group).and_then(|h| self.map.get(h))
    }

    pub fn by_name_mut(&mut self, name: &str, group: &str) -> Option<&mut Material> {
        let handle = self.resolve(name, group)?;
        self.map.get_mut(handle)
    }

    pub fn remove(&mut self, handle: MaterialHandle) -> Option<Material> {
        let material = self.map.remove(handle)?;
        self.lookup
            .remove(&(material.name().to_string(), material.group().to_string()));
        Some(material)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MaterialHandle, &Material)> {
        self.map.iter()
    }
}

/// Thread-safe material library shared by the host and the generator.
///
/// Removal listeners are invoked after the library lock is released so they
/// may read or write the store themselves.
#[derive(Default)]
pub struct MaterialStore {
    inner: RwLock<MaterialLibrary>,
    listeners: RwLock<Vec<Arc<dyn ResourceListener>>>,
}

impl MaterialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// [Write] Adds a material and returns its handle.
    pub fn add(&self, material: Material) -> MaterialHandle {
        self.inner.write().add(material)
    }

    /// [Read] Acquires a read guard for batch access.
    pub fn read(&self) -> RwLockReadGuard<'_, MaterialLibrary> {
        self.inner.read()
    }

    /// [Write] Acquires a write guard.
    pub fn write(&self) -> RwLockWriteGuard<'_, MaterialLibrary> {
        self.inner.write()
    }

    /// Removes a material and notifies listeners. Returns `false` if absent.
    pub fn remove(&self, name: &str, group: &str) -> bool {
        let removed = {
            let mut library = self.inner.write();
            library
                .resolve(name, group)
                .and_then(|handle| library.remove(handle))
        };
        let Some(material) = removed else {
            return false;
        };

        let listeners = self.listeners.read().clone();
        for listener in &listeners {
            listener.resource_removed(ResourceKind::Material, material.name(), material.group());
        }
        true
    }

    pub fn add_listener(&self, listener: Arc<dyn ResourceListener>) {
        self.listeners.write().push(listener);
    }

    pub fn remove_listener(&self, listener: &Arc<dyn ResourceListener>) {
        self.listeners.write().retain(|l| !Arc::ptr_eq(l, listener));
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        removed: Mutex<Vec<(ResourceKind, String, String)>>,
    }

    impl ResourceListener for Recorder {
        fn resource_removed(&self, kind: ResourceKind, name: &str, group: &str) {
            self.removed
                .lock()
                .push((kind, name.to_string(), group.to_string()));
        }
    }

    #[test]
    fn autodetect_resolves_lower_bound_group() {
        let mut library = MaterialLibrary::new();
        let general = library.add(Material::new("Rock", DEFAULT_GROUP));
        let internal = library.add(Material::new("Rock", INTERNAL_GROUP));
        library.add(Material::new("Rocket", "Alpha"));

        assert_eq!(library.resolve("Rock", AUTODETECT_GROUP), Some(general));
        assert_eq!(library.resolve("Rock", INTERNAL_GROUP), Some(internal));
        assert_eq!(library.resolve("Roc", AUTODETECT_GROUP), None);
    }

    #[test]
    fn add_replaces_same_key() {
        let mut library = MaterialLibrary::new();
        let first = library.add(Material::new("Rock", DEFAULT_GROUP));
        let second = library.add(Material::new("Rock", DEFAULT_GROUP));
        assert_eq!(first, second);
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn remove_notifies_after_unlock() {
        let store = MaterialStore::new();
        store.add(Material::new("Rock", DEFAULT_GROUP));
        let recorder = Arc::new(Recorder::default());
        store.add_listener(recorder.clone());

        assert!(store.remove("Rock", AUTODETECT_GROUP));
        assert!(!store.remove("Rock", AUTODETECT_GROUP));
        assert!(store.read().is_empty());

        let removed = recorder.removed.lock();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].0, ResourceKind::Material);
        assert_eq!(removed[0].2, DEFAULT_GROUP);
    }
}
