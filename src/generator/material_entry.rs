use std::collections::BTreeMap;

use super::technique::TechniqueKey;
use crate::material::AUTODETECT_GROUP;

/// `(material name, resource group)`.
pub(crate) type MaterialKey = (String, String);

/// Shader-based techniques generated for one material.
#[derive(Debug, Default)]
pub(crate) struct SgMaterial {
    pub(crate) techniques: Vec<TechniqueKey>,
}

/// Material entries ordered by key, so group auto-detection is a
/// lower-bound lookup on `(name, "")`.
#[derive(Debug, Default)]
pub(crate) struct MaterialEntries {
    entries: BTreeMap<MaterialKey, SgMaterial>,
}

impl MaterialEntries {
    /// Resolves `group` to the key of an existing entry.
    pub(crate) fn resolve(&self, name: &str, group: &str) -> Option<MaterialKey> {
        if group == AUTODETECT_GROUP {
            let start = (name.to_string(), String::new());
            return self
                .entries
                .range(start..)
                .next()
                .filter(|(key, _)| key.0 == name)
                .map(|(key, _)| key.clone());
        }
        let key = (name.to_string(), group.to_string());
        self.entries.contains_key(&key).then_some(key)
    }

    pub(crate) fn get(&self, key: &MaterialKey) -> Option<&SgMaterial> {
        self.entries.get(key)
    }

    pub(crate) fn entry(&mut self, key: MaterialKey) -> &mut SgMaterial {
        self.entries.entry(key).or_default()
    }

    /// Unlinks `technique` from its material entry, dropping the entry once
    /// it holds no techniques.
    pub(crate) fn unlink(&mut self, key: &MaterialKey, technique: TechniqueKey) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.techniques.retain(|&t| t != technique);
            if entry.techniques.is_empty() {
                self.entries.remove(key);
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn key(name: &str, group: &str) -> MaterialKey {
        (name.to_string(), group.to_string())
    }

    #[test]
    fn autodetect_picks_first_group() {
        let mut keys: SlotMap<TechniqueKey, ()> = SlotMap::with_key();
        let mut entries = MaterialEntries::default();
        entries.entry(key("rock", "Levels")).techniques.push(keys.insert(()));
        entries.entry(key("rock", "General")).techniques.push(keys.insert(()));
        entries.entry(key("rocks", "A")).techniques.push(keys.insert(()));

        assert_eq!(entries.resolve("rock", AUTODETECT_GROUP), Some(key("rock", "General")));
        assert_eq!(entries.resolve("roc", AUTODETECT_GROUP), None);
        assert_eq!(entries.resolve("rock", "Levels"), Some(key("rock", "Levels")));
        assert_eq!(entries.resolve("rock", "Missing"), None);
    }

    #[test]
    fn last_unlink_drops_entry() {
        let mut keys: SlotMap<TechniqueKey, ()> = SlotMap::with_key();
        let a = keys.insert(());
        let b = keys.insert(());
        let mut entries = MaterialEntries::default();
        entries.entry(key("m", "g")).techniques.extend([a, b]);

        entries.unlink(&key("m", "g"), a);
        assert_eq!(entries.len(), 1);
        entries.unlink(&key("m", "g"), b);
        assert_eq!(entries.len(), 0);
    }
}
