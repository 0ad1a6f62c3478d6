//! The per-scope definition store: base name to definition set.
//!
//! Most scopes hold a handful of names, so the store starts as an inline
//! vector of pairs and spills to a hash map once it crosses the inline
//! threshold. The spill is one-way; stores grow in tier but never shrink
//! back, which avoids thrashing on add/remove cycles.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::def_set::{DefEntry, DefinitionSet};

const INLINE_CAPACITY: usize = 8;

#[derive(Debug)]
enum StoreRepr {
    Inline(SmallVec<[(Arc<str>, DefinitionSet); INLINE_CAPACITY]>),
    Spilled(FxHashMap<Arc<str>, DefinitionSet>),
}

#[derive(Debug)]
pub struct DefinitionStore {
    repr: StoreRepr,
}

impl Default for DefinitionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DefinitionStore {
    pub fn new() -> Self {
        DefinitionStore { repr: StoreRepr::Inline(SmallVec::new()) }
    }

    /// Number of distinct base names.
    pub fn len(&self) -> usize {
        match &self.repr {
            StoreRepr::Inline(pairs) => pairs.len(),
            StoreRepr::Spilled(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, base_name: &str) -> Option<&DefinitionSet> {
        match &self.repr {
            StoreRepr::Inline(pairs) => pairs
                .iter()
                .find(|(name, _)| name.as_ref() == base_name)
                .map(|(_, set)| set),
            StoreRepr::Spilled(map) => map.get(base_name),
        }
    }

    pub fn add(&mut self, entry: DefEntry) {
        let base_name: Arc<str> = Arc::from(entry.base_name());
        match &mut self.repr {
            StoreRepr::Inline(pairs) => {
                if let Some((_, set)) =
                    pairs.iter_mut().find(|(name, _)| name.as_ref() == entry.base_name())
                {
                    set.push(entry);
                    return;
                }
                if pairs.len() < INLINE_CAPACITY {
                    pairs.push((base_name, DefinitionSet::single(entry)));
                    return;
                }
                // Inline tier is full; spill to a map and retry there.
                let mut map = FxHashMap::with_capacity_and_hasher(
                    pairs.len() + 1,
                    rustc_hash::FxBuildHasher,
                );
                for (name, set) in pairs.drain(..) {
                    map.insert(name, set);
                }
                map.entry(base_name).or_default().push(entry);
                self.repr = StoreRepr::Spilled(map);
            }
            StoreRepr::Spilled(map) => {
                map.entry(base_name).or_default().push(entry);
            }
        }
    }

    /// Removes by identity, collapsing an emptied set. Returns whether the
    /// entry was present.
    pub fn remove(&mut self, entry: &DefEntry) -> bool {
        match &mut self.repr {
            StoreRepr::Inline(pairs) => {
                let Some(idx) =
                    pairs.iter().position(|(name, _)| name.as_ref() == entry.base_name())
                else {
                    return false;
                };
                let removed = pairs[idx].1.remove(entry);
                if removed && pairs[idx].1.is_empty() {
                    pairs.remove(idx);
                }
                removed
            }
            StoreRepr::Spilled(map) => {
                let Some(set) = map.get_mut(entry.base_name()) else {
                    return false;
                };
                let removed = set.remove(entry);
                if removed && set.is_empty() {
                    map.remove(entry.base_name());
                }
                removed
            }
        }
    }

    /// Swaps one entry for another within its set, by identity.
    pub fn replace(&mut self, old: &DefEntry, new: DefEntry) -> bool {
        debug_assert_eq!(old.base_name(), new.base_name());
        match &mut self.repr {
            StoreRepr::Inline(pairs) => pairs
                .iter_mut()
                .find(|(name, _)| name.as_ref() == old.base_name())
                .is_some_and(|(_, set)| set.replace(old, new)),
            StoreRepr::Spilled(map) => {
                map.get_mut(old.base_name()).is_some_and(|set| set.replace(old, new))
            }
        }
    }

    pub fn all_names(&self) -> Vec<Arc<str>> {
        match &self.repr {
            StoreRepr::Inline(pairs) => pairs.iter().map(|(name, _)| Arc::clone(name)).collect(),
            StoreRepr::Spilled(map) => map.keys().cloned().collect(),
        }
    }

    pub fn all_sets(&self) -> Vec<&DefinitionSet> {
        match &self.repr {
            StoreRepr::Inline(pairs) => pairs.iter().map(|(_, set)| set).collect(),
            StoreRepr::Spilled(map) => map.values().collect(),
        }
    }

    pub fn all_entries(&self) -> Vec<DefEntry> {
        let mut entries = Vec::new();
        for set in self.all_sets() {
            entries.extend(set.entries().iter().cloned());
        }
        entries
    }

    /// Shrinks growable internals. Applied once a compilation unit's scopes
    /// are finalized.
    pub fn compact(&mut self) {
        match &mut self.repr {
            StoreRepr::Inline(pairs) => pairs.shrink_to_fit(),
            StoreRepr::Spilled(map) => map.shrink_to_fit(),
        }
    }
}
