//! Definition sets.
//!
//! All entries in one set share one base name; multiple entries mean
//! overloads, a getter/setter pair, or a genuine ambiguity. The single-entry
//! case is the overwhelmingly common one, so it carries no container
//! allocation.

use std::sync::Arc;

use smallvec::SmallVec;

use sable_common::Namespace;

use crate::definition::DefRef;
use crate::promise::DefinitionPromise;

/// One slot in a store: either a real definition or a promise standing in
/// for one. Ordinary scopes only ever hold definitions; promises appear in
/// the project scope and its shadow sets.
#[derive(Clone, Debug)]
pub enum DefEntry {
    Definition(DefRef),
    Promise(Arc<DefinitionPromise>),
}

impl DefEntry {
    pub fn base_name(&self) -> &str {
        match self {
            DefEntry::Definition(def) => def.base_name(),
            DefEntry::Promise(promise) => promise.base_name(),
        }
    }

    pub fn namespace(&self) -> &Namespace {
        match self {
            DefEntry::Definition(def) => def.namespace(),
            DefEntry::Promise(promise) => promise.namespace(),
        }
    }

    pub fn is_promise(&self) -> bool {
        matches!(self, DefEntry::Promise(_))
    }

    pub fn as_definition(&self) -> Option<&DefRef> {
        match self {
            DefEntry::Definition(def) => Some(def),
            DefEntry::Promise(_) => None,
        }
    }

    /// Identity comparison; a promise and the definition it materialized to
    /// are distinct entries.
    pub fn same_entry(&self, other: &DefEntry) -> bool {
        match (self, other) {
            (DefEntry::Definition(a), DefEntry::Definition(b)) => Arc::ptr_eq(a, b),
            (DefEntry::Promise(a), DefEntry::Promise(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<DefRef> for DefEntry {
    fn from(def: DefRef) -> Self {
        DefEntry::Definition(def)
    }
}

impl From<Arc<DefinitionPromise>> for DefEntry {
    fn from(promise: Arc<DefinitionPromise>) -> Self {
        DefEntry::Promise(promise)
    }
}

/// The definitions sharing one base name within one scope.
#[derive(Clone, Debug, Default)]
pub enum DefinitionSet {
    #[default]
    Empty,
    /// Flyweight: one definition is its own set of size 1.
    Single(DefEntry),
    Many(SmallVec<[DefEntry; 2]>),
}

impl DefinitionSet {
    pub fn single(entry: DefEntry) -> Self {
        DefinitionSet::Single(entry)
    }

    pub fn len(&self) -> usize {
        match self {
            DefinitionSet::Empty => 0,
            DefinitionSet::Single(_) => 1,
            DefinitionSet::Many(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entries(&self) -> &[DefEntry] {
        match self {
            DefinitionSet::Empty => &[],
            DefinitionSet::Single(entry) => std::slice::from_ref(entry),
            DefinitionSet::Many(entries) => entries,
        }
    }

    pub fn first(&self) -> Option<&DefEntry> {
        self.entries().first()
    }

    pub fn push(&mut self, entry: DefEntry) {
        debug_assert!(
            self.entries().iter().all(|existing| existing.base_name() == entry.base_name()),
            "definition set must hold one base name"
        );
        match self {
            DefinitionSet::Empty => *self = DefinitionSet::Single(entry),
            DefinitionSet::Single(existing) => {
                let mut entries = SmallVec::new();
                entries.push(existing.clone());
                entries.push(entry);
                *self = DefinitionSet::Many(entries);
            }
            DefinitionSet::Many(entries) => entries.push(entry),
        }
    }

    /// Removes by identity. Returns whether the entry was present; a set
    /// emptied by removal collapses back to `Empty`.
    pub fn remove(&mut self, entry: &DefEntry) -> bool {
        match self {
            DefinitionSet::Empty => false,
            DefinitionSet::Single(existing) => {
                if existing.same_entry(entry) {
                    *self = DefinitionSet::Empty;
                    true
                } else {
                    false
                }
            }
            DefinitionSet::Many(entries) => {
                let Some(idx) = entries.iter().position(|e| e.same_entry(entry)) else {
                    return false;
                };
                entries.remove(idx);
                if entries.len() == 1 {
                    *self = DefinitionSet::Single(entries[0].clone());
                }
                true
            }
        }
    }

    /// Replaces an entry in place, by identity. Used when a promise is
    /// swapped for its materialized definition.
    pub fn replace(&mut self, old: &DefEntry, new: DefEntry) -> bool {
        match self {
            DefinitionSet::Empty => false,
            DefinitionSet::Single(existing) => {
                if existing.same_entry(old) {
                    *existing = new;
                    true
                } else {
                    false
                }
            }
            DefinitionSet::Many(entries) => {
                for existing in entries.iter_mut() {
                    if existing.same_entry(old) {
                        *existing = new;
                        return true;
                    }
                }
                false
            }
        }
    }

    pub fn contains(&self, entry: &DefEntry) -> bool {
        self.entries().iter().any(|existing| existing.same_entry(entry))
    }
}
