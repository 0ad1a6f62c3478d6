//! Per-(scope, project) lookup memoization.
//!
//! Each inner cache sits in its own advisory slot, so the host can evict any
//! subset under memory pressure without touching the others; everything here
//! is recomputable from the scopes and stores. Map publication is
//! put-if-absent: concurrent callers may duplicate a computation, but one
//! result wins and both observe it, which is sound because the underlying
//! algorithm is deterministic for fixed inputs.

use std::sync::Arc;

use dashmap::DashMap;
use rustc_hash::FxBuildHasher;

use sable_common::{Advisory, Multiname, Namespace, NamespaceSet};
use sable_defs::{ConstValue, DefRef};

/// A memoized lookup outcome. "Not found" is a first-class cached value,
/// distinct from "never computed"; ambiguous results are never cached.
#[derive(Clone, Debug)]
pub enum CachedLookup {
    NotFound,
    Found(DefRef),
}

/// Cache key for qualified lookups.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct QualifiedKey {
    pub namespace: Namespace,
    pub name: Arc<str>,
}

/// Keys a per-definition cache entry by definition identity. Holds the
/// definition alive, so an address is never reused while cached.
#[derive(Clone)]
struct DefKey(DefRef);

impl PartialEq for DefKey {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for DefKey {}

impl std::hash::Hash for DefKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.0), state);
    }
}

type LookupMap<K> = DashMap<K, CachedLookup, FxBuildHasher>;

pub struct ScopeCache {
    find_prop: Advisory<LookupMap<Arc<str>>>,
    qualified: Advisory<LookupMap<QualifiedKey>>,
    multiname: Advisory<LookupMap<Multiname>>,
    namespaces_for_name: Advisory<DashMap<Arc<str>, Arc<NamespaceSet>, FxBuildHasher>>,
    /// `Some(None)` in the map means "computed: no constant value", the
    /// sentinel that keeps absence distinguishable from a cold slot.
    const_values: Advisory<DashMap<DefKey, Option<ConstValue>, FxBuildHasher>>,
    open_namespaces: Advisory<NamespaceSet>,
    resolved_interfaces: Advisory<Vec<DefRef>>,
    needs_dispatcher: Advisory<bool>,
}

fn new_map<K: std::hash::Hash + Eq, V>() -> DashMap<K, V, FxBuildHasher> {
    DashMap::with_hasher(FxBuildHasher)
}

impl ScopeCache {
    pub fn new() -> Self {
        ScopeCache {
            find_prop: Advisory::new(),
            qualified: Advisory::new(),
            multiname: Advisory::new(),
            namespaces_for_name: Advisory::new(),
            const_values: Advisory::new(),
            open_namespaces: Advisory::new(),
            resolved_interfaces: Advisory::new(),
            needs_dispatcher: Advisory::new(),
        }
    }

    pub fn lookup_name(&self, name: &str) -> Option<CachedLookup> {
        self.find_prop.get()?.get(name).map(|entry| entry.value().clone())
    }

    /// Publishes with put-if-absent semantics and returns the winning value.
    pub fn store_name(&self, name: &str, value: CachedLookup) -> CachedLookup {
        let map = self.find_prop.get_or_init(new_map);
        map.entry(Arc::from(name)).or_insert(value).value().clone()
    }

    pub fn lookup_qualified(&self, namespace: &Namespace, name: &str) -> Option<CachedLookup> {
        let key = QualifiedKey { namespace: namespace.clone(), name: Arc::from(name) };
        self.qualified.get()?.get(&key).map(|entry| entry.value().clone())
    }

    pub fn store_qualified(
        &self,
        namespace: &Namespace,
        name: &str,
        value: CachedLookup,
    ) -> CachedLookup {
        let map = self.qualified.get_or_init(new_map);
        let key = QualifiedKey { namespace: namespace.clone(), name: Arc::from(name) };
        map.entry(key).or_insert(value).value().clone()
    }

    pub fn lookup_multiname(&self, multiname: &Multiname) -> Option<CachedLookup> {
        self.multiname.get()?.get(multiname).map(|entry| entry.value().clone())
    }

    pub fn store_multiname(&self, multiname: &Multiname, value: CachedLookup) -> CachedLookup {
        let map = self.multiname.get_or_init(new_map);
        map.entry(multiname.clone()).or_insert(value).value().clone()
    }

    pub fn namespaces_for_name<F: FnOnce() -> NamespaceSet>(
        &self,
        name: &str,
        compute: F,
    ) -> Arc<NamespaceSet> {
        let map = self.namespaces_for_name.get_or_init(new_map);
        if let Some(cached) = map.get(name) {
            return cached.value().clone();
        }
        let fresh = Arc::new(compute());
        map.entry(Arc::from(name)).or_insert(fresh).value().clone()
    }

    /// Memoized compile-time constant evaluation for one definition.
    pub fn constant_value<F: FnOnce() -> Option<ConstValue>>(
        &self,
        def: &DefRef,
        compute: F,
    ) -> Option<ConstValue> {
        let map = self.const_values.get_or_init(new_map);
        let key = DefKey(Arc::clone(def));
        if let Some(cached) = map.get(&key) {
            return cached.value().clone();
        }
        let fresh = compute();
        map.entry(key).or_insert(fresh).value().clone()
    }

    pub fn open_namespaces<F: FnOnce() -> NamespaceSet>(&self, compute: F) -> Arc<NamespaceSet> {
        self.open_namespaces.get_or_init(compute)
    }

    pub fn resolved_interfaces<F: FnOnce() -> Vec<DefRef>>(&self, compute: F) -> Arc<Vec<DefRef>> {
        self.resolved_interfaces.get_or_init(compute)
    }

    pub fn needs_dispatcher<F: FnOnce() -> bool>(&self, compute: F) -> bool {
        *self.needs_dispatcher.get_or_init(compute)
    }

    /// Drops every cached value. Used when the host reacts to memory
    /// pressure or invalidates a scope wholesale.
    pub fn evict_all(&self) {
        self.find_prop.evict();
        self.qualified.evict();
        self.multiname.evict();
        self.namespaces_for_name.evict();
        self.const_values.evict();
        self.open_namespaces.evict();
        self.resolved_interfaces.evict();
        self.needs_dispatcher.evict();
    }
}

impl Default for ScopeCache {
    fn default() -> Self {
        Self::new()
    }
}
