//! Dependency-edge plumbing.
//!
//! When a lookup performed on behalf of one compilation unit resolves to a
//! definition contributed by another, the resolver must record a dependency
//! edge so incremental recompilation can invalidate the right units. The
//! core only emits edges; storage and queries belong to the host's
//! dependency graph.

use std::sync::Mutex;

use serde::Serialize;

use crate::names::Qname;

/// Identifies one compilation unit within a project. Assigned by the host
/// when the unit is registered with the project scope.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize)]
pub struct UnitId(pub u32);

/// How strongly the `from` unit depends on the `to` unit through a resolved
/// reference. Drives how much of the downstream unit must be rebuilt when
/// the upstream one changes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
pub enum DependencyType {
    /// The reference participates in an extends/implements clause.
    Inheritance,
    /// The reference appears in a signature (parameter, return, field type).
    Signature,
    /// The reference resolves a namespace used in a directive.
    Namespace,
    /// The reference appears in expression position only.
    Expression,
}

/// Receiver for dependency edges. Lookups that were given a
/// `DependencyType` forward one edge per cross-unit resolution; lookups
/// performed with `None` skip both the edge and the cache.
pub trait DependencySink: Send + Sync {
    fn add_dependency(&self, from: UnitId, to: UnitId, dt: DependencyType, qname: &Qname);
}

/// Discards all edges. For hosts that do not track dependencies.
#[derive(Default)]
pub struct NullSink;

impl DependencySink for NullSink {
    fn add_dependency(&self, _from: UnitId, _to: UnitId, _dt: DependencyType, _qname: &Qname) {}
}

/// Records every edge; used by tests to assert that a resolution produced
/// exactly the expected edge.
#[derive(Default)]
pub struct RecordingSink {
    edges: Mutex<Vec<(UnitId, UnitId, DependencyType, Qname)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn edges(&self) -> Vec<(UnitId, UnitId, DependencyType, Qname)> {
        match self.edges.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl DependencySink for RecordingSink {
    fn add_dependency(&self, from: UnitId, to: UnitId, dt: DependencyType, qname: &Qname) {
        if let Ok(mut guard) = self.edges.lock() {
            guard.push((from, to, dt, qname.clone()));
        }
    }
}
