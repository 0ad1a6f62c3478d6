//! Common types for the Sable compiler's name-resolution core.
//!
//! This crate provides foundational types used across the resolution crates:
//! - Namespaces and namespace sets (`Namespace`, `NamespaceSet`, `NamespaceSetPredicate`)
//! - Qualified and multi-namespace names (`Qname`, `Multiname`)
//! - Dependency-edge plumbing (`DependencyType`, `DependencySink`, `UnitId`)
//! - Compilation-unit priorities for shadow arbitration (`DefinitionPriority`)
//! - The advisory (evictable, recomputable) cache slot (`Advisory`)

// Namespaces - visibility qualifiers and open-namespace sets
pub mod namespaces;
pub use namespaces::{Namespace, NamespaceKind, NamespaceSet, NamespaceSetPredicate, namespace_set};

// Names - qualified names and multinames
pub mod names;
pub use names::{Multiname, Qname};

// Dependency edges emitted when a resolution crosses a compilation-unit boundary
pub mod dependencies;
pub use dependencies::{DependencySink, DependencyType, NullSink, RecordingSink, UnitId};

// Compilation-unit priority ordering for project-scope shadowing
pub mod priority;
pub use priority::{DefinitionPriority, PriorityBasis};

// Advisory cache slot - evictable at any time, always recomputable
pub mod advisory;
pub use advisory::Advisory;
