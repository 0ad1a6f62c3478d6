//! Definition model and symbol storage for the Sable compiler.
//!
//! A `Definition` is a named, namespace-qualified semantic entity (class,
//! interface, function, variable, namespace, package). Definitions sharing a
//! base name within one scope live in a `DefinitionSet`; a scope's sets live
//! in a `DefinitionStore` that keeps the common 1-8-name case inline and
//! spills to a hash map past that. Project-level entries may be
//! `DefinitionPromise`s, stand-ins materialized on demand from their owning
//! compilation unit.

// Definition - the semantic entity itself
pub mod definition;
pub use definition::{
    ClassTraits, DefModifiers, DefRef, Definition, DefinitionKind, InterfaceTraits, ScopeHandle,
    same_definition,
};

// Compile-time constant values
pub mod const_value;
pub use const_value::ConstValue;

// Promises - deferred definitions materialized from their compilation unit
pub mod promise;
pub use promise::{CompilationUnit, DefinitionPromise};

// Sets and the growable small-map store
pub mod def_set;
pub use def_set::{DefEntry, DefinitionSet};
pub mod store;
pub use store::DefinitionStore;

// Ambiguity arbitration heuristics
pub mod ambiguity;
pub use ambiguity::{ActionScriptPolicy, DefaultPolicy, DisambiguationPolicy, resolve_ambiguities};
