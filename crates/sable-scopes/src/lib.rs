//! Lexical scopes and name resolution for the Sable compiler.
//!
//! The scope chain (file, package, type instance/static views, function,
//! with, catch) stores definitions and answers `find_property`-style
//! lookups; the project scope is the repository-wide symbol table with
//! shadowing and deferred (promised) definitions; the per-scope cache layer
//! memoizes lookups that registered a dependency edge.

// Scope core - the chain node, kinds, imports, local storage
pub mod scope;
pub use scope::{Import, Scope, ScopeKind, TypeView, containing_scope_of, scope_from_handle};

// Open-namespace computation per scope kind
pub mod ns_set;
pub use ns_set::{namespaces_for_name, open_namespaces};

// Type scopes - instance/static views, inheritance fan-out, derived facts
pub mod type_scope;
pub use type_scope::{
    TypeScopes, adjust_namespaces_for_super, class_chain, needs_event_dispatcher,
    resolve_member_access, resolved_interfaces, type_scopes_of,
};

// The lookup engine - findProperty and friends
pub mod lookup;
pub use lookup::Resolution;

// Project scope - symbol table, shadowing, promises, builtins
pub mod project;
pub use project::{BuiltinKind, ProjectScope};

// Per-(scope, project) memoization
pub mod cache;
pub use cache::{CachedLookup, QualifiedKey, ScopeCache};
