//! Sable name resolution.
//!
//! The facade over the resolution crates: lexical scopes and the
//! `find_property` lookup family (`sable-scopes`), the definition model and
//! storage (`sable-defs`), and the shared vocabulary types (`sable-common`).
//! Library consumers depend on this crate and pick symbols from the root.

// Tracing subscriber setup for debugging resolution
pub mod tracing_config;
pub use tracing_config::init_tracing;

// Vocabulary - names, namespaces, priorities, dependency sinks
pub use sable_common::{
    Advisory, DefinitionPriority, DependencySink, DependencyType, Multiname, Namespace,
    NamespaceKind, NamespaceSet, NamespaceSetPredicate, NullSink, PriorityBasis, Qname,
    RecordingSink, UnitId, namespace_set,
};

// Definitions - the model, promises, stores, ambiguity policies
pub use sable_defs::{
    ActionScriptPolicy, ClassTraits, CompilationUnit, ConstValue, DefEntry, DefModifiers, DefRef,
    DefaultPolicy, Definition, DefinitionKind, DefinitionPromise, DefinitionSet, DefinitionStore,
    DisambiguationPolicy, InterfaceTraits, resolve_ambiguities, same_definition,
};

// Scopes - the chain, type views, project symbol table, caches
pub use sable_scopes::{
    BuiltinKind, CachedLookup, Import, ProjectScope, Resolution, Scope, ScopeCache, ScopeKind,
    TypeScopes, TypeView, adjust_namespaces_for_super, class_chain, containing_scope_of,
    namespaces_for_name, needs_event_dispatcher, open_namespaces, resolve_member_access,
    resolved_interfaces, type_scopes_of,
};
