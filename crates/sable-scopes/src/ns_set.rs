//! Open-namespace computation.
//!
//! The set of namespaces open at a point in the chain is the union of each
//! enclosing scope's contribution: implicit per-kind namespaces, `use
//! namespace` directives, and the project's globally-used namespaces. Import
//! directives contribute per looked-up name, so the full per-name set is
//! computed (and cached) separately from the name-independent base set.

use std::sync::Arc;

use sable_common::{Namespace, NamespaceSet};
use sable_defs::DefinitionKind;

use crate::project::ProjectScope;
use crate::scope::{Scope, ScopeKind, TypeView};
use crate::type_scope::class_chain;

/// The name-independent open-namespace set at `scope`. Cached per
/// (scope, project).
pub fn open_namespaces(scope: &Arc<Scope>, project: &ProjectScope) -> Arc<NamespaceSet> {
    scope.cache(project).open_namespaces(|| {
        let mut set = NamespaceSet::default();
        let mut cur = Some(Arc::clone(scope));
        while let Some(s) = cur {
            if !s.namespace_set_same_as_parent() {
                add_implicit_open_namespaces(&s, project, &mut set);
                for ns in s.use_namespaces() {
                    set.insert(ns);
                }
            }
            cur = s.parent();
        }
        for ns in project.global_use_namespaces() {
            set.insert(ns);
        }
        set
    })
}

/// The open-namespace set used to look up `name` from `scope`: the base set
/// plus the namespaces opened for that name by import directives anywhere in
/// the chain. Cached per (scope, name).
pub fn namespaces_for_name(
    scope: &Arc<Scope>,
    project: &ProjectScope,
    name: &str,
) -> Arc<NamespaceSet> {
    scope.cache(project).namespaces_for_name(name, || {
        let mut set = open_namespaces(scope, project).as_ref().clone();
        let mut cur = Some(Arc::clone(scope));
        while let Some(s) = cur {
            for import in s.imports() {
                if let Some(ns) = import.namespace_for(name) {
                    set.insert(ns);
                }
            }
            cur = s.parent();
        }
        set
    })
}

fn add_implicit_open_namespaces(scope: &Arc<Scope>, project: &ProjectScope, set: &mut NamespaceSet) {
    match scope.kind() {
        ScopeKind::File { file_private_ns, .. } => {
            set.insert(file_private_ns.clone());
            // The unnamed top-level package is open in every file.
            set.insert(Namespace::package_public(""));
        }
        ScopeKind::Package { public_ns, internal_ns, .. } => {
            set.insert(public_ns.clone());
            set.insert(internal_ns.clone());
        }
        ScopeKind::Type { .. } => {
            add_type_namespaces(scope, project, set, true, true);
        }
        ScopeKind::View { view, .. } => match view {
            TypeView::Instance => add_type_namespaces(scope, project, set, true, false),
            TypeView::Static => add_type_namespaces(scope, project, set, false, true),
        },
        ScopeKind::Function | ScopeKind::With | ScopeKind::Catch | ScopeKind::Project => {}
    }
}

fn add_type_namespaces(
    scope: &Arc<Scope>,
    project: &ProjectScope,
    set: &mut NamespaceSet,
    instance: bool,
    statics: bool,
) {
    let Some(owner) = scope.owner() else {
        return;
    };
    match owner.kind() {
        DefinitionKind::Class(traits) => {
            // One private namespace serves static and instance members alike.
            set.insert(traits.private_ns.clone());
            if instance {
                set.insert(traits.protected_ns.clone());
            }
            if statics {
                // Static protected is open for the whole base-class chain;
                // the instance protected namespace is instead substituted
                // ancestor-by-ancestor during chain walks.
                for class in class_chain(project, &owner) {
                    if let Some(t) = class.class_traits() {
                        set.insert(t.static_protected_ns.clone());
                    }
                }
            }
        }
        DefinitionKind::Interface(traits) => {
            set.insert(traits.interface_ns.clone());
        }
        _ => {}
    }
}
