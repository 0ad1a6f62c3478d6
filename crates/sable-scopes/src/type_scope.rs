//! Type scopes: the instance/static split and inheritance fan-out.
//!
//! A type's members live in one backing scope; two views filter it by
//! staticness. The static view's containing scope is the type's containing
//! scope and the instance view's containing scope is the static view, so a
//! method body sees instance members, then statics, then the surrounding
//! file or package.
//!
//! Lookup through a type fans out over an ancestor chain that differs per
//! view: the instance chain follows the extends clause, while the static
//! chain is the class-object chain (`C$` extends the *instance* of `Class`,
//! whatever `C` extends).

use std::any::Any;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use tracing::warn;

use sable_common::{DependencyType, NamespaceSet, NamespaceSetPredicate, Qname, UnitId};
use sable_defs::{ClassTraits, DefModifiers, DefRef, DefinitionKind};

use crate::lookup::{Resolution, finalize_matches};
use crate::project::{BuiltinKind, ProjectScope};
use crate::scope::{Scope, ScopeKind, TypeView};

/// The three nodes making up one type's scope: shared backing storage plus
/// the instance and static views.
pub struct TypeScopes {
    pub backing: Arc<Scope>,
    pub instance: Arc<Scope>,
    pub statics: Arc<Scope>,
}

impl TypeScopes {
    /// Builds the scope triple for a class or interface definition and links
    /// it from the definition.
    pub fn build(parent: Option<&Arc<Scope>>, owner: &DefRef) -> Arc<TypeScopes> {
        debug_assert!(owner.is_type());
        let backing = Scope::new_type_backing(parent, owner);
        let statics = Scope::new_view(&backing, TypeView::Static, parent);
        let instance = Scope::new_view(&backing, TypeView::Instance, Some(&statics));
        let scopes = Arc::new(TypeScopes { backing, instance, statics });
        let erased = Arc::clone(&scopes) as Arc<dyn Any + Send + Sync>;
        owner.link_own_scope(erased);
        scopes
    }

    /// Adds a member, pointing its containing scope at the matching view.
    pub fn add_member(&self, def: DefRef) {
        if def.is_static() {
            self.statics.add_definition(def);
        } else {
            self.instance.add_definition(def);
        }
    }
}

/// Recovers the scope triple linked from a type definition.
pub fn type_scopes_of(def: &DefRef) -> Option<Arc<TypeScopes>> {
    let handle = def.own_scope_handle()?;
    Arc::clone(handle).downcast::<TypeScopes>().ok()
}

/// The class and its base classes, nearest first. Unresolvable bases end the
/// chain; inheritance cycles are cut at the repeated type.
pub fn class_chain(project: &ProjectScope, class: &DefRef) -> Vec<DefRef> {
    let mut chain = Vec::new();
    let mut seen: FxHashSet<Qname> = FxHashSet::default();
    let mut cur = Some(Arc::clone(class));
    while let Some(def) = cur {
        if !seen.insert(def.qname().clone()) {
            warn!(qname = %def.qname(), "inheritance cycle detected");
            break;
        }
        let base = def
            .class_traits()
            .and_then(|traits| traits.base_class.clone())
            .and_then(|qname| project.definition_by_qname(&qname));
        chain.push(def);
        cur = base;
    }
    chain
}

/// Every interface a type picks up: its own extends chain for interfaces,
/// the implements clauses and their extends chains for classes.
fn interface_chain(project: &ProjectScope, def: &DefRef) -> Vec<DefRef> {
    let mut out = Vec::new();
    let mut seen: FxHashSet<Qname> = FxHashSet::default();
    let mut work: Vec<Qname> = match def.kind() {
        DefinitionKind::Interface(traits) => {
            seen.insert(def.qname().clone());
            out.push(Arc::clone(def));
            traits.extended.clone()
        }
        DefinitionKind::Class(_) => {
            let mut names = Vec::new();
            for class in class_chain(project, def) {
                if let Some(traits) = class.class_traits() {
                    names.extend(traits.interfaces.iter().cloned());
                }
            }
            names
        }
        _ => Vec::new(),
    };
    while let Some(qname) = work.pop() {
        if !seen.insert(qname.clone()) {
            continue;
        }
        let Some(interface) = project.definition_by_qname(&qname) else {
            continue;
        };
        if let Some(traits) = interface.interface_traits() {
            work.extend(traits.extended.iter().cloned());
        }
        out.push(interface);
    }
    out
}

/// The flattened, resolved interface list for a type. Cached on the type's
/// backing scope.
pub fn resolved_interfaces(project: &ProjectScope, def: &DefRef) -> Arc<Vec<DefRef>> {
    match type_scopes_of(def) {
        Some(scopes) => scopes
            .backing
            .cache(project)
            .resolved_interfaces(|| interface_chain(project, def)),
        None => Arc::new(interface_chain(project, def)),
    }
}

/// Whether the type must grow change-notification support: any bindable
/// instance member anywhere in the class chain. Cached on the backing scope.
pub fn needs_event_dispatcher(project: &ProjectScope, def: &DefRef) -> bool {
    let compute = || {
        for class in class_chain(project, def) {
            let Some(scopes) = type_scopes_of(&class) else {
                continue;
            };
            let bindable = scopes
                .instance
                .all_local_definitions()
                .iter()
                .any(|member| member.modifiers().contains(DefModifiers::BINDABLE));
            if bindable {
                return true;
            }
        }
        false
    };
    match type_scopes_of(def) {
        Some(scopes) => scopes.backing.cache(project).needs_dispatcher(compute),
        None => compute(),
    }
}

/// For a `super` reference from `from`: swap the referencing class's
/// protected namespace for its base class's, leaving everything else open.
pub fn adjust_namespaces_for_super(
    set: &NamespaceSet,
    from: &ClassTraits,
    base: &ClassTraits,
) -> NamespaceSet {
    if !set.contains(&from.protected_ns) {
        return set.clone();
    }
    let mut adjusted: NamespaceSet = set
        .iter()
        .filter(|ns| **ns != from.protected_ns)
        .cloned()
        .collect();
    adjusted.insert(base.protected_ns.clone());
    adjusted
}

/// Which member populations a scope-chain step through a type node searches.
fn view_flags(scope: &Arc<Scope>) -> (bool, bool) {
    match scope.kind() {
        ScopeKind::Type { .. } => (true, true),
        ScopeKind::View { view: TypeView::Instance, .. } => (true, false),
        ScopeKind::View { view: TypeView::Static, .. } => (false, true),
        _ => (false, false),
    }
}

/// Scope-chain fan-out for a type node: instance members across the
/// inheritance chain with protected-namespace substitution, then statics
/// across the chain. Short-circuits on first match unless `find_all`.
pub(crate) fn collect_for_scope_chain(
    scope: &Arc<Scope>,
    project: &ProjectScope,
    name: &str,
    predicate: &mut NamespaceSetPredicate<'_>,
    find_all: bool,
    out: &mut Vec<DefRef>,
) {
    let Some(owner) = scope.owner() else {
        return;
    };
    let (instance, statics) = view_flags(scope);
    let types: Vec<DefRef> = match owner.kind() {
        DefinitionKind::Class(_) => class_chain(project, &owner),
        DefinitionKind::Interface(_) => interface_chain(project, &owner),
        _ => vec![Arc::clone(&owner)],
    };
    let before = out.len();

    if instance {
        // Substitute protected namespaces up the chain only when the
        // reference site had protected access to begin with.
        let need_protected = owner
            .class_traits()
            .is_some_and(|traits| predicate.base_set().contains(&traits.protected_ns));
        for type_def in &types {
            let Some(scopes) = type_scopes_of(type_def) else {
                continue;
            };
            if need_protected {
                let extra = type_def.class_traits().map(|t| t.protected_ns.clone());
                predicate.set_extra(extra);
            }
            scopes.backing.collect_local(name, predicate, Some(false), out);
            if !find_all && out.len() > before {
                predicate.set_extra(None);
                return;
            }
        }
        predicate.set_extra(None);
    }
    if statics {
        for type_def in &types {
            let Some(scopes) = type_scopes_of(type_def) else {
                continue;
            };
            scopes.backing.collect_local(name, predicate, Some(true), out);
            if !find_all && out.len() > before {
                return;
            }
        }
    }
}

/// Member-access resolution (`obj.name` / `Type.name`).
///
/// Instance access searches the inheritance chain's instance members, then
/// falls back to interface members for classes (an unoverridden interface
/// method still resolves). Static access searches the type's own statics,
/// then the instance members of `Class` and its chain.
pub fn resolve_member_access(
    project: &ProjectScope,
    origin_unit: Option<UnitId>,
    type_def: &DefRef,
    name: &str,
    namespace_set: &NamespaceSet,
    statics: bool,
    dt: Option<DependencyType>,
) -> Resolution {
    let mut matches: Vec<DefRef> = Vec::new();
    let mut predicate = NamespaceSetPredicate::new(namespace_set);

    if statics {
        if let Some(scopes) = type_scopes_of(type_def) {
            scopes.backing.collect_local(name, &predicate, Some(true), &mut matches);
        }
        if matches.is_empty() {
            // C$ extends the instance of Class, so fall through to Class's
            // instance members.
            if let Some(class_type) = project.builtin(BuiltinKind::Class) {
                for ancestor in class_chain(project, &class_type) {
                    if let Some(scopes) = type_scopes_of(&ancestor) {
                        scopes.backing.collect_local(name, &predicate, Some(false), &mut matches);
                        if !matches.is_empty() {
                            break;
                        }
                    }
                }
            }
        }
    } else {
        let need_protected = type_def
            .class_traits()
            .is_some_and(|traits| namespace_set.contains(&traits.protected_ns));
        let types: Vec<DefRef> = match type_def.kind() {
            DefinitionKind::Interface(_) => interface_chain(project, type_def),
            _ => class_chain(project, type_def),
        };
        for ancestor in &types {
            let Some(scopes) = type_scopes_of(ancestor) else {
                continue;
            };
            if need_protected {
                let extra = ancestor.class_traits().map(|t| t.protected_ns.clone());
                predicate.set_extra(extra);
            }
            scopes.backing.collect_local(name, &predicate, Some(false), &mut matches);
            if !matches.is_empty() {
                break;
            }
        }
        predicate.set_extra(None);
        if matches.is_empty() && matches!(type_def.kind(), DefinitionKind::Class(_)) {
            // Unoverridden interface members still resolve through the
            // implemented interfaces.
            for interface in interface_chain(project, type_def) {
                if let Some(scopes) = type_scopes_of(&interface) {
                    scopes.backing.collect_local(name, &predicate, Some(false), &mut matches);
                    if !matches.is_empty() {
                        break;
                    }
                }
            }
        }
    }

    finalize_matches(project, origin_unit, matches, dt)
}
