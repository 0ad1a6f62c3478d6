//! The lookup engine.
//!
//! `find_property` walks the containing-scope chain from a reference site,
//! filtering each scope's local definitions through the open-namespace set
//! computed at that site, then falls back to the project scope. Qualified
//! and multiname variants swap the filter; everything downstream (the with
//! post-filter, ambiguity arbitration, dependency-edge emission, caching) is
//! shared.

use std::sync::Arc;

use smallvec::SmallVec;
use tracing::debug;

use sable_common::{
    DependencyType, Multiname, Namespace, NamespaceSet, NamespaceSetPredicate, UnitId,
};
use sable_defs::{DefRef, resolve_ambiguities};

use crate::cache::CachedLookup;
use crate::ns_set::namespaces_for_name;
use crate::project::ProjectScope;
use crate::scope::{Scope, ScopeKind, containing_scope_of, same_scope};
use crate::type_scope::collect_for_scope_chain;

/// The outcome of a lookup. Absence and ambiguity are ordinary values; the
/// caller decides whether either deserves a diagnostic.
#[derive(Clone, Debug)]
pub enum Resolution {
    NotFound,
    Found(DefRef),
    /// Two or more equally-visible candidates survived arbitration.
    Ambiguous(SmallVec<[DefRef; 2]>),
}

impl Resolution {
    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Resolution::Ambiguous(_))
    }

    pub fn definition(&self) -> Option<&DefRef> {
        match self {
            Resolution::Found(def) => Some(def),
            _ => None,
        }
    }

    pub fn candidates(&self) -> &[DefRef] {
        match self {
            Resolution::Ambiguous(defs) => defs,
            Resolution::Found(def) => std::slice::from_ref(def),
            Resolution::NotFound => &[],
        }
    }
}

impl From<CachedLookup> for Resolution {
    fn from(cached: CachedLookup) -> Self {
        match cached {
            CachedLookup::NotFound => Resolution::NotFound,
            CachedLookup::Found(def) => Resolution::Found(def),
        }
    }
}

fn dedupe_by_identity(matches: &mut Vec<DefRef>) {
    let mut seen: Vec<*const ()> = Vec::with_capacity(matches.len());
    matches.retain(|def| {
        let ptr = Arc::as_ptr(def).cast::<()>();
        if seen.contains(&ptr) {
            false
        } else {
            seen.push(ptr);
            true
        }
    });
}

/// Shared tail of every lookup: dedupe, arbitrate ambiguity, emit the
/// dependency edge for a successful cross-unit resolution.
pub(crate) fn finalize_matches(
    project: &ProjectScope,
    origin_unit: Option<UnitId>,
    mut matches: Vec<DefRef>,
    dt: Option<DependencyType>,
) -> Resolution {
    dedupe_by_identity(&mut matches);
    let resolved = match matches.len() {
        0 => return Resolution::NotFound,
        1 => matches.remove(0),
        _ => match resolve_ambiguities(&matches, project.policy()) {
            Some(def) => def,
            None => return Resolution::Ambiguous(matches.into_iter().collect()),
        },
    };
    if let (Some(dt), Some(from), Some(to)) = (dt, origin_unit, resolved.unit()) {
        if from != to {
            project.sink().add_dependency(from, to, dt, resolved.qname());
        }
    }
    Resolution::Found(resolved)
}

/// A cached hit is still a resolution: the edge is re-emitted so the same
/// name looked up later under a different dependency type is recorded too.
fn emit_cached_edge(
    project: &ProjectScope,
    origin_unit: Option<UnitId>,
    hit: &CachedLookup,
    dt: Option<DependencyType>,
) {
    if let (CachedLookup::Found(def), Some(dt), Some(from)) = (hit, dt, origin_unit) {
        if let Some(to) = def.unit() {
            if from != to {
                project.sink().add_dependency(from, to, dt, def.qname());
            }
        }
    }
}

/// True when `def` is reachable from `origin` without crossing a with-scope
/// boundary. A with-block's runtime object may shadow any name, so anything
/// beyond the boundary is suppressed unless the caller opts out.
fn filter_with(origin: &Arc<Scope>, def: &DefRef, can_escape_with: bool) -> bool {
    if can_escape_with {
        return true;
    }
    let target = containing_scope_of(def);
    let mut cur = Some(Arc::clone(origin));
    while let Some(scope) = cur {
        if let Some(target) = &target {
            if same_scope(&scope, target) {
                return true;
            }
        }
        if scope.is_with_scope() {
            return false;
        }
        cur = scope.parent();
    }
    true
}

fn chain_lookup(
    origin: &Arc<Scope>,
    project: &ProjectScope,
    name: &str,
    set: &NamespaceSet,
    find_all: bool,
    can_escape_with: bool,
) -> Vec<DefRef> {
    let mut matches: Vec<DefRef> = Vec::new();
    let mut predicate = NamespaceSetPredicate::new(set);
    let mut stopped_at_file_or_package = false;

    let mut cur = Some(Arc::clone(origin));
    while let Some(scope) = cur {
        match scope.kind() {
            ScopeKind::Type { .. } | ScopeKind::View { .. } => {
                collect_for_scope_chain(&scope, project, name, &mut predicate, find_all, &mut matches);
            }
            _ => scope.collect_local(name, &predicate, None, &mut matches),
        }
        if matches.is_empty() {
            // An alias import resolves its target as if the alias had been
            // written qualified.
            for import in scope.imports() {
                if let Some(target) = import.alias_target(name) {
                    if let Some(def) = project.definition_by_qname(target) {
                        // An import only reaches the target package's public
                        // names; internal or private targets stay invisible.
                        if def.namespace() == &Namespace::package_public(target.package()) {
                            matches.push(def);
                        }
                    }
                }
            }
        }
        if !matches.is_empty() && !find_all {
            stopped_at_file_or_package =
                matches!(scope.kind(), ScopeKind::File { .. } | ScopeKind::Package { .. });
            break;
        }
        cur = scope.parent();
    }

    // The project scope can still contribute: always when nothing matched,
    // and also when the match came from a file or package scope, which the
    // project-level symbol table may shadow or extend.
    if matches.is_empty() || find_all || stopped_at_file_or_package {
        project.collect_visible(name, set, &mut matches);
    }

    matches.retain(|def| filter_with(origin, def, can_escape_with));
    matches
}

impl Scope {
    /// Unqualified lookup from this scope, with with-scope containment.
    pub fn find_property(
        self: &Arc<Scope>,
        project: &ProjectScope,
        name: &str,
        dt: Option<DependencyType>,
    ) -> Resolution {
        self.find_property_with(project, name, dt, false)
    }

    /// Unqualified lookup; `can_escape_with` treats with-scope boundaries as
    /// transparent.
    #[tracing::instrument(level = "trace", skip(self, project, dt))]
    pub fn find_property_with(
        self: &Arc<Scope>,
        project: &ProjectScope,
        name: &str,
        dt: Option<DependencyType>,
        can_escape_with: bool,
    ) -> Resolution {
        // Only dependency-tracked lookups may use or fill the cache: cached
        // correctness across incremental builds relies on the edge existing.
        let cache = (dt.is_some() && !can_escape_with).then(|| self.cache(project));
        if let Some(cache) = &cache {
            if let Some(hit) = cache.lookup_name(name) {
                emit_cached_edge(project, self.owning_unit(), &hit, dt);
                return hit.into();
            }
            debug!(name, "find_property cache miss");
        }
        let set = namespaces_for_name(self, project, name);
        let matches = chain_lookup(self, project, name, &set, false, can_escape_with);
        let resolution = finalize_matches(project, self.owning_unit(), matches, dt);
        if let Some(cache) = &cache {
            match &resolution {
                Resolution::NotFound => {
                    return cache.store_name(name, CachedLookup::NotFound).into();
                }
                Resolution::Found(def) => {
                    return cache
                        .store_name(name, CachedLookup::Found(Arc::clone(def)))
                        .into();
                }
                // Ambiguity is never cached; a later edit may resolve it.
                Resolution::Ambiguous(_) => {}
            }
        }
        resolution
    }

    /// Every equally-visible match for `name`, chain and project scope
    /// merged without short-circuiting. Used for ambiguity detection.
    pub fn find_all_properties(
        self: &Arc<Scope>,
        project: &ProjectScope,
        name: &str,
    ) -> Vec<DefRef> {
        let set = namespaces_for_name(self, project, name);
        let mut matches = chain_lookup(self, project, name, &set, true, false);
        dedupe_by_identity(&mut matches);
        matches
    }

    /// Lookup under an explicit qualifier (`ns::name`).
    pub fn find_property_qualified(
        self: &Arc<Scope>,
        project: &ProjectScope,
        qualifier: &Namespace,
        name: &str,
        dt: Option<DependencyType>,
    ) -> Resolution {
        let cache = dt.is_some().then(|| self.cache(project));
        if let Some(cache) = &cache {
            if let Some(hit) = cache.lookup_qualified(qualifier, name) {
                emit_cached_edge(project, self.owning_unit(), &hit, dt);
                return hit.into();
            }
        }
        let mut set = NamespaceSet::default();
        set.insert(qualifier.clone());
        let matches = chain_lookup(self, project, name, &set, false, false);
        let resolution = finalize_matches(project, self.owning_unit(), matches, dt);
        if let Some(cache) = &cache {
            match &resolution {
                Resolution::NotFound => {
                    return cache.store_qualified(qualifier, name, CachedLookup::NotFound).into();
                }
                Resolution::Found(def) => {
                    return cache
                        .store_qualified(qualifier, name, CachedLookup::Found(Arc::clone(def)))
                        .into();
                }
                Resolution::Ambiguous(_) => {}
            }
        }
        resolution
    }

    /// Lookup against an explicit namespace set rather than the open set.
    pub fn find_property_multiname(
        self: &Arc<Scope>,
        project: &ProjectScope,
        multiname: &Multiname,
        dt: Option<DependencyType>,
    ) -> Resolution {
        let cache = dt.is_some().then(|| self.cache(project));
        if let Some(cache) = &cache {
            if let Some(hit) = cache.lookup_multiname(multiname) {
                emit_cached_edge(project, self.owning_unit(), &hit, dt);
                return hit.into();
            }
        }
        let set: NamespaceSet = multiname.namespaces().iter().cloned().collect();
        let matches = chain_lookup(self, project, multiname.base_name(), &set, false, false);
        let resolution = finalize_matches(project, self.owning_unit(), matches, dt);
        if let Some(cache) = &cache {
            match &resolution {
                Resolution::NotFound => {
                    return cache.store_multiname(multiname, CachedLookup::NotFound).into();
                }
                Resolution::Found(def) => {
                    return cache
                        .store_multiname(multiname, CachedLookup::Found(Arc::clone(def)))
                        .into();
                }
                Resolution::Ambiguous(_) => {}
            }
        }
        resolution
    }
}
