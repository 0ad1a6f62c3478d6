//! The scope-chain node.
//!
//! One struct covers every scope kind; the kind tag carries the per-kind
//! payload and the handful of behaviors that differ (namespace contribution,
//! add-definition routing, view filtering) dispatch on it. Type scopes are
//! three nodes sharing one store: a backing node holding all members and two
//! view nodes filtering it by staticness (see `type_scope`).

use std::any::Any;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use dashmap::DashMap;
use rustc_hash::FxBuildHasher;

use sable_common::{Namespace, NamespaceSetPredicate, Qname, UnitId};
use sable_defs::{DefEntry, DefRef, Definition, DefinitionStore};

use crate::cache::ScopeCache;
use crate::project::ProjectScope;

/// An import directive. Named imports open their package's public namespace
/// for the imported base name only; wildcard imports open it for every name.
/// An aliased import resolves only under the alias, never under the target's
/// own base name.
#[derive(Clone, Debug)]
pub enum Import {
    Wildcard { package: Arc<str> },
    Named { target: Qname, alias: Option<Arc<str>> },
}

impl Import {
    /// The namespace this import opens for `name`, if any.
    pub fn namespace_for(&self, name: &str) -> Option<Namespace> {
        match self {
            Import::Wildcard { package } => Some(Namespace::package_public(package)),
            Import::Named { target, alias: None } if target.base_name() == name => {
                Some(Namespace::package_public(target.package()))
            }
            Import::Named { .. } => None,
        }
    }

    /// The qualified name behind an alias matching `name`.
    pub fn alias_target(&self, name: &str) -> Option<&Qname> {
        match self {
            Import::Named { target, alias: Some(alias) } if alias.as_ref() == name => Some(target),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TypeView {
    Instance,
    Static,
}

#[derive(Debug)]
pub enum ScopeKind {
    File {
        path: Arc<str>,
        file_private_ns: Namespace,
        unit: Option<UnitId>,
    },
    Package {
        name: Arc<str>,
        public_ns: Namespace,
        internal_ns: Namespace,
    },
    /// Backing scope of a class or interface; holds all members, static and
    /// instance alike.
    Type { owner: Weak<Definition> },
    /// Staticness-filtered view over a `Type` backing scope.
    View { backing: Arc<Scope>, view: TypeView },
    Function,
    With,
    Catch,
    /// Marker node owned by the project scope; containing scope of
    /// project-level definitions.
    Project,
}

pub struct Scope {
    kind: ScopeKind,
    parent: Weak<Scope>,
    store: RwLock<DefinitionStore>,
    imports: RwLock<Vec<Import>>,
    use_namespaces: RwLock<Vec<Namespace>>,
    caches: DashMap<u64, Arc<ScopeCache>, FxBuildHasher>,
}

fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl Scope {
    fn with_kind(kind: ScopeKind, parent: Option<&Arc<Scope>>) -> Arc<Scope> {
        Arc::new(Scope {
            kind,
            parent: parent.map_or_else(Weak::new, Arc::downgrade),
            store: RwLock::new(DefinitionStore::new()),
            imports: RwLock::new(Vec::new()),
            use_namespaces: RwLock::new(Vec::new()),
            caches: DashMap::with_hasher(FxBuildHasher),
        })
    }

    /// A file scope. Synthesizes the file-private namespace from the source
    /// basename and installs the implicit vector import.
    pub fn new_file(path: &str, unit: Option<UnitId>) -> Arc<Scope> {
        let basename = path.rsplit('/').next().unwrap_or(path);
        let scope = Scope::with_kind(
            ScopeKind::File {
                path: Arc::from(path),
                file_private_ns: Namespace::file_private(basename),
                unit,
            },
            None,
        );
        scope.add_import(Import::Named {
            target: Qname::new("__AS3__.vec", "Vector"),
            alias: None,
        });
        scope
    }

    pub fn new_package(parent: &Arc<Scope>, name: &str) -> Arc<Scope> {
        Scope::with_kind(
            ScopeKind::Package {
                name: Arc::from(name),
                public_ns: Namespace::package_public(name),
                internal_ns: Namespace::package_internal(name),
            },
            Some(parent),
        )
    }

    pub fn new_function(parent: &Arc<Scope>) -> Arc<Scope> {
        Scope::with_kind(ScopeKind::Function, Some(parent))
    }

    pub fn new_with(parent: &Arc<Scope>) -> Arc<Scope> {
        Scope::with_kind(ScopeKind::With, Some(parent))
    }

    pub fn new_catch(parent: &Arc<Scope>) -> Arc<Scope> {
        Scope::with_kind(ScopeKind::Catch, Some(parent))
    }

    pub(crate) fn new_type_backing(parent: Option<&Arc<Scope>>, owner: &DefRef) -> Arc<Scope> {
        Scope::with_kind(ScopeKind::Type { owner: Arc::downgrade(owner) }, parent)
    }

    pub(crate) fn new_view(
        backing: &Arc<Scope>,
        view: TypeView,
        parent: Option<&Arc<Scope>>,
    ) -> Arc<Scope> {
        Scope::with_kind(ScopeKind::View { backing: Arc::clone(backing), view }, parent)
    }

    pub(crate) fn new_project_marker() -> Arc<Scope> {
        Scope::with_kind(ScopeKind::Project, None)
    }

    pub fn kind(&self) -> &ScopeKind {
        &self.kind
    }

    pub fn parent(&self) -> Option<Arc<Scope>> {
        self.parent.upgrade()
    }

    pub fn is_with_scope(&self) -> bool {
        matches!(self.kind, ScopeKind::With)
    }

    /// The type definition owning this scope, for type backings and views.
    pub fn owner(&self) -> Option<DefRef> {
        match &self.kind {
            ScopeKind::Type { owner } => owner.upgrade(),
            ScopeKind::View { backing, .. } => backing.owner(),
            _ => None,
        }
    }

    /// The backing store node: the view's backing for views, the scope
    /// itself otherwise.
    pub fn storage_scope(self: &Arc<Scope>) -> Arc<Scope> {
        match &self.kind {
            ScopeKind::View { backing, .. } => Arc::clone(backing),
            _ => Arc::clone(self),
        }
    }

    /// The compilation unit this scope belongs to: the one recorded on the
    /// file scope at the chain root.
    pub fn owning_unit(self: &Arc<Scope>) -> Option<UnitId> {
        let mut cur = Some(Arc::clone(self));
        while let Some(scope) = cur {
            if let ScopeKind::File { unit, .. } = scope.kind() {
                return *unit;
            }
            cur = scope.parent();
        }
        None
    }

    /// Inserts a definition and points its containing-scope link back here.
    /// With-scopes forward to their container (a with-block's definitions
    /// belong to the enclosing function); views route to the shared backing
    /// store.
    pub fn add_definition(self: &Arc<Scope>, def: DefRef) {
        match &self.kind {
            ScopeKind::With => {
                if let Some(parent) = self.parent() {
                    parent.add_definition(def);
                }
            }
            ScopeKind::View { backing, .. } => {
                def.set_containing_scope(Some(scope_handle(self)));
                write_lock(&backing.store).add(DefEntry::Definition(def));
            }
            _ => {
                def.set_containing_scope(Some(scope_handle(self)));
                write_lock(&self.store).add(DefEntry::Definition(def));
            }
        }
    }

    /// The catch parameter lives in the catch scope itself, unlike ordinary
    /// definitions appearing inside the block.
    pub fn add_catch_parameter(self: &Arc<Scope>, def: DefRef) {
        debug_assert!(matches!(self.kind, ScopeKind::Catch));
        def.set_containing_scope(Some(scope_handle(self)));
        write_lock(&self.store).add(DefEntry::Definition(def));
    }

    pub fn remove_definition(self: &Arc<Scope>, def: &DefRef) -> bool {
        let target = self.storage_scope();
        let removed = write_lock(&target.store).remove(&DefEntry::Definition(Arc::clone(def)));
        if removed {
            def.set_containing_scope(None);
        }
        removed
    }

    pub fn add_import(&self, import: Import) {
        match &self.kind {
            ScopeKind::View { backing, .. } => backing.add_import(import),
            _ => write_lock(&self.imports).push(import),
        }
    }

    pub fn add_use_namespace(&self, namespace: Namespace) {
        match &self.kind {
            ScopeKind::View { backing, .. } => backing.add_use_namespace(namespace),
            _ => write_lock(&self.use_namespaces).push(namespace),
        }
    }

    pub fn imports(&self) -> Vec<Import> {
        match &self.kind {
            ScopeKind::View { backing, .. } => backing.imports(),
            _ => read_lock(&self.imports).clone(),
        }
    }

    pub fn use_namespaces(&self) -> Vec<Namespace> {
        match &self.kind {
            ScopeKind::View { backing, .. } => backing.use_namespaces(),
            _ => read_lock(&self.use_namespaces).clone(),
        }
    }

    /// Whether this scope adds nothing to its container's open-namespace
    /// set, so namespace computation can skip it entirely.
    pub fn namespace_set_same_as_parent(&self) -> bool {
        let contributes_kind = matches!(
            self.kind,
            ScopeKind::File { .. }
                | ScopeKind::Package { .. }
                | ScopeKind::Type { .. }
                | ScopeKind::View { .. }
        );
        if contributes_kind {
            return false;
        }
        read_lock(&self.imports).is_empty() && read_lock(&self.use_namespaces).is_empty()
    }

    /// Local matches for `name` under the namespace filter. `staticness`
    /// narrows a shared type store to one view; contingent definitions are
    /// dropped whenever a non-contingent match exists.
    pub(crate) fn collect_local(
        &self,
        name: &str,
        predicate: &NamespaceSetPredicate<'_>,
        staticness: Option<bool>,
        out: &mut Vec<DefRef>,
    ) {
        let store = read_lock(&self.store);
        let Some(set) = store.get(name) else {
            return;
        };
        let mut matches: Vec<DefRef> = Vec::new();
        let mut saw_non_contingent = false;
        for entry in set.entries() {
            let Some(def) = entry.as_definition() else {
                continue;
            };
            if let Some(want_static) = staticness {
                if def.is_static() != want_static {
                    continue;
                }
            }
            if !predicate.matches(def.namespace()) {
                continue;
            }
            saw_non_contingent |= !def.is_contingent();
            matches.push(Arc::clone(def));
        }
        if saw_non_contingent {
            matches.retain(|def| !def.is_contingent());
        }
        out.extend(matches);
    }

    /// All definitions stored directly in this scope (views filter by
    /// staticness). Promises are skipped; enumeration never forces a parse.
    pub fn all_local_definitions(self: &Arc<Scope>) -> Vec<DefRef> {
        let staticness = match &self.kind {
            ScopeKind::View { view: TypeView::Instance, .. } => Some(false),
            ScopeKind::View { view: TypeView::Static, .. } => Some(true),
            _ => None,
        };
        let target = self.storage_scope();
        let store = read_lock(&target.store);
        store
            .all_entries()
            .iter()
            .filter_map(|entry| entry.as_definition())
            .filter(|def| staticness.is_none_or(|s| def.is_static() == s))
            .cloned()
            .collect()
    }

    pub(crate) fn store(&self) -> &RwLock<DefinitionStore> {
        &self.store
    }

    /// The per-project lookup cache for this scope, created on first use.
    pub fn cache(&self, project: &ProjectScope) -> Arc<ScopeCache> {
        self.caches
            .entry(project.id())
            .or_insert_with(|| Arc::new(ScopeCache::new()))
            .clone()
    }

    /// Shrinks growable internals once the owning compilation unit's scopes
    /// are finalized.
    pub fn compact(&self) {
        write_lock(&self.store).compact();
        write_lock(&self.imports).shrink_to_fit();
        write_lock(&self.use_namespaces).shrink_to_fit();
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            ScopeKind::File { path, .. } => format!("File({path})"),
            ScopeKind::Package { name, .. } => format!("Package({name})"),
            ScopeKind::Type { .. } => "Type".to_string(),
            ScopeKind::View { view, .. } => format!("View({view:?})"),
            ScopeKind::Function => "Function".to_string(),
            ScopeKind::With => "With".to_string(),
            ScopeKind::Catch => "Catch".to_string(),
            ScopeKind::Project => "Project".to_string(),
        };
        f.debug_struct("Scope")
            .field("kind", &kind)
            .field("names", &read_lock(&self.store).len())
            .finish()
    }
}

/// Weak, type-erased handle to a scope, stored on definitions.
pub fn scope_handle(scope: &Arc<Scope>) -> Weak<dyn Any + Send + Sync> {
    let erased = Arc::clone(scope) as Arc<dyn Any + Send + Sync>;
    Arc::downgrade(&erased)
}

/// Recovers a scope from a definition's type-erased handle.
pub fn scope_from_handle(handle: Arc<dyn Any + Send + Sync>) -> Option<Arc<Scope>> {
    handle.downcast::<Scope>().ok()
}

/// The scope a definition was added to, if it is still alive.
pub fn containing_scope_of(def: &Definition) -> Option<Arc<Scope>> {
    def.containing_scope_handle().and_then(scope_from_handle)
}

/// Identity comparison that treats a view and its backing as the same scope.
pub fn same_scope(a: &Arc<Scope>, b: &Arc<Scope>) -> bool {
    if Arc::ptr_eq(a, b) {
        return true;
    }
    let a_storage = a.storage_scope();
    let b_storage = b.storage_scope();
    Arc::ptr_eq(&a_storage, &b_storage)
}
