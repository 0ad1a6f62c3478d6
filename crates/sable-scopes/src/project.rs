//! The project scope: the cross-file symbol table.
//!
//! One visible definition per qualified name at any time; lower-priority
//! contributions for the same qualified name wait in a shadow set and are
//! promoted when the visible one is removed. Slots may hold promises, which
//! stay opaque until a lookup actually needs the definition behind them.
//!
//! All bookkeeping lives behind one readers-writer lock. Promise
//! materialization deliberately releases that lock around the (potentially
//! slow, reentrant) parse and re-checks the slot by identity before
//! committing, so a parse never blocks unrelated readers and never deadlocks
//! against file-scope construction reading the project back.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::debug;

use sable_common::{
    DefinitionPriority, DependencySink, Namespace, NamespaceSet, NullSink, Qname, UnitId,
};
use sable_defs::{
    CompilationUnit, DefEntry, DefRef, DefaultPolicy, DefinitionPromise, DefinitionStore,
    DisambiguationPolicy,
};

use crate::scope::{Scope, scope_handle};

static NEXT_PROJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Well-known definitions consulted on hot paths. Each gets a dedicated
/// slot filled when its definition becomes visible and cleared when it is
/// removed, bypassing the symbol-table walk entirely.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuiltinKind {
    Object,
    String,
    Array,
    Boolean,
    Int,
    Uint,
    Number,
    Class,
    Function,
    Namespace,
    Vector,
    Xml,
    XmlList,
    Undefined,
}

impl BuiltinKind {
    const COUNT: usize = 14;

    pub fn qname(self) -> Qname {
        let (package, base) = match self {
            BuiltinKind::Object => ("", "Object"),
            BuiltinKind::String => ("", "String"),
            BuiltinKind::Array => ("", "Array"),
            BuiltinKind::Boolean => ("", "Boolean"),
            BuiltinKind::Int => ("", "int"),
            BuiltinKind::Uint => ("", "uint"),
            BuiltinKind::Number => ("", "Number"),
            BuiltinKind::Class => ("", "Class"),
            BuiltinKind::Function => ("", "Function"),
            BuiltinKind::Namespace => ("", "Namespace"),
            BuiltinKind::Vector => ("__AS3__.vec", "Vector"),
            BuiltinKind::Xml => ("", "XML"),
            BuiltinKind::XmlList => ("", "XMLList"),
            BuiltinKind::Undefined => ("", "undefined"),
        };
        Qname::new(package, base)
    }

    fn from_qname(qname: &Qname) -> Option<BuiltinKind> {
        let kind = match (qname.package(), qname.base_name()) {
            ("", "Object") => BuiltinKind::Object,
            ("", "String") => BuiltinKind::String,
            ("", "Array") => BuiltinKind::Array,
            ("", "Boolean") => BuiltinKind::Boolean,
            ("", "int") => BuiltinKind::Int,
            ("", "uint") => BuiltinKind::Uint,
            ("", "Number") => BuiltinKind::Number,
            ("", "Class") => BuiltinKind::Class,
            ("", "Function") => BuiltinKind::Function,
            ("", "Namespace") => BuiltinKind::Namespace,
            ("__AS3__.vec", "Vector") => BuiltinKind::Vector,
            ("", "XML") => BuiltinKind::Xml,
            ("", "XMLList") => BuiltinKind::XmlList,
            ("", "undefined") => BuiltinKind::Undefined,
            _ => return None,
        };
        Some(kind)
    }
}

struct ProjectState {
    /// Visible definitions, keyed by base name like any other store.
    store: DefinitionStore,
    /// Lower-priority contributions per qualified name.
    shadows: FxHashMap<Qname, SmallVec<[DefEntry; 2]>>,
    units: FxHashMap<UnitId, Arc<dyn CompilationUnit>>,
    /// Everything each unit contributed, for batch removal.
    unit_definitions: FxHashMap<UnitId, Vec<DefEntry>>,
    unit_scopes: FxHashMap<UnitId, Vec<Arc<Scope>>>,
    builtins: [Option<DefRef>; BuiltinKind::COUNT],
}

impl ProjectState {
    fn new() -> Self {
        ProjectState {
            store: DefinitionStore::new(),
            shadows: FxHashMap::default(),
            units: FxHashMap::default(),
            unit_definitions: FxHashMap::default(),
            unit_scopes: FxHashMap::default(),
            builtins: [const { None }; BuiltinKind::COUNT],
        }
    }

    fn priority_of(&self, entry: &DefEntry) -> Option<DefinitionPriority> {
        let unit = match entry {
            DefEntry::Definition(def) => def.unit(),
            DefEntry::Promise(promise) => promise.unit_id(),
        };
        unit.and_then(|id| self.units.get(&id)).map(|unit| unit.priority())
    }

    fn update_builtin_slot(&mut self, qname: &Qname) {
        let Some(kind) = BuiltinKind::from_qname(qname) else {
            return;
        };
        let visible = self
            .store
            .get(qname.base_name())
            .and_then(|set| {
                set.entries().iter().find(|entry| entry_qname(entry) == *qname).cloned()
            })
            .and_then(|entry| entry.as_definition().cloned());
        self.builtins[kind as usize] = visible;
    }

    /// The visible entry for a fully-qualified name, by value equality.
    fn visible_entry(&self, qname: &Qname) -> Option<DefEntry> {
        self.store
            .get(qname.base_name())?
            .entries()
            .iter()
            .find(|entry| entry_qname(entry) == *qname)
            .cloned()
    }
}

fn entry_qname(entry: &DefEntry) -> Qname {
    match entry {
        DefEntry::Definition(def) => def.qname().clone(),
        DefEntry::Promise(promise) => promise.qname().clone(),
    }
}

/// The project-wide symbol table plus per-project resolution policy.
pub struct ProjectScope {
    id: u64,
    /// A marker scope serving as the containing scope of project-level
    /// definitions. Has no parent and no storage of its own.
    root: Arc<Scope>,
    state: RwLock<ProjectState>,
    sink: Arc<dyn DependencySink>,
    policy: Arc<dyn DisambiguationPolicy>,
    global_use_namespaces: RwLock<Vec<Namespace>>,
    /// Instantiated parameterized types, keyed by (base, argument). A
    /// separate lock so specialization construction never contends with
    /// symbol-table traffic.
    specializations: Mutex<FxHashMap<(Qname, Qname), DefRef>>,
}

fn read_state(lock: &RwLock<ProjectState>) -> RwLockReadGuard<'_, ProjectState> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn write_state(lock: &RwLock<ProjectState>) -> RwLockWriteGuard<'_, ProjectState> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn lock_specializations(
    lock: &Mutex<FxHashMap<(Qname, Qname), DefRef>>,
) -> MutexGuard<'_, FxHashMap<(Qname, Qname), DefRef>> {
    match lock.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl ProjectScope {
    pub fn new(sink: Arc<dyn DependencySink>, policy: Arc<dyn DisambiguationPolicy>) -> Self {
        ProjectScope {
            id: NEXT_PROJECT_ID.fetch_add(1, Ordering::Relaxed),
            root: Scope::new_project_marker(),
            state: RwLock::new(ProjectState::new()),
            sink,
            policy,
            global_use_namespaces: RwLock::new(Vec::new()),
            specializations: Mutex::new(FxHashMap::default()),
        }
    }

    /// A project with no dependency tracking and the default ambiguity
    /// policy (two-way ties stay ambiguous).
    pub fn new_default() -> Self {
        ProjectScope::new(Arc::new(NullSink), Arc::new(DefaultPolicy))
    }

    /// Stable identity for per-scope cache keying.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn sink(&self) -> &dyn DependencySink {
        self.sink.as_ref()
    }

    pub fn policy(&self) -> &dyn DisambiguationPolicy {
        self.policy.as_ref()
    }

    /// The marker scope recorded as the containing scope of project-level
    /// definitions.
    pub fn root_scope(&self) -> &Arc<Scope> {
        &self.root
    }

    pub fn add_global_use_namespace(&self, namespace: Namespace) {
        match self.global_use_namespaces.write() {
            Ok(mut guard) => guard.push(namespace),
            Err(poisoned) => poisoned.into_inner().push(namespace),
        }
    }

    /// Namespaces opened by `use namespace` directives at project
    /// configuration level, visible from every scope.
    pub fn global_use_namespaces(&self) -> Vec<Namespace> {
        match self.global_use_namespaces.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn register_unit(&self, unit: Arc<dyn CompilationUnit>) {
        let mut state = write_state(&self.state);
        state.units.insert(unit.id(), unit);
    }

    /// Records a scope as contributed by a unit, for batch removal.
    pub fn add_scope_for_unit(&self, unit: UnitId, scope: &Arc<Scope>) {
        let mut state = write_state(&self.state);
        state.unit_scopes.entry(unit).or_default().push(Arc::clone(scope));
    }

    pub fn scopes_for_unit(&self, unit: UnitId) -> Vec<Arc<Scope>> {
        let state = read_state(&self.state);
        state.unit_scopes.get(&unit).cloned().unwrap_or_default()
    }

    /// Adds a definition or promise. If a definition with the same qualified
    /// name is already visible, the higher-priority one stays visible and
    /// the other joins the shadow set. Ties keep the incumbent.
    pub fn add_definition(&self, entry: impl Into<DefEntry>) {
        let entry = entry.into();
        let qname = entry_qname(&entry);
        if let DefEntry::Definition(def) = &entry {
            def.set_containing_scope(Some(scope_handle(&self.root)));
        }
        let mut state = write_state(&self.state);
        if let Some(unit_id) = entry_unit(&entry) {
            state.unit_definitions.entry(unit_id).or_default().push(entry.clone());
        }
        match state.visible_entry(&qname) {
            None => {
                state.store.add(entry);
                state.update_builtin_slot(&qname);
            }
            Some(existing) => {
                let incoming = state.priority_of(&entry);
                let incumbent = state.priority_of(&existing);
                if incoming > incumbent {
                    debug!(qname = %qname, "shadowing lower-priority definition");
                    state.store.replace(&existing, entry);
                    state.shadows.entry(qname.clone()).or_default().push(existing);
                    state.update_builtin_slot(&qname);
                } else {
                    state.shadows.entry(qname).or_default().push(entry);
                }
            }
        }
    }

    /// Removes by identity. Removing the visible entry promotes the
    /// highest-priority shadow; removing a shadowed entry just deletes it.
    /// Returns whether the entry was present anywhere.
    pub fn remove_definition(&self, entry: &DefEntry) -> bool {
        let mut state = write_state(&self.state);
        let qname = entry_qname(entry);
        if state.store.remove(entry) {
            if let Some(mut shadowed) = state.shadows.remove(&qname) {
                if let Some(best) =
                    (0..shadowed.len()).max_by_key(|&idx| state.priority_of(&shadowed[idx]))
                {
                    let promoted = shadowed.remove(best);
                    state.store.add(promoted);
                }
                if !shadowed.is_empty() {
                    state.shadows.insert(qname.clone(), shadowed);
                }
            }
            state.update_builtin_slot(&qname);
            return true;
        }
        let Some(shadowed) = state.shadows.get_mut(&qname) else {
            return false;
        };
        let Some(idx) = shadowed.iter().position(|e| e.same_entry(entry)) else {
            return false;
        };
        shadowed.remove(idx);
        if shadowed.is_empty() {
            state.shadows.remove(&qname);
        }
        true
    }

    /// Removes every definition, promise, scope, and unit record
    /// contributed by the given units.
    pub fn remove_units(&self, units: &[UnitId]) {
        let mut contributed: Vec<DefEntry> = Vec::new();
        {
            let mut state = write_state(&self.state);
            for unit in units {
                if let Some(entries) = state.unit_definitions.remove(unit) {
                    contributed.extend(entries);
                }
                state.units.remove(unit);
                state.unit_scopes.remove(unit);
            }
        }
        // Per-entry removal reuses the promotion path, so a surviving
        // shadow from another unit becomes visible where appropriate.
        for entry in &contributed {
            self.remove_definition(entry);
        }
    }

    /// The shadow set for a qualified name, lowest layer of visibility.
    pub fn shadowed_definitions(&self, qname: &Qname) -> Vec<DefEntry> {
        let state = read_state(&self.state);
        state.shadows.get(qname).map(|entries| entries.to_vec()).unwrap_or_default()
    }

    /// Every qualified name known to the project, visible or shadowed.
    /// Never materializes a promise.
    pub fn all_qualified_names(&self) -> Vec<Qname> {
        let state = read_state(&self.state);
        let mut names: Vec<Qname> = Vec::with_capacity(state.store.len());
        for set in state.store.all_sets() {
            names.extend(set.entries().iter().map(entry_qname));
        }
        names.extend(state.shadows.keys().cloned());
        names.sort();
        names.dedup();
        names
    }

    /// The visible definitions for a base name, with any promises among
    /// them materialized first. Read-mostly: the common promise-free case
    /// never takes the write lock.
    pub fn visible_definitions(&self, base_name: &str) -> Vec<DefRef> {
        let promises: Vec<Arc<DefinitionPromise>> = {
            let state = read_state(&self.state);
            let Some(set) = state.store.get(base_name) else {
                return Vec::new();
            };
            let promises: Vec<Arc<DefinitionPromise>> = set
                .entries()
                .iter()
                .filter_map(|entry| match entry {
                    DefEntry::Promise(promise) => Some(Arc::clone(promise)),
                    DefEntry::Definition(_) => None,
                })
                .collect();
            if promises.is_empty() {
                return set
                    .entries()
                    .iter()
                    .filter_map(|entry| entry.as_definition().cloned())
                    .collect();
            }
            promises
        };

        // Materialize outside the lock; parsing may re-enter the project.
        let materialized: Vec<(Arc<DefinitionPromise>, Option<DefRef>)> =
            promises.into_iter().map(|p| { let def = p.materialize(); (p, def) }).collect();

        let mut state = write_state(&self.state);
        for (promise, def) in materialized {
            let Some(def) = def else {
                // Failed parse; the promise stays and may be retried.
                continue;
            };
            let old = DefEntry::Promise(promise);
            // Another thread may have replaced this slot already.
            if state.store.replace(&old, DefEntry::Definition(Arc::clone(&def))) {
                def.set_containing_scope(Some(scope_handle(&self.root)));
                state.update_builtin_slot(def.qname());
            }
        }
        state
            .store
            .get(base_name)
            .map(|set| {
                set.entries().iter().filter_map(|entry| entry.as_definition().cloned()).collect()
            })
            .unwrap_or_default()
    }

    /// Project-scope leg of the chain walk: visible definitions for `name`
    /// whose namespace is in the lookup's namespace set. Contingent
    /// definitions yield to a non-contingent match for the same name.
    pub fn collect_visible(&self, name: &str, set: &NamespaceSet, out: &mut Vec<DefRef>) {
        let mut matches: Vec<DefRef> = self
            .visible_definitions(name)
            .into_iter()
            .filter(|def| set.contains(def.namespace()))
            .collect();
        if matches.iter().any(|def| !def.is_contingent()) {
            matches.retain(|def| !def.is_contingent());
        }
        out.extend(matches);
    }

    /// The visible definition for a fully-qualified name, materializing if
    /// necessary.
    pub fn definition_by_qname(&self, qname: &Qname) -> Option<DefRef> {
        self.visible_definitions(qname.base_name())
            .into_iter()
            .find(|def| def.qname() == qname)
    }

    /// A well-known definition. The slot read is lock-light and
    /// materialization-free; a cold slot falls back to the full qname
    /// lookup, which may materialize a promise.
    pub fn builtin(&self, kind: BuiltinKind) -> Option<DefRef> {
        {
            let state = read_state(&self.state);
            if let Some(def) = &state.builtins[kind as usize] {
                return Some(Arc::clone(def));
            }
        }
        // The slot may be cold because the builtin is still a promise.
        self.definition_by_qname(&kind.qname())
    }

    /// One instantiation per (base, argument) pair, built at most once even
    /// under concurrent first requests.
    pub fn get_or_create_specialization(
        &self,
        base: &Qname,
        argument: &Qname,
        build: impl FnOnce() -> DefRef,
    ) -> DefRef {
        let mut specializations = lock_specializations(&self.specializations);
        if let Some(existing) = specializations.get(&(base.clone(), argument.clone())) {
            return Arc::clone(existing);
        }
        let built = build();
        specializations.insert((base.clone(), argument.clone()), Arc::clone(&built));
        built
    }
}

fn entry_unit(entry: &DefEntry) -> Option<UnitId> {
    match entry {
        DefEntry::Definition(def) => def.unit(),
        DefEntry::Promise(promise) => promise.unit_id(),
    }
}

impl std::fmt::Debug for ProjectScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = read_state(&self.state);
        f.debug_struct("ProjectScope")
            .field("id", &self.id)
            .field("visible_names", &state.store.len())
            .field("shadowed_names", &state.shadows.len())
            .field("units", &state.units.len())
            .finish()
    }
}
