//! Definition promises.
//!
//! A promise is a project-scope stand-in for a definition whose compilation
//! unit has not been parsed yet. It knows only its qualified name and which
//! unit can produce the real definition. Materialization may parse and may
//! fail; failure degrades to "absent" for that attempt and a later call may
//! retry. Promises are never handed to resolution callers.

use std::sync::{Arc, RwLock, Weak};

use tracing::warn;

use sable_common::{DefinitionPriority, Namespace, Qname, UnitId};

use crate::definition::DefRef;

/// A unit of compilation registered with the project scope: one source file
/// or one library entry. Implementations live in the host; `load_definition`
/// may perform file I/O and parsing and is called without any project-scope
/// lock held.
pub trait CompilationUnit: Send + Sync {
    fn id(&self) -> UnitId;

    /// Priority for shadow arbitration. Must be distinct per unit.
    fn priority(&self) -> DefinitionPriority;

    /// Produces the real definition for a qualified name this unit
    /// contributed. `Ok(None)` means the unit no longer defines the name.
    fn load_definition(&self, qname: &Qname) -> anyhow::Result<Option<DefRef>>;
}

pub struct DefinitionPromise {
    qname: Qname,
    namespace: Namespace,
    unit: Weak<dyn CompilationUnit>,
    materialized: RwLock<Option<DefRef>>,
}

impl DefinitionPromise {
    pub fn new(qname: Qname, unit: &Arc<dyn CompilationUnit>) -> Arc<Self> {
        let namespace = Namespace::package_public(qname.package());
        Arc::new(DefinitionPromise {
            qname,
            namespace,
            unit: Arc::downgrade(unit),
            materialized: RwLock::new(None),
        })
    }

    pub fn qname(&self) -> &Qname {
        &self.qname
    }

    pub fn base_name(&self) -> &str {
        self.qname.base_name()
    }

    /// The namespace the promised definition will be qualified by: the
    /// public namespace of its package.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn unit(&self) -> Option<Arc<dyn CompilationUnit>> {
        self.unit.upgrade()
    }

    pub fn unit_id(&self) -> Option<UnitId> {
        self.unit.upgrade().map(|unit| unit.id())
    }

    /// The already-materialized definition, if a prior call produced one.
    /// Never triggers parsing.
    pub fn peek(&self) -> Option<DefRef> {
        match self.materialized.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Converts the promise to its real definition, parsing on demand.
    /// Returns `None` when the unit is gone, no longer defines the name, or
    /// materialization failed; the promise is not poisoned and a later call
    /// retries.
    pub fn materialize(&self) -> Option<DefRef> {
        if let Some(cached) = self.peek() {
            return Some(cached);
        }
        let unit = self.unit.upgrade()?;
        let loaded = match unit.load_definition(&self.qname) {
            Ok(loaded) => loaded,
            Err(error) => {
                warn!(qname = %self.qname, %error, "promise materialization failed");
                None
            }
        }?;
        let mut guard = match self.materialized.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match guard.as_ref() {
            // Another thread won the race; keep its definition.
            Some(existing) => Some(Arc::clone(existing)),
            None => {
                *guard = Some(Arc::clone(&loaded));
                Some(loaded)
            }
        }
    }
}

impl std::fmt::Debug for DefinitionPromise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefinitionPromise")
            .field("qname", &self.qname.to_dotted())
            .field("materialized", &self.peek().is_some())
            .finish()
    }
}
