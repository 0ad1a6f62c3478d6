//! The definition model.
//!
//! Content is immutable after construction; the only mutable state is the
//! containing-scope back-link, set when a definition is added to a scope and
//! re-set if its source is reparsed. The back-link is stored as a type-erased
//! weak handle so this crate does not depend on the scope crate; the scope
//! crate downcasts it back.

use std::any::Any;
use std::sync::{Arc, RwLock, Weak};

use bitflags::bitflags;
use once_cell::sync::OnceCell;

use sable_common::{Namespace, Qname, UnitId};

use crate::const_value::ConstValue;

/// Shared, thread-safe reference to a definition. Identity (pointer)
/// comparison is the definition's identity; see [`same_definition`].
pub type DefRef = Arc<Definition>;

/// Type-erased handle to the scope graph. The scope crate owns the concrete
/// type and downcasts on access.
pub type ScopeHandle = Weak<dyn Any + Send + Sync>;

bitflags! {
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
    pub struct DefModifiers: u16 {
        const STATIC = 1 << 0;
        /// Conditionally-present member; excluded when a non-contingent
        /// definition with the same base name exists in the same set.
        const CONTINGENT = 1 << 1;
        /// Synthesized rather than written in source (e.g. `this`, `super`).
        const IMPLICIT = 1 << 2;
        /// Member participates in change notification; drives the
        /// needs-dispatcher sweep.
        const BINDABLE = 1 << 3;
        const OVERRIDE = 1 << 4;
        const FINAL = 1 << 5;
        const DYNAMIC = 1 << 6;
        const NATIVE = 1 << 7;
    }
}

/// Inheritance facts for a class definition. Base class and interfaces are
/// kept as qualified names and resolved through the project scope on use.
#[derive(Clone, Debug)]
pub struct ClassTraits {
    pub base_class: Option<Qname>,
    pub interfaces: Vec<Qname>,
    pub protected_ns: Namespace,
    pub static_protected_ns: Namespace,
    pub private_ns: Namespace,
}

#[derive(Clone, Debug)]
pub struct InterfaceTraits {
    pub extended: Vec<Qname>,
    pub interface_ns: Namespace,
}

#[derive(Clone, Debug)]
pub enum DefinitionKind {
    Class(ClassTraits),
    Interface(InterfaceTraits),
    Function,
    Getter,
    Setter,
    Variable { is_const: bool },
    /// A namespace definition; resolves to a namespace value.
    Namespace { value: Namespace },
    Package,
}

pub struct Definition {
    qname: Qname,
    namespace: Namespace,
    kind: DefinitionKind,
    modifiers: DefModifiers,
    /// Owning compilation unit, for dependency edges. `None` for synthetic
    /// definitions that belong to no unit.
    unit: Option<UnitId>,
    /// Compile-time constant value, when the initializer was trivially
    /// foldable at construction time.
    const_value: Option<ConstValue>,
    containing_scope: RwLock<Option<ScopeHandle>>,
    /// For class/interface definitions: the type scope built for this type.
    own_scope: OnceCell<Arc<dyn Any + Send + Sync>>,
}

impl Definition {
    pub fn new(kind: DefinitionKind, package: &str, base_name: &str, namespace: Namespace) -> Self {
        Definition {
            qname: Qname::new(package, base_name),
            namespace,
            kind,
            modifiers: DefModifiers::empty(),
            unit: None,
            const_value: None,
            containing_scope: RwLock::new(None),
            own_scope: OnceCell::new(),
        }
    }

    /// A class in `package` with the standard per-class namespaces derived
    /// from its qualified name.
    pub fn class(
        package: &str,
        base_name: &str,
        namespace: Namespace,
        base_class: Option<Qname>,
        interfaces: Vec<Qname>,
    ) -> Self {
        let qname = Qname::new(package, base_name).to_dotted();
        Definition::new(
            DefinitionKind::Class(ClassTraits {
                base_class,
                interfaces,
                protected_ns: Namespace::protected(&qname),
                static_protected_ns: Namespace::static_protected(&qname),
                private_ns: Namespace::private(&qname),
            }),
            package,
            base_name,
            namespace,
        )
    }

    pub fn interface(
        package: &str,
        base_name: &str,
        namespace: Namespace,
        extended: Vec<Qname>,
    ) -> Self {
        let qname = Qname::new(package, base_name).to_dotted();
        Definition::new(
            DefinitionKind::Interface(InterfaceTraits {
                extended,
                interface_ns: Namespace::interface(&qname),
            }),
            package,
            base_name,
            namespace,
        )
    }

    pub fn function(base_name: &str, namespace: Namespace) -> Self {
        Definition::new(DefinitionKind::Function, "", base_name, namespace)
    }

    pub fn variable(base_name: &str, namespace: Namespace) -> Self {
        Definition::new(DefinitionKind::Variable { is_const: false }, "", base_name, namespace)
    }

    pub fn constant(base_name: &str, namespace: Namespace, value: ConstValue) -> Self {
        let mut def =
            Definition::new(DefinitionKind::Variable { is_const: true }, "", base_name, namespace);
        def.const_value = Some(value);
        def
    }

    pub fn with_modifiers(mut self, modifiers: DefModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_unit(mut self, unit: UnitId) -> Self {
        self.unit = Some(unit);
        self
    }

    pub fn with_const_value(mut self, value: ConstValue) -> Self {
        self.const_value = Some(value);
        self
    }

    pub fn build(self) -> DefRef {
        Arc::new(self)
    }

    pub fn base_name(&self) -> &str {
        self.qname.base_name()
    }

    pub fn qname(&self) -> &Qname {
        &self.qname
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn kind(&self) -> &DefinitionKind {
        &self.kind
    }

    pub fn modifiers(&self) -> DefModifiers {
        self.modifiers
    }

    pub fn unit(&self) -> Option<UnitId> {
        self.unit
    }

    pub fn const_value(&self) -> Option<&ConstValue> {
        self.const_value.as_ref()
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.contains(DefModifiers::STATIC)
    }

    pub fn is_contingent(&self) -> bool {
        self.modifiers.contains(DefModifiers::CONTINGENT)
    }

    pub fn is_implicit(&self) -> bool {
        self.modifiers.contains(DefModifiers::IMPLICIT)
    }

    pub fn is_type(&self) -> bool {
        matches!(self.kind, DefinitionKind::Class(_) | DefinitionKind::Interface(_))
    }

    pub fn is_function(&self) -> bool {
        matches!(
            self.kind,
            DefinitionKind::Function | DefinitionKind::Getter | DefinitionKind::Setter
        )
    }

    pub fn class_traits(&self) -> Option<&ClassTraits> {
        match &self.kind {
            DefinitionKind::Class(traits) => Some(traits),
            _ => None,
        }
    }

    pub fn interface_traits(&self) -> Option<&InterfaceTraits> {
        match &self.kind {
            DefinitionKind::Interface(traits) => Some(traits),
            _ => None,
        }
    }

    /// Sets the scope this definition was added to. Re-setting is legal: a
    /// reparse removes and re-adds definitions.
    pub fn set_containing_scope(&self, scope: Option<ScopeHandle>) {
        let mut guard = match self.containing_scope.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = scope;
    }

    pub fn containing_scope_handle(&self) -> Option<Arc<dyn Any + Send + Sync>> {
        let guard = match self.containing_scope.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.as_ref().and_then(|weak| weak.upgrade())
    }

    /// Links a class/interface definition to the type scope built for it.
    /// First write wins; later writes are ignored.
    pub fn link_own_scope(&self, scope: Arc<dyn Any + Send + Sync>) {
        let _ = self.own_scope.set(scope);
    }

    pub fn own_scope_handle(&self) -> Option<&Arc<dyn Any + Send + Sync>> {
        self.own_scope.get()
    }
}

impl std::fmt::Debug for Definition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Definition")
            .field("qname", &self.qname.to_dotted())
            .field("namespace", &self.namespace)
            .field("modifiers", &self.modifiers)
            .finish_non_exhaustive()
    }
}

/// Definition identity is pointer identity, never structural equality: two
/// parses of the same source produce distinct definitions.
pub fn same_definition(a: &DefRef, b: &DefRef) -> bool {
    Arc::ptr_eq(a, b)
}
