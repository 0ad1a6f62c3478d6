//! Namespaces and namespace sets.
//!
//! Every definition is qualified by exactly one namespace. Unqualified lookup
//! filters candidates against the set of namespaces "open" at the resolving
//! point in the scope chain; qualified lookup filters against a single
//! explicit namespace. Namespaces compare by kind plus URI, and per-class
//! namespaces (private, protected, static-protected) get URIs derived from
//! the owning type's qualified name so that two classes never share one.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;
use serde::Serialize;

/// The flavor of a namespace. Determines how it is synthesized and which
/// scope kinds contribute it to the open set.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
pub enum NamespaceKind {
    /// Package public. URI is the package path ("" for the top-level package).
    Public,
    /// Package internal. Open only inside the owning package.
    Internal,
    /// Per-class private namespace.
    Private,
    /// Per-class protected namespace. Substituted ancestor-by-ancestor when
    /// walking an inheritance chain.
    Protected,
    /// Per-class static protected namespace.
    StaticProtected,
    /// Per-file private namespace for file-level (non-package) definitions.
    FilePrivate,
    /// The implicit namespace all members of an interface live in.
    Interface,
    /// A user-defined namespace (`namespace ns1 = "uri"` / `use namespace`).
    User,
}

#[derive(PartialEq, Eq, Hash, Debug)]
struct NamespaceData {
    kind: NamespaceKind,
    uri: Box<str>,
}

/// A namespace reference. Cheap to clone and to compare; equality is
/// kind + URI, not pointer identity.
#[derive(Clone, Eq, Debug)]
pub struct Namespace {
    data: Arc<NamespaceData>,
}

impl PartialEq for Namespace {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data) || self.data == other.data
    }
}

impl std::hash::Hash for Namespace {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.data.hash(state);
    }
}

impl Serialize for Namespace {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{self}"))
    }
}

impl Namespace {
    fn new(kind: NamespaceKind, uri: impl Into<Box<str>>) -> Self {
        Namespace {
            data: Arc::new(NamespaceData { kind, uri: uri.into() }),
        }
    }

    /// The public namespace of a package. `package_path` is "" for the
    /// unnamed top-level package.
    pub fn package_public(package_path: &str) -> Self {
        Self::new(NamespaceKind::Public, package_path)
    }

    pub fn package_internal(package_path: &str) -> Self {
        Self::new(NamespaceKind::Internal, format!("{package_path}:internal"))
    }

    pub fn private(owner_qname: &str) -> Self {
        Self::new(NamespaceKind::Private, format!("{owner_qname}:private"))
    }

    pub fn protected(owner_qname: &str) -> Self {
        Self::new(NamespaceKind::Protected, format!("{owner_qname}:protected"))
    }

    pub fn static_protected(owner_qname: &str) -> Self {
        Self::new(
            NamespaceKind::StaticProtected,
            format!("{owner_qname}:staticprotected"),
        )
    }

    /// Per-file private namespace. The URI embeds the source basename so
    /// debug output can attribute it.
    pub fn file_private(file_basename: &str) -> Self {
        Self::new(NamespaceKind::FilePrivate, format!("FilePrivateNS:{file_basename}"))
    }

    pub fn interface(interface_qname: &str) -> Self {
        Self::new(NamespaceKind::Interface, interface_qname)
    }

    pub fn user(uri: &str) -> Self {
        Self::new(NamespaceKind::User, uri)
    }

    pub fn kind(&self) -> NamespaceKind {
        self.data.kind
    }

    pub fn uri(&self) -> &str {
        &self.data.uri
    }

    pub fn is_public(&self) -> bool {
        self.data.kind == NamespaceKind::Public
    }

    pub fn is_protected(&self) -> bool {
        self.data.kind == NamespaceKind::Protected
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}(\"{}\")", self.data.kind, self.data.uri)
    }
}

/// The set of namespaces open at some point in a scope chain. Deduplicated,
/// with deterministic iteration order (lookup results must not depend on
/// hash order).
pub type NamespaceSet = IndexSet<Namespace, FxBuildHasher>;

/// Builds a `NamespaceSet` from an iterator of namespaces.
pub fn namespace_set<I: IntoIterator<Item = Namespace>>(namespaces: I) -> NamespaceSet {
    namespaces.into_iter().collect()
}

/// A membership filter over a namespace set, with one "extra" namespace slot.
///
/// The extra slot carries the protected namespace of the type currently being
/// searched during an inheritance walk: the walk replaces it at each ancestor
/// so that the ancestor's own protected members match while the subclass's
/// protected namespace does not leak into the ancestor's scope.
#[derive(Clone, Debug)]
pub struct NamespaceSetPredicate<'a> {
    set: &'a NamespaceSet,
    extra: Option<Namespace>,
}

impl<'a> NamespaceSetPredicate<'a> {
    pub fn new(set: &'a NamespaceSet) -> Self {
        NamespaceSetPredicate { set, extra: None }
    }

    pub fn with_extra(set: &'a NamespaceSet, extra: Namespace) -> Self {
        NamespaceSetPredicate { set, extra: Some(extra) }
    }

    /// Replaces the extra namespace. Called once per ancestor while walking
    /// an inheritance chain.
    pub fn set_extra(&mut self, extra: Option<Namespace>) {
        self.extra = extra;
    }

    pub fn extra(&self) -> Option<&Namespace> {
        self.extra.as_ref()
    }

    pub fn matches(&self, namespace: &Namespace) -> bool {
        self.set.contains(namespace) || self.extra.as_ref() == Some(namespace)
    }

    pub fn base_set(&self) -> &'a NamespaceSet {
        self.set
    }
}
