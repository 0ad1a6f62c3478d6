//! Qualified names and multinames.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use smallvec::SmallVec;

use crate::namespaces::Namespace;

/// A fully qualified name: package path plus base name.
///
/// `Qname { package: "flash.display", base: "Sprite" }` renders as
/// `flash.display.Sprite`. The top-level package is the empty string.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize)]
pub struct Qname {
    package: Arc<str>,
    base: Arc<str>,
}

impl Qname {
    pub fn new(package: &str, base: &str) -> Self {
        Qname {
            package: Arc::from(package),
            base: Arc::from(base),
        }
    }

    /// Splits a dotted name at its last dot. `"a.b.C"` becomes package
    /// `"a.b"`, base `"C"`; an undotted name lands in the top-level package.
    pub fn from_dotted(dotted: &str) -> Self {
        match dotted.rfind('.') {
            Some(idx) => Qname::new(&dotted[..idx], &dotted[idx + 1..]),
            None => Qname::new("", dotted),
        }
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn base_name(&self) -> &str {
        &self.base
    }

    pub fn base_arc(&self) -> Arc<str> {
        Arc::clone(&self.base)
    }

    pub fn to_dotted(&self) -> String {
        if self.package.is_empty() {
            self.base.to_string()
        } else {
            format!("{}.{}", self.package, self.base)
        }
    }
}

impl fmt::Display for Qname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.package.is_empty() {
            write!(f, "{}", self.base)
        } else {
            write!(f, "{}.{}", self.package, self.base)
        }
    }
}

/// A base name paired with an explicit, small set of candidate namespaces.
/// This is the lookup key for `ns-set::name` style resolution and for the
/// multiname cache.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Multiname {
    namespaces: SmallVec<[Namespace; 4]>,
    base: Arc<str>,
}

impl Multiname {
    pub fn new<I: IntoIterator<Item = Namespace>>(namespaces: I, base: &str) -> Self {
        Multiname {
            namespaces: namespaces.into_iter().collect(),
            base: Arc::from(base),
        }
    }

    pub fn base_name(&self) -> &str {
        &self.base
    }

    pub fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    pub fn contains(&self, namespace: &Namespace) -> bool {
        self.namespaces.contains(namespace)
    }
}
