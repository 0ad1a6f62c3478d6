use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use sable_common::{DefinitionPriority, Namespace, Qname, UnitId};
use sable_defs::{CompilationUnit, DefRef, Definition, DefinitionPromise};

struct FakeUnit {
    id: UnitId,
    loads: AtomicUsize,
    fail_next: AtomicBool,
}

impl FakeUnit {
    fn new() -> Arc<dyn CompilationUnit> {
        Arc::new(FakeUnit {
            id: UnitId(1),
            loads: AtomicUsize::new(0),
            fail_next: AtomicBool::new(false),
        })
    }
}

impl CompilationUnit for FakeUnit {
    fn id(&self) -> UnitId {
        self.id
    }

    fn priority(&self) -> DefinitionPriority {
        DefinitionPriority::source(1)
    }

    fn load_definition(&self, qname: &Qname) -> anyhow::Result<Option<DefRef>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.fail_next.swap(false, Ordering::SeqCst) {
            anyhow::bail!("interrupted");
        }
        Ok(Some(
            Definition::class(
                qname.package(),
                qname.base_name(),
                Namespace::package_public(qname.package()),
                None,
                Vec::new(),
            )
            .build(),
        ))
    }
}

#[test]
fn test_materialize_parses_once_and_caches() {
    let unit = FakeUnit::new();
    let promise = DefinitionPromise::new(Qname::from_dotted("pkg.A"), &unit);
    assert!(promise.peek().is_none());

    let first = promise.materialize().unwrap();
    let second = promise.materialize().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.base_name(), "A");
    assert_eq!(promise.peek().map(|d| d.base_name().to_string()), Some("A".into()));
}

#[test]
fn test_failed_materialization_is_retryable() {
    let failing: Arc<FakeUnit> = Arc::new(FakeUnit {
        id: UnitId(2),
        loads: AtomicUsize::new(0),
        fail_next: AtomicBool::new(true),
    });
    let failing_dyn: Arc<dyn CompilationUnit> = failing.clone();
    let promise = DefinitionPromise::new(Qname::from_dotted("pkg.C"), &failing_dyn);
    // The failed attempt must not poison the promise.
    assert!(promise.materialize().is_none());
    assert!(promise.peek().is_none());
    // The retry succeeds.
    assert!(promise.materialize().is_some());
    assert_eq!(failing.loads.load(Ordering::SeqCst), 2);
}

#[test]
fn test_dropped_unit_degrades_to_absent() {
    let unit = FakeUnit::new();
    let promise = DefinitionPromise::new(Qname::from_dotted("pkg.D"), &unit);
    drop(unit);
    assert!(promise.materialize().is_none());
}

#[test]
fn test_promise_namespace_is_package_public() {
    let unit = FakeUnit::new();
    let promise = DefinitionPromise::new(Qname::from_dotted("pkg.sub.E"), &unit);
    assert_eq!(*promise.namespace(), Namespace::package_public("pkg.sub"));
    assert_eq!(promise.base_name(), "E");
}
