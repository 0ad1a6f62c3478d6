//! Project symbol-table behavior: priority shadowing, promotion, promises,
//! builtin slots, unit removal, and specializations.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use sable_common::{DefinitionPriority, Namespace, Qname, UnitId};
use sable_defs::{
    CompilationUnit, DefEntry, DefRef, Definition, DefinitionPromise, same_definition,
};
use sable_scopes::{BuiltinKind, ProjectScope};

/// A compilation unit serving prebuilt definitions, counting parse requests.
struct FakeUnit {
    id: UnitId,
    priority: DefinitionPriority,
    definitions: Vec<DefRef>,
    loads: AtomicUsize,
}

impl FakeUnit {
    fn new(id: u32, priority: DefinitionPriority) -> Self {
        FakeUnit { id: UnitId(id), priority, definitions: Vec::new(), loads: AtomicUsize::new(0) }
    }

    fn with_definition(mut self, def: DefRef) -> Self {
        self.definitions.push(def);
        self
    }

    fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl CompilationUnit for FakeUnit {
    fn id(&self) -> UnitId {
        self.id
    }

    fn priority(&self) -> DefinitionPriority {
        self.priority
    }

    fn load_definition(&self, qname: &Qname) -> anyhow::Result<Option<DefRef>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.definitions.iter().find(|def| def.qname() == qname).cloned())
    }
}

fn class_a(unit: u32) -> DefRef {
    Definition::class("pkg", "A", Namespace::package_public("pkg"), None, Vec::new())
        .with_unit(UnitId(unit))
        .build()
}

#[test]
fn test_higher_priority_definition_wins_either_order() {
    for reverse in [false, true] {
        let project = ProjectScope::new_default();
        let source_unit: Arc<FakeUnit> = Arc::new(FakeUnit::new(1, DefinitionPriority::source(1)));
        let library_unit: Arc<FakeUnit> =
            Arc::new(FakeUnit::new(2, DefinitionPriority::library(1)));
        project.register_unit(source_unit);
        project.register_unit(library_unit);

        let from_source = class_a(1);
        let from_library = class_a(2);
        if reverse {
            project.add_definition(Arc::clone(&from_library));
            project.add_definition(Arc::clone(&from_source));
        } else {
            project.add_definition(Arc::clone(&from_source));
            project.add_definition(Arc::clone(&from_library));
        }

        let visible = project.definition_by_qname(&Qname::new("pkg", "A")).unwrap();
        assert!(same_definition(&visible, &from_source));

        let shadows = project.shadowed_definitions(&Qname::new("pkg", "A"));
        assert_eq!(shadows.len(), 1);
        assert!(same_definition(shadows[0].as_definition().unwrap(), &from_library));
    }
}

#[test]
fn test_removing_visible_promotes_highest_priority_shadow() {
    let project = ProjectScope::new_default();
    for (id, priority) in [
        (1, DefinitionPriority::library(1)),
        (2, DefinitionPriority::library(2)),
        (3, DefinitionPriority::source(1)),
    ] {
        project.register_unit(Arc::new(FakeUnit::new(id, priority)));
    }
    let low = class_a(1);
    let mid = class_a(2);
    let high = class_a(3);
    project.add_definition(Arc::clone(&low));
    project.add_definition(Arc::clone(&mid));
    project.add_definition(Arc::clone(&high));

    let qname = Qname::new("pkg", "A");
    assert!(same_definition(&project.definition_by_qname(&qname).unwrap(), &high));

    assert!(project.remove_definition(&DefEntry::Definition(Arc::clone(&high))));
    // The newer library unit outranks the older one.
    assert!(same_definition(&project.definition_by_qname(&qname).unwrap(), &mid));
    assert_eq!(project.shadowed_definitions(&qname).len(), 1);

    assert!(project.remove_definition(&DefEntry::Definition(Arc::clone(&mid))));
    assert!(same_definition(&project.definition_by_qname(&qname).unwrap(), &low));
    assert!(project.shadowed_definitions(&qname).is_empty());
}

#[test]
fn test_removing_shadow_leaves_visible_untouched() {
    let project = ProjectScope::new_default();
    project.register_unit(Arc::new(FakeUnit::new(1, DefinitionPriority::library(1))));
    project.register_unit(Arc::new(FakeUnit::new(2, DefinitionPriority::source(1))));
    let shadowed = class_a(1);
    let visible = class_a(2);
    project.add_definition(Arc::clone(&shadowed));
    project.add_definition(Arc::clone(&visible));

    let qname = Qname::new("pkg", "A");
    assert!(project.remove_definition(&DefEntry::Definition(Arc::clone(&shadowed))));
    assert!(same_definition(&project.definition_by_qname(&qname).unwrap(), &visible));
    assert!(project.shadowed_definitions(&qname).is_empty());
}

#[test]
fn test_removing_absent_definition_reports_false() {
    let project = ProjectScope::new_default();
    let never_added = class_a(1);
    assert!(!project.remove_definition(&DefEntry::Definition(never_added)));
}

#[test]
fn test_promise_listed_without_materialization() {
    let project = ProjectScope::new_default();
    let def = class_a(1);
    let unit: Arc<FakeUnit> =
        Arc::new(FakeUnit::new(1, DefinitionPriority::library(1)).with_definition(def));
    project.register_unit(Arc::clone(&unit) as Arc<dyn CompilationUnit>);

    let unit_dyn: Arc<dyn CompilationUnit> = Arc::clone(&unit) as Arc<dyn CompilationUnit>;
    let promise = DefinitionPromise::new(Qname::new("pkg", "A"), &unit_dyn);
    project.add_definition(Arc::clone(&promise));

    // Enumeration never forces a parse.
    let names = project.all_qualified_names();
    assert_eq!(names, vec![Qname::new("pkg", "A")]);
    assert_eq!(unit.load_count(), 0);
}

#[test]
fn test_lookup_materializes_promise_exactly_once() {
    let project = ProjectScope::new_default();
    let def = class_a(1);
    let unit: Arc<FakeUnit> = Arc::new(
        FakeUnit::new(1, DefinitionPriority::library(1)).with_definition(Arc::clone(&def)),
    );
    project.register_unit(Arc::clone(&unit) as Arc<dyn CompilationUnit>);

    let unit_dyn: Arc<dyn CompilationUnit> = Arc::clone(&unit) as Arc<dyn CompilationUnit>;
    let promise = DefinitionPromise::new(Qname::new("pkg", "A"), &unit_dyn);
    project.add_definition(promise);

    let resolved = project.definition_by_qname(&Qname::new("pkg", "A")).unwrap();
    assert!(same_definition(&resolved, &def));
    assert_eq!(unit.load_count(), 1);

    // The slot now holds the definition; no further parsing.
    let again = project.definition_by_qname(&Qname::new("pkg", "A")).unwrap();
    assert!(same_definition(&again, &def));
    assert_eq!(unit.load_count(), 1);
}

#[test]
fn test_failed_materialization_leaves_promise_in_place() {
    let project = ProjectScope::new_default();
    // The unit knows no definition for the promised name.
    let unit: Arc<FakeUnit> = Arc::new(FakeUnit::new(1, DefinitionPriority::library(1)));
    project.register_unit(Arc::clone(&unit) as Arc<dyn CompilationUnit>);

    let unit_dyn: Arc<dyn CompilationUnit> = Arc::clone(&unit) as Arc<dyn CompilationUnit>;
    let promise = DefinitionPromise::new(Qname::new("pkg", "Missing"), &unit_dyn);
    project.add_definition(promise);

    assert!(project.definition_by_qname(&Qname::new("pkg", "Missing")).is_none());
    // The name is still known; a later retry is possible.
    assert_eq!(project.all_qualified_names(), vec![Qname::new("pkg", "Missing")]);
}

#[test]
fn test_builtin_slot_tracks_visibility() {
    let project = ProjectScope::new_default();
    project.register_unit(Arc::new(FakeUnit::new(1, DefinitionPriority::library(1))));

    assert!(project.builtin(BuiltinKind::Object).is_none());

    let object = Definition::class("", "Object", Namespace::package_public(""), None, Vec::new())
        .with_unit(UnitId(1))
        .build();
    project.add_definition(Arc::clone(&object));
    assert!(same_definition(&project.builtin(BuiltinKind::Object).unwrap(), &object));

    project.remove_definition(&DefEntry::Definition(Arc::clone(&object)));
    assert!(project.builtin(BuiltinKind::Object).is_none());
}

#[test]
fn test_builtin_qnames_round_trip() {
    assert_eq!(BuiltinKind::Vector.qname(), Qname::new("__AS3__.vec", "Vector"));
    assert_eq!(BuiltinKind::Int.qname(), Qname::new("", "int"));
    assert_eq!(BuiltinKind::Undefined.qname(), Qname::new("", "undefined"));
}

#[test]
fn test_remove_units_sweeps_and_promotes() {
    let project = ProjectScope::new_default();
    project.register_unit(Arc::new(FakeUnit::new(1, DefinitionPriority::library(1))));
    project.register_unit(Arc::new(FakeUnit::new(2, DefinitionPriority::source(1))));

    let from_library = class_a(1);
    let from_source = class_a(2);
    let source_only = Definition::class("pkg", "B", Namespace::package_public("pkg"), None, vec![])
        .with_unit(UnitId(2))
        .build();
    project.add_definition(Arc::clone(&from_library));
    project.add_definition(Arc::clone(&from_source));
    project.add_definition(Arc::clone(&source_only));

    // Dropping the source unit promotes the library's A and erases B.
    project.remove_units(&[UnitId(2)]);

    let visible = project.definition_by_qname(&Qname::new("pkg", "A")).unwrap();
    assert!(same_definition(&visible, &from_library));
    assert!(project.definition_by_qname(&Qname::new("pkg", "B")).is_none());
    assert_eq!(project.all_qualified_names(), vec![Qname::new("pkg", "A")]);
}

#[test]
fn test_specialization_built_once() {
    let project = ProjectScope::new_default();
    let base = Qname::new("__AS3__.vec", "Vector");
    let arg = Qname::new("", "int");

    let mut builds = 0;
    let first = project.get_or_create_specialization(&base, &arg, || {
        builds += 1;
        Definition::class("__AS3__.vec", "Vector$int", Namespace::package_public("__AS3__.vec"), None, vec![])
            .build()
    });
    let second = project.get_or_create_specialization(&base, &arg, || {
        builds += 1;
        Definition::class("__AS3__.vec", "Vector$int", Namespace::package_public("__AS3__.vec"), None, vec![])
            .build()
    });
    assert_eq!(builds, 1);
    assert!(same_definition(&first, &second));
}

#[test]
fn test_scopes_recorded_per_unit() {
    let project = ProjectScope::new_default();
    let file = sable_scopes::Scope::new_file("src/pkg/A.as", Some(UnitId(7)));
    project.add_scope_for_unit(UnitId(7), &file);

    let scopes = project.scopes_for_unit(UnitId(7));
    assert_eq!(scopes.len(), 1);
    assert!(project.scopes_for_unit(UnitId(8)).is_empty());

    project.remove_units(&[UnitId(7)]);
    assert!(project.scopes_for_unit(UnitId(7)).is_empty());
}
