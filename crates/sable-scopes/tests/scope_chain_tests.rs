//! Chain-walk lookup behavior: shadowing order, imports, aliases, with and
//! catch scopes, contingent filtering, project fallback.

use std::sync::Arc;

use sable_common::{DependencyType, Namespace, Qname};
use sable_defs::{DefModifiers, Definition, DefinitionKind, same_definition};
use sable_scopes::{Import, ProjectScope, Resolution, Scope};

fn public() -> Namespace {
    Namespace::package_public("")
}

fn var(name: &str) -> Arc<Definition> {
    Definition::variable(name, public()).build()
}

#[test]
fn test_innermost_definition_wins() {
    let project = ProjectScope::new_default();
    let file = Scope::new_file("src/main.as", None);
    let outer = Scope::new_function(&file);
    let inner = Scope::new_function(&outer);

    let file_x = var("x");
    let outer_x = var("x");
    let inner_x = var("x");
    file.add_definition(Arc::clone(&file_x));
    outer.add_definition(Arc::clone(&outer_x));
    inner.add_definition(Arc::clone(&inner_x));

    let result = inner.find_property(&project, "x", Some(DependencyType::Expression));
    let found = result.definition().unwrap();
    assert!(same_definition(found, &inner_x));
    assert!(!same_definition(found, &outer_x));

    let from_outer = outer.find_property(&project, "x", Some(DependencyType::Expression));
    assert!(same_definition(from_outer.definition().unwrap(), &outer_x));
}

#[test]
fn test_find_all_reports_every_match() {
    let project = ProjectScope::new_default();
    let file = Scope::new_file("src/main.as", None);
    let outer = Scope::new_function(&file);
    let inner = Scope::new_function(&outer);

    file.add_definition(var("x"));
    outer.add_definition(var("x"));
    inner.add_definition(var("x"));

    let all = inner.find_all_properties(&project, "x");
    assert_eq!(all.len(), 3);
}

#[test]
fn test_project_fallback_when_chain_misses() {
    let project = ProjectScope::new_default();
    let file = Scope::new_file("src/main.as", None);
    let func = Scope::new_function(&file);

    let global = Definition::variable("answer", public()).build();
    project.add_definition(Arc::clone(&global));

    let result = func.find_property(&project, "answer", Some(DependencyType::Expression));
    assert!(same_definition(result.definition().unwrap(), &global));
}

#[test]
fn test_explicit_import_beats_unimported_project_name() {
    // A file importing a.b.Foo must resolve bare Foo to a.b.Foo even when
    // an unrelated Foo exists at project scope in a namespace the file
    // never opened.
    let project = ProjectScope::new_default();
    let imported = Definition::new(
        DefinitionKind::Variable { is_const: false },
        "a.b",
        "Foo",
        Namespace::package_public("a.b"),
    )
    .build();
    let unrelated = Definition::new(
        DefinitionKind::Variable { is_const: false },
        "other",
        "Foo",
        Namespace::package_public("other"),
    )
    .build();
    project.add_definition(Arc::clone(&imported));
    project.add_definition(Arc::clone(&unrelated));

    let file = Scope::new_file("src/consumer.as", None);
    file.add_import(Import::Named { target: Qname::new("a.b", "Foo"), alias: None });

    let result = file.find_property(&project, "Foo", Some(DependencyType::Expression));
    assert!(same_definition(result.definition().unwrap(), &imported));
}

#[test]
fn test_wildcard_import_opens_package() {
    let project = ProjectScope::new_default();
    let def = Definition::new(
        DefinitionKind::Variable { is_const: false },
        "a.b",
        "Bar",
        Namespace::package_public("a.b"),
    )
    .build();
    project.add_definition(Arc::clone(&def));

    let file = Scope::new_file("src/consumer.as", None);
    file.add_import(Import::Wildcard { package: Arc::from("a.b") });

    let result = file.find_property(&project, "Bar", Some(DependencyType::Expression));
    assert!(same_definition(result.definition().unwrap(), &def));

    // No import, no resolution.
    let other_file = Scope::new_file("src/other.as", None);
    let miss = other_file.find_property(&project, "Bar", Some(DependencyType::Expression));
    assert!(!miss.is_found());
}

#[test]
fn test_alias_resolves_and_blocks_target_name() {
    let project = ProjectScope::new_default();
    let target =
        Definition::class("a.b", "Foo", Namespace::package_public("a.b"), None, Vec::new()).build();
    project.add_definition(Arc::clone(&target));

    let file = Scope::new_file("src/consumer.as", None);
    file.add_import(Import::Named {
        target: Qname::new("a.b", "Foo"),
        alias: Some(Arc::from("Renamed")),
    });

    let via_alias = file.find_property(&project, "Renamed", Some(DependencyType::Expression));
    assert!(same_definition(via_alias.definition().unwrap(), &target));

    // The aliased target's own base name is not opened by the import.
    let via_base = file.find_property(&project, "Foo", Some(DependencyType::Expression));
    assert!(!via_base.is_found());
}

#[test]
fn test_alias_import_cannot_reach_internal_definition() {
    let project = ProjectScope::new_default();
    let hidden = Definition::new(
        DefinitionKind::Variable { is_const: false },
        "a.b",
        "Hidden",
        Namespace::package_internal("a.b"),
    )
    .build();
    project.add_definition(Arc::clone(&hidden));

    let file = Scope::new_file("src/consumer.as", None);
    file.add_import(Import::Named {
        target: Qname::new("a.b", "Hidden"),
        alias: Some(Arc::from("H")),
    });

    // Internal visibility is package-bound; the alias does not widen it.
    let via_alias = file.find_property(&project, "H", Some(DependencyType::Expression));
    assert!(!via_alias.is_found());
}

#[test]
fn test_with_scope_suppresses_outer_names() {
    let project = ProjectScope::new_default();
    let file = Scope::new_file("src/main.as", None);
    let func = Scope::new_function(&file);
    let with = Scope::new_with(&func);
    let body = Scope::new_function(&with);

    let outer = var("hidden");
    func.add_definition(Arc::clone(&outer));

    // Un-escaped lookup must not cross the with boundary.
    let inside = body.find_property(&project, "hidden", Some(DependencyType::Expression));
    assert!(!inside.is_found());

    // Opting into escape makes the with-block transparent.
    let escaped =
        body.find_property_with(&project, "hidden", Some(DependencyType::Expression), true);
    assert!(same_definition(escaped.definition().unwrap(), &outer));
}

#[test]
fn test_with_scope_definitions_land_in_container() {
    // A with-scope forwards adds to its container, so even its "own"
    // definitions sit beyond the boundary for un-escaped lookup.
    let project = ProjectScope::new_default();
    let file = Scope::new_file("src/main.as", None);
    let func = Scope::new_function(&file);
    let with = Scope::new_with(&func);

    let local = var("visible");
    with.add_definition(Arc::clone(&local));

    let result = with.find_property(&project, "visible", Some(DependencyType::Expression));
    assert!(!result.is_found(), "definition landed outside the with boundary");
    let escaped =
        with.find_property_with(&project, "visible", Some(DependencyType::Expression), true);
    assert!(same_definition(escaped.definition().unwrap(), &local));
}

#[test]
fn test_catch_parameter_resolves_in_catch_block() {
    let project = ProjectScope::new_default();
    let file = Scope::new_file("src/main.as", None);
    let func = Scope::new_function(&file);
    let catch = Scope::new_catch(&func);

    let param = var("err");
    catch.add_catch_parameter(Arc::clone(&param));

    let inside = catch.find_property(&project, "err", Some(DependencyType::Expression));
    assert!(same_definition(inside.definition().unwrap(), &param));

    // The parameter does not leak into the enclosing function.
    let outside = func.find_property(&project, "err", Some(DependencyType::Expression));
    assert!(!outside.is_found());
}

#[test]
fn test_contingent_definition_yields_to_real_one() {
    let project = ProjectScope::new_default();
    let file = Scope::new_file("src/main.as", None);

    let contingent = Definition::variable("maybe", public())
        .with_modifiers(DefModifiers::CONTINGENT)
        .build();
    let real = var("maybe");
    file.add_definition(Arc::clone(&contingent));
    file.add_definition(Arc::clone(&real));

    let result = file.find_property(&project, "maybe", Some(DependencyType::Expression));
    assert!(same_definition(result.definition().unwrap(), &real));
}

#[test]
fn test_contingent_definition_alone_still_resolves() {
    let project = ProjectScope::new_default();
    let file = Scope::new_file("src/main.as", None);

    let contingent = Definition::variable("maybe", public())
        .with_modifiers(DefModifiers::CONTINGENT)
        .build();
    file.add_definition(Arc::clone(&contingent));

    let result = file.find_property(&project, "maybe", Some(DependencyType::Expression));
    assert!(same_definition(result.definition().unwrap(), &contingent));
}

#[test]
fn test_two_locals_in_same_scope_are_ambiguous() {
    let project = ProjectScope::new_default();
    let file = Scope::new_file("src/main.as", None);

    let first = Definition::function("dup", public()).build();
    let second = Definition::class("", "dup", public(), None, Vec::new()).build();
    file.add_definition(first);
    file.add_definition(second);

    // Default policy keeps a function/class tie ambiguous.
    let result = file.find_property(&project, "dup", Some(DependencyType::Expression));
    assert!(matches!(result, Resolution::Ambiguous(ref c) if c.len() == 2));
}

#[test]
fn test_qualified_lookup_ignores_open_set() {
    let project = ProjectScope::new_default();
    let file = Scope::new_file("src/main.as", None);

    let ns = Namespace::user("http://example.org/ns");
    let hidden = Definition::variable("secret", ns.clone()).build();
    file.add_definition(Arc::clone(&hidden));

    // Unqualified: the user namespace is not open.
    let bare = file.find_property(&project, "secret", Some(DependencyType::Expression));
    assert!(!bare.is_found());

    // Qualified: the explicit namespace is the whole filter.
    let qualified =
        file.find_property_qualified(&project, &ns, "secret", Some(DependencyType::Expression));
    assert!(same_definition(qualified.definition().unwrap(), &hidden));
}

#[test]
fn test_use_namespace_opens_user_namespace() {
    let project = ProjectScope::new_default();
    let file = Scope::new_file("src/main.as", None);

    let ns = Namespace::user("http://example.org/ns");
    let def = Definition::variable("styled", ns.clone()).build();
    file.add_definition(Arc::clone(&def));
    file.add_use_namespace(ns);

    let result = file.find_property(&project, "styled", Some(DependencyType::Expression));
    assert!(same_definition(result.definition().unwrap(), &def));
}
