use sable_common::Namespace;
use sable_defs::{DefEntry, Definition, DefinitionSet, DefinitionStore};

fn var(name: &str) -> DefEntry {
    DefEntry::Definition(Definition::variable(name, Namespace::package_public("")).build())
}

#[test]
fn test_enumeration_is_capacity_independent() {
    // 8 names fit inline; 20 forces the spill tier. Enumeration must not
    // care which tier is in use.
    for count in [0usize, 1, 2, 4, 8, 20] {
        let mut store = DefinitionStore::new();
        for i in 0..count {
            store.add(var(&format!("name{i}")));
        }
        assert_eq!(store.len(), count);
        assert_eq!(store.all_entries().len(), count);
        let mut names: Vec<String> =
            store.all_names().iter().map(|n| n.to_string()).collect();
        names.sort();
        let mut expected: Vec<String> = (0..count).map(|i| format!("name{i}")).collect();
        expected.sort();
        assert_eq!(names, expected);
    }
}

#[test]
fn test_same_base_name_accumulates_in_one_set() {
    let mut store = DefinitionStore::new();
    let a = var("x");
    let b = var("x");
    store.add(a.clone());
    store.add(b.clone());
    assert_eq!(store.len(), 1);
    let set = store.get("x").unwrap();
    assert_eq!(set.len(), 2);
    assert!(set.contains(&a));
    assert!(set.contains(&b));
}

#[test]
fn test_remove_collapses_emptied_set() {
    let mut store = DefinitionStore::new();
    let a = var("x");
    store.add(a.clone());
    assert!(store.remove(&a));
    assert!(store.get("x").is_none());
    assert!(store.is_empty());
    // Removing again is a no-op.
    assert!(!store.remove(&a));
}

#[test]
fn test_remove_after_spill() {
    let mut store = DefinitionStore::new();
    let mut entries = Vec::new();
    for i in 0..12 {
        let entry = var(&format!("n{i}"));
        store.add(entry.clone());
        entries.push(entry);
    }
    for entry in &entries {
        assert!(store.remove(entry));
    }
    assert!(store.is_empty());
}

#[test]
fn test_replace_swaps_in_place() {
    let mut store = DefinitionStore::new();
    let old = var("x");
    let new = var("x");
    store.add(old.clone());
    assert!(store.replace(&old, new.clone()));
    let set = store.get("x").unwrap();
    assert!(set.contains(&new));
    assert!(!set.contains(&old));
}

#[test]
fn test_set_many_collapses_back_to_single() {
    let mut set = DefinitionSet::default();
    let a = var("y");
    let b = var("y");
    set.push(a.clone());
    set.push(b.clone());
    assert_eq!(set.len(), 2);
    assert!(set.remove(&a));
    assert_eq!(set.len(), 1);
    assert!(set.contains(&b));
}
