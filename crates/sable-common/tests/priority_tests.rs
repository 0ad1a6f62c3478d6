use sable_common::{DefinitionPriority, PriorityBasis};

#[test]
fn test_source_path_outranks_library() {
    let lib = DefinitionPriority::library(10);
    let src = DefinitionPriority::source(1);
    assert!(src > lib);
}

#[test]
fn test_timestamp_breaks_basis_tie() {
    let older = DefinitionPriority::new(PriorityBasis::Library, 100, 1);
    let newer = DefinitionPriority::new(PriorityBasis::Library, 200, 0);
    assert!(newer > older);
}

#[test]
fn test_sequence_makes_order_total() {
    let a = DefinitionPriority::new(PriorityBasis::SourcePath, 100, 1);
    let b = DefinitionPriority::new(PriorityBasis::SourcePath, 100, 2);
    assert!(b > a);
    assert_ne!(a, b);
}
