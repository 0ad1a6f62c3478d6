//! Ambiguity arbitration.
//!
//! A lookup that filters down to more than one candidate is ambiguous unless
//! one of the heuristics here picks a winner: a getter/setter pair is one
//! logical property, and N-way re-declarations of the same variable or
//! function resolve to the first declaration. Anything else falls through to
//! a pluggable policy; the default keeps two-way ties ambiguous.

use crate::definition::{DefRef, DefinitionKind};

/// Host hook for two-candidate ties the standard heuristics did not break.
pub trait DisambiguationPolicy: Send + Sync {
    fn double_check(&self, a: &DefRef, b: &DefRef) -> Option<DefRef>;
}

/// Keeps two-way ties ambiguous.
#[derive(Default)]
pub struct DefaultPolicy;

impl DisambiguationPolicy for DefaultPolicy {
    fn double_check(&self, _a: &DefRef, _b: &DefRef) -> Option<DefRef> {
        None
    }
}

/// The ActionScript rule set: a function-vs-type tie resolves to the type.
#[derive(Default)]
pub struct ActionScriptPolicy;

impl DisambiguationPolicy for ActionScriptPolicy {
    fn double_check(&self, a: &DefRef, b: &DefRef) -> Option<DefRef> {
        match (a.is_type(), b.is_type()) {
            (true, false) if b.is_function() => Some(a.clone()),
            (false, true) if a.is_function() => Some(b.clone()),
            _ => None,
        }
    }
}

fn is_getter_setter_pair(a: &DefRef, b: &DefRef) -> bool {
    matches!(
        (a.kind(), b.kind()),
        (DefinitionKind::Getter, DefinitionKind::Setter)
            | (DefinitionKind::Setter, DefinitionKind::Getter)
    )
}

/// Attempts to reduce a multi-candidate match to one definition. Returns
/// `None` when the set stays ambiguous.
pub fn resolve_ambiguities(
    candidates: &[DefRef],
    policy: &dyn DisambiguationPolicy,
) -> Option<DefRef> {
    debug_assert!(candidates.len() > 1);
    if candidates.len() == 2 && is_getter_setter_pair(&candidates[0], &candidates[1]) {
        // A getter/setter pair is one logical property.
        return Some(candidates[0].clone());
    }
    let all_variables = candidates
        .iter()
        .all(|def| matches!(def.kind(), DefinitionKind::Variable { .. }));
    let all_functions = candidates
        .iter()
        .all(|def| matches!(def.kind(), DefinitionKind::Function));
    if all_variables || all_functions {
        // Re-declaration of the same name; the first declaration stands.
        return Some(candidates[0].clone());
    }
    if candidates.len() == 2 {
        return policy.double_check(&candidates[0], &candidates[1]);
    }
    None
}
