//! Pure evaluation of rule trees against a visitor context.

use crate::rules::{Targeting, TargetingGroups, TargetingList};
use flagkit_core::VisitorContext;
use tracing::trace;

/// Evaluate a rule tree. Lists AND their predicates, the groups OR their
/// lists. An empty tree is not satisfied: "always eligible" groups use the
/// pre-resolved catalog shape, not a vacuous rule.
pub fn evaluate(rules: &TargetingGroups, context: &VisitorContext) -> bool {
    let satisfied = rules.groups.iter().any(|list| evaluate_list(list, context));
    trace!(groups = rules.groups.len(), satisfied, "targeting evaluated");
    satisfied
}

fn evaluate_list(list: &TargetingList, context: &VisitorContext) -> bool {
    // The grammar requires lists non-empty; an empty one never matches.
    !list.targetings.is_empty()
        && list
            .targetings
            .iter()
            .all(|targeting| evaluate_targeting(targeting, context))
}

/// A predicate holds iff the context key exists and the operator holds.
/// A missing key is false, never an error.
fn evaluate_targeting(targeting: &Targeting, context: &VisitorContext) -> bool {
    match context.get(&targeting.key) {
        Some(actual) => targeting.operator.compare(actual, &targeting.value),
        None => false,
    }
}
