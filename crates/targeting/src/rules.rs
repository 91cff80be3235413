//! Rule tree data types, shaped after the wire grammar.

use crate::operators::TargetingOperator;
use flagkit_core::FlagValue;
use serde::{Deserialize, Serialize};

/// A single predicate: context attribute `key` compared to `value`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Targeting {
    pub key: String,
    pub operator: TargetingOperator,
    pub value: FlagValue,
}

/// AND-ed sequence of predicates. The grammar requires it non-empty; the
/// parser drops empty lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetingList {
    pub targetings: Vec<Targeting>,
}

/// OR-ed set of targeting lists. An empty set is never satisfied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetingGroups {
    pub groups: Vec<TargetingList>,
}

impl TargetingGroups {
    pub fn new(groups: Vec<TargetingList>) -> Self {
        Self { groups }
    }
}

impl TargetingList {
    pub fn new(targetings: Vec<Targeting>) -> Self {
        Self { targetings }
    }
}

impl Targeting {
    pub fn new(
        key: impl Into<String>,
        operator: TargetingOperator,
        value: impl Into<FlagValue>,
    ) -> Self {
        Self {
            key: key.into(),
            operator,
            value: value.into(),
        }
    }
}
