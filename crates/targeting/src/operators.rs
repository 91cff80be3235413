//! Comparison operators for targeting predicates.

use flagkit_core::FlagValue;
use serde::{Deserialize, Serialize};

/// Operator applied between a context attribute and a rule literal.
///
/// Wire names are the uppercase forms (`EQUALS`, `NOT_CONTAINS`, ...).
/// Operator names this SDK doesn't know deserialize to
/// [`Unknown`](TargetingOperator::Unknown), which compares false rather than
/// failing the catalog parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetingOperator {
    Equals,
    NotEquals,
    GreaterThan,
    LowerThan,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    #[serde(other)]
    Unknown,
}

impl TargetingOperator {
    /// Apply the operator to a context value and the rule literal.
    pub fn compare(&self, actual: &FlagValue, expected: &FlagValue) -> bool {
        match self {
            TargetingOperator::Equals => actual == expected,
            TargetingOperator::NotEquals => actual != expected,
            TargetingOperator::GreaterThan => {
                numeric_cmp(actual, expected) == Some(std::cmp::Ordering::Greater)
            }
            TargetingOperator::LowerThan => {
                numeric_cmp(actual, expected) == Some(std::cmp::Ordering::Less)
            }
            TargetingOperator::Contains => actual
                .as_str()
                .zip(expected.as_str())
                .map_or(false, |(a, e)| a.contains(e)),
            TargetingOperator::NotContains => actual
                .as_str()
                .zip(expected.as_str())
                .map_or(true, |(a, e)| !a.contains(e)),
            TargetingOperator::StartsWith => actual
                .as_str()
                .zip(expected.as_str())
                .map_or(false, |(a, e)| a.starts_with(e)),
            TargetingOperator::EndsWith => actual
                .as_str()
                .zip(expected.as_str())
                .map_or(false, |(a, e)| a.ends_with(e)),
            TargetingOperator::Unknown => false,
        }
    }
}

fn numeric_cmp(a: &FlagValue, b: &FlagValue) -> Option<std::cmp::Ordering> {
    let a_num = a.as_f64()?;
    let b_num = b.as_f64()?;
    a_num.partial_cmp(&b_num)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_aware_equality() {
        let op = TargetingOperator::Equals;
        assert!(op.compare(&FlagValue::from("pro"), &FlagValue::from("pro")));
        assert!(!op.compare(&FlagValue::from("true"), &FlagValue::Bool(true)));
        assert!(!op.compare(&FlagValue::Number(1.0), &FlagValue::Bool(true)));

        let neq = TargetingOperator::NotEquals;
        assert!(neq.compare(&FlagValue::from("true"), &FlagValue::Bool(true)));
        assert!(!neq.compare(&FlagValue::Number(2.0), &FlagValue::Number(2.0)));
    }

    #[test]
    fn test_numeric_ordering_rejects_non_numbers() {
        let gt = TargetingOperator::GreaterThan;
        assert!(gt.compare(&FlagValue::Number(5.0), &FlagValue::Number(3.0)));
        assert!(!gt.compare(&FlagValue::Number(3.0), &FlagValue::Number(5.0)));
        assert!(!gt.compare(&FlagValue::from("5"), &FlagValue::Number(3.0)));

        let lt = TargetingOperator::LowerThan;
        assert!(lt.compare(&FlagValue::Number(3.0), &FlagValue::Number(5.0)));
        assert!(!lt.compare(&FlagValue::Bool(true), &FlagValue::Number(5.0)));
    }

    #[test]
    fn test_string_operators() {
        let contains = TargetingOperator::Contains;
        assert!(contains.compare(&FlagValue::from("blueberry"), &FlagValue::from("berry")));
        assert!(!contains.compare(&FlagValue::Number(12.0), &FlagValue::from("2")));

        let not_contains = TargetingOperator::NotContains;
        assert!(not_contains.compare(&FlagValue::from("apple"), &FlagValue::from("berry")));
        // Non-string operands cannot contain anything.
        assert!(not_contains.compare(&FlagValue::Number(12.0), &FlagValue::from("2")));

        let starts = TargetingOperator::StartsWith;
        assert!(starts.compare(&FlagValue::from("enterprise"), &FlagValue::from("enter")));
        assert!(!starts.compare(&FlagValue::from("enterprise"), &FlagValue::from("prise")));

        let ends = TargetingOperator::EndsWith;
        assert!(ends.compare(&FlagValue::from("enterprise"), &FlagValue::from("prise")));
    }

    #[test]
    fn test_unknown_operator_is_false_not_an_error() {
        let op: TargetingOperator = serde_json::from_str("\"MATCHES_REGEX\"").unwrap();
        assert_eq!(op, TargetingOperator::Unknown);
        assert!(!op.compare(&FlagValue::from("x"), &FlagValue::from("x")));
    }

    #[test]
    fn test_wire_names() {
        let op: TargetingOperator = serde_json::from_str("\"NOT_CONTAINS\"").unwrap();
        assert_eq!(op, TargetingOperator::NotContains);
        let op: TargetingOperator = serde_json::from_str("\"LOWER_THAN\"").unwrap();
        assert_eq!(op, TargetingOperator::LowerThan);
    }
}
