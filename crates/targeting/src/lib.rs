//! Targeting rule trees and their evaluator.
//!
//! A rule tree is three levels: OR-ed [`TargetingList`]s inside a
//! [`TargetingGroups`], AND-ed [`Targeting`] predicates inside each list.
//! Evaluation is a pure function of the tree and the visitor context.

pub mod evaluator;
pub mod operators;
pub mod rules;

pub use evaluator::evaluate;
pub use operators::TargetingOperator;
pub use rules::{Targeting, TargetingGroups, TargetingList};
