//! Common imports for declaring rule sets.

pub use crate::foundation::{RuleFailure, Validate};
pub use crate::rule::Rule;
pub use crate::rule_set::RuleSet;
pub use crate::validators::{
    exclusive_between, inclusive_between, max_length, min_length, not_empty,
};
pub use crate::validator;

pub use fieldwise_core::{Handle, ModelValidator};
