//! # fieldwise-rules
//!
//! A small declarative rule library implementing the fieldwise validator
//! capability.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fieldwise_rules::prelude::*;
//!
//! let students = RuleSet::new("student")
//!     .rule(Rule::new("FirstName", |s: &Student| s.first_name.as_str())
//!         .check(not_empty())
//!         .check(max_length(50)))
//!     .rule(Rule::new("Grade", |s: &Student| &s.grade)
//!         .check(exclusive_between(1, 12)));
//! ```
//!
//! ## Creating Validators
//!
//! Use the [`validator!`] macro for zero-boilerplate validators,
//! or implement [`Validate`](foundation::Validate) manually.
//!
//! ## Built-in Validators
//!
//! - **Text**: [`NotEmpty`](validators::NotEmpty), [`MinLength`](validators::MinLength),
//!   [`MaxLength`](validators::MaxLength)
//! - **Range**: [`ExclusiveBetween`](validators::ExclusiveBetween),
//!   [`InclusiveBetween`](validators::InclusiveBetween)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod display;
pub mod foundation;
mod macros;
pub mod prelude;
pub mod rule;
pub mod rule_set;
pub mod validators;

pub use display::display_name;
pub use foundation::{RuleFailure, Validate};
pub use rule::Rule;
pub use rule_set::RuleSet;
