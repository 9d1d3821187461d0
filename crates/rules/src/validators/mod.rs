//! Built-in validators.
//!
//! - **Text**: [`NotEmpty`], [`MinLength`], [`MaxLength`]
//! - **Range**: [`ExclusiveBetween`], [`InclusiveBetween`]

pub mod length;
pub mod range;

pub use length::{MaxLength, MinLength, NotEmpty, max_length, min_length, not_empty};
pub use range::{ExclusiveBetween, InclusiveBetween, exclusive_between, inclusive_between};
