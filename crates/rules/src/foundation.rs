//! Core rule traits and the failure type.
//!
//! A [`Validate`] implementation checks one property value. On failure it
//! returns a [`RuleFailure`] whose message is a template: `{PropertyName}` is
//! replaced by the property's display name when the failure is reported, and
//! every `{Param}` by the matching parameter.
//!
//! ```rust,ignore
//! use fieldwise_rules::foundation::{RuleFailure, Validate};
//!
//! struct Even;
//!
//! impl Validate for Even {
//!     type Input = i64;
//!
//!     fn validate(&self, input: &i64) -> Result<(), RuleFailure> {
//!         if input % 2 == 0 {
//!             Ok(())
//!         } else {
//!             Err(RuleFailure::new("even", "'{PropertyName}' must be even."))
//!         }
//!     }
//! }
//! ```

use std::borrow::Cow;

use smallvec::SmallVec;

/// Placeholder replaced by the property's display name.
pub const PROPERTY_NAME: &str = "{PropertyName}";

// ============================================================================
// VALIDATE
// ============================================================================

/// Checks a single property value.
///
/// `Input` may be unsized so that `str` and slices can be validated without
/// copying.
pub trait Validate {
    /// The type of value being validated.
    type Input: ?Sized;

    /// Validates the value.
    fn validate(&self, input: &Self::Input) -> Result<(), RuleFailure>;
}

impl<V: Validate + ?Sized> Validate for Box<V> {
    type Input = V::Input;

    fn validate(&self, input: &Self::Input) -> Result<(), RuleFailure> {
        (**self).validate(input)
    }
}

// ============================================================================
// RULE FAILURE
// ============================================================================

/// A failed check, before it is attached to a property.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct RuleFailure {
    /// Machine-readable code (`not_empty`, `max_length`).
    pub code: Cow<'static, str>,
    /// Message template.
    pub message: Cow<'static, str>,
    /// Template parameters, in insertion order (typically 1-3).
    pub params: SmallVec<[(Cow<'static, str>, String); 3]>,
}

impl RuleFailure {
    /// Creates a failure with a code and message template.
    pub fn new(code: impl Into<Cow<'static, str>>, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            params: SmallVec::new(),
        }
    }

    /// Adds a template parameter.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_param(mut self, key: impl Into<Cow<'static, str>>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    /// Looks up a parameter by key.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Renders the failure's own template for `property_name`.
    pub fn render(&self, property_name: &str) -> String {
        self.render_with(&self.message, property_name)
    }

    /// Renders an override template with this failure's parameters.
    pub fn render_with(&self, template: &str, property_name: &str) -> String {
        let mut out = template.replace(PROPERTY_NAME, property_name);
        for (key, value) in &self.params {
            out = out.replace(&format!("{{{key}}}"), value);
        }
        out
    }
}
