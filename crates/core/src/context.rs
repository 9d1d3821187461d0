//! Validation context handed to validators.

use std::fmt;
use std::sync::Arc;

use crate::model::{Handle, Model};
use crate::path::{INDEX_OPEN, MEMBER_SEPARATOR};

/// Which part of an instance a run covers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Every property.
    #[default]
    Whole,
    /// One property, named by a path relative to the instance
    /// (`FirstName`, `Items[2]`, `Address1.Line1`).
    Field(Arc<str>),
}

impl Scope {
    /// Restricts a run to `name`.
    pub fn field(name: impl Into<Arc<str>>) -> Self {
        Self::Field(name.into())
    }

    /// Whether rules attached directly to `property` run in this scope.
    pub fn includes(&self, property: &str) -> bool {
        match self {
            Self::Whole => true,
            Self::Field(field) => &**field == property,
        }
    }

    /// Scope for a child validator mounted at `prefix` (`Address1`,
    /// `Items[2]`).
    ///
    /// Returns `None` when the scope selects nothing below `prefix`.
    pub fn descend(&self, prefix: &str) -> Option<Self> {
        match self {
            Self::Whole => Some(Self::Whole),
            Self::Field(field) => {
                let rest = field.strip_prefix(prefix)?;
                if rest.is_empty() {
                    Some(Self::Whole)
                } else {
                    rest.strip_prefix(MEMBER_SEPARATOR).map(Self::field)
                }
            }
        }
    }

    /// Whether this scope selects some indexed element of `property`
    /// (`Items[2]` for `Items`) rather than the property as a whole.
    pub fn targets_element_of(&self, property: &str) -> bool {
        match self {
            Self::Whole => false,
            Self::Field(field) => field
                .strip_prefix(property)
                .is_some_and(|rest| rest.starts_with(INDEX_OPEN)),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Whole => f.write_str("*"),
            Self::Field(field) => f.write_str(field),
        }
    }
}

/// An instance under validation plus the part of it being validated.
pub struct ValidationContext<T> {
    instance: Handle<T>,
    scope: Scope,
}

impl<T: Model> ValidationContext<T> {
    /// Validates every property of `instance`.
    pub fn new(instance: Handle<T>) -> Self {
        Self::with_scope(instance, Scope::Whole)
    }

    /// Validates a single property of `instance`.
    pub fn for_field(instance: Handle<T>, field: impl Into<Arc<str>>) -> Self {
        Self::with_scope(instance, Scope::field(field))
    }

    /// Validates `instance` in an explicit scope.
    pub fn with_scope(instance: Handle<T>, scope: Scope) -> Self {
        Self { instance, scope }
    }

    /// The instance under validation.
    pub fn instance(&self) -> &Handle<T> {
        &self.instance
    }

    /// The scope of this run.
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Shorthand for `self.scope().includes(property)`.
    pub fn includes(&self, property: &str) -> bool {
        self.scope.includes(property)
    }
}

impl<T> Clone for ValidationContext<T> {
    fn clone(&self) -> Self {
        Self {
            instance: self.instance.clone(),
            scope: self.scope.clone(),
        }
    }
}

impl<T> fmt::Debug for ValidationContext<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationContext")
            .field("model_type", &std::any::type_name::<T>())
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Scope::Whole, "FirstName", true)]
    #[case(Scope::field("FirstName"), "FirstName", true)]
    #[case(Scope::field("FirstName"), "LastName", false)]
    #[case(Scope::field("Items[2]"), "Items", false)]
    fn includes(#[case] scope: Scope, #[case] property: &str, #[case] expected: bool) {
        assert_eq!(scope.includes(property), expected);
    }

    #[rstest]
    #[case(Scope::Whole, "Address1", Some(Scope::Whole))]
    #[case(Scope::field("Address1"), "Address1", Some(Scope::Whole))]
    #[case(Scope::field("Address1.Line1"), "Address1", Some(Scope::field("Line1")))]
    #[case(Scope::field("Address10"), "Address1", None)]
    #[case(Scope::field("Items[2]"), "Items[2]", Some(Scope::Whole))]
    #[case(Scope::field("Items[2].Name"), "Items[2]", Some(Scope::field("Name")))]
    #[case(Scope::field("Items[20]"), "Items[2]", None)]
    #[case(Scope::field("Items[2]"), "Items", None)]
    fn descend(#[case] scope: Scope, #[case] prefix: &str, #[case] expected: Option<Scope>) {
        assert_eq!(scope.descend(prefix), expected);
    }

    #[test]
    fn element_targeting() {
        assert!(Scope::field("Items[2]").targets_element_of("Items"));
        assert!(!Scope::field("Items").targets_element_of("Items"));
        assert!(!Scope::Whole.targets_element_of("Items"));
    }
}
