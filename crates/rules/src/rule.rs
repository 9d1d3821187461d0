//! Property rules.

use std::borrow::Cow;
use std::fmt;

use fieldwise_core::ErrorEntry;

use crate::display::display_name;
use crate::foundation::Validate;

type Accessor<T, P> = Box<dyn for<'a> Fn(&'a T) -> &'a P + Send + Sync>;
type Condition<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;
type Check<P> = Box<dyn Validate<Input = P> + Send + Sync>;

/// Checks attached to one property of `T`.
///
/// Every check runs; each failing check contributes one entry.
///
/// ```rust,ignore
/// let rule = Rule::new("FirstName", |s: &Student| s.first_name.as_str())
///     .check(not_empty())
///     .check(max_length(50));
/// ```
pub struct Rule<T, P: ?Sized> {
    property: &'static str,
    display_name: String,
    accessor: Accessor<T, P>,
    checks: Vec<Check<P>>,
    message: Option<Cow<'static, str>>,
    condition: Option<Condition<T>>,
}

impl<T: 'static, P: ?Sized + 'static> Rule<T, P> {
    /// Starts a rule for `property`, read through `accessor`.
    pub fn new<F>(property: &'static str, accessor: F) -> Self
    where
        F: for<'a> Fn(&'a T) -> &'a P + Send + Sync + 'static,
    {
        Self {
            property,
            display_name: display_name(property),
            accessor: Box::new(accessor),
            checks: Vec::new(),
            message: None,
            condition: None,
        }
    }

    /// Adds a check.
    pub fn check<V>(mut self, validator: V) -> Self
    where
        V: Validate<Input = P> + Send + Sync + 'static,
    {
        self.checks.push(Box::new(validator));
        self
    }

    /// Replaces the message of every check. The template may use
    /// `{PropertyName}` and the parameters of the failing check.
    pub fn with_message(mut self, template: impl Into<Cow<'static, str>>) -> Self {
        self.message = Some(template.into());
        self
    }

    /// Overrides the display name used in messages.
    pub fn with_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Runs the rule only when `condition` holds for the instance.
    pub fn when<F>(mut self, condition: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.condition = Some(Box::new(condition));
        self
    }

    /// The property this rule is attached to.
    pub fn property(&self) -> &'static str {
        self.property
    }
}

impl<T, P: ?Sized> fmt::Debug for Rule<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("property", &self.property)
            .field("display_name", &self.display_name)
            .field("checks", &self.checks.len())
            .field("conditional", &self.condition.is_some())
            .finish_non_exhaustive()
    }
}

/// A [`Rule`] with its value type erased.
pub(crate) trait PropertyRule<T>: Send + Sync {
    fn property(&self) -> &'static str;

    fn apply(&self, instance: &T, out: &mut Vec<ErrorEntry>);
}

impl<T: 'static, P: ?Sized + 'static> PropertyRule<T> for Rule<T, P> {
    fn property(&self) -> &'static str {
        self.property
    }

    fn apply(&self, instance: &T, out: &mut Vec<ErrorEntry>) {
        if self.condition.as_ref().is_some_and(|when| !when(instance)) {
            return;
        }
        let value = (self.accessor)(instance);
        for check in &self.checks {
            if let Err(failure) = check.validate(value) {
                let message = match &self.message {
                    Some(template) => failure.render_with(template, &self.display_name),
                    None => failure.render(&self.display_name),
                };
                out.push(ErrorEntry::new(self.property, message).with_code(failure.code));
            }
        }
    }
}
