//! Rule sets: the validator capability for one model type.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use fieldwise_core::{
    ErrorEntry, Handle, Model, ModelValidator, PropertyPath, Scope, ValidationContext,
    ValidatorError,
};

use crate::rule::{PropertyRule, Rule};

/// Ordered property rules and child validators for `T`.
///
/// Members run in declaration order. Child validators report their entries
/// under the parent property (`Address1.Line1`, `Items[2].Name`).
///
/// ```rust,ignore
/// let address = Arc::new(
///     RuleSet::new("address")
///         .rule(Rule::new("Line1", |a: &Address| a.line1.as_str()).check(not_empty())),
/// );
/// let customer = RuleSet::new("customer")
///     .rule(Rule::new("FirstName", |c: &Customer| c.first_name.as_str()).check(not_empty()))
///     .nested("Address1", |c| Some(c.address1.clone()), address);
/// ```
pub struct RuleSet<T> {
    name: Cow<'static, str>,
    members: Vec<Member<T>>,
}

enum Member<T> {
    Rule(Box<dyn PropertyRule<T>>),
    Child(Box<dyn ChildRules<T>>),
}

impl<T: Model> RuleSet<T> {
    /// Creates an empty rule set.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// Adds a property rule.
    pub fn rule<P: ?Sized + 'static>(mut self, rule: Rule<T, P>) -> Self {
        self.members.push(Member::Rule(Box::new(rule)));
        self
    }

    /// Validates the nested model at `property` with `rules`.
    pub fn nested<U, F>(
        mut self,
        property: &'static str,
        accessor: F,
        rules: Arc<RuleSet<U>>,
    ) -> Self
    where
        U: Model,
        F: Fn(&T) -> Option<Handle<U>> + Send + Sync + 'static,
    {
        self.members.push(Member::Child(Box::new(Nested {
            property,
            accessor: Box::new(accessor),
            rules,
        })));
        self
    }

    /// Validates every element of the collection at `property` with
    /// `rules`. Missing elements are skipped.
    pub fn each<U, F>(mut self, property: &'static str, accessor: F, rules: Arc<RuleSet<U>>) -> Self
    where
        U: Model,
        F: Fn(&T) -> Vec<Option<Handle<U>>> + Send + Sync + 'static,
    {
        self.members.push(Member::Child(Box::new(Each {
            property,
            accessor: Box::new(accessor),
            rules,
        })));
        self
    }

    /// Number of rules and child validators.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the set has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Runs the set synchronously.
    pub fn validate_instance(&self, instance: &Handle<T>, scope: &Scope) -> Vec<ErrorEntry> {
        self.collect(instance, scope, &mut Vec::new())
    }

    /// `ancestors` holds the instances on the current descent; an instance
    /// that is its own ancestor is not validated again.
    fn collect(
        &self,
        instance: &Handle<T>,
        scope: &Scope,
        ancestors: &mut Vec<usize>,
    ) -> Vec<ErrorEntry> {
        let addr = instance.addr();
        if ancestors.contains(&addr) {
            return Vec::new();
        }

        // Children run after the read lock is released.
        let steps: Vec<Step> = {
            let guard = instance.read();
            self.members
                .iter()
                .flat_map(|member| match member {
                    Member::Rule(rule) => {
                        let mut entries = Vec::new();
                        if scope.includes(rule.property()) {
                            rule.apply(&guard, &mut entries);
                        }
                        vec![Step::Ready(entries)]
                    }
                    Member::Child(child) => child
                        .select(&guard, scope)
                        .into_iter()
                        .map(Step::Child)
                        .collect(),
                })
                .collect()
        };

        ancestors.push(addr);
        let mut entries = Vec::new();
        for step in steps {
            match step {
                Step::Ready(ready) => entries.extend(ready),
                Step::Child(PendingChild { prefix, run }) => entries.extend(
                    run(ancestors)
                        .into_iter()
                        .map(|entry| entry.nested_under(&prefix)),
                ),
            }
        }
        ancestors.pop();
        entries
    }
}

#[async_trait]
impl<T: Model> ModelValidator for RuleSet<T> {
    type Model = T;

    fn name(&self) -> &str {
        &self.name
    }

    async fn validate(
        &self,
        ctx: &ValidationContext<T>,
    ) -> Result<Vec<ErrorEntry>, ValidatorError> {
        Ok(self.validate_instance(ctx.instance(), ctx.scope()))
    }
}

impl<T> fmt::Debug for RuleSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let properties: Vec<_> = self
            .members
            .iter()
            .map(|member| match member {
                Member::Rule(rule) => rule.property(),
                Member::Child(child) => child.property(),
            })
            .collect();
        f.debug_struct("RuleSet")
            .field("name", &self.name)
            .field("properties", &properties)
            .finish()
    }
}

// ============================================================================
// CHILD VALIDATORS
// ============================================================================

enum Step {
    Ready(Vec<ErrorEntry>),
    Child(PendingChild),
}

type ChildRun = Box<dyn FnOnce(&mut Vec<usize>) -> Vec<ErrorEntry>>;

struct PendingChild {
    prefix: PropertyPath,
    run: ChildRun,
}

trait ChildRules<T>: Send + Sync {
    fn property(&self) -> &'static str;

    /// Child instances selected by `scope`, with their own scopes.
    fn select(&self, parent: &T, scope: &Scope) -> Vec<PendingChild>;
}

fn pending<U: Model>(
    prefix: PropertyPath,
    rules: &Arc<RuleSet<U>>,
    child: Handle<U>,
    scope: Scope,
) -> PendingChild {
    let rules = Arc::clone(rules);
    PendingChild {
        prefix,
        run: Box::new(move |ancestors: &mut Vec<usize>| rules.collect(&child, &scope, ancestors)),
    }
}

struct Nested<T, U> {
    property: &'static str,
    accessor: Box<dyn Fn(&T) -> Option<Handle<U>> + Send + Sync>,
    rules: Arc<RuleSet<U>>,
}

impl<T: Model, U: Model> ChildRules<T> for Nested<T, U> {
    fn property(&self) -> &'static str {
        self.property
    }

    fn select(&self, parent: &T, scope: &Scope) -> Vec<PendingChild> {
        let Some(child_scope) = scope.descend(self.property) else {
            return Vec::new();
        };
        (self.accessor)(parent)
            .map(|child| {
                pending(
                    PropertyPath::member(self.property),
                    &self.rules,
                    child,
                    child_scope,
                )
            })
            .into_iter()
            .collect()
    }
}

struct Each<T, U> {
    property: &'static str,
    accessor: Box<dyn Fn(&T) -> Vec<Option<Handle<U>>> + Send + Sync>,
    rules: Arc<RuleSet<U>>,
}

impl<T: Model, U: Model> ChildRules<T> for Each<T, U> {
    fn property(&self) -> &'static str {
        self.property
    }

    fn select(&self, parent: &T, scope: &Scope) -> Vec<PendingChild> {
        let whole = scope.descend(self.property) == Some(Scope::Whole);
        if !whole && !scope.targets_element_of(self.property) {
            return Vec::new();
        }
        (self.accessor)(parent)
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| {
                let child = item?;
                let prefix = PropertyPath::member(self.property).index(index);
                let child_scope = if whole {
                    Scope::Whole
                } else {
                    scope.descend(&prefix.to_string())?
                };
                Some(pending(prefix, &self.rules, child, child_scope))
            })
            .collect()
    }
}
