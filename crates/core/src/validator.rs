//! The validator capability.
//!
//! A [`ModelValidator`] is written against one concrete model type. The
//! registry stores validators type-erased as [`ValidatorHandle`]s; [`erase`]
//! performs the conversion and checks the instance type on every call.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::{Scope, ValidationContext};
use crate::entry::ErrorEntry;
use crate::error::ValidatorError;
use crate::model::{Handle, Model, ModelRef, ModelType};

/// Validates instances of one model type.
///
/// # Examples
///
/// ```rust,ignore
/// struct UniqueEmail { directory: Arc<Directory> }
///
/// #[async_trait]
/// impl ModelValidator for UniqueEmail {
///     type Model = Customer;
///
///     fn name(&self) -> &str { "unique_email" }
///
///     async fn validate(
///         &self,
///         ctx: &ValidationContext<Customer>,
///     ) -> Result<Vec<ErrorEntry>, ValidatorError> {
///         if !ctx.includes("Email") {
///             return Ok(Vec::new());
///         }
///         let email = ctx.instance().read().email.clone();
///         let taken = self.directory.contains(&email).await
///             .map_err(|e| ValidatorError::failed(self.name(), e))?;
///         Ok(taken.then(|| ErrorEntry::new("Email", "already registered")).into_iter().collect())
///     }
/// }
/// ```
#[async_trait]
pub trait ModelValidator: Send + Sync + 'static {
    /// The model type this validator targets.
    type Model: Model;

    /// Stable name, used for deduplication, logging and service lookup.
    fn name(&self) -> &str;

    /// Validates the instance in `ctx`, honouring its scope.
    async fn validate(
        &self,
        ctx: &ValidationContext<Self::Model>,
    ) -> Result<Vec<ErrorEntry>, ValidatorError>;
}

#[async_trait]
impl<V: ModelValidator> ModelValidator for Arc<V> {
    type Model = V::Model;

    fn name(&self) -> &str {
        (**self).name()
    }

    async fn validate(
        &self,
        ctx: &ValidationContext<Self::Model>,
    ) -> Result<Vec<ErrorEntry>, ValidatorError> {
        (**self).validate(ctx).await
    }
}

/// Object-safe form of [`ModelValidator`].
#[async_trait]
pub trait DynValidator: Send + Sync {
    /// Stable validator name.
    fn name(&self) -> &str;

    /// The model type this validator targets.
    fn target(&self) -> ModelType;

    /// Validates a type-erased instance.
    ///
    /// Fails with [`ValidatorError::TypeMismatch`] when `model` is not of
    /// the [`target`](Self::target) type.
    async fn validate_model(
        &self,
        model: ModelRef,
        scope: Scope,
    ) -> Result<Vec<ErrorEntry>, ValidatorError>;
}

/// Shared, type-erased validator.
pub type ValidatorHandle = Arc<dyn DynValidator>;

/// Erases a typed validator into a [`ValidatorHandle`].
pub fn erase<V: ModelValidator>(validator: V) -> ValidatorHandle {
    Arc::new(Erased(validator))
}

struct Erased<V>(V);

#[async_trait]
impl<V: ModelValidator> DynValidator for Erased<V> {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn target(&self) -> ModelType {
        ModelType::of::<V::Model>()
    }

    async fn validate_model(
        &self,
        model: ModelRef,
        scope: Scope,
    ) -> Result<Vec<ErrorEntry>, ValidatorError> {
        let instance = Handle::<V::Model>::downcast(&model).ok_or_else(|| {
            ValidatorError::TypeMismatch {
                validator: self.0.name().to_owned(),
                expected: ModelType::of::<V::Model>(),
                actual: model.model_type(),
            }
        })?;
        let ctx = ValidationContext::with_scope(instance, scope);
        self.0.validate(&ctx).await
    }
}

impl fmt::Debug for dyn DynValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("name", &self.name())
            .field("target", &self.target())
            .finish()
    }
}
