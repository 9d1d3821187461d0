//! Attaches validation providers to an edit context.

use std::sync::Arc;

use crate::edit::EditContext;
use crate::error::ConfigError;
use crate::provider::ProviderRepository;
use crate::services::Services;

/// The form-side attachment point for validation.
///
/// Each time a different edit context is set, every provider of the
/// [`ProviderRepository`] is constructed from the services and initialized
/// against it. Setting the same context again does nothing.
///
/// ```rust,ignore
/// let mut form = FormValidator::new(Arc::clone(&services));
/// form.set_edit_context(Some(Arc::clone(&ctx)))?;
/// ```
#[derive(Debug)]
pub struct FormValidator {
    services: Arc<Services>,
    edit_context: Option<Arc<EditContext>>,
}

impl FormValidator {
    /// Creates a validator resolving providers from `services`.
    pub fn new(services: Arc<Services>) -> Self {
        Self {
            services,
            edit_context: None,
        }
    }

    /// The currently attached context.
    pub fn edit_context(&self) -> Option<&Arc<EditContext>> {
        self.edit_context.as_ref()
    }

    /// Attaches to `edit_context`.
    ///
    /// Fails with [`ConfigError::MissingEditContext`] when `None` is given.
    pub fn set_edit_context(
        &mut self,
        edit_context: Option<Arc<EditContext>>,
    ) -> Result<(), ConfigError> {
        let ctx = edit_context.ok_or(ConfigError::MissingEditContext)?;
        let unchanged = self
            .edit_context
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, &ctx));
        if unchanged {
            return Ok(());
        }

        let repository = self.services.resolve::<ProviderRepository>()?;
        for provider_type in repository.providers() {
            let provider = provider_type.construct(&self.services)?;
            provider.initialize(&ctx, &self.services)?;
            tracing::debug!(provider = provider_type.name(), "validation provider initialized");
        }
        self.edit_context = Some(ctx);
        Ok(())
    }
}
