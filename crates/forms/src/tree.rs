//! Validation of object trees and individual properties through the edit
//! context's listeners.

use async_trait::async_trait;
use fieldwise_core::{FieldIdentifier, ModelCatalog, ModelRef};

use crate::edit::EditContext;
use crate::error::DispatchError;
use crate::walker::ObjectGraphWalker;

/// Tree-wide validation helpers for [`EditContext`].
///
/// Each reachable field is announced as touched, so every attached
/// provider validates it as it would a user edit. Modified flags are left
/// alone.
#[async_trait]
pub trait EditContextExt {
    /// Touches every field reachable from the model and reports whether no
    /// message remains.
    async fn validate_object_tree(&self, catalog: &ModelCatalog) -> Result<bool, DispatchError>;

    /// Touches `field` and every field reachable through its value.
    /// Reports whether `field` has no messages; `false` if its owner is
    /// gone.
    async fn validate_property(
        &self,
        catalog: &ModelCatalog,
        field: &FieldIdentifier,
    ) -> Result<bool, DispatchError>;

    /// Validates each of `fields` and reports whether all are valid.
    async fn validate_properties(
        &self,
        catalog: &ModelCatalog,
        fields: &[FieldIdentifier],
    ) -> Result<bool, DispatchError>;
}

#[async_trait]
impl EditContextExt for EditContext {
    async fn validate_object_tree(&self, catalog: &ModelCatalog) -> Result<bool, DispatchError> {
        let model = self.model().cloned().ok_or(DispatchError::MissingModel)?;
        let mut fields = Vec::new();
        ObjectGraphWalker::new(catalog).walk_model(&model, collect(&mut fields))?;

        for field in &fields {
            self.notify_field_touched(field).await?;
        }
        self.notify_validation_state_changed();
        Ok(self.validation_messages().is_empty())
    }

    async fn validate_property(
        &self,
        catalog: &ModelCatalog,
        field: &FieldIdentifier,
    ) -> Result<bool, DispatchError> {
        let Some(owner) = field.model() else {
            return Ok(false);
        };
        let value = catalog
            .schema_of(&*owner)?
            .read(&*owner, field.field_name())?;

        let mut fields = vec![field.clone()];
        ObjectGraphWalker::new(catalog).walk(&value, collect(&mut fields))?;

        for touched in &fields {
            self.notify_field_touched(touched).await?;
        }
        Ok(self.messages_for(field).is_empty())
    }

    async fn validate_properties(
        &self,
        catalog: &ModelCatalog,
        fields: &[FieldIdentifier],
    ) -> Result<bool, DispatchError> {
        if fields.is_empty() {
            return Err(DispatchError::NoProperties);
        }
        let mut valid = true;
        for field in fields {
            valid &= self.validate_property(catalog, field).await?;
        }
        Ok(valid)
    }
}

fn collect(fields: &mut Vec<FieldIdentifier>) -> impl FnMut(&ModelRef, &str) + '_ {
    move |owner, name| fields.push(FieldIdentifier::new(owner, name))
}
