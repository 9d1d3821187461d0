//! Edit context: the host-side state of a form bound to a model.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use fieldwise_core::{FieldIdentifier, FieldValue, Handle, Model, ModelCatalog, ModelRef};
use parking_lot::RwLock;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::error::DispatchError;
use crate::messages::MessageStore;

/// Interaction state of one field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldState {
    /// The value was changed since the last [`EditContext::mark_as_unmodified`].
    pub modified: bool,
    /// The user (or a validation pass) has visited the field.
    pub touched: bool,
}

/// Receives edit-context events.
#[async_trait]
pub trait EditContextListener: Send + Sync {
    /// A field changed or was touched.
    async fn field_changed(
        &self,
        _ctx: &EditContext,
        _field: &FieldIdentifier,
        _cancel: &CancellationToken,
    ) -> Result<(), DispatchError> {
        Ok(())
    }

    /// Validation of the whole form was requested.
    async fn validation_requested(
        &self,
        _ctx: &EditContext,
        _cancel: &CancellationToken,
    ) -> Result<(), DispatchError> {
        Ok(())
    }
}

/// Tracks field state, messages and listeners for one edited model.
///
/// ```rust,ignore
/// let ctx = Arc::new(EditContext::for_handle(&student));
/// form.set_edit_context(Some(Arc::clone(&ctx)))?;
///
/// let first_name = ctx.field("FirstName").unwrap();
/// ctx.update_field(&catalog, &first_name, "Jane".into()).await?;
/// assert!(ctx.validate().await?);
/// ```
pub struct EditContext {
    model: Option<ModelRef>,
    fields: DashMap<FieldIdentifier, FieldState>,
    stores: RwLock<Vec<Arc<MessageStore>>>,
    listeners: RwLock<Vec<Arc<dyn EditContextListener>>>,
    validation_state: watch::Sender<u64>,
}

impl EditContext {
    /// Binds a context to `model`.
    pub fn new(model: ModelRef) -> Self {
        Self::with_model(Some(model))
    }

    /// Binds a context to a typed instance.
    pub fn for_handle<T: Model>(handle: &Handle<T>) -> Self {
        Self::new(handle.to_model())
    }

    /// A context without a model. Whole-form validation of it fails.
    pub fn empty() -> Self {
        Self::with_model(None)
    }

    fn with_model(model: Option<ModelRef>) -> Self {
        Self {
            model,
            fields: DashMap::new(),
            stores: RwLock::new(Vec::new()),
            listeners: RwLock::new(Vec::new()),
            validation_state: watch::Sender::new(0),
        }
    }

    /// The edited model.
    pub fn model(&self) -> Option<&ModelRef> {
        self.model.as_ref()
    }

    /// Identifies a field of the edited model.
    pub fn field(&self, name: &str) -> Option<FieldIdentifier> {
        self.model.as_ref().map(|model| FieldIdentifier::new(model, name))
    }

    // ------------------------------------------------------------------
    // Field state
    // ------------------------------------------------------------------

    /// Marks `field` as touched without marking it modified and without
    /// notifying anyone.
    pub fn mark_touched(&self, field: FieldIdentifier) {
        self.fields.entry(field).or_default().touched = true;
    }

    /// Current state of `field`.
    pub fn field_state(&self, field: &FieldIdentifier) -> FieldState {
        self.fields.get(field).map(|state| *state).unwrap_or_default()
    }

    /// Whether any field was modified.
    pub fn is_modified(&self) -> bool {
        self.fields.iter().any(|state| state.modified)
    }

    /// Whether `field` was modified.
    pub fn is_field_modified(&self, field: &FieldIdentifier) -> bool {
        self.field_state(field).modified
    }

    /// Whether `field` was touched.
    pub fn is_touched(&self, field: &FieldIdentifier) -> bool {
        self.field_state(field).touched
    }

    /// Clears the modified flag of every field. Touched flags stay.
    pub fn mark_as_unmodified(&self) {
        for mut state in self.fields.iter_mut() {
            state.modified = false;
        }
    }

    /// Clears the modified flag of one field.
    pub fn mark_field_as_unmodified(&self, field: &FieldIdentifier) {
        if let Some(mut state) = self.fields.get_mut(field) {
            state.modified = false;
        }
    }

    /// Forgets the state of fields whose instance no longer exists.
    /// Returns how many fields were removed.
    pub fn prune_dropped_fields(&self) -> usize {
        let before = self.fields.len();
        self.fields.retain(|field, _| field.is_live());
        before - self.fields.len()
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Marks `field` modified and touched, then notifies listeners.
    pub async fn notify_field_changed(&self, field: &FieldIdentifier) -> Result<(), DispatchError> {
        self.notify_field_changed_with(field, &CancellationToken::new())
            .await
    }

    /// [`notify_field_changed`](Self::notify_field_changed) with a
    /// cancellation token handed to the listeners.
    pub async fn notify_field_changed_with(
        &self,
        field: &FieldIdentifier,
        cancel: &CancellationToken,
    ) -> Result<(), DispatchError> {
        {
            let mut state = self.fields.entry(field.clone()).or_default();
            state.modified = true;
            state.touched = true;
        }
        self.fire_field_changed(field, cancel).await
    }

    /// Marks `field` touched and notifies listeners. The modified flag is
    /// left as it is.
    pub async fn notify_field_touched(&self, field: &FieldIdentifier) -> Result<(), DispatchError> {
        self.mark_touched(field.clone());
        self.fire_field_changed(field, &CancellationToken::new())
            .await
    }

    async fn fire_field_changed(
        &self,
        field: &FieldIdentifier,
        cancel: &CancellationToken,
    ) -> Result<(), DispatchError> {
        let mut outcome = Ok(());
        for listener in self.listeners() {
            let result = listener.field_changed(self, field, cancel).await;
            keep_first_error(&mut outcome, result, "field change");
        }
        outcome
    }

    /// Requests validation of the whole form. Returns whether no message
    /// store holds a message afterwards.
    pub async fn validate(&self) -> Result<bool, DispatchError> {
        self.validate_with(&CancellationToken::new()).await
    }

    /// [`validate`](Self::validate) with a cancellation token handed to the
    /// listeners.
    pub async fn validate_with(&self, cancel: &CancellationToken) -> Result<bool, DispatchError> {
        let mut outcome = Ok(());
        for listener in self.listeners() {
            let result = listener.validation_requested(self, cancel).await;
            keep_first_error(&mut outcome, result, "validation request");
        }
        outcome.map(|()| self.validation_messages().is_empty())
    }

    /// Tells subscribers that messages may have changed.
    pub fn notify_validation_state_changed(&self) {
        self.validation_state
            .send_modify(|version| *version = version.wrapping_add(1));
    }

    /// Receives a new value every time the validation state changes.
    pub fn subscribe_validation_state(&self) -> watch::Receiver<u64> {
        self.validation_state.subscribe()
    }

    /// Writes `value` into `field` through the model schema, then notifies
    /// listeners of the change.
    pub async fn update_field(
        &self,
        catalog: &ModelCatalog,
        field: &FieldIdentifier,
        value: FieldValue,
    ) -> Result<(), DispatchError> {
        let owner = field.model().ok_or_else(|| DispatchError::OwnerDropped {
            field: field.clone(),
        })?;
        catalog
            .schema_of(&*owner)?
            .write(&*owner, field.field_name(), value)?;
        self.notify_field_changed(field).await
    }

    // ------------------------------------------------------------------
    // Messages and listeners
    // ------------------------------------------------------------------

    /// Creates a message store whose messages count towards this context.
    pub fn create_message_store(&self) -> Arc<MessageStore> {
        let store = Arc::new(MessageStore::new());
        self.stores.write().push(Arc::clone(&store));
        store
    }

    /// Every message of every store.
    pub fn validation_messages(&self) -> Vec<String> {
        self.stores
            .read()
            .iter()
            .flat_map(|store| store.all_messages())
            .collect()
    }

    /// Messages attached to `field` in any store.
    pub fn messages_for(&self, field: &FieldIdentifier) -> Vec<String> {
        self.stores
            .read()
            .iter()
            .flat_map(|store| store.messages_for(field))
            .collect()
    }

    /// Subscribes `listener` to this context's events.
    pub fn add_listener(&self, listener: Arc<dyn EditContextListener>) {
        self.listeners.write().push(listener);
    }

    /// Number of subscribed listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    // Snapshot, so no lock is held across listener awaits.
    fn listeners(&self) -> Vec<Arc<dyn EditContextListener>> {
        self.listeners.read().clone()
    }
}

// Every listener runs even after one fails; the first error is reported.
fn keep_first_error(
    outcome: &mut Result<(), DispatchError>,
    result: Result<(), DispatchError>,
    event: &'static str,
) {
    if let Err(error) = result {
        if outcome.is_ok() {
            *outcome = Err(error);
        } else {
            tracing::warn!(event, %error, "listener failed after an earlier listener error");
        }
    }
}

impl fmt::Debug for EditContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditContext")
            .field("model", &self.model.as_ref().map(|m| m.model_type()))
            .field("fields", &self.fields.len())
            .field("stores", &self.stores.read().len())
            .field("listeners", &self.listener_count())
            .finish()
    }
}
