//! Field identity: the `(owning instance, field name)` key for messages.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

use crate::model::{DynModel, Handle, Model, ModelRef, ModelType, model_addr};

/// Identifies one field of one model instance.
///
/// Two identifiers are equal iff they point at the same allocation and name
/// the same field. The instance is held weakly: an identifier is a lookup
/// key and never keeps a model alive on its own.
#[derive(Clone)]
pub struct FieldIdentifier {
    model: Weak<dyn DynModel>,
    addr: usize,
    model_type: ModelType,
    field_name: Arc<str>,
}

impl FieldIdentifier {
    /// Identifies `field_name` on `model`.
    pub fn new(model: &ModelRef, field_name: impl Into<Arc<str>>) -> Self {
        Self {
            model: Arc::downgrade(model),
            addr: model_addr(model),
            model_type: model.model_type(),
            field_name: field_name.into(),
        }
    }

    /// Identifies `field_name` on a typed handle.
    pub fn of<T: Model>(handle: &Handle<T>, field_name: impl Into<Arc<str>>) -> Self {
        Self::new(&handle.to_model(), field_name)
    }

    /// The owning instance, if it is still alive.
    pub fn model(&self) -> Option<ModelRef> {
        self.model.upgrade()
    }

    /// Whether the owning instance is still alive.
    pub fn is_live(&self) -> bool {
        self.model.strong_count() > 0
    }

    /// Runtime type of the owning instance.
    pub fn model_type(&self) -> ModelType {
        self.model_type
    }

    /// The field name.
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// Whether `model` is the owning instance.
    pub fn is_owned_by(&self, model: &ModelRef) -> bool {
        self.addr == model_addr(model)
    }
}

impl PartialEq for FieldIdentifier {
    fn eq(&self, other: &Self) -> bool {
        self.addr == other.addr && self.field_name == other.field_name
    }
}

impl Eq for FieldIdentifier {}

impl Hash for FieldIdentifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr.hash(state);
        self.field_name.hash(state);
    }
}

impl fmt::Debug for FieldIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FieldIdentifier({}@{:#x}, {:?})",
            self.model_type, self.addr, self.field_name
        )
    }
}

impl fmt::Display for FieldIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.model_type, self.field_name)
    }
}
