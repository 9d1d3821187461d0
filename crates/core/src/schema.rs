//! Schema descriptors.
//!
//! Every [`Model`] declares its fields once through a [`SchemaBuilder`]:
//! name, getter, optional setter, declared [`FieldKind`] and [`Visibility`].
//! The resulting [`Schema<T>`] is erased behind [`ModelSchema`] so the path
//! resolver and the graph walker can read fields of any registered model.

use std::fmt;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::model::{DynModel, Model, ModelType};
use crate::value::FieldValue;

/// Declared shape of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Primitive leaf (text, number, date, flag).
    Scalar,
    /// Nested model instance.
    Object,
    /// Positional collection, indexed with `usize`.
    Collection,
    /// Keyed collection, indexed with a string key.
    Keyed,
}

impl FieldKind {
    /// Whether the field accepts an `[argument]` indexer in a property path.
    pub fn is_indexable(self) -> bool {
        matches!(self, Self::Collection | Self::Keyed)
    }
}

/// Whether a field is part of the model's public surface.
///
/// Private fields are still walked and validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Publicly bound field.
    #[default]
    Public,
    /// Internal state.
    Private,
}

/// Type-erased description of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInfo {
    /// Field name as used in property paths.
    pub name: &'static str,
    /// Declared shape.
    pub kind: FieldKind,
    /// Declared visibility.
    pub visibility: Visibility,
    /// Whether a setter is declared.
    pub writable: bool,
}

type Getter<T> = Box<dyn Fn(&T) -> FieldValue + Send + Sync>;
type Setter<T> = Box<dyn Fn(&mut T, FieldValue) -> Result<(), SchemaError> + Send + Sync>;

struct FieldDescriptor<T> {
    kind: FieldKind,
    visibility: Visibility,
    getter: Getter<T>,
    setter: Option<Setter<T>>,
}

impl<T> FieldDescriptor<T> {
    fn info(&self, name: &'static str) -> FieldInfo {
        FieldInfo {
            name,
            kind: self.kind,
            visibility: self.visibility,
            writable: self.setter.is_some(),
        }
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Collects field declarations for a model.
///
/// Problems (duplicate names, modifiers naming undeclared fields) are
/// recorded and surface when the catalog is built.
pub struct SchemaBuilder<T> {
    fields: IndexMap<&'static str, FieldDescriptor<T>>,
    problems: Vec<SchemaError>,
}

impl<T: Model> SchemaBuilder<T> {
    pub(crate) fn new() -> Self {
        Self {
            fields: IndexMap::new(),
            problems: Vec::new(),
        }
    }

    /// Declares a primitive field.
    pub fn scalar<F>(&mut self, name: &'static str, getter: F) -> &mut Self
    where
        F: Fn(&T) -> FieldValue + Send + Sync + 'static,
    {
        self.declare(name, FieldKind::Scalar, Box::new(getter))
    }

    /// Declares a nested model field.
    pub fn object<F>(&mut self, name: &'static str, getter: F) -> &mut Self
    where
        F: Fn(&T) -> FieldValue + Send + Sync + 'static,
    {
        self.declare(name, FieldKind::Object, Box::new(getter))
    }

    /// Declares a positional collection field.
    pub fn collection<F>(&mut self, name: &'static str, getter: F) -> &mut Self
    where
        F: Fn(&T) -> FieldValue + Send + Sync + 'static,
    {
        self.declare(name, FieldKind::Collection, Box::new(getter))
    }

    /// Declares a keyed collection field.
    pub fn keyed<F>(&mut self, name: &'static str, getter: F) -> &mut Self
    where
        F: Fn(&T) -> FieldValue + Send + Sync + 'static,
    {
        self.declare(name, FieldKind::Keyed, Box::new(getter))
    }

    /// Attaches a setter to an already declared field.
    pub fn setter<F>(&mut self, name: &'static str, setter: F) -> &mut Self
    where
        F: Fn(&mut T, FieldValue) -> Result<(), SchemaError> + Send + Sync + 'static,
    {
        match self.fields.get_mut(name) {
            Some(field) => field.setter = Some(Box::new(setter)),
            None => self.undeclared(name),
        }
        self
    }

    /// Marks an already declared field as private.
    pub fn private(&mut self, name: &'static str) -> &mut Self {
        match self.fields.get_mut(name) {
            Some(field) => field.visibility = Visibility::Private,
            None => self.undeclared(name),
        }
        self
    }

    fn declare(&mut self, name: &'static str, kind: FieldKind, getter: Getter<T>) -> &mut Self {
        if self.fields.contains_key(name) {
            self.problems.push(SchemaError::DuplicateField {
                model_type: ModelType::of::<T>(),
                field: name,
            });
            return self;
        }
        self.fields.insert(
            name,
            FieldDescriptor {
                kind,
                visibility: Visibility::Public,
                getter,
                setter: None,
            },
        );
        self
    }

    fn undeclared(&mut self, name: &str) {
        self.problems.push(SchemaError::UnknownField {
            model_type: ModelType::of::<T>(),
            field: name.to_owned(),
        });
    }

    pub(crate) fn finish(mut self) -> Result<Schema<T>, SchemaError> {
        if !self.problems.is_empty() {
            return Err(self.problems.swap_remove(0));
        }
        Ok(Schema {
            fields: self.fields,
        })
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

/// The field descriptors of one model type.
pub struct Schema<T> {
    fields: IndexMap<&'static str, FieldDescriptor<T>>,
}

impl<T: Model> Schema<T> {
    /// Runs [`Model::describe`] and validates the declarations.
    pub fn build() -> Result<Self, SchemaError> {
        let mut builder = SchemaBuilder::new();
        T::describe(&mut builder);
        builder.finish()
    }

    /// Reads `field` from a borrowed instance.
    pub fn get(&self, instance: &T, field: &str) -> Option<FieldValue> {
        self.fields.get(field).map(|d| (d.getter)(instance))
    }

    fn unknown(field: &str) -> SchemaError {
        SchemaError::UnknownField {
            model_type: ModelType::of::<T>(),
            field: field.to_owned(),
        }
    }

    fn lock<'a>(&self, instance: &'a dyn DynModel) -> Result<&'a RwLock<T>, SchemaError> {
        instance
            .as_any()
            .downcast_ref::<RwLock<T>>()
            .ok_or_else(|| SchemaError::InstanceMismatch {
                expected: ModelType::of::<T>(),
                actual: instance.model_type(),
            })
    }
}

impl<T: Model> fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("model_type", &ModelType::of::<T>().name())
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Type-erased access to a model's fields.
pub trait ModelSchema: Send + Sync {
    /// Model described by this schema.
    fn model_type(&self) -> ModelType;

    /// All declared fields, in declaration order.
    fn fields(&self) -> Vec<FieldInfo>;

    /// Description of one field.
    fn field(&self, name: &str) -> Option<FieldInfo>;

    /// Reads one field of `instance`.
    fn read(&self, instance: &dyn DynModel, field: &str) -> Result<FieldValue, SchemaError>;

    /// Reads every field of `instance` under a single read lock.
    fn read_all(&self, instance: &dyn DynModel)
    -> Result<Vec<(&'static str, FieldValue)>, SchemaError>;

    /// Writes one field of `instance` through its setter.
    fn write(
        &self,
        instance: &dyn DynModel,
        field: &str,
        value: FieldValue,
    ) -> Result<(), SchemaError>;
}

impl<T: Model> ModelSchema for Schema<T> {
    fn model_type(&self) -> ModelType {
        ModelType::of::<T>()
    }

    fn fields(&self) -> Vec<FieldInfo> {
        self.fields.iter().map(|(name, d)| d.info(name)).collect()
    }

    fn field(&self, name: &str) -> Option<FieldInfo> {
        self.fields.get_key_value(name).map(|(name, d)| d.info(name))
    }

    fn read(&self, instance: &dyn DynModel, field: &str) -> Result<FieldValue, SchemaError> {
        let descriptor = self.fields.get(field).ok_or_else(|| Self::unknown(field))?;
        let guard = self.lock(instance)?.read();
        Ok((descriptor.getter)(&*guard))
    }

    fn read_all(
        &self,
        instance: &dyn DynModel,
    ) -> Result<Vec<(&'static str, FieldValue)>, SchemaError> {
        let guard = self.lock(instance)?.read();
        Ok(self
            .fields
            .iter()
            .map(|(name, d)| (*name, (d.getter)(&*guard)))
            .collect())
    }

    fn write(
        &self,
        instance: &dyn DynModel,
        field: &str,
        value: FieldValue,
    ) -> Result<(), SchemaError> {
        let descriptor = self.fields.get(field).ok_or_else(|| Self::unknown(field))?;
        let setter = descriptor
            .setter
            .as_ref()
            .ok_or_else(|| SchemaError::ReadOnly {
                model_type: ModelType::of::<T>(),
                field: field.to_owned(),
            })?;
        let mut guard = self.lock(instance)?.write();
        setter(&mut *guard, value)
    }
}
