//! Immutable registry of model schemas.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::SchemaError;
use crate::model::{DynModel, Model, ModelType};
use crate::schema::{ModelSchema, Schema};

/// Schema descriptors for every known model type.
///
/// Built once with [`ModelCatalog::builder`] and shared by reference with
/// the path resolver, the graph walker and the dispatcher.
///
/// ```rust,ignore
/// let catalog = ModelCatalog::builder()
///     .register::<Customer>()
///     .register::<Address>()
///     .build()?;
/// ```
pub struct ModelCatalog {
    schemas: HashMap<TypeId, Arc<dyn ModelSchema>>,
}

impl ModelCatalog {
    /// Starts an empty catalog builder.
    pub fn builder() -> ModelCatalogBuilder {
        ModelCatalogBuilder::default()
    }

    /// Schema of `model_type`.
    pub fn schema(&self, model_type: ModelType) -> Result<&dyn ModelSchema, SchemaError> {
        self.schemas
            .get(&model_type.id())
            .map(|schema| &**schema)
            .ok_or(SchemaError::UnknownModel(model_type))
    }

    /// Schema of the instance's runtime type.
    pub fn schema_of(&self, instance: &dyn DynModel) -> Result<&dyn ModelSchema, SchemaError> {
        self.schema(instance.model_type())
    }

    /// Whether `model_type` is described.
    pub fn contains(&self, model_type: ModelType) -> bool {
        self.schemas.contains_key(&model_type.id())
    }

    /// Number of described model types.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

impl fmt::Debug for ModelCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self
            .schemas
            .values()
            .map(|s| s.model_type().short_name())
            .collect();
        names.sort_unstable();
        f.debug_struct("ModelCatalog").field("models", &names).finish()
    }
}

/// Builder for [`ModelCatalog`].
#[derive(Default)]
pub struct ModelCatalogBuilder {
    schemas: IndexMap<TypeId, Arc<dyn ModelSchema>>,
    problems: Vec<SchemaError>,
}

impl ModelCatalogBuilder {
    /// Describes `T`. Registering the same type twice keeps the first schema.
    pub fn register<T: Model>(mut self) -> Self {
        let id = TypeId::of::<T>();
        if self.schemas.contains_key(&id) {
            return self;
        }
        match Schema::<T>::build() {
            Ok(schema) => {
                self.schemas.insert(id, Arc::new(schema));
            }
            Err(problem) => self.problems.push(problem),
        }
        self
    }

    /// Finishes the catalog, failing on the first declaration problem.
    pub fn build(mut self) -> Result<ModelCatalog, SchemaError> {
        if !self.problems.is_empty() {
            return Err(self.problems.swap_remove(0));
        }
        Ok(ModelCatalog {
            schemas: self.schemas.into_iter().collect(),
        })
    }
}
