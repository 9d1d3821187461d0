//! Object-graph walker.

use std::collections::HashMap;
use std::sync::Arc;

use fieldwise_core::{FieldValue, ModelCatalog, ModelRef, SchemaError, model_addr};

/// What a walk covered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkSummary {
    /// Distinct model instances reached.
    pub objects: usize,
    /// Fields reported to the visitor.
    pub fields: usize,
}

/// Visits every field of every model instance reachable from a root.
///
/// Each instance is visited once per walk, however many paths lead to it,
/// so cycles terminate. Collections are traversed element by element;
/// scalars and nulls end the descent. Private fields are visited like
/// public ones.
#[derive(Debug, Clone, Copy)]
pub struct ObjectGraphWalker<'a> {
    catalog: &'a ModelCatalog,
}

impl<'a> ObjectGraphWalker<'a> {
    /// Creates a walker reading fields through `catalog`.
    pub fn new(catalog: &'a ModelCatalog) -> Self {
        Self { catalog }
    }

    /// Walks from `root`, calling `visit(instance, field_name)` for every
    /// declared field of every reachable instance.
    ///
    /// Fails when a reachable instance's type is not in the catalog.
    pub fn walk<F>(&self, root: &FieldValue, mut visit: F) -> Result<WalkSummary, SchemaError>
    where
        F: FnMut(&ModelRef, &str),
    {
        // Visited instances stay alive until the walk ends so that no
        // address is reused within it.
        let mut visited: HashMap<usize, ModelRef> = HashMap::new();
        let mut summary = WalkSummary::default();
        let mut pending = vec![root.clone()];

        while let Some(value) = pending.pop() {
            match value {
                FieldValue::Null | FieldValue::Scalar(_) => {}
                FieldValue::List(items) => pending.extend(items.into_iter().rev()),
                FieldValue::Map(entries) => pending.extend(entries.into_values().rev()),
                FieldValue::Object(model) => {
                    let addr = model_addr(&model);
                    if visited.contains_key(&addr) {
                        continue;
                    }
                    visited.insert(addr, Arc::clone(&model));

                    let fields = self.catalog.schema_of(&*model)?.read_all(&*model)?;
                    summary.objects += 1;
                    summary.fields += fields.len();

                    let mut children = Vec::with_capacity(fields.len());
                    for (name, value) in fields {
                        visit(&model, name);
                        children.push(value);
                    }
                    pending.extend(children.into_iter().rev());
                }
            }
        }

        tracing::trace!(
            objects = summary.objects,
            fields = summary.fields,
            "object graph walked"
        );
        Ok(summary)
    }

    /// Walks from a model instance.
    pub fn walk_model<F>(&self, root: &ModelRef, visit: F) -> Result<WalkSummary, SchemaError>
    where
        F: FnMut(&ModelRef, &str),
    {
        self.walk(&FieldValue::Object(Arc::clone(root)), visit)
    }
}
