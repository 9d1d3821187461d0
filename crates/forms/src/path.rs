//! Maps a property path onto the field it names.

use std::sync::Arc;

use fieldwise_core::{
    FieldIdentifier, FieldValue, ModelCatalog, ModelRef, PathSegment, PathSyntaxError,
    split_segments,
};

use crate::error::PathError;

/// Resolves property paths (`Address1.Line1`, `Items[3].Name`) against a
/// root instance.
///
/// Every segment but the last is read and must yield a model instance; the
/// last segment is returned as written, indexers included, without being
/// read. When a value partway is null the walk stops there and the segment
/// that produced the null names the field.
#[derive(Debug, Clone, Copy)]
pub struct FieldPathResolver<'a> {
    catalog: &'a ModelCatalog,
}

impl<'a> FieldPathResolver<'a> {
    /// Creates a resolver reading fields through `catalog`.
    pub fn new(catalog: &'a ModelCatalog) -> Self {
        Self { catalog }
    }

    /// Resolves `path` relative to `root`.
    pub fn resolve(&self, root: &ModelRef, path: &str) -> Result<FieldIdentifier, PathError> {
        let segments = split_segments(path)?;
        let Some((leaf, parents)) = segments.split_last() else {
            return Err(PathSyntaxError::Empty.into());
        };

        let mut current = Arc::clone(root);
        for segment in parents {
            match self.read_segment(&current, segment)? {
                FieldValue::Null => return Ok(FieldIdentifier::new(&current, segment.text)),
                FieldValue::Object(next) => current = next,
                other => {
                    return Err(PathError::NotAnObject {
                        model_type: current.model_type(),
                        segment: segment.text.to_owned(),
                        kind: other.kind(),
                    });
                }
            }
        }
        Ok(FieldIdentifier::new(&current, leaf.text))
    }

    /// Reads the property named by `segment`, then applies its indexers in
    /// order.
    fn read_segment(
        &self,
        instance: &ModelRef,
        segment: &PathSegment<'_>,
    ) -> Result<FieldValue, PathError> {
        let model_type = instance.model_type();
        let schema = self.catalog.schema(model_type)?;
        let info = schema
            .field(segment.name)
            .ok_or_else(|| PathError::UnknownProperty {
                model_type,
                segment: segment.name.to_owned(),
            })?;
        let not_indexable = || PathError::NotIndexable {
            model_type,
            property: segment.name.to_owned(),
            segment: segment.text.to_owned(),
        };
        if !segment.indexers.is_empty() && !info.kind.is_indexable() {
            return Err(not_indexable());
        }

        let mut value = schema.read(&**instance, segment.name)?;
        for &argument in &segment.indexers {
            value = match value {
                FieldValue::Null => return Ok(FieldValue::Null),
                FieldValue::List(mut items) => {
                    let index = argument
                        .parse::<usize>()
                        .map_err(|_| PathError::BadIndexArgument {
                            segment: segment.text.to_owned(),
                            argument: argument.to_owned(),
                            expected: "usize",
                        })?;
                    if index >= items.len() {
                        return Err(PathError::IndexOutOfRange {
                            segment: segment.text.to_owned(),
                            index,
                            len: items.len(),
                        });
                    }
                    items.swap_remove(index)
                }
                FieldValue::Map(mut entries) => {
                    entries
                        .swap_remove(argument)
                        .ok_or_else(|| PathError::MissingKey {
                            segment: segment.text.to_owned(),
                            key: argument.to_owned(),
                        })?
                }
                FieldValue::Scalar(_) | FieldValue::Object(_) => return Err(not_indexable()),
            };
        }
        Ok(value)
    }
}
