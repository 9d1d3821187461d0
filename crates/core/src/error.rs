//! Error types for schema access and validator execution.

use crate::model::ModelType;

/// Errors from schema descriptors and the model catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// No schema was registered for the model type.
    #[error("no schema registered for model type {0}")]
    UnknownModel(ModelType),

    /// The instance handed to a schema is not the type it describes.
    #[error("schema describes {expected} but the instance is {actual}")]
    InstanceMismatch {
        /// Type the schema describes.
        expected: ModelType,
        /// Type of the instance.
        actual: ModelType,
    },

    /// The model declares no field with this name.
    #[error("{model_type} has no field named `{field}`")]
    UnknownField {
        /// Model that was inspected.
        model_type: ModelType,
        /// Requested field name.
        field: String,
    },

    /// A field name was declared twice.
    #[error("{model_type} declares field `{field}` more than once")]
    DuplicateField {
        /// Model being described.
        model_type: ModelType,
        /// Repeated field name.
        field: &'static str,
    },

    /// A write targeted a field without a setter.
    #[error("field `{field}` on {model_type} is read-only")]
    ReadOnly {
        /// Model that was written.
        model_type: ModelType,
        /// Field without a setter.
        field: String,
    },

    /// A value of the wrong kind was converted.
    #[error("expected a {expected} value, found {actual}")]
    ValueKind {
        /// Kind the conversion required.
        expected: &'static str,
        /// Kind that was supplied.
        actual: &'static str,
    },
}

/// Syntax errors in a property path string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathSyntaxError {
    /// The path is the empty string.
    #[error("property path is empty")]
    Empty,

    /// A segment has no property name (`a..b`, `.a`, `[0]`).
    #[error("empty segment at byte {position}")]
    EmptySegment {
        /// Byte offset of the segment in the path.
        position: usize,
    },

    /// An `[` has no matching `]`.
    #[error("unclosed indexer in `{segment}`")]
    UnclosedIndexer {
        /// Offending segment.
        segment: String,
    },

    /// An indexer has no argument (`Items[]`).
    #[error("empty indexer in `{segment}`")]
    EmptyIndexer {
        /// Offending segment.
        segment: String,
    },

    /// Stray bracket or text between indexers.
    #[error("malformed segment `{segment}` at byte {position}")]
    Malformed {
        /// Offending segment.
        segment: String,
        /// Byte offset of the unexpected character in the path.
        position: usize,
    },
}

/// Errors raised while running a single validator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidatorError {
    /// The validator itself failed (I/O, remote check, bug).
    #[error("validator `{validator}` failed: {reason}")]
    Failed {
        /// Name of the failing validator.
        validator: String,
        /// What went wrong.
        reason: String,
    },

    /// The validator was handed an instance of another type.
    #[error("validator `{validator}` validates {expected} but was given {actual}")]
    TypeMismatch {
        /// Name of the validator.
        validator: String,
        /// Type the validator targets.
        expected: ModelType,
        /// Type it was given.
        actual: ModelType,
    },

    /// The validator exceeded its time budget.
    #[error("validator `{validator}` timed out after {elapsed_ms} ms")]
    TimedOut {
        /// Name of the validator.
        validator: String,
        /// Budget that was exceeded.
        elapsed_ms: u64,
    },
}

impl ValidatorError {
    /// Creates a [`ValidatorError::Failed`].
    pub fn failed(validator: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Failed {
            validator: validator.into(),
            reason: reason.to_string(),
        }
    }

    /// Name of the validator the error belongs to.
    pub fn validator(&self) -> &str {
        match self {
            Self::Failed { validator, .. }
            | Self::TypeMismatch { validator, .. }
            | Self::TimedOut { validator, .. } => validator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Customer;

    #[test]
    fn unknown_field_display_names_type_and_field() {
        let err = SchemaError::UnknownField {
            model_type: ModelType::of::<Customer>(),
            field: "Nope".into(),
        };
        assert_eq!(err.to_string(), "Customer has no field named `Nope`");
    }

    #[test]
    fn validator_name_is_reachable_from_every_variant() {
        let failed = ValidatorError::failed("uniqueness", "connection refused");
        assert_eq!(failed.validator(), "uniqueness");
        assert_eq!(
            failed.to_string(),
            "validator `uniqueness` failed: connection refused"
        );

        let timed_out = ValidatorError::TimedOut {
            validator: "slow".into(),
            elapsed_ms: 50,
        };
        assert_eq!(timed_out.validator(), "slow");
    }
}
