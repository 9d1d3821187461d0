//! Error types for setup, path resolution and validation runs.

use fieldwise_core::{FieldIdentifier, ModelType, PathSyntaxError, SchemaError, ValidatorError};

/// Errors surfaced while wiring validation into a host.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A validator definition does not name the model type it validates.
    #[error("validator definition `{definition}` has no determinable target model type")]
    UndeterminedTarget {
        /// Name of the definition.
        definition: String,
    },

    /// A validator was registered under a type other than its target.
    #[error("validator `{validator}` targets {actual} but was registered for {expected}")]
    TargetMismatch {
        /// Name of the validator.
        validator: String,
        /// Type it was registered under.
        expected: ModelType,
        /// Type it actually validates.
        actual: ModelType,
    },

    /// Two validators for different model types share a name, so one of
    /// them could not be resolved by name.
    #[error("validator name `{name}` is used for both {registered} and {conflicting}")]
    ConflictingValidatorName {
        /// The shared name.
        name: String,
        /// Target of the validator registered first.
        registered: ModelType,
        /// Target of the rejected validator.
        conflicting: ModelType,
    },

    /// No service of the requested type was registered.
    #[error("no service of type `{type_name}` is registered")]
    UnresolvedService {
        /// Requested type.
        type_name: &'static str,
    },

    /// No validator with the requested name was registered.
    #[error("no validator named `{name}` is registered")]
    UnresolvedValidator {
        /// Requested name.
        name: String,
    },

    /// A form validator was attached without an edit context.
    #[error("form validation requires an edit context")]
    MissingEditContext,

    /// A configuration value is out of range.
    #[error("invalid setting `{setting}`: {reason}")]
    InvalidSetting {
        /// Setting name.
        setting: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// A provider could not be built from the registered services.
    #[error("provider `{provider}` could not be constructed: {reason}")]
    ProviderConstruction {
        /// Provider type name.
        provider: &'static str,
        /// Underlying failure.
        reason: String,
    },

    /// The model catalog could not be built.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Errors resolving a property path against an instance.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// The path string is malformed.
    #[error(transparent)]
    Syntax(#[from] PathSyntaxError),

    /// A segment names a property the model does not declare.
    #[error("{model_type} has no property `{segment}`")]
    UnknownProperty {
        /// Model being traversed.
        model_type: ModelType,
        /// Offending segment name.
        segment: String,
    },

    /// An indexer was applied to a property that is not a collection.
    #[error("property `{property}` on {model_type} is not indexable (segment `{segment}`)")]
    NotIndexable {
        /// Model being traversed.
        model_type: ModelType,
        /// Property the indexer was applied to.
        property: String,
        /// Full segment text.
        segment: String,
    },

    /// An indexer argument could not be converted to the indexer's type.
    #[error("indexer argument `{argument}` in `{segment}` is not a valid {expected}")]
    BadIndexArgument {
        /// Full segment text.
        segment: String,
        /// Raw argument.
        argument: String,
        /// Parameter type the indexer takes.
        expected: &'static str,
    },

    /// A positional indexer is past the end of the collection.
    #[error("index {index} in `{segment}` is out of range for a collection of {len}")]
    IndexOutOfRange {
        /// Full segment text.
        segment: String,
        /// Requested position.
        index: usize,
        /// Collection length.
        len: usize,
    },

    /// A keyed indexer names a missing key.
    #[error("key `{key}` in `{segment}` is not present")]
    MissingKey {
        /// Full segment text.
        segment: String,
        /// Requested key.
        key: String,
    },

    /// The path continues past a value that is not a model instance.
    #[error("cannot descend into `{segment}` on {model_type}: value is {kind}, not an object")]
    NotAnObject {
        /// Model being traversed.
        model_type: ModelType,
        /// Full segment text.
        segment: String,
        /// Kind of the value found.
        kind: &'static str,
    },

    /// A model on the path has no schema.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Errors from a validation run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// The edit context has no model.
    #[error("the edit context has no model to validate")]
    MissingModel,

    /// The instance owning the field has been dropped.
    #[error("the instance owning {field} no longer exists")]
    OwnerDropped {
        /// Field whose owner is gone.
        field: FieldIdentifier,
    },

    /// An error entry's path could not be mapped to a field.
    #[error(transparent)]
    Path(#[from] PathError),

    /// A validator failed.
    #[error(transparent)]
    Validator(#[from] ValidatorError),

    /// A model schema was missing or rejected the instance.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The run was cancelled before it committed.
    #[error("validation run was cancelled")]
    Cancelled,

    /// A multi-property validation was requested with no properties.
    #[error("at least one property must be given")]
    NoProperties,
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Customer;

    #[test]
    fn path_errors_name_the_segment_and_type() {
        let err = PathError::UnknownProperty {
            model_type: ModelType::of::<Customer>(),
            segment: "Adress1".into(),
        };
        assert_eq!(err.to_string(), "Customer has no property `Adress1`");

        let err = PathError::IndexOutOfRange {
            segment: "Items[9]".into(),
            index: 9,
            len: 3,
        };
        assert_eq!(
            err.to_string(),
            "index 9 in `Items[9]` is out of range for a collection of 3"
        );
    }

    #[test]
    fn lower_layer_errors_convert() {
        let err: DispatchError = PathError::from(PathSyntaxError::Empty).into();
        assert!(matches!(err, DispatchError::Path(PathError::Syntax(_))));

        let err: DispatchError = ValidatorError::failed("v", "boom").into();
        assert_eq!(err.to_string(), "validator `v` failed: boom");
    }
}
