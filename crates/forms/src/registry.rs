//! Validator registry: model type to the validators that apply to it.

use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use fieldwise_core::{ModelType, ModelValidator, ValidatorHandle, erase};
use indexmap::IndexMap;

use crate::error::ConfigError;
use crate::services::Services;

// ============================================================================
// DEFINITIONS
// ============================================================================

/// A discoverable validator: a name, the model type it validates and a way
/// to build it from the registered services.
pub trait ValidatorDefinition: Send + Sync {
    /// Stable name, unique per target type.
    fn name(&self) -> &str;

    /// The model type the built validator validates, if it can be
    /// determined.
    fn target(&self) -> Option<ModelType>;

    /// Builds the validator.
    fn instantiate(&self, services: &Services) -> Result<ValidatorHandle, ConfigError>;
}

/// Defines a validator built by `factory`. The target is the factory's
/// [`ModelValidator::Model`].
///
/// ```rust,ignore
/// let definitions = vec![
///     definition("student", |_| Ok(student_rules())),
///     definition("unique_email", |services| {
///         Ok(UniqueEmail { directory: services.resolve()? })
///     }),
/// ];
/// ```
pub fn definition<V, F>(name: impl Into<String>, factory: F) -> Box<dyn ValidatorDefinition>
where
    V: ModelValidator,
    F: Fn(&Services) -> Result<V, ConfigError> + Send + Sync + 'static,
{
    Box::new(FactoryDefinition {
        name: name.into(),
        factory,
        _validator: PhantomData,
    })
}

struct FactoryDefinition<V, F> {
    name: String,
    factory: F,
    _validator: PhantomData<fn() -> V>,
}

impl<V, F> ValidatorDefinition for FactoryDefinition<V, F>
where
    V: ModelValidator,
    F: Fn(&Services) -> Result<V, ConfigError> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn target(&self) -> Option<ModelType> {
        Some(ModelType::of::<V::Model>())
    }

    fn instantiate(&self, services: &Services) -> Result<ValidatorHandle, ConfigError> {
        (self.factory)(services).map(erase)
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

/// Validators grouped by the exact model type they target.
///
/// Built once at startup and read-only afterwards, except for explicit
/// [`register`](Self::register) calls during setup.
#[derive(Default)]
pub struct ValidatorRegistry {
    validators: IndexMap<ModelType, Vec<ValidatorHandle>>,
}

impl ValidatorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a registry build from validator definitions.
    pub fn builder() -> ValidatorRegistryBuilder {
        ValidatorRegistryBuilder::default()
    }

    /// Registers `handle` under `model_type`.
    ///
    /// The handle must target exactly `model_type`. Registering the same
    /// handle twice keeps one entry.
    pub fn register(
        &mut self,
        model_type: ModelType,
        handle: ValidatorHandle,
    ) -> Result<(), ConfigError> {
        if handle.target() != model_type {
            return Err(ConfigError::TargetMismatch {
                validator: handle.name().to_owned(),
                expected: model_type,
                actual: handle.target(),
            });
        }
        let handles = self.validators.entry(model_type).or_default();
        if !handles.iter().any(|existing| Arc::ptr_eq(existing, &handle)) {
            handles.push(handle);
        }
        Ok(())
    }

    /// Validators for `model_type`, in registration order.
    pub fn lookup(&self, model_type: ModelType) -> &[ValidatorHandle] {
        self.validators
            .get(&model_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether any validator targets `model_type`.
    pub fn contains(&self, model_type: ModelType) -> bool {
        !self.lookup(model_type).is_empty()
    }

    /// Model types with at least one validator, in registration order.
    pub fn model_types(&self) -> impl Iterator<Item = ModelType> + '_ {
        self.validators.keys().copied()
    }

    /// Number of model types with validators.
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    /// Whether no validator is registered.
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Total number of registered validators.
    pub fn validator_count(&self) -> usize {
        self.validators.values().map(Vec::len).sum()
    }
}

impl fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (model_type, handles) in &self.validators {
            let names: Vec<_> = handles.iter().map(|h| h.name()).collect();
            map.entry(&model_type.short_name(), &names);
        }
        map.finish()
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Scans a closed set of [`ValidatorDefinition`]s into a
/// [`ValidatorRegistry`].
#[derive(Default)]
pub struct ValidatorRegistryBuilder {
    definitions: Vec<Box<dyn ValidatorDefinition>>,
}

impl ValidatorRegistryBuilder {
    /// Adds every definition from `definitions`, keeping their order.
    pub fn scan<I>(mut self, definitions: I) -> Self
    where
        I: IntoIterator<Item = Box<dyn ValidatorDefinition>>,
    {
        self.definitions.extend(definitions);
        self
    }

    /// Adds one definition.
    pub fn definition(mut self, definition: Box<dyn ValidatorDefinition>) -> Self {
        self.definitions.push(definition);
        self
    }

    /// Instantiates every definition and groups the validators by target.
    ///
    /// A definition whose name repeats for the same target is skipped; a name
    /// reused for a different target fails the build. Every validator built
    /// is also made resolvable by name through `services`.
    pub fn build(self, services: &mut Services) -> Result<ValidatorRegistry, ConfigError> {
        let mut registry = ValidatorRegistry::new();
        let mut seen = HashSet::new();

        for definition in &self.definitions {
            let target = definition
                .target()
                .ok_or_else(|| ConfigError::UndeterminedTarget {
                    definition: definition.name().to_owned(),
                })?;
            if !seen.insert((target, definition.name().to_owned())) {
                tracing::debug!(
                    definition = definition.name(),
                    model_type = %target,
                    "duplicate validator definition skipped"
                );
                continue;
            }

            let handle = definition.instantiate(services)?;
            services.register_validator(Arc::clone(&handle))?;
            registry.register(target, handle)?;
        }

        tracing::info!(
            model_types = registry.len(),
            validators = registry.validator_count(),
            "validator registry built"
        );
        Ok(registry)
    }
}

impl fmt::Debug for ValidatorRegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.definitions.iter().map(|d| d.name()).collect();
        f.debug_struct("ValidatorRegistryBuilder")
            .field("definitions", &names)
            .finish()
    }
}
