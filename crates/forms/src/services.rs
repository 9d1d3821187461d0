//! Service resolution.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use fieldwise_core::ValidatorHandle;
use indexmap::IndexMap;

use crate::error::ConfigError;

/// Type-keyed service container plus a by-name validator directory.
///
/// Populated during setup and shared behind an `Arc` afterwards.
///
/// ```rust,ignore
/// let mut services = Services::new();
/// services.insert(catalog);
/// let catalog: Arc<ModelCatalog> = services.resolve()?;
/// ```
#[derive(Default)]
pub struct Services {
    by_type: HashMap<TypeId, (&'static str, Arc<dyn Any + Send + Sync>)>,
    validators: IndexMap<String, ValidatorHandle>,
}

impl Services {
    /// Creates an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `service`, replacing any previous service of the same type.
    pub fn insert<T: Send + Sync + 'static>(&mut self, service: T) -> &mut Self {
        self.insert_arc(Arc::new(service))
    }

    /// Registers an already shared service.
    pub fn insert_arc<T: Send + Sync + 'static>(&mut self, service: Arc<T>) -> &mut Self {
        let service: Arc<dyn Any + Send + Sync> = service;
        self.by_type
            .insert(TypeId::of::<T>(), (type_name::<T>(), service));
        self
    }

    /// The service of type `T`, if registered.
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        let (_, service) = self.by_type.get(&TypeId::of::<T>())?;
        Arc::clone(service).downcast::<T>().ok()
    }

    /// The service of type `T`.
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ConfigError> {
        self.get::<T>().ok_or(ConfigError::UnresolvedService {
            type_name: type_name::<T>(),
        })
    }

    /// Whether a service of type `T` is registered.
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.by_type.contains_key(&TypeId::of::<T>())
    }

    /// Makes `validator` resolvable by its name.
    ///
    /// Names are unique across model types. Re-registering a name for the
    /// same target keeps the first validator; a name already taken by
    /// another target is rejected.
    pub fn register_validator(&mut self, validator: ValidatorHandle) -> Result<(), ConfigError> {
        let name = validator.name();
        if let Some(existing) = self.validators.get(name) {
            if existing.target() != validator.target() {
                return Err(ConfigError::ConflictingValidatorName {
                    name: name.to_owned(),
                    registered: existing.target(),
                    conflicting: validator.target(),
                });
            }
            tracing::debug!(validator = %name, "validator name already registered, keeping first");
            return Ok(());
        }
        self.validators.insert(name.to_owned(), validator);
        Ok(())
    }

    /// The validator registered as `name`.
    pub fn resolve_validator(&self, name: &str) -> Result<ValidatorHandle, ConfigError> {
        self.validators
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnresolvedValidator {
                name: name.to_owned(),
            })
    }

    /// Names of all resolvable validators, in registration order.
    pub fn validator_names(&self) -> Vec<&str> {
        self.validators.keys().map(String::as_str).collect()
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut services: Vec<_> = self.by_type.values().map(|(name, _)| *name).collect();
        services.sort_unstable();
        f.debug_struct("Services")
            .field("services", &services)
            .field("validators", &self.validator_names())
            .finish()
    }
}
