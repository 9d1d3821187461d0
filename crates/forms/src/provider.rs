//! Validation providers: pluggable ways of wiring validation into an edit
//! context.

use std::any::{TypeId, type_name};
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use fieldwise_core::{FieldIdentifier, ModelCatalog};
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

use crate::config::DispatchConfig;
use crate::dispatcher::ValidationDispatcher;
use crate::edit::{EditContext, EditContextListener};
use crate::error::{ConfigError, DispatchError};
use crate::registry::ValidatorRegistry;
use crate::services::Services;

/// Wires validation into an edit context.
pub trait ValidationProvider: Send + Sync {
    /// Subscribes to `ctx` so that its events trigger validation.
    fn initialize(&self, ctx: &Arc<EditContext>, services: &Arc<Services>)
    -> Result<(), ConfigError>;
}

/// Construction from registered services.
pub trait FromServices: Sized {
    /// Builds `Self` from `services`.
    fn from_services(services: &Services) -> Result<Self, ConfigError>;
}

type Construct = fn(&Services) -> Result<Arc<dyn ValidationProvider>, ConfigError>;

/// A registrable provider type.
///
/// Only types that are both a [`ValidationProvider`] and [`FromServices`]
/// can be named.
#[derive(Clone, Copy)]
pub struct ProviderType {
    id: TypeId,
    name: &'static str,
    construct: Construct,
}

impl ProviderType {
    /// The provider type `P`.
    pub fn of<P>() -> Self
    where
        P: ValidationProvider + FromServices + 'static,
    {
        Self {
            id: TypeId::of::<P>(),
            name: type_name::<P>(),
            construct: construct::<P>,
        }
    }

    /// Type identity of the provider.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Type name of the provider.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Builds a provider instance from `services`.
    pub fn construct(
        &self,
        services: &Services,
    ) -> Result<Arc<dyn ValidationProvider>, ConfigError> {
        (self.construct)(services)
    }
}

fn construct<P>(services: &Services) -> Result<Arc<dyn ValidationProvider>, ConfigError>
where
    P: ValidationProvider + FromServices + 'static,
{
    P::from_services(services)
        .map(|provider| Arc::new(provider) as Arc<dyn ValidationProvider>)
        .map_err(|err| ConfigError::ProviderConstruction {
            provider: type_name::<P>(),
            reason: err.to_string(),
        })
}

impl PartialEq for ProviderType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ProviderType {}

impl fmt::Debug for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProviderType({})", self.name)
    }
}

// ============================================================================
// REPOSITORY
// ============================================================================

/// The provider types every attached form initializes.
#[derive(Debug, Default)]
pub struct ProviderRepository {
    providers: RwLock<Vec<ProviderType>>,
}

impl ProviderRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a provider type. Returns `false` if it was already present.
    pub fn add(&self, provider: ProviderType) -> bool {
        let mut providers = self.providers.write();
        if providers.contains(&provider) {
            return false;
        }
        tracing::debug!(provider = provider.name(), "validation provider added");
        providers.push(provider);
        true
    }

    /// Removes the provider type `id`. Returns whether it was present.
    pub fn remove(&self, id: TypeId) -> bool {
        let mut providers = self.providers.write();
        let before = providers.len();
        providers.retain(|p| p.id() != id);
        providers.len() != before
    }

    /// Registered provider types, in insertion order.
    pub fn providers(&self) -> Vec<ProviderType> {
        self.providers.read().clone()
    }

    /// Whether the provider type `id` is registered.
    pub fn contains(&self, id: TypeId) -> bool {
        self.providers.read().iter().any(|p| p.id() == id)
    }

    /// Number of registered provider types.
    pub fn len(&self) -> usize {
        self.providers.read().len()
    }

    /// Whether no provider is registered.
    pub fn is_empty(&self) -> bool {
        self.providers.read().is_empty()
    }
}

// ============================================================================
// RULE VALIDATION PROVIDER
// ============================================================================

/// Runs the validators of the [`ValidatorRegistry`] on edit-context events.
///
/// Each initialized context gets its own message store and dispatcher:
/// field changes validate that field, validation requests validate the
/// whole model.
#[derive(Debug)]
pub struct RuleValidationProvider {
    catalog: Arc<ModelCatalog>,
    registry: Arc<ValidatorRegistry>,
    config: DispatchConfig,
}

impl FromServices for RuleValidationProvider {
    fn from_services(services: &Services) -> Result<Self, ConfigError> {
        let config = services
            .get::<DispatchConfig>()
            .map(|config| (*config).clone())
            .unwrap_or_default();
        config.validate()?;
        Ok(Self {
            catalog: services.resolve()?,
            registry: services.resolve()?,
            config,
        })
    }
}

impl ValidationProvider for RuleValidationProvider {
    fn initialize(
        &self,
        ctx: &Arc<EditContext>,
        _services: &Arc<Services>,
    ) -> Result<(), ConfigError> {
        let dispatcher = ValidationDispatcher::new(
            Arc::clone(&self.catalog),
            Arc::clone(&self.registry),
            ctx.create_message_store(),
            self.config.clone(),
        );
        ctx.add_listener(Arc::new(DispatchListener {
            dispatcher: Arc::new(dispatcher),
        }));
        tracing::debug!(
            model_type = ?ctx.model().map(|m| m.model_type()),
            "rule validation attached"
        );
        Ok(())
    }
}

/// Forwards edit-context events to a dispatcher.
struct DispatchListener {
    dispatcher: Arc<ValidationDispatcher>,
}

#[async_trait]
impl EditContextListener for DispatchListener {
    async fn field_changed(
        &self,
        ctx: &EditContext,
        field: &FieldIdentifier,
        cancel: &CancellationToken,
    ) -> Result<(), DispatchError> {
        self.dispatcher.validate_field(ctx, field, cancel).await?;
        Ok(())
    }

    async fn validation_requested(
        &self,
        ctx: &EditContext,
        cancel: &CancellationToken,
    ) -> Result<(), DispatchError> {
        self.dispatcher.validate_model(ctx, cancel).await?;
        Ok(())
    }
}
