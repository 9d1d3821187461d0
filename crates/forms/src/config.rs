//! Dispatch settings and host setup.

use std::sync::Arc;
use std::time::Duration;

use fieldwise_core::ModelCatalog;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::provider::{ProviderRepository, ProviderType, RuleValidationProvider};
use crate::registry::{ValidatorDefinition, ValidatorRegistry};
use crate::services::Services;

// ============================================================================
// DISPATCH SETTINGS
// ============================================================================

/// What a run does when one of its validators fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Abort the run and return the error. Nothing is committed.
    #[default]
    FailFast,
    /// Log the failure and continue without that validator's entries.
    SkipFailed,
}

/// How the validators of one run are scheduled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Concurrency {
    /// All validators are awaited together.
    #[default]
    Concurrent,
    /// One validator at a time, in registration order.
    Sequential,
}

/// Settings of a [`ValidationDispatcher`](crate::ValidationDispatcher).
///
/// ```rust,ignore
/// let config: DispatchConfig = serde_json::from_str(r#"{ "validator_timeout_ms": 500 }"#)?;
/// config.validate()?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Reaction to a failing validator.
    pub failure_policy: FailurePolicy,
    /// Scheduling of the validators of one run.
    pub concurrency: Concurrency,
    /// Time budget of a single validator call. `None` waits indefinitely.
    pub validator_timeout_ms: Option<u64>,
}

impl DispatchConfig {
    /// Checks the settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.validator_timeout_ms == Some(0) {
            return Err(ConfigError::InvalidSetting {
                setting: "validator_timeout_ms",
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }

    /// Per-validator time budget.
    pub fn validator_timeout(&self) -> Option<Duration> {
        self.validator_timeout_ms.map(Duration::from_millis)
    }
}

// ============================================================================
// HOST SETUP
// ============================================================================

/// Setup handle passed to the closure of [`add_form_validation`].
pub struct ValidationConfiguration<'a> {
    services: &'a mut Services,
    repository: Arc<ProviderRepository>,
}

impl<'a> ValidationConfiguration<'a> {
    /// The services being configured.
    pub fn services(&mut self) -> &mut Services {
        &mut *self.services
    }

    /// The provider repository attached forms initialize from.
    pub fn repository(&self) -> &Arc<ProviderRepository> {
        &self.repository
    }

    /// Sets the dispatch settings used by rule validation.
    pub fn with_dispatch(&mut self, config: DispatchConfig) -> Result<&mut Self, ConfigError> {
        config.validate()?;
        self.services.insert(config);
        Ok(self)
    }

    /// Enables rule-based validation: builds the validator registry from
    /// `definitions`, registers it with `catalog`, and adds
    /// [`RuleValidationProvider`] to the repository.
    pub fn add_rule_validation<I>(
        &mut self,
        catalog: ModelCatalog,
        definitions: I,
    ) -> Result<&mut Self, ConfigError>
    where
        I: IntoIterator<Item = Box<dyn ValidatorDefinition>>,
    {
        let registry = ValidatorRegistry::builder()
            .scan(definitions)
            .build(&mut *self.services)?;
        self.services.insert(catalog).insert(registry);
        self.repository
            .add(ProviderType::of::<RuleValidationProvider>());
        Ok(self)
    }
}

/// Registers form validation with `services`.
///
/// Creates the provider repository, registers it, and lets `configure`
/// enable validation providers.
///
/// ```rust,ignore
/// let mut services = Services::new();
/// add_form_validation(&mut services, |config| {
///     config.add_rule_validation(catalog, [definition("student", |_| Ok(student_rules()))])?;
///     Ok(())
/// })?;
/// let services = Arc::new(services);
/// ```
pub fn add_form_validation<F>(
    services: &mut Services,
    configure: F,
) -> Result<Arc<ProviderRepository>, ConfigError>
where
    F: FnOnce(&mut ValidationConfiguration<'_>) -> Result<(), ConfigError>,
{
    let repository = Arc::new(ProviderRepository::new());
    services.insert_arc(Arc::clone(&repository));

    let mut config = ValidationConfiguration {
        services,
        repository: Arc::clone(&repository),
    };
    configure(&mut config)?;
    Ok(repository)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_fill_missing_keys() {
        let config: DispatchConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, DispatchConfig::default());
        assert_eq!(config.failure_policy, FailurePolicy::FailFast);
        assert_eq!(config.concurrency, Concurrency::Concurrent);
        assert_eq!(config.validator_timeout(), None);
    }

    #[test]
    fn enums_use_snake_case() {
        let config: DispatchConfig = serde_json::from_str(
            r#"{
                "failure_policy": "skip_failed",
                "concurrency": "sequential",
                "validator_timeout_ms": 250
            }"#,
        )
        .unwrap();
        assert_eq!(config.failure_policy, FailurePolicy::SkipFailed);
        assert_eq!(config.concurrency, Concurrency::Sequential);
        assert_eq!(config.validator_timeout(), Some(Duration::from_millis(250)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = DispatchConfig {
            validator_timeout_ms: Some(0),
            ..DispatchConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSetting {
                setting: "validator_timeout_ms",
                ..
            })
        ));
    }

    #[test]
    fn setup_registers_repository_and_settings() {
        let mut services = Services::new();
        let repository = add_form_validation(&mut services, |config| {
            config.with_dispatch(DispatchConfig {
                concurrency: Concurrency::Sequential,
                ..DispatchConfig::default()
            })?;
            Ok(())
        })
        .unwrap();

        assert!(Arc::ptr_eq(
            &services.resolve::<ProviderRepository>().unwrap(),
            &repository
        ));
        assert_eq!(
            services.resolve::<DispatchConfig>().unwrap().concurrency,
            Concurrency::Sequential
        );
        assert!(repository.is_empty());
    }

    #[test]
    fn invalid_settings_fail_setup() {
        let mut services = Services::new();
        let err = add_form_validation(&mut services, |config| {
            config.with_dispatch(DispatchConfig {
                validator_timeout_ms: Some(0),
                ..DispatchConfig::default()
            })?;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSetting { .. }));
    }
}
