//! # fieldwise
//!
//! Validator dispatch for edit forms bound to in-memory model graphs.
//!
//! A form binds an [`EditContext`] to a model instance. Attaching a
//! [`FormValidator`] initializes every registered [`ValidationProvider`]
//! against that context; the built-in [`RuleValidationProvider`] runs the
//! validators of the [`ValidatorRegistry`] whenever a field changes or the
//! whole form is validated, and maps each reported property path back to
//! the `(instance, field)` it names.
//!
//! ## Key Components
//!
//! - **Setup**: [`Services`], [`add_form_validation`], [`ValidatorRegistry`]
//! - **Forms**: [`EditContext`], [`FormValidator`], [`EditContextExt`]
//! - **Dispatch**: [`ValidationDispatcher`], [`DispatchConfig`], [`MessageStore`]
//! - **Graphs**: [`FieldPathResolver`], [`ObjectGraphWalker`]
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fieldwise::prelude::*;
//!
//! let mut services = Services::new();
//! add_form_validation(&mut services, |config| {
//!     config.add_rule_validation(catalog, [definition("student", |_| Ok(student_rules()))])?;
//!     Ok(())
//! })?;
//!
//! let ctx = Arc::new(EditContext::for_handle(&student));
//! let mut form = FormValidator::new(Arc::new(services));
//! form.set_edit_context(Some(Arc::clone(&ctx)))?;
//!
//! if !ctx.validate().await? {
//!     for message in ctx.validation_messages() {
//!         println!("{message}");
//!     }
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod component;
pub mod config;
pub mod dispatcher;
pub mod edit;
pub mod error;
pub mod messages;
pub mod path;
pub mod provider;
pub mod registry;
pub mod services;
pub mod tree;
pub mod walker;

pub use component::FormValidator;
pub use config::{
    Concurrency, DispatchConfig, FailurePolicy, ValidationConfiguration, add_form_validation,
};
pub use dispatcher::{RunOutcome, RunState, ValidationDispatcher};
pub use edit::{EditContext, EditContextListener, FieldState};
pub use error::{ConfigError, DispatchError, PathError};
pub use messages::MessageStore;
pub use path::FieldPathResolver;
pub use provider::{
    FromServices, ProviderRepository, ProviderType, RuleValidationProvider, ValidationProvider,
};
pub use registry::{ValidatorDefinition, ValidatorRegistry, ValidatorRegistryBuilder, definition};
pub use services::Services;
pub use tree::EditContextExt;
pub use walker::{ObjectGraphWalker, WalkSummary};

/// Common imports for hosts wiring validation into forms.
pub mod prelude {
    pub use super::{
        DispatchConfig, EditContext, EditContextExt, FormValidator, Services,
        add_form_validation, definition,
    };
    pub use fieldwise_core::prelude::*;
    pub use fieldwise_core::{FieldIdentifier, ModelRef};
    pub use fieldwise_rules::prelude::*;
}
