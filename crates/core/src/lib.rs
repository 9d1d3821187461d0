//! # fieldwise-core
//!
//! Model identity, schema descriptors and the validator capability shared by
//! every fieldwise crate.
//!
//! ## Key Components
//!
//! - **Models**: [`Model`], [`Handle`], [`ModelRef`], [`ModelType`]
//! - **Schemas**: [`SchemaBuilder`], [`ModelSchema`], [`ModelCatalog`]
//! - **Values**: [`FieldValue`], [`Scalar`]
//! - **Identity**: [`FieldIdentifier`], the `(instance, field)` message key
//! - **Paths**: [`PropertyPath`] and [`split_segments`]
//! - **Validators**: [`ModelValidator`], [`ValidationContext`], [`ErrorEntry`]
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fieldwise_core::prelude::*;
//!
//! #[derive(Default)]
//! struct Address { line1: String }
//!
//! impl Model for Address {
//!     fn describe(schema: &mut SchemaBuilder<Self>) {
//!         schema
//!             .scalar("Line1", |a| a.line1.as_str().into())
//!             .setter("Line1", |a, v| { a.line1 = v.try_into()?; Ok(()) });
//!     }
//! }
//!
//! let catalog = ModelCatalog::builder().register::<Address>().build()?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod catalog;
pub mod context;
pub mod entry;
pub mod error;
pub mod field;
pub mod model;
pub mod path;
pub mod schema;
pub mod validator;
pub mod value;

pub use catalog::{ModelCatalog, ModelCatalogBuilder};
pub use context::{Scope, ValidationContext};
pub use entry::ErrorEntry;
pub use error::{PathSyntaxError, SchemaError, ValidatorError};
pub use field::FieldIdentifier;
pub use model::{DynModel, Handle, Model, ModelRef, ModelType, model_addr};
pub use path::{PathPart, PathSegment, PropertyPath, split_segments};
pub use schema::{FieldInfo, FieldKind, ModelSchema, Schema, SchemaBuilder, Visibility};
pub use validator::{DynValidator, ModelValidator, ValidatorHandle, erase};
pub use value::{FieldValue, Scalar};

/// Common imports for model and validator authors.
pub mod prelude {
    pub use super::{
        ErrorEntry, FieldValue, Handle, Model, ModelCatalog, ModelValidator, PropertyPath,
        SchemaBuilder, SchemaError, Scope, ValidationContext, ValidatorError,
    };
}
