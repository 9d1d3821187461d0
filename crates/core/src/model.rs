//! Model identity and shared instance handles.
//!
//! A model is any application type that describes its fields through a
//! [`SchemaBuilder`]. Instances live behind a [`Handle<T>`] so the edit
//! context, the validators and the graph walker can all observe the same
//! allocation; the type-erased form is [`ModelRef`].

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::schema::SchemaBuilder;

// ============================================================================
// MODEL TYPE
// ============================================================================

/// Runtime identity of a model type.
///
/// Equality and hashing use the [`TypeId`] only; the name is carried for
/// diagnostics.
#[derive(Clone, Copy)]
pub struct ModelType {
    id: TypeId,
    name: &'static str,
}

impl ModelType {
    /// Returns the identity of `T`.
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The underlying [`TypeId`].
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path (`app::models::Customer` → `Customer`).
    pub fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        let start = base.rfind("::").map_or(0, |i| i + 2);
        &self.name[start..]
    }
}

impl PartialEq for ModelType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ModelType {}

impl Hash for ModelType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModelType({})", self.name)
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

// ============================================================================
// MODEL TRAITS
// ============================================================================

/// An application data object that can be validated and walked.
///
/// # Examples
///
/// ```rust,ignore
/// struct Address { line1: String }
///
/// impl Model for Address {
///     fn describe(schema: &mut SchemaBuilder<Self>) {
///         schema.scalar("Line1", |a| a.line1.as_str().into());
///     }
/// }
/// ```
pub trait Model: Send + Sync + 'static {
    /// Declares the fields of this model.
    fn describe(schema: &mut SchemaBuilder<Self>)
    where
        Self: Sized;
}

/// Object-safe view of a model instance.
///
/// Implemented for `RwLock<T>` so that a `Handle<T>` coerces directly into a
/// [`ModelRef`] pointing at the same allocation.
pub trait DynModel: Send + Sync + 'static {
    /// Runtime type of the wrapped model.
    fn model_type(&self) -> ModelType;

    /// Borrowed access for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Owned access for downcasting back into a typed handle.
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Model> DynModel for RwLock<T> {
    fn model_type(&self) -> ModelType {
        ModelType::of::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Type-erased shared reference to a model instance.
pub type ModelRef = Arc<dyn DynModel>;

/// Address of the instance behind `model`, used as its identity.
pub fn model_addr(model: &ModelRef) -> usize {
    Arc::as_ptr(model).cast::<()>().addr()
}

// ============================================================================
// HANDLE
// ============================================================================

/// Shared, lockable model instance.
///
/// Clones share the same instance; identity is the allocation.
pub struct Handle<T>(Arc<RwLock<T>>);

impl<T: Model> Handle<T> {
    /// Wraps `value` in a new shared instance.
    pub fn new(value: T) -> Self {
        Self(Arc::new(RwLock::new(value)))
    }

    /// Acquires a read lock on the instance.
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.0.read()
    }

    /// Acquires a write lock on the instance.
    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.0.write()
    }

    /// Type-erased reference to the same instance.
    pub fn to_model(&self) -> ModelRef {
        self.0.clone()
    }

    /// Recovers a typed handle from a type-erased reference.
    ///
    /// Returns `None` when `model` is not a `T`.
    pub fn downcast(model: &ModelRef) -> Option<Self> {
        Arc::clone(model)
            .into_any()
            .downcast::<RwLock<T>>()
            .ok()
            .map(Self)
    }

    /// Whether both handles point at the same instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Whether `model` is this very instance.
    pub fn is(&self, model: &ModelRef) -> bool {
        self.addr() == model_addr(model)
    }

    /// Address of the instance, used as its identity.
    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.0).cast::<()>().addr()
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: Model + Default> Default for Handle<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Model> From<T> for Handle<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // try_read: a Debug call while a writer holds the lock must not deadlock.
        match self.0.try_read() {
            Some(value) => f.debug_tuple("Handle").field(&*value).finish(),
            None => f.write_str("Handle(<locked>)"),
        }
    }
}
