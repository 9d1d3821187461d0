//! Field values as seen through a schema getter.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::model::{Handle, Model, ModelRef, ModelType, model_addr};

// ============================================================================
// SCALAR
// ============================================================================

/// A primitive leaf value. The graph walker never descends into scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Scalar {
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    UInt(u64),
    /// Floating point number.
    Float(f64),
    /// Text.
    Text(String),
    /// Calendar date.
    Date(NaiveDate),
    /// Point in time.
    Timestamp(DateTime<Utc>),
}

impl Scalar {
    /// Short name of the scalar kind, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::UInt(_) => "uint",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Date(_) => "date",
            Self::Timestamp(_) => "timestamp",
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
            Self::Date(v) => write!(f, "{v}"),
            Self::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
        }
    }
}

// ============================================================================
// FIELD VALUE
// ============================================================================

/// The current value of a model field.
#[derive(Clone, Default)]
pub enum FieldValue {
    /// No value.
    #[default]
    Null,
    /// Primitive leaf.
    Scalar(Scalar),
    /// Nested model instance.
    Object(ModelRef),
    /// Ordered collection, indexable by position.
    List(Vec<FieldValue>),
    /// Keyed collection, indexable by string key.
    Map(IndexMap<String, FieldValue>),
}

impl FieldValue {
    /// Builds a list value from any iterable of convertible items.
    pub fn list<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<FieldValue>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Builds a keyed value from `(key, value)` pairs.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldValue>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Wraps a model handle.
    pub fn object<T: Model>(handle: &Handle<T>) -> Self {
        Self::Object(handle.to_model())
    }

    /// Whether this is [`FieldValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The nested instance, if this is an object.
    pub fn as_object(&self) -> Option<&ModelRef> {
        match self {
            Self::Object(model) => Some(model),
            _ => None,
        }
    }

    /// The scalar, if this is one.
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    /// The text, if this is a text scalar.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Scalar(Scalar::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// Recovers a typed handle from an object value.
    pub fn into_handle<T: Model>(self) -> Result<Handle<T>, SchemaError> {
        match self {
            Self::Object(model) => {
                let actual = model.model_type();
                Handle::downcast(&model).ok_or(SchemaError::InstanceMismatch {
                    expected: ModelType::of::<T>(),
                    actual,
                })
            }
            other => Err(kind_error("object", &other)),
        }
    }

    /// Short name of the value kind, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Scalar(scalar) => scalar.kind(),
            Self::Object(_) => "object",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Scalar(scalar) => f.debug_tuple("Scalar").field(scalar).finish(),
            Self::Object(model) => write!(
                f,
                "Object({}@{:#x})",
                model.model_type(),
                model_addr(model)
            ),
            Self::List(items) => f.debug_tuple("List").field(items).finish(),
            Self::Map(entries) => f.debug_tuple("Map").field(entries).finish(),
        }
    }
}

/// Objects compare by identity, everything else structurally.
impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Scalar(a), Self::Scalar(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => model_addr(a) == model_addr(b),
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            _ => false,
        }
    }
}

// ============================================================================
// CONVERSIONS INTO FIELD VALUES
// ============================================================================

macro_rules! scalar_from {
    ($($ty:ty => $variant:ident $(as $cast:ty)?),* $(,)?) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(value: $ty) -> Self {
                    Self::Scalar(Scalar::$variant(value $(as $cast)?))
                }
            }
        )*
    };
}

scalar_from! {
    bool => Bool,
    i8 => Int as i64,
    i16 => Int as i64,
    i32 => Int as i64,
    i64 => Int,
    u8 => UInt as u64,
    u16 => UInt as u64,
    u32 => UInt as u64,
    u64 => UInt,
    usize => UInt as u64,
    f32 => Float as f64,
    f64 => Float,
    String => Text,
    NaiveDate => Date,
    DateTime<Utc> => Timestamp,
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Scalar(Scalar::Text(value.to_owned()))
    }
}

impl From<&String> for FieldValue {
    fn from(value: &String) -> Self {
        Self::Scalar(Scalar::Text(value.clone()))
    }
}

impl From<Scalar> for FieldValue {
    fn from(value: Scalar) -> Self {
        Self::Scalar(value)
    }
}

impl From<ModelRef> for FieldValue {
    fn from(value: ModelRef) -> Self {
        Self::Object(value)
    }
}

impl<T: Model> From<&Handle<T>> for FieldValue {
    fn from(handle: &Handle<T>) -> Self {
        Self::object(handle)
    }
}

impl<T: Model> From<Handle<T>> for FieldValue {
    fn from(handle: Handle<T>) -> Self {
        Self::object(&handle)
    }
}

impl<V: Into<FieldValue>> From<Option<V>> for FieldValue {
    fn from(value: Option<V>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<V: Into<FieldValue>> From<Vec<V>> for FieldValue {
    fn from(items: Vec<V>) -> Self {
        Self::list(items)
    }
}

// ============================================================================
// CONVERSIONS OUT OF FIELD VALUES (used by setters)
// ============================================================================

fn kind_error(expected: &'static str, value: &FieldValue) -> SchemaError {
    SchemaError::ValueKind {
        expected,
        actual: value.kind(),
    }
}

impl TryFrom<FieldValue> for String {
    type Error = SchemaError;

    fn try_from(value: FieldValue) -> Result<Self, Self::Error> {
        match value {
            FieldValue::Scalar(Scalar::Text(text)) => Ok(text),
            other => Err(kind_error("text", &other)),
        }
    }
}

impl TryFrom<FieldValue> for Option<String> {
    type Error = SchemaError;

    fn try_from(value: FieldValue) -> Result<Self, Self::Error> {
        match value {
            FieldValue::Null => Ok(None),
            other => String::try_from(other).map(Some),
        }
    }
}

impl TryFrom<FieldValue> for bool {
    type Error = SchemaError;

    fn try_from(value: FieldValue) -> Result<Self, Self::Error> {
        match value {
            FieldValue::Scalar(Scalar::Bool(flag)) => Ok(flag),
            other => Err(kind_error("bool", &other)),
        }
    }
}

impl TryFrom<FieldValue> for i64 {
    type Error = SchemaError;

    fn try_from(value: FieldValue) -> Result<Self, Self::Error> {
        match value {
            FieldValue::Scalar(Scalar::Int(n)) => Ok(n),
            FieldValue::Scalar(Scalar::UInt(n)) => {
                Self::try_from(n).map_err(|_| kind_error("int", &FieldValue::from(n)))
            }
            other => Err(kind_error("int", &other)),
        }
    }
}

impl TryFrom<FieldValue> for i32 {
    type Error = SchemaError;

    fn try_from(value: FieldValue) -> Result<Self, Self::Error> {
        let wide = i64::try_from(value)?;
        Self::try_from(wide).map_err(|_| kind_error("i32", &FieldValue::from(wide)))
    }
}

impl TryFrom<FieldValue> for u64 {
    type Error = SchemaError;

    fn try_from(value: FieldValue) -> Result<Self, Self::Error> {
        match value {
            FieldValue::Scalar(Scalar::UInt(n)) => Ok(n),
            FieldValue::Scalar(Scalar::Int(n)) => {
                Self::try_from(n).map_err(|_| kind_error("uint", &FieldValue::from(n)))
            }
            other => Err(kind_error("uint", &other)),
        }
    }
}

impl TryFrom<FieldValue> for f64 {
    type Error = SchemaError;

    fn try_from(value: FieldValue) -> Result<Self, Self::Error> {
        match value {
            FieldValue::Scalar(Scalar::Float(n)) => Ok(n),
            FieldValue::Scalar(Scalar::Int(n)) => Ok(n as f64),
            FieldValue::Scalar(Scalar::UInt(n)) => Ok(n as f64),
            other => Err(kind_error("float", &other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaBuilder;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Default)]
    struct Leaf;

    impl Model for Leaf {
        fn describe(_schema: &mut SchemaBuilder<Self>) {}
    }

    #[test]
    fn primitives_become_scalars() {
        assert_eq!(FieldValue::from(15), FieldValue::Scalar(Scalar::Int(15)));
        assert_eq!(FieldValue::from(3_u8), FieldValue::Scalar(Scalar::UInt(3)));
        assert_eq!(FieldValue::from("a").as_text(), Some("a"));
        assert_eq!(FieldValue::from(None::<String>), FieldValue::Null);
        assert_eq!(FieldValue::from(Some(true)), FieldValue::Scalar(Scalar::Bool(true)));
    }

    #[test]
    fn objects_compare_by_identity() {
        let a = Handle::new(Leaf);
        let b = Handle::new(Leaf);

        assert_eq!(FieldValue::from(&a), FieldValue::from(a.clone()));
        assert_ne!(FieldValue::from(&a), FieldValue::from(&b));
    }

    #[test]
    fn list_and_map_builders() {
        let list = FieldValue::list(["x", "y"]);
        assert_eq!(list.kind(), "list");

        let map = FieldValue::map([("k", 1)]);
        match map {
            FieldValue::Map(entries) => assert_eq!(entries["k"], FieldValue::from(1)),
            other => panic!("expected map, got {other:?}"),
        }
    }

    #[test]
    fn try_from_reports_kind_mismatch() {
        let err = String::try_from(FieldValue::from(1)).unwrap_err();
        assert_eq!(
            err,
            SchemaError::ValueKind {
                expected: "text",
                actual: "int"
            }
        );
        assert_eq!(i32::try_from(FieldValue::from(12_u64)).unwrap(), 12);
        assert!(i32::try_from(FieldValue::from(i64::MAX)).is_err());
        assert_eq!(Option::<String>::try_from(FieldValue::Null).unwrap(), None);
    }

    #[test]
    fn into_handle_checks_type() {
        let leaf = Handle::new(Leaf);
        let back = FieldValue::from(&leaf).into_handle::<Leaf>().unwrap();
        assert!(back.ptr_eq(&leaf));
        assert!(FieldValue::Null.into_handle::<Leaf>().is_err());
    }

    #[test]
    fn scalar_serializes_tagged() {
        let json = serde_json::to_string(&Scalar::Int(4)).unwrap();
        assert_eq!(json, r#"{"type":"int","value":4}"#);
    }
}
