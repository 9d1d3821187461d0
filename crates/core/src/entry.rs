//! Error entries emitted by validators.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::path::PropertyPath;

/// One validation failure, located by a property path relative to the
/// validated instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    /// Where the failure is (`FirstName`, `Address1.Line1`, `Items[2].Name`).
    pub property_path: String,
    /// Human-readable message.
    pub message: String,
    /// Machine-readable rule code (`not_empty`, `max_length`).
    #[serde(default = "ErrorEntry::default_code")]
    pub code: Cow<'static, str>,
}

impl ErrorEntry {
    /// Creates an entry with the generic `invalid` code.
    pub fn new(property_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            property_path: property_path.into(),
            message: message.into(),
            code: Self::default_code(),
        }
    }

    /// Sets the rule code.
    #[must_use = "builder methods must be chained or built"]
    pub fn with_code(mut self, code: impl Into<Cow<'static, str>>) -> Self {
        self.code = code.into();
        self
    }

    /// Re-roots the entry under `parent`, as a child validator's entries are
    /// reported by its parent.
    #[must_use]
    pub fn nested_under(mut self, parent: &PropertyPath) -> Self {
        self.property_path = parent.join(&self.property_path);
        self
    }

    fn default_code() -> Cow<'static, str> {
        Cow::Borrowed("invalid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn nested_entries_are_prefixed() {
        let entry = ErrorEntry::new("Line1", "'Line 1' must not be empty.")
            .with_code("not_empty")
            .nested_under(&PropertyPath::member("Customers").index(0).child("Address1"));
        assert_eq!(entry.property_path, "Customers[0].Address1.Line1");
        assert_eq!(entry.code, "not_empty");
    }

    #[test]
    fn code_defaults_when_absent_from_json() {
        let entry: ErrorEntry =
            serde_json::from_str(r#"{"property_path":"Grade","message":"out of range"}"#).unwrap();
        assert_eq!(entry, ErrorEntry::new("Grade", "out of range"));

        let json = serde_json::to_value(entry.with_code("range")).unwrap();
        assert_eq!(json["code"], "range");
    }
}
