// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The document model shared by stores and caches.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name of the field holding the store-assigned document id.
pub const ID_FIELD: &str = "_id";

/// Name of the field holding the caller-supplied logical identifier.
pub const IDENTIFIER_FIELD: &str = "identifier";

/// A partial document: a set of top-level fields and their values.
pub type Fields = Map<String, Value>;

/// Name of a collection inside a document store.
///
/// Collections are fixed by the host at composition time, so a static string is enough.
pub type CollectionName = &'static str;

/// Returns `true` if `field` is one of the fields managed by the store and the cache.
#[must_use]
pub fn is_reserved_field(field: &str) -> bool {
    field == ID_FIELD || field == IDENTIFIER_FIELD
}

/// A store-assigned unique document id.
///
/// # Examples
///
/// ```
/// use docket_store::DocumentId;
///
/// let id = DocumentId::new("65f1c0de");
/// assert_eq!(id.as_str(), "65f1c0de");
/// assert_eq!(id.to_string(), "65f1c0de");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Creates an id from its string form.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the string form of the id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for DocumentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A document: a mapping from field name to value.
///
/// Stored documents always carry an [`ID_FIELD`] and an [`IDENTIFIER_FIELD`]. Every other
/// field belongs to the caller. Reading a field that was never set yields `None`.
///
/// # Examples
///
/// ```
/// use docket_store::Document;
/// use serde_json::json;
///
/// let mut document = Document::with_identifier("settings");
/// document.insert("motd", json!("hello"));
///
/// assert_eq!(document.identifier(), Some("settings"));
/// assert_eq!(document.get("motd"), Some(&json!("hello")));
/// assert!(document.get("missing").is_none());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Fields);

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a document holding only the logical identifier.
    pub fn with_identifier(identifier: impl Into<String>) -> Self {
        let mut fields = Fields::new();
        fields.insert(IDENTIFIER_FIELD.to_owned(), Value::String(identifier.into()));
        Self(fields)
    }

    /// Returns the store-assigned id, if the document carries a string `_id`.
    #[must_use]
    pub fn id(&self) -> Option<DocumentId> {
        self.0.get(ID_FIELD).and_then(Value::as_str).map(DocumentId::new)
    }

    /// Returns the logical identifier, if present.
    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        self.0.get(IDENTIFIER_FIELD).and_then(Value::as_str)
    }

    /// Returns the value of a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Returns `true` if the field is present.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Sets a field, returning the previous value.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    /// Removes a field, returning its value.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    /// Shallow merge: every top-level field in `fields` overwrites the field of the same name.
    ///
    /// Nested objects are replaced as a whole, never merged key by key.
    pub fn merge(&mut self, fields: Fields) {
        for (field, value) in fields {
            self.0.insert(field, value);
        }
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the document has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over field names and values.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Consumes the document and returns its field map.
    #[must_use]
    pub fn into_fields(self) -> Fields {
        self.0
    }
}

impl From<Fields> for Document {
    fn from(fields: Fields) -> Self {
        Self(fields)
    }
}

impl From<Document> for Value {
    fn from(document: Document) -> Self {
        Self::Object(document.into_fields())
    }
}

/// Exact-match filter used to locate a single document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Filter {
    /// Matches the document whose [`IDENTIFIER_FIELD`] equals the given string.
    Identifier(String),
    /// Matches the document whose [`ID_FIELD`] equals the given id.
    Id(DocumentId),
}

impl Filter {
    /// Creates a filter matching a logical identifier.
    pub fn identifier(identifier: impl Into<String>) -> Self {
        Self::Identifier(identifier.into())
    }

    /// Creates a filter matching a store-assigned id.
    #[must_use]
    pub fn id(id: DocumentId) -> Self {
        Self::Id(id)
    }

    /// Returns `true` if the document satisfies the filter.
    #[must_use]
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Self::Identifier(identifier) => document.identifier() == Some(identifier.as_str()),
            Self::Id(id) => document.get(ID_FIELD).and_then(Value::as_str) == Some(id.as_str()),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier(identifier) => write!(f, "{{{IDENTIFIER_FIELD}: {identifier:?}}}"),
            Self::Id(id) => write!(f, "{{{ID_FIELD}: {:?}}}", id.as_str()),
        }
    }
}

/// A single-field modification applied atomically by
/// [`DocumentStore::find_and_modify`](crate::DocumentStore::find_and_modify).
#[derive(Clone, Debug, PartialEq)]
pub enum Modification {
    /// Adds `delta` to an integer field. An absent field counts as zero.
    Increment {
        /// The field to increment.
        field: String,
        /// The amount to add.
        delta: i64,
    },
    /// Sets a field to a value, creating it if absent.
    Set {
        /// The field to set.
        field: String,
        /// The new value.
        value: Value,
    },
}

impl Modification {
    /// Creates an increment-by-`delta` modification.
    pub fn increment(field: impl Into<String>, delta: i64) -> Self {
        Self::Increment { field: field.into(), delta }
    }

    /// Creates a set-to-`value` modification.
    pub fn set(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Set {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Returns the field this modification touches.
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::Increment { field, .. } | Self::Set { field, .. } => field,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn stored(id: &str, identifier: &str) -> Document {
        let mut document = Document::with_identifier(identifier);
        document.insert(ID_FIELD, id);
        document
    }

    #[test]
    fn with_identifier_holds_only_the_identifier() {
        let document = Document::with_identifier("globals");
        assert_eq!(document.len(), 1);
        assert_eq!(document.identifier(), Some("globals"));
        assert!(document.id().is_none());
    }

    #[test]
    fn id_requires_a_string_value() {
        let mut document = Document::new();
        document.insert(ID_FIELD, 42);
        assert!(document.id().is_none());

        document.insert(ID_FIELD, "abc");
        assert_eq!(document.id(), Some(DocumentId::new("abc")));
    }

    #[test]
    fn merge_overwrites_top_level_fields_only() {
        let mut document = Document::with_identifier("x");
        document.insert("keep", 1);
        document.insert("nested", json!({"a": 1, "b": 2}));

        let mut fields = Fields::new();
        fields.insert("nested".to_owned(), json!({"a": 10}));
        fields.insert("new".to_owned(), json!(true));
        document.merge(fields);

        assert_eq!(document.get("keep"), Some(&json!(1)));
        assert_eq!(document.get("nested"), Some(&json!({"a": 10})));
        assert_eq!(document.get("new"), Some(&json!(true)));
        assert_eq!(document.identifier(), Some("x"));
    }

    #[test]
    fn filter_matches_by_identifier_and_id() {
        let document = stored("id-1", "settings");

        assert!(Filter::identifier("settings").matches(&document));
        assert!(!Filter::identifier("other").matches(&document));
        assert!(Filter::id(DocumentId::new("id-1")).matches(&document));
        assert!(!Filter::id(DocumentId::new("id-2")).matches(&document));
    }

    #[test]
    fn filter_display_names_the_field() {
        assert_eq!(Filter::identifier("a").to_string(), r#"{identifier: "a"}"#);
        assert_eq!(Filter::id(DocumentId::new("b")).to_string(), r#"{_id: "b"}"#);
    }

    #[test]
    fn reserved_fields() {
        assert!(is_reserved_field(ID_FIELD));
        assert!(is_reserved_field(IDENTIFIER_FIELD));
        assert!(!is_reserved_field("counter"));
    }

    #[test]
    fn document_serializes_as_plain_object() {
        let document = stored("id-1", "settings");
        let value = serde_json::to_value(&document).unwrap();
        assert_eq!(value, json!({"_id": "id-1", "identifier": "settings"}));

        let back: Document = serde_json::from_value(value).unwrap();
        assert_eq!(back, document);
    }

    #[test]
    fn field_accessors() {
        let mut document = Document::from(Fields::new());
        assert!(document.is_empty());

        document.insert("a", 1);
        document.insert("b", "two");
        assert!(document.contains("a"));
        assert!(!document.contains("c"));

        let names: Vec<&String> = document.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["a", "b"]);

        let fields = document.into_fields();
        assert_eq!(fields.get("b"), Some(&json!("two")));
        assert_eq!(Value::from(Document::from(fields)), json!({"a": 1, "b": "two"}));
    }

    #[test]
    fn modification_field() {
        assert_eq!(Modification::increment("n", 2).field(), "n");
        assert_eq!(Modification::set("m", 1).field(), "m");
    }
}
