//! Record model shared by storage collaborators and search backends.
//!
//! A [`RecordType`] is an explicit schema descriptor: its name, an optional
//! parent type, and an ordered list of [`IndexedField`]s. Each field either
//! reads a stored attribute or runs a derivation over the whole record.
//!
//! ```rust
//! use quarry_core::record::{FieldValue, IndexedField, Record, RecordType};
//!
//! let page = RecordType::new("Page")
//!     .field(IndexedField::text("title").filterable())
//!     .field(IndexedField::boolean("live"));
//!
//! let record = Record::new("Page", 1)
//!     .with("title", "Hello World")
//!     .with("live", true);
//!
//! assert_eq!(page.fields()[0].value_for(&record), FieldValue::from("Hello World"));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

// ============================================================================
// Values and identity
// ============================================================================

/// Primary key of a stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrimaryKey(pub i64);

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for PrimaryKey {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<i32> for PrimaryKey {
    fn from(value: i32) -> Self {
        Self(i64::from(value))
    }
}

impl From<u32> for PrimaryKey {
    fn from(value: u32) -> Self {
        Self(i64::from(value))
    }
}

/// A single field value, either stored on a record or produced for a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Absent or null value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer value.
    Int(i64),
    /// Text value.
    Text(String),
}

impl FieldValue {
    /// Returns `true` for [`FieldValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Text that contributes to full-text matching, if any.
    ///
    /// Booleans and nulls carry no searchable text.
    pub fn searchable_text(&self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s.clone()),
            Self::Int(i) => Some(i.to_string()),
            Self::Bool(_) | Self::Null => None,
        }
    }

    /// Check whether this value may be stored in a field of `kind`.
    ///
    /// Null conforms to every kind.
    pub fn conforms_to(&self, kind: FieldKind) -> bool {
        matches!(
            (self, kind),
            (Self::Null, _)
                | (Self::Bool(_), FieldKind::Boolean)
                | (Self::Int(_), FieldKind::Integer)
                | (Self::Text(_), FieldKind::Text)
        )
    }

    /// Convert to a value of `kind`, parsing text operands when needed.
    ///
    /// Returns `None` when the value cannot represent `kind`.
    pub fn coerce_to(&self, kind: FieldKind) -> Option<FieldValue> {
        if self.conforms_to(kind) {
            return Some(self.clone());
        }
        match (self, kind) {
            (Self::Text(raw), FieldKind::Boolean) => raw.trim().parse().ok().map(Self::Bool),
            (Self::Text(raw), FieldKind::Integer) => raw.trim().parse().ok().map(Self::Int),
            (Self::Bool(b), FieldKind::Text) => Some(Self::Text(b.to_string())),
            (Self::Int(i), FieldKind::Text) => Some(Self::Text(i.to_string())),
            _ => None,
        }
    }

    /// Stable, type-tagged encoding used for exact-match facet terms.
    pub fn canonical(&self) -> String {
        match self {
            Self::Null => "n:".to_string(),
            Self::Bool(b) => format!("b:{b}"),
            Self::Int(i) => format!("i:{i}"),
            Self::Text(s) => format!("s:{s}"),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}

// ============================================================================
// Record
// ============================================================================

/// A stored record as handed out by the storage collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Name of the record's concrete type.
    #[serde(rename = "type")]
    pub record_type: String,
    /// Primary key, unique within the concrete type.
    pub pk: PrimaryKey,
    /// Stored attributes.
    #[serde(default)]
    pub attributes: BTreeMap<String, FieldValue>,
}

impl Record {
    /// Create a record with no attributes.
    pub fn new(record_type: impl Into<String>, pk: impl Into<PrimaryKey>) -> Self {
        Self {
            record_type: record_type.into(),
            pk: pk.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Set an attribute, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Set an attribute in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Read an attribute.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.attributes.get(name)
    }
}

// ============================================================================
// Schema descriptors
// ============================================================================

/// Declared kind of an indexed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Free text.
    #[default]
    Text,
    /// True/false flag.
    Boolean,
    /// Signed integer.
    Integer,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Boolean => write!(f, "boolean"),
            Self::Integer => write!(f, "integer"),
        }
    }
}

/// Zero-argument derivation evaluated against a record at index time.
pub type Derivation = Arc<dyn Fn(&Record) -> FieldValue + Send + Sync>;

/// Where an indexed field's value comes from.
#[derive(Clone)]
pub enum FieldSource {
    /// Read the named stored attribute.
    Attribute(String),
    /// Compute the value from the record.
    Derived(Derivation),
}

impl FieldSource {
    fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Attribute(a), Self::Attribute(b)) => a == b,
            (Self::Derived(a), Self::Derived(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for FieldSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attribute(name) => f.debug_tuple("Attribute").field(name).finish(),
            Self::Derived(_) => f.debug_tuple("Derived").field(&"<fn>").finish(),
        }
    }
}

/// A named value included in a record's search document.
#[derive(Debug, Clone)]
pub struct IndexedField {
    name: String,
    source: FieldSource,
    kind: FieldKind,
    searchable: bool,
    filterable: bool,
    boost: f32,
}

impl IndexedField {
    fn attribute(name: impl Into<String>, kind: FieldKind) -> Self {
        let name = name.into();
        Self {
            source: FieldSource::Attribute(name.clone()),
            name,
            kind,
            searchable: false,
            filterable: false,
            boost: 1.0,
        }
    }

    /// Searchable text attribute.
    pub fn text(name: impl Into<String>) -> Self {
        Self::attribute(name, FieldKind::Text).searchable()
    }

    /// Filterable boolean attribute.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::attribute(name, FieldKind::Boolean).filterable()
    }

    /// Filterable integer attribute.
    pub fn integer(name: impl Into<String>) -> Self {
        Self::attribute(name, FieldKind::Integer).filterable()
    }

    /// Searchable field computed from the record.
    pub fn derived<F>(name: impl Into<String>, kind: FieldKind, derive: F) -> Self
    where
        F: Fn(&Record) -> FieldValue + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            source: FieldSource::Derived(Arc::new(derive)),
            kind,
            searchable: kind == FieldKind::Text,
            filterable: false,
            boost: 1.0,
        }
    }

    /// Read the value from a differently named attribute.
    pub fn from_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.source = FieldSource::Attribute(attribute.into());
        self
    }

    /// Include the field in full-text matching.
    pub fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    /// Allow filter predicates on the field.
    pub fn filterable(mut self) -> Self {
        self.filterable = true;
        self
    }

    /// Relevance weight applied to text matches in this field.
    ///
    /// Weights that are not positive and finite are ignored.
    pub fn boost(mut self, boost: f32) -> Self {
        if valid_boost(boost) {
            self.boost = boost;
        } else {
            log::warn!("Ignoring boost {boost} on field '{}': must be positive", self.name);
        }
        self
    }

    /// Field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value source.
    pub fn source(&self) -> &FieldSource {
        &self.source
    }

    /// Declared kind.
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Whether the field takes part in full-text matching.
    pub fn is_searchable(&self) -> bool {
        self.searchable
    }

    /// Whether filter predicates may target the field.
    pub fn is_filterable(&self) -> bool {
        self.filterable
    }

    /// Relevance weight.
    pub fn boost_factor(&self) -> f32 {
        self.boost
    }

    /// Produce this field's value for `record`.
    ///
    /// Missing attributes map to [`FieldValue::Null`].
    pub fn value_for(&self, record: &Record) -> FieldValue {
        match &self.source {
            FieldSource::Attribute(attr) => record.get(attr).cloned().unwrap_or_default(),
            FieldSource::Derived(derive) => derive(record),
        }
    }

    /// Structural equality; derivations compare by identity.
    pub fn same_schema(&self, other: &Self) -> bool {
        self.name == other.name
            && self.kind == other.kind
            && self.searchable == other.searchable
            && self.filterable == other.filterable
            && self.boost == other.boost
            && self.source.same_as(&other.source)
    }
}

/// Whether `boost` is usable as a relevance weight.
pub fn valid_boost(boost: f32) -> bool {
    boost.is_finite() && boost > 0.0
}

/// Schema of a searchable record type.
#[derive(Debug, Clone)]
pub struct RecordType {
    name: String,
    parent: Option<String>,
    fields: Vec<IndexedField>,
}

impl RecordType {
    /// Create a record type with no fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            fields: Vec::new(),
        }
    }

    /// Declare this type a subtype of `parent`.
    pub fn child_of(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Add a field. A field with the same name replaces the earlier one.
    pub fn field(mut self, field: IndexedField) -> Self {
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
        self
    }

    /// Type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent type name, if any.
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Fields declared directly on this type.
    pub fn fields(&self) -> &[IndexedField] {
        &self.fields
    }

    /// Look up a directly declared field.
    pub fn get_field(&self, name: &str) -> Option<&IndexedField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Structural equality of the declared schema.
    pub fn same_schema(&self, other: &Self) -> bool {
        self.name == other.name
            && self.parent == other.parent
            && self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .zip(&other.fields)
                .all(|(a, b)| a.same_schema(b))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_conversions() {
        assert_eq!(FieldValue::from(true), FieldValue::Bool(true));
        assert_eq!(FieldValue::from(7), FieldValue::Int(7));
        assert_eq!(FieldValue::from("x"), FieldValue::Text("x".to_string()));
        assert_eq!(FieldValue::from(None::<bool>), FieldValue::Null);
    }

    #[test]
    fn test_field_value_conforms_to() {
        assert!(FieldValue::Null.conforms_to(FieldKind::Boolean));
        assert!(FieldValue::Bool(true).conforms_to(FieldKind::Boolean));
        assert!(!FieldValue::Bool(true).conforms_to(FieldKind::Text));
        assert!(!FieldValue::from("1").conforms_to(FieldKind::Integer));
    }

    #[test]
    fn test_canonical_is_type_tagged() {
        assert_ne!(
            FieldValue::from("1").canonical(),
            FieldValue::from(1).canonical()
        );
        assert_eq!(FieldValue::Bool(false).canonical(), "b:false");
    }

    #[test]
    fn test_field_value_serde_untagged() {
        let json = r#"{"type":"Page","pk":3,"attributes":{"title":"Hi","live":true,"n":2,"x":null}}"#;
        let record: Record = serde_json::from_str(json).unwrap();
        assert_eq!(record.pk, PrimaryKey(3));
        assert_eq!(record.get("title"), Some(&FieldValue::from("Hi")));
        assert_eq!(record.get("live"), Some(&FieldValue::Bool(true)));
        assert_eq!(record.get("n"), Some(&FieldValue::Int(2)));
        assert_eq!(record.get("x"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_value_for_missing_attribute_is_null() {
        let field = IndexedField::text("title");
        let record = Record::new("Page", 1);
        assert_eq!(field.value_for(&record), FieldValue::Null);
    }

    #[test]
    fn test_value_for_derived() {
        let field = IndexedField::derived("shout", FieldKind::Text, |r| {
            r.get("title")
                .map(|v| FieldValue::from(v.to_string().to_uppercase()))
                .unwrap_or_default()
        });
        let record = Record::new("Page", 1).with("title", "hi");
        assert_eq!(field.value_for(&record), FieldValue::from("HI"));
        assert!(field.is_searchable());
    }

    #[test]
    fn test_from_attribute_renames_source() {
        let field = IndexedField::text("headline").from_attribute("title");
        let record = Record::new("Page", 1).with("title", "Hello");
        assert_eq!(field.value_for(&record), FieldValue::from("Hello"));
    }

    #[test]
    fn test_record_type_field_names_unique() {
        let ty = RecordType::new("Page")
            .field(IndexedField::text("title"))
            .field(IndexedField::text("title").boost(3.0));
        assert_eq!(ty.fields().len(), 1);
        assert_eq!(ty.fields()[0].boost_factor(), 3.0);
    }

    #[test]
    fn test_coerce_to_parses_text_operands() {
        assert_eq!(
            FieldValue::from("2024").coerce_to(FieldKind::Integer),
            Some(FieldValue::Int(2024))
        );
        assert_eq!(
            FieldValue::from("true").coerce_to(FieldKind::Boolean),
            Some(FieldValue::Bool(true))
        );
        assert_eq!(
            FieldValue::from("2024").coerce_to(FieldKind::Text),
            Some(FieldValue::from("2024"))
        );
        assert_eq!(
            FieldValue::Int(7).coerce_to(FieldKind::Text),
            Some(FieldValue::from("7"))
        );
        assert_eq!(FieldValue::from("yes").coerce_to(FieldKind::Boolean), None);
        assert_eq!(FieldValue::Bool(true).coerce_to(FieldKind::Integer), None);
        assert_eq!(
            FieldValue::Null.coerce_to(FieldKind::Integer),
            Some(FieldValue::Null)
        );
    }

    #[test]
    fn test_invalid_boost_is_ignored() {
        for bad in [0.0, -1.5, f32::NAN, f32::INFINITY] {
            assert_eq!(IndexedField::text("title").boost(bad).boost_factor(), 1.0);
        }
        assert_eq!(IndexedField::text("title").boost(0.5).boost_factor(), 0.5);
    }

    #[test]
    fn test_same_schema() {
        let a = RecordType::new("Page").field(IndexedField::text("title"));
        let b = RecordType::new("Page").field(IndexedField::text("title"));
        let c = RecordType::new("Page").field(IndexedField::text("title").filterable());
        assert!(a.same_schema(&b));
        assert!(!a.same_schema(&c));
        assert!(!a.same_schema(&a.clone().child_of("Base")));
    }

    #[test]
    fn test_derived_fields_compare_by_identity() {
        let derived = IndexedField::derived("c", FieldKind::Text, |_| "x".into());
        assert!(derived.same_schema(&derived.clone()));
        let other = IndexedField::derived("c", FieldKind::Text, |_| "x".into());
        assert!(!derived.same_schema(&other));
    }
}
