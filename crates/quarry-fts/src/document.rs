//! Search document representation and record mapping.
//!
//! A [`Document`] is the flat projection of one record at index time: its
//! identity and one [`DocumentField`] per effective indexed field. Documents
//! are handed to an engine and not kept by the index manager.
//!
//! [`DocumentMapper`] holds no state. It projects records into documents,
//! extracts identities, and rehydrates identities back into live records
//! through the storage collaborator.
//!
//! # Creating Documents
//!
//! ```rust
//! use quarry_fts::document::Document;
//!
//! let doc = Document::builder("Page", 1)
//!     .text("title", "Hello World")
//!     .filter("live", true)
//!     .build();
//!
//! assert_eq!(doc.key.pk.0, 1);
//! ```

use std::fmt;

use quarry_core::Result;
use quarry_core::record::{FieldValue, PrimaryKey, Record, valid_boost};
use quarry_core::store::RecordStore;
use serde::{Deserialize, Serialize};

use crate::registry::ResolvedType;

/// Identity of a document: the record's primary key within its concrete type.
///
/// Ordered by primary key first, which makes it the deterministic
/// tie-break for equally relevant matches.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentKey {
    /// Primary key of the source record.
    pub pk: PrimaryKey,
    /// Concrete record type name.
    pub record_type: String,
}

impl DocumentKey {
    /// Create a key.
    pub fn new(record_type: impl Into<String>, pk: impl Into<PrimaryKey>) -> Self {
        Self {
            pk: pk.into(),
            record_type: record_type.into(),
        }
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.record_type, self.pk)
    }
}

/// One indexed field of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentField {
    /// Field name.
    pub name: String,
    /// Value at index time.
    pub value: FieldValue,
    /// Contributes to full-text matching.
    pub searchable: bool,
    /// May be targeted by filter predicates.
    pub filterable: bool,
    /// Relevance weight for text matches.
    pub boost: f32,
}

/// A document to be indexed and searched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Identity of the source record.
    pub key: DocumentKey,
    /// Indexed field values.
    pub fields: Vec<DocumentField>,
}

impl Document {
    /// Create a new document builder.
    pub fn builder(record_type: impl Into<String>, pk: impl Into<PrimaryKey>) -> DocumentBuilder {
        let key = DocumentKey::new(record_type, pk);
        DocumentBuilder {
            doc: Document {
                key,
                fields: Vec::new(),
            },
        }
    }

    /// Concrete record type.
    pub fn record_type(&self) -> &str {
        &self.key.record_type
    }

    /// Value of a field, if the document has it.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }

    /// Searchable fields paired with their text.
    pub fn searchable_text(&self) -> impl Iterator<Item = (&DocumentField, String)> {
        self.fields
            .iter()
            .filter(|f| f.searchable)
            .filter_map(|f| f.value.searchable_text().map(|text| (f, text)))
    }

    /// Filterable fields.
    pub fn filterable_fields(&self) -> impl Iterator<Item = &DocumentField> {
        self.fields.iter().filter(|f| f.filterable)
    }
}

/// Builder for Document.
#[derive(Debug)]
pub struct DocumentBuilder {
    doc: Document,
}

impl DocumentBuilder {
    /// Add a searchable text field.
    pub fn text(self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.field(name, value, true, false, 1.0)
    }

    /// Add a filter-only field.
    pub fn filter(self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.field(name, value, false, true, 1.0)
    }

    /// Add a field with explicit flags.
    pub fn field(
        mut self,
        name: impl Into<String>,
        value: impl Into<FieldValue>,
        searchable: bool,
        filterable: bool,
        boost: f32,
    ) -> Self {
        self.doc.fields.push(DocumentField {
            name: name.into(),
            value: value.into(),
            searchable,
            filterable,
            boost: if valid_boost(boost) { boost } else { 1.0 },
        });
        self
    }

    /// Build the document.
    pub fn build(self) -> Document {
        self.doc
    }
}

/// Converts records to documents and identities back to records.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentMapper;

impl DocumentMapper {
    /// Project `record` through the effective schema of its type.
    ///
    /// Absent attributes become [`FieldValue::Null`].
    pub fn to_document(resolved: &ResolvedType, record: &Record) -> Document {
        let fields = resolved
            .fields()
            .iter()
            .map(|field| DocumentField {
                name: field.name().to_string(),
                value: field.value_for(record),
                searchable: field.is_searchable(),
                filterable: field.is_filterable(),
                boost: field.boost_factor(),
            })
            .collect();

        Document {
            key: Self::identity_of(record),
            fields,
        }
    }

    /// Stable identity of a record.
    pub fn identity_of(record: &Record) -> DocumentKey {
        DocumentKey::new(record.record_type.clone(), record.pk)
    }

    /// Look up the live record for `key`.
    ///
    /// Returns `Ok(None)` when the record was deleted after indexing.
    pub async fn rehydrate(store: &dyn RecordStore, key: &DocumentKey) -> Result<Option<Record>> {
        let record = store.get(&key.record_type, key.pk).await?;
        if record.is_none() {
            log::debug!("Stale index entry {key}: source record no longer exists");
        }
        Ok(record)
    }
}

// ============================================================================
// Tests
// ============================================================================
