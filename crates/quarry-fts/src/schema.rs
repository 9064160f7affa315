//! Tantivy schema for indexed records.
//!
//! Record types vary in their fields, so the Tantivy schema is fixed and
//! generic rather than derived from each record type.
//!
//! # Schema Fields
//!
//! ## Identity Fields
//! - `key`: `"{type}#{pk}"` identity term used for replace and delete (STRING | STORED)
//! - `record_type`: concrete type name, for type narrowing (STRING | STORED)
//! - `pk`: primary key (i64, STORED | FAST)
//!
//! ## Full-Text Field
//! - `text`: every searchable field value (TEXT, positions and freqs)
//!
//! ## Facet Field
//! - `facets`: one `"{field}={canonical value}"` token per filterable field (STRING)
//!
//! # Tokenizer
//!
//! `quarry_simple`: SimpleTokenizer → LowerCaser, matching
//! [`analysis::tokenize`](crate::analysis::tokenize).

use quarry_core::record::FieldValue;
use tantivy::Index;
use tantivy::schema::{
    FAST, Field, IndexRecordOption, STORED, STRING, Schema, SchemaBuilder, TextFieldIndexing,
    TextOptions,
};
use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, TextAnalyzer};

/// Tokenizer registered on every index.
pub const TOKENIZER: &str = "quarry_simple";

/// Field references plus the Tantivy schema.
#[derive(Clone)]
pub struct QuarrySchema {
    schema: Schema,

    /// Identity term.
    pub key: Field,
    /// Concrete record type.
    pub record_type: Field,
    /// Primary key.
    pub pk: Field,
    /// Analysed searchable text.
    pub text: Field,
    /// Exact-match filter tokens.
    pub facets: Field,
}

impl QuarrySchema {
    /// Build the schema.
    pub fn build() -> Self {
        let mut builder = SchemaBuilder::new();

        let text_options = TextOptions::default().set_indexing_options(
            TextFieldIndexing::default()
                .set_tokenizer(TOKENIZER)
                .set_index_option(IndexRecordOption::WithFreqsAndPositions),
        );

        let key = builder.add_text_field("key", STRING | STORED);
        let record_type = builder.add_text_field("record_type", STRING | STORED);
        let pk = builder.add_i64_field("pk", STORED | FAST);
        let text = builder.add_text_field("text", text_options);
        let facets = builder.add_text_field("facets", STRING);

        Self {
            schema: builder.build(),
            key,
            record_type,
            pk,
            text,
            facets,
        }
    }

    /// Get the underlying Tantivy schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Register the tokenizer with a Tantivy index.
    ///
    /// Must be called after creating or opening an index.
    pub fn register_tokenizers(index: &Index) {
        let analyzer = TextAnalyzer::builder(SimpleTokenizer::default())
            .filter(LowerCaser)
            .build();
        index.tokenizers().register(TOKENIZER, analyzer);
    }

    /// Facet token for `field` holding `value`.
    pub fn facet_token(field: &str, value: &FieldValue) -> String {
        format!("{field}={}", value.canonical())
    }
}

impl std::fmt::Debug for QuarrySchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuarrySchema")
            .field("tokenizer", &TOKENIZER)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
