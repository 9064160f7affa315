//! Tantivy index writer wrapper.
//!
//! `Indexer` owns a Tantivy index, its single writer, and a manually
//! reloaded reader. Writes are staged in the writer; `commit` makes them
//! durable and reloads the reader so new searchers see them.
//!
//! # Usage
//!
//! ```rust,ignore
//! use quarry_fts::indexer::Indexer;
//! use quarry_fts::schema::QuarrySchema;
//!
//! let schema = QuarrySchema::build();
//! let indexer = Indexer::new(&index_path, &schema, 50_000_000)?;
//! indexer.upsert(&docs)?;
//! indexer.commit()?;
//! ```

use std::path::Path;
use std::sync::Mutex;

use quarry_core::{Error, Result};
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, Searcher, TantivyDocument, Term};

use crate::document::{Document, DocumentKey};
use crate::schema::QuarrySchema;

/// Smallest writer budget Tantivy accepts for one indexing thread.
const MIN_WRITER_BUFFER: usize = 15_000_000;

/// Tantivy index writer wrapper.
pub struct Indexer {
    index: Index,
    writer: Mutex<IndexWriter>,
    reader: IndexReader,
    schema: QuarrySchema,
}

impl Indexer {
    /// Create or open a Tantivy index at the given path.
    pub fn new(index_path: &Path, schema: &QuarrySchema, buffer_bytes: usize) -> Result<Self> {
        if !index_path.exists() {
            std::fs::create_dir_all(index_path).map_err(|e| Error::io_with_path(e, index_path))?;
        }

        let index = if index_path.join("meta.json").exists() {
            Index::open_in_dir(index_path)
                .map_err(|e| Error::engine_with_source("Failed to open index", e))?
        } else {
            Index::create_in_dir(index_path, schema.schema().clone())
                .map_err(|e| Error::engine_with_source("Failed to create index", e))?
        };

        Self::with_index(index, schema, buffer_bytes)
    }

    /// Create an in-memory index.
    pub fn new_in_memory(schema: &QuarrySchema, buffer_bytes: usize) -> Result<Self> {
        let index = Index::create_in_ram(schema.schema().clone());
        Self::with_index(index, schema, buffer_bytes)
    }

    fn with_index(index: Index, schema: &QuarrySchema, buffer_bytes: usize) -> Result<Self> {
        QuarrySchema::register_tokenizers(&index);

        let writer = index
            .writer_with_num_threads(1, buffer_bytes.max(MIN_WRITER_BUFFER))
            .map_err(|e| Error::engine_with_source("Failed to create index writer", e))?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| Error::engine_with_source("Failed to create reader", e))?;

        Ok(Self {
            index,
            writer: Mutex::new(writer),
            reader,
            schema: schema.clone(),
        })
    }

    /// Stage documents, replacing any indexed under the same identity.
    pub fn upsert(&self, docs: &[Document]) -> Result<()> {
        let writer = self.lock_writer()?;
        for doc in docs {
            writer.delete_term(self.key_term(&doc.key));
            writer
                .add_document(self.convert_to_tantivy_doc(doc))
                .map_err(|e| Error::engine_with_source("Failed to add document", e))?;
        }
        Ok(())
    }

    /// Stage removal of one identity.
    pub fn delete(&self, key: &DocumentKey) -> Result<()> {
        self.lock_writer()?.delete_term(self.key_term(key));
        Ok(())
    }

    /// Stage removal of every document.
    pub fn clear(&self) -> Result<()> {
        self.lock_writer()?
            .delete_all_documents()
            .map_err(|e| Error::engine_with_source("Failed to clear index", e))?;
        Ok(())
    }

    /// Commit staged changes and reload the reader.
    pub fn commit(&self) -> Result<u64> {
        let opstamp = self
            .lock_writer()?
            .commit()
            .map_err(|e| Error::engine_with_source("Failed to commit index", e))?;
        self.reader
            .reload()
            .map_err(|e| Error::engine_with_source("Failed to reload reader", e))?;
        Ok(opstamp)
    }

    /// Searcher over the last committed state.
    pub fn searcher(&self) -> Searcher {
        self.reader.searcher()
    }

    /// Get reference to the underlying Tantivy index.
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Get the schema.
    pub fn schema(&self) -> &QuarrySchema {
        &self.schema
    }

    fn lock_writer(&self) -> Result<std::sync::MutexGuard<'_, IndexWriter>> {
        self.writer
            .lock()
            .map_err(|e| Error::engine(format!("index writer lock poisoned: {e}")))
    }

    fn key_term(&self, key: &DocumentKey) -> Term {
        Term::from_field_text(self.schema.key, &key.to_string())
    }

    fn convert_to_tantivy_doc(&self, doc: &Document) -> TantivyDocument {
        let s = &self.schema;
        let mut tantivy_doc = TantivyDocument::new();

        tantivy_doc.add_text(s.key, doc.key.to_string());
        tantivy_doc.add_text(s.record_type, &doc.key.record_type);
        tantivy_doc.add_i64(s.pk, doc.key.pk.0);

        for (_, text) in doc.searchable_text() {
            tantivy_doc.add_text(s.text, text);
        }
        for field in doc.filterable_fields() {
            tantivy_doc.add_text(s.facets, QuarrySchema::facet_token(&field.name, &field.value));
        }

        tantivy_doc
    }
}

impl std::fmt::Debug for Indexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Indexer")
            .field("index", &"<tantivy::Index>")
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
