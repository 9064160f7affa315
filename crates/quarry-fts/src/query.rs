//! Search requests and query planning.
//!
//! A [`SearchQuery`] is built per call and consumed once. [`compile`] turns
//! it into a [`QueryPlan`] against the current type registry:
//!
//! - blank text, or text with no tokens, plans to nothing (empty results)
//! - an unregistered target type plans to nothing
//! - filters are resolved against the target's effective schema
//! - the target type expands to itself plus every registered subtype
//!
//! # Query Modes
//!
//! - **Smart** (default): every term required for 1-2 terms, any term for 3+
//! - **And**: every term must match
//! - **Or**: any term can match

use std::collections::BTreeSet;
use std::ops::Range;

use quarry_core::Result;
use serde::{Deserialize, Serialize};

use crate::analysis;
use crate::filter::{self, FilterPredicate};
use crate::registry::RecordTypeRegistry;
use crate::types::QueryMode;

/// One search request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Free text to match.
    pub text: String,

    /// Target record type; registered subtypes are included.
    pub record_type: String,

    /// Predicates that must all hold.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<FilterPredicate>,

    /// Half-open window into the ranked results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<Range<usize>>,

    /// Query mode override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<QueryMode>,
}

impl SearchQuery {
    /// Search `record_type` for `text`.
    pub fn new(text: impl Into<String>, record_type: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            record_type: record_type.into(),
            ..Default::default()
        }
    }

    /// Add a filter predicate.
    pub fn filter(mut self, predicate: FilterPredicate) -> Self {
        self.filters.push(predicate);
        self
    }

    /// Add several filter predicates.
    pub fn filters(mut self, predicates: impl IntoIterator<Item = FilterPredicate>) -> Self {
        self.filters.extend(predicates);
        self
    }

    /// Restrict the result set to `[start, end)`.
    pub fn window(mut self, window: Range<usize>) -> Self {
        self.window = Some(window);
        self
    }

    /// Override the backend's query mode.
    pub fn mode(mut self, mode: QueryMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Whether the text carries nothing to match.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A validated, engine-neutral query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    /// Distinct analysed terms, in query order.
    pub terms: Vec<String>,
    /// Every term must match when true, any term otherwise.
    pub require_all: bool,
    /// Concrete types whose documents are candidates.
    pub record_types: BTreeSet<String>,
    /// Filter predicates with operands converted to each field's kind.
    pub filters: Vec<FilterPredicate>,
}

impl QueryPlan {
    /// Whether documents of `record_type` are candidates.
    pub fn accepts_type(&self, record_type: &str) -> bool {
        self.record_types.contains(record_type)
    }
}

/// Plan `query` against `registry`.
///
/// Returns `Ok(None)` when the query can only produce an empty result.
/// Filter predicates that do not fit the target schema are an error.
pub fn compile(
    query: &SearchQuery,
    registry: &RecordTypeRegistry,
    default_mode: QueryMode,
) -> Result<Option<QueryPlan>> {
    if query.is_blank() {
        return Ok(None);
    }

    let Some(target) = registry.resolve(&query.record_type) else {
        log::debug!(
            "Search against unregistered type '{}' yields no results",
            query.record_type
        );
        return Ok(None);
    };

    let filters = filter::resolve_all(&query.filters, &target)?;

    let terms = analysis::query_terms(&query.text);
    if terms.is_empty() {
        return Ok(None);
    }

    let mode = query.mode.unwrap_or(default_mode);
    let plan = QueryPlan {
        require_all: mode.require_all(terms.len()),
        terms,
        record_types: registry.resolve_subtypes(&query.record_type),
        filters,
    };
    log::debug!(
        "Planned search on {:?}: terms={:?} require_all={} filters={}",
        plan.record_types,
        plan.terms,
        plan.require_all,
        plan.filters.len()
    );
    Ok(Some(plan))
}

// ============================================================================
// Tests
// ============================================================================
