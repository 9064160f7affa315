//! Structured filter predicates.
//!
//! Every predicate in a query must hold for a document to match. Predicates
//! are resolved against the target type's effective schema before a search
//! runs: the field must exist and be declared filterable, and every operand
//! is converted to the field's kind or rejected.
//!
//! # Textual form
//!
//! [`FilterPredicate::parse`] accepts the compact form used by the CLI:
//!
//! - `live=true` is equality
//! - `title__in=Hello,World` is set membership
//!
//! Operands stay text until the predicate is resolved against a schema, so
//! `title=2024` filters a text field on the string "2024". The bare word
//! `null` is the null operand.

use std::fmt;

use quarry_core::record::FieldValue;
use quarry_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::registry::ResolvedType;

/// Suffix marking a membership predicate in textual form.
const IN_SUFFIX: &str = "__in";

/// Filter operator with its operand(s).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op", content = "value")]
pub enum FilterOp {
    /// Exact value equality.
    Eq(FieldValue),
    /// The value is one of these.
    In(Vec<FieldValue>),
}

/// A (field, operator, operand) triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterPredicate {
    /// Field the predicate applies to.
    pub field: String,
    /// Operator and operand(s).
    #[serde(flatten)]
    pub op: FilterOp,
}

impl FilterPredicate {
    /// Equality predicate.
    pub fn eq(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Eq(value.into()),
        }
    }

    /// Membership predicate.
    pub fn one_of<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<FieldValue>,
    {
        Self {
            field: field.into(),
            op: FilterOp::In(values.into_iter().map(Into::into).collect()),
        }
    }

    /// Operand values: one for equality, any number for membership.
    pub fn values(&self) -> &[FieldValue] {
        match &self.op {
            FilterOp::Eq(value) => std::slice::from_ref(value),
            FilterOp::In(values) => values,
        }
    }

    /// Check the predicate against the effective schema of `target` and
    /// convert its operands to the field's kind.
    pub fn resolve(&self, target: &ResolvedType) -> Result<Self> {
        let field = target.field(&self.field).ok_or_else(|| {
            Error::invalid_filter(
                &self.field,
                format!("not an indexed field of '{}'", target.name()),
            )
        })?;

        if !field.is_filterable() {
            return Err(Error::invalid_filter(
                &self.field,
                format!("field is not filterable on '{}'", target.name()),
            ));
        }

        let coerce = |value: &FieldValue| {
            value.coerce_to(field.kind()).ok_or_else(|| {
                Error::invalid_filter(
                    &self.field,
                    format!("value '{value}' does not match field kind {:?}", field.kind()),
                )
            })
        };
        let op = match &self.op {
            FilterOp::Eq(value) => FilterOp::Eq(coerce(value)?),
            FilterOp::In(values) => {
                FilterOp::In(values.iter().map(coerce).collect::<Result<_>>()?)
            }
        };

        Ok(Self {
            field: self.field.clone(),
            op,
        })
    }

    /// Check the predicate against the effective schema of `target`.
    pub fn validate(&self, target: &ResolvedType) -> Result<()> {
        self.resolve(target).map(drop)
    }

    /// Whether `value` satisfies the predicate.
    pub fn matches_value(&self, value: &FieldValue) -> bool {
        match &self.op {
            FilterOp::Eq(expected) => expected == value,
            FilterOp::In(options) => options.contains(value),
        }
    }

    /// Whether `doc` satisfies the predicate.
    ///
    /// A field the document does not carry is treated as null. Whether the
    /// field may be filtered is decided by the queried type, not the
    /// document's own type.
    pub fn matches(&self, doc: &Document) -> bool {
        match doc.get(&self.field) {
            Some(value) => self.matches_value(value),
            None => self.matches_value(&FieldValue::Null),
        }
    }

    /// Parse `field=value` or `field__in=a,b,c`.
    pub fn parse(expr: &str) -> Result<Self> {
        let (lhs, rhs) = expr
            .split_once('=')
            .ok_or_else(|| Error::parse(format!("Filter '{expr}' must look like field=value")))?;

        let lhs = lhs.trim();
        if let Some(field) = lhs.strip_suffix(IN_SUFFIX) {
            let field = non_empty_field(field, expr)?;
            let values = rhs
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(parse_value);
            return Ok(Self::one_of(field, values));
        }

        let field = non_empty_field(lhs, expr)?;
        Ok(Self::eq(field, parse_value(rhs.trim())))
    }
}

impl fmt::Display for FilterPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.op {
            FilterOp::Eq(value) => write!(f, "{}={value}", self.field),
            FilterOp::In(values) => {
                let joined: Vec<String> = values.iter().map(ToString::to_string).collect();
                write!(f, "{}{IN_SUFFIX}={}", self.field, joined.join(","))
            }
        }
    }
}

/// Resolve every predicate against `target`.
pub fn resolve_all(
    filters: &[FilterPredicate],
    target: &ResolvedType,
) -> Result<Vec<FilterPredicate>> {
    filters.iter().map(|f| f.resolve(target)).collect()
}

/// Whether `doc` satisfies every predicate.
pub fn matches_all(filters: &[FilterPredicate], doc: &Document) -> bool {
    filters.iter().all(|f| f.matches(doc))
}

fn non_empty_field<'a>(field: &'a str, expr: &str) -> Result<&'a str> {
    let field = field.trim();
    if field.is_empty() {
        return Err(Error::parse(format!("Filter '{expr}' has no field name")));
    }
    Ok(field)
}

fn parse_value(raw: &str) -> FieldValue {
    if raw.eq_ignore_ascii_case("null") {
        return FieldValue::Null;
    }
    FieldValue::Text(raw.to_string())
}

// ============================================================================
// Tests
// ============================================================================
