use std::collections::BTreeMap;

use jibe_types::api::parse_integer;
use serde_json::{Map, Value};

/// How a filterable field interprets raw request values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Case-insensitive pattern match. `%` and `_` in the input act as
    /// wildcards; nothing is escaped.
    String,
    Number,
    Boolean,
    /// Raw value compared for equality.
    Exact,
}

/// Ordered list of filterable fields for one resource.
pub type Schema = &'static [(&'static str, FieldKind)];

pub const SUBMITTER_SCHEMA: Schema = &[
    ("sid", FieldKind::Number),
    ("userid", FieldKind::String),
    ("free", FieldKind::Boolean),
    ("authcode", FieldKind::Exact),
];

pub const INSULT_SCHEMA: Schema = &[
    ("iid", FieldKind::Number),
    ("content", FieldKind::String),
    ("used", FieldKind::Number),
    ("by", FieldKind::Number),
];

#[derive(Debug, Clone, PartialEq)]
pub enum FilterClause {
    IsNull,
    /// Case-insensitive `LIKE` pattern.
    Like(String),
    Equals(Value),
}

/// Conjunctive predicate: every clause must hold.
pub type Filter = BTreeMap<&'static str, FilterClause>;

/// Builds a filter from loose request input.
///
/// Keys missing from `schema` are dropped. A JSON `null` always becomes
/// [`FilterClause::IsNull`]. Values that do not fit a numeric or boolean
/// field are left out rather than rejected.
pub fn build_filter(input: &Map<String, Value>, schema: Schema) -> Filter {
    let mut filter = Filter::new();

    for &(field, kind) in schema {
        let Some(raw) = input.get(field) else {
            continue;
        };
        if raw.is_null() {
            filter.insert(field, FilterClause::IsNull);
            continue;
        }
        if let Some(clause) = clause_for(kind, raw) {
            filter.insert(field, clause);
        }
    }

    filter
}

fn clause_for(kind: FieldKind, raw: &Value) -> Option<FilterClause> {
    match kind {
        FieldKind::String => {
            let pattern = match raw {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some(FilterClause::Like(pattern))
        }
        FieldKind::Number => parse_integer(raw).map(|n| FilterClause::Equals(Value::from(n))),
        FieldKind::Boolean => match raw {
            Value::Bool(b) => Some(FilterClause::Equals(Value::Bool(*b))),
            Value::String(s) => match s.as_str() {
                "true" => Some(FilterClause::Equals(Value::Bool(true))),
                "false" => Some(FilterClause::Equals(Value::Bool(false))),
                "null" => Some(FilterClause::IsNull),
                _ => None,
            },
            _ => None,
        },
        FieldKind::Exact => Some(FilterClause::Equals(raw.clone())),
    }
}
