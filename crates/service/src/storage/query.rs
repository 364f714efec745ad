//! In-process evaluation of `Query` over a key-ordered map.
//!
//! Shared by the memory and JSON file backends.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::ops::Bound;

use serde_json::Value;

use super::{Document, Filter, Query};

/// Collection body: key → document, iterated in key order.
pub type Collection = BTreeMap<String, Document>;

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    compare(a, b).map_or(a == b, Ordering::is_eq)
}

pub fn matches(doc: &Document, filter: &Filter) -> bool {
    let Some(actual) = doc.get(filter.field()) else {
        return false;
    };
    match filter {
        Filter::Eq(_, expected) => values_equal(actual, expected),
        Filter::In(_, values) => values.iter().any(|v| values_equal(actual, v)),
        Filter::Gte(_, bound) => matches!(compare(actual, bound), Some(Ordering::Greater | Ordering::Equal)),
        Filter::Lt(_, bound) => matches!(compare(actual, bound), Some(Ordering::Less)),
    }
}

fn lower_bound(query: &Query) -> Bound<String> {
    match &query.start_after {
        Some(key) => Bound::Excluded(key.clone()),
        None => Bound::Unbounded,
    }
}

/// Run `query` against one collection. The caller validates the query.
pub fn run(collection: &Collection, query: &Query) -> Vec<(String, Document)> {
    collection
        .range::<String, _>((lower_bound(query), Bound::Unbounded))
        .filter(|(_, doc)| query.filters.iter().all(|f| matches(doc, f)))
        .skip(query.offset)
        .take(query.limit.unwrap_or(usize::MAX))
        .map(|(k, d)| (k.clone(), d.clone()))
        .collect()
}

pub fn count(collection: &Collection, filters: &[Filter]) -> u64 {
    collection.values().filter(|doc| filters.iter().all(|f| matches(doc, f))).count() as u64
}
