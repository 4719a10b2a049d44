//! In-process backend that evaluates compiled search documents against
//! stored JSON documents.
//!
//! Understands the clause shapes the compiler emits plus `filter` and
//! `minimum_should_match` inside `bool`. Matching follows engine semantics
//! where they differ from plain equality:
//!
//! - an array field matches if any of its elements matches
//! - `null` and `[]` count as absent for `exists`
//! - numbers compare by value across integer and float (`2 == 2.0`)
//!
//! Score scripts are not executed. Every hit scores `1.0` and hits come back
//! in insertion order.

use std::{cmp::Ordering, collections::BTreeMap};

use rust_decimal::{Decimal, prelude::FromPrimitive};
use serde_json::{Map, Number, Value};

use super::{DocumentStore, Hit, SearchBackend, WriteResult};

/// Page size when a search document carries no `size`.
pub const DEFAULT_SIZE: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error("no document '{id}' in index '{index}'")]
    NotFound { index: String, id: String },

    #[error("unsupported clause '{0}'")]
    UnsupportedClause(String),

    #[error("malformed '{clause}' clause: {reason}")]
    Malformed { clause: &'static str, reason: String },
}

#[derive(Debug, Clone)]
struct Stored {
    id: String,
    source: Value,
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    indices: BTreeMap<String, Vec<Stored>>,
    next_id: u64,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents stored under `index`.
    pub fn count(&self, index: &str) -> usize {
        self.indices.get(index).map_or(0, Vec::len)
    }

    pub fn get(&self, index: &str, id: &str) -> Option<&Value> {
        self.indices
            .get(index)?
            .iter()
            .find(|doc| doc.id == id)
            .map(|doc| &doc.source)
    }

    fn generate_id(&mut self) -> String {
        self.next_id += 1;
        format!("doc-{}", self.next_id)
    }
}

impl SearchBackend for MemoryBackend {
    type Error = MemoryError;

    fn search(&self, index: &str, body: &Value) -> Result<Vec<Hit>, MemoryError> {
        let Some(documents) = self.indices.get(index) else {
            return Ok(Vec::new());
        };
        let body = as_object(body, "search")?;
        let size = match body.get("size") {
            None => DEFAULT_SIZE,
            Some(size) => size.as_u64().ok_or_else(|| MemoryError::Malformed {
                clause: "size",
                reason: format!("expected a non-negative integer, got {}", size),
            })?,
        };
        let match_all = Value::Object(Map::new());
        let query = body.get("query").unwrap_or(&match_all);

        let mut hits = Vec::new();
        for doc in documents {
            if hits.len() as u64 >= size {
                break;
            }
            if matches(query, &doc.source)? {
                hits.push(Hit {
                    id: doc.id.clone(),
                    score: Some(1.0),
                    source: doc.source.clone(),
                });
            }
        }
        Ok(hits)
    }
}

impl DocumentStore for MemoryBackend {
    fn insert_one(&mut self, index: &str, document: Value, id: Option<String>) -> Result<String, MemoryError> {
        let id = match id {
            Some(id) => id,
            None => self.generate_id(),
        };
        let documents = self.indices.entry(index.to_string()).or_default();
        match documents.iter_mut().find(|doc| doc.id == id) {
            Some(existing) => existing.source = document,
            None => documents.push(Stored {
                id: id.clone(),
                source: document,
            }),
        }
        Ok(id)
    }

    fn update_one(
        &mut self,
        index: &str,
        id: &str,
        update: Map<String, Value>,
        upsert: bool,
    ) -> Result<WriteResult, MemoryError> {
        let documents = self.indices.entry(index.to_string()).or_default();
        if let Some(existing) = documents.iter_mut().find(|doc| doc.id == id) {
            merge_into(&mut existing.source, update);
            return Ok(WriteResult::Updated);
        }
        if !upsert {
            return Err(MemoryError::NotFound {
                index: index.to_string(),
                id: id.to_string(),
            });
        }
        documents.push(Stored {
            id: id.to_string(),
            source: Value::Object(update),
        });
        Ok(WriteResult::Created)
    }

    fn delete_one(&mut self, index: &str, id: &str) -> Result<WriteResult, MemoryError> {
        let not_found = || MemoryError::NotFound {
            index: index.to_string(),
            id: id.to_string(),
        };
        let documents = self.indices.get_mut(index).ok_or_else(not_found)?;
        let position = documents
            .iter()
            .position(|doc| doc.id == id)
            .ok_or_else(not_found)?;
        documents.remove(position);
        Ok(WriteResult::Deleted)
    }
}

/// Partial update: objects merge key by key, anything else is replaced.
fn merge_into(target: &mut Value, update: Map<String, Value>) {
    let Value::Object(target) = target else {
        *target = Value::Object(update);
        return;
    };
    for (key, value) in update {
        match (target.get_mut(&key), value) {
            (Some(existing @ Value::Object(_)), Value::Object(nested)) => merge_into(existing, nested),
            (_, value) => {
                target.insert(key, value);
            }
        }
    }
}

// ========================================
// Clause evaluation
// ========================================

fn matches(clause: &Value, doc: &Value) -> Result<bool, MemoryError> {
    let clause = as_object(clause, "query")?;
    // `{}` is accepted as match_all
    let Some((kind, body)) = clause.iter().next() else {
        return Ok(true);
    };
    if clause.len() > 1 {
        return Err(MemoryError::Malformed {
            clause: "query",
            reason: format!("expected exactly one clause, got {}", clause.len()),
        });
    }

    match kind.as_str() {
        "match_all" => Ok(true),
        "term" => {
            let (field, expected) = single_field(body, "term")?;
            let expected = match expected {
                Value::Object(map) => map.get("value").ok_or_else(|| MemoryError::Malformed {
                    clause: "term",
                    reason: format!("missing 'value' for field '{}'", field),
                })?,
                v => v,
            };
            Ok(candidates(doc, field).any(|v| values_equal(v, expected)))
        }
        "terms" => {
            let (field, expected) = single_field(body, "terms")?;
            let expected = expected.as_array().ok_or_else(|| MemoryError::Malformed {
                clause: "terms",
                reason: format!("values for field '{}' must be an array", field),
            })?;
            Ok(candidates(doc, field).any(|v| expected.iter().any(|e| values_equal(v, e))))
        }
        "range" => {
            let (field, bounds) = single_field(body, "range")?;
            let bounds = as_object(bounds, "range")?;
            for candidate in candidates(doc, field) {
                if within(candidate, bounds)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        "exists" => {
            let field = body
                .get("field")
                .and_then(Value::as_str)
                .ok_or_else(|| MemoryError::Malformed {
                    clause: "exists",
                    reason: "missing 'field'".to_string(),
                })?;
            Ok(candidates(doc, field).next().is_some())
        }
        "bool" => matches_bool(as_object(body, "bool")?, doc),
        "function_score" => match as_object(body, "function_score")?.get("query") {
            Some(inner) => matches(inner, doc),
            None => Ok(true),
        },
        other => Err(MemoryError::UnsupportedClause(other.to_string())),
    }
}

fn matches_bool(body: &Map<String, Value>, doc: &Value) -> Result<bool, MemoryError> {
    let must = clause_list(body, "must")?;
    let filter = clause_list(body, "filter")?;
    let should = clause_list(body, "should")?;
    let must_not = clause_list(body, "must_not")?;

    for clause in must.iter().chain(&filter) {
        if !matches(clause, doc)? {
            return Ok(false);
        }
    }
    for clause in &must_not {
        if matches(clause, doc)? {
            return Ok(false);
        }
    }

    let required = match body.get("minimum_should_match") {
        Some(n) => n.as_u64().ok_or_else(|| MemoryError::Malformed {
            clause: "bool",
            reason: format!("'minimum_should_match' must be an integer, got {}", n),
        })?,
        None if must.is_empty() && filter.is_empty() && !should.is_empty() => 1,
        None => 0,
    };
    let mut satisfied = 0;
    for clause in &should {
        if satisfied >= required {
            break;
        }
        if matches(clause, doc)? {
            satisfied += 1;
        }
    }
    Ok(satisfied >= required)
}

fn within(candidate: &Value, bounds: &Map<String, Value>) -> Result<bool, MemoryError> {
    for (keyword, bound) in bounds {
        let Some(ordering) = compare_json(candidate, bound) else {
            return Ok(false);
        };
        let ok = match keyword.as_str() {
            "gt" => ordering == Ordering::Greater,
            "gte" => ordering != Ordering::Less,
            "lt" => ordering == Ordering::Less,
            "lte" => ordering != Ordering::Greater,
            other => {
                return Err(MemoryError::Malformed {
                    clause: "range",
                    reason: format!("unknown bound '{}'", other),
                });
            }
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Values stored under a dotted path, with arrays flattened one level and
/// nulls dropped.
fn candidates<'d>(doc: &'d Value, path: &str) -> impl Iterator<Item = &'d Value> {
    let found = path
        .split('.')
        .try_fold(doc, |current, segment| current.as_object()?.get(segment));
    let items: &'d [Value] = match found {
        None | Some(Value::Null) => &[],
        Some(Value::Array(items)) => items,
        Some(value) => std::slice::from_ref(value),
    };
    items.iter().filter(|v| !v.is_null())
}

fn values_equal(a: &Value, b: &Value) -> bool {
    compare_json(a, b) == Some(Ordering::Equal)
}

/// Ordering for values of compatible types; `None` for mismatched kinds.
fn compare_json(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (to_decimal(x), to_decimal(y)) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => x.as_f64()?.partial_cmp(&y.as_f64()?),
        },
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn to_decimal(n: &Number) -> Option<Decimal> {
    if let Some(i) = n.as_i64() {
        Decimal::from_i64(i)
    } else if let Some(u) = n.as_u64() {
        Decimal::from_u64(u)
    } else {
        Decimal::from_f64(n.as_f64()?)
    }
}

fn as_object<'v>(value: &'v Value, clause: &'static str) -> Result<&'v Map<String, Value>, MemoryError> {
    value.as_object().ok_or_else(|| MemoryError::Malformed {
        clause,
        reason: format!("expected an object, got {}", value),
    })
}

fn single_field<'v>(value: &'v Value, clause: &'static str) -> Result<(&'v str, &'v Value), MemoryError> {
    let map = as_object(value, clause)?;
    let mut entries = map.iter();
    match (entries.next(), entries.next()) {
        (Some((field, value)), None) => Ok((field.as_str(), value)),
        _ => Err(MemoryError::Malformed {
            clause,
            reason: format!("expected exactly one field, got {}", map.len()),
        }),
    }
}

fn clause_list<'v>(body: &'v Map<String, Value>, key: &str) -> Result<Vec<&'v Value>, MemoryError> {
    Ok(match body.get(key) {
        None => Vec::new(),
        Some(Value::Array(items)) => items.iter().collect(),
        Some(obj @ Value::Object(_)) => vec![obj],
        Some(other) => {
            return Err(MemoryError::Malformed {
                clause: "bool",
                reason: format!("'{}' must be a clause or an array, got {}", key, other),
            });
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_compare_across_integer_and_float() {
        assert!(values_equal(&json!(2), &json!(2.0)));
        assert_eq!(compare_json(&json!(1), &json!(1.5)), Some(Ordering::Less));
        assert_eq!(compare_json(&json!("1"), &json!(1)), None);
    }

    #[test]
    fn array_fields_match_any_element() {
        let doc = json!({"tags": ["a", "b"], "empty": [], "nothing": null});
        assert!(matches(&json!({"term": {"tags": "b"}}), &doc).unwrap());
        assert!(!matches(&json!({"exists": {"field": "empty"}}), &doc).unwrap());
        assert!(!matches(&json!({"exists": {"field": "nothing"}}), &doc).unwrap());
    }

    #[test]
    fn nested_paths_are_followed() {
        let doc = json!({"nested": {"field": 3}});
        assert!(matches(&json!({"range": {"nested.field": {"gte": 3, "lt": 4}}}), &doc).unwrap());
    }

    #[test]
    fn partial_update_merges_objects() {
        let mut doc = json!({"a": {"x": 1, "y": 2}, "b": 1});
        let update = json!({"a": {"y": 3}, "c": true});
        merge_into(&mut doc, update.as_object().unwrap().clone());
        assert_eq!(doc, json!({"a": {"x": 1, "y": 3}, "b": 1, "c": true}));
    }
}
