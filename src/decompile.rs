//! Reading compiled search documents back into queries.
//!
//! Accepts the clause shapes the compiler emits plus a few equivalent
//! spellings engines commonly accept (`filter` inside `bool`, the
//! `{"term": {f: {"value": v}}}` form, several bounds in one `range`), so a
//! hand-written or logged document can be normalized and compared with a
//! built one.
//!
//! # Examples
//!
//! ```
//! use oqr::{decompile, Config};
//! use serde_json::json;
//!
//! let doc = json!({"query": {"bool": {"must": [
//!     {"range": {"value": {"gt": 2}}},
//!     {"range": {"value": {"lt": 4}}}
//! ]}}});
//! let readable = decompile::normalized_readable_query(&doc, &Config::default()).unwrap();
//! assert_eq!(readable, "and(not(value <= 2), value < 4)");
//! ```

use serde_json::{Map, Value};

use crate::{
    ast::{CompareOp, Condition, Limit, Node, Query, Score, ScoreCombine, condition::is_valid_field_path},
    config::Config,
    error::DecompileError,
    normalize,
    value::Scalar,
};

/// Turn a compiled document (`{"query": ..., "size": ...}`) or a bare clause
/// into a [`Query`].
pub fn from_document(document: &Value, config: &Config) -> Result<Query, DecompileError> {
    let reader = ClauseReader { config };
    let map = expect_object(document, "document")?;

    let Some(clause) = map.get("query") else {
        return reader.read_top(document);
    };

    let mut query = reader.read_top(clause)?;
    if let Some(size) = map.get("size") {
        let n = size.as_i64().ok_or_else(|| DecompileError::Malformed {
            clause: "size",
            reason: format!("expected an integer, got {}", size),
        })?;
        query.limit = Some(Limit::new(n)?);
    }
    Ok(query)
}

/// Canonical string for a compiled document's condition.
pub fn normalized_readable_query(document: &Value, config: &Config) -> Result<String, DecompileError> {
    let query = from_document(document, config)?;
    Ok(normalize::normalized_query_string(&query, config)?)
}

fn field_path(field: &str, clause: &'static str) -> Result<String, DecompileError> {
    if !is_valid_field_path(field) {
        return Err(DecompileError::Malformed {
            clause,
            reason: format!("invalid field path '{}'", field),
        });
    }
    Ok(field.to_string())
}

fn expect_object<'v>(value: &'v Value, clause: &'static str) -> Result<&'v Map<String, Value>, DecompileError> {
    value.as_object().ok_or_else(|| DecompileError::Malformed {
        clause,
        reason: format!("expected an object, got {}", value),
    })
}

/// The only entry of a one-key object such as `{"name": "x"}`.
fn single_entry<'v>(value: &'v Value, clause: &'static str) -> Result<(&'v String, &'v Value), DecompileError> {
    let map = expect_object(value, clause)?;
    let mut entries = map.iter();
    match (entries.next(), entries.next()) {
        (Some(entry), None) => Ok(entry),
        _ => Err(DecompileError::Malformed {
            clause,
            reason: format!("expected exactly one field, got {}", map.len()),
        }),
    }
}

fn scalar(value: &Value, clause: &'static str) -> Result<Scalar, DecompileError> {
    Scalar::from_json(value).ok_or_else(|| DecompileError::Malformed {
        clause,
        reason: format!("expected a scalar, got {}", value),
    })
}

struct ClauseReader<'c> {
    config: &'c Config,
}

impl ClauseReader<'_> {
    /// Outermost clause: may be a `function_score` wrapper.
    fn read_top(&self, clause: &Value) -> Result<Query, DecompileError> {
        let (kind, body) = single_entry(clause, "query")?;
        if kind != "function_score" {
            let condition = self.read_clause(clause, 1)?;
            return Ok(Query {
                condition,
                ..Query::default()
            });
        }

        let body = expect_object(body, "function_score")?;
        let condition = match body.get("query") {
            Some(inner) => self.read_clause(inner, 1)?,
            None => None,
        };
        Ok(Query {
            condition,
            limit: None,
            score: Some(self.read_score(body)?),
        })
    }

    fn read_score(&self, body: &Map<String, Value>) -> Result<Score, DecompileError> {
        let malformed = |reason: &str| DecompileError::Malformed {
            clause: "function_score",
            reason: reason.to_string(),
        };

        let functions = body
            .get("functions")
            .and_then(Value::as_array)
            .ok_or_else(|| malformed("missing 'functions' array"))?;

        let mut scripts = Vec::with_capacity(functions.len());
        for function in functions {
            let script = function
                .pointer("/script_score/script")
                .ok_or_else(|| malformed("function without 'script_score.script'"))?;
            let source = match script {
                Value::String(s) => s.clone(),
                other => other
                    .get("source")
                    .and_then(Value::as_str)
                    .ok_or_else(|| malformed("script without 'source'"))?
                    .to_string(),
            };
            let params = script
                .get("params")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
            scripts.push(Score::with_params(source, params));
        }

        let combine = match body.get("score_mode").and_then(Value::as_str) {
            Some("max") => ScoreCombine::Best,
            _ => ScoreCombine::All,
        };

        let mut iter = scripts.into_iter();
        let mut score = iter.next().ok_or_else(|| malformed("empty 'functions' array"))?;
        for next in iter {
            score = match combine {
                ScoreCombine::All => score.and(&next)?,
                ScoreCombine::Best => score.or(&next)?,
            };
        }
        // a lone script only remembers `max`; any other mode is the default
        if combine == ScoreCombine::Best {
            score = score.with_combine(ScoreCombine::Best);
        }
        Ok(score)
    }

    /// A filter clause; `None` stands for "matches everything".
    fn read_clause(&self, clause: &Value, depth: usize) -> Result<Option<Condition>, DecompileError> {
        if depth > self.config.max_depth {
            return Err(DecompileError::DepthExceeded(self.config.max_depth));
        }

        let (kind, body) = single_entry(clause, "query")?;
        match kind.as_str() {
            "match_all" => Ok(None),
            "term" => {
                let (field, value) = single_entry(body, "term")?;
                let value = match value {
                    Value::Object(map) => map.get("value").ok_or_else(|| DecompileError::Malformed {
                        clause: "term",
                        reason: format!("missing 'value' for field '{}'", field),
                    })?,
                    v => v,
                };
                Ok(Some(Condition::eq(field_path(field, "term")?, scalar(value, "term")?)))
            }
            "terms" => {
                let (field, values) = single_entry(body, "terms")?;
                let values = values.as_array().ok_or_else(|| DecompileError::Malformed {
                    clause: "terms",
                    reason: format!("values for field '{}' must be an array", field),
                })?;
                let values = values
                    .iter()
                    .map(|v| scalar(v, "terms"))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Some(Condition::is_in(field_path(field, "terms")?, values)))
            }
            "range" => {
                let (field, bounds) = single_entry(body, "range")?;
                let field = field_path(field, "range")?;
                let bounds = expect_object(bounds, "range")?;
                let mut parts = Vec::with_capacity(bounds.len());
                for (keyword, value) in bounds {
                    let op = CompareOp::from_range_keyword(keyword).ok_or_else(|| {
                        DecompileError::Malformed {
                            clause: "range",
                            reason: format!("unknown bound '{}'", keyword),
                        }
                    })?;
                    parts.push(Condition::compare(field.clone(), op, scalar(value, "range")?));
                }
                conjoin(parts, "range").map(Some)
            }
            "exists" => {
                let field = body
                    .get("field")
                    .and_then(Value::as_str)
                    .ok_or_else(|| DecompileError::Malformed {
                        clause: "exists",
                        reason: "missing 'field'".to_string(),
                    })?;
                Ok(Some(Condition::exists(field_path(field, "exists")?)))
            }
            "bool" => self.read_bool(expect_object(body, "bool")?, depth),
            other => Err(DecompileError::UnsupportedClause(other.to_string())),
        }
    }

    fn read_bool(&self, body: &Map<String, Value>, depth: usize) -> Result<Option<Condition>, DecompileError> {
        let mut conjuncts = Vec::new();
        let mut has_required = false;

        for key in ["must", "filter"] {
            for clause in self.clause_list(body, key)? {
                has_required = true;
                // match_all contributes nothing to a conjunction
                if let Some(c) = self.read_clause(clause, depth + 1)? {
                    conjuncts.push(c);
                }
            }
        }

        // Engine rule: `should` is optional next to `must`/`filter` unless
        // `minimum_should_match` says otherwise.
        let should = self.clause_list(body, "should")?;
        let required = match body.get("minimum_should_match") {
            Some(n) => n.as_u64().ok_or_else(|| DecompileError::Malformed {
                clause: "bool",
                reason: format!("'minimum_should_match' must be a non-negative integer, got {}", n),
            })?,
            None if !has_required && !should.is_empty() => 1,
            None => 0,
        };
        if required > 1 {
            return Err(DecompileError::UnsupportedClause(format!(
                "bool with minimum_should_match {}",
                required
            )));
        }
        if required == 1 && should.is_empty() {
            return Err(DecompileError::Malformed {
                clause: "bool",
                reason: "'minimum_should_match' of 1 with no 'should' clauses matches nothing".to_string(),
            });
        }
        if required == 1 {
            let mut disjuncts = Vec::with_capacity(should.len());
            let mut matches_all = false;
            for clause in should {
                match self.read_clause(clause, depth + 1)? {
                    Some(c) => disjuncts.push(c),
                    None => matches_all = true,
                }
            }
            if !matches_all {
                conjuncts.push(Node::Or(disjuncts).into());
            }
        }

        for clause in self.clause_list(body, "must_not")? {
            match self.read_clause(clause, depth + 1)? {
                Some(c) => conjuncts.push(!c),
                None => {
                    return Err(DecompileError::Malformed {
                        clause: "bool",
                        reason: "'must_not' of match_all matches nothing".to_string(),
                    });
                }
            }
        }

        match conjuncts.len() {
            0 => Ok(None),
            1 => Ok(conjuncts.pop()),
            _ => Ok(Some(Node::And(conjuncts).into())),
        }
    }

    /// `bool` sections accept a single clause or an array of clauses.
    fn clause_list<'v>(&self, body: &'v Map<String, Value>, key: &str) -> Result<Vec<&'v Value>, DecompileError> {
        Ok(match body.get(key) {
            None => Vec::new(),
            Some(Value::Array(items)) => items.iter().collect(),
            Some(obj @ Value::Object(_)) => vec![obj],
            Some(other) => {
                return Err(DecompileError::Malformed {
                    clause: "bool",
                    reason: format!("'{}' must be a clause or an array, got {}", key, other),
                });
            }
        })
    }
}

fn conjoin(mut parts: Vec<Condition>, clause: &'static str) -> Result<Condition, DecompileError> {
    match parts.len() {
        0 => Err(DecompileError::Malformed {
            clause,
            reason: "no bounds".to_string(),
        }),
        1 => Ok(parts.remove(0)),
        _ => Ok(Node::And(parts).into()),
    }
}
