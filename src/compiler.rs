//! Lowering of queries into OpenSearch search documents.
//!
//! # Clause shapes
//!
//! | Node | Clause |
//! |---|---|
//! | `f == v` | `{"term": {f: v}}` |
//! | `f != v` | `{"bool": {"must_not": [{"term": {f: v}}]}}` |
//! | `f > v` etc. | `{"range": {f: {"gt"\|"gte"\|"lt"\|"lte": v}}}` |
//! | exists / missing | `{"exists": {"field": f}}` / negated |
//! | `f in [..]` | `{"terms": {f: [..]}}` |
//! | AND | `{"bool": {"must": [..]}}` |
//! | OR | `{"bool": {"should": [..], "minimum_should_match": 1}}` |
//! | NOT | `{"bool": {"must_not": [..]}}` |
//! | no condition | `{"match_all": {}}` |
//!
//! A score wraps the outermost clause in `function_score`; a limit becomes
//! the top-level `size`.
//!
//! # Examples
//!
//! ```
//! use oqr::{compiler, Condition, Config};
//! use serde_json::json;
//!
//! let doc = compiler::compile(&Condition::eq("name", "x").into(), &Config::default()).unwrap();
//! assert_eq!(doc, json!({"query": {"term": {"name": "x"}}}));
//! ```

use serde_json::{Map, Value, json};

use crate::{
    ast::{CompareOp, Condition, Node, Query, Score, ScoreMode},
    config::Config,
    error::CompileError,
    value::Scalar,
};

/// Compile a full query into a search document with `query` and, when a
/// limit is attached, `size`.
pub fn compile(query: &Query, config: &Config) -> Result<Value, CompileError> {
    let mut clause = match &query.condition {
        Some(condition) => compile_condition(condition, config)?,
        None => json!({"match_all": {}}),
    };

    if let Some(score) = &query.score {
        clause = wrap_score(clause, score, config.all_score_mode);
    }

    let mut document = Map::new();
    document.insert("query".to_string(), clause);
    if let Some(limit) = query.limit {
        document.insert("size".to_string(), json!(limit.get()));
    }

    tracing::debug!(
        has_condition = query.condition.is_some(),
        size = query.limit.map(|l| l.get()),
        scored = query.score.is_some(),
        "compiled query"
    );
    Ok(Value::Object(document))
}

/// Compile a condition tree into a single query clause.
pub fn compile_condition(condition: &Condition, config: &Config) -> Result<Value, CompileError> {
    let depth = condition.depth();
    if depth > config.max_depth {
        return Err(CompileError::DepthExceeded(config.max_depth));
    }
    lower(condition)
}

fn lower(condition: &Condition) -> Result<Value, CompileError> {
    match condition.node() {
        Node::Compare { field, op, value } => Ok(lower_comparison(field, *op, value)),
        Node::Exists { field, present } => {
            let exists = json!({"exists": {"field": field}});
            Ok(if *present { exists } else { must_not(exists) })
        }
        Node::In { field, values } => {
            let values = values.iter().map(Scalar::to_json).collect();
            Ok(single("terms", single(field, Value::Array(values))))
        }
        Node::And(children) => {
            let must = lower_children(children, "AND")?;
            Ok(json!({"bool": {"must": must}}))
        }
        Node::Or(children) => {
            let should = lower_children(children, "OR")?;
            Ok(json!({"bool": {"should": should, "minimum_should_match": 1}}))
        }
        Node::Not(child) => Ok(must_not(lower(child)?)),
    }
}

fn lower_comparison(field: &str, op: CompareOp, value: &Scalar) -> Value {
    match op.range_keyword() {
        Some(keyword) => single("range", single(field, single(keyword, value.to_json()))),
        None => {
            let term = single("term", single(field, value.to_json()));
            if op == CompareOp::Ne { must_not(term) } else { term }
        }
    }
}

fn lower_children(children: &[Condition], kind: &str) -> Result<Vec<Value>, CompileError> {
    if children.is_empty() {
        return Err(CompileError::Corrupt(format!("{} node without children", kind)));
    }
    children.iter().map(lower).collect()
}

fn must_not(clause: Value) -> Value {
    json!({"bool": {"must_not": [clause]}})
}

fn wrap_score(clause: Value, score: &Score, all_mode: ScoreMode) -> Value {
    let functions: Vec<Value> = score
        .scripts()
        .iter()
        .map(|script| {
            json!({
                "script_score": {
                    "script": {
                        "source": script.source,
                        "params": script.params,
                    }
                }
            })
        })
        .collect();

    json!({
        "function_score": {
            "query": clause,
            "functions": functions,
            "score_mode": score.mode(all_mode).as_str(),
        }
    })
}

/// One-entry JSON object.
fn single(key: impl Into<String>, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.into(), value);
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_logical_node_is_corrupt() {
        let corrupt: Condition = Node::Or(Vec::new()).into();
        assert_eq!(
            compile_condition(&corrupt, &Config::default()),
            Err(CompileError::Corrupt("OR node without children".to_string()))
        );
    }

    #[test]
    fn depth_limit_is_reported() {
        let mut c = Condition::exists("a");
        for _ in 0..8 {
            c = !c;
        }
        let config = Config::default().with_max_depth(4);
        assert_eq!(
            compile_condition(&c, &config),
            Err(CompileError::DepthExceeded(4))
        );
    }
}
