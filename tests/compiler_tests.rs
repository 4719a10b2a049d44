// Compiler Tests
//
// Exact search documents produced for each node kind and modifier.

use oqr::{CompileError, Condition, Config, Limit, Query, Score, ScoreMode, compiler};
use serde_json::{Value, json};

fn compile(query: impl Into<Query>) -> Value {
    compiler::compile(&query.into(), &Config::default()).unwrap()
}

fn clause(c: Condition) -> Value {
    compiler::compile_condition(&c, &Config::default()).unwrap()
}

// ============================================================================
// Leaves
// ============================================================================

#[test]
fn equality_is_a_term() {
    assert_eq!(compile(Condition::eq("name", "x")), json!({"query": {"term": {"name": "x"}}}));
    assert_eq!(clause(Condition::eq("f", 1.5)), json!({"term": {"f": 1.5}}));
    assert_eq!(clause(Condition::eq("b", false)), json!({"term": {"b": false}}));
}

#[test]
fn inequality_is_a_negated_term() {
    assert_eq!(
        clause(Condition::ne("name", "x")),
        json!({"bool": {"must_not": [{"term": {"name": "x"}}]}})
    );
}

#[test]
fn ordering_comparisons_are_ranges() {
    assert_eq!(clause(Condition::gt("v", 2)), json!({"range": {"v": {"gt": 2}}}));
    assert_eq!(clause(Condition::ge("v", 2)), json!({"range": {"v": {"gte": 2}}}));
    assert_eq!(clause(Condition::lt("v", 2)), json!({"range": {"v": {"lt": 2}}}));
    assert_eq!(clause(Condition::le("v", 2)), json!({"range": {"v": {"lte": 2}}}));
}

#[test]
fn existence() {
    assert_eq!(clause(Condition::exists("a")), json!({"exists": {"field": "a"}}));
    assert_eq!(
        clause(Condition::missing("a")),
        json!({"bool": {"must_not": [{"exists": {"field": "a"}}]}})
    );
}

#[test]
fn membership_is_terms() {
    assert_eq!(
        clause(Condition::is_in("tags", ["a", "b"])),
        json!({"terms": {"tags": ["a", "b"]}})
    );
}

// ============================================================================
// Logical nodes
// ============================================================================

#[test]
fn and_is_must() {
    assert_eq!(
        compile(Condition::gt("value", 2) & Condition::lt("value", 4)),
        json!({"query": {"bool": {"must": [
            {"range": {"value": {"gt": 2}}},
            {"range": {"value": {"lt": 4}}}
        ]}}})
    );
}

#[test]
fn or_is_should_with_minimum_match() {
    assert_eq!(
        clause(Condition::eq("a", 1) | Condition::exists("b")),
        json!({"bool": {
            "should": [{"term": {"a": 1}}, {"exists": {"field": "b"}}],
            "minimum_should_match": 1
        }})
    );
}

#[test]
fn not_is_must_not() {
    assert_eq!(
        clause(!(Condition::eq("a", 1) & Condition::eq("b", 2))),
        json!({"bool": {"must_not": [{"bool": {"must": [
            {"term": {"a": 1}},
            {"term": {"b": 2}}
        ]}}]}})
    );
}

#[test]
fn tree_structure_is_kept_as_built() {
    let c = (Condition::eq("a", 1) & Condition::eq("b", 2)) & Condition::eq("c", 3);
    assert_eq!(
        clause(c),
        json!({"bool": {"must": [
            {"bool": {"must": [{"term": {"a": 1}}, {"term": {"b": 2}}]}},
            {"term": {"c": 3}}
        ]}})
    );
}

// ============================================================================
// Modifiers
// ============================================================================

#[test]
fn no_condition_is_match_all() {
    assert_eq!(compile(Query::match_all()), json!({"query": {"match_all": {}}}));
}

#[test]
fn limit_is_top_level_size() {
    assert_eq!(
        compile(Condition::eq("a", 1) & Limit::from(3)),
        json!({"query": {"term": {"a": 1}}, "size": 3})
    );
    assert_eq!(
        compile(Limit::from(0)),
        json!({"query": {"match_all": {}}, "size": 0})
    );
}

#[test]
fn score_wraps_the_outermost_clause() {
    assert_eq!(
        compile(Condition::exists("a") & Score::script("doc['value'].value")),
        json!({"query": {"function_score": {
            "query": {"exists": {"field": "a"}},
            "functions": [{"script_score": {"script": {"source": "doc['value'].value", "params": {}}}}],
            "score_mode": "sum"
        }}})
    );
}

#[test]
fn score_modes() {
    let best = Score::script("a").or(&Score::script("b")).unwrap();
    let doc = compile(best);
    assert_eq!(doc["query"]["function_score"]["score_mode"], "max");
    assert_eq!(doc["query"]["function_score"]["query"], json!({"match_all": {}}));
    assert_eq!(doc["query"]["function_score"]["functions"].as_array().unwrap().len(), 2);

    let all = Score::script("a").and(&Score::script("b")).unwrap();
    assert_eq!(compile(all.clone())["query"]["function_score"]["score_mode"], "sum");

    let config = Config::default().with_all_score_mode(ScoreMode::Multiply);
    let doc = compiler::compile(&all.into(), &config).unwrap();
    assert_eq!(doc["query"]["function_score"]["score_mode"], "multiply");
}

#[test]
fn score_and_limit_together() {
    let query = Query::from(Condition::eq("a", 1))
        .with_limit(Limit::from(5))
        .with_score(Score::script("s"));
    let doc = compile(query);
    assert_eq!(doc["size"], 5);
    assert_eq!(doc["query"]["function_score"]["query"], json!({"term": {"a": 1}}));
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn depth_beyond_configured_bound_fails() {
    let mut c = Condition::exists("a");
    for _ in 0..100 {
        c = c & Condition::exists("b");
    }
    let config = Config::default().with_max_depth(50);
    assert_eq!(
        compiler::compile(&c.into(), &config),
        Err(CompileError::DepthExceeded(50))
    );
}

#[test]
fn rejected_deep_tree_can_be_dropped() {
    let mut c = Condition::exists("f");
    for i in 0..200_000 {
        c = c & Condition::eq("x", i as i64);
    }
    let query = Query::from(c);
    assert_eq!(
        compiler::compile(&query, &Config::default()),
        Err(CompileError::DepthExceeded(512))
    );
    drop(query);
}
