// Decompile Tests
//
// Reading search documents back into queries so raw documents can be
// compared with built ones.

use oqr::executor::memory::MemoryBackend;
use oqr::executor::{Index, SearchBackend};
use oqr::{
    Condition, ConstructionError, Config, DecompileError, Limit, Query, Score, ScoreCombine,
    compiler, decompile, normalize,
};
use serde_json::json;

fn readable(doc: serde_json::Value) -> String {
    decompile::normalized_readable_query(&doc, &Config::default()).unwrap()
}

// ============================================================================
// Round trips through the compiler
// ============================================================================

#[test]
fn compiled_conditions_read_back_equivalently() {
    let config = Config::default();
    let conditions = [
        Condition::exists("array")
            & Condition::ne("name", "test_document4")
            & (Condition::gt("value", 2) | Condition::lt("value", 4)),
        !(Condition::is_in("t", [2, 1]) | Condition::missing("m")),
        Condition::ge("nested.field", 1.5),
    ];
    for c in conditions {
        let doc = compiler::compile(&c.clone().into(), &config).unwrap();
        assert_eq!(
            decompile::normalized_readable_query(&doc, &config).unwrap(),
            normalize::normalized_string(&c).unwrap()
        );
    }
}

#[test]
fn modifiers_read_back() {
    let config = Config::default();
    let query = Query::from(Condition::eq("a", 1))
        .with_limit(Limit::from(4))
        .with_score(Score::script("doc['value'].value"));
    let doc = compiler::compile(&query, &config).unwrap();
    assert_eq!(decompile::from_document(&doc, &config).unwrap(), query);
}

#[test]
fn best_of_scores_reads_back() {
    let config = Config::default();
    let score = Score::script("a").or(&Score::script("b")).unwrap();
    let doc = compiler::compile(&score.clone().into(), &config).unwrap();
    let query = decompile::from_document(&doc, &config).unwrap();
    assert_eq!(query.score, Some(score));
    assert_eq!(query.condition, None);
}

#[test]
fn single_best_of_score_keeps_its_mode() {
    let config = Config::default();
    let doc = json!({"query": {"function_score": {
        "query": {"match_all": {}},
        "functions": [{"script_score": {"script": {"source": "a"}}}],
        "score_mode": "max"
    }}});
    let query = decompile::from_document(&doc, &config).unwrap();
    assert_eq!(query.score.as_ref().and_then(Score::combine), Some(ScoreCombine::Best));
    let recompiled = compiler::compile(&query, &config).unwrap();
    assert_eq!(recompiled["query"]["function_score"]["score_mode"], "max");
}

#[test]
fn single_summed_score_reads_back_unchanged() {
    let config = Config::default();
    let doc = compiler::compile(&Score::script("a").into(), &config).unwrap();
    let query = decompile::from_document(&doc, &config).unwrap();
    assert_eq!(query.score, Some(Score::script("a")));
}

// ============================================================================
// Hand-written documents
// ============================================================================

#[test]
fn match_all_reads_as_no_condition() {
    assert_eq!(readable(json!({"query": {"match_all": {}}})), "match_all()");
}

#[test]
fn bare_clause_is_accepted() {
    assert_eq!(readable(json!({"term": {"name": "x"}})), "name == x");
}

#[test]
fn term_value_form() {
    assert_eq!(
        readable(json!({"query": {"term": {"name": {"value": "x"}}}})),
        "name == x"
    );
}

#[test]
fn multiple_bounds_in_one_range() {
    assert_eq!(
        readable(json!({"query": {"range": {"value": {"gte": 1, "lt": 3}}}})),
        "and(not(value < 1), value < 3)"
    );
}

#[test]
fn filter_counts_as_must() {
    assert_eq!(
        readable(json!({"query": {"bool": {
            "filter": {"term": {"a": 1}},
            "must": [{"exists": {"field": "b"}}]
        }}})),
        "and(a == 1, exists(b))"
    );
}

#[test]
fn should_with_match_all_matches_everything() {
    assert_eq!(
        readable(json!({"query": {"bool": {"should": [{"term": {"a": 1}}, {"match_all": {}}]}}})),
        "match_all()"
    );
}

#[test]
fn should_is_optional_beside_must() {
    assert_eq!(
        readable(json!({"query": {"bool": {
            "must": [{"term": {"a": 1}}],
            "should": [{"term": {"b": 2}}]
        }}})),
        "a == 1"
    );
    assert_eq!(
        readable(json!({"query": {"bool": {
            "filter": {"match_all": {}},
            "should": [{"term": {"b": 2}}]
        }}})),
        "match_all()"
    );
}

#[test]
fn minimum_should_match_makes_should_required() {
    assert_eq!(
        readable(json!({"query": {"bool": {
            "must": [{"term": {"a": 1}}],
            "should": [{"term": {"b": 2}}, {"term": {"c": 3}}],
            "minimum_should_match": 1
        }}})),
        "and(a == 1, or(b == 2, c == 3))"
    );
    assert_eq!(
        readable(json!({"query": {"bool": {
            "should": [{"term": {"b": 2}}],
            "minimum_should_match": 0
        }}})),
        "match_all()"
    );
}

#[test]
fn decompiled_bool_finds_what_the_raw_document_finds() {
    let mut index = Index::new(MemoryBackend::new(), "docs");
    index
        .insert_many(vec![json!({"a": 1, "b": 3}), json!({"a": 2, "b": 2})])
        .unwrap();
    let doc = json!({"query": {"bool": {
        "must": [{"term": {"a": 1}}],
        "should": [{"term": {"b": 2}}]
    }}});

    let raw = index.backend().search("docs", &doc).unwrap();
    let rebuilt = index
        .find(decompile::from_document(&doc, &Config::default()).unwrap())
        .unwrap();
    assert_eq!(raw.len(), 1);
    assert_eq!(rebuilt, raw);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn unknown_clause() {
    let err = decompile::from_document(
        &json!({"query": {"wildcard": {"name": "x*"}}}),
        &Config::default(),
    )
    .unwrap_err();
    assert_eq!(err, DecompileError::UnsupportedClause("wildcard".to_string()));
}

#[test]
fn must_not_match_all_is_rejected() {
    let err = decompile::from_document(
        &json!({"query": {"bool": {"must_not": [{"match_all": {}}]}}}),
        &Config::default(),
    )
    .unwrap_err();
    assert!(matches!(err, DecompileError::Malformed { clause: "bool", .. }));
}

#[test]
fn negative_size_is_rejected() {
    let err = decompile::from_document(
        &json!({"query": {"match_all": {}}, "size": -2}),
        &Config::default(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        DecompileError::Construction(ConstructionError::NegativeLimit(-2))
    );
}

#[test]
fn deep_documents_are_rejected() {
    let mut clause = json!({"term": {"a": 1}});
    for _ in 0..30 {
        clause = json!({"bool": {"must_not": [clause]}});
    }
    let config = Config::default().with_max_depth(8);
    assert_eq!(
        decompile::from_document(&json!({"query": clause}), &config),
        Err(DecompileError::DepthExceeded(8))
    );
}

#[test]
fn unsupported_minimum_should_match() {
    let config = Config::default();
    let err = decompile::from_document(
        &json!({"query": {"bool": {
            "should": [{"term": {"a": 1}}, {"term": {"b": 2}}],
            "minimum_should_match": 2
        }}}),
        &config,
    )
    .unwrap_err();
    assert!(matches!(err, DecompileError::UnsupportedClause(_)));

    let err = decompile::from_document(
        &json!({"query": {"bool": {"should": [{"term": {"a": 1}}], "minimum_should_match": "50%"}}}),
        &config,
    )
    .unwrap_err();
    assert!(matches!(err, DecompileError::Malformed { clause: "bool", .. }));
}

#[test]
fn invalid_field_paths_are_rejected() {
    let config = Config::default();
    for doc in [
        json!({"term": {"": 1}}),
        json!({"terms": {"$or": [1]}}),
        json!({"range": {"a..b": {"lt": 1}}}),
        json!({"exists": {"field": ".a"}}),
    ] {
        assert!(
            matches!(
                decompile::from_document(&doc, &config),
                Err(DecompileError::Malformed { .. })
            ),
            "accepted {}",
            doc
        );
    }
}
