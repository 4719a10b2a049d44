//! Run a Mongo-style query against documents held in memory

use serde_json::{Value, json};

use super::CliError;
use crate::{
    ast::Limit,
    config::Config,
    executor::{Index, memory::MemoryBackend},
    mongo,
};

/// Options for the find command
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    /// Mongo-style query as JSON text
    pub query: String,
    /// A JSON array of objects, or one JSON object per line
    pub documents: String,
    /// Result-count cap; the backend default applies when absent
    pub limit: Option<i64>,
}

/// Load the documents into a scratch index and return the matching hits as
/// `[{"_id": .., "_source": ..}, ..]`.
pub fn execute_find(options: &FindOptions, config: &Config) -> Result<Value, CliError> {
    let documents = parse_documents(&options.documents)?;

    let mut index = Index::new(MemoryBackend::new(), "cli").with_config(*config);
    index.insert_many(documents)?;

    let query: Value = serde_json::from_str(&options.query)?;
    let mut query = mongo::parse_query(&query, config)?;
    if let Some(n) = options.limit {
        query = query & Limit::new(n)?;
    }

    let hits = index.find(query)?;
    Ok(Value::Array(
        hits.into_iter()
            .map(|hit| json!({"_id": hit.id, "_source": hit.source}))
            .collect(),
    ))
}

fn parse_documents(text: &str) -> Result<Vec<Value>, CliError> {
    let trimmed = text.trim_start();
    let documents = if trimmed.starts_with('[') {
        serde_json::from_str::<Vec<Value>>(trimmed)?
    } else {
        trimmed
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(serde_json::from_str)
            .collect::<Result<Vec<Value>, _>>()?
    };

    if let Some(bad) = documents.iter().find(|d| !d.is_object()) {
        return Err(CliError::Documents(format!("expected objects, found {}", bad)));
    }
    Ok(documents)
}
