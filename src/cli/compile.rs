//! Compile a Mongo-style query into a search document

use serde_json::Value;

use super::CliError;
use crate::{ast::Limit, compiler, config::Config, mongo};

/// Options for the compile command
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Mongo-style query as JSON text
    pub query: String,
    /// Result-count cap attached to the query
    pub limit: Option<i64>,
}

/// Parse, attach the optional limit, and compile.
pub fn execute_compile(options: &CompileOptions, config: &Config) -> Result<Value, CliError> {
    let query: Value = serde_json::from_str(&options.query)?;
    let mut query = mongo::parse_query(&query, config)?;
    if let Some(n) = options.limit {
        query = query & Limit::new(n)?;
    }
    Ok(compiler::compile(&query, config)?)
}
