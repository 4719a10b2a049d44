//! Canonical strings for Mongo-style queries and compiled documents

use serde_json::Value;

use super::CliError;
use crate::{config::Config, decompile, mongo, normalize};

/// Options for the normalize command
#[derive(Debug, Clone, Default)]
pub struct NormalizeOptions {
    /// JSON text: a Mongo-style query, or a search document with `document`
    pub input: String,
    /// Read the input as a compiled search document
    pub document: bool,
}

pub fn execute_normalize(options: &NormalizeOptions, config: &Config) -> Result<String, CliError> {
    let input: Value = serde_json::from_str(&options.input)?;
    if options.document {
        return Ok(decompile::normalized_readable_query(&input, config)?);
    }
    let query = mongo::parse_query(&input, config)?;
    Ok(normalize::normalized_query_string(&query, config)?)
}
