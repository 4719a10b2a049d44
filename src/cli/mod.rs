//! CLI support for oqr
//!
//! Provides programmatic access to the `oqr` commands for embedding in
//! other tools. Every command takes its input as JSON text and returns a
//! value ready to print.

mod compile;
mod find;
mod normalize;

pub use compile::{CompileOptions, execute_compile};
pub use find::{FindOptions, execute_find};
pub use normalize::{NormalizeOptions, execute_normalize};

use std::io;

use crate::{
    error::{CompileError, ConstructionError, DecompileError, MongoError, NormalizeError},
    executor::{IndexError, memory::MemoryError},
};

/// Errors that can occur during CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid query: {0}")]
    Mongo(#[from] MongoError),

    #[error("Invalid query: {0}")]
    Construction(#[from] ConstructionError),

    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("Normalize error: {0}")]
    Normalize(#[from] NormalizeError),

    #[error("Unreadable search document: {0}")]
    Decompile(#[from] DecompileError),

    #[error("Search failed: {0}")]
    Search(#[from] IndexError<MemoryError>),

    /// Documents file was neither a JSON array nor JSON lines of objects
    #[error("Invalid documents: {0}")]
    Documents(String),

    #[error("No input provided. Pass the query as an argument or pipe it to stdin.")]
    NoInput,
}
