//! Boolean search conditions as values.
//!
//! Conditions, result limits and scoring scripts are built with ordinary
//! operators, compiled to OpenSearch query documents, and reduced to a
//! canonical string for equivalence checks.
//!
//! ```
//! use oqr::{compiler, normalize, Condition, Config, Limit};
//!
//! let c = Condition::gt("value", 2) & Condition::lt("value", 4);
//! let query = c.clone() & Limit::from(5);
//! let doc = compiler::compile(&query, &Config::default()).unwrap();
//! assert_eq!(doc["size"], 5);
//! assert_eq!(normalize::normalized_string(&c).unwrap(), "and(not(value <= 2), value < 4)");
//! ```

pub mod ast;
pub mod cli;
pub mod combine;
pub mod compiler;
pub mod config;
pub mod decompile;
pub mod error;
pub mod executor;
pub mod mongo;
pub mod normalize;
pub mod value;

pub use ast::{CompareOp, Condition, Field, Limit, Node, Query, Score, ScoreCombine, ScoreMode, Script};
pub use combine::{Combinable, and, and_all, not, or, or_all};
pub use config::Config;
pub use error::{CompileError, ConstructionError, DecompileError, MongoError, NormalizeError};
pub use executor::{DocumentStore, Hit, Index, SearchBackend};
pub use value::Scalar;

/// Validated field handle for building conditions, e.g. `field("value")?.gt(2)`.
pub fn field(path: &str) -> Result<Field, ConstructionError> {
    Field::new(path)
}
