//! Error types for construction, adaptation, compilation and normalization.
//!
//! Every error is raised synchronously at the offending call. None of them
//! are retried, and no partial query is ever returned alongside one.

/// Errors raised while combining conditions, limits and scores.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConstructionError {
    /// `not` applied to a limit or a score
    #[error("cannot negate a {kind}: negation is only defined for conditions")]
    NegateModifier { kind: &'static str },

    /// A combination with no defined result, e.g. `condition | limit`
    #[error("cannot {op}-combine a {left} with a {right}")]
    IncompatibleKinds {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },

    /// `Limit::new` with a value below zero
    #[error("limit must be non-negative, got {0}")]
    NegativeLimit(i64),

    /// A sum-combined score meeting a max-combined score
    #[error("cannot mix AND-combined scores with OR-combined scores")]
    MixedScoreModes,

    /// `not` applied to a query that only carries modifiers
    #[error("cannot negate a query without a condition")]
    NegateEmptyQuery,

    /// `and_all` / `or_all` over an empty sequence
    #[error("{op} requires at least one operand")]
    EmptyCombination { op: &'static str },

    /// Field path that is empty, has empty segments, or starts with `$`
    #[error("invalid field path '{0}'")]
    InvalidField(String),
}

/// Errors raised by the Mongo-syntax adapter.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MongoError {
    #[error("expected a mapping in {context}, got {found}")]
    NotAMapping { context: String, found: &'static str },

    #[error("unknown operator '{key}' for field '{field}'")]
    UnknownOperator { field: String, key: String },

    #[error("unknown directive '{0}'")]
    UnknownDirective(String),

    #[error("'$in' for field '{field}' requires an array of scalars")]
    InShape { field: String },

    #[error("'$exists' for field '{field}' requires a boolean")]
    ExistsShape { field: String },

    #[error("'{0}' requires at least one condition")]
    EmptyLogical(String),

    #[error("'{0}' requires an array of mappings")]
    LogicalShape(String),

    #[error("mapping in {context} has no conditions")]
    EmptyMapping { context: String },

    #[error("unsupported value for field '{field}': {found} is not a scalar")]
    UnsupportedValue { field: String, found: &'static str },

    #[error("invalid field path '{0}'")]
    InvalidField(String),

    #[error("query nesting exceeds the configured depth of {0}")]
    DepthExceeded(usize),
}

/// Errors raised by the compiler.
///
/// A well-formed tree never produces `Corrupt`: it signals an invariant
/// violation, not a user mistake.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error("corrupt condition tree: {0}")]
    Corrupt(String),

    #[error("condition nesting exceeds the configured depth of {0}")]
    DepthExceeded(usize),
}

/// Errors raised by the normalizer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NormalizeError {
    #[error("condition nesting exceeds the configured depth of {0}")]
    DepthExceeded(usize),

    #[error("normalization did not reach a fixed point within {0} passes")]
    NoFixpoint(usize),
}

/// Errors raised when reading a compiled document back into a query.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecompileError {
    #[error("unsupported clause: {0}")]
    UnsupportedClause(String),

    #[error("malformed '{clause}' clause: {reason}")]
    Malformed { clause: &'static str, reason: String },

    #[error(transparent)]
    Construction(#[from] ConstructionError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error("document nesting exceeds the configured depth of {0}")]
    DepthExceeded(usize),
}
