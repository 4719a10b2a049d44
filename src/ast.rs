//! # Condition AST
//!
//! This module defines the values callers build search conditions from: the
//! immutable condition tree plus the two side-channel modifiers that ride
//! alongside it.
//!
//! ## Architecture Overview
//!
//! - **[condition]** - Condition nodes (comparison, existence, membership, AND/OR/NOT)
//! - **[operators]** - Comparison operators and their wire/canonical spellings
//! - **[modifiers]** - Result-count [`Limit`] and scripted [`Score`]
//! - **[query]** - The top-level [`Query`] carrying all three channels
//!
//! ## Quick Start
//!
//! ```
//! use oqr::ast::Condition;
//!
//! let range = Condition::gt("value", 2) & Condition::lt("value", 4);
//! let named = Condition::eq("name", "test_document4");
//! let either = range | named;
//! assert_eq!(either.depth(), 3);
//! ```
//!
//! ## Sharing
//!
//! A [`Condition`] is a reference-counted handle to an immutable node.
//! Cloning it is cheap and combining two conditions never touches either
//! operand, so one subtree may sit under several parents and be read from
//! several threads at once.
//!
//! ## Modifier Algebra
//!
//! Limits and scores do not take part in boolean evaluation:
//!
//! - `Limit & Limit` keeps the smaller bound, `Limit | Limit` the larger
//! - `Score & Score` applies every script, `Score | Score` keeps the best one
pub mod condition;
pub mod modifiers;
pub mod operators;
pub mod query;

pub use condition::{Condition, Field, Node};
pub use modifiers::{Limit, Score, ScoreCombine, ScoreMode, Script};
pub use operators::CompareOp;
pub use query::Query;
