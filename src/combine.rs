//! Combination of conditions, limits, scores and queries.
//!
//! Every value a caller can build is a [`Combinable`]. Two combinables meet
//! under `and`/`or` according to this table:
//!
//! | left \ right | condition | limit | score |
//! |---|---|---|---|
//! | condition | AND/OR node | `and`: query, `or`: error | `and`: query, `or`: error |
//! | limit | `and`: query, `or`: error | min / max | `and`: query, `or`: error |
//! | score | `and`: query, `or`: error | `and`: query, `or`: error | all / best |
//!
//! A query on either side absorbs the other operand channel by channel,
//! using the same rules inside each channel. A channel that is absent on
//! one side takes the other side's value unchanged.
//!
//! `not` is only defined for conditions and for queries that carry one.
//!
//! # Examples
//!
//! ```
//! use oqr::{and, or, Combinable, Condition, Limit, Score};
//!
//! let cond = Condition::gt("value", 0);
//! let q = and(cond.clone(), Score::script("doc['value'].value * 0.1")).unwrap();
//! let q = and(q, Limit::new(3).unwrap()).unwrap();
//! assert!(matches!(q, Combinable::Query(_)));
//!
//! assert!(or(cond, Limit::new(3).unwrap()).is_err());
//! ```

use std::ops::{BitAnd, BitOr};

use crate::{
    ast::{Condition, Limit, Node, Query, Score},
    error::ConstructionError,
};

/// Any value that takes part in combination.
#[derive(Debug, Clone, PartialEq)]
pub enum Combinable {
    Condition(Condition),
    Limit(Limit),
    Score(Score),
    Query(Query),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    And,
    Or,
}

impl Op {
    fn name(self) -> &'static str {
        match self {
            Op::And => "and",
            Op::Or => "or",
        }
    }
}

impl Combinable {
    pub fn kind(&self) -> &'static str {
        match self {
            Combinable::Condition(_) => "condition",
            Combinable::Limit(_) => "limit",
            Combinable::Score(_) => "score",
            Combinable::Query(_) => "query",
        }
    }

    fn is_query(&self) -> bool {
        matches!(self, Combinable::Query(_))
    }

    pub fn and(self, other: impl Into<Combinable>) -> Result<Combinable, ConstructionError> {
        combine(self, other.into(), Op::And)
    }

    pub fn or(self, other: impl Into<Combinable>) -> Result<Combinable, ConstructionError> {
        combine(self, other.into(), Op::Or)
    }

    pub fn negate(self) -> Result<Combinable, ConstructionError> {
        match self {
            Combinable::Condition(c) => Ok(Combinable::Condition(!c)),
            Combinable::Query(q) => {
                let condition = q.condition.ok_or(ConstructionError::NegateEmptyQuery)?;
                Ok(Combinable::Query(Query {
                    condition: Some(!condition),
                    ..q
                }))
            }
            other => Err(ConstructionError::NegateModifier { kind: other.kind() }),
        }
    }

    /// View this value as a full query; a bare condition or modifier fills
    /// just its own channel.
    pub fn into_query(self) -> Query {
        match self {
            Combinable::Condition(c) => c.into(),
            Combinable::Limit(l) => l.into(),
            Combinable::Score(s) => s.into(),
            Combinable::Query(q) => q,
        }
    }
}

fn combine(left: Combinable, right: Combinable, op: Op) -> Result<Combinable, ConstructionError> {
    match (left, right) {
        (Combinable::Condition(l), Combinable::Condition(r)) => {
            Ok(Combinable::Condition(join_conditions(l, r, op)))
        }
        (Combinable::Limit(l), Combinable::Limit(r)) => Ok(Combinable::Limit(join_limits(l, r, op))),
        (Combinable::Score(l), Combinable::Score(r)) => {
            Ok(Combinable::Score(join_scores(&l, &r, op)?))
        }

        // A bare modifier has no condition to OR against.
        (l, r) if op == Op::Or && !l.is_query() && !r.is_query() => {
            Err(ConstructionError::IncompatibleKinds {
                op: op.name(),
                left: l.kind(),
                right: r.kind(),
            })
        }
        (l, r) => Ok(Combinable::Query(merge_queries(
            l.into_query(),
            r.into_query(),
            op,
        )?)),
    }
}

fn join_conditions(left: Condition, right: Condition, op: Op) -> Condition {
    match op {
        Op::And => left & right,
        Op::Or => left | right,
    }
}

fn join_limits(left: Limit, right: Limit, op: Op) -> Limit {
    match op {
        Op::And => left & right,
        Op::Or => left | right,
    }
}

fn join_scores(left: &Score, right: &Score, op: Op) -> Result<Score, ConstructionError> {
    match op {
        Op::And => left.and(right),
        Op::Or => left.or(right),
    }
}

/// Channel-wise merge; an absent channel takes the other side's value.
fn merge_queries(left: Query, right: Query, op: Op) -> Result<Query, ConstructionError> {
    let condition = match (left.condition, right.condition) {
        (Some(l), Some(r)) => Some(join_conditions(l, r, op)),
        (l, r) => l.or(r),
    };
    let limit = match (left.limit, right.limit) {
        (Some(l), Some(r)) => Some(join_limits(l, r, op)),
        (l, r) => l.or(r),
    };
    let score = match (left.score, right.score) {
        (Some(l), Some(r)) => Some(join_scores(&l, &r, op)?),
        (l, r) => l.or(r),
    };
    Ok(Query {
        condition,
        limit,
        score,
    })
}

/// Conjunction of two combinables.
pub fn and(
    left: impl Into<Combinable>,
    right: impl Into<Combinable>,
) -> Result<Combinable, ConstructionError> {
    combine(left.into(), right.into(), Op::And)
}

/// Disjunction of two combinables.
pub fn or(
    left: impl Into<Combinable>,
    right: impl Into<Combinable>,
) -> Result<Combinable, ConstructionError> {
    combine(left.into(), right.into(), Op::Or)
}

/// Negation; fails for limits, scores and condition-less queries.
pub fn not(operand: impl Into<Combinable>) -> Result<Combinable, ConstructionError> {
    operand.into().negate()
}

/// N-ary conjunction.
///
/// Plain conditions become one AND node holding every operand; anything
/// else is folded left to right with [`and`].
pub fn and_all<I, T>(operands: I) -> Result<Combinable, ConstructionError>
where
    I: IntoIterator<Item = T>,
    T: Into<Combinable>,
{
    combine_all(operands, Op::And)
}

/// N-ary disjunction, the counterpart of [`and_all`].
pub fn or_all<I, T>(operands: I) -> Result<Combinable, ConstructionError>
where
    I: IntoIterator<Item = T>,
    T: Into<Combinable>,
{
    combine_all(operands, Op::Or)
}

fn combine_all<I, T>(operands: I, op: Op) -> Result<Combinable, ConstructionError>
where
    I: IntoIterator<Item = T>,
    T: Into<Combinable>,
{
    let operands: Vec<Combinable> = operands.into_iter().map(Into::into).collect();
    if operands.is_empty() {
        return Err(ConstructionError::EmptyCombination { op: op.name() });
    }

    if operands.iter().all(|c| matches!(c, Combinable::Condition(_))) {
        let children: Vec<Condition> = operands
            .into_iter()
            .filter_map(|c| match c {
                Combinable::Condition(c) => Some(c),
                _ => None,
            })
            .collect();
        let node = match op {
            Op::And => Node::And(children),
            Op::Or => Node::Or(children),
        };
        return Ok(Combinable::Condition(node.into()));
    }

    let mut iter = operands.into_iter();
    let mut acc = match iter.next() {
        Some(first) => first,
        None => return Err(ConstructionError::EmptyCombination { op: op.name() }),
    };
    for next in iter {
        acc = combine(acc, next, op)?;
    }
    Ok(acc)
}

impl From<Condition> for Combinable {
    fn from(c: Condition) -> Self {
        Combinable::Condition(c)
    }
}

impl From<Limit> for Combinable {
    fn from(l: Limit) -> Self {
        Combinable::Limit(l)
    }
}

impl From<Score> for Combinable {
    fn from(s: Score) -> Self {
        Combinable::Score(s)
    }
}

impl From<Query> for Combinable {
    fn from(q: Query) -> Self {
        Combinable::Query(q)
    }
}

impl From<Combinable> for Query {
    fn from(c: Combinable) -> Self {
        c.into_query()
    }
}

// Infallible operator sugar. Anything that can fail (score mixing, OR with a
// modifier, negating a modifier) is only reachable through `and`/`or`/`not`.

impl BitAnd<Limit> for Condition {
    type Output = Query;

    fn bitand(self, rhs: Limit) -> Query {
        Query::from(self).with_limit(rhs)
    }
}

impl BitAnd<Score> for Condition {
    type Output = Query;

    fn bitand(self, rhs: Score) -> Query {
        Query::from(self).with_score(rhs)
    }
}

impl BitAnd<Condition> for Limit {
    type Output = Query;

    fn bitand(self, rhs: Condition) -> Query {
        Query::from(rhs).with_limit(self)
    }
}

impl BitAnd<Condition> for Query {
    type Output = Query;

    fn bitand(self, rhs: Condition) -> Query {
        let condition = match self.condition {
            Some(c) => c & rhs,
            None => rhs,
        };
        Query {
            condition: Some(condition),
            ..self
        }
    }
}

impl BitOr<Condition> for Query {
    type Output = Query;

    fn bitor(self, rhs: Condition) -> Query {
        let condition = match self.condition {
            Some(c) => c | rhs,
            None => rhs,
        };
        Query {
            condition: Some(condition),
            ..self
        }
    }
}

impl BitAnd<Limit> for Query {
    type Output = Query;

    fn bitand(self, rhs: Limit) -> Query {
        let limit = self.limit.map_or(rhs, |l| l & rhs);
        self.with_limit(limit)
    }
}

impl BitOr<Limit> for Query {
    type Output = Query;

    fn bitor(self, rhs: Limit) -> Query {
        let limit = self.limit.map_or(rhs, |l| l | rhs);
        self.with_limit(limit)
    }
}
