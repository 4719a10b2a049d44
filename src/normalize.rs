//! Canonical form of condition trees.
//!
//! Normalization rewrites a tree until none of these rules applies:
//!
//! 1. `f != v` → `not(f == v)`, `f > v` → `not(f <= v)`, `f >= v` → `not(f < v)`,
//!    `missing(f)` → `not(exists(f))`
//! 2. `not(not(x))` → `x`
//! 3. `not(and(x, y))` → `or(not(x), not(y))` and the dual for `or`
//! 4. nested AND/OR of the same kind are spliced into their parent, and a
//!    one-child AND/OR is replaced by its child
//! 5. AND/OR children are ordered by their rendering; membership values are
//!    deduplicated and ordered the same way
//!
//! Two trees are equivalent for this crate's purposes iff their canonical
//! strings match. Equivalences that need reasoning about values (`f < 5`
//! versus `f <= 4`) are not detected.
//!
//! # Examples
//!
//! ```
//! use oqr::{normalize, Condition};
//!
//! let c = Condition::exists("array")
//!     & Condition::ne("name", "test_document4")
//!     & (Condition::gt("value", 2) | Condition::lt("value", 4));
//! assert_eq!(
//!     normalize::normalized_string(&c).unwrap(),
//!     "and(exists(array), not(name == test_document4), or(not(value <= 2), value < 4))"
//! );
//! ```

use std::fmt;

use crate::{
    ast::{CompareOp, Condition, Node, Query},
    config::Config,
    error::NormalizeError,
};

/// Canonical form of `condition` under the default [`Config`].
pub fn normalize(condition: &Condition) -> Result<Condition, NormalizeError> {
    normalize_with(condition, &Config::default())
}

/// Canonical form of `condition`.
///
/// Fails if the tree is deeper than `config.max_depth` or if no fixed point
/// is reached within `config.max_passes` passes.
pub fn normalize_with(condition: &Condition, config: &Config) -> Result<Condition, NormalizeError> {
    normalize_counted(condition, config).map(|(canonical, _)| canonical)
}

/// Like [`normalize_with`], also returning how many passes ran (including
/// the final pass that changed nothing).
pub fn normalize_counted(
    condition: &Condition,
    config: &Config,
) -> Result<(Condition, usize), NormalizeError> {
    if condition.depth() > config.max_depth {
        return Err(NormalizeError::DepthExceeded(config.max_depth));
    }

    let mut current = condition.clone();
    let mut passes = 0;
    loop {
        if passes >= config.max_passes {
            return Err(NormalizeError::NoFixpoint(config.max_passes));
        }
        passes += 1;
        let (next, changed) = rewrite(&current);
        current = next;
        if !changed {
            break;
        }
    }

    tracing::trace!(passes, "normalized condition");
    Ok((current, passes))
}

/// Canonical string of `condition`.
pub fn normalized_string(condition: &Condition) -> Result<String, NormalizeError> {
    normalize(condition).map(|c| c.to_string())
}

/// Normalize the condition channel of a query; limit and score pass through.
pub fn normalize_query(query: &Query, config: &Config) -> Result<Query, NormalizeError> {
    let condition = query
        .condition
        .as_ref()
        .map(|c| normalize_with(c, config))
        .transpose()?;
    Ok(Query {
        condition,
        ..query.clone()
    })
}

/// Canonical string of a query's condition channel, `match_all()` if absent.
pub fn normalized_query_string(query: &Query, config: &Config) -> Result<String, NormalizeError> {
    match &query.condition {
        Some(condition) => normalize_with(condition, config).map(|c| c.to_string()),
        None => Ok("match_all()".to_string()),
    }
}

/// One bottom-up pass applying every rule once per node.
fn rewrite(condition: &Condition) -> (Condition, bool) {
    match condition.node() {
        Node::Compare { field, op, value } => {
            let positive = match op {
                CompareOp::Ne => CompareOp::Eq,
                CompareOp::Gt => CompareOp::Le,
                CompareOp::Ge => CompareOp::Lt,
                CompareOp::Eq | CompareOp::Lt | CompareOp::Le => {
                    return (condition.clone(), false);
                }
            };
            let inner = Condition::compare(field.clone(), positive, value.clone());
            (!inner, true)
        }
        Node::Exists { field, present } => {
            if *present {
                (condition.clone(), false)
            } else {
                (!Condition::exists(field.clone()), true)
            }
        }
        Node::In { field, values } => {
            // `1` and `"1"` render alike but stay distinct members
            let mut keyed: Vec<((String, &str), _)> = values
                .iter()
                .map(|v| ((v.to_string(), v.type_name()), v.clone()))
                .collect();
            keyed.sort_by(|a, b| a.0.cmp(&b.0));
            keyed.dedup_by(|a, b| a.0 == b.0);
            let unchanged = keyed.len() == values.len()
                && keyed
                    .iter()
                    .zip(values)
                    .all(|(((text, kind), _), v)| *text == v.to_string() && *kind == v.type_name());
            if unchanged {
                return (condition.clone(), false);
            }
            let values = keyed.into_iter().map(|(_, v)| v);
            (Condition::is_in(field.clone(), values), true)
        }
        Node::Not(child) => {
            let (child, changed) = rewrite(child);
            match child.node() {
                Node::Not(inner) => (inner.clone(), true),
                Node::And(children) => (Node::Or(negate_all(children)).into(), true),
                Node::Or(children) => (Node::And(negate_all(children)).into(), true),
                _ if changed => (child.negate(), true),
                _ => (condition.clone(), false),
            }
        }
        Node::And(children) => rewrite_junction(condition, children, true),
        Node::Or(children) => rewrite_junction(condition, children, false),
    }
}

fn negate_all(children: &[Condition]) -> Vec<Condition> {
    children.iter().map(Condition::negate).collect()
}

fn rewrite_junction(original: &Condition, children: &[Condition], is_and: bool) -> (Condition, bool) {
    let mut changed = false;
    let mut flat = Vec::with_capacity(children.len());
    for child in children {
        let (child, child_changed) = rewrite(child);
        changed |= child_changed;
        let spliced = match child.node() {
            Node::And(grandchildren) if is_and => Some(grandchildren.clone()),
            Node::Or(grandchildren) if !is_and => Some(grandchildren.clone()),
            _ => None,
        };
        match spliced {
            Some(grandchildren) => {
                flat.extend(grandchildren);
                changed = true;
            }
            None => flat.push(child),
        }
    }

    if flat.len() == 1 {
        return (flat.remove(0), true);
    }

    // `v == 2` and `v == "2"` render alike; the debug form tells them apart
    let mut keyed: Vec<((String, String), Condition)> = flat
        .into_iter()
        .map(|c| ((c.to_string(), format!("{:?}", c.node())), c))
        .collect();
    if !keyed.windows(2).all(|w| w[0].0 <= w[1].0) {
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        changed = true;
    }

    if !changed {
        return (original.clone(), false);
    }
    let children = keyed.into_iter().map(|(_, c)| c).collect();
    let node = if is_and { Node::And(children) } else { Node::Or(children) };
    (node.into(), true)
}

/// Readable rendering: `field op value`, `exists(field)`,
/// `field in [v1, v2]`, `not(x)`, `and(x, y)`, `or(x, y)`.
///
/// Children are written in their stored order; normalize first for the
/// canonical string.
impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node() {
            Node::Compare { field, op, value } => write!(f, "{} {} {}", field, op.symbol(), value),
            Node::Exists { field, present: true } => write!(f, "exists({})", field),
            Node::Exists { field, present: false } => write!(f, "not(exists({}))", field),
            Node::In { field, values } => {
                write!(f, "{} in [", field)?;
                write_joined(f, values)?;
                write!(f, "]")
            }
            Node::Not(child) => write!(f, "not({})", child),
            Node::And(children) => {
                write!(f, "and(")?;
                write_joined(f, children)?;
                write!(f, ")")
            }
            Node::Or(children) => {
                write!(f, "or(")?;
                write_joined(f, children)?;
                write!(f, ")")
            }
        }
    }
}

fn write_joined<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}
