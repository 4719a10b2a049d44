use std::mem;
use std::ops::{BitAnd, BitOr, Not};
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::{
    ast::CompareOp,
    error::ConstructionError,
    value::Scalar,
};

/// Dotted path: non-empty segments, not starting with `$`.
static FIELD_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^$.][^.]*(\.[^.]+)*$").expect("field path pattern is valid"));

/// Check that `path` is a usable dotted field reference such as `a.b.c`.
pub fn is_valid_field_path(path: &str) -> bool {
    FIELD_PATH.is_match(path)
}

/// A condition tree node.
///
/// Nodes are never mutated after construction; children are shared
/// [`Condition`] handles.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Field comparison
    ///
    /// # Example
    /// ```text
    /// value > 2
    /// ```
    Compare {
        field: String,
        op: CompareOp,
        value: Scalar,
    },

    /// Presence (`present: true`) or absence of a field
    Exists { field: String, present: bool },

    /// Field equals any of `values`
    ///
    /// Order and duplicates carry no meaning.
    In { field: String, values: Vec<Scalar> },

    /// All children hold (at least one child)
    And(Vec<Condition>),

    /// Any child holds (at least one child)
    Or(Vec<Condition>),

    /// Child does not hold
    Not(Condition),
}

/// Shared, immutable handle to a condition tree.
///
/// The leaf builders (`eq`, `exists`, `is_in` and friends) take field paths
/// as given and do not check them. Build through [`Field`] or
/// [`crate::field`] to reject paths such as `""`, `a..b` or `$or` up front.
///
/// # Examples
///
/// ```
/// use oqr::ast::{Condition, Node};
///
/// let c = !Condition::eq("name", "x");
/// assert!(matches!(c.node(), Node::Not(_)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Condition(Arc<Node>);

/// Stand-in child left behind when a `Not` node is torn down.
static DETACHED: LazyLock<Condition> = LazyLock::new(|| {
    Node::Exists {
        field: String::new(),
        present: true,
    }
    .into()
});

/// Move the children of `node` onto `stack`, leaving it childless.
fn detach_children(node: &mut Node, stack: &mut Vec<Condition>) {
    match node {
        Node::And(children) | Node::Or(children) => stack.append(children),
        Node::Not(child) => stack.push(mem::replace(child, DETACHED.clone())),
        Node::Compare { .. } | Node::Exists { .. } | Node::In { .. } => {}
    }
}

// Trees built by repeated combination can be far deeper than the call
// stack allows, so teardown walks an explicit worklist. Only nodes this
// handle owns outright are taken apart; shared subtrees stay intact.
impl Drop for Node {
    fn drop(&mut self) {
        let mut stack = Vec::new();
        detach_children(self, &mut stack);
        while let Some(child) = stack.pop() {
            if let Some(mut node) = Arc::into_inner(child.0) {
                detach_children(&mut node, &mut stack);
            }
        }
    }
}

impl From<Node> for Condition {
    fn from(node: Node) -> Self {
        Condition(Arc::new(node))
    }
}

impl Condition {
    pub fn node(&self) -> &Node {
        &self.0
    }

    /// Whether two handles point at the same node.
    pub fn ptr_eq(&self, other: &Condition) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Unchecked field path; see [`Field::new`] for the validating form.
    pub fn compare(field: impl Into<String>, op: CompareOp, value: impl Into<Scalar>) -> Self {
        Node::Compare {
            field: field.into(),
            op,
            value: value.into(),
        }
        .into()
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::compare(field, CompareOp::Eq, value)
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::compare(field, CompareOp::Ne, value)
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::compare(field, CompareOp::Gt, value)
    }

    pub fn ge(field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::compare(field, CompareOp::Ge, value)
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::compare(field, CompareOp::Lt, value)
    }

    pub fn le(field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::compare(field, CompareOp::Le, value)
    }

    /// Field is present.
    pub fn exists(field: impl Into<String>) -> Self {
        Node::Exists {
            field: field.into(),
            present: true,
        }
        .into()
    }

    /// Field is absent.
    pub fn missing(field: impl Into<String>) -> Self {
        Node::Exists {
            field: field.into(),
            present: false,
        }
        .into()
    }

    pub fn is_in<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Scalar>,
    {
        Node::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
        .into()
    }

    /// Conjunction of `children`, failing on an empty sequence.
    pub fn all_of<I>(children: I) -> Result<Self, ConstructionError>
    where
        I: IntoIterator<Item = Condition>,
    {
        let children: Vec<Condition> = children.into_iter().collect();
        if children.is_empty() {
            return Err(ConstructionError::EmptyCombination { op: "and" });
        }
        Ok(Node::And(children).into())
    }

    /// Disjunction of `children`, failing on an empty sequence.
    pub fn any_of<I>(children: I) -> Result<Self, ConstructionError>
    where
        I: IntoIterator<Item = Condition>,
    {
        let children: Vec<Condition> = children.into_iter().collect();
        if children.is_empty() {
            return Err(ConstructionError::EmptyCombination { op: "or" });
        }
        Ok(Node::Or(children).into())
    }

    pub fn negate(&self) -> Self {
        Node::Not(self.clone()).into()
    }

    /// Nesting depth; a leaf has depth 1.
    ///
    /// Walks with an explicit stack so arbitrarily deep trees are measured
    /// without recursion.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1usize)];
        while let Some((cond, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            match cond.node() {
                Node::And(children) | Node::Or(children) => {
                    stack.extend(children.iter().map(|c| (c, depth + 1)));
                }
                Node::Not(child) => stack.push((child, depth + 1)),
                Node::Compare { .. } | Node::Exists { .. } | Node::In { .. } => {}
            }
        }
        deepest
    }
}

impl BitAnd for Condition {
    type Output = Condition;

    fn bitand(self, rhs: Condition) -> Condition {
        Node::And(vec![self, rhs]).into()
    }
}

impl BitOr for Condition {
    type Output = Condition;

    fn bitor(self, rhs: Condition) -> Condition {
        Node::Or(vec![self, rhs]).into()
    }
}

impl Not for Condition {
    type Output = Condition;

    fn not(self) -> Condition {
        Node::Not(self).into()
    }
}

/// A validated field path with comparison builders.
///
/// # Examples
///
/// ```
/// use oqr::field;
///
/// let nested = field("nested.field").unwrap();
/// let cond = nested.eq("value2") | nested.missing();
/// assert!(field("a..b").is_err());
/// # let _ = cond;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field(String);

impl Field {
    pub fn new(path: impl Into<String>) -> Result<Self, ConstructionError> {
        let path = path.into();
        if !is_valid_field_path(&path) {
            return Err(ConstructionError::InvalidField(path));
        }
        Ok(Field(path))
    }

    pub fn path(&self) -> &str {
        &self.0
    }

    pub fn eq(&self, value: impl Into<Scalar>) -> Condition {
        Condition::eq(self.0.clone(), value)
    }

    pub fn ne(&self, value: impl Into<Scalar>) -> Condition {
        Condition::ne(self.0.clone(), value)
    }

    pub fn gt(&self, value: impl Into<Scalar>) -> Condition {
        Condition::gt(self.0.clone(), value)
    }

    pub fn ge(&self, value: impl Into<Scalar>) -> Condition {
        Condition::ge(self.0.clone(), value)
    }

    pub fn lt(&self, value: impl Into<Scalar>) -> Condition {
        Condition::lt(self.0.clone(), value)
    }

    pub fn le(&self, value: impl Into<Scalar>) -> Condition {
        Condition::le(self.0.clone(), value)
    }

    pub fn is_in<I, V>(&self, values: I) -> Condition
    where
        I: IntoIterator<Item = V>,
        V: Into<Scalar>,
    {
        Condition::is_in(self.0.clone(), values)
    }

    pub fn exists(&self) -> Condition {
        Condition::exists(self.0.clone())
    }

    pub fn missing(&self) -> Condition {
        Condition::missing(self.0.clone())
    }
}
