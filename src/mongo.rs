//! Mongo-syntax adapter.
//!
//! Translates a nested JSON mapping written with Mongo query operators into
//! the same [`Condition`] tree the builder API produces, so adapter output and
//! hand-built conditions combine freely.
//!
//! # Grammar
//!
//! ```text
//! query     := { entry, ... }                  entries are ANDed
//! entry     := "$and" : [query, ...]
//!            | "$or"  : [query, ...]
//!            | "$nor" : [query, ...]
//!            | "$not" : query
//!            | <field> : scalar                equality
//!            | <field> : { operator, ... }      operators are ANDed
//! operator  := "$eq" | "$ne" | "$gt" | "$gte" | "$lt" | "$lte" : scalar
//!            | "$in" | "$nin" : [scalar, ...]
//!            | "$exists" : bool
//!            | "$not" : { operator, ... }
//! ```
//!
//! # Examples
//!
//! ```
//! use oqr::{mongo, Condition};
//! use serde_json::json;
//!
//! let parsed = mongo::parse(&json!({"value": {"$gt": 2, "$lt": 4}})).unwrap();
//! let built = Condition::gt("value", 2) & Condition::lt("value", 4);
//! assert_eq!(parsed, built);
//! ```

use serde_json::{Map, Value};

use crate::{
    ast::{CompareOp, Condition, Node, Query, condition::is_valid_field_path},
    config::Config,
    error::MongoError,
    value::Scalar,
};

/// Parse a Mongo-style mapping with the default [`Config`].
pub fn parse(query: &Value) -> Result<Condition, MongoError> {
    parse_with(query, &Config::default())
}

/// Parse a Mongo-style mapping.
///
/// The mapping must contain at least one condition; see [`parse_query`] for
/// the form where an empty mapping means "match everything".
pub fn parse_with(query: &Value, config: &Config) -> Result<Condition, MongoError> {
    let map = expect_mapping(query, "query")?;
    let condition = MongoParser::new(config).parse_mapping(map, "query", 1)?;
    // `$nor` and `$not` add a negation on top of the level they occupy, so
    // the mapping depth can undercount the tree.
    let depth = condition.depth();
    tracing::trace!(depth, "parsed mongo query");
    if depth > config.max_depth {
        return Err(MongoError::DepthExceeded(config.max_depth));
    }
    Ok(condition)
}

/// Parse a Mongo-style mapping into a [`Query`]; `null` and `{}` yield a
/// query without a condition.
pub fn parse_query(query: &Value, config: &Config) -> Result<Query, MongoError> {
    match query {
        Value::Null => Ok(Query::match_all()),
        Value::Object(map) if map.is_empty() => Ok(Query::match_all()),
        other => parse_with(other, config).map(Query::from),
    }
}

impl TryFrom<&Value> for Condition {
    type Error = MongoError;

    fn try_from(query: &Value) -> Result<Self, Self::Error> {
        parse(query)
    }
}

/// Returns a human-readable type name for a JSON value
fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn expect_mapping<'v>(value: &'v Value, context: &str) -> Result<&'v Map<String, Value>, MongoError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(MongoError::NotAMapping {
            context: context.to_string(),
            found: json_type_name(other),
        }),
    }
}

/// Conjunction of the collected parts, or the single part itself.
fn conjoin(mut parts: Vec<Condition>) -> Condition {
    if parts.len() == 1 {
        parts.remove(0)
    } else {
        Node::And(parts).into()
    }
}

struct MongoParser<'c> {
    config: &'c Config,
}

impl<'c> MongoParser<'c> {
    fn new(config: &'c Config) -> Self {
        MongoParser { config }
    }

    fn check_depth(&self, depth: usize) -> Result<(), MongoError> {
        if depth > self.config.max_depth {
            return Err(MongoError::DepthExceeded(self.config.max_depth));
        }
        Ok(())
    }

    /// Top-level or nested query mapping: directives and fields, ANDed.
    fn parse_mapping(
        &self,
        map: &Map<String, Value>,
        context: &str,
        depth: usize,
    ) -> Result<Condition, MongoError> {
        self.check_depth(depth)?;
        if map.is_empty() {
            return Err(MongoError::EmptyMapping {
                context: context.to_string(),
            });
        }

        let mut parts = Vec::with_capacity(map.len());
        for (key, value) in map {
            let part = match key.as_str() {
                "$and" => Node::And(self.parse_logical(key, value, depth)?).into(),
                "$or" => Node::Or(self.parse_logical(key, value, depth)?).into(),
                "$nor" => !Condition::from(Node::Or(self.parse_logical(key, value, depth)?)),
                "$not" => {
                    let inner = expect_mapping(value, "'$not'")?;
                    !self.parse_mapping(inner, "'$not'", depth + 1)?
                }
                directive if directive.starts_with('$') => {
                    return Err(MongoError::UnknownDirective(directive.to_string()));
                }
                field => self.parse_field(field, value, depth)?,
            };
            parts.push(part);
        }

        Ok(conjoin(parts))
    }

    /// Elements of an `$and` / `$or` / `$nor` sequence.
    fn parse_logical(
        &self,
        key: &str,
        value: &Value,
        depth: usize,
    ) -> Result<Vec<Condition>, MongoError> {
        let items = match value {
            Value::Array(items) => items,
            _ => return Err(MongoError::LogicalShape(key.to_string())),
        };
        if items.is_empty() {
            return Err(MongoError::EmptyLogical(key.to_string()));
        }

        let context = format!("'{}'", key);
        items
            .iter()
            .map(|item| match item {
                Value::Object(map) => self.parse_mapping(map, &context, depth + 1),
                _ => Err(MongoError::LogicalShape(key.to_string())),
            })
            .collect()
    }

    fn parse_field(&self, field: &str, value: &Value, depth: usize) -> Result<Condition, MongoError> {
        if !is_valid_field_path(field) {
            return Err(MongoError::InvalidField(field.to_string()));
        }
        match value {
            Value::Object(ops) => self.parse_operators(field, ops, depth + 1),
            literal => Ok(Condition::eq(field, self.scalar(field, literal)?)),
        }
    }

    /// Operator mapping under one field; several operators are ANDed.
    fn parse_operators(
        &self,
        field: &str,
        ops: &Map<String, Value>,
        depth: usize,
    ) -> Result<Condition, MongoError> {
        self.check_depth(depth)?;
        if ops.is_empty() {
            return Err(MongoError::EmptyMapping {
                context: format!("field '{}'", field),
            });
        }

        let mut parts = Vec::with_capacity(ops.len());
        for (key, value) in ops {
            let part = if let Some(op) = CompareOp::from_mongo_key(key) {
                Condition::compare(field, op, self.scalar(field, value)?)
            } else {
                match key.as_str() {
                    "$in" => Condition::is_in(field, self.scalar_set(field, value)?),
                    "$nin" => !Condition::is_in(field, self.scalar_set(field, value)?),
                    "$exists" => match value {
                        Value::Bool(true) => Condition::exists(field),
                        Value::Bool(false) => Condition::missing(field),
                        _ => {
                            return Err(MongoError::ExistsShape {
                                field: field.to_string(),
                            });
                        }
                    },
                    "$not" => {
                        let context = format!("'$not' for field '{}'", field);
                        let inner = expect_mapping(value, &context)?;
                        !self.parse_operators(field, inner, depth + 1)?
                    }
                    _ => {
                        return Err(MongoError::UnknownOperator {
                            field: field.to_string(),
                            key: key.clone(),
                        });
                    }
                }
            };
            parts.push(part);
        }

        Ok(conjoin(parts))
    }

    fn scalar(&self, field: &str, value: &Value) -> Result<Scalar, MongoError> {
        Scalar::from_json(value).ok_or_else(|| MongoError::UnsupportedValue {
            field: field.to_string(),
            found: json_type_name(value),
        })
    }

    fn scalar_set(&self, field: &str, value: &Value) -> Result<Vec<Scalar>, MongoError> {
        let shape_error = || MongoError::InShape {
            field: field.to_string(),
        };
        match value {
            Value::Array(items) => items
                .iter()
                .map(|item| Scalar::from_json(item).ok_or_else(shape_error))
                .collect(),
            _ => Err(shape_error()),
        }
    }
}
