/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// Equal (`==`)
    Eq,
    /// Not equal (`!=`)
    Ne,
    /// Greater than (`>`)
    Gt,
    /// Greater than or equal (`>=`)
    Ge,
    /// Less than (`<`)
    Lt,
    /// Less than or equal (`<=`)
    Le,
}

impl CompareOp {
    /// Symbol used in canonical strings.
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
        }
    }

    /// Bound keyword inside a `range` clause, `None` for `Eq`/`Ne`.
    pub fn range_keyword(self) -> Option<&'static str> {
        match self {
            CompareOp::Gt => Some("gt"),
            CompareOp::Ge => Some("gte"),
            CompareOp::Lt => Some("lt"),
            CompareOp::Le => Some("lte"),
            CompareOp::Eq | CompareOp::Ne => None,
        }
    }

    /// Inverse of [`CompareOp::range_keyword`].
    pub fn from_range_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "gt" => Some(CompareOp::Gt),
            "gte" => Some(CompareOp::Ge),
            "lt" => Some(CompareOp::Lt),
            "lte" => Some(CompareOp::Le),
            _ => None,
        }
    }

    /// Mongo operator key (`$eq`, `$gt`, ...).
    pub fn from_mongo_key(key: &str) -> Option<Self> {
        match key {
            "$eq" => Some(CompareOp::Eq),
            "$ne" => Some(CompareOp::Ne),
            "$gt" => Some(CompareOp::Gt),
            "$gte" => Some(CompareOp::Ge),
            "$lt" => Some(CompareOp::Lt),
            "$lte" => Some(CompareOp::Le),
            _ => None,
        }
    }
}
