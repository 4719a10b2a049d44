use crate::ast::{Condition, Limit, Score};

/// Complete search request.
///
/// The three channels are independent: the condition filters records, the
/// limit caps how many come back, the score orders them. An absent
/// condition matches every record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    /// Boolean filter (match-all if None)
    pub condition: Option<Condition>,

    /// Optional result-count cap
    pub limit: Option<Limit>,

    /// Optional scoring attachment
    pub score: Option<Score>,
}

impl Query {
    /// Query matching every record, with no modifiers.
    pub fn match_all() -> Self {
        Query::default()
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn with_limit(mut self, limit: Limit) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_score(mut self, score: Score) -> Self {
        self.score = Some(score);
        self
    }
}

impl From<Condition> for Query {
    fn from(condition: Condition) -> Self {
        Query::match_all().with_condition(condition)
    }
}

impl From<Limit> for Query {
    fn from(limit: Limit) -> Self {
        Query::match_all().with_limit(limit)
    }
}

impl From<Score> for Query {
    fn from(score: Score) -> Self {
        Query::match_all().with_score(score)
    }
}
