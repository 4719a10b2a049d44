use std::ops::{BitAnd, BitOr};

use crate::error::ConstructionError;

/// Upper bound on the number of returned records.
///
/// Conjunction keeps the tighter bound, disjunction the looser one.
///
/// # Examples
///
/// ```
/// use oqr::Limit;
///
/// let five = Limit::new(5).unwrap();
/// let ten = Limit::new(10).unwrap();
/// assert_eq!(five & ten, five);
/// assert_eq!(five | ten, ten);
/// assert!(Limit::new(-1).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Limit(u64);

impl Limit {
    pub fn new(n: i64) -> Result<Self, ConstructionError> {
        u64::try_from(n)
            .map(Limit)
            .map_err(|_| ConstructionError::NegativeLimit(n))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u32> for Limit {
    fn from(n: u32) -> Self {
        Limit(n.into())
    }
}

impl BitAnd for Limit {
    type Output = Limit;

    fn bitand(self, rhs: Limit) -> Limit {
        Limit(self.0.min(rhs.0))
    }
}

impl BitOr for Limit {
    type Output = Limit;

    fn bitor(self, rhs: Limit) -> Limit {
        Limit(self.0.max(rhs.0))
    }
}

/// `score_mode` written into a compiled `function_score` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreMode {
    Sum,
    Multiply,
    Max,
}

impl ScoreMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ScoreMode::Sum => "sum",
            ScoreMode::Multiply => "multiply",
            ScoreMode::Max => "max",
        }
    }

    /// Modes allowed for AND-combined scores.
    pub fn parse_all_mode(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sum" => Some(ScoreMode::Sum),
            "multiply" => Some(ScoreMode::Multiply),
            _ => None,
        }
    }
}

/// How the scripts of a [`Score`] were combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreCombine {
    /// AND-combined: every script contributes
    All,
    /// OR-combined: the best script wins
    Best,
}

/// One engine-native scoring script.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    pub source: String,
    pub params: serde_json::Map<String, serde_json::Value>,
}

/// Scoring attachment: one or more scripts plus how they combine.
///
/// A single-script score has no combination yet; the first `&` or `|`
/// fixes it, and mixing the two afterwards is rejected.
///
/// # Examples
///
/// ```
/// use oqr::{Score, ScoreCombine};
///
/// let by_value = Score::script("doc['value'].value * 0.1");
/// let bonus = Score::script("doc['value'].value > 100 ? 2 : 1");
/// let both = by_value.and(&bonus).unwrap();
/// assert_eq!(both.combine(), Some(ScoreCombine::All));
/// assert!(both.or(&bonus).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    scripts: Vec<Script>,
    combine: Option<ScoreCombine>,
}

impl Score {
    pub fn script(source: impl Into<String>) -> Self {
        Self::with_params(source, serde_json::Map::new())
    }

    pub fn with_params(
        source: impl Into<String>,
        params: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        Score {
            scripts: vec![Script {
                source: source.into(),
                params,
            }],
            combine: None,
        }
    }

    pub fn scripts(&self) -> &[Script] {
        &self.scripts
    }

    pub fn combine(&self) -> Option<ScoreCombine> {
        self.combine
    }

    /// Both scores contribute.
    pub fn and(&self, other: &Score) -> Result<Score, ConstructionError> {
        self.merge(other, ScoreCombine::All)
    }

    /// The higher score wins.
    pub fn or(&self, other: &Score) -> Result<Score, ConstructionError> {
        self.merge(other, ScoreCombine::Best)
    }

    fn merge(&self, other: &Score, combine: ScoreCombine) -> Result<Score, ConstructionError> {
        let compatible = |c: Option<ScoreCombine>| c.is_none_or(|c| c == combine);
        if !compatible(self.combine) || !compatible(other.combine) {
            return Err(ConstructionError::MixedScoreModes);
        }
        let mut scripts = self.scripts.clone();
        scripts.extend(other.scripts.iter().cloned());
        Ok(Score {
            scripts,
            combine: Some(combine),
        })
    }

    /// Pin the combination mode, including on a single script read back
    /// from a document.
    pub(crate) fn with_combine(mut self, combine: ScoreCombine) -> Self {
        self.combine = Some(combine);
        self
    }

    /// `score_mode` for compilation, given the arithmetic chosen for
    /// AND-combined scores.
    pub fn mode(&self, all_mode: ScoreMode) -> ScoreMode {
        match self.combine {
            Some(ScoreCombine::Best) => ScoreMode::Max,
            Some(ScoreCombine::All) | None => all_mode,
        }
    }
}
