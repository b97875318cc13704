//! Name Matching Abstractions
//!
//! Defines the NameScorer trait used by the reconciler, the threshold policy
//! and the candidate finder shared by reporting and mapping.

use crate::error::{ReconcileError, Result};
use crate::types::{Candidate, TeamName};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

pub mod sequence;

pub use sequence::sequence_ratio;

/// Pools at least this large are scored on the rayon pool.
const PARALLEL_POOL_MIN: usize = 256;

/// Confidence tier of a similarity score under the active thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MatchConfidence {
    None = 0,
    Review = 1,   // Accepted mapping, needs a human look
    High = 2,     // Safe to apply automatically
    VeryHigh = 3, // Highly recommended
}

impl MatchConfidence {
    pub fn from_score(score: f64, thresholds: &MatchThresholds) -> Self {
        if score > thresholds.highly_recommended {
            MatchConfidence::VeryHigh
        } else if score > thresholds.apply {
            MatchConfidence::High
        } else if score > thresholds.accept {
            MatchConfidence::Review
        } else {
            MatchConfidence::None
        }
    }

    pub fn is_auto_applicable(&self) -> bool {
        *self >= MatchConfidence::High
    }

    /// Action column of the recommended mappings report.
    pub fn action_label(&self) -> &'static str {
        match self {
            MatchConfidence::VeryHigh => "Highly Recommended",
            _ => "Review Recommended",
        }
    }
}

/// Score cut-offs used across one reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchThresholds {
    /// Minimum score for "maybe similar" suggestions in reports
    pub suggest: f64,
    /// Minimum score for a mapping candidate to be considered at all
    pub search: f64,
    /// A mapping is accepted only when its best candidate scores above this
    pub accept: f64,
    /// Mappings above this are applied automatically
    pub apply: f64,
    /// Mappings above this are flagged "Highly Recommended"
    pub highly_recommended: f64,
    /// Maximum suggestions kept per one-sided name
    pub suggestion_limit: usize,
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self {
            suggest: 0.5,
            search: 0.3,
            accept: 0.4,
            apply: 0.6,
            highly_recommended: 0.8,
            suggestion_limit: 5,
        }
    }
}

impl MatchThresholds {
    pub fn validate(&self) -> Result<()> {
        let named = [
            ("suggest", self.suggest),
            ("search", self.search),
            ("accept", self.accept),
            ("apply", self.apply),
            ("highly_recommended", self.highly_recommended),
        ];
        for (name, value) in named {
            if !(0.0..=1.0).contains(&value) {
                return Err(ReconcileError::InvalidThreshold {
                    name,
                    value,
                    reason: "must be within [0, 1]".to_string(),
                });
            }
        }

        let ordered = [
            ("accept", self.accept, "search", self.search),
            ("apply", self.apply, "accept", self.accept),
            ("highly_recommended", self.highly_recommended, "apply", self.apply),
        ];
        for (name, value, lower_name, lower) in ordered {
            if value < lower {
                return Err(ReconcileError::InvalidThreshold {
                    name,
                    value,
                    reason: format!("must not be below {lower_name} ({lower})"),
                });
            }
        }

        Ok(())
    }

    pub fn confidence(&self, score: f64) -> MatchConfidence {
        MatchConfidence::from_score(score, self)
    }
}

/// Pluggable string similarity.
///
/// Implementations must be pure: symmetric, 1.0 for identical input and
/// within [0, 1].
pub trait NameScorer: Send + Sync {
    fn score(&self, a: &str, b: &str) -> f64;

    /// Scorer name for logging and debugging
    fn scorer_name(&self) -> &str;
}

/// Default scorer: case-insensitive Ratcliff/Obershelp block ratio.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceRatio;

impl NameScorer for SequenceRatio {
    fn score(&self, a: &str, b: &str) -> f64 {
        sequence_ratio(a, b)
    }

    fn scorer_name(&self) -> &str {
        "SequenceRatio"
    }
}

/// Similarity of two names with the default scorer.
pub fn similarity(a: &str, b: &str) -> f64 {
    sequence_ratio(a, b)
}

/// Score `name` against every pool member and keep the best ones.
///
/// Candidates scoring at least `threshold` are sorted by descending score,
/// ties by ascending name key, then truncated to `limit` when one is given.
pub fn find_candidates<S: NameScorer + ?Sized>(
    scorer: &S,
    name: &str,
    pool: &[&TeamName],
    threshold: f64,
    limit: Option<usize>,
) -> Vec<Candidate> {
    let score_one = |candidate: &&TeamName| {
        let score = scorer.score(name, candidate.key());
        (score >= threshold).then(|| Candidate {
            name: (*candidate).clone(),
            score,
        })
    };

    let mut candidates: Vec<Candidate> = if pool.len() >= PARALLEL_POOL_MIN {
        pool.par_iter().filter_map(score_one).collect()
    } else {
        pool.iter().filter_map(score_one).collect()
    };

    candidates.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.name.cmp(&b.name))
    });

    if let Some(limit) = limit {
        candidates.truncate(limit);
    }

    candidates
}
