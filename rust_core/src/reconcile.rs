//! Set reconciliation and greedy name mapping.
//!
//! This module provides:
//! - Exact / left-only / right-only partition of two name sets
//! - "Maybe similar" suggestions for every one-sided name
//! - Greedy injective left -> right mapping with confidence ranking

use crate::error::{ReconcileError, Result};
use crate::matching::{find_candidates, MatchThresholds, NameScorer, SequenceRatio};
use crate::types::{Candidate, NameMapping, NameSet, TeamName};
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Suggestions keyed by the one-sided name they were computed for.
pub type Suggestions = BTreeMap<TeamName, Vec<Candidate>>;

/// Exact / one-sided split of two name sets plus report suggestions.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Partition {
    pub exact: NameSet,
    pub left_only: NameSet,
    pub right_only: NameSet,
    /// Right-side candidates for each left-only name
    pub left_suggestions: Suggestions,
    /// Left-side candidates for each right-only name
    pub right_suggestions: Suggestions,
}

/// Everything one analysis run produces.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationResult {
    pub left_total: usize,
    pub right_total: usize,
    pub exact: NameSet,
    pub left_only: NameSet,
    pub right_only: NameSet,
    pub left_suggestions: Suggestions,
    pub right_suggestions: Suggestions,
    /// Accepted mappings, highest confidence first
    pub mappings: Vec<NameMapping>,
    /// Mappings eligible for automatic application
    pub high_confidence: Vec<NameMapping>,
    pub thresholds: MatchThresholds,
}

impl ReconciliationResult {
    /// Share of left names that matched exactly, in percent.
    pub fn match_percentage(&self) -> f64 {
        self.exact.len() as f64 / self.left_total.max(1) as f64 * 100.0
    }

    /// Mappings accepted but left for manual review.
    pub fn review_mappings(&self) -> impl Iterator<Item = &NameMapping> + '_ {
        self.mappings
            .iter()
            .filter(|m| !self.thresholds.confidence(m.confidence).is_auto_applicable())
    }

    /// Left-only names the mapper could not resolve.
    pub fn unresolved(&self) -> Vec<&TeamName> {
        let mapped: FxHashSet<&TeamName> = self.mappings.iter().map(|m| &m.source).collect();
        self.left_only.iter().filter(|n| !mapped.contains(n)).collect()
    }
}

/// Reconciliation engine parameterized by its similarity scorer.
pub struct NameReconciler<S: NameScorer = SequenceRatio> {
    scorer: S,
    thresholds: MatchThresholds,
}

impl NameReconciler<SequenceRatio> {
    pub fn new(thresholds: MatchThresholds) -> Result<Self> {
        Self::with_scorer(SequenceRatio, thresholds)
    }
}

impl Default for NameReconciler<SequenceRatio> {
    fn default() -> Self {
        Self {
            scorer: SequenceRatio,
            thresholds: MatchThresholds::default(),
        }
    }
}

impl<S: NameScorer> NameReconciler<S> {
    pub fn with_scorer(scorer: S, thresholds: MatchThresholds) -> Result<Self> {
        thresholds.validate()?;
        Ok(Self { scorer, thresholds })
    }

    pub fn thresholds(&self) -> &MatchThresholds {
        &self.thresholds
    }

    pub fn scorer(&self) -> &S {
        &self.scorer
    }

    /// Top candidates for `name` from `pool` at the given threshold.
    pub fn find_candidates(
        &self,
        name: &TeamName,
        pool: &NameSet,
        threshold: f64,
        limit: Option<usize>,
    ) -> Vec<Candidate> {
        let pool: Vec<&TeamName> = pool.iter().collect();
        find_candidates(&self.scorer, name.key(), &pool, threshold, limit)
    }

    /// Report suggestions for `name` from the opposite full set.
    pub fn suggestions(&self, name: &TeamName, pool: &NameSet) -> Vec<Candidate> {
        self.find_candidates(
            name,
            pool,
            self.thresholds.suggest,
            Some(self.thresholds.suggestion_limit),
        )
    }

    /// Split two sets into exact / left-only / right-only.
    pub fn reconcile(&self, left: &NameSet, right: &NameSet) -> Partition {
        let exact = left.intersection(right);
        let left_only = left.difference(right);
        let right_only = right.difference(left);

        let left_suggestions = left_only
            .iter()
            .map(|name| (name.clone(), self.suggestions(name, right)))
            .collect();
        let right_suggestions = right_only
            .iter()
            .map(|name| (name.clone(), self.suggestions(name, left)))
            .collect();

        Partition {
            exact,
            left_only,
            right_only,
            left_suggestions,
            right_suggestions,
        }
    }

    /// Greedy injective mapping of left-only names onto right-only names.
    ///
    /// Left names are visited in key order; each takes its best remaining
    /// right name if that scores above the accept threshold. A right name
    /// is used at most once. The result is sorted by confidence, highest
    /// first, keeping visit order among equal scores.
    pub fn map(&self, left_only: &NameSet, right_only: &NameSet) -> Vec<NameMapping> {
        let mut consumed: FxHashSet<TeamName> = FxHashSet::default();
        let mut mappings = Vec::new();

        for source in left_only {
            let available: Vec<&TeamName> =
                right_only.iter().filter(|r| !consumed.contains(*r)).collect();

            let best = find_candidates(
                &self.scorer,
                source.key(),
                &available,
                self.thresholds.search,
                None,
            )
            .into_iter()
            .next();

            match best {
                Some(best) if best.score > self.thresholds.accept => {
                    debug!(
                        "Mapped '{}' -> '{}' (confidence: {:.2})",
                        source, best.name, best.score
                    );
                    consumed.insert(best.name.clone());
                    mappings.push(NameMapping {
                        source: source.clone(),
                        target: best.name,
                        confidence: best.score,
                    });
                }
                Some(best) => {
                    debug!(
                        "Best candidate for '{}' is '{}' at {:.2}, below accept threshold",
                        source, best.name, best.score
                    );
                }
                None => debug!("No mapping candidates for '{}'", source),
            }
        }

        mappings.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        mappings
    }

    /// Entries strictly above the apply threshold.
    pub fn high_confidence(&self, mappings: &[NameMapping]) -> Vec<NameMapping> {
        mappings
            .iter()
            .filter(|m| m.confidence > self.thresholds.apply)
            .cloned()
            .collect()
    }

    /// Full analysis: partition, suggestions, mapping and high-confidence subset.
    pub fn run(&self, left: &NameSet, right: &NameSet) -> ReconciliationResult {
        let partition = self.reconcile(left, right);
        let mappings = self.map(&partition.left_only, &partition.right_only);
        let high_confidence = self.high_confidence(&mappings);

        debug!(
            "Reconciled with {}: {} exact, {} mapped, {} high confidence",
            self.scorer.scorer_name(),
            partition.exact.len(),
            mappings.len(),
            high_confidence.len()
        );

        ReconciliationResult {
            left_total: left.len(),
            right_total: right.len(),
            exact: partition.exact,
            left_only: partition.left_only,
            right_only: partition.right_only,
            left_suggestions: partition.left_suggestions,
            right_suggestions: partition.right_suggestions,
            mappings,
            high_confidence,
            thresholds: self.thresholds,
        }
    }
}

/// Refuse to reconcile when a side has nothing to offer.
pub fn ensure_usable(
    left: &NameSet,
    right: &NameSet,
    left_label: &str,
    right_label: &str,
) -> Result<()> {
    match (left.is_empty(), right.is_empty()) {
        (true, true) => Err(ReconcileError::NoUsableInput),
        (true, false) => Err(ReconcileError::EmptySide {
            side: left_label.to_string(),
        }),
        (false, true) => Err(ReconcileError::EmptySide {
            side: right_label.to_string(),
        }),
        (false, false) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(raw: &[&str]) -> NameSet {
        raw.iter().copied().collect()
    }

    fn engine() -> NameReconciler {
        NameReconciler::default()
    }

    #[test]
    fn test_reconcile_partition() {
        let engine = engine();
        let left = set(&["Arsenal", "Man City", "Wolves"]);
        let right = set(&["Arsenal", "Manchester City", "Chelsea"]);

        let p = engine.reconcile(&left, &right);
        assert_eq!(p.exact, set(&["Arsenal"]));
        assert_eq!(p.left_only, set(&["Man City", "Wolves"]));
        assert_eq!(p.right_only, set(&["Manchester City", "Chelsea"]));
        assert_eq!(p.left_suggestions.len(), 2);
        assert_eq!(p.right_suggestions.len(), 2);
    }

    #[test]
    fn test_suggestions_use_full_opposite_set() {
        let engine = engine();
        let left = set(&["Leeds", "Arsenal"]);
        let right = set(&["Leeds United", "Arsenal"]);

        let p = engine.reconcile(&left, &right);
        let leeds = TeamName::new("Leeds").unwrap();
        let suggestions = &p.left_suggestions[&leeds];
        assert_eq!(suggestions[0].name.as_str(), "Leeds United");
        assert!(suggestions.iter().all(|c| c.score >= 0.5));
    }

    #[test]
    fn test_map_scenario() {
        let engine = engine();
        let mappings = engine.map(
            &set(&["Man City", "Wolves"]),
            &set(&["Manchester City", "Wolverhampton"]),
        );

        assert_eq!(mappings.len(), 2);
        assert_eq!(mappings[0].source.as_str(), "Man City");
        assert_eq!(mappings[0].target.as_str(), "Manchester City");
        assert!((mappings[0].confidence - 16.0 / 23.0).abs() < 1e-9);
        assert_eq!(mappings[1].source.as_str(), "Wolves");
        assert_eq!(mappings[1].target.as_str(), "Wolverhampton");
        assert!((mappings[1].confidence - 10.0 / 19.0).abs() < 1e-9);

        let high = engine.high_confidence(&mappings);
        assert_eq!(high.len(), 1);
        assert_eq!(high[0].source.as_str(), "Man City");
    }

    #[test]
    fn test_map_greedy_exclusion() {
        // "leeds" (first in key order) takes "Leeds United"; "leeds utd"
        // must settle for what is left or nothing
        let engine = engine();
        let mappings = engine.map(&set(&["Leeds", "Leeds Utd"]), &set(&["Leeds United"]));

        assert_eq!(mappings.len(), 1);
        assert_eq!(mappings[0].source.as_str(), "Leeds");
        assert_eq!(mappings[0].target.as_str(), "Leeds United");
    }

    #[test]
    fn test_map_rejects_weak_candidates() {
        let engine = engine();
        let mappings = engine.map(&set(&["Barcelona"]), &set(&["Tottenham"]));
        assert!(mappings.is_empty());
    }

    #[test]
    fn test_map_score_at_accept_threshold_rejected() {
        // "a" / "abcd": 2 * 1 / 5 == 0.4 exactly
        let engine = engine();
        let mappings = engine.map(&set(&["a"]), &set(&["abcd"]));
        assert!(mappings.is_empty());
    }

    #[test]
    fn test_score_at_apply_threshold_needs_review() {
        // "abc" / "abcdefg": 2 * 3 / 10 == 0.6 exactly
        let engine = engine();
        let mappings = engine.map(&set(&["abc"]), &set(&["abcdefg"]));

        assert_eq!(mappings.len(), 1);
        assert_eq!(mappings[0].confidence, 0.6);
        assert!(engine.high_confidence(&mappings).is_empty());
    }

    #[test]
    fn test_run_identical_sets() {
        let engine = engine();
        let names = set(&["Arsenal"]);
        let result = engine.run(&names, &names);

        assert_eq!(result.exact, names);
        assert!(result.left_only.is_empty());
        assert!(result.right_only.is_empty());
        assert!(result.mappings.is_empty());
        assert_eq!(result.match_percentage(), 100.0);
    }

    #[test]
    fn test_run_empty_left() {
        let engine = engine();
        let right = set(&["Arsenal", "Chelsea"]);
        let result = engine.run(&NameSet::new(), &right);

        assert!(result.exact.is_empty());
        assert!(result.left_only.is_empty());
        assert_eq!(result.right_only, right);
        assert!(result.mappings.is_empty());
        assert_eq!(result.match_percentage(), 0.0);
    }

    #[test]
    fn test_review_and_unresolved() {
        let engine = engine();
        let result = engine.run(
            &set(&["Man City", "Wolves", "Barcelona"]),
            &set(&["Manchester City", "Wolverhampton"]),
        );

        let review: Vec<&str> = result.review_mappings().map(|m| m.source.as_str()).collect();
        assert_eq!(review, vec!["Wolves"]);

        let unresolved: Vec<&str> = result.unresolved().iter().map(|n| n.as_str()).collect();
        assert_eq!(unresolved, vec!["Barcelona"]);
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        let thresholds = MatchThresholds {
            search: 0.9,
            ..Default::default()
        };
        assert!(NameReconciler::new(thresholds).is_err());
    }

    #[test]
    fn test_ensure_usable() {
        let some = set(&["Arsenal"]);
        let none = NameSet::new();

        assert!(ensure_usable(&some, &some, "fixture", "league").is_ok());
        assert!(matches!(
            ensure_usable(&none, &none, "fixture", "league"),
            Err(ReconcileError::NoUsableInput)
        ));
        assert!(matches!(
            ensure_usable(&none, &some, "fixture", "league"),
            Err(ReconcileError::EmptySide { side }) if side == "fixture"
        ));
        assert!(matches!(
            ensure_usable(&some, &none, "fixture", "league"),
            Err(ReconcileError::EmptySide { side }) if side == "league"
        ));
    }
}
