//! Weakness profiling from attempt history.
//!
//! Averages per-label percentages across recent history entries, keeps the
//! worst few labels per dimension and turns them into weight floors that
//! weakness mode merges into the blueprint with `max`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{Difficulty, Domain, QuestionType};
use crate::settings::Blueprint;
use crate::statistics::{BreakdownRow, HistoryEntry};

pub const DOMAIN_WEIGHT: f64 = 0.5;
pub const TYPE_WEIGHT: f64 = 0.4;
pub const DIFFICULTY_WEIGHT: f64 = 0.3;

pub const WORST_DOMAINS: usize = 3;
pub const WORST_TYPES: usize = 3;
pub const WORST_DIFFICULTIES: usize = 2;

/// Domain used when a domain label cannot be mapped back to an id.
pub const FALLBACK_DOMAIN: Domain = Domain::Calculations;

/// One boosted key and the weight floor applied to it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeakSpot<K> {
    pub id: K,
    pub weight: f64,
}

/// Ranked weak spots, worst first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeaknessProfile {
    pub domains: Vec<WeakSpot<Domain>>,
    #[serde(rename = "types")]
    pub question_types: Vec<WeakSpot<QuestionType>>,
    pub difficulties: Vec<WeakSpot<Difficulty>>,
}

impl WeaknessProfile {
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty() && self.question_types.is_empty() && self.difficulties.is_empty()
    }

    /// Raise blueprint weights to the profile's floors. Never lowers a weight.
    pub fn apply_to(&self, blueprint: &mut Blueprint) {
        raise(&mut blueprint.domain_weights, &self.domains);
        raise(&mut blueprint.type_mix, &self.question_types);
        raise(&mut blueprint.difficulty_mix, &self.difficulties);
    }
}

fn raise<K: Ord + Copy>(weights: &mut BTreeMap<K, f64>, spots: &[WeakSpot<K>]) {
    for spot in spots {
        let weight = weights.entry(spot.id).or_insert(0.0);
        *weight = weight.max(spot.weight);
    }
}

/// Build a profile from history, or `None` when there is no history.
pub fn compute_weakness_profile(history: &[HistoryEntry]) -> Option<WeaknessProfile> {
    if history.is_empty() {
        return None;
    }

    let domains = worst_labels(history.iter().map(|h| &h.domain_breakdown), WORST_DOMAINS)
        .into_iter()
        .map(|label| WeakSpot {
            id: Domain::from_name(&label).unwrap_or_else(|| {
                tracing::debug!(label, "unknown domain label, using fallback domain");
                FALLBACK_DOMAIN
            }),
            weight: DOMAIN_WEIGHT,
        })
        .collect();

    let question_types = worst_labels(history.iter().map(|h| &h.type_breakdown), WORST_TYPES)
        .into_iter()
        .filter_map(|label| label.parse::<QuestionType>().ok())
        .map(|id| WeakSpot {
            id,
            weight: TYPE_WEIGHT,
        })
        .collect();

    let difficulties = worst_labels(
        history.iter().map(|h| &h.difficulty_breakdown),
        WORST_DIFFICULTIES,
    )
    .into_iter()
    .filter_map(|label| label.parse::<Difficulty>().ok())
    .map(|id| WeakSpot {
        id,
        weight: DIFFICULTY_WEIGHT,
    })
    .collect();

    let profile = WeaknessProfile {
        domains,
        question_types,
        difficulties,
    };
    tracing::debug!(
        entries = history.len(),
        domains = profile.domains.len(),
        types = profile.question_types.len(),
        "weakness profile computed"
    );
    Some(profile)
}

/// Labels sorted by average percent ascending, ties in first-seen order.
fn worst_labels<'a>(
    breakdowns: impl Iterator<Item = &'a Vec<BreakdownRow>>,
    take: usize,
) -> Vec<String> {
    let mut scores: Vec<(String, u64, u64)> = Vec::new();
    for row in breakdowns.flatten() {
        match scores.iter_mut().find(|(label, _, _)| *label == row.label) {
            Some((_, sum, count)) => {
                *sum += u64::from(row.percent);
                *count += 1;
            }
            None => scores.push((row.label.clone(), u64::from(row.percent), 1)),
        }
    }

    let mut averages: Vec<(String, f64)> = scores
        .into_iter()
        .map(|(label, sum, count)| (label, sum as f64 / count as f64))
        .collect();
    averages.sort_by(|a, b| a.1.total_cmp(&b.1));
    averages.into_iter().take(take).map(|(label, _)| label).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Mode;
    use crate::statistics::AttemptSummary;
    use chrono::Utc;

    fn row(label: &str, percent: u32) -> BreakdownRow {
        BreakdownRow {
            label: label.into(),
            total: 10,
            correct: (percent / 10) as usize,
            percent,
        }
    }

    fn entry(domains: Vec<BreakdownRow>, types: Vec<BreakdownRow>, diffs: Vec<BreakdownRow>) -> HistoryEntry {
        HistoryEntry {
            summary: AttemptSummary {
                score_percent: 50,
                passed: false,
                total_earned: 5.0,
                question_count: 10,
                mode: Mode::Timed,
                seed: "s".into(),
                attempt_id: "a".into(),
                time_used: 100,
            },
            date: Utc::now(),
            domain_breakdown: domains,
            type_breakdown: types,
            difficulty_breakdown: diffs,
        }
    }

    #[test]
    fn empty_history_yields_nothing() {
        assert_eq!(compute_weakness_profile(&[]), None);
    }

    #[test]
    fn worst_labels_are_averaged_across_history() {
        let history = vec![
            entry(
                vec![
                    row("Compliance", 20),
                    row("Calculations", 90),
                    row("Payroll Fundamentals", 60),
                    row("Systems & Controls", 70),
                ],
                vec![row("numeric", 30), row("mcq", 80), row("msq", 50), row("fill", 100)],
                vec![row("hard", 10), row("easy", 90), row("medium", 50)],
            ),
            entry(
                vec![row("Compliance", 60), row("Calculations", 10)],
                vec![row("numeric", 70)],
                vec![row("hard", 30)],
            ),
        ];
        let profile = compute_weakness_profile(&history).unwrap();

        let domains: Vec<Domain> = profile.domains.iter().map(|s| s.id).collect();
        // Compliance 40, Calculations 50, Fundamentals 60
        assert_eq!(
            domains,
            [Domain::Compliance, Domain::Calculations, Domain::Fundamentals]
        );
        assert!(profile.domains.iter().all(|s| s.weight == DOMAIN_WEIGHT));

        let types: Vec<QuestionType> = profile.question_types.iter().map(|s| s.id).collect();
        assert_eq!(types, [QuestionType::Numeric, QuestionType::Msq, QuestionType::Mcq]);
        assert!(profile.question_types.iter().all(|s| s.weight == TYPE_WEIGHT));

        let diffs: Vec<Difficulty> = profile.difficulties.iter().map(|s| s.id).collect();
        assert_eq!(diffs, [Difficulty::Hard, Difficulty::Medium]);
        assert!(profile.difficulties.iter().all(|s| s.weight == DIFFICULTY_WEIGHT));
    }

    #[test]
    fn unknown_domain_label_falls_back() {
        let history = vec![entry(vec![row("Astrology", 0)], vec![], vec![])];
        let profile = compute_weakness_profile(&history).unwrap();
        assert_eq!(profile.domains[0].id, FALLBACK_DOMAIN);
    }

    #[test]
    fn merge_never_lowers_weights() {
        let profile = WeaknessProfile {
            domains: vec![
                WeakSpot { id: Domain::Calculations, weight: 0.5 },
                WeakSpot { id: Domain::Compliance, weight: 0.1 },
            ],
            question_types: vec![WeakSpot { id: QuestionType::Order, weight: 0.4 }],
            difficulties: vec![WeakSpot { id: Difficulty::Hard, weight: 0.3 }],
        };
        let before = Blueprint::default();
        let mut after = before.clone();
        profile.apply_to(&mut after);

        for domain in Domain::ALL {
            assert!(after.domain_weights[&domain] >= before.domain_weights[&domain]);
        }
        assert_eq!(after.domain_weights[&Domain::Calculations], 0.5);
        assert_eq!(after.domain_weights[&Domain::Compliance], 0.2);
        assert_eq!(after.type_mix[&QuestionType::Order], 0.4);
        assert_eq!(after.difficulty_mix[&Difficulty::Hard], 0.3);
    }

    #[test]
    fn profile_serializes_with_short_keys() {
        let profile = WeaknessProfile {
            domains: vec![WeakSpot { id: Domain::Compliance, weight: 0.5 }],
            question_types: vec![],
            difficulties: vec![],
        };
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["domains"][0]["id"], 3);
        assert!(json["types"].is_array());
    }
}
