//! Learner settings and the exam blueprint.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{Difficulty, Domain, Mode, QuestionType};

/// Question count used when the blueprint has no entry for a mode.
pub const DEFAULT_QUESTION_COUNT: usize = 20;

/// Desired question counts and weight distributions for an attempt.
///
/// Weights need not sum to 1. The allocator floors `weight * total` per key
/// and settles the difference with seeded draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Blueprint {
    /// Number of questions per mode.
    pub question_count: BTreeMap<Mode, usize>,
    /// Time limit for time-limited modes.
    pub time_limit_minutes: u32,
    pub domain_weights: BTreeMap<Domain, f64>,
    pub difficulty_mix: BTreeMap<Difficulty, f64>,
    pub type_mix: BTreeMap<QuestionType, f64>,
}

impl Default for Blueprint {
    fn default() -> Self {
        Self {
            question_count: [
                (Mode::Timed, 30),
                (Mode::Study, 20),
                (Mode::Drills, 20),
                (Mode::Domain, 20),
                (Mode::Weakness, 20),
            ]
            .into_iter()
            .collect(),
            time_limit_minutes: 60,
            domain_weights: [
                (Domain::Fundamentals, 0.2),
                (Domain::Calculations, 0.35),
                (Domain::Compliance, 0.2),
                (Domain::SystemsControls, 0.15),
                (Domain::ReportingEthics, 0.1),
            ]
            .into_iter()
            .collect(),
            difficulty_mix: [
                (Difficulty::Easy, 0.4),
                (Difficulty::Medium, 0.4),
                (Difficulty::Hard, 0.2),
            ]
            .into_iter()
            .collect(),
            type_mix: [
                (QuestionType::Mcq, 0.35),
                (QuestionType::Msq, 0.15),
                (QuestionType::Numeric, 0.3),
                (QuestionType::Fill, 0.05),
                (QuestionType::Order, 0.05),
                (QuestionType::Match, 0.05),
                (QuestionType::MultiNumeric, 0.05),
            ]
            .into_iter()
            .collect(),
        }
    }
}

impl Blueprint {
    /// Number of questions an attempt in `mode` should contain.
    pub fn questions_for(&self, mode: Mode) -> usize {
        self.question_count
            .get(&mode)
            .copied()
            .unwrap_or(DEFAULT_QUESTION_COUNT)
    }

    /// Time limit in seconds.
    pub fn time_limit_seconds(&self) -> u64 {
        u64::from(self.time_limit_minutes) * 60
    }
}

/// Type mix that replaces the blueprint's in drill mode: numeric work
/// (single and multi-part) makes up 80%.
pub fn drill_type_mix() -> BTreeMap<QuestionType, f64> {
    [
        (QuestionType::Numeric, 0.6),
        (QuestionType::MultiNumeric, 0.2),
        (QuestionType::Mcq, 0.1),
        (QuestionType::Msq, 0.05),
        (QuestionType::Fill, 0.05),
        (QuestionType::Order, 0.0),
        (QuestionType::Match, 0.0),
    ]
    .into_iter()
    .collect()
}

/// Learner settings. Missing fields fall back to their defaults, so a
/// partially written settings value still loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Mode preselected for the next attempt.
    pub mode: Mode,
    /// Content packs drawn from.
    pub enabled_packs: Vec<String>,
    /// Also offer `fun_only` entries.
    pub fun_mode: bool,
    /// Award partial credit on msq, order and multi-part numeric questions.
    pub partial_credit: bool,
    pub blueprint: Blueprint,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: Mode::Timed,
            enabled_packs: vec!["core".to_string()],
            fun_mode: false,
            partial_credit: false,
            blueprint: Blueprint::default(),
        }
    }
}
