//! Response scoring.
//!
//! [`score_question`] is a pure function of a hydrated question and a raw
//! JSON response. Responses of the wrong shape score zero instead of
//! failing.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{Question, QuestionBody};

/// Outcome of scoring one response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Fully correct.
    pub correct: bool,
    /// Credit earned, always within `[0, 1]`.
    pub earned: f64,
}

impl ScoreResult {
    pub fn new(correct: bool, earned: f64) -> Self {
        let earned = if earned.is_finite() {
            earned.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self { correct, earned }
    }

    /// All-or-nothing result.
    pub fn binary(correct: bool) -> Self {
        Self::new(correct, if correct { 1.0 } else { 0.0 })
    }

    pub fn zero() -> Self {
        Self::binary(false)
    }
}

/// Scoring switches taken from the learner's settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreOptions {
    pub partial_credit: bool,
}

/// Score a response against a question.
pub fn score_question(question: &Question, response: &Value, options: ScoreOptions) -> ScoreResult {
    match &question.body {
        QuestionBody::SingleChoice { answer, .. } => {
            ScoreResult::binary(as_index(response) == Some(*answer))
        }
        QuestionBody::MultiChoice { answer, .. } => {
            score_multi_choice(response, answer, options.partial_credit)
        }
        QuestionBody::Numeric {
            answer,
            tolerance,
            relative_tolerance,
        } => ScoreResult::binary(
            as_number(response)
                .is_some_and(|n| within(n, *answer, *tolerance, *relative_tolerance)),
        ),
        QuestionBody::FreeText { answer, acceptable } => {
            ScoreResult::binary(score_free_text(response, answer, acceptable))
        }
        QuestionBody::Ordering { correct_order, .. } => {
            score_positions(response, correct_order, options.partial_credit)
        }
        QuestionBody::Matching { answer, .. } => score_positions(response, answer, false),
        QuestionBody::MultiNumeric { answer, tolerance } => {
            score_multi_numeric(response, answer, *tolerance, options.partial_credit)
        }
        QuestionBody::Unscorable { .. } => ScoreResult::zero(),
    }
}

/// Trim, lowercase and collapse whitespace runs to one space.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn score_multi_choice(response: &Value, answer: &[usize], partial_credit: bool) -> ScoreResult {
    let Some(items) = response.as_array() else {
        return ScoreResult::zero();
    };

    let expected: BTreeSet<usize> = answer.iter().copied().collect();
    let mut selected = BTreeSet::new();
    let mut invalid = BTreeSet::new();
    for item in items {
        match as_index(item) {
            Some(i) => {
                selected.insert(i);
            }
            None => {
                invalid.insert(item.to_string());
            }
        }
    }

    let correct = invalid.is_empty() && selected == expected;
    if !partial_credit {
        return ScoreResult::binary(correct);
    }
    if expected.is_empty() {
        return ScoreResult::binary(correct);
    }

    let hits = selected.intersection(&expected).count();
    let misses = selected.difference(&expected).count() + invalid.len();
    let raw = hits.saturating_sub(misses);
    ScoreResult::new(correct, raw as f64 / expected.len() as f64)
}

/// Position-for-position comparison used by ordering and matching.
fn score_positions(response: &Value, expected: &[usize], partial_credit: bool) -> ScoreResult {
    let Some(items) = response.as_array() else {
        return ScoreResult::zero();
    };

    let matches = items
        .iter()
        .zip(expected)
        .filter(|(item, want)| as_index(item) == Some(**want))
        .count();
    let correct = items.len() == expected.len() && matches == expected.len();

    if !partial_credit || expected.is_empty() {
        return ScoreResult::binary(correct);
    }
    ScoreResult::new(correct, matches as f64 / expected.len() as f64)
}

fn score_multi_numeric(
    response: &Value,
    answer: &[f64],
    tolerance: f64,
    partial_credit: bool,
) -> ScoreResult {
    let Some(items) = response.as_array() else {
        return ScoreResult::zero();
    };

    let passing = items
        .iter()
        .zip(answer)
        .filter(|(item, want)| as_number(item).is_some_and(|n| within(n, **want, tolerance, None)))
        .count();
    let correct = items.len() == answer.len() && passing == answer.len();

    if !partial_credit || answer.is_empty() {
        return ScoreResult::binary(correct);
    }
    ScoreResult::new(correct, passing as f64 / answer.len() as f64)
}

fn score_free_text(response: &Value, answer: &str, acceptable: &[Vec<String>]) -> bool {
    let given = match response {
        Value::String(s) => normalize_text(s),
        Value::Number(n) => n.to_string(),
        _ => return false,
    };
    if given.is_empty() {
        return false;
    }
    std::iter::once(answer)
        .chain(acceptable.iter().flatten().map(String::as_str))
        .any(|candidate| normalize_text(candidate) == given)
}

/// Relative tolerance, when present, takes precedence over absolute.
fn within(value: f64, answer: f64, tolerance: f64, relative_tolerance: Option<f64>) -> bool {
    let diff = (value - answer).abs();
    match relative_tolerance {
        Some(rel) => diff <= answer.abs() * rel,
        None => diff <= tolerance,
    }
}

/// A choice index: a non-negative integer, or a float with no fraction.
fn as_index(value: &Value) -> Option<usize> {
    if let Some(i) = value.as_u64() {
        return usize::try_from(i).ok();
    }
    value
        .as_f64()
        .filter(|f| *f >= 0.0 && f.fract() == 0.0)
        .map(|f| f as usize)
}

/// A numeric response: a JSON number or a string that parses as one.
/// Empty strings and other shapes are non-numeric.
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}
