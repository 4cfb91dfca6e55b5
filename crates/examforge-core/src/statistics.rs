//! Attempt scoring and aggregate statistics.
//!
//! Turns a finished [`Attempt`] into a summary, per-question detail and
//! breakdowns by domain, type, difficulty and time band. History entries
//! keep the summary plus the breakdowns the weakness profiler reads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::attempt::Attempt;
use crate::model::{Mode, Question};
use crate::scoring::{score_question, ScoreOptions};

/// Default pass mark, in percent.
pub const DEFAULT_PASS_THRESHOLD: u32 = 70;

/// Number of history entries kept by default.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Headline numbers for one scored attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptSummary {
    /// `round(total_earned / question_count * 100)`.
    pub score_percent: u32,
    pub passed: bool,
    pub total_earned: f64,
    pub question_count: usize,
    pub mode: Mode,
    pub seed: String,
    pub attempt_id: String,
    /// Elapsed seconds at submission.
    pub time_used: u64,
}

/// Scoring outcome of a single question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredQuestion {
    pub question: Question,
    #[serde(default)]
    pub response: Option<Value>,
    pub correct: bool,
    pub earned: f64,
    pub time_spent: u64,
    pub flagged: bool,
}

/// One row of a breakdown table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakdownRow {
    pub label: String,
    pub total: usize,
    pub correct: usize,
    /// Rounded percentage of fully correct questions; 0 for empty rows.
    pub percent: u32,
}

impl BreakdownRow {
    fn new(label: impl Into<String>, total: usize, correct: usize) -> Self {
        Self {
            label: label.into(),
            total,
            correct,
            percent: percent(correct as f64, total),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakdowns {
    pub domain: Vec<BreakdownRow>,
    #[serde(rename = "type")]
    pub question_type: Vec<BreakdownRow>,
    pub difficulty: Vec<BreakdownRow>,
    pub time: Vec<BreakdownRow>,
}

/// Full result of submitting an attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredAttempt {
    pub summary: AttemptSummary,
    pub detail: Vec<ScoredQuestion>,
    pub breakdowns: Breakdowns,
}

/// Score every question of an attempt.
pub fn score_attempt(attempt: &Attempt, options: ScoreOptions, pass_threshold: u32) -> ScoredAttempt {
    let detail: Vec<ScoredQuestion> = attempt
        .questions
        .iter()
        .map(|question| {
            let response = attempt.responses.get(&question.id).cloned();
            let result = score_question(question, response.as_ref().unwrap_or(&Value::Null), options);
            ScoredQuestion {
                question: question.clone(),
                response,
                correct: result.correct,
                earned: result.earned,
                time_spent: attempt.time_spent.get(&question.id).copied().unwrap_or(0),
                flagged: attempt.is_flagged(&question.id),
            }
        })
        .collect();

    let total_earned: f64 = detail.iter().map(|d| d.earned).sum();
    let score_percent = percent(total_earned, detail.len());

    let summary = AttemptSummary {
        score_percent,
        passed: score_percent >= pass_threshold,
        total_earned,
        question_count: detail.len(),
        mode: attempt.mode,
        seed: attempt.seed.clone(),
        attempt_id: attempt.id.clone(),
        time_used: attempt.elapsed_seconds,
    };

    let breakdowns = Breakdowns {
        domain: breakdown(&detail, |q| q.domain_name.clone()),
        question_type: breakdown(&detail, |q| q.body.type_label()),
        difficulty: breakdown(&detail, |q| q.difficulty.to_string()),
        time: time_breakdown(&detail),
    };

    tracing::debug!(
        attempt_id = %attempt.id,
        score_percent,
        questions = detail.len(),
        "attempt scored"
    );

    ScoredAttempt {
        summary,
        detail,
        breakdowns,
    }
}

/// Group questions by label in order of first appearance.
fn breakdown(detail: &[ScoredQuestion], label_of: impl Fn(&Question) -> String) -> Vec<BreakdownRow> {
    let mut rows: Vec<(String, usize, usize)> = Vec::new();
    for d in detail {
        let label = label_of(&d.question);
        let label = if label.is_empty() { "Unknown".to_string() } else { label };
        match rows.iter_mut().find(|(l, _, _)| *l == label) {
            Some((_, total, correct)) => {
                *total += 1;
                *correct += usize::from(d.correct);
            }
            None => rows.push((label, 1, usize::from(d.correct))),
        }
    }
    rows.into_iter()
        .map(|(label, total, correct)| BreakdownRow::new(label, total, correct))
        .collect()
}

/// Fixed bands: under 20 seconds, 20 to 60 inclusive, over 60.
fn time_breakdown(detail: &[ScoredQuestion]) -> Vec<BreakdownRow> {
    let bands: [(&str, fn(u64) -> bool); 3] = [
        ("<20s", |t| t < 20),
        ("20-60s", |t| (20..=60).contains(&t)),
        (">60s", |t| t > 60),
    ];
    bands
        .into_iter()
        .map(|(label, in_band)| {
            let members = detail.iter().filter(|d| in_band(d.time_spent));
            let (total, correct) = members.fold((0, 0), |(t, c), d| (t + 1, c + usize::from(d.correct)));
            BreakdownRow::new(label, total, correct)
        })
        .collect()
}

fn percent(part: f64, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (part / total as f64 * 100.0).round().clamp(0.0, 100.0) as u32
}

/// A past attempt as kept in history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub summary: AttemptSummary,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub domain_breakdown: Vec<BreakdownRow>,
    #[serde(default)]
    pub type_breakdown: Vec<BreakdownRow>,
    #[serde(default)]
    pub difficulty_breakdown: Vec<BreakdownRow>,
}

impl HistoryEntry {
    pub fn from_scored(scored: &ScoredAttempt, date: DateTime<Utc>) -> Self {
        Self {
            summary: scored.summary.clone(),
            date,
            domain_breakdown: scored.breakdowns.domain.clone(),
            type_breakdown: scored.breakdowns.question_type.clone(),
            difficulty_breakdown: scored.breakdowns.difficulty.clone(),
        }
    }
}

/// Prepend an entry, keeping at most `limit` entries, most recent first.
pub fn push_history(history: &mut Vec<HistoryEntry>, entry: HistoryEntry, limit: usize) {
    history.insert(0, entry);
    history.truncate(limit);
}
