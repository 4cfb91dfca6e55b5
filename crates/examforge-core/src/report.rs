//! Attempt reports with JSON persistence.
//!
//! A report is the flat, render-ready view of a scored attempt: the summary,
//! the breakdown tables and a per-question review list with answers in
//! display form.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::model::{Question, QuestionBody};
use crate::statistics::{AttemptSummary, Breakdowns, ScoredAttempt};

/// A complete attempt report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    pub summary: AttemptSummary,
    pub breakdowns: Breakdowns,
    pub review: Vec<ReviewItem>,
}

/// One reviewed question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewItem {
    pub question_id: String,
    pub prompt: String,
    pub domain_name: String,
    #[serde(rename = "type")]
    pub question_type: String,
    pub user_answer: String,
    pub correct_answer: String,
    pub correct: bool,
    pub earned: f64,
    pub flagged: bool,
    pub time_spent: u64,
    #[serde(default)]
    pub explanation: String,
}

impl AttemptReport {
    pub fn from_scored(scored: &ScoredAttempt) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            summary: scored.summary.clone(),
            breakdowns: scored.breakdowns.clone(),
            review: review_list(scored),
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: AttemptReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Questions answered incorrectly, in attempt order.
    pub fn missed(&self) -> impl Iterator<Item = &ReviewItem> {
        self.review.iter().filter(|r| !r.correct)
    }
}

/// Per-question review list for a scored attempt.
pub fn review_list(scored: &ScoredAttempt) -> Vec<ReviewItem> {
    scored
        .detail
        .iter()
        .map(|d| ReviewItem {
            question_id: d.question.id.clone(),
            prompt: d.question.prompt.clone(),
            domain_name: d.question.domain_name.clone(),
            question_type: d.question.body.type_label(),
            user_answer: display_answer(&d.question, d.response.as_ref()),
            correct_answer: display_answer(&d.question, Some(&d.question.body.answer_value())),
            correct: d.correct,
            earned: d.earned,
            flagged: d.flagged,
            time_spent: d.time_spent,
            explanation: d.question.explanation.clone(),
        })
        .collect()
}

/// Render an answer (a response or the canonical answer) for humans.
///
/// Absent answers render as `-`. Values of the wrong shape for the question
/// type fall back to their raw JSON text.
pub fn display_answer(question: &Question, answer: Option<&Value>) -> String {
    let Some(answer) = answer.filter(|a| !a.is_null()) else {
        return "-".to_string();
    };
    render(question, answer).unwrap_or_else(|| raw(answer))
}

fn render(question: &Question, answer: &Value) -> Option<String> {
    match &question.body {
        QuestionBody::SingleChoice { choices, .. } => {
            Some(pick(choices, answer).unwrap_or("-").to_string())
        }
        QuestionBody::MultiChoice { choices, .. } => Some(
            answer
                .as_array()?
                .iter()
                .filter_map(|i| pick(choices, i))
                .collect::<Vec<_>>()
                .join(", "),
        ),
        QuestionBody::Numeric { .. } => {
            let n = number(answer)?;
            let unit = question.unit_hint.as_deref().unwrap_or("");
            Some(format!("{unit}{n:.2}"))
        }
        QuestionBody::FreeText { .. } => Some(match answer {
            Value::String(s) => s.clone(),
            other => raw(other),
        }),
        QuestionBody::Ordering { items, .. } => Some(
            answer
                .as_array()?
                .iter()
                .filter_map(|i| pick(items, i))
                .collect::<Vec<_>>()
                .join(" → "),
        ),
        QuestionBody::Matching { left, right, .. } => Some(
            answer
                .as_array()?
                .iter()
                .enumerate()
                .map(|(i, r)| {
                    let l = left.get(i).map(String::as_str).unwrap_or("-");
                    let r = pick(right, r).unwrap_or("-");
                    format!("{l} → {r}")
                })
                .collect::<Vec<_>>()
                .join("; "),
        ),
        QuestionBody::MultiNumeric { .. } => answer
            .as_array()?
            .iter()
            .map(|v| number(v).map(|n| format!("{n:.2}")))
            .collect::<Option<Vec<_>>>()
            .map(|parts| parts.join(", ")),
        QuestionBody::Unscorable { .. } => None,
    }
}

fn pick<'a>(labels: &'a [String], index: &Value) -> Option<&'a str> {
    let i = usize::try_from(index.as_u64()?).ok()?;
    labels.get(i).map(String::as_str)
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn raw(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
