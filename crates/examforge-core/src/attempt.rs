//! Attempt state and its in-progress operations.
//!
//! An [`Attempt`] is a plain serializable value: it can be snapshotted to
//! storage at any moment and resumed later with the same id, responses,
//! flags, timers and question sequence.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::EngineError;
use crate::model::{Domain, Mode, Question};
use crate::scoring::{score_question, ScoreOptions};
use crate::settings::Blueprint;
use crate::statistics::ScoredAttempt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttemptStatus {
    InProgress,
    Complete,
}

/// One practice attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub id: String,
    /// Seed the question sequence was generated from.
    pub seed: String,
    pub mode: Mode,
    pub status: AttemptStatus,
    pub started_at: DateTime<Utc>,
    /// Wall-clock instant the timers were last brought up to date.
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
    pub time_limit_seconds: u64,
    pub elapsed_seconds: u64,
    pub questions: Vec<Question>,
    /// Raw responses keyed by question id.
    #[serde(default)]
    pub responses: BTreeMap<String, Value>,
    #[serde(default)]
    pub flags: BTreeSet<String>,
    /// How many times a recorded response was replaced by a different one.
    #[serde(default)]
    pub answer_changes: BTreeMap<String, u32>,
    #[serde(default)]
    pub hint_usage: BTreeMap<String, u32>,
    /// Seconds spent on each question.
    #[serde(default)]
    pub time_spent: BTreeMap<String, u64>,
    #[serde(default)]
    pub streak: u32,
    #[serde(default)]
    pub best_streak: u32,
    #[serde(default)]
    pub current_index: usize,
    /// Blueprint copy taken when the attempt was built.
    pub blueprint: Blueprint,
    #[serde(default)]
    pub domain_selection: Vec<Domain>,
    #[serde(default)]
    pub partial_credit: bool,
    /// Present once the attempt has been submitted.
    #[serde(default)]
    pub scored: Option<ScoredAttempt>,
}

impl Attempt {
    /// A fresh in-progress attempt with no questions yet.
    pub fn new(mode: Mode, seed: impl Into<String>, blueprint: Blueprint) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            seed: seed.into(),
            mode,
            status: AttemptStatus::InProgress,
            started_at: Utc::now(),
            last_seen: None,
            time_limit_seconds: blueprint.time_limit_seconds(),
            elapsed_seconds: 0,
            questions: Vec::new(),
            responses: BTreeMap::new(),
            flags: BTreeSet::new(),
            answer_changes: BTreeMap::new(),
            hint_usage: BTreeMap::new(),
            time_spent: BTreeMap::new(),
            streak: 0,
            best_streak: 0,
            current_index: 0,
            blueprint,
            domain_selection: Vec::new(),
            partial_credit: false,
            scored: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == AttemptStatus::Complete
    }

    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    pub fn response(&self, question_id: &str) -> Option<&Value> {
        self.responses.get(question_id)
    }

    pub fn is_flagged(&self, question_id: &str) -> bool {
        self.flags.contains(question_id)
    }

    pub fn answered_count(&self) -> usize {
        self.questions
            .iter()
            .filter(|q| self.responses.contains_key(&q.id))
            .count()
    }

    fn ensure_open(&self) -> Result<(), EngineError> {
        if self.is_complete() {
            return Err(EngineError::AttemptComplete(self.id.clone()));
        }
        Ok(())
    }

    fn ensure_question(&self, question_id: &str) -> Result<(), EngineError> {
        if self.question(question_id).is_none() {
            return Err(EngineError::UnknownQuestion(question_id.to_string()));
        }
        Ok(())
    }

    /// Store a response. Replacing an earlier, different response counts as
    /// an answer change; returns whether this call counted one.
    pub fn record_response(&mut self, question_id: &str, response: Value) -> Result<bool, EngineError> {
        self.ensure_open()?;
        self.ensure_question(question_id)?;

        let changed = self
            .responses
            .get(question_id)
            .is_some_and(|previous| *previous != response);
        if changed {
            *self.answer_changes.entry(question_id.to_string()).or_default() += 1;
        }
        self.responses.insert(question_id.to_string(), response);
        Ok(changed)
    }

    /// Flip the review flag on a question; returns the new state.
    pub fn toggle_flag(&mut self, question_id: &str) -> Result<bool, EngineError> {
        self.ensure_open()?;
        self.ensure_question(question_id)?;
        if self.flags.remove(question_id) {
            Ok(false)
        } else {
            self.flags.insert(question_id.to_string());
            Ok(true)
        }
    }

    /// Record a hint reveal and return the question's worked steps.
    pub fn use_hint(&mut self, question_id: &str) -> Result<&[String], EngineError> {
        self.ensure_open()?;
        self.ensure_question(question_id)?;
        *self.hint_usage.entry(question_id.to_string()).or_default() += 1;
        Ok(self
            .question(question_id)
            .map(|q| q.steps.as_slice())
            .unwrap_or_default())
    }

    /// Advance the clock by one second, charging it to the current question.
    ///
    /// Returns `true` when a time-limited attempt has run out of time and
    /// should be submitted.
    pub fn tick(&mut self) -> bool {
        self.advance_clock(1)
    }

    /// Advance the clock by `seconds`, charging them to the current question.
    /// Returns `true` once a time-limited attempt has run out of time.
    pub fn advance_clock(&mut self, seconds: u64) -> bool {
        if self.is_complete() {
            return false;
        }
        self.elapsed_seconds = self.elapsed_seconds.saturating_add(seconds);
        if let Some(id) = self.current_question().map(|q| q.id.clone()) {
            let spent = self.time_spent.entry(id).or_default();
            *spent = spent.saturating_add(seconds);
        }
        self.is_expired()
    }

    /// Charge the wall-clock time since the attempt was last seen (or
    /// started) and mark `now` as seen. Time running backwards charges
    /// nothing.
    pub fn catch_up(&mut self, now: DateTime<Utc>) -> bool {
        let since = self.last_seen.unwrap_or(self.started_at);
        let seconds = u64::try_from((now - since).num_seconds()).unwrap_or(0);
        self.last_seen = Some(now.max(since));
        self.advance_clock(seconds)
    }

    /// Whether a time-limited attempt has no time left.
    pub fn is_expired(&self) -> bool {
        self.remaining_seconds() == Some(0)
    }

    /// Seconds left for time-limited modes, `None` otherwise.
    pub fn remaining_seconds(&self) -> Option<u64> {
        self.mode
            .time_limited()
            .then(|| self.time_limit_seconds.saturating_sub(self.elapsed_seconds))
    }

    /// Move to a question index, clamped to the sequence.
    pub fn go_to(&mut self, index: usize) {
        self.current_index = index.min(self.questions.len().saturating_sub(1));
    }

    /// Move to the next question. In drill mode the current response is
    /// scored first to update the streak.
    pub fn next(&mut self) {
        if self.mode == Mode::Drills {
            self.advance_streak();
        }
        self.go_to(self.current_index + 1);
    }

    pub fn previous(&mut self) {
        self.go_to(self.current_index.saturating_sub(1));
    }

    fn advance_streak(&mut self) {
        let Some(question) = self.current_question() else {
            return;
        };
        let response = self.responses.get(&question.id).cloned().unwrap_or(Value::Null);
        let options = ScoreOptions {
            partial_credit: self.partial_credit,
        };
        if score_question(question, &response, options).correct {
            self.streak += 1;
            self.best_streak = self.best_streak.max(self.streak);
        } else {
            self.streak = 0;
        }
    }

    /// Average seconds spent per question that has any time recorded.
    pub fn average_time(&self) -> f64 {
        if self.time_spent.is_empty() {
            return 0.0;
        }
        self.time_spent.values().sum::<u64>() as f64 / self.time_spent.len() as f64
    }

    /// Serialize a snapshot for the persistence collaborator.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
