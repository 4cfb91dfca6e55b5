//! Central practice engine.
//!
//! Ties content, generators, selection, scoring, history and the weakness
//! profile to a persistence store. One attempt is in progress at a time.

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::attempt::{Attempt, AttemptStatus};
use crate::config::ExamforgeConfig;
use crate::error::EngineError;
use crate::generators::Registry;
use crate::model::{Domain, Mode, PoolEntry};
use crate::parser::ContentLibrary;
use crate::profiler::{compute_weakness_profile, WeaknessProfile};
use crate::rng::{seed_from_inputs, SeededRng};
use crate::scoring::ScoreOptions;
use crate::selection::{select_questions, SelectionRequest};
use crate::settings::Settings;
use crate::statistics::{push_history, score_attempt, HistoryEntry, ScoredAttempt};
use crate::store::{Storage, Store};

/// Which questions of a scored attempt a retake reuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetakeKind {
    /// Incorrect questions, in the learner's current mode.
    Incorrect,
    /// Flagged questions, in the learner's current mode.
    Flagged,
    /// Incorrect questions, as a drill.
    DrillMissed,
}

impl fmt::Display for RetakeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RetakeKind::Incorrect => "incorrect",
            RetakeKind::Flagged => "flagged",
            RetakeKind::DrillMissed => "drill",
        })
    }
}

impl FromStr for RetakeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "incorrect" | "missed" => Ok(RetakeKind::Incorrect),
            "flagged" => Ok(RetakeKind::Flagged),
            "drill" | "drills" => Ok(RetakeKind::DrillMissed),
            other => Err(format!("unknown retake kind: {other}")),
        }
    }
}

/// What to build an attempt for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRequest {
    pub mode: Mode,
    /// Domains for domain-focus mode.
    pub domain_selection: Vec<Domain>,
    /// Fixed seed; a fresh one is derived when absent.
    pub seed: Option<String>,
}

impl AttemptRequest {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            domain_selection: Vec::new(),
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: impl Into<String>) -> Self {
        self.seed = Some(seed.into());
        self
    }

    pub fn with_domains(mut self, domains: Vec<Domain>) -> Self {
        self.domain_selection = domains;
        self
    }
}

/// Seed from mode, current time and a random salt.
pub fn fresh_seed(mode: Mode) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    seed_from_inputs(&[mode.as_str(), &Utc::now().to_rfc3339(), &salt[..10]])
}

/// The practice engine.
pub struct Engine<S> {
    library: ContentLibrary,
    registry: Registry,
    storage: Storage<S>,
    settings: Settings,
    pass_threshold: u32,
    history_limit: usize,
}

impl<S: Store> Engine<S> {
    /// Create an engine over a store. Stored data from an older layout is
    /// cleared; stored settings take precedence over `config.settings`.
    pub fn new(library: ContentLibrary, registry: Registry, store: S, config: &ExamforgeConfig) -> Self {
        let mut storage = Storage::new(store);
        if let Err(e) = storage.migrate_if_needed() {
            tracing::warn!(error = %e, "storage migration failed");
        }
        let settings = storage
            .load_settings()
            .unwrap_or_else(|| config.settings.clone());
        Self {
            library,
            registry,
            storage,
            settings,
            pass_threshold: config.pass_threshold,
            history_limit: config.history_limit,
        }
    }

    pub fn library(&self) -> &ContentLibrary {
        &self.library
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn storage(&self) -> &Storage<S> {
        &self.storage
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replace and persist the settings. Attempts already built keep their
    /// own blueprint copy.
    pub fn update_settings(&mut self, settings: Settings) -> Result<()> {
        self.storage
            .save_settings(&settings)
            .context("failed to save settings")?;
        self.settings = settings;
        Ok(())
    }

    /// Candidate universe under the current settings.
    pub fn pool(&self) -> Vec<PoolEntry<'_>> {
        self.library
            .pool(&self.settings.enabled_packs, self.settings.fun_mode)
    }

    /// Build an attempt without persisting it.
    pub fn generate(&self, request: &AttemptRequest) -> Result<Attempt, EngineError> {
        let pool = self.pool();
        if pool.is_empty() {
            return Err(EngineError::EmptyPool {
                enabled_packs: self.settings.enabled_packs.clone(),
            });
        }

        let seed = request
            .seed
            .clone()
            .unwrap_or_else(|| fresh_seed(request.mode));
        let blueprint = self.settings.blueprint.clone();
        let weakness = match request.mode {
            Mode::Weakness => self.storage.load_weakness(),
            _ => None,
        };

        let mut rng = SeededRng::new(seed.clone());
        let selection = SelectionRequest {
            mode: request.mode,
            blueprint: &blueprint,
            domain_selection: &request.domain_selection,
            weakness: weakness.as_ref(),
        };
        let questions = select_questions(&pool, &self.registry, &mut rng, &selection)?;

        let mut attempt = Attempt::new(request.mode, seed, blueprint);
        attempt.domain_selection = request.domain_selection.clone();
        attempt.partial_credit = self.settings.partial_credit;
        attempt.questions = questions;

        tracing::info!(
            attempt_id = %attempt.id,
            mode = %attempt.mode,
            seed = %attempt.seed,
            questions = attempt.questions.len(),
            "attempt built"
        );
        Ok(attempt)
    }

    /// Build an attempt and make it the current one.
    pub fn start(&mut self, request: &AttemptRequest) -> Result<Attempt> {
        let attempt = self.generate(request)?;
        self.save(&attempt)?;
        Ok(attempt)
    }

    /// The saved in-progress attempt, if any.
    pub fn resume(&self) -> Option<Attempt> {
        let attempt = self
            .storage
            .load_attempt()
            .filter(|a| a.status == AttemptStatus::InProgress)?;
        tracing::info!(attempt_id = %attempt.id, "attempt resumed");
        Some(attempt)
    }

    /// Bring an attempt's timers up to `now`. A time-limited attempt whose
    /// time has run out is submitted and its result returned; otherwise the
    /// updated snapshot is saved.
    pub fn catch_up(
        &mut self,
        attempt: &mut Attempt,
        now: DateTime<Utc>,
    ) -> Result<Option<ScoredAttempt>> {
        if attempt.is_complete() {
            return Ok(None);
        }
        if attempt.catch_up(now) {
            tracing::info!(attempt_id = %attempt.id, elapsed = attempt.elapsed_seconds, "time limit reached");
            return self.submit(attempt).map(Some);
        }
        self.save(attempt)?;
        Ok(None)
    }

    /// Snapshot the current attempt.
    pub fn save(&mut self, attempt: &Attempt) -> Result<()> {
        self.storage
            .save_attempt(attempt)
            .context("failed to save attempt")
    }

    /// Score and close an attempt, record it in history and refresh the
    /// weakness profile.
    pub fn submit(&mut self, attempt: &mut Attempt) -> Result<ScoredAttempt> {
        if attempt.is_complete() {
            return Err(EngineError::AttemptComplete(attempt.id.clone()).into());
        }

        let options = ScoreOptions {
            partial_credit: attempt.partial_credit,
        };
        let scored = score_attempt(attempt, options, self.pass_threshold);
        attempt.status = AttemptStatus::Complete;
        attempt.scored = Some(scored.clone());

        self.storage
            .clear_attempt()
            .context("failed to clear current attempt")?;
        self.storage
            .save_last_attempt(attempt)
            .context("failed to save submitted attempt")?;

        let mut history = self.storage.load_history();
        push_history(
            &mut history,
            HistoryEntry::from_scored(&scored, Utc::now()),
            self.history_limit,
        );
        self.storage
            .save_history(&history)
            .context("failed to save history")?;

        if let Some(profile) = compute_weakness_profile(&history) {
            self.storage
                .save_weakness(&profile)
                .context("failed to save weakness profile")?;
        }

        tracing::info!(
            attempt_id = %attempt.id,
            score_percent = scored.summary.score_percent,
            passed = scored.summary.passed,
            "attempt submitted"
        );
        Ok(scored)
    }

    /// Start a new attempt from part of a scored one. Questions are reused
    /// verbatim.
    pub fn retake(&mut self, previous: &Attempt, kind: RetakeKind) -> Result<Attempt> {
        let scored = previous
            .scored
            .as_ref()
            .ok_or_else(|| EngineError::NotScored(previous.id.clone()))?;

        let questions: Vec<_> = scored
            .detail
            .iter()
            .filter(|d| match kind {
                RetakeKind::Incorrect | RetakeKind::DrillMissed => !d.correct,
                RetakeKind::Flagged => d.flagged,
            })
            .map(|d| d.question.clone())
            .collect();
        if questions.is_empty() {
            return Err(EngineError::NoRetakeCandidates(kind.to_string()).into());
        }

        let mode = match kind {
            RetakeKind::DrillMissed => Mode::Drills,
            _ => self.settings.mode,
        };
        let mut attempt = Attempt::new(mode, fresh_seed(mode), self.settings.blueprint.clone());
        attempt.partial_credit = self.settings.partial_credit;
        attempt.questions = questions;
        self.save(&attempt)?;

        tracing::info!(
            attempt_id = %attempt.id,
            from = %previous.id,
            %kind,
            questions = attempt.questions.len(),
            "retake started"
        );
        Ok(attempt)
    }

    /// The most recently submitted attempt, with its scored result.
    pub fn last_submitted(&self) -> Option<Attempt> {
        self.storage.load_last_attempt()
    }

    /// Past attempts, most recent first.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.storage.load_history()
    }

    pub fn weakness_profile(&self) -> Option<WeaknessProfile> {
        self.storage.load_weakness()
    }

    /// Forget settings, the current attempt, history and the profile.
    pub fn reset(&mut self, config: &ExamforgeConfig) -> Result<()> {
        self.storage.clear_all().context("failed to clear storage")?;
        self.settings = config.settings.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Answer, Difficulty, Entry, Pack, QuestionBody, QuestionType};
    use crate::store::MemoryStore;
    use serde_json::json;

    fn mcq(id: &str, domain: Domain, fun_only: bool) -> Entry {
        let mut entry = Entry::new(domain, Difficulty::Easy, QuestionType::Mcq);
        entry.id = Some(id.into());
        entry.prompt = Some(format!("{id}?"));
        entry.choices = Some(vec!["right".into(), "wrong".into()]);
        entry.answer = Some(Answer::Index(0));
        entry.fun_only = fun_only;
        entry
    }

    fn library() -> ContentLibrary {
        let questions = (0..40)
            .map(|i| mcq(&format!("q{i}"), Domain::ALL[i % 5], false))
            .collect();
        let core = Pack {
            id: "core".into(),
            name: "Core".into(),
            description: String::new(),
            enabled: true,
            questions,
        };
        let fun = Pack {
            id: "fun".into(),
            name: "Fun".into(),
            description: String::new(),
            enabled: false,
            questions: vec![mcq("joke", Domain::Fundamentals, true)],
        };
        ContentLibrary::new(vec![core, fun])
    }

    fn config(count: usize) -> ExamforgeConfig {
        let mut config = ExamforgeConfig::default();
        for mode in Mode::ALL {
            config.settings.blueprint.question_count.insert(mode, count);
        }
        config
    }

    fn engine(count: usize) -> Engine<MemoryStore> {
        Engine::new(library(), Registry::builtin(), MemoryStore::new(), &config(count))
    }

    fn answer_all(attempt: &mut Attempt, correct_every: usize) {
        let ids: Vec<String> = attempt.questions.iter().map(|q| q.id.clone()).collect();
        for (i, id) in ids.iter().enumerate() {
            let choice = if i % correct_every == 0 { 0 } else { 1 };
            attempt.record_response(id, json!(choice)).unwrap();
        }
    }

    #[test]
    fn generate_is_reproducible_from_seed() {
        let engine = engine(10);
        let request = AttemptRequest::new(Mode::Timed).with_seed("fixed-seed");
        let a = engine.generate(&request).unwrap();
        let b = engine.generate(&request).unwrap();
        assert_eq!(a.questions, b.questions);
        assert_ne!(a.id, b.id);
        assert_eq!(a.seed, "fixed-seed");
        assert_eq!(a.questions.len(), 10);
    }

    #[test]
    fn empty_pool_names_enabled_packs() {
        let mut engine = engine(10);
        engine
            .update_settings(Settings {
                enabled_packs: vec!["missing".into()],
                ..Settings::default()
            })
            .unwrap();
        let err = engine.generate(&AttemptRequest::new(Mode::Study)).unwrap_err();
        assert_eq!(
            err,
            EngineError::EmptyPool {
                enabled_packs: vec!["missing".into()]
            }
        );

        let err = engine.start(&AttemptRequest::new(Mode::Study)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EngineError>(),
            Some(EngineError::EmptyPool { .. })
        ));
    }

    #[test]
    fn fun_entries_need_fun_mode() {
        let mut engine = engine(10);
        let all = vec!["core".to_string(), "fun".to_string()];
        engine
            .update_settings(Settings {
                enabled_packs: all.clone(),
                ..Settings::default()
            })
            .unwrap();
        assert_eq!(engine.pool().len(), 40);
        engine
            .update_settings(Settings {
                enabled_packs: all,
                fun_mode: true,
                ..Settings::default()
            })
            .unwrap();
        assert_eq!(engine.pool().len(), 41);
    }

    #[test]
    fn start_persists_and_resumes() {
        let mut engine = engine(5);
        let mut attempt = engine.start(&AttemptRequest::new(Mode::Study)).unwrap();
        let first = attempt.questions[0].id.clone();
        attempt.record_response(&first, json!(0)).unwrap();
        attempt.toggle_flag(&first).unwrap();
        attempt.tick();
        engine.save(&attempt).unwrap();

        let resumed = engine.resume().unwrap();
        assert_eq!(resumed, attempt);
    }

    #[test]
    fn submit_records_history_and_profile() {
        let mut engine = engine(10);
        let mut attempt = engine.start(&AttemptRequest::new(Mode::Timed)).unwrap();
        answer_all(&mut attempt, 2);

        let scored = engine.submit(&mut attempt).unwrap();
        assert_eq!(scored.summary.score_percent, 50);
        assert!(!scored.summary.passed);
        assert!(attempt.is_complete());
        assert!(engine.resume().is_none());

        let history = engine.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].summary.attempt_id, attempt.id);
        assert!(!history[0].domain_breakdown.is_empty());

        let profile = engine.weakness_profile().unwrap();
        assert!(!profile.domains.is_empty());
        assert_eq!(profile.question_types[0].id, QuestionType::Mcq);

        assert!(engine.submit(&mut attempt).is_err());
    }

    #[test]
    fn history_is_capped() {
        let mut config = config(2);
        config.history_limit = 3;
        let mut engine = Engine::new(library(), Registry::builtin(), MemoryStore::new(), &config);
        for _ in 0..5 {
            let mut attempt = engine.start(&AttemptRequest::new(Mode::Study)).unwrap();
            engine.submit(&mut attempt).unwrap();
        }
        assert_eq!(engine.history().len(), 3);
    }

    #[test]
    fn retakes_reuse_questions() {
        let mut engine = engine(6);
        let mut attempt = engine.start(&AttemptRequest::new(Mode::Timed)).unwrap();
        answer_all(&mut attempt, 3);
        let flagged = attempt.questions[0].id.clone();
        attempt.toggle_flag(&flagged).unwrap();

        assert!(matches!(
            engine
                .retake(&attempt, RetakeKind::Incorrect)
                .unwrap_err()
                .downcast_ref::<EngineError>(),
            Some(EngineError::NotScored(_))
        ));

        engine.submit(&mut attempt).unwrap();
        assert_eq!(engine.last_submitted().as_ref(), Some(&attempt));

        let missed = engine.retake(&attempt, RetakeKind::Incorrect).unwrap();
        assert_eq!(missed.questions.len(), 4);
        assert_eq!(missed.mode, Mode::Timed);
        assert_eq!(missed.questions[0], attempt.questions[1]);

        let drill = engine.retake(&attempt, RetakeKind::DrillMissed).unwrap();
        assert_eq!(drill.mode, Mode::Drills);

        let flagged_retake = engine.retake(&attempt, RetakeKind::Flagged).unwrap();
        assert_eq!(flagged_retake.questions.len(), 1);
        assert_eq!(flagged_retake.questions[0].id, flagged);
        assert_eq!(engine.resume().map(|a| a.id), Some(flagged_retake.id));
    }

    #[test]
    fn retake_without_candidates_fails() {
        let mut engine = engine(3);
        let mut attempt = engine.start(&AttemptRequest::new(Mode::Study)).unwrap();
        answer_all(&mut attempt, 1);
        engine.submit(&mut attempt).unwrap();
        let err = engine.retake(&attempt, RetakeKind::Incorrect).unwrap_err();
        assert_eq!(
            err.downcast_ref::<EngineError>(),
            Some(&EngineError::NoRetakeCandidates("incorrect".into()))
        );
    }

    #[test]
    fn weakness_mode_reads_stored_profile() {
        let mut engine = engine(10);
        let mut attempt = engine.start(&AttemptRequest::new(Mode::Timed)).unwrap();
        answer_all(&mut attempt, 2);
        engine.submit(&mut attempt).unwrap();

        let weak = engine.generate(&AttemptRequest::new(Mode::Weakness)).unwrap();
        assert_eq!(weak.mode, Mode::Weakness);
        assert_eq!(weak.questions.len(), 10);
        assert!(weak
            .questions
            .iter()
            .all(|q| matches!(q.body, QuestionBody::SingleChoice { .. })));
    }

    #[test]
    fn stored_settings_win_over_config() {
        let mut store = MemoryStore::new();
        let stored = Settings {
            mode: Mode::Drills,
            ..Settings::default()
        };
        store
            .set("examforge:v2:settings", &serde_json::to_string(&stored).unwrap())
            .unwrap();
        let engine = Engine::new(library(), Registry::builtin(), store, &config(5));
        assert_eq!(engine.settings().mode, Mode::Drills);
    }

    #[test]
    fn catch_up_saves_running_attempts_and_submits_expired_ones() {
        let mut engine = engine(5);
        let mut attempt = engine.start(&AttemptRequest::new(Mode::Timed)).unwrap();
        let start = attempt.started_at;

        let scored = engine
            .catch_up(&mut attempt, start + chrono::Duration::seconds(30))
            .unwrap();
        assert!(scored.is_none());
        assert_eq!(engine.resume().map(|a| a.elapsed_seconds), Some(30));

        let scored = engine
            .catch_up(&mut attempt, start + chrono::Duration::minutes(90))
            .unwrap()
            .unwrap();
        assert!(attempt.is_complete());
        assert_eq!(scored.summary.time_used, 5400);
        assert!(engine.resume().is_none());
        assert_eq!(engine.history().len(), 1);

        assert!(engine
            .catch_up(&mut attempt, start + chrono::Duration::minutes(120))
            .unwrap()
            .is_none());
        assert_eq!(engine.history().len(), 1);
    }

    #[test]
    fn study_attempts_never_expire() {
        let mut engine = engine(5);
        let mut attempt = engine.start(&AttemptRequest::new(Mode::Study)).unwrap();
        let later = attempt.started_at + chrono::Duration::hours(5);
        assert!(engine.catch_up(&mut attempt, later).unwrap().is_none());
        assert!(!attempt.is_complete());
    }

    #[test]
    fn reset_forgets_everything() {
        let mut engine = engine(5);
        engine
            .update_settings(Settings {
                mode: Mode::Drills,
                ..Settings::default()
            })
            .unwrap();
        let mut attempt = engine.start(&AttemptRequest::new(Mode::Study)).unwrap();
        answer_all(&mut attempt, 2);
        engine.submit(&mut attempt).unwrap();
        engine.start(&AttemptRequest::new(Mode::Study)).unwrap();

        engine.reset(&config(5)).unwrap();
        assert!(engine.resume().is_none());
        assert!(engine.history().is_empty());
        assert!(engine.weakness_profile().is_none());
        assert!(engine.last_submitted().is_none());
        assert_eq!(engine.settings().mode, Mode::Timed);
    }

    #[test]
    fn retake_kind_parses() {
        assert_eq!("missed".parse::<RetakeKind>().unwrap(), RetakeKind::Incorrect);
        assert_eq!("drill".parse::<RetakeKind>().unwrap(), RetakeKind::DrillMissed);
        assert!("nope".parse::<RetakeKind>().is_err());
    }
}
