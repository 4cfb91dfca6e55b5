//! Engine error types.
//!
//! Almost every failure in the engine degrades to a well-defined value
//! (placeholder question, incorrect score, absent snapshot). The few that
//! callers must react to are typed here so they can be matched on instead
//! of string-compared.

use thiserror::Error;

/// Errors raised by the seeded random source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RngError {
    /// `pick` was asked to choose from an empty sequence.
    #[error("cannot pick from an empty sequence")]
    EmptyChoice,
}

/// Errors raised by a template generator.
///
/// These never abort selection: the hydrator turns them into a labelled
/// placeholder question.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerateError {
    /// A required generator parameter is absent from the entry.
    #[error("template '{template_id}' is missing parameter '{param}'")]
    MissingParam { template_id: String, param: String },

    /// A parameter has the wrong shape (e.g. a list where a number was expected).
    #[error("template '{template_id}' parameter '{param}' is malformed: {reason}")]
    MalformedParam {
        template_id: String,
        param: String,
        reason: String,
    },

    /// A `<name>_min` / `<name>_max` pair is inverted.
    #[error("template '{template_id}' range '{param}' is inverted ({min} > {max})")]
    InvertedRange {
        template_id: String,
        param: String,
        min: f64,
        max: f64,
    },

    #[error(transparent)]
    Rng(#[from] RngError),
}

/// Errors that stop an attempt from being constructed or changed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// No enabled content survived pack and fun-mode filtering.
    #[error("no eligible questions: enable more content packs (enabled: {enabled_packs:?})")]
    EmptyPool { enabled_packs: Vec<String> },

    /// A retake was requested but no question of the previous attempt qualifies.
    #[error("no questions qualify for a {0} retake")]
    NoRetakeCandidates(String),

    /// A retake was requested for an attempt that has not been submitted.
    #[error("attempt '{0}' has not been scored yet")]
    NotScored(String),

    /// A response or flag targeted a question that is not part of the attempt.
    #[error("question '{0}' is not part of this attempt")]
    UnknownQuestion(String),

    /// The attempt was already submitted and can no longer change.
    #[error("attempt '{0}' is already complete")]
    AttemptComplete(String),

    /// No attempt is in progress.
    #[error("no attempt in progress")]
    NoActiveAttempt,
}

/// Errors from the persistence collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize value for key '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}
