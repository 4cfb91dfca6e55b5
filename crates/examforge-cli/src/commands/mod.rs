//! Subcommand implementations.

pub mod generate;
pub mod history;
pub mod init;
pub mod packs;
pub mod score;
pub mod session;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};
use serde_json::Value;

use examforge_core::config::{load_config_from, ExamforgeConfig};
use examforge_core::engine::Engine;
use examforge_core::generators::Registry;
use examforge_core::model::{Domain, Mode, Question};
use examforge_core::parser::ContentLibrary;
use examforge_core::statistics::{BreakdownRow, ScoredAttempt};
use examforge_core::store::{FileStore, MemoryStore, Store};

/// Load config and content, and build an engine over `store`.
fn engine_with<S: Store>(config: &ExamforgeConfig, store: S) -> Result<Engine<S>> {
    let library = ContentLibrary::load(&config.packs_dir)
        .with_context(|| format!("failed to load packs from {}", config.packs_dir.display()))?;
    Ok(Engine::new(library, Registry::builtin(), store, config))
}

/// Engine backed by the state directory.
pub(crate) fn open_engine(config_path: Option<&Path>) -> Result<(ExamforgeConfig, Engine<FileStore>)> {
    let config = load_config_from(config_path)?;
    tracing::debug!(state_dir = %config.state_dir.display(), "opening state store");
    let store = FileStore::open(&config.state_dir)
        .with_context(|| format!("failed to open state dir {}", config.state_dir.display()))?;
    let engine = engine_with(&config, store)?;
    Ok((config, engine))
}

/// Engine that persists nothing.
pub(crate) fn scratch_engine(config_path: Option<&Path>) -> Result<(ExamforgeConfig, Engine<MemoryStore>)> {
    let config = load_config_from(config_path)?;
    let engine = engine_with(&config, MemoryStore::new())?;
    Ok((config, engine))
}

pub(crate) fn parse_mode(s: &str) -> Result<Mode> {
    s.parse::<Mode>().map_err(anyhow::Error::msg)
}

/// Parse a comma-separated list of domain ids.
pub(crate) fn parse_domains(s: Option<&str>) -> Result<Vec<Domain>> {
    let Some(s) = s else {
        return Ok(Vec::new());
    };
    s.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| part.parse::<Domain>().map_err(anyhow::Error::msg))
        .collect()
}

/// A response typed on the command line: JSON when it parses, else text.
pub(crate) fn parse_response(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Prompt plus the answer options a learner needs to respond.
pub(crate) fn print_question(index: usize, question: &Question) {
    use examforge_core::model::QuestionBody;

    println!(
        "\n[{}] {} ({}, {}, {})",
        index + 1,
        question.id,
        question.domain_name,
        question.difficulty,
        question.body.type_label()
    );
    println!("{}", question.prompt);
    fn numbered(labels: &[String]) {
        for (i, label) in labels.iter().enumerate() {
            println!("  {i}) {label}");
        }
    }
    match &question.body {
        QuestionBody::SingleChoice { choices, .. } | QuestionBody::MultiChoice { choices, .. } => {
            numbered(choices)
        }
        QuestionBody::Ordering { items, .. } => numbered(items),
        QuestionBody::Matching { left, right, .. } => {
            for (i, l) in left.iter().enumerate() {
                println!("  {i}. {l}");
            }
            println!("  with:");
            numbered(right);
        }
        _ => {}
    }
}

fn breakdown_table(title: &str, rows: &[BreakdownRow]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![title, "Correct", "Total", "Percent"]);
    for row in rows {
        table.add_row(vec![
            Cell::new(&row.label),
            Cell::new(row.correct),
            Cell::new(row.total),
            Cell::new(format!("{}%", row.percent)),
        ]);
    }
    table
}

/// Summary line plus breakdown tables.
pub(crate) fn print_scored(scored: &ScoredAttempt) {
    let summary = &scored.summary;
    println!(
        "Score: {}% ({:.2}/{}) {}",
        summary.score_percent,
        summary.total_earned,
        summary.question_count,
        if summary.passed { "PASS" } else { "FAIL" }
    );
    println!("Mode: {}  Seed: {}  Time used: {}s", summary.mode.label(), summary.seed, summary.time_used);

    let breakdowns = &scored.breakdowns;
    println!("\n{}", breakdown_table("Domain", &breakdowns.domain));
    println!("\n{}", breakdown_table("Type", &breakdowns.question_type));
    println!("\n{}", breakdown_table("Difficulty", &breakdowns.difficulty));
    println!("\n{}", breakdown_table("Time", &breakdowns.time));
}
