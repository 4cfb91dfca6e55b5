//! The `examforge score` command.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};
use serde_json::Value;

use examforge_core::attempt::Attempt;
use examforge_core::config::load_config_from;
use examforge_core::report::AttemptReport;
use examforge_core::scoring::ScoreOptions;
use examforge_core::statistics::score_attempt;

pub fn execute(
    config_path: Option<&Path>,
    attempt_path: PathBuf,
    responses_path: PathBuf,
    partial_credit: bool,
    format: String,
) -> Result<()> {
    let config = load_config_from(config_path)?;

    let content = std::fs::read_to_string(&attempt_path)
        .with_context(|| format!("failed to read attempt from {}", attempt_path.display()))?;
    let mut attempt = Attempt::from_json(&content).context("failed to parse attempt JSON")?;

    let content = std::fs::read_to_string(&responses_path)
        .with_context(|| format!("failed to read responses from {}", responses_path.display()))?;
    let responses: BTreeMap<String, Value> =
        serde_json::from_str(&content).context("failed to parse responses JSON")?;

    for id in responses.keys() {
        if attempt.question(id).is_none() {
            eprintln!("Warning: ignoring response for unknown question '{id}'");
        }
    }
    attempt.responses = responses
        .into_iter()
        .filter(|(id, _)| attempt.question(id).is_some())
        .collect();

    let options = ScoreOptions {
        partial_credit: partial_credit || attempt.partial_credit,
    };
    let scored = score_attempt(&attempt, options, config.pass_threshold);
    let report = AttemptReport::from_scored(&scored);

    match format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            super::print_scored(&scored);

            let mut table = Table::new();
            table.set_header(vec!["Id", "Your answer", "Correct answer", "Earned"]);
            for item in &report.review {
                table.add_row(vec![
                    Cell::new(&item.question_id),
                    Cell::new(&item.user_answer),
                    Cell::new(&item.correct_answer),
                    Cell::new(format!("{:.2}", item.earned)),
                ]);
            }
            println!("\n{table}");
        }
    }

    Ok(())
}
