//! The `examforge generate` command.

use std::path::Path;

use anyhow::Result;
use comfy_table::{Cell, Table};

use examforge_core::engine::AttemptRequest;
use examforge_core::report::display_answer;

pub fn execute(
    config_path: Option<&Path>,
    mode: String,
    seed: Option<String>,
    domains: Option<String>,
    count: Option<usize>,
    format: String,
) -> Result<()> {
    let mode = super::parse_mode(&mode)?;
    let domain_selection = super::parse_domains(domains.as_deref())?;

    let (_, mut engine) = super::scratch_engine(config_path)?;
    if let Some(count) = count {
        let mut settings = engine.settings().clone();
        settings.blueprint.question_count.insert(mode, count);
        engine.update_settings(settings)?;
    }

    let request = AttemptRequest {
        mode,
        domain_selection,
        seed,
    };
    let attempt = engine.generate(&request)?;

    match format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&attempt.questions)?);
        }
        _ => {
            println!(
                "{} | seed {} | {} questions",
                attempt.mode.label(),
                attempt.seed,
                attempt.questions.len()
            );
            let mut table = Table::new();
            table.set_header(vec!["#", "Id", "Domain", "Difficulty", "Type", "Answer"]);
            for (i, q) in attempt.questions.iter().enumerate() {
                table.add_row(vec![
                    Cell::new(i + 1),
                    Cell::new(&q.id),
                    Cell::new(&q.domain_name),
                    Cell::new(q.difficulty),
                    Cell::new(q.body.type_label()),
                    Cell::new(display_answer(q, Some(&q.body.answer_value()))),
                ]);
            }
            println!("{table}");
        }
    }

    Ok(())
}
