//! Persisted practice session commands: `start`, `show`, `answer`, `flag`,
//! `hint`, `submit` and `retake`.
//!
//! Every command on the current attempt first charges the wall-clock time
//! since the previous command. A time-limited attempt that has run out is
//! submitted on the spot.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use comfy_table::{Cell, Table};

use examforge_core::attempt::Attempt;
use examforge_core::engine::{AttemptRequest, Engine, RetakeKind};
use examforge_core::error::EngineError;
use examforge_core::report::{display_answer, AttemptReport};
use examforge_core::scoring::{score_question, ScoreOptions};
use examforge_core::store::FileStore;

/// The in-progress attempt with its timers brought up to date, or `None`
/// when its time ran out and it was submitted instead.
fn current(engine: &mut Engine<FileStore>) -> Result<Option<Attempt>> {
    let mut attempt = engine
        .resume()
        .ok_or(EngineError::NoActiveAttempt)
        .context("run `examforge start` first")?;
    let Some(scored) = engine.catch_up(&mut attempt, Utc::now())? else {
        return Ok(Some(attempt));
    };
    println!("Time is up. Attempt {} was submitted.", attempt.id);
    super::print_scored(&scored);
    Ok(None)
}

pub fn start(
    config_path: Option<&Path>,
    mode: Option<String>,
    seed: Option<String>,
    domains: Option<String>,
) -> Result<()> {
    let (_, mut engine) = super::open_engine(config_path)?;
    let mode = match mode {
        Some(m) => super::parse_mode(&m)?,
        None => engine.settings().mode,
    };
    let request = AttemptRequest {
        mode,
        domain_selection: super::parse_domains(domains.as_deref())?,
        seed,
    };

    if let Some(previous) = engine.resume() {
        println!("Replacing unfinished attempt {}", previous.id);
    }
    let attempt = engine.start(&request)?;

    println!("Started {} attempt {}", attempt.mode.label(), attempt.id);
    println!("Seed: {}", attempt.seed);
    println!("Questions: {}", attempt.questions.len());
    if attempt.mode.time_limited() {
        println!("Time limit: {} minutes", attempt.time_limit_seconds / 60);
    }
    if let Some(first) = attempt.current_question() {
        super::print_question(attempt.current_index, first);
    }
    Ok(())
}

pub fn show(config_path: Option<&Path>) -> Result<()> {
    let (_, mut engine) = super::open_engine(config_path)?;
    let Some(attempt) = current(&mut engine)? else {
        return Ok(());
    };

    println!(
        "{} attempt {} | {}/{} answered | {}s elapsed | {:.0}s per question",
        attempt.mode.label(),
        attempt.id,
        attempt.answered_count(),
        attempt.questions.len(),
        attempt.elapsed_seconds,
        attempt.average_time()
    );
    if let Some(remaining) = attempt.remaining_seconds() {
        println!("Time left: {}m {:02}s", remaining / 60, remaining % 60);
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "Id", "Domain", "Type", "Answered", "Flagged"]);
    for (i, q) in attempt.questions.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&q.id),
            Cell::new(&q.domain_name),
            Cell::new(q.body.type_label()),
            Cell::new(display_answer(q, attempt.response(&q.id))),
            Cell::new(if attempt.is_flagged(&q.id) { "*" } else { "" }),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn answer(config_path: Option<&Path>, question_id: String, raw: String) -> Result<()> {
    let (_, mut engine) = super::open_engine(config_path)?;
    let Some(mut attempt) = current(&mut engine)? else {
        return Ok(());
    };
    let response = super::parse_response(&raw);

    let changed = attempt.record_response(&question_id, response.clone())?;
    if let Some(index) = attempt.questions.iter().position(|q| q.id == question_id) {
        attempt.go_to(index);
        attempt.next();
    }
    engine.save(&attempt)?;

    let Some(question) = attempt.question(&question_id) else {
        return Ok(());
    };
    println!(
        "Recorded {}: {}{}",
        question_id,
        display_answer(question, Some(&response)),
        if changed { " (changed)" } else { "" }
    );

    if attempt.mode.feedback() {
        let options = ScoreOptions {
            partial_credit: attempt.partial_credit,
        };
        let result = score_question(question, &response, options);
        if result.correct {
            println!("Correct.");
        } else {
            println!(
                "Incorrect. Answer: {}",
                display_answer(question, Some(&question.body.answer_value()))
            );
        }
        for step in &question.steps {
            println!("  - {step}");
        }
        if !question.explanation.is_empty() {
            println!("{}", question.explanation);
        }
        if attempt.streak > 0 {
            println!("Streak: {} (best {})", attempt.streak, attempt.best_streak);
        }
    }

    if let Some(next) = attempt
        .current_question()
        .filter(|q| attempt.response(&q.id).is_none())
    {
        super::print_question(attempt.current_index, next);
    }
    Ok(())
}

pub fn flag(config_path: Option<&Path>, question_id: String) -> Result<()> {
    let (_, mut engine) = super::open_engine(config_path)?;
    let Some(mut attempt) = current(&mut engine)? else {
        return Ok(());
    };
    let flagged = attempt.toggle_flag(&question_id)?;
    engine.save(&attempt)?;
    println!(
        "{} {}",
        if flagged { "Flagged" } else { "Unflagged" },
        question_id
    );
    Ok(())
}

pub fn hint(config_path: Option<&Path>, question_id: String) -> Result<()> {
    let (_, mut engine) = super::open_engine(config_path)?;
    let Some(mut attempt) = current(&mut engine)? else {
        return Ok(());
    };
    let steps = attempt.use_hint(&question_id)?.to_vec();
    engine.save(&attempt)?;

    if steps.is_empty() {
        println!("No worked steps for {question_id}.");
    }
    for step in &steps {
        println!("  - {step}");
    }
    Ok(())
}

pub fn submit(config_path: Option<&Path>, report_path: Option<PathBuf>) -> Result<()> {
    let (_, mut engine) = super::open_engine(config_path)?;
    let Some(mut attempt) = current(&mut engine)? else {
        return Ok(());
    };
    let scored = engine.submit(&mut attempt)?;

    super::print_scored(&scored);

    let report = AttemptReport::from_scored(&scored);
    let missed: Vec<_> = report.missed().collect();
    if !missed.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Id", "Your answer", "Correct answer"]);
        for item in missed {
            table.add_row(vec![
                Cell::new(&item.question_id),
                Cell::new(&item.user_answer),
                Cell::new(&item.correct_answer),
            ]);
        }
        println!("\nMissed:\n{table}");
    }

    if let Some(path) = report_path {
        report.save_json(&path)?;
        eprintln!("Report saved to: {}", path.display());
    }
    Ok(())
}

pub fn retake(config_path: Option<&Path>, kind: String) -> Result<()> {
    let kind = kind.parse::<RetakeKind>().map_err(anyhow::Error::msg)?;
    let (_, mut engine) = super::open_engine(config_path)?;
    let previous = engine
        .last_submitted()
        .context("no submitted attempt to retake")?;

    let attempt = engine.retake(&previous, kind)?;
    println!(
        "Started {} retake {} with {} questions",
        attempt.mode.label(),
        attempt.id,
        attempt.questions.len()
    );
    if let Some(first) = attempt.current_question() {
        super::print_question(attempt.current_index, first);
    }
    Ok(())
}
