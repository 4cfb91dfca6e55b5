//! The `examforge history`, `examforge weakness` and `examforge reset`
//! commands.

use std::path::Path;

use anyhow::Result;
use comfy_table::{Cell, Table};

pub fn history(config_path: Option<&Path>) -> Result<()> {
    let (_, engine) = super::open_engine(config_path)?;
    let history = engine.history();
    if history.is_empty() {
        println!("No attempts yet. Run `examforge start` to begin.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Date", "Mode", "Score", "Result", "Questions", "Seed"]);
    for entry in &history {
        let summary = &entry.summary;
        table.add_row(vec![
            Cell::new(entry.date.format("%Y-%m-%d %H:%M")),
            Cell::new(summary.mode.label()),
            Cell::new(format!("{}%", summary.score_percent)),
            Cell::new(if summary.passed { "PASS" } else { "FAIL" }),
            Cell::new(summary.question_count),
            Cell::new(&summary.seed),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn weakness(config_path: Option<&Path>) -> Result<()> {
    let (_, engine) = super::open_engine(config_path)?;
    let Some(profile) = engine.weakness_profile().filter(|p| !p.is_empty()) else {
        println!("No weakness profile yet. Submit an attempt first.");
        return Ok(());
    };

    let mut table = Table::new();
    table.set_header(vec!["Dimension", "Weak spot", "Weight floor"]);
    for spot in &profile.domains {
        table.add_row(vec![
            Cell::new("Domain"),
            Cell::new(spot.id.name()),
            Cell::new(format!("{:.2}", spot.weight)),
        ]);
    }
    for spot in &profile.question_types {
        table.add_row(vec![
            Cell::new("Type"),
            Cell::new(spot.id),
            Cell::new(format!("{:.2}", spot.weight)),
        ]);
    }
    for spot in &profile.difficulties {
        table.add_row(vec![
            Cell::new("Difficulty"),
            Cell::new(spot.id),
            Cell::new(format!("{:.2}", spot.weight)),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn reset(config_path: Option<&Path>) -> Result<()> {
    let (config, mut engine) = super::open_engine(config_path)?;
    engine.reset(&config)?;
    println!("Cleared saved state in {}", config.state_dir.display());
    Ok(())
}
