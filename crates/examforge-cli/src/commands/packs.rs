//! The `examforge packs` command.

use std::path::Path;

use anyhow::Result;
use comfy_table::{Cell, Table};

pub fn execute(config_path: Option<&Path>) -> Result<()> {
    let (_, engine) = super::open_engine(config_path)?;
    let enabled = &engine.settings().enabled_packs;

    let mut table = Table::new();
    table.set_header(vec!["Id", "Name", "Enabled", "Questions", "Templates"]);
    for pack in engine.library().packs() {
        let templates = pack.questions.iter().filter(|e| e.is_template()).count();
        table.add_row(vec![
            Cell::new(&pack.id),
            Cell::new(&pack.name),
            Cell::new(if enabled.contains(&pack.id) { "yes" } else { "no" }),
            Cell::new(pack.questions.len()),
            Cell::new(templates),
        ]);
    }
    println!("{table}");

    Ok(())
}
