//! The `examforge validate` command.

use std::path::PathBuf;

use anyhow::Result;

use examforge_core::generators::Registry;
use examforge_core::parser::{self, ContentLibrary};

pub fn execute(packs_path: PathBuf) -> Result<()> {
    let packs = if packs_path.is_dir() {
        parser::load_pack_directory(&packs_path)?
    } else {
        vec![parser::parse_pack(&packs_path)?]
    };

    for pack in &packs {
        let templates = pack.questions.iter().filter(|e| e.is_template()).count();
        println!(
            "Pack: {} ({} questions, {} templates)",
            pack.name,
            pack.questions.len(),
            templates
        );
    }

    let library = ContentLibrary::new(packs);
    let warnings = parser::validate_library(&library, &Registry::builtin());
    for w in &warnings {
        let prefix = match &w.question {
            Some(q) => format!("  [{}/{q}]", w.pack_id),
            None => format!("  [{}]", w.pack_id),
        };
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("All packs valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
