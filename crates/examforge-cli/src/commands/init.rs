//! The `examforge init` command.

use std::path::Path;

use anyhow::Result;

use examforge_core::config::SAMPLE_CONFIG;

const CORE_PACK: &str = include_str!("../../../../packs/core.toml");
const FUN_PACK: &str = include_str!("../../../../packs/fun.toml");

fn write_once(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)?;
        println!("Created {}", path.display());
    }
    Ok(())
}

pub fn execute() -> Result<()> {
    write_once(Path::new("examforge.toml"), SAMPLE_CONFIG)?;

    std::fs::create_dir_all("packs")?;
    write_once(Path::new("packs/core.toml"), CORE_PACK)?;
    write_once(Path::new("packs/fun.toml"), FUN_PACK)?;

    println!("\nNext steps:");
    println!("  1. Run: examforge validate --packs packs");
    println!("  2. Run: examforge start --mode study");
    println!("  3. Answer with: examforge answer <question-id> <response>");

    Ok(())
}
