//! Configuration loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::settings::Settings;
use crate::statistics::{DEFAULT_HISTORY_LIMIT, DEFAULT_PASS_THRESHOLD};

/// Top-level examforge configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamforgeConfig {
    /// Directory scanned for content pack `.toml` files.
    #[serde(default = "default_packs_dir")]
    pub packs_dir: PathBuf,
    /// Directory holding persisted settings, attempts and history.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
    /// Minimum score percent that counts as a pass.
    #[serde(default = "default_pass_threshold")]
    pub pass_threshold: u32,
    /// Number of history entries kept.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// Settings used until the learner saves their own.
    #[serde(default)]
    pub settings: Settings,
}

fn default_packs_dir() -> PathBuf {
    PathBuf::from("./packs")
}
fn default_state_dir() -> PathBuf {
    PathBuf::from("./.examforge")
}
fn default_pass_threshold() -> u32 {
    DEFAULT_PASS_THRESHOLD
}
fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

impl Default for ExamforgeConfig {
    fn default() -> Self {
        Self {
            packs_dir: default_packs_dir(),
            state_dir: default_state_dir(),
            pass_threshold: default_pass_threshold(),
            history_limit: default_history_limit(),
            settings: Settings::default(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `examforge.toml` in the current directory
/// 2. `~/.config/examforge/config.toml`
///
/// Environment variable overrides: `EXAMFORGE_PACKS_DIR`, `EXAMFORGE_STATE_DIR`.
pub fn load_config() -> Result<ExamforgeConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ExamforgeConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("examforge.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = toml::from_str::<ExamforgeConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "config loaded");
            config
        }
        None => ExamforgeConfig::default(),
    };

    if let Ok(dir) = std::env::var("EXAMFORGE_PACKS_DIR") {
        config.packs_dir = PathBuf::from(dir);
    }
    if let Ok(dir) = std::env::var("EXAMFORGE_STATE_DIR") {
        config.state_dir = PathBuf::from(dir);
    }

    config.packs_dir = resolve_path(&config.packs_dir);
    config.state_dir = resolve_path(&config.state_dir);

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("examforge"))
}

/// Starter configuration written by `examforge init`.
pub const SAMPLE_CONFIG: &str = r#"# examforge configuration
packs_dir = "./packs"
state_dir = "./.examforge"
pass_threshold = 70
history_limit = 10

[settings]
mode = "timed"
enabled_packs = ["core"]
fun_mode = false
partial_credit = false

[settings.blueprint]
time_limit_minutes = 60

[settings.blueprint.question_count]
timed = 30
study = 20
drills = 20
domain = 20
weakness = 20

[settings.blueprint.domain_weights]
1 = 0.2
2 = 0.35
3 = 0.2
4 = 0.15
5 = 0.1

[settings.blueprint.difficulty_mix]
easy = 0.4
medium = 0.4
hard = 0.2

[settings.blueprint.type_mix]
mcq = 0.35
msq = 0.15
numeric = 0.3
fill = 0.05
order = 0.05
match = 0.05
multi_numeric = 0.05
"#;
