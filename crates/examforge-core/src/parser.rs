//! TOML content pack parser.
//!
//! Loads content packs from TOML files and directories, and validates them.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::generators::Registry;
use crate::hydrate::static_body;
use crate::model::{Entry, EntryType, Pack, PoolEntry, QuestionBody};
use crate::rng::SeededRng;

/// Intermediate TOML structure for pack files.
#[derive(Debug, Deserialize)]
struct TomlPackFile {
    pack: TomlPackHeader,
    #[serde(default)]
    questions: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct TomlPackHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default = "default_true")]
    enabled: bool,
}

fn default_true() -> bool {
    true
}

/// Parse a single TOML file into a [`Pack`].
pub fn parse_pack(path: &Path) -> Result<Pack> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read pack file: {}", path.display()))?;

    parse_pack_str(&content, path)
}

/// Parse a TOML string into a [`Pack`] (useful for testing).
pub fn parse_pack_str(content: &str, source_path: &Path) -> Result<Pack> {
    let parsed: TomlPackFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    if parsed.pack.id.trim().is_empty() {
        anyhow::bail!("pack id is empty: {}", source_path.display());
    }

    Ok(Pack {
        id: parsed.pack.id,
        name: parsed.pack.name,
        description: parsed.pack.description,
        enabled: parsed.pack.enabled,
        questions: parsed.questions,
    })
}

/// Recursively load all `.toml` pack files from a directory, in path order.
///
/// Files that fail to parse are skipped with a warning.
pub fn load_pack_directory(dir: &Path) -> Result<Vec<Pack>> {
    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        paths.push(entry?.path());
    }
    paths.sort();

    let mut packs = Vec::new();
    for path in paths {
        if path.is_dir() {
            packs.extend(load_pack_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_pack(&path) {
                Ok(pack) => packs.push(pack),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(packs)
}

/// Every loaded pack, in load order. Pack ids are unique.
#[derive(Debug, Clone, Default)]
pub struct ContentLibrary {
    packs: Vec<Pack>,
}

impl ContentLibrary {
    /// Build a library, dropping packs whose id was already seen.
    pub fn new(packs: Vec<Pack>) -> Self {
        let mut seen = HashSet::new();
        let packs = packs
            .into_iter()
            .filter(|p| {
                let fresh = seen.insert(p.id.clone());
                if !fresh {
                    tracing::warn!(pack_id = %p.id, "duplicate pack id, keeping the first");
                }
                fresh
            })
            .collect();
        Self { packs }
    }

    /// Load every pack under `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let packs = load_pack_directory(dir)?;
        tracing::info!(dir = %dir.display(), packs = packs.len(), "content loaded");
        Ok(Self::new(packs))
    }

    pub fn packs(&self) -> &[Pack] {
        &self.packs
    }

    pub fn pack(&self, id: &str) -> Option<&Pack> {
        self.packs.iter().find(|p| p.id == id)
    }

    /// Ids of packs that are on in a fresh installation.
    pub fn default_enabled(&self) -> Vec<String> {
        self.packs
            .iter()
            .filter(|p| p.enabled)
            .map(|p| p.id.clone())
            .collect()
    }

    /// Selection universe: entries of enabled packs, minus fun-only
    /// entries unless fun mode is on.
    pub fn pool(&self, enabled_packs: &[String], fun_mode: bool) -> Vec<PoolEntry<'_>> {
        self.packs
            .iter()
            .filter(|p| enabled_packs.contains(&p.id))
            .flat_map(|p| {
                p.questions.iter().map(move |entry| PoolEntry {
                    pack_id: &p.id,
                    entry,
                })
            })
            .filter(|c| fun_mode || !c.entry.fun_only)
            .collect()
    }
}

/// A warning from pack validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    pub pack_id: String,
    /// Static id, template id, or entry position, when the warning concerns one entry.
    pub question: Option<String>,
    pub message: String,
}

/// Validate a pack for common content issues.
pub fn validate_pack(pack: &Pack, registry: &Registry) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let mut warn = |question: Option<String>, message: String| {
        warnings.push(ValidationWarning {
            pack_id: pack.id.clone(),
            question,
            message,
        })
    };

    if pack.questions.is_empty() {
        warn(None, "pack has no questions".into());
    }

    let mut seen_ids = HashSet::new();
    for (i, entry) in pack.questions.iter().enumerate() {
        let label = entry
            .id
            .clone()
            .or_else(|| entry.template_id.clone())
            .unwrap_or_else(|| format!("#{}", i + 1));
        let here = || Some(label.clone());

        if let Some(id) = &entry.id {
            if !seen_ids.insert(id.as_str()) {
                warn(here(), format!("duplicate question id: {id}"));
            }
        }

        if let EntryType::Other(kind) = &entry.kind {
            warn(here(), format!("unknown question type '{kind}', will score zero"));
        }

        match &entry.template_id {
            Some(template_id) => match registry.get(template_id) {
                None => warn(here(), format!("no generator registered for '{template_id}'")),
                Some(generator) => {
                    let mut rng = SeededRng::new(format!("validate:{template_id}"));
                    if let Err(e) = generator(entry, &mut rng) {
                        warn(here(), format!("generator fails: {e}"));
                    }
                }
            },
            None => {
                if entry.prompt.as_deref().map_or(true, |p| p.trim().is_empty()) {
                    warn(here(), "prompt is empty".into());
                }
                if entry.kind.known().is_some() {
                    for message in payload_problems(entry) {
                        warn(here(), message);
                    }
                }
            }
        }
    }

    warnings
}

/// Validate every pack in a library, including cross-pack id clashes.
pub fn validate_library(library: &ContentLibrary, registry: &Registry) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let mut owners: std::collections::HashMap<&str, &str> = std::collections::HashMap::new();

    for pack in library.packs() {
        warnings.extend(validate_pack(pack, registry));
        let ids: HashSet<&str> = pack.questions.iter().filter_map(|e| e.id.as_deref()).collect();
        for id in ids {
            if let Some(owner) = owners.insert(id, &pack.id) {
                warnings.push(ValidationWarning {
                    pack_id: pack.id.clone(),
                    question: Some(id.to_string()),
                    message: format!("question id also used in pack '{owner}'"),
                });
            }
        }
    }

    warnings
}

/// Shape problems of a static entry's answer payload.
fn payload_problems(entry: &Entry) -> Vec<String> {
    let mut problems = Vec::new();
    match static_body(entry) {
        QuestionBody::Unscorable { declared_type } => {
            problems.push(format!("missing or malformed answer payload for type '{declared_type}'"));
        }
        QuestionBody::SingleChoice { choices, answer } => {
            if answer >= choices.len() {
                problems.push(format!("answer index {answer} out of range ({} choices)", choices.len()));
            }
        }
        QuestionBody::MultiChoice { choices, answer } => {
            if answer.is_empty() {
                problems.push("multi-choice answer set is empty".into());
            }
            if let Some(bad) = answer.iter().find(|i| **i >= choices.len()) {
                problems.push(format!("answer index {bad} out of range ({} choices)", choices.len()));
            }
        }
        QuestionBody::Ordering {
            items,
            correct_order,
        } => {
            let mut sorted = correct_order.clone();
            sorted.sort_unstable();
            if sorted != (0..items.len()).collect::<Vec<_>>() {
                problems.push(format!(
                    "correct_order is not a permutation of {} items",
                    items.len()
                ));
            }
        }
        QuestionBody::Matching {
            left,
            right,
            answer,
        } => {
            if answer.len() != left.len() {
                problems.push(format!(
                    "match answer has {} entries for {} left items",
                    answer.len(),
                    left.len()
                ));
            }
            if let Some(bad) = answer.iter().find(|i| **i >= right.len()) {
                problems.push(format!("match index {bad} out of range ({} right items)", right.len()));
            }
        }
        QuestionBody::FreeText { answer, .. } => {
            if answer.trim().is_empty() {
                problems.push("free-text answer is empty".into());
            }
        }
        QuestionBody::Numeric { tolerance, .. } | QuestionBody::MultiNumeric { tolerance, .. } => {
            if tolerance < 0.0 {
                problems.push(format!("tolerance {tolerance} is negative"));
            }
        }
    }
    problems
}
