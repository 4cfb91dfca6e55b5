//! Stratified question selection.
//!
//! Targets per domain, difficulty and type are allocated up front. Each slot
//! then takes the first key with a remaining target in each dimension, looks
//! for a candidate matching all three, relaxes to domain-only, and finally
//! falls back to the whole pool.

use std::collections::{BTreeMap, BTreeSet};

use crate::allocator::allocate;
use crate::error::EngineError;
use crate::generators::Registry;
use crate::hydrate::{hydrate, static_id};
use crate::model::{Difficulty, Domain, Mode, PoolEntry, Question, QuestionType};
use crate::profiler::WeaknessProfile;
use crate::rng::SeededRng;
use crate::settings::{drill_type_mix, Blueprint};

/// Targets used when every key of a dimension is exhausted.
const FALLBACK_DOMAIN: Domain = Domain::Calculations;
const FALLBACK_DIFFICULTY: Difficulty = Difficulty::Medium;
const FALLBACK_TYPE: QuestionType = QuestionType::Mcq;

/// Inputs of one selection run besides the pool and RNG.
#[derive(Debug, Clone, Copy)]
pub struct SelectionRequest<'a> {
    pub mode: Mode,
    pub blueprint: &'a Blueprint,
    /// Domains chosen for domain-focus mode.
    pub domain_selection: &'a [Domain],
    /// Profile merged into the weights in weakness mode.
    pub weakness: Option<&'a WeaknessProfile>,
}

impl<'a> SelectionRequest<'a> {
    pub fn new(mode: Mode, blueprint: &'a Blueprint) -> Self {
        Self {
            mode,
            blueprint,
            domain_selection: &[],
            weakness: None,
        }
    }
}

/// Weight maps after mode adjustments.
#[derive(Debug, Clone, PartialEq)]
pub struct Weights {
    pub domains: BTreeMap<Domain, f64>,
    pub difficulties: BTreeMap<Difficulty, f64>,
    pub types: BTreeMap<QuestionType, f64>,
}

/// Apply mode-specific adjustments to a copy of the blueprint weights.
///
/// * drills: the type mix is replaced by the numeric-heavy drill mix;
/// * domain: selected domains get weight 1, all others 0;
/// * weakness: profile weights act as floors (`max` merge).
pub fn effective_weights(request: &SelectionRequest<'_>) -> Weights {
    let mut blueprint = request.blueprint.clone();

    match request.mode {
        Mode::Drills => blueprint.type_mix = drill_type_mix(),
        Mode::Domain if !request.domain_selection.is_empty() => {
            blueprint.domain_weights = Domain::ALL
                .into_iter()
                .map(|d| {
                    let weight = if request.domain_selection.contains(&d) { 1.0 } else { 0.0 };
                    (d, weight)
                })
                .collect();
        }
        Mode::Weakness => {
            if let Some(profile) = request.weakness {
                profile.apply_to(&mut blueprint);
            }
        }
        _ => {}
    }

    Weights {
        domains: blueprint.domain_weights,
        difficulties: blueprint.difficulty_mix,
        types: blueprint.type_mix,
    }
}

/// Select and hydrate the question sequence for an attempt.
///
/// Returns exactly `blueprint.questions_for(mode)` questions unless the pool
/// runs out of unused static entries, in which case the slot is dropped with
/// a warning. Fails only when the pool is empty.
pub fn select_questions(
    pool: &[PoolEntry<'_>],
    registry: &Registry,
    rng: &mut SeededRng,
    request: &SelectionRequest<'_>,
) -> Result<Vec<Question>, EngineError> {
    if pool.is_empty() {
        return Err(EngineError::EmptyPool {
            enabled_packs: Vec::new(),
        });
    }

    let total = request.blueprint.questions_for(request.mode);
    let weights = effective_weights(request);
    let mut domain_targets = allocate(&weights.domains, total, rng);
    let mut difficulty_targets = allocate(&weights.difficulties, total, rng);
    let mut type_targets = allocate(&weights.types, total, rng);

    let mut picked: Vec<Question> = Vec::with_capacity(total);
    let mut used: BTreeSet<String> = BTreeSet::new();

    for slot in 0..total {
        let domain = first_open(&Domain::ALL, &domain_targets).unwrap_or(FALLBACK_DOMAIN);
        let difficulty =
            first_open(&Difficulty::ALL, &difficulty_targets).unwrap_or(FALLBACK_DIFFICULTY);
        let kind = first_open(&QuestionType::ALL, &type_targets).unwrap_or(FALLBACK_TYPE);
        let domain_open = remaining(&domain_targets, &domain) > 0;

        let fresh = |c: &&PoolEntry<'_>| c.entry.is_template() || !used.contains(&static_id(c, slot));

        let mut candidates: Vec<&PoolEntry<'_>> = Vec::new();
        if domain_open {
            candidates = pool
                .iter()
                .filter(fresh)
                .filter(|c| {
                    c.entry.domain == domain
                        && c.entry.difficulty == difficulty
                        && c.entry.kind.known() == Some(kind)
                })
                .collect();
            if candidates.is_empty() {
                tracing::debug!(slot, %domain, %difficulty, %kind, "no exact match, relaxing to domain");
                candidates = pool
                    .iter()
                    .filter(fresh)
                    .filter(|c| c.entry.domain == domain)
                    .collect();
            }
        }
        if candidates.is_empty() {
            tracing::debug!(slot, %domain, "falling back to whole pool");
            candidates = pool.iter().filter(fresh).collect();
        }

        match rng.pick(&candidates) {
            Ok(candidate) => {
                let question = hydrate(candidate, registry, rng, slot);
                if used.insert(question.id.clone()) {
                    tracing::debug!(slot, id = %question.id, "slot filled");
                    picked.push(question);
                } else {
                    tracing::warn!(slot, id = %question.id, "duplicate question id, slot dropped");
                }
            }
            Err(_) => {
                tracing::warn!(slot, "pool exhausted, slot dropped");
            }
        }

        decrement(&mut domain_targets, &domain);
        decrement(&mut difficulty_targets, &difficulty);
        decrement(&mut type_targets, &kind);
    }

    if picked.len() < total {
        tracing::warn!(
            requested = total,
            selected = picked.len(),
            "attempt is shorter than requested"
        );
    }
    Ok(picked)
}

fn first_open<K: Ord + Copy>(order: &[K], targets: &BTreeMap<K, usize>) -> Option<K> {
    order.iter().copied().find(|k| remaining(targets, k) > 0)
}

fn remaining<K: Ord>(targets: &BTreeMap<K, usize>, key: &K) -> usize {
    targets.get(key).copied().unwrap_or(0)
}

fn decrement<K: Ord>(targets: &mut BTreeMap<K, usize>, key: &K) {
    if let Some(count) = targets.get_mut(key) {
        *count = count.saturating_sub(1);
    }
}
