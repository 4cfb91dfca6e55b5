//! Question hydration.
//!
//! Merges a pool entry with its generator output (generated fields win,
//! static fields fill the gaps) into a self-contained [`Question`].

use crate::generators::{GeneratedBody, Registry};
use crate::model::{Entry, EntryType, PoolEntry, Question, QuestionBody, QuestionType};
use crate::rng::SeededRng;

/// Hydrate one pool entry for the given slot.
///
/// Template entries draw from `rng`; static entries do not touch it.
/// Missing or failing generators produce a labelled placeholder instead of
/// an error.
pub fn hydrate(
    candidate: &PoolEntry<'_>,
    registry: &Registry,
    rng: &mut SeededRng,
    slot: usize,
) -> Question {
    let entry = candidate.entry;
    let Some(template_id) = entry.template_id.as_deref() else {
        return hydrate_static(candidate, slot);
    };

    let Some(generator) = registry.get(template_id) else {
        tracing::warn!(template_id, "no generator registered, using placeholder");
        return placeholder(
            candidate,
            format!("{template_id}:{slot}"),
            "Template generator missing.",
            "No generator available.",
        );
    };

    let generated = match generator(entry, rng) {
        Ok(generated) => generated,
        Err(e) => {
            tracing::warn!(template_id, error = %e, "generator failed, using placeholder");
            return placeholder(
                candidate,
                format!("{template_id}:{slot}"),
                "Template generator failed.",
                &e.to_string(),
            );
        }
    };

    let salt = (rng.next_f64() * 1e6).floor() as u64;
    let id = format!("{template_id}:{slot}:{salt}");
    merge(candidate, id, generated)
}

/// Id a static entry hydrates to. Entries without an explicit id are
/// made unique per slot.
pub fn static_id(candidate: &PoolEntry<'_>, slot: usize) -> String {
    candidate
        .entry
        .id
        .clone()
        .unwrap_or_else(|| format!("{}:static:{slot}", candidate.pack_id))
}

/// Answer payload a static entry hydrates to, without logging.
pub fn static_body(entry: &Entry) -> QuestionBody {
    build_body(&entry.kind, Fields::from_entry(entry))
}

fn hydrate_static(candidate: &PoolEntry<'_>, slot: usize) -> Question {
    let entry = candidate.entry;
    let body = static_body(entry);
    if let QuestionBody::Unscorable { declared_type } = &body {
        tracing::warn!(
            id = entry.id.as_deref().unwrap_or("?"),
            declared_type,
            "static question has no usable answer payload"
        );
    }
    Question {
        id: static_id(candidate, slot),
        pack_id: candidate.pack_id.to_string(),
        template_id: None,
        domain: entry.domain,
        domain_name: entry.domain.name().to_string(),
        difficulty: entry.difficulty,
        prompt: entry.prompt.clone().unwrap_or_default(),
        body,
        unit_hint: entry.unit_hint.clone(),
        explanation: entry.explanation.clone().unwrap_or_default(),
        steps: entry.steps.clone().unwrap_or_default(),
        tags: entry.tags.clone(),
        fun_only: entry.fun_only,
        variant: None,
    }
}

fn merge(candidate: &PoolEntry<'_>, id: String, generated: GeneratedBody) -> Question {
    let entry = candidate.entry;
    let static_fields = Fields::from_entry(entry);
    let fields = Fields {
        choices: generated.choices.or(static_fields.choices),
        answer: generated.answer.or(static_fields.answer),
        tolerance: generated.tolerance.or(static_fields.tolerance),
        relative_tolerance: generated
            .relative_tolerance
            .or(static_fields.relative_tolerance),
        acceptable: static_fields.acceptable,
        items: generated.items.or(static_fields.items),
        left: generated.left.or(static_fields.left),
        right: generated.right.or(static_fields.right),
        correct_order: generated.correct_order.or(static_fields.correct_order),
    };

    Question {
        id,
        pack_id: candidate.pack_id.to_string(),
        template_id: entry.template_id.clone(),
        domain: entry.domain,
        domain_name: entry.domain.name().to_string(),
        difficulty: entry.difficulty,
        prompt: generated.prompt,
        body: build_body(&entry.kind, fields),
        unit_hint: generated.unit_hint.or_else(|| entry.unit_hint.clone()),
        explanation: generated
            .explanation
            .or_else(|| entry.explanation.clone())
            .unwrap_or_default(),
        steps: generated
            .steps
            .or_else(|| entry.steps.clone())
            .unwrap_or_default(),
        tags: entry.tags.clone(),
        fun_only: entry.fun_only,
        variant: generated.variant,
    }
}

fn placeholder(
    candidate: &PoolEntry<'_>,
    id: String,
    prompt: &str,
    explanation: &str,
) -> Question {
    let entry = candidate.entry;
    Question {
        id,
        pack_id: candidate.pack_id.to_string(),
        template_id: entry.template_id.clone(),
        domain: entry.domain,
        domain_name: entry.domain.name().to_string(),
        difficulty: entry.difficulty,
        prompt: prompt.to_string(),
        body: QuestionBody::Unscorable {
            declared_type: entry.kind.to_string(),
        },
        unit_hint: None,
        explanation: explanation.to_string(),
        steps: Vec::new(),
        tags: entry.tags.clone(),
        fun_only: entry.fun_only,
        variant: None,
    }
}

/// Answer-bearing fields gathered from an entry and/or a generator.
struct Fields {
    choices: Option<Vec<String>>,
    answer: Option<crate::model::Answer>,
    tolerance: Option<f64>,
    relative_tolerance: Option<f64>,
    acceptable: Option<Vec<Vec<String>>>,
    items: Option<Vec<String>>,
    left: Option<Vec<String>>,
    right: Option<Vec<String>>,
    correct_order: Option<Vec<usize>>,
}

impl Fields {
    fn from_entry(entry: &Entry) -> Self {
        Self {
            choices: entry.choices.clone(),
            answer: entry.answer.clone(),
            tolerance: entry.tolerance,
            relative_tolerance: entry.relative_tolerance,
            acceptable: entry.acceptable.clone(),
            items: entry.items.clone(),
            left: entry.left.clone(),
            right: entry.right.clone(),
            correct_order: entry.correct_order.clone(),
        }
    }
}

fn build_body(kind: &EntryType, f: Fields) -> QuestionBody {
    let unscorable = || QuestionBody::Unscorable {
        declared_type: kind.to_string(),
    };
    let Some(kind) = kind.known() else {
        return unscorable();
    };
    let answer = f.answer.as_ref();

    let body = match kind {
        QuestionType::Mcq => f
            .choices
            .zip(answer.and_then(|a| a.as_index()))
            .map(|(choices, answer)| QuestionBody::SingleChoice { choices, answer }),
        QuestionType::Msq => f
            .choices
            .zip(answer.and_then(|a| a.as_indices()))
            .map(|(choices, answer)| QuestionBody::MultiChoice { choices, answer }),
        QuestionType::Numeric => answer.and_then(|a| a.as_number()).map(|answer| {
            QuestionBody::Numeric {
                answer,
                tolerance: f.tolerance.unwrap_or(0.0),
                relative_tolerance: f.relative_tolerance,
            }
        }),
        QuestionType::Fill => {
            let acceptable = f.acceptable.unwrap_or_default();
            answer
                .and_then(|a| a.as_text())
                .or_else(|| acceptable.first().and_then(|g| g.first()).cloned())
                .map(|answer| QuestionBody::FreeText { answer, acceptable })
        }
        QuestionType::Order => f
            .items
            .zip(
                f.correct_order
                    .or_else(|| answer.and_then(|a| a.as_indices())),
            )
            .map(|(items, correct_order)| QuestionBody::Ordering {
                items,
                correct_order,
            }),
        QuestionType::Match => match (f.left, f.right, answer.and_then(|a| a.as_indices())) {
            (Some(left), Some(right), Some(answer)) => {
                Some(QuestionBody::Matching { left, right, answer })
            }
            _ => None,
        },
        QuestionType::MultiNumeric => answer.and_then(|a| a.as_numbers()).map(|answer| {
            QuestionBody::MultiNumeric {
                answer,
                tolerance: f.tolerance.unwrap_or(0.0),
            }
        }),
    };

    body.unwrap_or_else(unscorable)
}
