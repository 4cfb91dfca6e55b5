use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;

use examforge_core::attempt::Attempt;
use examforge_core::model::{Difficulty, Domain, Mode, Question, QuestionBody};
use examforge_core::scoring::{score_question, ScoreOptions};
use examforge_core::settings::Blueprint;
use examforge_core::statistics::score_attempt;

fn question(id: usize, body: QuestionBody) -> Question {
    let domain = Domain::ALL[id % Domain::ALL.len()];
    Question {
        id: format!("q{id}"),
        pack_id: "bench".into(),
        template_id: None,
        domain,
        domain_name: domain.name().into(),
        difficulty: Difficulty::ALL[id % Difficulty::ALL.len()],
        prompt: format!("Question {id}"),
        body,
        unit_hint: None,
        explanation: String::new(),
        steps: vec![],
        tags: vec![],
        fun_only: false,
        variant: None,
    }
}

fn bodies() -> Vec<QuestionBody> {
    vec![
        QuestionBody::SingleChoice {
            choices: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            answer: 2,
        },
        QuestionBody::MultiChoice {
            choices: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            answer: vec![0, 2],
        },
        QuestionBody::Numeric {
            answer: 950.0,
            tolerance: 0.02,
            relative_tolerance: None,
        },
        QuestionBody::FreeText {
            answer: "W-4".into(),
            acceptable: vec![vec!["Form W-4".into(), "W4".into()]],
        },
        QuestionBody::Ordering {
            items: (0..5).map(|i| format!("step {i}")).collect(),
            correct_order: vec![0, 1, 2, 3, 4],
        },
        QuestionBody::MultiNumeric {
            answer: vec![800.0, 176.0, 624.0],
            tolerance: 0.01,
        },
    ]
}

fn bench_score_question(c: &mut Criterion) {
    let mut group = c.benchmark_group("score_question");
    let partial = ScoreOptions {
        partial_credit: true,
    };

    let msq = question(0, bodies().remove(1));
    group.bench_function("msq_partial", |b| {
        b.iter(|| score_question(black_box(&msq), black_box(&json!([0, 1, 2])), partial))
    });

    let fill = question(0, bodies().remove(3));
    group.bench_function("fill_synonym", |b| {
        b.iter(|| {
            score_question(
                black_box(&fill),
                black_box(&json!("  form   w-4 ")),
                ScoreOptions::default(),
            )
        })
    });

    let order = question(0, bodies().remove(4));
    group.bench_function("order_partial", |b| {
        b.iter(|| score_question(black_box(&order), black_box(&json!([0, 2, 1, 3, 4])), partial))
    });

    group.finish();
}

fn bench_score_attempt(c: &mut Criterion) {
    let mut group = c.benchmark_group("score_attempt");

    for size in [30usize, 150] {
        let mut attempt = Attempt::new(Mode::Timed, "bench", Blueprint::default());
        attempt.questions = (0..size)
            .map(|i| question(i, bodies().swap_remove(i % 6)))
            .collect();
        for q in &attempt.questions {
            attempt
                .responses
                .insert(q.id.clone(), q.body.answer_value());
        }

        group.bench_function(format!("{size}_questions"), |b| {
            b.iter(|| score_attempt(black_box(&attempt), ScoreOptions::default(), 70))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_score_question, bench_score_attempt);
criterion_main!(benches);
