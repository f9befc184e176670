//! Benchmark for subject-to-event matching.
//!
//! Matching runs once per plan flow against the user's upcoming events, so
//! the interesting axis is the event-list size. A personal calendar rarely
//! exceeds a few hundred upcoming events; 1,000 gives headroom.

use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion};

use sage_core::CalendarEvent;
use sage_dialog::SubjectMatcher;

const SUBJECTS: &[&str] = &["Data Science", "Biology", "Linear Algebra II"];

/// Event summaries cycling through realistic exam, class, and noise titles.
fn generate_events(count: usize) -> Vec<CalendarEvent> {
    let templates = [
        "DS Midterm",
        "Biology Quiz",
        "Bio Exam",
        "History Final",
        "Linear Algebra Lecture",
        "Dentist appointment",
        "Chemistry Lab",
        "Team standup",
    ];
    (0..count)
        .map(|i| {
            let start = format!("2099-{:02}-{:02}", (i / 28) % 12 + 1, i % 28 + 1);
            CalendarEvent {
                id: format!("evt-{}", i),
                summary: format!("{} {}", templates[i % templates.len()], i),
                start_iso: start.clone(),
                end_iso: start,
            }
        })
        .collect()
}

fn bench_rank(c: &mut Criterion) {
    let matcher = SubjectMatcher::new(0.2, 6);

    let mut group = c.benchmark_group("matcher_rank");
    group.sample_size(100);
    group.measurement_time(Duration::from_secs(10));

    for count in [10usize, 100, 1_000] {
        let events = generate_events(count);
        group.bench_function(format!("rank_{}events", count), |b| {
            b.iter(|| {
                for subject in SUBJECTS {
                    let ranked = matcher.rank(subject, &events);
                    std::hint::black_box(ranked);
                }
            });
        });
    }

    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let matcher = SubjectMatcher::new(0.2, 6);
    let events = generate_events(100);

    let mut group = c.benchmark_group("matcher_resolve");
    group.sample_size(100);
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("resolve_100events", |b| {
        b.iter(|| {
            let outcome = matcher.resolve("Data Science", &events);
            std::hint::black_box(outcome)
        });
    });

    group.finish();
}

criterion_group!(benches, bench_rank, bench_resolve);
criterion_main!(benches);
