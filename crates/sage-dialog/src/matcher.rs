//! Subject-to-event fuzzy matching.
//!
//! Correlates a free-text subject name (a note title, typed by a human)
//! with calendar event summaries (typed by a possibly different human).
//! Neither exact matching nor raw string similarity alone is robust: exam
//! titles abbreviate ("DS Midterm" for "Data Science") and reorder, so the
//! score blends token overlap with a character-sequence ratio.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use sage_core::{CalendarEvent, ExamCandidate};

/// Weight of the token-overlap signal in the combined score.
const TOKEN_WEIGHT: f64 = 0.5;
/// Weight of the character-sequence signal in the combined score.
const SEQUENCE_WEIGHT: f64 = 0.5;

/// Word tokens: runs of lowercase letters and digits.
static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z0-9]+").expect("Invalid token regex"));

/// How a subject resolved against the calendar.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// Nothing qualified; the flow falls back to a manually typed date.
    NoMatch,
    /// Exactly one qualifying event; auto-selected without prompting.
    Single(ExamCandidate),
    /// Two or more qualifying events; the user disambiguates. Capped at
    /// the configured maximum, best scores first.
    Ambiguous(Vec<ExamCandidate>),
}

/// Scores calendar events against a subject string.
pub struct SubjectMatcher {
    /// Minimum combined score for an event to qualify.
    pub min_score: f64,
    /// Maximum number of candidates offered for disambiguation.
    pub max_choices: usize,
}

impl SubjectMatcher {
    pub fn new(min_score: f64, max_choices: usize) -> Self {
        Self {
            min_score,
            max_choices,
        }
    }

    /// Rank `events` against `subject`.
    ///
    /// Returns every event whose combined score reaches `min_score`,
    /// sorted descending by score with ties broken by earliest `start_iso`.
    /// Deterministic for identical input.
    pub fn rank(&self, subject: &str, events: &[CalendarEvent]) -> Vec<ExamCandidate> {
        let subject_tokens = tokenize(subject);
        let normalized_subject = subject_tokens.join(" ");
        let mut subject_set: BTreeSet<String> = subject_tokens.iter().cloned().collect();
        // Exam titles often abbreviate multi-word subjects to an acronym
        // ("Data Science" -> "DS"), so the acronym joins the token set.
        if subject_tokens.len() > 1 {
            let acronym: String = subject_tokens
                .iter()
                .filter_map(|t| t.chars().next())
                .collect();
            subject_set.insert(acronym);
        }

        let mut candidates: Vec<ExamCandidate> = events
            .iter()
            .filter_map(|event| {
                let score = combined_score(&subject_set, &normalized_subject, &event.summary);
                if score >= self.min_score {
                    Some(ExamCandidate {
                        event: event.clone(),
                        score,
                    })
                } else {
                    None
                }
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.event.start_iso.cmp(&b.event.start_iso))
        });
        candidates
    }

    /// Rank and route: 0 candidates, 1 candidate, or a capped choice list.
    pub fn resolve(&self, subject: &str, events: &[CalendarEvent]) -> MatchOutcome {
        let mut ranked = self.rank(subject, events);
        match ranked.len() {
            0 => MatchOutcome::NoMatch,
            1 => MatchOutcome::Single(ranked.remove(0)),
            _ => {
                ranked.truncate(self.max_choices);
                MatchOutcome::Ambiguous(ranked)
            }
        }
    }
}

/// Blend of fuzzy token overlap and normalized edit-distance similarity.
fn combined_score(subject_set: &BTreeSet<String>, normalized_subject: &str, summary: &str) -> f64 {
    let summary_tokens = tokenize(summary);
    let normalized_summary = summary_tokens.join(" ");
    let summary_set: BTreeSet<String> = summary_tokens.into_iter().collect();

    let token_score = fuzzy_jaccard(subject_set, &summary_set);
    let sequence_score = strsim::normalized_levenshtein(normalized_subject, &normalized_summary);

    TOKEN_WEIGHT * token_score + SEQUENCE_WEIGHT * sequence_score
}

/// Jaccard overlap where tokens match exactly or by a prefix relationship.
///
/// Each summary token is consumed at most once; iteration over the sorted
/// sets keeps the pairing deterministic.
fn fuzzy_jaccard(subject: &BTreeSet<String>, summary: &BTreeSet<String>) -> f64 {
    let mut used: BTreeSet<&str> = BTreeSet::new();
    let mut matches = 0usize;

    for a in subject {
        for b in summary {
            if used.contains(b.as_str()) {
                continue;
            }
            if tokens_match(a, b) {
                matches += 1;
                used.insert(b);
                break;
            }
        }
    }

    let union = subject.len() + summary.len() - matches;
    if union == 0 {
        0.0
    } else {
        matches as f64 / union as f64
    }
}

/// Exact, or one token is a prefix of the other ("bio" vs "biology").
///
/// The prefix rule needs both tokens at length 3 or more so short tokens
/// like "a" or "of" cannot latch onto everything.
fn tokens_match(a: &str, b: &str) -> bool {
    a == b || (a.len() >= 3 && b.len() >= 3 && (a.starts_with(b) || b.starts_with(a)))
}

/// Lowercased word tokens in input order; punctuation is dropped.
fn tokenize(s: &str) -> Vec<String> {
    TOKEN_RE
        .find_iter(&s.to_lowercase())
        .map(|m| m.as_str().to_string())
        .collect()
}
