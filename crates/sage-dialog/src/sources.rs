//! Collaborator traits for the external services the engine depends on.
//!
//! Each external system is modeled as a narrow capability trait so the
//! controller can be exercised against in-memory fakes without any network
//! dependency. HTTP details, OAuth, and token persistence all live behind
//! these seams.

use std::collections::HashMap;

use async_trait::async_trait;

use sage_core::{CalendarEvent, Result, SageError};

/// Source of the user's notes.
#[async_trait]
pub trait NoteSource: Send + Sync {
    /// All note titles, in the source's order. May be empty.
    async fn list_titles(&self) -> Result<Vec<String>>;

    /// Content of the note with the given title.
    ///
    /// Fails with [`SageError::NoteNotFound`] if no such title exists.
    async fn fetch_content(&self, title: &str) -> Result<String>;
}

/// Source of upcoming calendar events.
#[async_trait]
pub trait CalendarSource: Send + Sync {
    /// Upcoming events that may relate to `subject_hint`.
    ///
    /// Returned unfiltered; relevance scoring is the matcher's job.
    async fn search_events(&self, subject_hint: &str) -> Result<Vec<CalendarEvent>>;
}

/// Content moderation service.
#[async_trait]
pub trait Moderator: Send + Sync {
    /// Whether `text` is flagged as unsafe.
    async fn moderate(&self, text: &str) -> Result<bool>;
}

/// Text generation service.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate output for `prompt`. Single request/response, no retry here.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Administrative notification channel.
///
/// Best-effort and fire-and-forget: implementations swallow their own
/// delivery failures.
#[async_trait]
pub trait AdminNotifier: Send + Sync {
    async fn notify(&self, message: &str);
}

// =============================================================================
// In-memory implementations
// =============================================================================

/// In-memory [`NoteSource`] backed by a title -> content map.
///
/// Used by the demo binary and tests.
pub struct StaticNoteSource {
    titles: Vec<String>,
    notes: HashMap<String, String>,
}

impl StaticNoteSource {
    /// Build from `(title, content)` pairs, preserving order.
    pub fn new(notes: Vec<(String, String)>) -> Self {
        let titles = notes.iter().map(|(t, _)| t.clone()).collect();
        let notes = notes.into_iter().collect();
        Self { titles, notes }
    }

    /// An empty note source.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl NoteSource for StaticNoteSource {
    async fn list_titles(&self) -> Result<Vec<String>> {
        Ok(self.titles.clone())
    }

    async fn fetch_content(&self, title: &str) -> Result<String> {
        self.notes
            .get(title)
            .cloned()
            .ok_or_else(|| SageError::NoteNotFound(title.to_string()))
    }
}

/// In-memory [`CalendarSource`] returning a fixed event list.
pub struct StaticCalendarSource {
    events: Vec<CalendarEvent>,
}

impl StaticCalendarSource {
    pub fn new(events: Vec<CalendarEvent>) -> Self {
        Self { events }
    }
}

#[async_trait]
impl CalendarSource for StaticCalendarSource {
    async fn search_events(&self, _subject_hint: &str) -> Result<Vec<CalendarEvent>> {
        Ok(self.events.clone())
    }
}
