//! Conversation orchestration engine for the Sage study companion.
//!
//! Drives the per-user state machine behind the summary and study-plan
//! flows: session tracking, per-user throttling, fuzzy matching of subjects
//! against calendar events, moderation gating, and chunked delivery of
//! generated output. External services are reached through narrow async
//! traits so the engine runs against fakes in tests.

pub mod controller;
pub mod error;
pub mod matcher;
pub mod moderation;
pub mod prompts;
pub mod rate_limit;
pub mod session;
pub mod sources;

pub use controller::DialogController;
pub use error::DialogError;
pub use matcher::{MatchOutcome, SubjectMatcher};
pub use moderation::{KeywordModerator, ModerationGate};
pub use rate_limit::RateLimiter;
pub use session::{DialogState, FlowKind, SessionStore, UserSession};
pub use sources::{
    AdminNotifier, CalendarSource, Generator, Moderator, NoteSource, StaticCalendarSource,
    StaticNoteSource,
};
