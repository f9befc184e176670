//! Domain and transport types shared across the Sage crates.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier of one end user on the transport.
pub type UserId = i64;

/// A note fetched from the external note source.
///
/// Read-only snapshot held for the duration of one flow; never cached
/// beyond it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub title: String,
    pub content: String,
}

/// A calendar event returned by the external calendar source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub summary: String,
    /// Event start as an ISO 8601 date or datetime string.
    pub start_iso: String,
    /// Event end as an ISO 8601 date or datetime string.
    pub end_iso: String,
}

impl CalendarEvent {
    /// Parse the calendar date from `start_iso`.
    ///
    /// Accepts both plain dates (`2025-05-01`) and datetimes
    /// (`2025-05-01T09:00:00Z`); returns None for anything else.
    pub fn start_date(&self) -> Option<NaiveDate> {
        let date_part = self.start_iso.get(..10)?;
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
    }
}

/// A calendar event scored as a plausible match for a subject.
///
/// Derived during matching, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamCandidate {
    pub event: CalendarEvent,
    /// Combined match score in [0, 1].
    pub score: f64,
}

/// An inbound transport event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// A slash command, name given without the leading slash.
    Command { user_id: UserId, name: String },
    /// A button press carrying the choice id it was created with.
    Callback { user_id: UserId, choice_id: String },
    /// A plain text message.
    Text { user_id: UserId, text: String },
}

impl Event {
    /// The user this event belongs to.
    pub fn user_id(&self) -> UserId {
        match self {
            Event::Command { user_id, .. }
            | Event::Callback { user_id, .. }
            | Event::Text { user_id, .. } => *user_id,
        }
    }
}

/// One selectable choice offered to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    /// Human-readable button label.
    pub label: String,
    /// Opaque id echoed back in the corresponding [`Event::Callback`].
    pub choice_id: String,
}

/// An outbound transport action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reply {
    /// Plain text sent to the user.
    Text { user_id: UserId, text: String },
    /// Text accompanied by a list of tappable choices.
    Choices {
        user_id: UserId,
        text: String,
        choices: Vec<Choice>,
    },
}

impl Reply {
    /// Construct a plain text reply.
    pub fn text(user_id: UserId, text: impl Into<String>) -> Self {
        Reply::Text {
            user_id,
            text: text.into(),
        }
    }

    /// Construct a choices reply.
    pub fn choices(user_id: UserId, text: impl Into<String>, choices: Vec<Choice>) -> Self {
        Reply::Choices {
            user_id,
            text: text.into(),
            choices,
        }
    }

    /// The user this reply is addressed to.
    pub fn user_id(&self) -> UserId {
        match self {
            Reply::Text { user_id, .. } | Reply::Choices { user_id, .. } => *user_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(summary: &str, start_iso: &str) -> CalendarEvent {
        CalendarEvent {
            id: "evt-1".to_string(),
            summary: summary.to_string(),
            start_iso: start_iso.to_string(),
            end_iso: start_iso.to_string(),
        }
    }

    // ---- CalendarEvent::start_date ----

    #[test]
    fn test_start_date_plain_date() {
        let e = event("Bio Exam", "2025-05-01");
        assert_eq!(
            e.start_date(),
            Some(NaiveDate::from_ymd_opt(2025, 5, 1).unwrap())
        );
    }

    #[test]
    fn test_start_date_datetime() {
        let e = event("Bio Exam", "2025-05-01T09:00:00Z");
        assert_eq!(
            e.start_date(),
            Some(NaiveDate::from_ymd_opt(2025, 5, 1).unwrap())
        );
    }

    #[test]
    fn test_start_date_invalid() {
        assert_eq!(event("Bio Exam", "not a date").start_date(), None);
        assert_eq!(event("Bio Exam", "").start_date(), None);
        assert_eq!(event("Bio Exam", "2025-13-99").start_date(), None);
    }

    // ---- Event / Reply accessors ----

    #[test]
    fn test_event_user_id() {
        let cmd = Event::Command {
            user_id: 7,
            name: "plan".to_string(),
        };
        let cb = Event::Callback {
            user_id: 8,
            choice_id: "note||Biology".to_string(),
        };
        let txt = Event::Text {
            user_id: 9,
            text: "2025-05-01".to_string(),
        };
        assert_eq!(cmd.user_id(), 7);
        assert_eq!(cb.user_id(), 8);
        assert_eq!(txt.user_id(), 9);
    }

    #[test]
    fn test_reply_constructors() {
        let r = Reply::text(1, "hello");
        assert_eq!(r.user_id(), 1);
        assert!(matches!(r, Reply::Text { ref text, .. } if text == "hello"));

        let r = Reply::choices(
            2,
            "pick one",
            vec![Choice {
                label: "Biology".to_string(),
                choice_id: "note||Biology".to_string(),
            }],
        );
        assert_eq!(r.user_id(), 2);
        assert!(matches!(r, Reply::Choices { ref choices, .. } if choices.len() == 1));
    }

    #[test]
    fn test_event_serde_round_trip() {
        let e = Event::Callback {
            user_id: 3,
            choice_id: "event||2".to_string(),
        };
        let json = serde_json::to_string(&e).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(e, back);
    }
}
