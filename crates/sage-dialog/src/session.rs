//! Per-user conversation session tracking.
//!
//! One transient record per user, held in memory for the life of the
//! process. Sessions are created lazily on first interaction, overwritten
//! when a new flow starts, and reset to Idle on completion or cancellation;
//! they are never persisted and never explicitly destroyed.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::NaiveDate;
use uuid::Uuid;

use sage_core::{ExamCandidate, UserId};

use crate::error::DialogError;

/// Which multi-step task a flow is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    Summary,
    Plan,
}

/// Where a user's conversation currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogState {
    /// No flow in progress.
    Idle,
    /// A note list was offered; waiting for the user to pick one.
    AwaitingNoteSelection(FlowKind),
    /// Multiple exam candidates were offered; waiting for a pick.
    AwaitingEventSelection,
    /// No exam candidate qualified; waiting for a typed date.
    AwaitingManualDate,
    /// A generation call is in flight.
    Generating,
}

/// The conversation state tracked for one user across the turns of a flow.
#[derive(Debug, Clone)]
pub struct UserSession {
    pub user_id: UserId,
    /// Identifier of the current flow, regenerated each time one starts.
    pub flow_id: Uuid,
    pub state: DialogState,
    /// Subject (note title) of the flow in progress.
    pub pending_subject: Option<String>,
    /// Note content fetched for the flow in progress.
    pub pending_content: Option<String>,
    /// Scored candidates offered for disambiguation. Mutually exclusive
    /// with `selected_exam_date`: selecting a date clears the candidates.
    pub candidate_events: Vec<ExamCandidate>,
    pub selected_exam_date: Option<NaiveDate>,
}

impl UserSession {
    /// A fresh Idle session for `user_id`.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            flow_id: Uuid::new_v4(),
            state: DialogState::Idle,
            pending_subject: None,
            pending_content: None,
            candidate_events: Vec::new(),
            selected_exam_date: None,
        }
    }

    /// Start a new flow, discarding whatever was pending.
    pub fn begin(&mut self, flow: FlowKind) {
        self.flow_id = Uuid::new_v4();
        self.state = DialogState::AwaitingNoteSelection(flow);
        self.pending_subject = None;
        self.pending_content = None;
        self.candidate_events.clear();
        self.selected_exam_date = None;
    }

    /// Record the chosen exam date and clear the candidate list.
    pub fn select_exam_date(&mut self, date: NaiveDate) {
        self.selected_exam_date = Some(date);
        self.candidate_events.clear();
    }
}

/// Process-wide store holding one session record per user.
///
/// Mutation is confined to single-key updates, so distinct users never
/// interfere. The controller serializes events per user, so each record is
/// touched by at most one in-flight handler at a time.
pub struct SessionStore {
    sessions: Mutex<HashMap<UserId, UserSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Snapshot of the user's session, creating an Idle one if absent.
    pub fn get(&self, user_id: UserId) -> Result<UserSession, DialogError> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|e| DialogError::Session(format!("session lock poisoned: {}", e)))?;
        Ok(sessions
            .entry(user_id)
            .or_insert_with(|| UserSession::new(user_id))
            .clone())
    }

    /// Store the session, replacing the user's previous record.
    pub fn put(&self, session: UserSession) -> Result<(), DialogError> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|e| DialogError::Session(format!("session lock poisoned: {}", e)))?;
        sessions.insert(session.user_id, session);
        Ok(())
    }

    /// Return the user's session to Idle, clearing all pending fields.
    pub fn reset(&self, user_id: UserId) -> Result<(), DialogError> {
        self.put(UserSession::new(user_id))
    }

    /// Current state of the user's session, if one exists.
    pub fn state_of(&self, user_id: UserId) -> Result<Option<DialogState>, DialogError> {
        let sessions = self
            .sessions
            .lock()
            .map_err(|e| DialogError::Session(format!("session lock poisoned: {}", e)))?;
        Ok(sessions.get(&user_id).map(|s| s.state))
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sage_core::CalendarEvent;

    fn candidate(summary: &str) -> ExamCandidate {
        ExamCandidate {
            event: CalendarEvent {
                id: "1".to_string(),
                summary: summary.to_string(),
                start_iso: "2025-05-01".to_string(),
                end_iso: "2025-05-01".to_string(),
            },
            score: 0.9,
        }
    }

    // ---- UserSession ----

    #[test]
    fn test_new_session_is_idle() {
        let s = UserSession::new(7);
        assert_eq!(s.user_id, 7);
        assert_eq!(s.state, DialogState::Idle);
        assert!(s.pending_subject.is_none());
        assert!(s.candidate_events.is_empty());
        assert!(s.selected_exam_date.is_none());
    }

    #[test]
    fn test_begin_clears_pending_fields() {
        let mut s = UserSession::new(7);
        s.pending_subject = Some("Biology".to_string());
        s.pending_content = Some("cells".to_string());
        s.candidate_events.push(candidate("Bio Exam"));
        s.selected_exam_date = NaiveDate::from_ymd_opt(2025, 5, 1);
        let old_flow = s.flow_id;

        s.begin(FlowKind::Plan);
        assert_eq!(s.state, DialogState::AwaitingNoteSelection(FlowKind::Plan));
        assert!(s.pending_subject.is_none());
        assert!(s.pending_content.is_none());
        assert!(s.candidate_events.is_empty());
        assert!(s.selected_exam_date.is_none());
        assert_ne!(s.flow_id, old_flow);
    }

    #[test]
    fn test_select_exam_date_clears_candidates() {
        let mut s = UserSession::new(7);
        s.candidate_events.push(candidate("Bio Exam"));
        s.candidate_events.push(candidate("Biology Quiz"));

        s.select_exam_date(NaiveDate::from_ymd_opt(2025, 5, 1).unwrap());
        assert!(s.candidate_events.is_empty());
        assert_eq!(s.selected_exam_date, NaiveDate::from_ymd_opt(2025, 5, 1));
    }

    // ---- SessionStore ----

    #[test]
    fn test_get_creates_idle_session_lazily() {
        let store = SessionStore::new();
        assert_eq!(store.state_of(1).unwrap(), None);
        let s = store.get(1).unwrap();
        assert_eq!(s.state, DialogState::Idle);
        assert_eq!(store.state_of(1).unwrap(), Some(DialogState::Idle));
    }

    #[test]
    fn test_put_then_get_round_trip() {
        let store = SessionStore::new();
        let mut s = store.get(1).unwrap();
        s.begin(FlowKind::Summary);
        store.put(s).unwrap();

        let fetched = store.get(1).unwrap();
        assert_eq!(
            fetched.state,
            DialogState::AwaitingNoteSelection(FlowKind::Summary)
        );
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let store = SessionStore::new();
        let mut s = store.get(1).unwrap();
        s.begin(FlowKind::Plan);
        s.pending_subject = Some("Biology".to_string());
        store.put(s).unwrap();

        store.reset(1).unwrap();
        let fetched = store.get(1).unwrap();
        assert_eq!(fetched.state, DialogState::Idle);
        assert!(fetched.pending_subject.is_none());
    }

    #[test]
    fn test_one_record_per_user() {
        let store = SessionStore::new();
        store.get(1).unwrap();
        store.get(2).unwrap();
        let mut a = store.get(1).unwrap();
        a.begin(FlowKind::Summary);
        store.put(a).unwrap();

        // User 2 is untouched by user 1's flow.
        assert_eq!(store.state_of(2).unwrap(), Some(DialogState::Idle));
    }
}
