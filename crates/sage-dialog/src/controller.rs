//! Dialog controller: the per-user state machine behind the flows.
//!
//! Consumes inbound transport events, routes them through the rate
//! limiter, matcher, and moderation gate, invokes the external content
//! and generation collaborators, and emits outbound replies. Every flow
//! terminates in Idle; failures are confined to the affected user.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{Local, NaiveDate};
use tokio::sync::OwnedMutexGuard;

use sage_core::text::{split_chunks, truncate_str};
use sage_core::{Choice, Event, Reply, SageConfig, UserId};

use crate::error::DialogError;
use crate::matcher::{MatchOutcome, SubjectMatcher};
use crate::moderation::ModerationGate;
use crate::prompts;
use crate::rate_limit::RateLimiter;
use crate::session::{DialogState, FlowKind, SessionStore, UserSession};
use crate::sources::{AdminNotifier, CalendarSource, Generator, Moderator, NoteSource};

const NOTE_CHOICE_PREFIX: &str = "note||";
const EVENT_CHOICE_PREFIX: &str = "event||";
const MANUAL_CHOICE_ID: &str = "event||manual";
/// Event summaries are truncated to this many bytes in choice labels.
const EVENT_LABEL_BYTES: usize = 40;

const GENERIC_FAILURE: &str =
    "Sorry, something went wrong. Please try /summary or /plan again.";
const MODERATION_NOTICE: &str =
    "This content cannot be processed. It has been referred for review.";
const DATE_PROMPT: &str = "Reply with your exam date in YYYY-MM-DD format.";

/// Conversation orchestrator driving the summary and plan flows.
pub struct DialogController {
    sessions: SessionStore,
    rate_limiter: RateLimiter,
    matcher: SubjectMatcher,
    gate: ModerationGate,
    notes: Arc<dyn NoteSource>,
    calendar: Arc<dyn CalendarSource>,
    generator: Arc<dyn Generator>,
    max_segment_bytes: usize,
    /// Per-user in-flight guards. A handler holds its user's guard for the
    /// whole event, so one user's events never interleave; distinct users
    /// proceed concurrently.
    in_flight: Mutex<HashMap<UserId, Arc<tokio::sync::Mutex<()>>>>,
}

impl DialogController {
    /// Create a controller wired to the given collaborators.
    pub fn new(
        config: &SageConfig,
        notes: Arc<dyn NoteSource>,
        calendar: Arc<dyn CalendarSource>,
        moderator: Arc<dyn Moderator>,
        generator: Arc<dyn Generator>,
        notifier: Arc<dyn AdminNotifier>,
    ) -> Self {
        Self {
            sessions: SessionStore::new(),
            rate_limiter: RateLimiter::new(Duration::from_millis(
                config.dialog.min_request_interval_ms,
            )),
            matcher: SubjectMatcher::new(config.matcher.min_score, config.matcher.max_choices),
            gate: ModerationGate::new(moderator, notifier, config.dialog.admin_user_id.is_some()),
            notes,
            calendar,
            generator,
            max_segment_bytes: config.delivery.max_segment_bytes,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Handle one inbound event and produce the outbound replies.
    ///
    /// Never panics and never surfaces an error to the transport: the
    /// error taxonomy is mapped to user-visible replies and session
    /// effects here.
    pub async fn handle_event(&self, event: Event) -> Vec<Reply> {
        let user_id = event.user_id();
        let _guard = match self.claim(user_id) {
            Some(guard) => guard,
            None => return self.recover(user_id, &DialogError::Busy),
        };

        match self.dispatch(&event).await {
            Ok(replies) => replies,
            Err(err) => self.recover(user_id, &err),
        }
    }

    /// Current dialog state for a user, if a session exists.
    pub fn session_state(&self, user_id: UserId) -> Option<DialogState> {
        self.sessions.state_of(user_id).ok().flatten()
    }

    // -- Event routing --

    async fn dispatch(&self, event: &Event) -> Result<Vec<Reply>, DialogError> {
        let user_id = event.user_id();
        if !self.rate_limiter.allow(user_id) {
            return Err(DialogError::RateLimited);
        }

        let session = self.sessions.get(user_id)?;
        tracing::debug!(user_id, flow_id = %session.flow_id, state = ?session.state, "handling event");

        match event {
            Event::Command { name, .. } => self.handle_command(session, name).await,
            Event::Callback { choice_id, .. } => self.handle_callback(session, choice_id).await,
            Event::Text { text, .. } => self.handle_text(session, text).await,
        }
    }

    async fn handle_command(
        &self,
        session: UserSession,
        name: &str,
    ) -> Result<Vec<Reply>, DialogError> {
        let user_id = session.user_id;
        match name {
            "summary" => self.start_flow(session, FlowKind::Summary).await,
            "plan" => self.start_flow(session, FlowKind::Plan).await,
            "start" | "help" => {
                self.sessions.reset(user_id)?;
                Ok(vec![Reply::text(
                    user_id,
                    "Hi! I'm your study companion. Use /summary or /plan to pick from your notes.",
                )])
            }
            "cancel" => {
                self.sessions.reset(user_id)?;
                Ok(vec![Reply::text(user_id, "Cancelled.")])
            }
            other => {
                // Any unrelated top-level command abandons the current flow.
                self.sessions.reset(user_id)?;
                tracing::debug!(user_id, command = other, "unknown command");
                Ok(vec![Reply::text(
                    user_id,
                    "Unknown command. Use /summary or /plan to get started.",
                )])
            }
        }
    }

    async fn handle_callback(
        &self,
        mut session: UserSession,
        choice_id: &str,
    ) -> Result<Vec<Reply>, DialogError> {
        let user_id = session.user_id;
        match session.state {
            DialogState::AwaitingNoteSelection(flow) => {
                let title = choice_id.strip_prefix(NOTE_CHOICE_PREFIX).ok_or(
                    DialogError::UnexpectedInput {
                        expected: "Pick one of the offered notes.",
                    },
                )?;
                match flow {
                    FlowKind::Summary => self.run_summary(session, title.to_string()).await,
                    FlowKind::Plan => self.begin_plan(session, title.to_string()).await,
                }
            }
            DialogState::AwaitingEventSelection => {
                if choice_id == MANUAL_CHOICE_ID {
                    session.candidate_events.clear();
                    session.state = DialogState::AwaitingManualDate;
                    self.sessions.put(session)?;
                    return Ok(vec![Reply::text(user_id, DATE_PROMPT)]);
                }
                let index: usize = choice_id
                    .strip_prefix(EVENT_CHOICE_PREFIX)
                    .and_then(|s| s.parse().ok())
                    .ok_or(DialogError::UnexpectedInput {
                        expected: "Pick one of the offered events.",
                    })?;
                let candidate = session.candidate_events.get(index).cloned().ok_or(
                    DialogError::UnexpectedInput {
                        expected: "Pick one of the offered events.",
                    },
                )?;
                let date = candidate.event.start_date().ok_or_else(|| {
                    DialogError::Collaborator(format!(
                        "unparseable event start: {}",
                        candidate.event.start_iso
                    ))
                })?;
                session.select_exam_date(date);
                self.finish_plan(session).await
            }
            DialogState::Idle => Err(DialogError::UnexpectedInput {
                expected: "Use /summary or /plan to get started.",
            }),
            DialogState::AwaitingManualDate => Err(DialogError::UnexpectedInput {
                expected: "Type your exam date as YYYY-MM-DD.",
            }),
            DialogState::Generating => Err(DialogError::UnexpectedInput {
                expected: "Generation is in progress; please wait.",
            }),
        }
    }

    async fn handle_text(
        &self,
        mut session: UserSession,
        text: &str,
    ) -> Result<Vec<Reply>, DialogError> {
        let user_id = session.user_id;
        match session.state {
            DialogState::AwaitingManualDate => {
                let date = parse_manual_date(text)
                    .ok_or_else(|| DialogError::InvalidDate(text.trim().to_string()))?;
                session.select_exam_date(date);
                self.finish_plan(session).await
            }
            DialogState::Idle => Ok(vec![Reply::text(
                user_id,
                "I didn't understand that. Use /summary or /plan to get started.",
            )]),
            DialogState::AwaitingNoteSelection(_) => Err(DialogError::UnexpectedInput {
                expected: "Pick one of the offered notes.",
            }),
            DialogState::AwaitingEventSelection => Err(DialogError::UnexpectedInput {
                expected: "Pick one of the offered events, or choose to type the date.",
            }),
            DialogState::Generating => Err(DialogError::UnexpectedInput {
                expected: "Generation is in progress; please wait.",
            }),
        }
    }

    // -- Flow steps --

    async fn start_flow(
        &self,
        mut session: UserSession,
        flow: FlowKind,
    ) -> Result<Vec<Reply>, DialogError> {
        let user_id = session.user_id;
        let titles = self.notes.list_titles().await?;
        if titles.is_empty() {
            self.sessions.reset(user_id)?;
            return Ok(vec![Reply::text(
                user_id,
                "No notes found. Add some notes and try again.",
            )]);
        }

        session.begin(flow);
        self.sessions.put(session)?;

        let prompt = match flow {
            FlowKind::Summary => "Select a note to summarize:",
            FlowKind::Plan => "Select a note to build a study plan for:",
        };
        let choices = titles
            .into_iter()
            .map(|title| Choice {
                choice_id: format!("{}{}", NOTE_CHOICE_PREFIX, title),
                label: title,
            })
            .collect();
        Ok(vec![Reply::choices(user_id, prompt, choices)])
    }

    async fn run_summary(
        &self,
        mut session: UserSession,
        title: String,
    ) -> Result<Vec<Reply>, DialogError> {
        let user_id = session.user_id;
        let content = self.notes.fetch_content(&title).await?;
        if content.trim().is_empty() {
            self.sessions.reset(user_id)?;
            return Ok(vec![Reply::text(
                user_id,
                format!("The note '{}' has no content to summarize.", title),
            )]);
        }
        if self.gate.check(user_id, &content).await {
            return Err(DialogError::ModerationBlocked);
        }

        session.pending_subject = Some(title.clone());
        session.pending_content = Some(content.clone());
        session.state = DialogState::Generating;
        self.sessions.put(session)?;

        tracing::info!(user_id, title = %title, "generating summary");
        let output = self
            .generator
            .generate(&prompts::summary_prompt(&title, &content))
            .await?;

        self.sessions.reset(user_id)?;
        Ok(self.deliver(user_id, &output))
    }

    async fn begin_plan(
        &self,
        mut session: UserSession,
        title: String,
    ) -> Result<Vec<Reply>, DialogError> {
        let user_id = session.user_id;
        let content = self.notes.fetch_content(&title).await?;
        if self.gate.check(user_id, &content).await {
            return Err(DialogError::ModerationBlocked);
        }

        session.pending_subject = Some(title.clone());
        session.pending_content = Some(content);

        // A calendar outage degrades to the manual-date path rather than
        // aborting the flow; the user can always type the date.
        let events = match self.calendar.search_events(&title).await {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!(user_id, error = %e, "calendar search failed; using manual date");
                Vec::new()
            }
        };

        match self.matcher.resolve(&title, &events) {
            MatchOutcome::NoMatch => {
                session.state = DialogState::AwaitingManualDate;
                self.sessions.put(session)?;
                Ok(vec![Reply::text(
                    user_id,
                    format!(
                        "No upcoming calendar event matched '{}'. {}",
                        title, DATE_PROMPT
                    ),
                )])
            }
            MatchOutcome::Single(candidate) => match candidate.event.start_date() {
                Some(date) => {
                    session.select_exam_date(date);
                    let found = Reply::text(
                        user_id,
                        format!("Found event: {} on {}", candidate.event.summary, date),
                    );
                    let mut replies = vec![found];
                    replies.extend(self.finish_plan(session).await?);
                    Ok(replies)
                }
                None => {
                    tracing::warn!(
                        user_id,
                        start_iso = %candidate.event.start_iso,
                        "matched event has unparseable start; using manual date"
                    );
                    session.state = DialogState::AwaitingManualDate;
                    self.sessions.put(session)?;
                    Ok(vec![Reply::text(user_id, DATE_PROMPT)])
                }
            },
            MatchOutcome::Ambiguous(candidates) => {
                let mut choices: Vec<Choice> = candidates
                    .iter()
                    .enumerate()
                    .map(|(index, c)| Choice {
                        label: format!(
                            "{} - {}",
                            truncate_str(&c.event.summary, EVENT_LABEL_BYTES),
                            c.event
                                .start_date()
                                .map_or_else(|| "unknown".to_string(), |d| d.to_string())
                        ),
                        choice_id: format!("{}{}", EVENT_CHOICE_PREFIX, index),
                    })
                    .collect();
                choices.push(Choice {
                    label: "None of these, I'll type the date".to_string(),
                    choice_id: MANUAL_CHOICE_ID.to_string(),
                });

                session.candidate_events = candidates;
                session.state = DialogState::AwaitingEventSelection;
                self.sessions.put(session)?;
                Ok(vec![Reply::choices(
                    user_id,
                    "Multiple matching events found. Pick the correct one:",
                    choices,
                )])
            }
        }
    }

    async fn finish_plan(&self, mut session: UserSession) -> Result<Vec<Reply>, DialogError> {
        let user_id = session.user_id;
        let subject = session.pending_subject.clone().unwrap_or_default();
        let content = session.pending_content.clone().unwrap_or_default();
        let exam_date = session.selected_exam_date.ok_or_else(|| {
            DialogError::Session("plan flow reached generation without an exam date".to_string())
        })?;

        session.state = DialogState::Generating;
        self.sessions.put(session)?;

        let today = Local::now().date_naive();
        let days_remaining = (exam_date - today).num_days().max(0);
        tracing::info!(user_id, subject = %subject, %exam_date, days_remaining, "generating study plan");

        let output = self
            .generator
            .generate(&prompts::plan_prompt(
                &subject,
                &content,
                exam_date,
                days_remaining,
            ))
            .await?;

        self.sessions.reset(user_id)?;
        Ok(self.deliver(user_id, &format!("Study plan for {}\n\n{}", subject, output)))
    }

    /// Split generated output into transport-safe segments, in order.
    fn deliver(&self, user_id: UserId, output: &str) -> Vec<Reply> {
        split_chunks(output, self.max_segment_bytes)
            .into_iter()
            .map(|segment| Reply::text(user_id, segment))
            .collect()
    }

    // -- Error recovery --

    /// Map an engine error to its user-visible reply and session effect.
    ///
    /// Locally recovered conditions leave the session untouched; blocking
    /// and failure conditions reset it to Idle. Nothing here is fatal.
    fn recover(&self, user_id: UserId, err: &DialogError) -> Vec<Reply> {
        let text = match err {
            DialogError::RateLimited => {
                "You're sending requests too fast. Please wait a moment and try again."
                    .to_string()
            }
            DialogError::Busy => {
                "Still working on your previous request. Please wait for it to finish."
                    .to_string()
            }
            DialogError::InvalidDate(_) => {
                "Could not parse that date. Please send it as YYYY-MM-DD.".to_string()
            }
            DialogError::UnexpectedInput { expected } => {
                format!("That wasn't what I expected. {}", expected)
            }
            DialogError::ModerationBlocked => {
                self.reset_quietly(user_id);
                MODERATION_NOTICE.to_string()
            }
            DialogError::NoteNotFound(_)
            | DialogError::Generation(_)
            | DialogError::Collaborator(_) => {
                tracing::warn!(user_id, error = %err, "flow failed");
                self.reset_quietly(user_id);
                GENERIC_FAILURE.to_string()
            }
            DialogError::Session(_) => {
                tracing::error!(user_id, error = %err, "session store failure");
                self.reset_quietly(user_id);
                GENERIC_FAILURE.to_string()
            }
        };
        vec![Reply::text(user_id, text)]
    }

    fn reset_quietly(&self, user_id: UserId) {
        if let Err(e) = self.sessions.reset(user_id) {
            tracing::error!(user_id, error = %e, "failed to reset session");
        }
    }

    /// Claim the user's in-flight guard, or None if an event is pending.
    fn claim(&self, user_id: UserId) -> Option<OwnedMutexGuard<()>> {
        let slot = {
            let mut map = match self.in_flight.lock() {
                Ok(map) => map,
                Err(e) => {
                    tracing::error!(error = %e, "in-flight lock poisoned");
                    return None;
                }
            };
            Arc::clone(
                map.entry(user_id)
                    .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
            )
        };
        slot.try_lock_owned().ok()
    }
}

/// Parse a user-typed exam date: `YYYY-MM-DD`, or a full RFC 3339 datetime.
fn parse_manual_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .map(|dt| dt.date_naive())
        })
}
