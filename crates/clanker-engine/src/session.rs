//! Conversation session state.
//!
//! A [`ConversationSession`] owns the timeline, the conversation id and
//! the cycling animation. Sending is split in two so the caller can run
//! the request wherever it likes:
//!
//! 1. [`ConversationSession::begin_send`] appends the user turn and a
//!    pending placeholder, returning the request to send.
//! 2. [`ConversationSession::complete_send`] applies the outcome.
//!
//! Time only enters through [`ConversationSession::tick`].

use crate::api::{Business, ConversationReply};
use crate::client::{ClientError, ConversationRequest};
use crate::config::Timings;
use crate::cycling::{CycleEffect, CyclePhase, CyclingRun};
use crate::format::{format_reply, FormattedReply, FAILURE_MESSAGE};
use crate::timeline::{MessageId, NewMessage, Timeline, TimelineError};
use chrono::Local;
use tokio::time::Instant;

/// A request that has been recorded in the timeline but not yet answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    /// Placeholder that the reply will resolve.
    pub placeholder: MessageId,
    pub request: ConversationRequest,
}

/// What [`ConversationSession::complete_send`] did with a reply.
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// The request failed; the placeholder shows the failure message.
    Failed,
    /// The placeholder was resolved with final text.
    Replied,
    /// Several businesses came back and the cycling animation started.
    Cycling { businesses: Vec<Business> },
}

/// Chat state for one session.
#[derive(Debug)]
pub struct ConversationSession {
    conversation_id: Option<String>,
    timeline: Timeline,
    sending: bool,
    cycling: Option<CyclingRun>,
    timings: Timings,
}

impl ConversationSession {
    /// Start a session seeded with the greeting.
    pub fn new(timings: Timings) -> Self {
        Self::with_timeline(Timeline::with_greeting(Local::now()), timings)
    }

    /// Start a session from an existing timeline.
    pub fn with_timeline(timeline: Timeline, timings: Timings) -> Self {
        Self {
            conversation_id: None,
            timeline,
            sending: false,
            cycling: None,
            timings,
        }
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Whether a request is in flight.
    pub fn is_sending(&self) -> bool {
        self.sending
    }

    pub fn cycle_phase(&self) -> CyclePhase {
        self.cycling
            .as_ref()
            .map_or(CyclePhase::Idle, CyclingRun::phase)
    }

    /// When the animation next needs a tick, if one is running.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.cycling.as_ref().map(CyclingRun::deadline)
    }

    /// Nothing in flight and no animation running.
    pub fn is_idle(&self) -> bool {
        !self.sending && self.cycling.is_none()
    }

    /// Record a user turn and build the request for it.
    ///
    /// A running animation is cancelled, freezing its message.
    pub fn begin_send(&mut self, text: &str) -> Result<Outbound, SessionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::EmptyMessage);
        }
        if self.sending {
            return Err(SessionError::Busy);
        }

        if let Some(run) = self.cycling.take() {
            tracing::info!(phase = ?run.phase(), "New send cancels business cycling");
            let effects = run.cancel();
            self.apply(effects);
        }

        let placeholder = self.timeline.append_user_message(text)?;
        self.sending = true;

        let request = ConversationRequest::for_turn(self.conversation_id.as_deref(), text);
        tracing::debug!(placeholder, "Began send");
        Ok(Outbound {
            placeholder,
            request,
        })
    }

    /// Apply the result of the request started by [`Self::begin_send`].
    ///
    /// Always clears the sending flag and resolves exactly the outbound
    /// placeholder.
    pub fn complete_send(
        &mut self,
        outbound: Outbound,
        result: Result<ConversationReply, ClientError>,
        now: Instant,
    ) -> SendOutcome {
        self.sending = false;

        let reply = match result {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "Conversation request failed");
                self.timeline
                    .resolve_pending(outbound.placeholder, FAILURE_MESSAGE);
                return SendOutcome::Failed;
            }
        };

        if let ConversationRequest::Create(_) = outbound.request {
            match &reply.conversation_id {
                Some(id) => {
                    tracing::info!(conversation_id = %id, "Conversation created");
                    self.conversation_id = Some(id.clone());
                }
                None => tracing::warn!("Create reply carried no conversation id"),
            }
        }

        match format_reply(&reply) {
            FormattedReply::Text(text) => {
                self.timeline.resolve_pending(outbound.placeholder, text);
                SendOutcome::Replied
            }
            FormattedReply::Cycle(businesses) => {
                if let Some(previous) = self.cycling.take() {
                    let effects = previous.cancel();
                    self.apply(effects);
                }
                let (run, effects) =
                    CyclingRun::start(outbound.placeholder, businesses.clone(), self.timings, now);
                self.cycling = Some(run);
                self.apply(effects);
                SendOutcome::Cycling { businesses }
            }
        }
    }

    /// Advance the animation to `now`, firing every transition that is due.
    ///
    /// Returns whether the timeline changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut changed = false;
        while let Some(run) = self.cycling.take() {
            if !run.is_due(now) {
                self.cycling = Some(run);
                break;
            }
            let (next, effects) = run.fire();
            self.cycling = next;
            self.apply(effects);
            changed = true;
        }
        changed
    }

    /// Stop the animation. Later ticks do nothing.
    pub fn teardown(&mut self) {
        if let Some(run) = self.cycling.take() {
            tracing::debug!(phase = ?run.phase(), "Tearing down business cycling");
            let effects = run.cancel();
            self.apply(effects);
        }
    }

    fn apply(&mut self, effects: Vec<CycleEffect>) {
        for effect in effects {
            match effect {
                CycleEffect::Resolve { id, content } => {
                    self.timeline.resolve_pending(id, content);
                }
                CycleEffect::Update { id, content } => {
                    self.timeline.update_content(id, content);
                }
                CycleEffect::AppendTarget { content } => {
                    let id = self.timeline.append_message(NewMessage::pending_bot(content));
                    if let Some(run) = self.cycling.as_mut() {
                        run.attach_target(id);
                    }
                }
                CycleEffect::AppendMessage { content } => {
                    self.timeline.append_message(NewMessage::bot(content));
                }
            }
        }
    }
}

/// Errors from starting a send.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("message is empty")]
    EmptyMessage,

    #[error("a message is already being sent")]
    Busy,
}

impl From<TimelineError> for SessionError {
    fn from(err: TimelineError) -> Self {
        match err {
            TimelineError::EmptyMessage => Self::EmptyMessage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::GREETING;
    use crate::timeline::Role;
    use std::time::Duration;

    fn business(name: &str) -> Business {
        Business {
            name: name.into(),
            hours: "9-5".into(),
            phone_number: "555-0100".into(),
            price_range: "$$".into(),
            star_rating: 4.0,
        }
    }

    fn reply(id: Option<&str>, message: &str, businesses: Option<Vec<Business>>) -> ConversationReply {
        ConversationReply {
            conversation_id: id.map(String::from),
            response_message: message.into(),
            businesses,
        }
    }

    fn session() -> ConversationSession {
        ConversationSession::with_timeline(Timeline::new(), Timings::default())
    }

    fn last_content(session: &ConversationSession) -> &str {
        session
            .timeline()
            .items()
            .last()
            .and_then(|i| i.as_message())
            .map_or("", |m| m.content.as_str())
    }

    #[test]
    fn test_new_session_has_greeting() {
        let session = ConversationSession::new(Timings::default());
        assert_eq!(session.timeline().len(), 3);
        assert_eq!(last_content(&session), GREETING);
        assert!(session.is_idle());
        assert_eq!(session.conversation_id(), None);
    }

    #[test]
    fn test_first_send_creates_then_continues() {
        let mut session = session();
        let outbound = session.begin_send("  book me a haircut ").unwrap();
        assert!(session.is_sending());
        assert_eq!(
            outbound.request,
            ConversationRequest::for_turn(None, "book me a haircut")
        );

        let outcome = session.complete_send(
            outbound,
            Ok(reply(Some("c-1"), "On it", None)),
            Instant::now(),
        );
        assert_eq!(outcome, SendOutcome::Replied);
        assert!(!session.is_sending());
        assert_eq!(session.conversation_id(), Some("c-1"));
        assert_eq!(last_content(&session), "On it");

        let outbound = session.begin_send("tomorrow").unwrap();
        assert_eq!(
            outbound.request,
            ConversationRequest::for_turn(Some("c-1"), "tomorrow")
        );
    }

    #[test]
    fn test_continue_reply_does_not_replace_id() {
        let mut session = session();
        let outbound = session.begin_send("hi").unwrap();
        session.complete_send(outbound, Ok(reply(Some("c-1"), "a", None)), Instant::now());

        let outbound = session.begin_send("again").unwrap();
        session.complete_send(outbound, Ok(reply(Some("c-2"), "b", None)), Instant::now());
        assert_eq!(session.conversation_id(), Some("c-1"));
    }

    #[test]
    fn test_blank_send_rejected() {
        let mut session = session();
        assert_eq!(session.begin_send(" \n"), Err(SessionError::EmptyMessage));
        assert!(session.timeline().is_empty());
        assert!(!session.is_sending());
    }

    #[test]
    fn test_second_send_while_sending_is_busy() {
        let mut session = session();
        session.begin_send("one").unwrap();
        assert_eq!(session.begin_send("two"), Err(SessionError::Busy));
        assert_eq!(session.timeline().len(), 2);
    }

    #[test]
    fn test_failure_resolves_placeholder() {
        let mut session = session();
        let outbound = session.begin_send("hi").unwrap();
        let placeholder = outbound.placeholder;

        let outcome = session.complete_send(
            outbound,
            Err(ClientError::Status {
                status: 500,
                body: String::new(),
            }),
            Instant::now(),
        );

        assert_eq!(outcome, SendOutcome::Failed);
        assert!(!session.is_sending());
        let message = session.timeline().get(placeholder).unwrap();
        assert_eq!(message.content, FAILURE_MESSAGE);
        assert!(!message.pending);
        assert_eq!(session.conversation_id(), None);
    }

    #[test]
    fn test_single_business_confirms_immediately() {
        let mut session = session();
        let outbound = session.begin_send("haircut").unwrap();
        session.complete_send(
            outbound,
            Ok(reply(Some("c"), "x", Some(vec![business("A Cuts")]))),
            Instant::now(),
        );
        assert!(last_content(&session).contains("A Cuts"));
        assert!(session.is_idle());
        assert_eq!(session.timeline().pending_count(), 0);
    }

    #[test]
    fn test_cycling_driven_by_ticks() {
        let timings = Timings::default();
        let start = Instant::now();
        let mut session = session();
        let outbound = session.begin_send("haircut").unwrap();
        let outcome = session.complete_send(
            outbound,
            Ok(reply(Some("c"), "x", Some(vec![business("A Cuts"), business("B Salon")]))),
            start,
        );
        assert!(matches!(outcome, SendOutcome::Cycling { ref businesses } if businesses.len() == 2));
        assert_eq!(last_content(&session), "I found 2 great places for you!");
        assert_eq!(session.cycle_phase(), CyclePhase::Announcing);

        assert!(!session.tick(start + Duration::from_millis(100)));

        let t = start + timings.announce_delay();
        assert!(session.tick(t));
        assert_eq!(session.cycle_phase(), CyclePhase::Cycling { index: 0 });
        assert_eq!(last_content(&session), "Kicking off call with A Cuts (4\u{2b50})...");
        assert_eq!(session.timeline().pending_count(), 1);

        // Jump past the whole sequence in one tick.
        let end = t + timings.cycle_interval() * 10 + timings.confirmation_delay();
        assert!(session.tick(end));
        assert!(session.is_idle());
        assert_eq!(session.timeline().pending_count(), 0);
        assert!(last_content(&session).starts_with("\u{2705} Successfully confirmed appointment with A Cuts!"));
    }

    #[test]
    fn test_teardown_stops_cycling() {
        let timings = Timings::default();
        let start = Instant::now();
        let mut session = session();
        let outbound = session.begin_send("haircut").unwrap();
        session.complete_send(
            outbound,
            Ok(reply(Some("c"), "x", Some(vec![business("A"), business("B")]))),
            start,
        );
        session.tick(start + timings.announce_delay());
        let before = session.timeline().len();

        session.teardown();
        assert_eq!(session.cycle_phase(), CyclePhase::Idle);
        assert_eq!(session.timeline().pending_count(), 0);
        assert!(!session.tick(start + Duration::from_secs(60)));
        assert_eq!(session.timeline().len(), before);
    }

    #[test]
    fn test_send_during_cycling_cancels_run() {
        let timings = Timings::default();
        let start = Instant::now();
        let mut session = session();
        let outbound = session.begin_send("haircut").unwrap();
        session.complete_send(
            outbound,
            Ok(reply(Some("c"), "x", Some(vec![business("A"), business("B")]))),
            start,
        );
        session.tick(start + timings.announce_delay());

        let outbound = session.begin_send("never mind").unwrap();
        assert_eq!(session.cycle_phase(), CyclePhase::Idle);
        // Only the new placeholder is pending.
        assert_eq!(session.timeline().pending_count(), 1);
        assert!(session.timeline().get(outbound.placeholder).unwrap().pending);

        let users = session
            .timeline()
            .items()
            .iter()
            .filter_map(|i| i.as_message())
            .filter(|m| m.role == Role::User)
            .count();
        assert_eq!(users, 2);
    }

    #[test]
    fn test_late_reply_after_teardown_still_resolves() {
        let mut session = session();
        let outbound = session.begin_send("hi").unwrap();
        session.teardown();
        session.complete_send(outbound, Ok(reply(Some("c"), "late", None)), Instant::now());
        assert_eq!(last_content(&session), "late");
        assert_eq!(session.timeline().pending_count(), 0);
    }
}
