//! Headless conversation driver.

use crate::api::ConversationReply;
use crate::client::{dispatch, ClientError, ConversationService};
use crate::config::Timings;
use crate::session::{ConversationSession, Outbound, SendOutcome, SessionError};
use std::sync::Arc;
use tokio::time::Instant;

/// A session paired with the service it talks to.
///
/// Each [`Conversation::send`] is a full round trip; the animation is
/// advanced by [`Conversation::tick`] or [`Conversation::run_until_idle`].
pub struct Conversation<S: ConversationService + ?Sized> {
    session: ConversationSession,
    service: Arc<S>,
}

impl<S: ConversationService + ?Sized> Conversation<S> {
    pub fn new(service: Arc<S>, timings: Timings) -> Self {
        Self::with_session(service, ConversationSession::new(timings))
    }

    pub fn with_session(service: Arc<S>, session: ConversationSession) -> Self {
        Self { session, service }
    }

    pub fn session(&self) -> &ConversationSession {
        &self.session
    }

    /// Send one user turn and apply the reply.
    ///
    /// Dropping the returned future before it finishes resolves the
    /// placeholder with the failure message and clears `sending`.
    pub async fn send(&mut self, text: &str) -> Result<SendOutcome, SessionError> {
        let outbound = self.session.begin_send(text)?;
        let request = outbound.request.clone();
        let pending = PendingSend {
            session: &mut self.session,
            outbound: Some(outbound),
        };
        let result = dispatch(self.service.as_ref(), &request).await;
        Ok(pending.finish(result))
    }

    pub fn tick(&mut self) -> bool {
        self.session.tick(Instant::now())
    }

    /// Sleep through the remaining animation.
    pub async fn run_until_idle(&mut self) {
        while let Some(deadline) = self.session.next_deadline() {
            tokio::time::sleep_until(deadline).await;
            self.session.tick(Instant::now());
        }
    }

    /// Cancel any animation and hand back the session.
    pub fn into_session(mut self) -> ConversationSession {
        self.session.teardown();
        self.session
    }
}

/// An outstanding send; fails its placeholder if dropped unfinished.
struct PendingSend<'a> {
    session: &'a mut ConversationSession,
    outbound: Option<Outbound>,
}

impl PendingSend<'_> {
    fn finish(mut self, result: Result<ConversationReply, ClientError>) -> SendOutcome {
        let Some(outbound) = self.outbound.take() else {
            return SendOutcome::Failed;
        };
        self.session.complete_send(outbound, result, Instant::now())
    }
}

impl Drop for PendingSend<'_> {
    fn drop(&mut self) {
        if let Some(outbound) = self.outbound.take() {
            tracing::debug!(placeholder = outbound.placeholder, "Send dropped before reply");
            self.session.complete_send(
                outbound,
                Err(ClientError::Interrupted("send cancelled".into())),
                Instant::now(),
            );
        }
    }
}
