//! Business-cycling animation.
//!
//! When a reply names several businesses the bot pretends to call each of
//! them in turn. The sequence is a small state machine:
//!
//! ```text
//! Idle -> Announcing -> Cycling(index) -> Finalizing(step) -> Confirming -> Idle
//! ```
//!
//! Transitions are pure. A run owns its next deadline; the caller decides
//! when time has passed (real or fake clock) and applies the returned
//! [`CycleEffect`]s to the timeline.

use crate::api::Business;
use crate::config::Timings;
use crate::format::{
    format_announcement, format_final_confirmation, format_kickoff, FINAL_PROGRESS,
};
use crate::timeline::MessageId;
use tokio::time::Instant;

/// Times the generic progress strings are shown before the confirmation.
pub const FINAL_PASSES: usize = 2;

/// Where the animation is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    /// No animation running.
    Idle,
    /// Count announced; waiting to post the cycling message.
    Announcing,
    /// Showing the business at `index`.
    Cycling { index: usize },
    /// Showing generic progress update `step` next, counted across all
    /// [`FINAL_PASSES`].
    Finalizing { step: usize },
    /// Cycling message finalized; waiting to post the confirmation.
    Confirming,
}

/// A timeline mutation requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleEffect {
    /// Set content and clear pending.
    Resolve { id: MessageId, content: String },
    /// Append the pending cycling message; its id must be passed back via
    /// [`CyclingRun::attach_target`].
    AppendTarget { content: String },
    /// Set content, keep pending.
    Update { id: MessageId, content: String },
    /// Append a resolved bot message.
    AppendMessage { content: String },
}

/// State of one running animation.
#[derive(Debug, Clone)]
pub struct CyclingRun {
    businesses: Vec<Business>,
    phase: CyclePhase,
    target: Option<MessageId>,
    cycle_count: usize,
    deadline: Instant,
    last_content: String,
    timings: Timings,
}

impl CyclingRun {
    /// Start an animation for `businesses`, resolving `placeholder` with the
    /// count summary right away.
    ///
    /// Callers only start a run for two or more businesses.
    pub fn start(
        placeholder: MessageId,
        businesses: Vec<Business>,
        timings: Timings,
        now: Instant,
    ) -> (Self, Vec<CycleEffect>) {
        let announcement = format_announcement(businesses.len());
        tracing::debug!(count = businesses.len(), "Starting business cycling");

        let run = Self {
            businesses,
            phase: CyclePhase::Announcing,
            target: None,
            cycle_count: 0,
            deadline: now + timings.announce_delay(),
            last_content: String::new(),
            timings,
        };
        let effects = vec![CycleEffect::Resolve {
            id: placeholder,
            content: announcement,
        }];
        (run, effects)
    }

    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    /// Id of the cycling message, once posted.
    pub fn target(&self) -> Option<MessageId> {
        self.target
    }

    pub fn businesses(&self) -> &[Business] {
        &self.businesses
    }

    /// When the next transition is due.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.deadline
    }

    /// Record the id of the message created for [`CycleEffect::AppendTarget`].
    pub fn attach_target(&mut self, id: MessageId) {
        self.target = Some(id);
    }

    /// Perform the transition that is due at [`Self::deadline`].
    ///
    /// Returns `None` for the next state once the sequence has ended.
    #[must_use]
    pub fn fire(mut self) -> (Option<Self>, Vec<CycleEffect>) {
        let mut effects = Vec::new();

        match self.phase {
            CyclePhase::Idle => return (None, effects),
            CyclePhase::Announcing => {
                let content = format_kickoff(&self.businesses[0]);
                self.last_content.clone_from(&content);
                effects.push(CycleEffect::AppendTarget { content });
                self.phase = CyclePhase::Cycling { index: 0 };
                self.deadline += self.timings.cycle_interval();
            }
            CyclePhase::Cycling { index } => {
                self.cycle_count += 1;
                if self.cycle_count < self.businesses.len() {
                    let next = (index + 1) % self.businesses.len();
                    let content = format_kickoff(&self.businesses[next]);
                    self.push_update(content, &mut effects);
                    self.phase = CyclePhase::Cycling { index: next };
                    self.deadline += self.timings.cycle_interval();
                } else {
                    self.phase = CyclePhase::Finalizing { step: 0 };
                    return self.fire_finalizing(effects);
                }
            }
            CyclePhase::Finalizing { .. } => return self.fire_finalizing(effects),
            CyclePhase::Confirming => {
                effects.push(CycleEffect::AppendMessage {
                    content: format_final_confirmation(&self.businesses[0]),
                });
                tracing::debug!("Business cycling complete");
                return (None, effects);
            }
        }

        (Some(self), effects)
    }

    fn fire_finalizing(mut self, mut effects: Vec<CycleEffect>) -> (Option<Self>, Vec<CycleEffect>) {
        let CyclePhase::Finalizing { step } = self.phase else {
            return (Some(self), effects);
        };

        let content = FINAL_PROGRESS[step % FINAL_PROGRESS.len()].to_string();
        if step + 1 == FINAL_PASSES * FINAL_PROGRESS.len() {
            if let Some(id) = self.target {
                effects.push(CycleEffect::Resolve {
                    id,
                    content: content.clone(),
                });
            }
            self.last_content = content;
            self.phase = CyclePhase::Confirming;
            self.deadline += self.timings.confirmation_delay();
        } else {
            self.push_update(content, &mut effects);
            self.phase = CyclePhase::Finalizing { step: step + 1 };
            self.deadline += self.timings.cycle_interval();
        }

        (Some(self), effects)
    }

    fn push_update(&mut self, content: String, effects: &mut Vec<CycleEffect>) {
        self.last_content.clone_from(&content);
        if let Some(id) = self.target {
            effects.push(CycleEffect::Update { id, content });
        }
    }

    /// Stop the animation early.
    ///
    /// A cycling message that is still pending is frozen at whatever it
    /// currently shows so no placeholder is left spinning.
    #[must_use]
    pub fn cancel(self) -> Vec<CycleEffect> {
        match (self.phase, self.target) {
            (CyclePhase::Cycling { .. } | CyclePhase::Finalizing { .. }, Some(id)) => {
                vec![CycleEffect::Resolve {
                    id,
                    content: self.last_content,
                }]
            }
            _ => Vec::new(),
        }
    }
}
