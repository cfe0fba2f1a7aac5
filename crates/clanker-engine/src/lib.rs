//! clanker-engine: Headless core of the clanker booking chat
//!
//! This crate provides everything except the terminal UI, including:
//! - Configuration
//! - Wire types for the conversation service and its HTTP clients
//! - Business extraction and reply formatting
//! - The append-only chat timeline
//! - The business-cycling animation state machine
//! - The conversation session that ties them together

pub mod api;
pub mod client;
pub mod config;
pub mod conversation;
pub mod cycling;
pub mod extract;
pub mod format;
pub mod session;
pub mod timeline;

// Re-export commonly used types
pub use api::{
    Business, BusinessRecord, ContinueConversationRequest, ContinueConversationResponse,
    ConversationReply, CreateConversationRequest, CreateConversationResponse, ValidationIssue,
};
pub use client::{
    build_service, dispatch, ClientError, ConversationRequest, ConversationService,
    HttpConversationClient, LegacyMockClient,
};
pub use config::{Config, ConfigError, Timings, Transport};
pub use conversation::Conversation;
pub use cycling::{CycleEffect, CyclePhase, CyclingRun};
pub use extract::{extract_businesses, Extraction, ExtractionSource};
pub use format::{format_reply, FormattedReply, FAILURE_MESSAGE, GREETING};
pub use session::{ConversationSession, Outbound, SendOutcome, SessionError};
pub use timeline::{Message, MessageId, NewMessage, Role, Timeline, TimelineError, TimelineItem};

/// Returns the engine version.
pub fn engine_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
