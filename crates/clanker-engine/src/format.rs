//! Human-readable text for bot replies.
//!
//! Everything here is pure: the same input always yields the same text.

use crate::api::{Business, ConversationReply};
use crate::extract::extract_businesses;
use std::fmt::Write;

/// Greeting shown when a session starts.
pub const GREETING: &str = "Hey, I'm Clanker, your personal butler, what are you trying to schedule?";

/// Content of a bot placeholder while its request is outstanding.
pub const PENDING_PLACEHOLDER: &str = "typing...";

/// Content a placeholder resolves to when its request fails.
pub const FAILURE_MESSAGE: &str = "sorry there was an issue try again";

/// Generic progress strings shown once every business has been called.
pub const FINAL_PROGRESS: [&str; 4] = [
    "Compiling results...",
    "Comparing times...",
    "Scheduling...",
    "Gathering results...",
];

/// Appointment slot quoted in the final confirmation.
pub const APPOINTMENT_TIME: &str = "Tomorrow at 2:30 PM";

/// What a reply turns into.
#[derive(Debug, Clone, PartialEq)]
pub enum FormattedReply {
    /// Final text for the placeholder.
    Text(String),
    /// Two or more businesses: run the cycling sequence.
    Cycle(Vec<Business>),
}

/// Format a service reply for display.
///
/// Zero businesses yields the raw reply, one yields a booking confirmation,
/// more hands off to the cycling sequence.
pub fn format_reply(reply: &ConversationReply) -> FormattedReply {
    let extraction = extract_businesses(&reply.response_message, reply.businesses.as_deref());

    match extraction {
        None => FormattedReply::Text(reply.response_message.clone()),
        Some(extraction) => match extraction.businesses.as_slice() {
            [single] => FormattedReply::Text(format_single_confirmation(single)),
            _ => FormattedReply::Cycle(extraction.businesses),
        },
    }
}

/// Confirmation for a reply that named exactly one business.
pub fn format_single_confirmation(business: &Business) -> String {
    format!(
        "Perfect! I've made an appointment for you at {name}.\n\
         \n\
         \u{1f4de} Call them at {number} to confirm your appointment.\n\
         \n\
         \u{1f4cd} {name}\n\
         \u{2b50} {stars} stars | {price}\n\
         \u{1f552} {hours}",
        name = business.name,
        number = business.phone_number,
        stars = business.stars(),
        price = business.price_range,
        hours = business.hours,
    )
}

/// Count summary that resolves the placeholder when cycling starts.
pub fn format_announcement(count: usize) -> String {
    format!("I found {count} great places for you!")
}

/// Content of the cycling message while a business is being "called".
pub fn format_kickoff(business: &Business) -> String {
    format!(
        "Kicking off call with {} ({}\u{2b50})...",
        business.name,
        business.stars()
    )
}

/// Confirmation appended after the cycling sequence finishes.
pub fn format_final_confirmation(business: &Business) -> String {
    format!(
        "\u{2705} Successfully confirmed appointment with {}! \u{1f4c5} {APPOINTMENT_TIME} \u{1f4de} {} \u{2b50} {} stars",
        business.name,
        business.phone_number,
        business.stars()
    )
}

/// Numbered overview of every candidate business.
pub fn format_businesses_list(businesses: &[Business]) -> String {
    let mut out = format!("I found {} great options for you:\n\n", businesses.len());
    for (i, business) in businesses.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. {} ({}\u{2b50} {})",
            i + 1,
            business.name,
            business.stars(),
            business.price_range
        );
    }
    out.push_str("\nLet me contact each one to check their availability...");
    out
}

/// Detail card for one business while it is being contacted.
pub fn format_contact_message(business: &Business, index: usize, total: usize) -> String {
    format!(
        "I'm contacting {name} for you ({pos}/{total}):\n\
         \n\
         \u{1f4cd} {name}\n\
         \u{1f4de} {number}\n\
         \u{2b50} {stars} stars | {price}\n\
         \u{1f552} {hours}\n\
         \n\
         Let me check their availability...",
        name = business.name,
        pos = index + 1,
        number = business.phone_number,
        stars = business.stars(),
        price = business.price_range,
        hours = business.hours,
    )
}
