//! Typing indicator shown in place of a bot reply that is still loading.

use std::time::Duration;

/// Sentences the indicator rotates through.
pub const TYPING_SENTENCES: [&str; 8] = [
    "Searching the internet...",
    "Checking nearby services...",
    "Almost there...",
    "Making calls...",
    "Contacting relevant parties...",
    "Gathering information...",
    "Processing your request...",
    "Compiling results...",
];

/// How long each sentence stays up.
pub const SENTENCE_INTERVAL: Duration = Duration::from_secs(2);

/// Sentence to show after `tick` ticks of `tick_rate` each.
pub fn typing_sentence(tick: usize, tick_rate: Duration) -> &'static str {
    let ticks_per_sentence = ticks_per(SENTENCE_INTERVAL, tick_rate);
    TYPING_SENTENCES[(tick / ticks_per_sentence) % TYPING_SENTENCES.len()]
}

#[allow(clippy::cast_possible_truncation)]
fn ticks_per(interval: Duration, tick_rate: Duration) -> usize {
    let rate = tick_rate.as_millis().max(1);
    ((interval.as_millis() / rate) as usize).max(1)
}
