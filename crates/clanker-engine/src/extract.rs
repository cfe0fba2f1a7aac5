//! Recover business data from replies that may carry it structured or
//! embedded as JSON inside the message text.
//!
//! Tiers, tried in order:
//! 1. the structured `businesses` field of the response
//! 2. the whole reply parsed as a JSON object with a `businesses` field
//! 3. a flat `{ ... "businesses" ... }` fragment matched by regex
//! 4. the first balanced top-level JSON object in the reply that holds `"businesses"`
//!
//! Every failure is logged and swallowed; callers fall back to raw text.

use crate::api::{business_map, Business};
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

/// Marker that must appear in the text before any parsing is attempted.
const BUSINESSES_MARKER: &str = "\"businesses\"";

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default, with = "business_map")]
    businesses: Option<Vec<Business>>,
}

/// Which tier produced the businesses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSource {
    Structured,
    WholeMessage,
    Fragment,
    BalancedObject,
}

/// Businesses recovered from a reply.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub businesses: Vec<Business>,
    pub source: ExtractionSource,
}

fn fragment_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"\{[^}]*"businesses"[^}]*\}"#).ok())
        .as_ref()
}

/// Extract businesses from a response.
///
/// Returns `None` when no tier recovers a non-empty business list.
pub fn extract_businesses(
    response_message: &str,
    structured: Option<&[Business]>,
) -> Option<Extraction> {
    if let Some(businesses) = structured {
        return non_empty(businesses.to_vec(), ExtractionSource::Structured);
    }

    if !response_message.contains(BUSINESSES_MARKER) {
        return None;
    }

    match serde_json::from_str::<Envelope>(response_message) {
        Ok(envelope) => {
            return envelope
                .businesses
                .and_then(|b| non_empty(b, ExtractionSource::WholeMessage));
        }
        Err(e) => {
            tracing::debug!(error = %e, "Reply is not a businesses JSON document");
        }
    }

    if let Some(found) = fragment_regex().and_then(|re| re.find(response_message)) {
        match serde_json::from_str::<Envelope>(found.as_str()) {
            Ok(envelope) => {
                if let Some(extraction) = envelope
                    .businesses
                    .and_then(|b| non_empty(b, ExtractionSource::Fragment))
                {
                    return Some(extraction);
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "Failed to parse businesses JSON fragment");
            }
        }
    }

    for candidate in balanced_objects(response_message) {
        if !candidate.contains(BUSINESSES_MARKER) {
            continue;
        }
        match serde_json::from_str::<Envelope>(candidate) {
            Ok(envelope) => {
                if let Some(extraction) = envelope
                    .businesses
                    .and_then(|b| non_empty(b, ExtractionSource::BalancedObject))
                {
                    return Some(extraction);
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "Embedded object is not a businesses document");
            }
        }
    }

    tracing::debug!("Reply mentions businesses but none could be recovered");
    None
}

fn non_empty(businesses: Vec<Business>, source: ExtractionSource) -> Option<Extraction> {
    if businesses.is_empty() {
        None
    } else {
        Some(Extraction { businesses, source })
    }
}

/// Yield every top-level balanced `{...}` span in `text`, outermost first.
///
/// String literals are skipped so braces inside quotes don't count.
fn balanced_objects(text: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = Some(idx);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(begin) = start.take() {
                        spans.push(&text[begin..=idx]);
                    }
                }
            }
            _ => {}
        }
    }

    spans
}
