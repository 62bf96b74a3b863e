//! Pickup/dropoff extraction from free text.
//!
//! Ordered regex patterns per slot, matched against the raw message so the
//! captured addresses keep their original casing. Only a message that yields
//! both slots produces a booking.

use std::sync::LazyLock;

use regex::Regex;

use super::booking::project_pair;
use super::types::PartialBooking;

/// Words that end a pickup capture ("from X to Y", "from X at 5pm").
const PICKUP_END: &str =
    r"(?:\s+(?:to|towards|going|drop|and|at|by|on|around|tomorrow|tonight|today|now|please)\b|[,!?;]|$)";

/// Words that end a dropoff capture ("to Y from X", "to Y tomorrow").
const DROPOFF_END: &str =
    r"(?:\s+(?:from|at|by|on|around|tomorrow|tonight|today|now|please)\b|[,!?;]|$)";

fn compile(prefix: &str, end: &str) -> Regex {
    Regex::new(&format!(r"(?i){prefix}(.+?){end}")).unwrap()
}

static PICKUP_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        compile(r"\bfrom\s+", PICKUP_END),
        compile(r"\bpick\s*-?\s*up\s+(?:at|from)\s+", PICKUP_END),
        compile(r"\bstarting\s+(?:at|from)\s+", PICKUP_END),
    ]
});

static DROPOFF_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        compile(r"\bto\s+", DROPOFF_END),
        compile(r"\bdrop(?:\s*-?\s*off)?\s+(?:at|to)\s+", DROPOFF_END),
        compile(r"\bgoing\s+to\s+", DROPOFF_END),
    ]
});

/// A matched address and where its pattern sat in the text.
struct SlotMatch {
    address: String,
    /// Start of the whole pattern match (keyword included).
    match_start: usize,
    /// End of the captured address.
    capture_end: usize,
}

fn clean_address(raw: &str) -> String {
    raw.trim()
        .trim_end_matches(|c: char| matches!(c, '.' | ',' | '!' | '?' | ';' | ':') || c.is_whitespace())
        .to_string()
}

/// First pattern (in order) that yields a non-empty address.
fn first_match(patterns: &[Regex], text: &str) -> Option<SlotMatch> {
    patterns.iter().find_map(|re| {
        let caps = re.captures(text)?;
        let whole = caps.get(0)?;
        let capture = caps.get(1)?;
        let address = clean_address(capture.as_str());
        (!address.is_empty()).then(|| SlotMatch {
            address,
            match_start: whole.start(),
            capture_end: capture.end(),
        })
    })
}

/// Pickup address alone, if any pattern matches.
pub fn extract_pickup(message: &str) -> Option<String> {
    first_match(&PICKUP_PATTERNS, message).map(|m| m.address)
}

/// Dropoff address alone, if any pattern matches.
pub fn extract_dropoff(message: &str) -> Option<String> {
    first_match(&DROPOFF_PATTERNS, message).map(|m| m.address)
}

/// Extract both locations from a message such as
/// "I need a ride from Central Park to Times Square".
///
/// The dropoff is looked for after the pickup first, then before it.
/// Returns `None` unless both are found.
pub fn extract_booking_details(message: &str) -> Option<PartialBooking> {
    let pickup = first_match(&PICKUP_PATTERNS, message)?;

    let after = &message[pickup.capture_end..];
    let before = &message[..pickup.match_start];
    let dropoff = first_match(&DROPOFF_PATTERNS, after)
        .or_else(|| first_match(&DROPOFF_PATTERNS, before))?;

    Some(project_pair(&pickup.address, &dropoff.address))
}

// ─── Tests ──────────────────────────────────────────────────────────────────
