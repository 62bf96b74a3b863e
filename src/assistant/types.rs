//! Shared types across the assistant core.
//!
//! Field names serialize as camelCase so the chat UI can persist a
//! `ConversationContext` or read an `AiResponse` without a mapping layer.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Intent ─────────────────────────────────────────────────────────────────

/// Coarse classification of a single message. Never stored across turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Greeting,
    Booking,
    Location,
    Payment,
    Query,
    Unknown,
}

impl Intent {
    pub fn as_str(self) -> &'static str {
        match self {
            Intent::Greeting => "greeting",
            Intent::Booking => "booking",
            Intent::Location => "location",
            Intent::Payment => "payment",
            Intent::Query => "query",
            Intent::Unknown => "unknown",
        }
    }
}

// ─── Locations and bookings ─────────────────────────────────────────────────

/// Which booking field an address fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Pickup,
    Dropoff,
}

impl Slot {
    /// The slot still to be filled once this one is.
    pub fn other(self) -> Slot {
        match self {
            Slot::Pickup => Slot::Dropoff,
            Slot::Dropoff => Slot::Pickup,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Slot::Pickup => "pickup",
            Slot::Dropoff => "dropoff",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub address: String,
    pub coordinates: Coordinates,
}

/// Booking fields collected so far. Owned by the booking UI once returned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialBooking {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup_location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dropoff_location: Option<Location>,
}

/// A finished booking from the caller's datastore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub pickup: Location,
    pub dropoff: Location,
    pub requested_at: DateTime<Utc>,
}

/// An address captured but not yet (or only just) assigned to a slot.
///
/// `slot` is `None` while waiting for the user to say pickup or dropoff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingLocation {
    pub address: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<Slot>,
}

// ─── Context ────────────────────────────────────────────────────────────────

/// Per-conversation state, threaded through each turn by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_location: Option<PendingLocation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub previous_bookings: Vec<Booking>,
}

/// The subset of context a training example may set when it is replayed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextHint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_location: Option<PendingLocation>,
}

// ─── Corpus ─────────────────────────────────────────────────────────────────

/// A stored (input, response) pair used for similarity lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingExample {
    #[serde(default)]
    pub id: Option<String>,
    pub user_input: String,
    pub ai_response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub entities: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ContextHint>,
}

impl TrainingExample {
    pub fn new(user_input: impl Into<String>, ai_response: impl Into<String>) -> Self {
        Self {
            id: None,
            user_input: user_input.into(),
            ai_response: ai_response.into(),
            intent: None,
            entities: BTreeMap::new(),
            context: None,
        }
    }
}

// ─── Turn output ────────────────────────────────────────────────────────────

/// What one turn returns to the chat UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiResponse {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_location: Option<PendingLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking: Option<PartialBooking>,
}

/// Which resolver rule produced a turn's reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    CorpusMatch,
    Greeting,
    SlotWithoutAddress,
    SlotAssigned,
    AffirmativeReask,
    FullExtraction,
    ComplementaryFill,
    BareAddress,
    LearnedMatch,
    Delegated,
}

impl Rule {
    pub fn as_str(self) -> &'static str {
        match self {
            Rule::CorpusMatch => "corpus_match",
            Rule::Greeting => "greeting",
            Rule::SlotWithoutAddress => "slot_without_address",
            Rule::SlotAssigned => "slot_assigned",
            Rule::AffirmativeReask => "affirmative_reask",
            Rule::FullExtraction => "full_extraction",
            Rule::ComplementaryFill => "complementary_fill",
            Rule::BareAddress => "bare_address",
            Rule::LearnedMatch => "learned_match",
            Rule::Delegated => "delegated",
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_location_type_field() {
        let pending = PendingLocation {
            address: "Main St".into(),
            slot: Some(Slot::Pickup),
        };
        let json = serde_json::to_value(&pending).unwrap();
        assert_eq!(json["type"], "pickup");

        let untyped: PendingLocation = serde_json::from_str(r#"{"address":"Main St"}"#).unwrap();
        assert!(untyped.slot.is_none());
    }

    #[test]
    fn test_context_camel_case() {
        let ctx: ConversationContext = serde_json::from_str(
            r#"{"lastQuestion":"pickup or dropoff","pendingLocation":{"address":"5th Ave"}}"#,
        )
        .unwrap();
        assert_eq!(ctx.last_question.as_deref(), Some("pickup or dropoff"));
        assert_eq!(ctx.pending_location.unwrap().address, "5th Ave");
        assert!(ctx.previous_bookings.is_empty());
    }

    #[test]
    fn test_ai_response_omits_empty_fields() {
        let response = AiResponse {
            content: "Hello".into(),
            last_question: None,
            pending_location: None,
            booking: None,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"content":"Hello"}"#);
    }

    #[test]
    fn test_slot_other() {
        assert_eq!(Slot::Pickup.other(), Slot::Dropoff);
        assert_eq!(Slot::Dropoff.other(), Slot::Pickup);
    }

    #[test]
    fn test_training_example_from_yaml() {
        let example: TrainingExample = serde_yaml::from_str(
            r#"
            userInput: "how much is a ride to the airport"
            aiResponse: "Airport rides start at a flat rate."
            intent: payment
            entities:
              destination: airport
            "#,
        )
        .unwrap();
        assert_eq!(example.intent, Some(Intent::Payment));
        assert_eq!(example.entities["destination"], "airport");
        assert!(example.context.is_none());
    }
}
