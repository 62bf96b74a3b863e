//! Context store: how a `ConversationContext` moves from turn to turn.
//!
//! A context is never edited in place. Each turn reads the caller's context
//! and the pipeline hands back a new one via [`ConversationContext::advance`].

use super::types::{AiResponse, Booking, ConversationContext, PendingLocation, Slot};

/// Marker the resolver puts in `last_question` while waiting for the user to
/// say which slot a pending address fills.
pub const PICKUP_OR_DROPOFF: &str = "pickup or dropoff";

/// Maximum number of previous bookings summarized in a delegated prompt.
const RECENT_BOOKINGS_IN_PROMPT: usize = 3;

/// Where the slot-filling dialogue currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogueState {
    /// No pending address.
    Idle,
    /// An address is pending and its slot is unknown.
    AwaitingLocationType,
    /// An address is pending in a known slot; the other slot is being asked for.
    LocationTyped(Slot),
}

impl ConversationContext {
    /// A fresh context carrying the user's booking history.
    pub fn with_previous_bookings(previous_bookings: Vec<Booking>) -> Self {
        Self {
            previous_bookings,
            ..Self::default()
        }
    }

    pub fn state(&self) -> DialogueState {
        match &self.pending_location {
            None => DialogueState::Idle,
            Some(PendingLocation { slot: None, .. }) => DialogueState::AwaitingLocationType,
            Some(PendingLocation {
                slot: Some(slot), ..
            }) => DialogueState::LocationTyped(*slot),
        }
    }

    /// Whether the last question asked the user to pick a slot.
    pub fn asked_pickup_or_dropoff(&self) -> bool {
        self.last_question
            .as_deref()
            .is_some_and(|q| q.to_lowercase().contains(PICKUP_OR_DROPOFF))
    }

    /// The context for the next turn, as the caller should persist it.
    pub fn advance(&self, response: &AiResponse) -> ConversationContext {
        ConversationContext {
            last_question: response.last_question.clone(),
            pending_location: response.pending_location.clone(),
            previous_bookings: self.previous_bookings.clone(),
        }
    }

    /// Context-dependent lines for a delegated prompt.
    pub fn prompt_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(question) = &self.last_question {
            lines.push(format!("Last question asked: {question}"));
        }
        match &self.pending_location {
            Some(PendingLocation {
                address,
                slot: Some(slot),
            }) => lines.push(format!(
                "Known {} location: {address}. Still needed: {} location.",
                slot.as_str(),
                slot.other().as_str()
            )),
            Some(PendingLocation { address, slot: None }) => lines.push(format!(
                "The user mentioned \"{address}\" but has not said whether it is the pickup or dropoff."
            )),
            None => {}
        }
        let recent: Vec<String> = self
            .previous_bookings
            .iter()
            .rev()
            .take(RECENT_BOOKINGS_IN_PROMPT)
            .map(|b| format!("{} → {}", b.pickup.address, b.dropoff.address))
            .collect();
        if !recent.is_empty() {
            lines.push(format!("Recent trips: {}", recent.join("; ")));
        }
        lines
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::booking::placeholder_location;
    use chrono::Utc;

    fn booking(id: &str, from: &str, to: &str) -> Booking {
        Booking {
            id: id.to_string(),
            pickup: placeholder_location(from),
            dropoff: placeholder_location(to),
            requested_at: Utc::now(),
        }
    }

    #[test]
    fn test_state_transitions() {
        let mut ctx = ConversationContext::default();
        assert_eq!(ctx.state(), DialogueState::Idle);

        ctx.pending_location = Some(PendingLocation {
            address: "Main St".into(),
            slot: None,
        });
        assert_eq!(ctx.state(), DialogueState::AwaitingLocationType);

        ctx.pending_location = Some(PendingLocation {
            address: "Main St".into(),
            slot: Some(Slot::Pickup),
        });
        assert_eq!(ctx.state(), DialogueState::LocationTyped(Slot::Pickup));
    }

    #[test]
    fn test_asked_pickup_or_dropoff() {
        let mut ctx = ConversationContext::default();
        assert!(!ctx.asked_pickup_or_dropoff());
        ctx.last_question = Some("Is this your Pickup or Dropoff location?".into());
        assert!(ctx.asked_pickup_or_dropoff());
        ctx.last_question = Some("pickup time".into());
        assert!(!ctx.asked_pickup_or_dropoff());
    }

    #[test]
    fn test_advance_keeps_history_and_replaces_dialogue_fields() {
        let ctx = ConversationContext {
            last_question: Some("old".into()),
            pending_location: None,
            previous_bookings: vec![booking("b1", "Home", "Office")],
        };
        let response = AiResponse {
            content: "Is that your pickup or dropoff?".into(),
            last_question: Some(PICKUP_OR_DROPOFF.into()),
            pending_location: Some(PendingLocation {
                address: "5th Ave".into(),
                slot: None,
            }),
            booking: None,
        };
        let next = ctx.advance(&response);
        assert_eq!(next.last_question.as_deref(), Some(PICKUP_OR_DROPOFF));
        assert_eq!(next.pending_location.unwrap().address, "5th Ave");
        assert_eq!(next.previous_bookings.len(), 1);
        // the original is untouched
        assert_eq!(ctx.last_question.as_deref(), Some("old"));
    }

    #[test]
    fn test_prompt_lines() {
        let ctx = ConversationContext {
            last_question: Some("dropoff address".into()),
            pending_location: Some(PendingLocation {
                address: "Main St".into(),
                slot: Some(Slot::Pickup),
            }),
            previous_bookings: vec![
                booking("b1", "A", "B"),
                booking("b2", "C", "D"),
                booking("b3", "E", "F"),
                booking("b4", "G", "H"),
            ],
        };
        let lines = ctx.prompt_lines();
        assert_eq!(lines[0], "Last question asked: dropoff address");
        assert!(lines[1].contains("Known pickup location: Main St"));
        assert_eq!(lines[2], "Recent trips: G → H; E → F; C → D");
    }

    #[test]
    fn test_prompt_lines_empty_context() {
        assert!(ConversationContext::default().prompt_lines().is_empty());
    }
}
