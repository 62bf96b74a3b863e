//! Reply styles.
//!
//! A `Style` picks the system preamble sent to every provider and the canned
//! text used when the chain falls through to `static_response`.

use serde::{Deserialize, Serialize};

/// Tone and verbosity of the assistant's replies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    /// One or two short sentences, straight to the booking.
    #[default]
    Quick,
    /// Fuller answers with fare and route explanations.
    Detailed,
    /// Focused on arranging a ride for a later time.
    Schedule,
}

const BASE_PREAMBLE: &str = "You are the booking assistant of a taxi-hailing app. \
Help the user book a ride by collecting a pickup location, a dropoff location and \
a pickup time. Never invent prices, drivers or arrival times. Answer in the \
language the user writes in.";

impl Style {
    /// System preamble for this style.
    pub fn system_preamble(self) -> String {
        let tail = match self {
            Style::Quick => "Keep every reply to one or two short sentences.",
            Style::Detailed => {
                "Give complete, friendly answers and explain each step of the booking."
            }
            Style::Schedule => {
                "The user wants to schedule a ride in advance. Always confirm the date \
                 and time of the pickup."
            }
        };
        format!("{BASE_PREAMBLE} {tail}")
    }

    /// Canned reply used when no provider is reachable.
    pub fn static_response(self) -> &'static str {
        match self {
            Style::Quick => {
                "I can help you book a ride. Tell me where to pick you up and where you're going."
            }
            Style::Detailed => {
                "I'm here to help you book a ride. Please share your pickup address and your \
                 destination, and I'll prepare the booking. You can also type an address and \
                 tell me whether it's your pickup or dropoff."
            }
            Style::Schedule => {
                "I can schedule a ride for you. Please tell me your pickup address, your \
                 destination, and when you'd like to be picked up."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preamble_differs_per_style() {
        let quick = Style::Quick.system_preamble();
        let schedule = Style::Schedule.system_preamble();
        assert!(quick.starts_with(BASE_PREAMBLE));
        assert!(schedule.contains("schedule a ride"));
        assert_ne!(quick, schedule);
    }

    #[test]
    fn test_style_deserializes_lowercase() {
        let style: Style = serde_yaml::from_str("schedule").unwrap();
        assert_eq!(style, Style::Schedule);
        assert_eq!(Style::default(), Style::Quick);
    }
}
