//! Assistant core: conversational booking dialogue.
//!
//! Each turn flows through:
//! - `similarity` / `corpus`: curated answers from the training corpus
//! - `intent`: keyword classification
//! - `slots`: pickup/dropoff extraction
//! - `resolver`: ordered dialogue rules, or delegation to the providers
//! - `booking`: projection of addresses into booking locations
//! - `context`: the context handed back for the next turn
//!
//! `pipeline::Assistant` ties these together with the provider chain.

pub mod booking;
pub mod context;
pub mod corpus;
pub mod errors;
pub mod intent;
pub mod pipeline;
pub mod resolver;
pub mod similarity;
pub mod slots;
pub mod types;

// Re-exports for convenience
pub use context::DialogueState;
pub use corpus::{Corpus, CorpusStore};
pub use errors::AssistantError;
pub use pipeline::{Assistant, Turn};
pub use types::{
    AiResponse, Booking, ConversationContext, Coordinates, Intent, Location, PartialBooking,
    PendingLocation, Rule, Slot, TrainingExample,
};
