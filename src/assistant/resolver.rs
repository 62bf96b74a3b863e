//! Dialogue resolver: per-turn state machine.
//!
//! Given a message, the caller's context and the outputs of the matcher,
//! classifier and extractor, decide whether to answer locally or hand the
//! turn to the completion providers. Pure and synchronous.
//!
//! Rules are tried in a fixed order and the first one that applies wins:
//!
//! 0. corpus match
//! 1. trivial greeting
//! 2. bare `pickup` / `dropoff`
//! 3. affirmative to the pickup-or-dropoff question
//! 4. both locations in one message
//! 5. second address while one slot is already known
//! 6. bare address
//! 7. learned answer to a similar context-free message
//! 8. delegate

use std::sync::LazyLock;

use regex::Regex;

use super::booking::{project_pair, project_slot};
use super::context::{DialogueState, PICKUP_OR_DROPOFF};
use super::corpus::Corpus;
use super::intent::{classify_intent, has_booking_word, has_payment_word, is_greeting, is_query};
use super::slots::extract_booking_details;
use super::types::{
    AiResponse, ConversationContext, Intent, PartialBooking, PendingLocation, Rule, Slot,
    TrainingExample,
};

// ─── Canned replies ─────────────────────────────────────────────────────────

pub const GREETING_REPLY: &str = "Hello! I can book a taxi for you. \
Where would you like to be picked up, and where are you going?";

pub const ADDRESS_FIRST_REPLY: &str = "Please enter the address first, then tell me \
whether it's your pickup or dropoff location.";

pub const OUTAGE_REPLY: &str = "Sorry, I'm having trouble answering right now. \
Please try again in a moment. Your booking details so far are kept.";

/// `last_question` after both locations are known.
pub const PICKUP_TIME_QUESTION: &str = "When would you like to be picked up?";

const TRIVIAL_GREETINGS: &[&str] = &["hi", "hello", "hey"];

const AFFIRMATIVES: &[&str] = &["yes", "yeah", "yep", "sure", "okay", "ok", "yup", "y"];

/// Single-word replies that are never read as an address.
const RESERVED: &[&str] = &[
    "pickup", "dropoff", "pick up", "drop off", "no", "nope", "nah", "cancel", "stop", "thanks",
    "thank you", "hi", "hello", "hey",
];

static BARE_ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[a-z0-9\s,.-]+$").unwrap());

// ─── Turn input / decision ──────────────────────────────────────────────────

/// Everything the resolver looks at for one turn.
#[derive(Debug, Clone)]
pub struct TurnInput<'a> {
    pub message: &'a str,
    pub context: &'a ConversationContext,
    pub corpus_match: Option<&'a TrainingExample>,
    pub learned_match: Option<&'a TrainingExample>,
    pub intent: Intent,
    pub extracted: Option<PartialBooking>,
}

impl<'a> TurnInput<'a> {
    /// Run the matcher, classifier and extractor over `message`.
    pub fn analyze(
        message: &'a str,
        context: &'a ConversationContext,
        corpus: &'a Corpus,
    ) -> Self {
        Self {
            message,
            context,
            corpus_match: corpus.find_matching_example(message),
            learned_match: corpus.find_learned_example(message),
            intent: classify_intent(message),
            extracted: extract_booking_details(message),
        }
    }

    fn normalized(&self) -> String {
        self.message.trim().to_lowercase()
    }

    /// Whether a delegated reply to this turn depends on the message alone:
    /// no dialogue state or booking history went into the prompt, and the
    /// message is not a yes/no style token.
    pub fn is_context_free(&self) -> bool {
        let normalized = self.normalized();
        self.context.last_question.is_none()
            && self.context.pending_location.is_none()
            && self.context.previous_bookings.is_empty()
            && !AFFIRMATIVES.contains(&normalized.as_str())
            && !RESERVED.contains(&normalized.as_str())
    }
}

/// What the resolver decided for a turn.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Answer locally.
    Reply { rule: Rule, response: AiResponse },
    /// Ask the completion providers with this prompt.
    Delegate { prompt: String },
}

impl Decision {
    pub fn rule(&self) -> Rule {
        match self {
            Decision::Reply { rule, .. } => *rule,
            Decision::Delegate { .. } => Rule::Delegated,
        }
    }
}

type RuleFn = fn(&TurnInput<'_>) -> Option<Decision>;

/// Resolve a turn. Deterministic for a given input.
pub fn resolve(input: &TurnInput<'_>) -> Decision {
    const RULES: [RuleFn; 8] = [
        corpus_rule,
        greeting_rule,
        slot_keyword_rule,
        affirmative_rule,
        full_extraction_rule,
        complementary_fill_rule,
        bare_address_rule,
        learned_rule,
    ];

    RULES
        .iter()
        .find_map(|rule| rule(input))
        .unwrap_or_else(|| Decision::Delegate {
            prompt: build_prompt(input),
        })
}

fn reply(rule: Rule, response: AiResponse) -> Option<Decision> {
    Some(Decision::Reply { rule, response })
}

// ─── Rules ──────────────────────────────────────────────────────────────────

/// 0. Replay a curated corpus answer. The example's context hint wins over
/// the incoming context.
pub fn corpus_rule(input: &TurnInput<'_>) -> Option<Decision> {
    let example = input.corpus_match?;
    let hint = example.context.clone().unwrap_or_default();
    reply(
        Rule::CorpusMatch,
        AiResponse {
            content: example.ai_response.clone(),
            last_question: hint
                .last_question
                .or_else(|| input.context.last_question.clone()),
            pending_location: hint
                .pending_location
                .or_else(|| input.context.pending_location.clone()),
            booking: None,
        },
    )
}

/// 1. `hi` / `hello` / `hey` reset the conversation.
pub fn greeting_rule(input: &TurnInput<'_>) -> Option<Decision> {
    if !TRIVIAL_GREETINGS.contains(&input.normalized().as_str()) {
        return None;
    }
    reply(
        Rule::Greeting,
        AiResponse {
            content: GREETING_REPLY.to_string(),
            last_question: None,
            pending_location: None,
            booking: None,
        },
    )
}

/// 2. The user names the slot for the pending address.
pub fn slot_keyword_rule(input: &TurnInput<'_>) -> Option<Decision> {
    let slot = match input.normalized().as_str() {
        "pickup" => Slot::Pickup,
        "dropoff" => Slot::Dropoff,
        _ => return None,
    };

    let Some(pending) = &input.context.pending_location else {
        return reply(
            Rule::SlotWithoutAddress,
            AiResponse {
                content: ADDRESS_FIRST_REPLY.to_string(),
                last_question: input.context.last_question.clone(),
                pending_location: None,
                booking: None,
            },
        );
    };

    let question = format!("What's your {} address?", slot.other().as_str());
    reply(
        Rule::SlotAssigned,
        AiResponse {
            content: format!(
                "Got it, {} is your {} location. {question}",
                pending.address,
                slot.as_str()
            ),
            last_question: Some(question),
            pending_location: Some(PendingLocation {
                address: pending.address.clone(),
                slot: Some(slot),
            }),
            booking: Some(project_slot(slot, &pending.address)),
        },
    )
}

/// 3. "yes" to "pickup or dropoff?" does not say which one; ask again.
pub fn affirmative_rule(input: &TurnInput<'_>) -> Option<Decision> {
    if !AFFIRMATIVES.contains(&input.normalized().as_str())
        || !input.context.asked_pickup_or_dropoff()
    {
        return None;
    }
    let content = match &input.context.pending_location {
        Some(pending) => format!(
            "Please type \"pickup\" or \"dropoff\" so I know how to use {}.",
            pending.address
        ),
        None => "Please type \"pickup\" or \"dropoff\".".to_string(),
    };
    reply(
        Rule::AffirmativeReask,
        AiResponse {
            content,
            last_question: Some(PICKUP_OR_DROPOFF.to_string()),
            pending_location: input.context.pending_location.clone(),
            booking: None,
        },
    )
}

/// 4. "from X to Y" in a single message.
pub fn full_extraction_rule(input: &TurnInput<'_>) -> Option<Decision> {
    let booking = input.extracted.clone()?;
    let (pickup, dropoff) = match (&booking.pickup_location, &booking.dropoff_location) {
        (Some(p), Some(d)) => (p.address.clone(), d.address.clone()),
        _ => return None,
    };
    reply(Rule::FullExtraction, both_known(&pickup, &dropoff, booking))
}

/// 5. One slot is known and the user sends the other address.
pub fn complementary_fill_rule(input: &TurnInput<'_>) -> Option<Decision> {
    let DialogueState::LocationTyped(known) = input.context.state() else {
        return None;
    };
    let pending = input.context.pending_location.as_ref()?;
    if !is_bare_address(input) {
        return None;
    }
    let new_address = input.message.trim();
    let (pickup, dropoff) = match known {
        Slot::Pickup => (pending.address.as_str(), new_address),
        Slot::Dropoff => (new_address, pending.address.as_str()),
    };
    reply(
        Rule::ComplementaryFill,
        both_known(pickup, dropoff, project_pair(pickup, dropoff)),
    )
}

/// 6. Something that looks like an address: ask which slot it fills.
pub fn bare_address_rule(input: &TurnInput<'_>) -> Option<Decision> {
    if !is_bare_address(input) {
        return None;
    }
    let address = input.message.trim().to_string();
    reply(
        Rule::BareAddress,
        AiResponse {
            content: format!("Is {address} your pickup or dropoff location?"),
            last_question: Some(PICKUP_OR_DROPOFF.to_string()),
            pending_location: Some(PendingLocation {
                address,
                slot: None,
            }),
            booking: None,
        },
    )
}

/// 7. Replay a provider answer learned from an earlier context-free turn.
/// Dialogue fields pass through.
pub fn learned_rule(input: &TurnInput<'_>) -> Option<Decision> {
    let example = input.learned_match?;
    reply(
        Rule::LearnedMatch,
        delegated_response(input.context, example.ai_response.clone()),
    )
}

fn both_known(pickup: &str, dropoff: &str, booking: PartialBooking) -> AiResponse {
    AiResponse {
        content: format!("Great! A ride from {pickup} to {dropoff}. {PICKUP_TIME_QUESTION}"),
        last_question: Some(PICKUP_TIME_QUESTION.to_string()),
        pending_location: None,
        booking: Some(booking),
    }
}

/// Address-shaped text: letters, digits, spaces, `,.-`, no `?`, not a
/// reserved word, no leading greeting or question word, and no booking or
/// payment keyword as a whole word.
pub fn is_bare_address(input: &TurnInput<'_>) -> bool {
    let trimmed = input.message.trim();
    let normalized = trimmed.to_lowercase();
    !trimmed.contains('?')
        && trimmed.chars().any(char::is_alphanumeric)
        && BARE_ADDRESS.is_match(trimmed)
        && !RESERVED.contains(&normalized.as_str())
        && !AFFIRMATIVES.contains(&normalized.as_str())
        && !is_greeting(trimmed)
        && !is_query(trimmed)
        && !has_booking_word(trimmed)
        && !has_payment_word(trimmed)
}

// ─── Delegation ─────────────────────────────────────────────────────────────

/// The user prompt sent to the providers: context first, then the message.
pub fn build_prompt(input: &TurnInput<'_>) -> String {
    let mut prompt = String::from("Conversation context:\n");
    prompt.push_str(&format!("- Detected intent: {}\n", input.intent.as_str()));
    for line in input.context.prompt_lines() {
        prompt.push_str(&format!("- {line}\n"));
    }
    prompt.push_str(&format!("\nUser message: {}", input.message.trim()));
    prompt
}

/// Reply for a delegated turn: provider text, dialogue fields passed through.
pub fn delegated_response(context: &ConversationContext, content: String) -> AiResponse {
    AiResponse {
        content,
        last_question: context.last_question.clone(),
        pending_location: context.pending_location.clone(),
        booking: None,
    }
}

/// Reply when no provider could answer. The context is preserved so the
/// user can retry without losing slot state.
pub fn outage_response(context: &ConversationContext) -> AiResponse {
    delegated_response(context, OUTAGE_REPLY.to_string())
}

// ─── Tests ──────────────────────────────────────────────────────────────────
