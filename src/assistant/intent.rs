//! Keyword intent classification.
//!
//! Ordered rules, first match wins. Each rule is a standalone predicate so
//! the priority list can be tested one rule at a time.

use std::sync::LazyLock;

use regex::Regex;

use super::types::Intent;

static GREETING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(hi|hello|hey|good\s+(morning|afternoon|evening))\b").unwrap()
});

static BOOKING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(book|ride|taxi|cab|trip|journey|travel)").unwrap());

static LOCATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(location|address|where|place|pickup|pick\s+up|dropoff|drop\s+off|destination|street|road|avenue|airport|station|hotel)",
    )
    .unwrap()
});

static PAYMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(pay|card|credit|debit|wallet|cash|money|fare|price|cost)").unwrap()
});

/// Whole-word forms of the booking and payment keywords, for checks where a
/// prefix hit ("Bookham Lane") must not count.
static BOOKING_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(book|booking|booked|ride|rides|taxi|taxis|cab|cabs|trip|trips|journey|travel)\b")
        .unwrap()
});

static PAYMENT_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(pay|paying|payment|card|credit|debit|wallet|cash|money|fare|price|cost)\b")
        .unwrap()
});

static QUESTION_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(what|how|when|where|why|who|which|can|could|would|will|is|are|do|does)\b")
        .unwrap()
});

pub fn is_greeting(message: &str) -> bool {
    GREETING.is_match(message)
}

pub fn is_booking(message: &str) -> bool {
    BOOKING.is_match(message)
}

pub fn is_location(message: &str) -> bool {
    LOCATION.is_match(message)
}

pub fn is_payment(message: &str) -> bool {
    PAYMENT.is_match(message)
}

/// A booking keyword as a whole word.
pub fn has_booking_word(message: &str) -> bool {
    BOOKING_WORD.is_match(message)
}

/// A payment keyword as a whole word.
pub fn has_payment_word(message: &str) -> bool {
    PAYMENT_WORD.is_match(message)
}

pub fn is_query(message: &str) -> bool {
    message.contains('?') || QUESTION_WORD.is_match(message)
}

/// Classify a raw message. Rule order is part of the contract.
pub fn classify_intent(message: &str) -> Intent {
    let rules: [(fn(&str) -> bool, Intent); 5] = [
        (is_greeting, Intent::Greeting),
        (is_booking, Intent::Booking),
        (is_location, Intent::Location),
        (is_payment, Intent::Payment),
        (is_query, Intent::Query),
    ];

    rules
        .iter()
        .find(|(matches, _)| matches(message))
        .map(|(_, intent)| *intent)
        .unwrap_or(Intent::Unknown)
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting_only_at_start() {
        assert!(is_greeting("Hello, I need a cab"));
        assert!(is_greeting("good  evening"));
        assert!(!is_greeting("well hello"));
        assert!(!is_greeting("history of the city"));
    }

    #[test]
    fn test_booking_keywords() {
        assert!(is_booking("I want to BOOK something"));
        assert!(is_booking("bookings for tomorrow"));
        assert!(!is_booking("override"));
    }

    #[test]
    fn test_location_keywords() {
        assert!(is_location("what's the address"));
        assert!(is_location("pick up near the station"));
        assert!(!is_location("thanks a lot"));
    }

    #[test]
    fn test_payment_keywords() {
        assert!(is_payment("Can I use my credit card"));
        assert!(!is_payment("repayment"));
    }

    #[test]
    fn test_whole_word_keywords() {
        assert!(has_booking_word("book a cab"));
        assert!(has_booking_word("my trip"));
        assert!(!has_booking_word("10 Cabot Place"));
        assert!(!has_booking_word("Bookham Lane"));
        assert!(!has_booking_word("Travelodge"));
        assert!(has_payment_word("pay by card"));
        assert!(!has_payment_word("Cardiff Road"));
        assert!(!has_payment_word("Payne Street"));
        // prefix matching still classifies these
        assert_eq!(classify_intent("10 Cabot Place"), Intent::Booking);
    }

    #[test]
    fn test_query_detection() {
        assert!(is_query("When does it arrive"));
        assert!(is_query("driver name?"));
        assert!(!is_query("thank you"));
    }

    #[test]
    fn test_rule_order() {
        // greeting beats booking
        assert_eq!(classify_intent("hi, book me a taxi"), Intent::Greeting);
        // booking beats location
        assert_eq!(classify_intent("ride to the airport"), Intent::Booking);
        // location beats payment
        assert_eq!(classify_intent("pay at the station"), Intent::Location);
        // payment beats query
        assert_eq!(classify_intent("can I pay cash?"), Intent::Payment);
        // "where" is a location keyword before it is a question word
        assert_eq!(classify_intent("where are you"), Intent::Location);
        assert_eq!(classify_intent("how long will it take"), Intent::Query);
        assert_eq!(classify_intent("thanks"), Intent::Unknown);
        assert_eq!(classify_intent("42 Baker Lane"), Intent::Unknown);
    }
}
