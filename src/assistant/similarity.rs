//! Bag-of-words similarity between a message and stored example inputs.
//!
//! Jaccard index over whitespace tokens of the lowercased, trimmed strings.
//! Cheap enough to scan the whole corpus on every turn.

use std::collections::HashSet;

use super::types::TrainingExample;

/// Default minimum similarity for a corpus hit (exclusive).
pub const DEFAULT_THRESHOLD: f64 = 0.5;

fn tokens(text: &str) -> HashSet<String> {
    text.trim()
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Jaccard similarity of the two token sets, in `[0.0, 1.0]`.
///
/// Two inputs with no tokens at all score `0.0`.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = tokens(a);
    let b = tokens(b);
    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = a.intersection(&b).count();
    intersection as f64 / union as f64
}

/// The best-scoring example strictly above `threshold`.
///
/// Ties go to the first example in iteration order.
pub fn best_match<'a>(
    input: &str,
    examples: &'a [TrainingExample],
    threshold: f64,
) -> Option<(&'a TrainingExample, f64)> {
    let mut best: Option<(&TrainingExample, f64)> = None;
    for example in examples {
        let score = similarity(input, &example.user_input);
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((example, score)),
        }
    }
    best.filter(|(_, score)| *score > threshold)
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn example(input: &str, response: &str) -> TrainingExample {
        TrainingExample::new(input, response)
    }

    #[test]
    fn test_identical_strings() {
        assert_eq!(similarity("Book a taxi now", "  book a TAXI now "), 1.0);
    }

    #[test]
    fn test_disjoint_strings() {
        assert_eq!(similarity("hello there", "airport fare"), 0.0);
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(similarity("", "   "), 0.0);
        assert_eq!(similarity("", "taxi"), 0.0);
    }

    #[test]
    fn test_partial_overlap() {
        // {how, much, to, airport} vs {how, much, to, station}: 3 / 5
        let score = similarity("how much to airport", "how much to station");
        assert!((score - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_best_match_above_threshold() {
        let corpus = vec![
            example("what payment methods do you accept", "Cards, wallet and cash."),
            example("how much is a ride to the airport", "Airport rides are flat rate."),
        ];
        let (hit, score) = best_match("how much is a ride to the airport?", &corpus, 0.5).unwrap();
        assert_eq!(hit.ai_response, "Airport rides are flat rate.");
        assert!(score > 0.5);
    }

    #[test]
    fn test_best_match_never_below_threshold() {
        // {can, i, pay, cash} vs {can, i, pay, by, card}: 3 / 6 == 0.5, not a hit
        let corpus = vec![example("can i pay by card", "Yes.")];
        assert!(best_match("can i pay cash", &corpus, 0.5).is_none());
    }

    #[test]
    fn test_best_match_tie_goes_to_first() {
        let corpus = vec![
            example("cancel my ride", "first"),
            example("cancel my ride", "second"),
        ];
        let (hit, _) = best_match("cancel my ride", &corpus, 0.5).unwrap();
        assert_eq!(hit.ai_response, "first");
    }

    #[test]
    fn test_best_match_empty_corpus() {
        assert!(best_match("anything", &[], 0.5).is_none());
    }
}
