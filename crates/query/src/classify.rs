//! Intent classifier (C2).
//!
//! Rule-based and deterministic; the contract is the classification, not a
//! particular implementation, so a model-augmented classifier could later
//! implement the same function signature without touching callers.

use std::collections::HashSet;
use std::sync::LazyLock;

use hybridsearch_core::model::{Difficulty, Intent, IntentClassification, NormalizedQuery};
use regex::Regex;

static IDENTIFIER_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").ok());
static PATH_LIKE_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[/\\]|\.[A-Za-z0-9]{1,5}$").ok());

const EXPLORATORY_CUES: &[&str] = &["how", "where", "what", "explain", "why"];
const ANALYTICAL_CUES: &[&str] = &[
    "compare", "difference", "impact", "trace", "flow", "diagram",
];
const LOGICAL_CONJUNCTIONS: &[&str] = &["and", "or", "but", "unless", "whereas"];
const CODE_OPERATORS: &[&str] = &["::", "->", "=>", "&&", "||", "!=", "=="];

/// `classify(NormalizedQuery) -> IntentClassification`.
///
/// On internal error, callers should fall back to [`fallback_classification`]
/// rather than aborting the search — the classifier must never fail a request.
pub fn classify(query: &NormalizedQuery) -> IntentClassification {
    let tokens: Vec<&str> = query.normalized.split_whitespace().collect();
    let mut signals = Vec::new();

    let intent = classify_intent(&query.raw, &query.normalized, &tokens, &mut signals);
    let difficulty = classify_difficulty(&query.normalized, &tokens, &mut signals);
    let confidence = compute_confidence(&signals);

    IntentClassification {
        intent,
        difficulty,
        confidence,
        signals,
    }
}

/// The fixed degraded classification the orchestrator falls back to when the
/// classifier itself errors — classification must never abort a search.
pub fn fallback_classification() -> IntentClassification {
    IntentClassification {
        intent: Intent::Factual,
        difficulty: Difficulty::Medium,
        confidence: 0.5,
        signals: vec!["fallback".to_string()],
    }
}

fn classify_intent(raw: &str, normalized: &str, tokens: &[&str], signals: &mut Vec<String>) -> Intent {
    if is_navigational(raw, tokens) {
        signals.push("navigational".to_string());
        return Intent::Navigational;
    }

    let content_words = tokens.iter().filter(|t| t.len() > 2).count();
    if content_words >= 3 && EXPLORATORY_CUES.iter().any(|cue| contains_word(normalized, cue)) {
        signals.push("exploratory".to_string());
        return Intent::Exploratory;
    }

    if ANALYTICAL_CUES.iter().any(|cue| contains_word(normalized, cue)) || is_multi_step(normalized) {
        signals.push("analytical".to_string());
        return Intent::Analytical;
    }

    signals.push("factual".to_string());
    Intent::Factual
}

fn is_navigational(raw: &str, tokens: &[&str]) -> bool {
    if tokens.len() == 1 {
        if let Some(pattern) = IDENTIFIER_PATTERN.as_ref() {
            if pattern.is_match(tokens[0]) {
                return true;
            }
        }
    }

    if let Some(pattern) = PATH_LIKE_PATTERN.as_ref() {
        if tokens.iter().any(|t| pattern.is_match(t)) {
            return true;
        }
    }

    let lower = raw.to_lowercase();
    if lower.starts_with("file:") || lower.starts_with("path:") || lower.starts_with("symbol:") {
        return true;
    }

    raw.contains('"') || raw.contains('\'')
}

fn is_multi_step(normalized: &str) -> bool {
    normalized.contains("step by step") || normalized.contains("then") && normalized.contains("after")
}

fn classify_difficulty(normalized: &str, tokens: &[&str], signals: &mut Vec<String>) -> Difficulty {
    let has_interrogative = EXPLORATORY_CUES.iter().any(|cue| contains_word(normalized, cue));
    let has_logical_cue = LOGICAL_CONJUNCTIONS
        .iter()
        .any(|cue| contains_word(normalized, cue))
        || CODE_OPERATORS.iter().any(|op| normalized.contains(op));

    let difficulty = if tokens.len() <= 3 && !has_interrogative {
        Difficulty::Easy
    } else if tokens.len() >= 8 || has_logical_cue {
        Difficulty::Hard
    } else {
        Difficulty::Medium
    };

    signals.push(match difficulty {
        Difficulty::Easy => "short_query".to_string(),
        Difficulty::Hard => "complex_query".to_string(),
        Difficulty::Medium => "medium_query".to_string(),
    });

    difficulty
}

fn contains_word(haystack: &str, word: &str) -> bool {
    haystack.split_whitespace().any(|t| t.trim_matches(|c: char| !c.is_alphanumeric()) == word)
}

/// `confidence = 1 - entropy(signal_weights)` clamped to `[0.3, 0.99]`.
///
/// Signals are treated as a uniform categorical distribution over distinct
/// labels; more distinct signals means higher entropy (less certainty).
fn compute_confidence(signals: &[String]) -> f32 {
    let distinct: HashSet<&String> = signals.iter().collect();
    let n = distinct.len().max(1) as f32;
    let entropy = if n <= 1.0 {
        0.0
    } else {
        // Uniform distribution over n outcomes: entropy = ln(n), normalized
        // to [0, 1] by the maximum possible entropy for this signal count.
        (n.ln()) / (signals.len().max(1) as f32).max(1.0).ln().max(1.0)
    };
    (1.0 - entropy).clamp(0.3, 0.99)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hybridsearch_core::model::NormalizedQuery;

    fn nq(normalized: &str) -> NormalizedQuery {
        NormalizedQuery {
            raw: normalized.to_string(),
            normalized: normalized.to_string(),
            fingerprint: "test".to_string(),
        }
    }

    #[test]
    fn single_identifier_is_navigational() {
        let result = classify(&nq("parserequest"));
        assert_eq!(result.intent, Intent::Navigational);
    }

    #[test]
    fn path_like_token_is_navigational() {
        let result = classify(&nq("src/lib.rs"));
        assert_eq!(result.intent, Intent::Navigational);
    }

    #[test]
    fn interrogative_with_content_words_is_exploratory() {
        let result = classify(&nq("how to retry http calls"));
        assert_eq!(result.intent, Intent::Exploratory);
    }

    #[test]
    fn comparative_cue_is_analytical() {
        let result = classify(&nq("compare retry and circuit breaker behaviour"));
        assert_eq!(result.intent, Intent::Analytical);
    }

    #[test]
    fn otherwise_factual() {
        let result = classify(&nq("retry http request twice"));
        assert_eq!(result.intent, Intent::Factual);
    }

    #[test]
    fn short_query_is_easy() {
        let result = classify(&nq("foo bar"));
        assert_eq!(result.difficulty, Difficulty::Easy);
    }

    #[test]
    fn long_query_is_hard() {
        let result = classify(&nq("one two three four five six seven eight nine"));
        assert_eq!(result.difficulty, Difficulty::Hard);
    }

    #[test]
    fn confidence_is_within_bounds() {
        let result = classify(&nq("how to retry http calls reliably"));
        assert!(result.confidence >= 0.3 && result.confidence <= 0.99);
    }

    #[test]
    fn fallback_is_factual_medium_half_confidence() {
        let fallback = fallback_classification();
        assert_eq!(fallback.intent, Intent::Factual);
        assert_eq!(fallback.difficulty, Difficulty::Medium);
        assert_eq!(fallback.confidence, 0.5);
    }
}
