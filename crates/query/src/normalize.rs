//! Query normalizer (C1).

use hybridsearch_core::error::{Error, Result};
use hybridsearch_core::model::NormalizedQuery;
use sha2::{Digest, Sha256};
use unicode_normalization::UnicodeNormalization;

const MAX_QUERY_LEN: usize = 2048;

/// `normalize(raw) -> NormalizedQuery`.
///
/// Pure, no I/O. Fails with `InvalidQuery` for empty or over-length input.
pub fn normalize(raw: &str) -> Result<NormalizedQuery> {
    if raw.is_empty() {
        return Err(Error::invalid_query("query must not be empty"));
    }
    if raw.chars().count() > MAX_QUERY_LEN {
        return Err(Error::invalid_query(format!(
            "query exceeds maximum length of {MAX_QUERY_LEN} characters"
        )));
    }

    let normalized = collapse_whitespace(&nfc_lower(raw));
    let fingerprint = fingerprint_of(&normalized);

    Ok(NormalizedQuery {
        raw: raw.to_string(),
        normalized,
        fingerprint,
    })
}

fn nfc_lower(raw: &str) -> String {
    raw.nfc().collect::<String>().to_lowercase()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn fingerprint_of(normalized: &str) -> String {
    let digest = Sha256::digest(normalized.as_bytes());
    hex::encode(&digest[..8])
}

/// Minimal hex encoding so the crate doesn't need a second dependency just
/// for eight bytes.
mod hex {
    pub fn encode(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_query() {
        assert!(normalize("").is_err());
    }

    #[test]
    fn rejects_over_length_query() {
        let raw = "a".repeat(MAX_QUERY_LEN + 1);
        assert!(normalize(&raw).is_err());
    }

    #[test]
    fn collapses_whitespace_and_lowercases() {
        let result = normalize("  Parse   Request  ").unwrap();
        assert_eq!(result.normalized, "parse request");
    }

    #[test]
    fn fingerprint_is_stable_across_calls() {
        let a = normalize("parseRequest").unwrap();
        let b = normalize("parseRequest").unwrap();
        assert_eq!(a.fingerprint, b.fingerprint);
    }

    #[test]
    fn fingerprint_depends_only_on_normalized_form() {
        let a = normalize("Parse Request").unwrap();
        let b = normalize("  parse   request ").unwrap();
        assert_eq!(a.fingerprint, b.fingerprint);
    }

    #[test]
    fn fingerprint_differs_for_different_queries() {
        let a = normalize("parseRequest").unwrap();
        let b = normalize("serializeResponse").unwrap();
        assert_ne!(a.fingerprint, b.fingerprint);
    }
}
