//! Input schema for the `search` agent tool.

use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchToolInput {
    /// The natural-language or code-shaped query to search for.
    pub query: String,

    /// Name of the store to search. Falls back to the server's configured
    /// default store when omitted.
    #[serde(default)]
    pub store: Option<String>,

    /// Maximum number of results to return.
    #[serde(default)]
    pub top_k: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_minimal_input() {
        let input: SearchToolInput = serde_json::from_str(r#"{"query": "parseRequest"}"#).unwrap();
        assert_eq!(input.query, "parseRequest");
        assert!(input.store.is_none());
        assert!(input.top_k.is_none());
    }

    #[test]
    fn deserializes_full_input() {
        let input: SearchToolInput =
            serde_json::from_str(r#"{"query": "parseRequest", "store": "demo", "top_k": 5}"#).unwrap();
        assert_eq!(input.store.as_deref(), Some("demo"));
        assert_eq!(input.top_k, Some(5));
    }
}
