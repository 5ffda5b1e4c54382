//! A deterministic, dependency-free `RerankerProvider` reference
//! implementation for tests and standalone development: scores documents by
//! token overlap with the query instead of calling a cross-encoder host.

use async_trait::async_trait;
use hybridsearch_core::error::Result;
use hybridsearch_core::traits::RerankerProvider;

/// Scores `(query, document)` pairs by the fraction of query tokens that
/// appear in the document, case-insensitively.
pub struct MockRerankerProvider;

#[async_trait]
impl RerankerProvider for MockRerankerProvider {
    async fn rerank(&self, query: &str, documents: &[(String, &str)]) -> Result<Vec<(String, f32)>> {
        let query_tokens: Vec<String> = query.split_whitespace().map(|t| t.to_lowercase()).collect();
        if query_tokens.is_empty() {
            return Ok(documents.iter().map(|(id, _)| (id.clone(), 0.0)).collect());
        }

        Ok(documents
            .iter()
            .map(|(id, content)| {
                let content_lower = content.to_lowercase();
                let hits = query_tokens
                    .iter()
                    .filter(|t| content_lower.contains(t.as_str()))
                    .count();
                let score = hits as f32 / query_tokens.len() as f32;
                (id.clone(), score)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scores_by_token_overlap() {
        let provider = MockRerankerProvider;
        let docs = vec![
            ("a".to_string(), "fn parse_request() {}"),
            ("b".to_string(), "fn unrelated() {}"),
        ];
        let scores = provider.rerank("parse request", &docs).await.unwrap();
        let a = scores.iter().find(|(id, _)| id == "a").unwrap().1;
        let b = scores.iter().find(|(id, _)| id == "b").unwrap().1;
        assert!(a > b);
    }
}
