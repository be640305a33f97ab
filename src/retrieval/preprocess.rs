//! Query preprocessing
//!
//! Rewrites a raw user query into a more searchable form through the model
//! provider. Preprocessing never fails retrieval: any generation error or
//! blank rewrite falls back to the original query.

use std::sync::Arc;

use crate::provider::ModelProvider;

const IMPROVEMENT_PROMPT: &str = "You are a query improvement expert. \
Rewrite the query below so it retrieves better documentation matches.

Guidelines:
- Fix grammar and spelling mistakes
- Add relevant technical terms where they clarify intent
- Make the query specific and searchable
- Preserve the original intent
- Keep it to at most 2-3 sentences

Return only the improved query, nothing else.

Original query: ";

/// Best-effort query rewriter backed by a generative provider
pub struct QueryPreprocessor {
    provider: Arc<dyn ModelProvider>,
}

impl QueryPreprocessor {
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self { provider }
    }

    /// Rewrite `query`, returning the original text verbatim when the
    /// provider errors or produces a blank rewrite.
    pub fn improve(&self, query: &str) -> String {
        let prompt = format!("{IMPROVEMENT_PROMPT}{query}");
        match self.provider.generate(&prompt) {
            Ok(rewritten) => {
                let rewritten = rewritten.trim();
                if rewritten.is_empty() {
                    tracing::warn!("Query preprocessing returned an empty rewrite, keeping the original query");
                    query.to_string()
                } else {
                    tracing::debug!(original = %query, improved = %rewritten, "Query rewritten");
                    rewritten.to_string()
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Query preprocessing failed, keeping the original query");
                query.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderError;

    struct CannedProvider {
        response: Result<String, ()>,
    }

    impl ModelProvider for CannedProvider {
        fn embed(&self, _text: &str) -> Result<Vec<f32>, ProviderError> {
            Ok(vec![0.0; 4])
        }

        fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
            Ok(texts.iter().map(|_| vec![0.0; 4]).collect())
        }

        fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
            self.response
                .clone()
                .map_err(|_| ProviderError::GenerationError("canned failure".to_string()))
        }

        fn dimension(&self) -> usize {
            4
        }

        fn model_name(&self) -> &str {
            "canned"
        }
    }

    #[test]
    fn test_rewrite_is_trimmed() {
        let preprocessor = QueryPreprocessor::new(Arc::new(CannedProvider {
            response: Ok("  How do I configure webhook retries?  \n".to_string()),
        }));
        assert_eq!(
            preprocessor.improve("webhok retrys?"),
            "How do I configure webhook retries?"
        );
    }

    #[test]
    fn test_failure_keeps_original() {
        let preprocessor = QueryPreprocessor::new(Arc::new(CannedProvider { response: Err(()) }));
        assert_eq!(preprocessor.improve("original query"), "original query");
    }

    #[test]
    fn test_blank_rewrite_keeps_original() {
        let preprocessor = QueryPreprocessor::new(Arc::new(CannedProvider {
            response: Ok("   \n".to_string()),
        }));
        assert_eq!(preprocessor.improve("original query"), "original query");
    }
}
