//! Shared fixtures for integration tests
#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use docdex::provider::{ModelProvider, ProviderError};

/// Deterministic embedding provider for tests
///
/// Embeds text as a normalized bag-of-words histogram over hashed buckets,
/// so similar texts get similar vectors without any model download. Counts
/// every embedded text so tests can assert that reopening a collection does
/// not re-embed.
pub struct MockProvider {
    dimension: usize,
    embed_calls: AtomicUsize,
    generate_response: Option<String>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            dimension: 64,
            embed_calls: AtomicUsize::new(0),
            generate_response: None,
        }
    }

    /// Provider whose `generate` returns the given rewrite.
    pub fn with_generate(response: &str) -> Self {
        Self {
            generate_response: Some(response.to_string()),
            ..Self::new()
        }
    }

    /// Number of texts embedded so far.
    pub fn embed_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for word in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let bucket = (fnv1a(word.as_bytes()) as usize) % self.dimension;
            vector[bucket] += 1.0;
        }
        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        } else {
            vector[0] = 1.0;
        }
        vector
    }
}

impl ModelProvider for MockProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.vectorize(text))
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        self.embed_calls.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(texts.iter().map(|t| self.vectorize(t)).collect())
    }

    fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
        match &self.generate_response {
            Some(response) => Ok(response.clone()),
            None => Err(ProviderError::GenerationUnsupported("mock".to_string())),
        }
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "mock-bag-of-words"
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for b in bytes {
        hash ^= *b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

/// Write one scraped record as a JSON file under `dir`.
pub fn write_record(dir: &Path, name: &str, language: &str, title: &str, body: &str) {
    let record = serde_json::json!({
        "markdown": body,
        "metadata": {
            "language": language,
            "title": title,
            "sourceURL": format!("https://docs.example.com/{name}"),
            "scrapeId": format!("scrape-{name}"),
        }
    });
    std::fs::write(dir.join(format!("{name}.json")), record.to_string()).unwrap();
}

/// Seed a small English corpus plus one record in another language.
///
/// Every body is long enough to survive the minimum chunk length filter.
pub fn write_fixture_corpus(dir: &Path) {
    write_record(
        dir,
        "webhooks",
        "en",
        "Webhook delivery",
        "Webhooks deliver events to your endpoint as HTTP POST requests. \
         Failed deliveries are retried with exponential backoff for up to three days. \
         Each webhook payload is signed with your shared secret so you can verify its origin.",
    );
    write_record(
        dir,
        "auth",
        "en",
        "Authentication",
        "Authentication uses bearer tokens issued by the token endpoint. \
         Tokens expire after one hour and must be refreshed with the refresh grant. \
         Keep client secrets out of browser code and rotate them on a regular schedule.",
    );
    write_record(
        dir,
        "rate-limits",
        "en",
        "Rate limiting",
        "Rate limiting applies per API key with a sliding window of one minute. \
         When the limit is exceeded the API responds with status 429 and a Retry-After header. \
         Batch endpoints count each item in the batch against your quota.",
    );
    write_record(
        dir,
        "taux",
        "fr",
        "Limitation de débit",
        "La limitation de débit s'applique par clé et par fenêtre glissante d'une minute. \
         Les réponses dépassant la limite renvoient le statut 429 avec un en-tête Retry-After.",
    );
}

/// Fixture source URLs, matching `write_fixture_corpus`.
pub fn fixture_urls() -> Vec<String> {
    ["webhooks", "auth", "rate-limits"]
        .iter()
        .map(|name| format!("https://docs.example.com/{name}"))
        .collect()
}
