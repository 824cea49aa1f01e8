//! Shared test providers and fixtures

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use resume_ats::processing::analyzer::{AnalysisEngine, EngineOptions};
use resume_ats::processing::cache::CacheSettings;
use resume_ats::processing::dictionary::SkillDictionary;
use resume_ats::processing::embeddings::EmbeddingProvider;
use resume_ats::ProviderError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const DIMENSION: usize = 64;

/// Bag-of-words hashing embedding that records every text it is asked for.
#[derive(Default)]
pub struct CountingProvider {
    calls: AtomicUsize,
    per_text: Mutex<HashMap<String, usize>>,
    delay: Option<Duration>,
    /// Texts containing this marker never answer.
    hang_on: Option<String>,
}

impl CountingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn hanging_on(marker: &str) -> Self {
        Self {
            hang_on: Some(marker.to_string()),
            ..Self::default()
        }
    }

    pub fn total_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Calls for an already normalized text.
    pub fn calls_for(&self, text: &str) -> usize {
        self.per_text.lock().get(text).copied().unwrap_or(0)
    }
}

#[async_trait]
impl EmbeddingProvider for CountingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.per_text.lock().entry(text.to_string()).or_insert(0) += 1;

        if self.hang_on.as_deref().is_some_and(|marker| text.contains(marker)) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(hash_embedding(text))
    }

    fn model_name(&self) -> &str {
        "counting-hash"
    }
}

/// Always unavailable.
pub struct FailingProvider;

#[async_trait]
impl EmbeddingProvider for FailingProvider {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, ProviderError> {
        Err(ProviderError::Unavailable("model offline".to_string()))
    }

    fn model_name(&self) -> &str {
        "failing"
    }
}

/// Answers only after `delay`.
pub struct SlowProvider {
    pub delay: Duration,
}

#[async_trait]
impl EmbeddingProvider for SlowProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        tokio::time::sleep(self.delay).await;
        Ok(hash_embedding(text))
    }

    fn model_name(&self) -> &str {
        "slow"
    }
}

pub fn hash_embedding(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; DIMENSION];
    for token in text.split_whitespace() {
        // FNV-1a
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in token.bytes() {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        vector[(hash % DIMENSION as u64) as usize] += 1.0;
    }
    // Keeps whitespace-only input from producing the zero vector.
    vector[0] += 0.01;
    vector
}

pub fn engine_with(provider: Arc<dyn EmbeddingProvider>, options: EngineOptions) -> AnalysisEngine {
    AnalysisEngine::new(&SkillDictionary::builtin().unwrap(), provider, options).unwrap()
}

pub fn engine_with_cache(provider: Arc<dyn EmbeddingProvider>, cache: CacheSettings) -> AnalysisEngine {
    engine_with(
        provider,
        EngineOptions {
            cache,
            ..EngineOptions::default()
        },
    )
}

pub fn fixture(name: &str) -> String {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read_to_string(path).unwrap()
}
