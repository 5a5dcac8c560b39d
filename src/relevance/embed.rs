//! Embedding collaborators and the similarity measure the ranker uses.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{PipelineError, PipelineResult};
use crate::settings::{EmbedderKind, Settings};

/// Maps a string to a fixed-length vector. One call per text, blocking.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> PipelineResult<Vec<f32>>;
}

/// Cosine of the angle between two vectors. A zero vector scores 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> PipelineResult<f32> {
    if a.len() != b.len() {
        return Err(PipelineError::Embedding(format!(
            "dimension mismatch: {} vs {}",
            a.len(),
            b.len()
        )));
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok((dot / (norm_a.sqrt() * norm_b.sqrt())) as f32)
}

pub fn from_settings(settings: &Settings) -> PipelineResult<Box<dyn Embedder>> {
    match settings.embedder {
        EmbedderKind::Hashing => {
            info!(dimensions = settings.hashing_dimensions, "using hashing embedder");
            Ok(Box::new(HashingEmbedder::new(settings.hashing_dimensions)?))
        }
        EmbedderKind::OpenAi => {
            let api_key = settings.openai_api_key.as_deref().unwrap_or_default();
            info!(model = %settings.openai_model, "using OpenAI-compatible embedder");
            Ok(Box::new(OpenAiEmbedder::new(
                api_key,
                &settings.openai_base_url,
                &settings.openai_model,
                Duration::from_secs(settings.request_timeout_secs),
            )?))
        }
    }
}

// ── Hashing ──

const BIGRAM_WEIGHT: f32 = 0.5;

/// Offline bag-of-words embedder: unigrams and adjacent bigrams hashed into
/// signed buckets, L2-normalised. Deterministic across runs and platforms.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> PipelineResult<Self> {
        if dimensions == 0 {
            return Err(PipelineError::Configuration(
                "hashing_dimensions must be positive".into(),
            ));
        }
        Ok(HashingEmbedder { dimensions })
    }

    fn add(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let hash = crc32fast::hash(feature.as_bytes());
        let bucket = hash as usize % self.dimensions;
        let sign = if hash >> 31 == 1 { -1.0 } else { 1.0 };
        vector[bucket] += sign * weight;
    }
}

impl Embedder for HashingEmbedder {
    fn embed(&self, text: &str) -> PipelineResult<Vec<f32>> {
        let tokens: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(|t| t.to_lowercase())
            .collect();

        let mut vector = vec![0.0f32; self.dimensions];
        for token in &tokens {
            self.add(&mut vector, token, 1.0);
        }
        for pair in tokens.windows(2) {
            self.add(&mut vector, &format!("{} {}", pair[0], pair[1]), BIGRAM_WEIGHT);
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        Ok(vector)
    }
}

// ── OpenAI-compatible HTTP ──

/// Blocking client for `/embeddings` endpoints. No retries: a failed call
/// fails the run.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    endpoint: String,
    model: String,
}

impl OpenAiEmbedder {
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: &str,
        timeout: Duration,
    ) -> PipelineResult<Self> {
        if api_key.trim().is_empty() {
            return Err(PipelineError::Configuration("missing embedding API key".into()));
        }
        if model.trim().is_empty() {
            return Err(PipelineError::Configuration("missing embedding model name".into()));
        }

        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .map_err(|_| PipelineError::Configuration("invalid embedding API key".into()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| PipelineError::Embedding(format!("failed to build HTTP client: {e}")))?;

        Ok(OpenAiEmbedder {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            model: model.to_string(),
        })
    }
}

impl Embedder for OpenAiEmbedder {
    fn embed(&self, text: &str) -> PipelineResult<Vec<f32>> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: [text],
        };
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .map_err(|e| PipelineError::Embedding(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(PipelineError::Embedding(format!(
                "request failed ({}): {}",
                status, body
            )));
        }

        let parsed: EmbeddingResponse = resp
            .json()
            .map_err(|e| PipelineError::Embedding(format!("unreadable response: {e}")))?;
        parsed
            .data
            .into_iter()
            .next()
            .map(|entry| entry.embedding)
            .ok_or_else(|| PipelineError::Embedding("response carried no embedding".into()))
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}
