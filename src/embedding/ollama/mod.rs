
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::EncoderConfig;
use crate::embedding::{TextEncoder, truncate_input};
use crate::{Result, TriageError};

const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
const EXPONENTIAL_BACKOFF_BASE: u64 = 2;

/// Embedding client for an Ollama-compatible HTTP backend.
///
/// The encoder model itself is opaque; this client only exercises the
/// text-in, vector-out contract and is constructed once at startup.
#[derive(Debug, Clone)]
pub struct OllamaEncoder {
    base_url: Url,
    model: String,
    max_input_tokens: usize,
    agent: ureq::Agent,
    retry_attempts: u32,
}

#[derive(Debug, Serialize)]
struct EmbedRequest {
    model: String,
    prompt: String,
}

#[derive(Debug, Serialize)]
struct BatchEmbedRequest {
    model: String,
    #[serde(rename = "input")]
    inputs: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaEncoder {
    #[inline]
    pub fn new(config: &EncoderConfig) -> Result<Self> {
        let base_url = config
            .endpoint_url()
            .map_err(|e| TriageError::Encoding(format!("Invalid encoder endpoint: {}", e)))?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_seconds)))
            .build()
            .into();

        Ok(Self {
            base_url,
            model: config.model.clone(),
            max_input_tokens: config.max_input_tokens,
            agent,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
        })
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        self
    }

    #[inline]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    /// Ping the backend to check that it is reachable before serving queries
    #[inline]
    pub fn ping(&self) -> Result<()> {
        let url = self
            .base_url
            .join("/api/tags")
            .map_err(|e| TriageError::Encoding(format!("Failed to build ping URL: {}", e)))?;

        debug!("Pinging embedding backend at {}", url);

        self.request_with_retry(|| {
            self.agent
                .get(url.as_str())
                .call()
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })?;

        info!("Embedding backend reachable at {}", self.base_url);
        Ok(())
    }

    fn embed_single(&self, text: &str) -> Result<Vec<f32>> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(TriageError::Encoding(
                "Cannot encode empty input text".to_string(),
            ));
        }

        let input = truncate_input(trimmed, self.max_input_tokens);
        debug!("Encoding text (length: {})", input.len());

        let request = EmbedRequest {
            model: self.model.clone(),
            prompt: input.into_owned(),
        };

        let url = self
            .base_url
            .join("/api/embed")
            .map_err(|e| TriageError::Encoding(format!("Failed to build embed URL: {}", e)))?;

        let request_json = serde_json::to_string(&request)
            .map_err(|e| TriageError::Encoding(format!("Failed to serialize request: {}", e)))?;

        let response_text = self.request_with_retry(|| {
            self.agent
                .post(url.as_str())
                .header("Content-Type", "application/json")
                .send(&request_json)
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })?;

        let embed_response: EmbedResponse = serde_json::from_str(&response_text)
            .map_err(|e| TriageError::Encoding(format!("Failed to parse response: {}", e)))?;

        if embed_response.embedding.is_empty() {
            return Err(TriageError::Encoding(
                "Backend returned an empty embedding".to_string(),
            ));
        }

        debug!(
            "Generated embedding with {} dimensions",
            embed_response.embedding.len()
        );

        Ok(embed_response.embedding)
    }

    fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(position) = texts.iter().position(|text| text.trim().is_empty()) {
            return Err(TriageError::Encoding(format!(
                "Cannot encode empty input text (batch position {})",
                position
            )));
        }

        debug!("Encoding batch of {} texts", texts.len());

        let inputs: Vec<String> = texts
            .iter()
            .map(|text| truncate_input(text.trim(), self.max_input_tokens).into_owned())
            .collect();

        let request = BatchEmbedRequest {
            model: self.model.clone(),
            inputs,
        };

        let url = self
            .base_url
            .join("/api/embed")
            .map_err(|e| TriageError::Encoding(format!("Failed to build embed URL: {}", e)))?;

        let request_json = serde_json::to_string(&request)
            .map_err(|e| TriageError::Encoding(format!("Failed to serialize request: {}", e)))?;

        let response_text = self.request_with_retry(|| {
            self.agent
                .post(url.as_str())
                .header("Content-Type", "application/json")
                .send(&request_json)
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })?;

        let batch_response: BatchEmbedResponse = serde_json::from_str(&response_text)
            .map_err(|e| TriageError::Encoding(format!("Failed to parse response: {}", e)))?;

        if batch_response.embeddings.len() != texts.len() {
            return Err(TriageError::Encoding(format!(
                "Mismatch between request and response counts: {} vs {}",
                texts.len(),
                batch_response.embeddings.len()
            )));
        }

        Ok(batch_response.embeddings)
    }

    fn request_with_retry<F>(&self, mut request_fn: F) -> Result<String>
    where
        F: FnMut() -> std::result::Result<String, ureq::Error>,
    {
        let mut last_error = None;

        for attempt in 1..=self.retry_attempts {
            debug!("HTTP request attempt {}/{}", attempt, self.retry_attempts);

            match request_fn() {
                Ok(response_text) => {
                    return Ok(response_text);
                }
                Err(error) => {
                    let should_retry = match &error {
                        ureq::Error::StatusCode(status) => {
                            if *status >= 500 {
                                warn!(
                                    "Server error (status {}), attempt {}/{}",
                                    status, attempt, self.retry_attempts
                                );
                                true
                            } else {
                                return Err(TriageError::Encoding(format!(
                                    "Client error: HTTP {}",
                                    status
                                )));
                            }
                        }
                        ureq::Error::ConnectionFailed
                        | ureq::Error::HostNotFound
                        | ureq::Error::Timeout(_)
                        | ureq::Error::Io(_) => {
                            warn!(
                                "Transport error: {}, attempt {}/{}",
                                error, attempt, self.retry_attempts
                            );
                            true
                        }
                        _ => false,
                    };

                    if !should_retry {
                        return Err(TriageError::Encoding(format!(
                            "Non-retryable error: {}",
                            error
                        )));
                    }

                    last_error = Some(TriageError::Encoding(format!("Request error: {}", error)));

                    if attempt < self.retry_attempts {
                        let delay_ms = EXPONENTIAL_BACKOFF_BASE.pow(attempt - 1) * 1000;
                        debug!("Waiting {}ms before retry", delay_ms);
                        std::thread::sleep(Duration::from_millis(delay_ms));
                    }
                }
            }
        }

        error!("All retry attempts failed for request to {}", self.base_url);

        Err(last_error.unwrap_or_else(|| {
            TriageError::Encoding("Request failed after retries".to_string())
        }))
    }
}

impl TextEncoder for OllamaEncoder {
    #[inline]
    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_single(text)
    }

    #[inline]
    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.embed_many(texts)
    }
}
