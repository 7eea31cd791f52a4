// LLM module
// Chat-completion client for advice synthesis, plus lenient parsing of
// model output that may wrap JSON in prose


use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Write as _;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::LlmConfig;
use crate::{Result, TriageError};

const DEFAULT_RETRY_ATTEMPTS: u32 = 2;

/// Parse model output as JSON, tolerating surrounding prose.
///
/// Two stages: a strict parse of the whole text, then extraction of the first
/// balanced JSON object or array substring followed by a strict parse of that.
/// Anything else is an error — there is no further fallback.
#[inline]
pub fn parse_lenient_json(text: &str) -> Result<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(text.trim()) {
        return Ok(value);
    }

    let candidate = extract_balanced_json(text).ok_or_else(|| {
        TriageError::Synthesis("Response contains no JSON object or array".to_string())
    })?;

    serde_json::from_str(candidate)
        .map_err(|e| TriageError::Synthesis(format!("Embedded JSON failed to parse: {}", e)))
}

/// Find the first balanced `{...}` or `[...]` substring.
///
/// Tracks nesting depth and string state, so braces inside string literals do
/// not terminate the scan.
#[inline]
pub fn extract_balanced_json(text: &str) -> Option<&str> {
    let mut start = None;
    let mut open = '{';
    let mut close = '}';
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        let Some(begin) = start else {
            if ch == '{' || ch == '[' {
                start = Some(idx);
                open = ch;
                close = if ch == '{' { '}' } else { ']' };
                depth = 1;
            }
            continue;
        };

        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        if ch == '"' {
            in_string = true;
        } else if ch == open {
            depth += 1;
        } else if ch == close {
            depth -= 1;
            if depth == 0 {
                return text.get(begin..=idx);
            }
        }
    }

    None
}

/// One retrieved advice passage as handed to the synthesis model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdviceReference {
    pub advice: String,
    pub source: String,
}

/// Structured synthesis result parsed from the model's JSON reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisOutcome {
    pub classification: String,
    pub confidence: f32,
    pub reason: String,
    #[serde(default)]
    pub recommendations: Vec<AdviceReference>,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
struct ContentPart {
    #[serde(rename = "type")]
    kind: String,
    text: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// Client for an OpenAI-compatible chat-completion endpoint
#[derive(Debug, Clone)]
pub struct LlmClient {
    base_url: Url,
    model: String,
    temperature: f32,
    api_key: Option<String>,
    agent: ureq::Agent,
    retry_attempts: u32,
}

impl LlmClient {
    #[inline]
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| TriageError::Synthesis(format!("Invalid LLM base URL: {}", e)))?;

        let api_key = std::env::var(&config.api_key_env).ok();
        if api_key.is_none() {
            warn!(
                "Environment variable {} is not set; LLM requests will be unauthenticated",
                config.api_key_env
            );
        }

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_seconds)))
            .build()
            .into();

        Ok(Self {
            base_url,
            model: config.model.clone(),
            temperature: config.temperature,
            api_key,
            agent,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
        })
    }

    #[inline]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    /// Send a single-turn prompt and return the raw completion text
    #[inline]
    pub fn generate(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: vec![ContentPart {
                    kind: "text".to_string(),
                    text: prompt.to_string(),
                }],
            }],
            temperature: self.temperature,
        };

        let url = join_endpoint(&self.base_url, "chat/completions")?;

        let request_json = serde_json::to_string(&request)
            .map_err(|e| TriageError::Synthesis(format!("Failed to serialize request: {}", e)))?;

        debug!("Requesting completion from {}", url);

        let mut last_error = None;
        for attempt in 1..=self.retry_attempts {
            let mut builder = self
                .agent
                .post(url.as_str())
                .header("Content-Type", "application/json");
            if let Some(key) = &self.api_key {
                builder = builder.header("Authorization", format!("Bearer {}", key));
            }

            match builder
                .send(&request_json)
                .and_then(|mut resp| resp.body_mut().read_to_string())
            {
                Ok(response_text) => {
                    let response: ChatResponse =
                        serde_json::from_str(&response_text).map_err(|e| {
                            TriageError::Synthesis(format!(
                                "Failed to parse completion response: {}",
                                e
                            ))
                        })?;

                    return response
                        .choices
                        .into_iter()
                        .next()
                        .map(|choice| choice.message.content)
                        .ok_or_else(|| {
                            TriageError::Synthesis("Completion had no choices".to_string())
                        });
                }
                Err(ureq::Error::StatusCode(status)) if status < 500 => {
                    return Err(TriageError::Synthesis(format!(
                        "Completion request failed: HTTP {}",
                        status
                    )));
                }
                Err(error) => {
                    warn!(
                        "Completion attempt {}/{} failed: {}",
                        attempt, self.retry_attempts, error
                    );
                    last_error =
                        Some(TriageError::Synthesis(format!("Request error: {}", error)));
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| TriageError::Synthesis("Request failed after retries".to_string())))
    }

    /// Run the synthesis call: templated prompt in, structured outcome out
    #[inline]
    pub fn synthesize(
        &self,
        prediction_summary: &str,
        references: &[AdviceReference],
    ) -> Result<SynthesisOutcome> {
        let prompt = build_synthesis_prompt(prediction_summary, references);
        let reply = self.generate(&prompt)?;
        parse_synthesis_response(&reply)
    }
}

fn join_endpoint(base: &Url, path: &str) -> Result<Url> {
    // Url::join would drop the trailing path segment of a bare base URL
    let joined = format!("{}/{}", base.as_str().trim_end_matches('/'), path);
    Url::parse(&joined)
        .map_err(|e| TriageError::Synthesis(format!("Failed to build endpoint URL: {}", e)))
}

/// Assemble the synthesis prompt: clinical summary, numbered references, and
/// the required reply shape
#[inline]
pub fn build_synthesis_prompt(prediction_summary: &str, references: &[AdviceReference]) -> String {
    let mut prompt = String::new();
    prompt.push_str("Clinical summary:\n");
    prompt.push_str(prediction_summary);
    prompt.push_str("\nReferences:\n");
    for (position, reference) in references.iter().enumerate() {
        let _ = writeln!(
            prompt,
            "[{}] {} (Source: {})",
            position + 1,
            reference.advice,
            reference.source
        );
    }
    prompt.push_str(
        "\nReply with a JSON object with keys \"classification\", \"confidence\", \
         \"reason\", and \"recommendations\" (a list of {\"advice\", \"source\"} \
         objects drawn from the references).",
    );
    prompt
}

/// Parse a synthesis reply, tolerating prose around the JSON body
#[inline]
pub fn parse_synthesis_response(text: &str) -> Result<SynthesisOutcome> {
    let value = parse_lenient_json(text)?;
    serde_json::from_value(value)
        .map_err(|e| TriageError::Synthesis(format!("Synthesis reply has the wrong shape: {}", e)))
}
