//! HTTP completion backend.
//!
//! Talks to an OpenAI-completions-style inference endpoint. The call is
//! blocking on purpose: the comparison pipeline drives models strictly one
//! after another, so there is nothing to overlap with.

use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{BackendError, DecodingOptions, TextGenerator};
use crate::config::EndpointConfig;

const MAX_RETRIES: u32 = 3;
const RETRY_DELAY_MS: u64 = 1000;

#[derive(Serialize, Debug)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: usize,
    temperature: f32,
    top_p: f32,
}

#[derive(Deserialize, Debug)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize, Debug)]
struct CompletionChoice {
    text: String,
}

pub struct EndpointGenerator {
    client: Client,
    api_url: String,
    api_key: String,
    model_id: String,
}

impl EndpointGenerator {
    pub fn new(config: &EndpointConfig, model_id: &str) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| BackendError::Http {
                reason: format!("failed to create HTTP client: {}", e),
            })?;
        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model_id: model_id.to_string(),
        })
    }

    fn request_once(&self, body: &CompletionRequest<'_>) -> Result<String, BackendError> {
        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .map_err(|e| {
                let reason = if e.is_timeout() {
                    "request timeout - the endpoint took too long to respond".to_string()
                } else if e.is_connect() {
                    "connection error - unable to reach the endpoint".to_string()
                } else {
                    format!("network error: {}", e)
                };
                BackendError::Http { reason }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "unknown error".to_string());
            let body = match status.as_u16() {
                401 => "authentication failed - check the API key".to_string(),
                403 => "access forbidden - insufficient permissions".to_string(),
                429 => "rate limit exceeded - too many requests".to_string(),
                _ => body,
            };
            return Err(BackendError::Endpoint {
                status: status.as_u16(),
                body,
            });
        }

        let completion: CompletionResponse = response.json().map_err(|e| BackendError::Http {
            reason: format!("failed to parse endpoint response as JSON: {}", e),
        })?;

        let text = completion
            .choices
            .first()
            .map(|c| c.text.clone())
            .ok_or(BackendError::EmptyCompletion)?;
        if text.trim().is_empty() {
            return Err(BackendError::EmptyCompletion);
        }
        Ok(text)
    }
}

impl TextGenerator for EndpointGenerator {
    fn complete(&self, prompt: &str, opts: &DecodingOptions) -> Result<String, BackendError> {
        let body = CompletionRequest {
            model: &self.model_id,
            prompt,
            max_tokens: opts.max_length,
            // Greedy decoding is requested via zero temperature; the
            // completions wire format has no separate sampling switch.
            temperature: if opts.sample { opts.temperature } else { 0.0 },
            top_p: opts.top_p,
        };

        let mut last_err = BackendError::EmptyCompletion;
        for attempt in 1..=MAX_RETRIES {
            match self.request_once(&body) {
                Ok(text) => return Ok(text),
                Err(e) => {
                    if attempt < MAX_RETRIES {
                        warn!(
                            model = %self.model_id,
                            attempt,
                            error = %e,
                            "completion attempt failed, retrying"
                        );
                        thread::sleep(Duration::from_millis(RETRY_DELAY_MS * attempt as u64));
                    }
                    last_err = e;
                }
            }
        }
        Err(last_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_request_serializes_decoding_parameters() {
        let body = CompletionRequest {
            model: "distilgpt2",
            prompt: "Generate a MRI scan of human brain.",
            max_tokens: 100,
            temperature: 0.7,
            top_p: 0.9,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "distilgpt2");
        assert_eq!(json["max_tokens"], 100);
        assert!((json["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
        assert!((json["top_p"].as_f64().unwrap() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn completion_response_takes_first_choice() {
        let raw = r#"{"choices":[{"text":" a detailed scan"},{"text":"other"}]}"#;
        let parsed: CompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].text, " a detailed scan");
    }
}
