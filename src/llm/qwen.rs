// ABOUTME: Alibaba Qwen provider adapter using the DashScope text-generation API
// ABOUTME: Bearer auth with input.messages / parameters nesting and output.choices extraction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ECHO Labs

//! # Qwen Adapter
//!
//! Implements the [`ProviderAdapter`] contract against DashScope's
//! text-generation API. The wire shape differs from the `OpenAI` format:
//! messages nest under `input.messages`, limits under `parameters`, and the
//! response text under `output.choices[0].message.content`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, instrument};

use super::{validate_send_inputs, LlmConfiguration, ProviderAdapter, ProviderKind};
use crate::errors::{AppError, AppResult};

/// Connection timeout for cloud endpoints
const CONNECT_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// API Request/Response Types (DashScope format)
// ============================================================================

/// DashScope text-generation request structure
#[derive(Debug, Serialize)]
struct QwenRequest {
    model: String,
    input: QwenInput,
    parameters: QwenParameters,
}

/// Input wrapper carrying the messages array
#[derive(Debug, Serialize)]
struct QwenInput {
    messages: Vec<QwenMessage>,
}

/// Message structure
#[derive(Debug, Serialize)]
struct QwenMessage {
    role: String,
    content: String,
}

/// Generation parameters
#[derive(Debug, Serialize)]
struct QwenParameters {
    max_tokens: u32,
    temperature: f32,
    result_format: String,
}

/// DashScope response structure
#[derive(Debug, Deserialize)]
struct QwenResponse {
    output: Option<QwenOutput>,
}

/// Output wrapper
#[derive(Debug, Deserialize)]
struct QwenOutput {
    choices: Option<Vec<QwenChoice>>,
}

/// Choice in output
#[derive(Debug, Deserialize)]
struct QwenChoice {
    message: QwenResponseMessage,
}

/// Message in output choice
#[derive(Debug, Deserialize)]
struct QwenResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

// ============================================================================
// Adapter Implementation
// ============================================================================

/// Alibaba Qwen provider adapter
pub struct QwenAdapter {
    client: Client,
    api_key: Option<String>,
}

impl QwenAdapter {
    /// Create a new adapter with an optional API key and request timeout
    #[must_use]
    pub fn new(api_key: Option<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self { client, api_key }
    }

    /// Build the request body for a completion call
    fn build_body(config: &LlmConfiguration, system_prompt: &str, user_text: &str) -> QwenRequest {
        let mut messages = Vec::with_capacity(2);
        if !system_prompt.trim().is_empty() {
            messages.push(QwenMessage {
                role: "system".to_owned(),
                content: system_prompt.to_owned(),
            });
        }
        messages.push(QwenMessage {
            role: "user".to_owned(),
            content: user_text.to_owned(),
        });

        QwenRequest {
            model: config.model.clone(),
            input: QwenInput { messages },
            parameters: QwenParameters {
                max_tokens: config.max_tokens,
                temperature: config.temperature,
                result_format: "message".to_owned(),
            },
        }
    }

    /// Extract response text from output.choices[0].message.content
    fn extract_text(body: &str) -> AppResult<String> {
        let response: QwenResponse = serde_json::from_str(body)
            .map_err(|e| AppError::provider_unparseable("qwen", e.to_string()))?;

        response
            .output
            .and_then(|output| output.choices)
            .and_then(|choices| choices.into_iter().next())
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| {
                AppError::provider_unparseable("qwen", "response has no output choices")
            })
    }
}

#[async_trait]
impl ProviderAdapter for QwenAdapter {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Qwen
    }

    #[instrument(skip(self, config, system_prompt, user_text), fields(model = %config.model))]
    async fn send(
        &self,
        config: &LlmConfiguration,
        system_prompt: &str,
        user_text: &str,
    ) -> AppResult<String> {
        validate_send_inputs(config, user_text)?;

        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::config_missing("QWEN_API_KEY is not set"))?;

        let body = Self::build_body(config, system_prompt, user_text);
        debug!("Sending text-generation request to Qwen");

        let response = self
            .client
            .post(&config.api_endpoint)
            .bearer_auth(api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("Qwen request failed: {e}");
                if e.is_timeout() {
                    AppError::provider_timeout("qwen")
                } else {
                    AppError::provider_transport("qwen", e.to_string())
                }
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            AppError::provider_transport("qwen", format!("failed to read response: {e}"))
        })?;

        if !status.is_success() {
            error!(status = %status, "Qwen API error");
            return Err(AppError::provider_http(
                "qwen",
                status.as_u16(),
                text.chars().take(200).collect::<String>(),
            ));
        }

        Self::extract_text(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_body_nests_input_and_parameters() {
        let config = LlmConfiguration::default_for(ProviderKind::Qwen);
        let body = QwenAdapter::build_body(&config, "Mediate.", "We argued.");

        let json = serde_json::to_value(&body).unwrap();
        let messages = json
            .get("input")
            .and_then(|i| i.get("messages"))
            .and_then(|m| m.as_array())
            .unwrap();
        assert_eq!(messages.len(), 2);
        assert!(json.get("parameters").and_then(|p| p.get("max_tokens")).is_some());
    }

    #[test]
    fn test_extract_text_nested_output() {
        let body =
            r#"{"output":{"choices":[{"message":{"content":"Shared need: respect."}}]}}"#;
        assert_eq!(
            QwenAdapter::extract_text(body).unwrap(),
            "Shared need: respect."
        );
    }

    #[test]
    fn test_extract_text_missing_output() {
        let err = QwenAdapter::extract_text(r"{}").unwrap_err();
        assert_eq!(err.provider.as_deref(), Some("qwen"));
    }
}
