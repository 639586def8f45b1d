// ABOUTME: Generic OpenAI-compatible provider adapter for OpenAI, xAI, Mistral, and DeepSeek
// ABOUTME: Bearer auth chat-completions calls with distinct system and user roles
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ECHO Labs

//! # `OpenAI`-Compatible Adapter
//!
//! One implementation serves every provider that speaks the `OpenAI` chat
//! completions wire format: `OpenAI` itself, xAI, Mistral, and DeepSeek. The
//! adapter is parameterized by [`ProviderKind`] so errors and logs always
//! carry the concrete provider name.

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
// API Request/Response Types (OpenAI chat completions format)
// ============================================================================

/// Chat completions request structure
#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    max_tokens: u32,
    temperature: f32,
}

/// Message structure with explicit role
#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

/// Chat completions response structure
#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

/// Choice in response
#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

/// Message in response
#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

// ============================================================================
// Adapter Implementation
// ============================================================================

/// Adapter for `OpenAI`-compatible chat completion endpoints
pub struct OpenAiCompatibleAdapter {
    kind: ProviderKind,
    client: Client,
    api_key: Option<String>,
}

impl OpenAiCompatibleAdapter {
    /// Create a new adapter for one `OpenAI`-compatible provider
    #[must_use]
    pub fn new(kind: ProviderKind, api_key: Option<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            kind,
            client,
            api_key,
        }
    }

    /// Build the request body for a completion call
    fn build_body(
        config: &LlmConfiguration,
        system_prompt: &str,
        user_text: &str,
    ) -> OpenAiRequest {
        let mut messages = Vec::with_capacity(2);
        if !system_prompt.trim().is_empty() {
            messages.push(OpenAiMessage {
                role: "system".to_owned(),
                content: system_prompt.to_owned(),
            });
        }
        messages.push(OpenAiMessage {
            role: "user".to_owned(),
            content: user_text.to_owned(),
        });

        OpenAiRequest {
            model: config.model.clone(),
            messages,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    /// Extract response text from the first choice
    fn extract_text(provider: ProviderKind, body: &str) -> AppResult<String> {
        let response: OpenAiResponse = serde_json::from_str(body)
            .map_err(|e| AppError::provider_unparseable(provider.as_str(), e.to_string()))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| {
                AppError::provider_unparseable(provider.as_str(), "response has no choices")
            })
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiCompatibleAdapter {
    fn provider(&self) -> ProviderKind {
        self.kind
    }

    #[instrument(skip(self, config, system_prompt, user_text), fields(provider = %self.kind, model = %config.model))]
    async fn send(
        &self,
        config: &LlmConfiguration,
        system_prompt: &str,
        user_text: &str,
    ) -> AppResult<String> {
        validate_send_inputs(config, user_text)?;

        let api_key = self.api_key.as_deref().ok_or_else(|| {
            AppError::config_missing(format!(
                "{} is not set",
                crate::config::api_key_env_var(self.kind)
            ))
        })?;

        let body = Self::build_body(config, system_prompt, user_text);
        debug!("Sending chat completion request to {}", self.kind);

        let response = self
            .client
            .post(&config.api_endpoint)
            .bearer_auth(api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("{} request failed: {e}", self.kind);
                if e.is_timeout() {
                    AppError::provider_timeout(self.kind.as_str())
                } else {
                    AppError::provider_transport(self.kind.as_str(), e.to_string())
                }
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            AppError::provider_transport(
                self.kind.as_str(),
                format!("failed to read response: {e}"),
            )
        })?;

        if !status.is_success() {
            error!(status = %status, "{} API error", self.kind);
            return Err(AppError::provider_http(
                self.kind.as_str(),
                status.as_u16(),
                text.chars().take(200).collect::<String>(),
            ));
        }

        Self::extract_text(self.kind, &text)
    }
}
