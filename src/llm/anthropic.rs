// ABOUTME: Anthropic Claude provider adapter using the Messages API
// ABOUTME: Header-based API key auth with system guidance folded into a single user message
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ECHO Labs

//! # Anthropic Adapter
//!
//! Implements the [`ProviderAdapter`] contract against the Anthropic
//! Messages API. This is the legacy call path the service has always used:
//! the system guidance is concatenated with the user text into a single
//! `user` message rather than sent as a separate `system` field, and the
//! response text is taken from the first content block.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, instrument};

use super::{validate_send_inputs, LlmConfiguration, ProviderAdapter, ProviderKind};
use crate::errors::{AppError, AppResult};

/// API version header value required by the Messages API
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Connection timeout for cloud endpoints
const CONNECT_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// API Request/Response Types
// ============================================================================

/// Anthropic Messages API request structure
#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<AnthropicMessage>,
}

/// Message structure for the Messages API
#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

/// Anthropic Messages API response structure
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
}

/// One block of response content
#[derive(Debug, Deserialize)]
struct AnthropicContentBlock {
    #[serde(default)]
    text: Option<String>,
}

// ============================================================================
// Adapter Implementation
// ============================================================================

/// Anthropic Claude provider adapter
pub struct AnthropicAdapter {
    client: Client,
    api_key: Option<String>,
}

impl AnthropicAdapter {
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
    fn build_body(
        config: &LlmConfiguration,
        system_prompt: &str,
        user_text: &str,
    ) -> AnthropicRequest {
        // Legacy call path: system guidance rides inside the single user
        // message instead of a separate system field.
        let content = if system_prompt.trim().is_empty() {
            user_text.to_owned()
        } else {
            format!("{system_prompt}\n\n{user_text}")
        };

        AnthropicRequest {
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            messages: vec![AnthropicMessage {
                role: "user".to_owned(),
                content,
            }],
        }
    }

    /// Extract response text from the first content block
    fn extract_text(body: &str) -> AppResult<String> {
        let response: AnthropicResponse = serde_json::from_str(body)
            .map_err(|e| AppError::provider_unparseable("anthropic", e.to_string()))?;

        response
            .content
            .into_iter()
            .next()
            .and_then(|block| block.text)
            .filter(|text| !text.is_empty())
            .ok_or_else(|| {
                AppError::provider_unparseable("anthropic", "response has no text content block")
            })
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Anthropic
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
            .ok_or_else(|| AppError::config_missing("ANTHROPIC_API_KEY is not set"))?;

        let body = Self::build_body(config, system_prompt, user_text);
        debug!("Sending completion request to Anthropic");

        let response = self
            .client
            .post(&config.api_endpoint)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("Anthropic request failed: {e}");
                if e.is_timeout() {
                    AppError::provider_timeout("anthropic")
                } else {
                    AppError::provider_transport("anthropic", e.to_string())
                }
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            AppError::provider_transport("anthropic", format!("failed to read response: {e}"))
        })?;

        if !status.is_success() {
            error!(status = %status, "Anthropic API error");
            return Err(AppError::provider_http(
                "anthropic",
                status.as_u16(),
                text.chars().take(200).collect::<String>(),
            ));
        }

        Self::extract_text(&text)
    }
}
