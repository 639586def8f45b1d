// ABOUTME: Google Gemini provider adapter using the Generative Language API
// ABOUTME: API key as query parameter, concatenated system+user text in one contents part
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ECHO Labs

//! # Google Adapter
//!
//! Implements the [`ProviderAdapter`] contract against the Generative
//! Language `generateContent` API. The API key travels as a `?key=` query
//! parameter, the system guidance and user text are concatenated into a
//! single contents part, and generation limits ride in `generationConfig`.

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
// API Request/Response Types
// ============================================================================

/// Gemini generateContent request structure
#[derive(Debug, Serialize)]
struct GoogleRequest {
    contents: Vec<GoogleContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

/// Content wrapper with text parts
#[derive(Debug, Serialize, Deserialize)]
struct GoogleContent {
    parts: Vec<GooglePart>,
}

/// One text part
#[derive(Debug, Serialize, Deserialize)]
struct GooglePart {
    #[serde(default)]
    text: Option<String>,
}

/// Generation limits
#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    temperature: f32,
}

/// Gemini generateContent response structure
#[derive(Debug, Deserialize)]
struct GoogleResponse {
    candidates: Vec<GoogleCandidate>,
}

/// Response candidate
#[derive(Debug, Deserialize)]
struct GoogleCandidate {
    content: Option<GoogleContent>,
}

// ============================================================================
// Adapter Implementation
// ============================================================================

/// Google Gemini provider adapter
pub struct GoogleAdapter {
    client: Client,
    api_key: Option<String>,
}

impl GoogleAdapter {
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
    ) -> GoogleRequest {
        let text = if system_prompt.trim().is_empty() {
            user_text.to_owned()
        } else {
            format!("{system_prompt}\n\n{user_text}")
        };

        GoogleRequest {
            contents: vec![GoogleContent {
                parts: vec![GooglePart { text: Some(text) }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: config.max_tokens,
                temperature: config.temperature,
            },
        }
    }

    /// Extract response text from the first candidate's first part
    fn extract_text(body: &str) -> AppResult<String> {
        let response: GoogleResponse = serde_json::from_str(body)
            .map_err(|e| AppError::provider_unparseable("google", e.to_string()))?;

        response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().next())
            .and_then(|part| part.text)
            .filter(|text| !text.is_empty())
            .ok_or_else(|| {
                AppError::provider_unparseable("google", "response has no candidate text")
            })
    }
}

#[async_trait]
impl ProviderAdapter for GoogleAdapter {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Google
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
            .ok_or_else(|| AppError::config_missing("GOOGLE_API_KEY is not set"))?;

        let body = Self::build_body(config, system_prompt, user_text);
        debug!("Sending generateContent request to Google");

        let response = self
            .client
            .post(&config.api_endpoint)
            .query(&[("key", api_key)])
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("Google request failed: {e}");
                if e.is_timeout() {
                    AppError::provider_timeout("google")
                } else {
                    AppError::provider_transport("google", e.to_string())
                }
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            AppError::provider_transport("google", format!("failed to read response: {e}"))
        })?;

        if !status.is_success() {
            error!(status = %status, "Google API error");
            return Err(AppError::provider_http(
                "google",
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
    fn test_build_body_concatenates_system_and_user() {
        let config = LlmConfiguration::default_for(ProviderKind::Google);
        let body = GoogleAdapter::build_body(&config, "Argue against them.", "We argued.");

        assert_eq!(body.contents.len(), 1);
        assert_eq!(
            body.contents[0].parts[0].text.as_deref(),
            Some("Argue against them.\n\nWe argued.")
        );

        let json = serde_json::to_value(&body).unwrap();
        let gen = json.get("generationConfig").unwrap();
        assert!(gen.get("maxOutputTokens").is_some());
        assert!(gen.get("temperature").is_some());
    }

    #[test]
    fn test_extract_text_first_candidate_part() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"They will deflect."}]}}]}"#;
        assert_eq!(GoogleAdapter::extract_text(body).unwrap(), "They will deflect.");
    }

    #[test]
    fn test_extract_text_empty_candidates() {
        let err = GoogleAdapter::extract_text(r#"{"candidates":[]}"#).unwrap_err();
        assert_eq!(err.provider.as_deref(), Some("google"));
    }
}
