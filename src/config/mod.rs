// ABOUTME: Environment-driven server configuration for the orchestration service
// ABOUTME: Covers HTTP port, database URL, CORS origins, provider keys, and timeouts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ECHO Labs

//! # Server Configuration
//!
//! Environment-only configuration, read once at startup. Provider API keys
//! stay in this layer so the adapters never need to touch `std::env` and the
//! key material never flows through the configuration records stored in the
//! database.

use std::env;

use crate::llm::ProviderKind;

/// Default HTTP port for the orchestration service
const DEFAULT_HTTP_PORT: u16 = 8084;

/// Default SQLite database URL
const DEFAULT_DATABASE_URL: &str = "sqlite:echo.db";

/// Default per-call provider timeout ceiling in seconds
const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 60;

/// Default polling budget for the speech-to-text collaborator in seconds
const DEFAULT_TRANSCRIPTION_BUDGET_SECS: u64 = 120;

/// Default polling interval for transcription jobs in seconds
const DEFAULT_TRANSCRIPTION_POLL_SECS: u64 = 3;

/// Top-level server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Database connection URL
    pub database_url: String,
    /// Comma-separated CORS origin list, or "*"
    pub cors_allowed_origins: String,
    /// Per-call provider timeout ceiling in seconds
    pub provider_timeout_secs: u64,
    /// Speech-to-text collaborator settings
    pub transcription: TranscriptionConfig,
}

/// Settings for the external speech-to-text + sentiment collaborator
#[derive(Debug, Clone)]
pub struct TranscriptionConfig {
    /// Base URL of the transcription API
    pub base_url: String,
    /// API key for the transcription API
    pub api_key: Option<String>,
    /// Total polling budget before a job is treated as timed out, in seconds
    pub budget_secs: u64,
    /// Interval between status polls, in seconds
    pub poll_interval_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        let http_port = env::var("ECHO_HTTP_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_HTTP_PORT);

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_owned());

        let cors_allowed_origins =
            env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| "*".to_owned());

        let provider_timeout_secs = env::var("ECHO_PROVIDER_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_PROVIDER_TIMEOUT_SECS);

        let transcription = TranscriptionConfig {
            base_url: env::var("TRANSCRIPTION_BASE_URL")
                .unwrap_or_else(|_| "https://api.assemblyai.com/v2".to_owned()),
            api_key: env::var("TRANSCRIPTION_API_KEY").ok().filter(|k| !k.is_empty()),
            budget_secs: env::var("TRANSCRIPTION_BUDGET_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TRANSCRIPTION_BUDGET_SECS),
            poll_interval_secs: env::var("TRANSCRIPTION_POLL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TRANSCRIPTION_POLL_SECS),
        };

        Self {
            http_port,
            database_url,
            cors_allowed_origins,
            provider_timeout_secs,
            transcription,
        }
    }

    /// One-line startup summary, safe to log (no key material)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "port={}, database={}, cors={}, provider_timeout={}s",
            self.http_port, self.database_url, self.cors_allowed_origins,
            self.provider_timeout_secs
        )
    }
}

/// Resolve the API key environment variable name for a provider
#[must_use]
pub const fn api_key_env_var(provider: ProviderKind) -> &'static str {
    match provider {
        ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
        ProviderKind::OpenAi => "OPENAI_API_KEY",
        ProviderKind::Google => "GOOGLE_API_KEY",
        ProviderKind::Xai => "XAI_API_KEY",
        ProviderKind::Mistral => "MISTRAL_API_KEY",
        ProviderKind::DeepSeek => "DEEPSEEK_API_KEY",
        ProviderKind::Qwen => "QWEN_API_KEY",
    }
}

/// Read a provider's API key from the environment, treating empty as absent
#[must_use]
pub fn api_key_for(provider: ProviderKind) -> Option<String> {
    env::var(api_key_env_var(provider))
        .ok()
        .filter(|k| !k.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_env_var_names() {
        assert_eq!(api_key_env_var(ProviderKind::Anthropic), "ANTHROPIC_API_KEY");
        assert_eq!(api_key_env_var(ProviderKind::DeepSeek), "DEEPSEEK_API_KEY");
        assert_eq!(api_key_env_var(ProviderKind::Qwen), "QWEN_API_KEY");
    }

    #[test]
    fn test_summary_has_no_key_material() {
        let config = ServerConfig::from_env();
        let summary = config.summary();
        assert!(!summary.to_lowercase().contains("key"));
    }
}
