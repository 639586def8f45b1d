// ABOUTME: LLM provider abstraction layer for the Council of Sages orchestration
// ABOUTME: Defines ProviderKind, LlmConfiguration, the ProviderAdapter trait, and the adapter registry
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ECHO Labs

//! # LLM Provider Layer
//!
//! One adapter per provider family translates a normalized request (system
//! prompt, user text, token/temperature limits) into that provider's HTTP
//! call and parses the provider-specific response back into plain text.
//!
//! Adapters are registered once in an [`AdapterRegistry`] keyed by
//! [`ProviderKind`] and selected by the orchestrator, replacing any per-call
//! branching on provider strings.
//!
//! ## Example
//!
//! ```rust,no_run
//! use echo_council::llm::{AdapterRegistry, LlmConfiguration, ProviderKind};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), echo_council::errors::AppError> {
//!     let registry = AdapterRegistry::from_env(60);
//!     let config = LlmConfiguration::default_for(ProviderKind::Anthropic);
//!     let adapter = registry.get(ProviderKind::Anthropic)?;
//!     let text = adapter
//!         .send(&config, "You are a mediator.", "My roommate never does dishes.")
//!         .await?;
//!     println!("{text}");
//!     Ok(())
//! }
//! ```

mod anthropic;
mod google;
mod openai_compatible;
pub mod prompts;
mod qwen;

pub use anthropic::AnthropicAdapter;
pub use google::GoogleAdapter;
pub use openai_compatible::OpenAiCompatibleAdapter;
pub use qwen::QwenAdapter;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

// ============================================================================
// Provider Kinds
// ============================================================================

/// Supported LLM provider families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Anthropic Claude models
    Anthropic,
    /// OpenAI GPT models
    #[serde(rename = "openai")]
    OpenAi,
    /// Google Gemini models
    Google,
    /// xAI Grok models (OpenAI-compatible API)
    Xai,
    /// Mistral models (OpenAI-compatible API)
    Mistral,
    /// DeepSeek models (OpenAI-compatible API)
    #[serde(rename = "deepseek")]
    DeepSeek,
    /// Alibaba Qwen models (DashScope API)
    Qwen,
}

impl ProviderKind {
    /// All supported providers
    pub const ALL: &'static [Self] = &[
        Self::Anthropic,
        Self::OpenAi,
        Self::Google,
        Self::Xai,
        Self::Mistral,
        Self::DeepSeek,
        Self::Qwen,
    ];

    /// String identifier used in API payloads and the database
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
            Self::Google => "google",
            Self::Xai => "xai",
            Self::Mistral => "mistral",
            Self::DeepSeek => "deepseek",
            Self::Qwen => "qwen",
        }
    }

    /// Parse a provider identifier, case-insensitively
    #[must_use]
    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "anthropic" => Some(Self::Anthropic),
            "openai" => Some(Self::OpenAi),
            "google" | "gemini" => Some(Self::Google),
            "xai" | "grok" => Some(Self::Xai),
            "mistral" => Some(Self::Mistral),
            "deepseek" => Some(Self::DeepSeek),
            "qwen" => Some(Self::Qwen),
            _ => None,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Configuration Records
// ============================================================================

/// A stored record describing how to call one provider/model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfiguration {
    /// Unique identifier
    pub id: Uuid,
    /// Display label
    pub name: String,
    /// Provider family this configuration targets
    pub provider: ProviderKind,
    /// Provider-specific model string
    pub model: String,
    /// Full endpoint URL to POST to
    pub api_endpoint: String,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Persona/task instruction substituted into every call
    pub system_prompt: String,
    /// Whether this configuration is the active one in single-active mode
    pub is_active: bool,
    /// Optional grouping label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Optional ordering hint for admin UIs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    /// Optional cost-per-million-tokens metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_per_million_tokens: Option<f64>,
}

impl LlmConfiguration {
    /// Built-in default configuration for a provider
    ///
    /// Used to fill Council seats when the store has no configuration for
    /// that provider, so the Dynamic-to-Council fallback survives an empty
    /// store.
    #[must_use]
    pub fn default_for(provider: ProviderKind) -> Self {
        let (name, model, api_endpoint) = match provider {
            ProviderKind::Anthropic => (
                "Anthropic Claude",
                "claude-3-5-sonnet-20241022",
                "https://api.anthropic.com/v1/messages",
            ),
            ProviderKind::OpenAi => (
                "OpenAI GPT",
                "gpt-4o-mini",
                "https://api.openai.com/v1/chat/completions",
            ),
            ProviderKind::Google => (
                "Google Gemini",
                "gemini-1.5-flash",
                "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent",
            ),
            ProviderKind::Xai => (
                "xAI Grok",
                "grok-2-latest",
                "https://api.x.ai/v1/chat/completions",
            ),
            ProviderKind::Mistral => (
                "Mistral",
                "mistral-large-latest",
                "https://api.mistral.ai/v1/chat/completions",
            ),
            ProviderKind::DeepSeek => (
                "DeepSeek",
                "deepseek-chat",
                "https://api.deepseek.com/chat/completions",
            ),
            ProviderKind::Qwen => (
                "Alibaba Qwen",
                "qwen-max",
                "https://dashscope.aliyuncs.com/api/v1/services/aigc/text-generation/generation",
            ),
        };

        Self {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            provider,
            model: model.to_owned(),
            api_endpoint: api_endpoint.to_owned(),
            max_tokens: 1024,
            temperature: 0.7,
            system_prompt: String::new(),
            is_active: false,
            category: None,
            priority: None,
            cost_per_million_tokens: None,
        }
    }
}

// ============================================================================
// Adapter Contract
// ============================================================================

/// Provider adapter trait
///
/// Implementations translate the normalized request into a provider-specific
/// HTTP call and extract plain text from the provider-specific response.
/// Adapters never retry; retry policy belongs to the orchestrator. Adapters
/// must never log API keys.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Which provider family this adapter talks to
    fn provider(&self) -> ProviderKind;

    /// Send one completion request and return the response text
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for malformed config or empty user text (before
    /// any network call), and a provider error (HTTP status, unparseable
    /// response, timeout, or transport failure) otherwise.
    async fn send(
        &self,
        config: &LlmConfiguration,
        system_prompt: &str,
        user_text: &str,
    ) -> AppResult<String>;
}

/// Validate adapter inputs before any network call
///
/// # Errors
///
/// Returns `InvalidInput` when the endpoint is not a valid URL, the model is
/// empty, or the user text is empty.
pub fn validate_send_inputs(config: &LlmConfiguration, user_text: &str) -> AppResult<()> {
    url::Url::parse(&config.api_endpoint).map_err(|e| {
        AppError::invalid_input(format!("invalid api_endpoint for {}: {e}", config.provider))
    })?;
    if config.model.trim().is_empty() {
        return Err(AppError::invalid_input(format!(
            "configuration '{}' has no model",
            config.name
        )));
    }
    if user_text.trim().is_empty() {
        return Err(AppError::invalid_input("user text must not be empty"));
    }
    Ok(())
}

// ============================================================================
// Adapter Registry
// ============================================================================

/// Registry mapping provider kinds to their adapters
///
/// Built once at startup and shared by the orchestrator; selection happens
/// here instead of ad hoc branching at every call site.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<ProviderKind, Arc<dyn ProviderAdapter>>,
}

impl AdapterRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// Build the full registry, reading API keys from the environment
    ///
    /// `timeout_secs` bounds every outbound call made through the registry.
    #[must_use]
    pub fn from_env(timeout_secs: u64) -> Self {
        let timeout = Duration::from_secs(timeout_secs);
        let mut registry = Self::new();

        registry.register(Arc::new(AnthropicAdapter::new(
            crate::config::api_key_for(ProviderKind::Anthropic),
            timeout,
        )));
        registry.register(Arc::new(GoogleAdapter::new(
            crate::config::api_key_for(ProviderKind::Google),
            timeout,
        )));
        registry.register(Arc::new(QwenAdapter::new(
            crate::config::api_key_for(ProviderKind::Qwen),
            timeout,
        )));
        for kind in [
            ProviderKind::OpenAi,
            ProviderKind::Xai,
            ProviderKind::Mistral,
            ProviderKind::DeepSeek,
        ] {
            registry.register(Arc::new(OpenAiCompatibleAdapter::new(
                kind,
                crate::config::api_key_for(kind),
                timeout,
            )));
        }

        registry
    }

    /// Register an adapter under its provider kind
    pub fn register(&mut self, adapter: Arc<dyn ProviderAdapter>) {
        self.adapters.insert(adapter.provider(), adapter);
    }

    /// Look up the adapter for a provider
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no adapter is registered for the
    /// provider.
    pub fn get(&self, provider: ProviderKind) -> AppResult<Arc<dyn ProviderAdapter>> {
        self.adapters.get(&provider).cloned().ok_or_else(|| {
            AppError::config(format!("no adapter registered for provider {provider}"))
        })
    }

    /// List registered provider kinds
    #[must_use]
    pub fn providers(&self) -> Vec<ProviderKind> {
        self.adapters.keys().copied().collect()
    }
}
