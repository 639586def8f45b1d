// ABOUTME: Analysis orchestration across dynamic, council, and multi-provider modes
// ABOUTME: Owns provider selection, concurrent fan-out, fallback, and result assembly
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ECHO Labs

//! # Orchestrator
//!
//! Three analysis paths share this module:
//!
//! - **Dynamic**: one call through whichever configuration is active.
//! - **Council**: the fixed Empath / Strategist / Devil's Advocate triad,
//!   dispatched concurrently and composed all-or-nothing.
//! - **Multi**: caller-chosen provider fan-out with per-provider failure
//!   isolation.
//!
//! The top-level [`Orchestrator::analyze`] tries Dynamic first and falls back
//! to Council when the active configuration is missing or its provider fails,
//! so a broken admin setting never hard-fails a user request.

pub mod bridge;
pub mod history;
pub mod language;

pub use bridge::BridgeAggregator;
pub use history::HistoryRecorder;
pub use language::detect_language;

use futures_util::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::database::ConfigStore;
use crate::errors::{AppError, AppResult};
use crate::llm::prompts::{self, CouncilMode};
use crate::llm::{AdapterRegistry, LlmConfiguration, ProviderKind};
use crate::models::{AnalysisRequest, AnalysisResult, DevilsAdvocate, VoiceMetadata};

/// Fixed council seat assignments
const EMPATH_PROVIDER: ProviderKind = ProviderKind::Anthropic;
const STRATEGIST_PROVIDER: ProviderKind = ProviderKind::OpenAi;
const DEVIL_PROVIDER: ProviderKind = ProviderKind::Google;

/// Per-provider outcome from multi-provider mode
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ProviderOutcome {
    Success { result: String },
    Failure { error: String },
}

/// A dynamic-mode result together with the configuration that produced it
#[derive(Debug)]
pub struct DynamicAnalysis {
    pub result: AnalysisResult,
    pub config_id: Uuid,
    pub config_name: String,
    pub provider: ProviderKind,
}

/// Coordinates adapters, configuration, bridge scoring, and history
#[derive(Clone)]
pub struct Orchestrator {
    registry: Arc<AdapterRegistry>,
    configs: ConfigStore,
    bridges: BridgeAggregator,
    history: HistoryRecorder,
}

impl Orchestrator {
    #[must_use]
    pub fn new(
        registry: Arc<AdapterRegistry>,
        configs: ConfigStore,
        bridges: BridgeAggregator,
        history: HistoryRecorder,
    ) -> Self {
        Self {
            registry,
            configs,
            bridges,
            history,
        }
    }

    /// Top-level conflict analysis with the Dynamic-then-Council fallback
    ///
    /// History recording is best-effort and never blocks or fails the
    /// response.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for empty conflict text, or the Council-mode
    /// error when both paths fail.
    #[instrument(skip(self, request, voice_metadata), fields(has_history = request.conversation_history.is_some()))]
    pub async fn analyze(
        &self,
        request: &AnalysisRequest,
        user_id: Option<String>,
        voice_metadata: Option<VoiceMetadata>,
    ) -> AppResult<AnalysisResult> {
        let (text, mode) = prepare_text(request)?;

        let (mut result, llm_used) = match self.analyze_dynamic(&text).await {
            Ok(dynamic) => (dynamic.result, dynamic.config_id.to_string()),
            Err(e) if e.is_recoverable_by_fallback() => {
                info!("Dynamic mode unavailable ({e}), falling back to council");
                let result = self.analyze_council(&text, mode).await?;
                (result, "council".to_string())
            }
            Err(e) => return Err(e),
        };

        // Voice metadata travels with the result so the persisted copy
        // matches what the caller sees.
        result.voice_metadata = voice_metadata;

        self.history.record(
            user_id,
            request.conflict_description.clone(),
            &result,
            Some(llm_used),
        );
        Ok(result)
    }

    /// Dynamic single-provider mode: one call through the active configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigMissing` when no configuration is active, or the
    /// provider error unchanged. No fallback happens at this layer.
    #[instrument(skip(self, text))]
    pub async fn analyze_dynamic(&self, text: &str) -> AppResult<DynamicAnalysis> {
        ensure_non_empty(text)?;
        let config = self.configs.get_active().await?;
        let adapter = self.registry.get(config.provider)?;

        let analysis = adapter.send(&config, &config.system_prompt, text).await?;
        let detected_language = detect_language(&analysis).to_string();

        Ok(DynamicAnalysis {
            result: AnalysisResult {
                empathy_analysis: analysis,
                strategy_analysis: String::new(),
                devils_advocate_analysis: None,
                wisdom_of_crowd: None,
                detected_language,
                voice_metadata: None,
            },
            config_id: config.id,
            config_name: config.name,
            provider: config.provider,
        })
    }

    /// Council-of-Sages mode: the fixed triad, dispatched concurrently
    ///
    /// All three seats must succeed; one failure aborts the whole analysis so
    /// users never see a partial council. (Multi mode is the place for
    /// per-provider isolation.)
    ///
    /// # Errors
    ///
    /// Returns the first seat failure, or an internal error when every seat
    /// returns empty text.
    #[instrument(skip(self, text), fields(mode = ?mode))]
    pub async fn analyze_council(
        &self,
        text: &str,
        mode: CouncilMode,
    ) -> AppResult<AnalysisResult> {
        ensure_non_empty(text)?;

        let empath_config = self.seat_config(EMPATH_PROVIDER).await;
        let strategist_config = self.seat_config(STRATEGIST_PROVIDER).await;
        let devil_config = self.seat_config(DEVIL_PROVIDER).await;

        let empath_adapter = self.registry.get(EMPATH_PROVIDER)?;
        let strategist_adapter = self.registry.get(STRATEGIST_PROVIDER)?;
        let devil_adapter = self.registry.get(DEVIL_PROVIDER)?;

        let empath_prompt = prompts::empath_prompt(mode, text);
        let strategist_prompt = prompts::strategist_prompt(mode, text);
        let devil_prompt = prompts::devil_prompt(mode, text);

        let (empathy, strategy, devil_raw) = tokio::try_join!(
            empath_adapter.send(&empath_config, "", &empath_prompt),
            strategist_adapter.send(&strategist_config, "", &strategist_prompt),
            devil_adapter.send(&devil_config, "", &devil_prompt),
        )?;

        let devils_advocate = match DevilsAdvocate::from_raw(&devil_raw) {
            d if d.is_empty() => None,
            d => Some(d),
        };

        // Bridge scoring is best-effort; a storage hiccup must not discard a
        // completed three-provider analysis.
        let wisdom_of_crowd = match self.bridges.record_and_score(&empathy).await {
            Ok(wisdom) => wisdom,
            Err(e) => {
                warn!("Bridge scoring failed: {e}");
                None
            }
        };

        let detected_language = detect_language(&empathy).to_string();
        let result = AnalysisResult {
            empathy_analysis: empathy,
            strategy_analysis: strategy,
            devils_advocate_analysis: devils_advocate,
            wisdom_of_crowd,
            detected_language,
            voice_metadata: None,
        };

        if !result.has_content() {
            return Err(AppError::internal("all council seats returned empty analyses"));
        }
        Ok(result)
    }

    /// Multi-provider scatter mode with per-provider failure isolation
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for empty text or an empty provider list, and a
    /// config error when no requested provider has a configuration. Individual
    /// provider failures land in the result map instead of propagating.
    #[instrument(skip(self, text), fields(providers = providers.len()))]
    pub async fn analyze_multi(
        &self,
        text: &str,
        providers: &[ProviderKind],
    ) -> AppResult<BTreeMap<String, ProviderOutcome>> {
        ensure_non_empty(text)?;
        if providers.is_empty() {
            return Err(AppError::invalid_input("providers must not be empty"));
        }

        let configs = self.configs.get_by_providers(providers).await?;

        let calls = configs.into_iter().map(|config| {
            let registry = Arc::clone(&self.registry);
            async move {
                let provider = config.provider;
                let outcome = match registry.get(provider) {
                    Ok(adapter) => match adapter.send(&config, &config.system_prompt, text).await {
                        Ok(result) => ProviderOutcome::Success { result },
                        Err(e) => ProviderOutcome::Failure {
                            error: e.to_string(),
                        },
                    },
                    Err(e) => ProviderOutcome::Failure {
                        error: e.to_string(),
                    },
                };
                (provider.as_str().to_string(), outcome)
            }
        });

        Ok(join_all(calls).await.into_iter().collect())
    }

    /// Configuration for a council seat, falling back to the provider default
    /// when the store has nothing for it
    async fn seat_config(&self, provider: ProviderKind) -> LlmConfiguration {
        match self.configs.get_by_providers(&[provider]).await {
            Ok(mut configs) if !configs.is_empty() => configs.remove(0),
            _ => LlmConfiguration::default_for(provider),
        }
    }
}

/// Resolve the text and council mode for a request
///
/// Requests with prior conversation turns become coaching continuations over
/// the linearized transcript; fresh requests analyze the conflict description
/// directly.
fn prepare_text(request: &AnalysisRequest) -> AppResult<(String, CouncilMode)> {
    ensure_non_empty(&request.conflict_description)?;

    match request.conversation_history.as_deref() {
        Some(turns) if !turns.is_empty() => Ok((
            prompts::linearize_history(turns),
            CouncilMode::CoachingContinuation,
        )),
        _ => Ok((
            request.conflict_description.clone(),
            CouncilMode::SingleShot,
        )),
    }
}

fn ensure_non_empty(text: &str) -> AppResult<()> {
    if text.trim().is_empty() {
        return Err(AppError::invalid_input("conflict description must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConversationTurn, TurnRole};

    fn request(description: &str, turns: Option<Vec<ConversationTurn>>) -> AnalysisRequest {
        AnalysisRequest {
            conflict_description: description.to_string(),
            conversation_history: turns,
        }
    }

    #[test]
    fn fresh_request_is_single_shot() {
        let (text, mode) = prepare_text(&request("We argue about money", None)).unwrap();
        assert_eq!(text, "We argue about money");
        assert_eq!(mode, CouncilMode::SingleShot);
    }

    #[test]
    fn request_with_turns_is_coaching_continuation() {
        let turns = vec![
            ConversationTurn {
                role: TurnRole::InitialProblem,
                content: "We argue about money".to_string(),
            },
            ConversationTurn {
                role: TurnRole::TheirReply,
                content: "You always overspend".to_string(),
            },
        ];
        let (text, mode) = prepare_text(&request("We argue about money", Some(turns))).unwrap();
        assert_eq!(mode, CouncilMode::CoachingContinuation);
        assert!(text.contains("We argue about money"));
        assert!(text.contains("You always overspend"));
    }

    #[test]
    fn empty_turn_list_is_still_single_shot() {
        let (_, mode) = prepare_text(&request("We argue", Some(Vec::new()))).unwrap();
        assert_eq!(mode, CouncilMode::SingleShot);
    }

    #[test]
    fn blank_description_is_rejected() {
        let err = prepare_text(&request("   ", None)).unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::InvalidInput);
    }

    #[test]
    fn provider_outcome_serializes_untagged() {
        let success = serde_json::to_value(ProviderOutcome::Success {
            result: "ok".to_string(),
        })
        .unwrap();
        assert_eq!(success, serde_json::json!({ "result": "ok" }));

        let failure = serde_json::to_value(ProviderOutcome::Failure {
            error: "boom".to_string(),
        })
        .unwrap();
        assert_eq!(failure, serde_json::json!({ "error": "boom" }));
    }
}
