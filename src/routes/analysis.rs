// ABOUTME: Conflict analysis endpoints: council analysis, voice analysis, dynamic and multi calls
// ABOUTME: Also serves the per-user conversation history saved by the recorder
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ECHO Labs

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::ServerResources;
use crate::database::history::HistoryEntry;
use crate::errors::{AppError, AppResult};
use crate::llm::ProviderKind;
use crate::models::{AnalysisRequest, AnalysisResult, VoiceMetadata};
use crate::orchestrator::ProviderOutcome;

/// Request for the voice analysis endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceAnalysisRequest {
    /// Base64-encoded audio
    pub audio_data: String,
}

/// Request for the dynamic single-provider endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicCallRequest {
    pub conflict_description: String,
}

/// Response from the dynamic single-provider endpoint
#[derive(Debug, Serialize)]
pub struct DynamicCallResponse {
    pub analysis: String,
    pub llm_used: String,
    pub provider: String,
}

/// Request for the multi-provider endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiAnalysisRequest {
    pub conflict_description: String,
    pub providers: Vec<String>,
}

/// Response from the multi-provider endpoint
#[derive(Debug, Serialize)]
pub struct MultiAnalysisResponse {
    pub analyses: BTreeMap<String, ProviderOutcome>,
    pub providers_used: Vec<String>,
}

/// Response after toggling a favorite
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteResponse {
    pub id: Uuid,
    pub is_favorite: bool,
}

/// Analysis routes container
pub struct AnalysisRoutes;

impl AnalysisRoutes {
    /// Create all analysis routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/analyze", post(Self::analyze))
            .route("/api/analyze-voice", post(Self::analyze_voice))
            .route("/api/dynamic-llm-call", post(Self::dynamic_llm_call))
            .route("/api/multi-llm-analysis", post(Self::multi_llm_analysis))
            .route("/api/history", get(Self::list_history))
            .route("/api/history/:id/favorite", post(Self::toggle_favorite))
            .route("/api/history/:id", delete(Self::delete_history))
            .with_state(resources)
    }

    /// Optional caller identity from the `x-user-id` header
    ///
    /// Anonymous requests are fully supported; identity only gates history
    /// persistence.
    fn user_id(headers: &HeaderMap) -> Option<String> {
        headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
    }

    /// Full conflict analysis with the Dynamic-then-Council fallback
    async fn analyze(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<AnalysisRequest>,
    ) -> Result<Json<AnalysisResult>, AppError> {
        let user_id = Self::user_id(&headers);
        let result = resources
            .orchestrator
            .analyze(&request, user_id, None)
            .await?;
        Ok(Json(result))
    }

    /// Transcribe audio, then analyze the transcript as a conflict
    async fn analyze_voice(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<VoiceAnalysisRequest>,
    ) -> Result<Json<AnalysisResult>, AppError> {
        let audio = BASE64
            .decode(request.audio_data.as_bytes())
            .map_err(|e| AppError::invalid_input(format!("audioData is not valid base64: {e}")))?;
        if audio.is_empty() {
            return Err(AppError::invalid_input("audioData must not be empty"));
        }

        let transcription = resources.transcription.transcribe(audio).await?;
        if transcription.text.trim().is_empty() {
            return Err(AppError::invalid_input(
                "transcription produced no text to analyze",
            ));
        }
        info!("Transcribed {} characters of audio", transcription.text.len());

        let analysis_request = AnalysisRequest {
            conflict_description: transcription.text.clone(),
            conversation_history: None,
        };
        let voice_metadata = VoiceMetadata {
            transcribed_text: transcription.text,
            sentiment_data: transcription.sentiment,
        };
        let user_id = Self::user_id(&headers);
        let result = resources
            .orchestrator
            .analyze(&analysis_request, user_id, Some(voice_metadata))
            .await?;
        Ok(Json(result))
    }

    /// One call through the active configuration, no fallback
    async fn dynamic_llm_call(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<DynamicCallRequest>,
    ) -> Result<Json<DynamicCallResponse>, AppError> {
        let dynamic = resources
            .orchestrator
            .analyze_dynamic(&request.conflict_description)
            .await?;
        Ok(Json(DynamicCallResponse {
            analysis: dynamic.result.empathy_analysis,
            llm_used: dynamic.config_name,
            provider: dynamic.provider.as_str().to_string(),
        }))
    }

    /// Fan out one prompt to several providers, isolating failures
    async fn multi_llm_analysis(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<MultiAnalysisRequest>,
    ) -> Result<Json<MultiAnalysisResponse>, AppError> {
        let providers = parse_providers(&request.providers)?;
        let analyses = resources
            .orchestrator
            .analyze_multi(&request.conflict_description, &providers)
            .await?;
        let providers_used = analyses.keys().cloned().collect();
        Ok(Json(MultiAnalysisResponse {
            analyses,
            providers_used,
        }))
    }

    /// List the caller's saved analyses, newest first
    async fn list_history(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Json<Vec<HistoryEntry>>, AppError> {
        let user_id = Self::user_id(&headers)
            .ok_or_else(|| AppError::invalid_input("x-user-id header is required"))?;
        let entries = resources.history.list_for_user(&user_id).await?;
        Ok(Json(entries))
    }

    /// Flip the favorite flag on one of the caller's saved analyses
    async fn toggle_favorite(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Json<FavoriteResponse>, AppError> {
        let user_id = Self::user_id(&headers)
            .ok_or_else(|| AppError::invalid_input("x-user-id header is required"))?;
        let is_favorite = resources.history.toggle_favorite(id, &user_id).await?;
        Ok(Json(FavoriteResponse { id, is_favorite }))
    }

    /// Delete one of the caller's saved analyses
    async fn delete_history(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Json<serde_json::Value>, AppError> {
        let user_id = Self::user_id(&headers)
            .ok_or_else(|| AppError::invalid_input("x-user-id header is required"))?;
        resources.history.delete(id, &user_id).await?;
        Ok(Json(serde_json::json!({ "deleted": id })))
    }
}

/// Parse provider names, rejecting the first unknown one
fn parse_providers(names: &[String]) -> AppResult<Vec<ProviderKind>> {
    names
        .iter()
        .map(|name| {
            ProviderKind::parse_str(name)
                .ok_or_else(|| AppError::invalid_input(format!("unknown provider '{name}'")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_providers() {
        let providers =
            parse_providers(&["anthropic".to_string(), "gemini".to_string()]).unwrap();
        assert_eq!(providers, vec![ProviderKind::Anthropic, ProviderKind::Google]);
    }

    #[test]
    fn rejects_unknown_provider() {
        let err = parse_providers(&["quantumai".to_string()]).unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::InvalidInput);
    }

    #[test]
    fn header_identity_ignores_blank_values() {
        let mut headers = HeaderMap::new();
        headers.insert("x-user-id", "  ".parse().unwrap());
        assert_eq!(AnalysisRoutes::user_id(&headers), None);

        headers.insert("x-user-id", "user-42".parse().unwrap());
        assert_eq!(AnalysisRoutes::user_id(&headers), Some("user-42".to_string()));
    }
}
