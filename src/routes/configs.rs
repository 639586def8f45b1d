// ABOUTME: Admin endpoints for managing LLM provider configurations
// ABOUTME: CRUD plus activation; activation swaps are atomic in the store
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ECHO Labs

use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::ServerResources;
use crate::errors::AppError;
use crate::llm::{LlmConfiguration, ProviderKind};

/// Payload for creating or updating a configuration
///
/// Omitted tuning fields fall back to the provider defaults so the admin UI
/// can submit a minimal form.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPayload {
    pub id: Option<Uuid>,
    pub name: String,
    pub provider: String,
    pub model: Option<String>,
    pub api_endpoint: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub system_prompt: Option<String>,
    pub category: Option<String>,
    pub priority: Option<i64>,
    pub cost_per_million_tokens: Option<f64>,
}

/// Configuration management routes container
pub struct ConfigRoutes;

impl ConfigRoutes {
    /// Create all configuration routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/configs", get(Self::list))
            .route("/api/configs", post(Self::save))
            .route("/api/configs/active", get(Self::get_active))
            .route("/api/configs/:id/activate", post(Self::activate))
            .route("/api/configs/:id", delete(Self::remove))
            .with_state(resources)
    }

    /// List all configurations, active first
    async fn list(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Json<Vec<LlmConfiguration>>, AppError> {
        let configs = resources.configs.list().await?;
        Ok(Json(configs))
    }

    /// Fetch the active configuration
    async fn get_active(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Json<LlmConfiguration>, AppError> {
        let config = resources.configs.get_active().await?;
        Ok(Json(config))
    }

    /// Create or update a configuration
    async fn save(
        State(resources): State<Arc<ServerResources>>,
        Json(payload): Json<ConfigPayload>,
    ) -> Result<Json<LlmConfiguration>, AppError> {
        let config = payload_to_config(payload)?;
        resources.configs.upsert(&config).await?;
        let saved = resources.configs.get(config.id).await?;
        Ok(Json(saved))
    }

    /// Make one configuration active, deactivating the rest
    async fn activate(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<Uuid>,
    ) -> Result<Json<LlmConfiguration>, AppError> {
        let config = resources.configs.set_active(id).await?;
        Ok(Json(config))
    }

    /// Delete a configuration
    async fn remove(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<Uuid>,
    ) -> Result<Json<serde_json::Value>, AppError> {
        resources.configs.delete(id).await?;
        Ok(Json(serde_json::json!({ "deleted": id })))
    }
}

fn payload_to_config(payload: ConfigPayload) -> Result<LlmConfiguration, AppError> {
    let provider = ProviderKind::parse_str(&payload.provider)
        .ok_or_else(|| AppError::invalid_input(format!("unknown provider '{}'", payload.provider)))?;
    let defaults = LlmConfiguration::default_for(provider);

    Ok(LlmConfiguration {
        id: payload.id.unwrap_or_else(Uuid::new_v4),
        name: payload.name,
        provider,
        model: payload.model.unwrap_or(defaults.model),
        api_endpoint: payload.api_endpoint.unwrap_or(defaults.api_endpoint),
        max_tokens: payload.max_tokens.unwrap_or(defaults.max_tokens),
        temperature: payload.temperature.unwrap_or(defaults.temperature),
        system_prompt: payload.system_prompt.unwrap_or_default(),
        is_active: false,
        category: payload.category,
        priority: payload.priority,
        cost_per_million_tokens: payload.cost_per_million_tokens,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_fills_provider_defaults() {
        let payload = ConfigPayload {
            id: None,
            name: "Primary".to_string(),
            provider: "anthropic".to_string(),
            model: None,
            api_endpoint: None,
            max_tokens: None,
            temperature: None,
            system_prompt: None,
            category: None,
            priority: None,
            cost_per_million_tokens: None,
        };
        let config = payload_to_config(payload).unwrap();
        assert_eq!(config.provider, ProviderKind::Anthropic);
        assert!(!config.model.is_empty());
        assert!(config.api_endpoint.starts_with("https://"));
        assert!(!config.is_active);
    }

    #[test]
    fn payload_rejects_unknown_provider() {
        let payload = ConfigPayload {
            id: None,
            name: "Bad".to_string(),
            provider: "notreal".to_string(),
            model: None,
            api_endpoint: None,
            max_tokens: None,
            temperature: None,
            system_prompt: None,
            category: None,
            priority: None,
            cost_per_million_tokens: None,
        };
        assert!(payload_to_config(payload).is_err());
    }
}
