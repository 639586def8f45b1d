// ABOUTME: CRUD store for LLM provider configurations with single-active semantics
// ABOUTME: Activation swaps happen inside one transaction so no window has two active rows
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ECHO Labs

use chrono::Utc;
use sqlx::{Row, SqlitePool};
use tracing::info;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::llm::{LlmConfiguration, ProviderKind};

/// Store for `llm_configurations`
#[derive(Clone)]
pub struct ConfigStore {
    pool: SqlitePool,
}

impl ConfigStore {
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List all configurations, active first, then by name
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn list(&self) -> AppResult<Vec<LlmConfiguration>> {
        let rows = sqlx::query(
            r"
            SELECT id, name, provider, model, api_endpoint, max_tokens, temperature,
                   system_prompt, is_active, category, priority, cost_per_million_tokens
            FROM llm_configurations
            ORDER BY is_active DESC, name ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("failed to list configurations: {e}")))?;

        rows.iter().map(row_to_config).collect()
    }

    /// Fetch the single active configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigMissing` when no configuration is active, or a database
    /// error if the query fails.
    pub async fn get_active(&self) -> AppResult<LlmConfiguration> {
        let row = sqlx::query(
            r"
            SELECT id, name, provider, model, api_endpoint, max_tokens, temperature,
                   system_prompt, is_active, category, priority, cost_per_million_tokens
            FROM llm_configurations
            WHERE is_active = 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("failed to fetch active configuration: {e}")))?;

        match row {
            Some(row) => row_to_config(&row),
            None => Err(AppError::config_missing("no active configuration")),
        }
    }

    /// Fetch a configuration by id
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when the id does not exist.
    pub async fn get(&self, id: Uuid) -> AppResult<LlmConfiguration> {
        let row = sqlx::query(
            r"
            SELECT id, name, provider, model, api_endpoint, max_tokens, temperature,
                   system_prompt, is_active, category, priority, cost_per_million_tokens
            FROM llm_configurations
            WHERE id = ?
            ",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("failed to fetch configuration: {e}")))?;

        match row {
            Some(row) => row_to_config(&row),
            None => Err(AppError::not_found(format!("configuration {id} not found"))),
        }
    }

    /// Fetch one configuration per requested provider, in request order
    ///
    /// For each provider the highest-priority matching row wins. Providers with
    /// no stored configuration are skipped; an empty overall result is a config
    /// error because the caller cannot fan out to nothing.
    ///
    /// # Errors
    ///
    /// Returns a config error when none of the providers has a configuration.
    pub async fn get_by_providers(
        &self,
        providers: &[ProviderKind],
    ) -> AppResult<Vec<LlmConfiguration>> {
        let mut configs = Vec::with_capacity(providers.len());
        for provider in providers {
            let row = sqlx::query(
                r"
                SELECT id, name, provider, model, api_endpoint, max_tokens, temperature,
                       system_prompt, is_active, category, priority, cost_per_million_tokens
                FROM llm_configurations
                WHERE provider = ?
                ORDER BY priority DESC NULLS LAST, is_active DESC
                LIMIT 1
                ",
            )
            .bind(provider.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("failed to fetch by provider: {e}")))?;

            if let Some(row) = row {
                configs.push(row_to_config(&row)?);
            }
        }

        if configs.is_empty() {
            return Err(AppError::config("no matching configuration for requested providers"));
        }
        Ok(configs)
    }

    /// Insert or update a configuration
    ///
    /// # Errors
    ///
    /// Returns `MissingRequiredField` when name, model, or endpoint is blank,
    /// or a database error if the write fails.
    pub async fn upsert(&self, config: &LlmConfiguration) -> AppResult<()> {
        validate_config(config)?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r"
            INSERT INTO llm_configurations (
                id, name, provider, model, api_endpoint, max_tokens, temperature,
                system_prompt, is_active, category, priority, cost_per_million_tokens,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                provider = excluded.provider,
                model = excluded.model,
                api_endpoint = excluded.api_endpoint,
                max_tokens = excluded.max_tokens,
                temperature = excluded.temperature,
                system_prompt = excluded.system_prompt,
                category = excluded.category,
                priority = excluded.priority,
                cost_per_million_tokens = excluded.cost_per_million_tokens,
                updated_at = excluded.updated_at
            ",
        )
        .bind(config.id.to_string())
        .bind(&config.name)
        .bind(config.provider.as_str())
        .bind(&config.model)
        .bind(&config.api_endpoint)
        .bind(i64::from(config.max_tokens))
        .bind(f64::from(config.temperature))
        .bind(&config.system_prompt)
        .bind(i64::from(config.is_active))
        .bind(&config.category)
        .bind(config.priority)
        .bind(config.cost_per_million_tokens)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("failed to upsert configuration: {e}")))?;

        info!("Saved configuration '{}' ({})", config.name, config.provider);
        Ok(())
    }

    /// Make one configuration active, deactivating all others atomically
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when the id does not exist, or a database
    /// error if the transaction fails.
    pub async fn set_active(&self, id: Uuid) -> AppResult<LlmConfiguration> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("failed to begin transaction: {e}")))?;

        let now = Utc::now().to_rfc3339();

        sqlx::query("UPDATE llm_configurations SET is_active = 0, updated_at = ? WHERE is_active = 1")
            .bind(&now)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("failed to deactivate configurations: {e}")))?;

        let result = sqlx::query(
            "UPDATE llm_configurations SET is_active = 1, updated_at = ? WHERE id = ?",
        )
        .bind(&now)
        .bind(id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("failed to activate configuration: {e}")))?;

        if result.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| AppError::database(format!("failed to roll back: {e}")))?;
            return Err(AppError::not_found(format!("configuration {id} not found")));
        }

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("failed to commit activation: {e}")))?;

        info!("Activated configuration {id}");
        self.get(id).await
    }

    /// Delete a configuration by id
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when the id does not exist.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM llm_configurations WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("failed to delete configuration: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("configuration {id} not found")));
        }

        info!("Deleted configuration {id}");
        Ok(())
    }
}

fn validate_config(config: &LlmConfiguration) -> AppResult<()> {
    if config.name.trim().is_empty() {
        return Err(AppError::missing_field("name"));
    }
    if config.model.trim().is_empty() {
        return Err(AppError::missing_field("model"));
    }
    if config.api_endpoint.trim().is_empty() {
        return Err(AppError::missing_field("api_endpoint"));
    }
    Ok(())
}

fn row_to_config(row: &sqlx::sqlite::SqliteRow) -> AppResult<LlmConfiguration> {
    let id_text: String = row
        .try_get("id")
        .map_err(|e| AppError::database(format!("failed to read id: {e}")))?;
    let id = Uuid::parse_str(&id_text)
        .map_err(|e| AppError::database(format!("invalid configuration id: {e}")))?;

    let provider_text: String = row
        .try_get("provider")
        .map_err(|e| AppError::database(format!("failed to read provider: {e}")))?;
    let provider = ProviderKind::parse_str(&provider_text)
        .ok_or_else(|| AppError::database(format!("unknown provider '{provider_text}'")))?;

    let max_tokens: i64 = row
        .try_get("max_tokens")
        .map_err(|e| AppError::database(format!("failed to read max_tokens: {e}")))?;
    let temperature: f64 = row
        .try_get("temperature")
        .map_err(|e| AppError::database(format!("failed to read temperature: {e}")))?;
    let is_active: i64 = row
        .try_get("is_active")
        .map_err(|e| AppError::database(format!("failed to read is_active: {e}")))?;

    #[allow(clippy::cast_possible_truncation)]
    let temperature = temperature as f32;

    Ok(LlmConfiguration {
        id,
        name: row
            .try_get("name")
            .map_err(|e| AppError::database(format!("failed to read name: {e}")))?,
        provider,
        model: row
            .try_get("model")
            .map_err(|e| AppError::database(format!("failed to read model: {e}")))?,
        api_endpoint: row
            .try_get("api_endpoint")
            .map_err(|e| AppError::database(format!("failed to read api_endpoint: {e}")))?,
        max_tokens: u32::try_from(max_tokens.max(0)).unwrap_or(u32::MAX),
        temperature,
        system_prompt: row
            .try_get("system_prompt")
            .map_err(|e| AppError::database(format!("failed to read system_prompt: {e}")))?,
        is_active: is_active != 0,
        category: row
            .try_get("category")
            .map_err(|e| AppError::database(format!("failed to read category: {e}")))?,
        priority: row
            .try_get("priority")
            .map_err(|e| AppError::database(format!("failed to read priority: {e}")))?,
        cost_per_million_tokens: row
            .try_get("cost_per_million_tokens")
            .map_err(|e| AppError::database(format!("failed to read cost: {e}")))?,
    })
}
