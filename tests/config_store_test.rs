// ABOUTME: Integration tests for the configuration store
// ABOUTME: Exercises CRUD, validation, and the single-active activation swap
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ECHO Labs

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use echo_council::database::Database;
use echo_council::errors::ErrorCode;
use echo_council::llm::{LlmConfiguration, ProviderKind};
use sqlx::sqlite::SqlitePoolOptions;
use uuid::Uuid;

async fn test_db() -> Database {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    Database::from_pool(pool).await.unwrap()
}

fn config(name: &str, provider: ProviderKind) -> LlmConfiguration {
    LlmConfiguration {
        name: name.to_string(),
        ..LlmConfiguration::default_for(provider)
    }
}

// =============================================================================
// CRUD
// =============================================================================

#[tokio::test]
async fn test_upsert_and_list() {
    let store = test_db().await.configs();

    store.upsert(&config("Primary", ProviderKind::Anthropic)).await.unwrap();
    store.upsert(&config("Backup", ProviderKind::OpenAi)).await.unwrap();

    let configs = store.list().await.unwrap();
    assert_eq!(configs.len(), 2);
    // none active yet, so ordering falls back to name
    assert_eq!(configs[0].name, "Backup");
    assert_eq!(configs[1].name, "Primary");
}

#[tokio::test]
async fn test_upsert_updates_existing_row() {
    let store = test_db().await.configs();

    let mut cfg = config("Primary", ProviderKind::Anthropic);
    store.upsert(&cfg).await.unwrap();

    cfg.model = "claude-3-opus-20240229".to_string();
    cfg.max_tokens = 2048;
    store.upsert(&cfg).await.unwrap();

    let stored = store.get(cfg.id).await.unwrap();
    assert_eq!(stored.model, "claude-3-opus-20240229");
    assert_eq!(stored.max_tokens, 2048);
    assert_eq!(store.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_upsert_rejects_blank_fields() {
    let store = test_db().await.configs();

    let mut cfg = config("", ProviderKind::Anthropic);
    let err = store.upsert(&cfg).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::MissingRequiredField);

    cfg.name = "Primary".to_string();
    cfg.model = "  ".to_string();
    let err = store.upsert(&cfg).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::MissingRequiredField);
}

#[tokio::test]
async fn test_delete_missing_config_is_not_found() {
    let store = test_db().await.configs();
    let err = store.delete(Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
}

// =============================================================================
// Activation
// =============================================================================

#[tokio::test]
async fn test_get_active_with_no_configs_is_config_missing() {
    let store = test_db().await.configs();
    let err = store.get_active().await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ConfigMissing);
}

#[tokio::test]
async fn test_set_active_swaps_the_single_active_config() {
    let store = test_db().await.configs();

    let first = config("First", ProviderKind::Anthropic);
    let second = config("Second", ProviderKind::OpenAi);
    store.upsert(&first).await.unwrap();
    store.upsert(&second).await.unwrap();

    store.set_active(first.id).await.unwrap();
    assert_eq!(store.get_active().await.unwrap().id, first.id);

    store.set_active(second.id).await.unwrap();
    let active = store.get_active().await.unwrap();
    assert_eq!(active.id, second.id);

    let active_count = store
        .list()
        .await
        .unwrap()
        .iter()
        .filter(|c| c.is_active)
        .count();
    assert_eq!(active_count, 1);
}

#[tokio::test]
async fn test_set_active_on_missing_id_leaves_current_active_untouched() {
    let store = test_db().await.configs();

    let cfg = config("Only", ProviderKind::Anthropic);
    store.upsert(&cfg).await.unwrap();
    store.set_active(cfg.id).await.unwrap();

    let err = store.set_active(Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
    assert_eq!(store.get_active().await.unwrap().id, cfg.id);
}

// =============================================================================
// Provider lookup
// =============================================================================

#[tokio::test]
async fn test_get_by_providers_returns_one_config_per_provider() {
    let store = test_db().await.configs();

    store.upsert(&config("Claude", ProviderKind::Anthropic)).await.unwrap();
    store.upsert(&config("Gemini", ProviderKind::Google)).await.unwrap();

    let configs = store
        .get_by_providers(&[ProviderKind::Anthropic, ProviderKind::Google])
        .await
        .unwrap();
    assert_eq!(configs.len(), 2);
    assert_eq!(configs[0].provider, ProviderKind::Anthropic);
    assert_eq!(configs[1].provider, ProviderKind::Google);
}

#[tokio::test]
async fn test_get_by_providers_prefers_higher_priority() {
    let store = test_db().await.configs();

    let mut low = config("Low", ProviderKind::Anthropic);
    low.priority = Some(1);
    let mut high = config("High", ProviderKind::Anthropic);
    high.priority = Some(10);
    store.upsert(&low).await.unwrap();
    store.upsert(&high).await.unwrap();

    let configs = store.get_by_providers(&[ProviderKind::Anthropic]).await.unwrap();
    assert_eq!(configs.len(), 1);
    assert_eq!(configs[0].name, "High");
}

#[tokio::test]
async fn test_get_by_providers_skips_unconfigured_and_errors_when_empty() {
    let store = test_db().await.configs();

    store.upsert(&config("Claude", ProviderKind::Anthropic)).await.unwrap();

    let configs = store
        .get_by_providers(&[ProviderKind::Anthropic, ProviderKind::Mistral])
        .await
        .unwrap();
    assert_eq!(configs.len(), 1);

    let err = store
        .get_by_providers(&[ProviderKind::Mistral])
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ConfigError);
}
