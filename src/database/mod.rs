// ABOUTME: SQLite database wrapper, schema migration, and store factory
// ABOUTME: Owns the connection pool shared by the config, bridge, and history stores
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ECHO Labs

//! # Database Layer
//!
//! Thin wrapper over a `SqlitePool` with inline DDL migration. The partial
//! unique index on `llm_configurations.is_active` makes the "at most one
//! active configuration" invariant a storage-layer guarantee instead of an
//! application-ordering hope.

pub mod bridges;
pub mod configs;
pub mod history;

pub use bridges::BridgeStore;
pub use configs::ConfigStore;
pub use history::HistoryStore;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::info;

use crate::errors::{AppError, AppResult};

/// Maximum pooled connections
const MAX_CONNECTIONS: u32 = 5;

/// Database handle shared across the service
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to the database and run schema migration
    ///
    /// # Errors
    ///
    /// Returns a database error if the connection or migration fails.
    pub async fn connect(url: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| AppError::database(format!("invalid database URL: {e}")))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .map_err(|e| AppError::database(format!("failed to connect: {e}")))?;

        let database = Self { pool };
        database.migrate().await?;
        info!("Database initialized: {url}");
        Ok(database)
    }

    /// Wrap an existing pool (used by tests with in-memory databases)
    ///
    /// # Errors
    ///
    /// Returns a database error if migration fails.
    pub async fn from_pool(pool: SqlitePool) -> AppResult<Self> {
        let database = Self { pool };
        database.migrate().await?;
        Ok(database)
    }

    /// Run schema migration
    async fn migrate(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS llm_configurations (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                provider TEXT NOT NULL,
                model TEXT NOT NULL,
                api_endpoint TEXT NOT NULL,
                max_tokens INTEGER NOT NULL,
                temperature REAL NOT NULL,
                system_prompt TEXT NOT NULL DEFAULT '',
                is_active INTEGER NOT NULL DEFAULT 0,
                category TEXT,
                priority INTEGER,
                cost_per_million_tokens REAL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("failed to create llm_configurations: {e}")))?;

        // Storage-level guarantee that at most one configuration is active
        sqlx::query(
            r"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_llm_configurations_single_active
            ON llm_configurations (is_active) WHERE is_active = 1
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("failed to create active index: {e}")))?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS emotional_bridges (
                bridge_text TEXT PRIMARY KEY,
                occurrence_count INTEGER NOT NULL DEFAULT 1,
                first_seen_at TEXT NOT NULL,
                last_seen_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("failed to create emotional_bridges: {e}")))?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS conversation_history (
                id TEXT PRIMARY KEY,
                user_id TEXT,
                title TEXT NOT NULL,
                conflict_description TEXT NOT NULL,
                analysis_result TEXT NOT NULL,
                llm_config_used TEXT,
                is_favorite INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("failed to create conversation_history: {e}")))?;

        Ok(())
    }

    /// Access the underlying pool
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Configuration store backed by this database
    #[must_use]
    pub fn configs(&self) -> ConfigStore {
        ConfigStore::new(self.pool.clone())
    }

    /// Emotional bridge store backed by this database
    #[must_use]
    pub fn bridges(&self) -> BridgeStore {
        BridgeStore::new(self.pool.clone())
    }

    /// Conversation history store backed by this database
    #[must_use]
    pub fn history(&self) -> HistoryStore {
        HistoryStore::new(self.pool.clone())
    }
}
