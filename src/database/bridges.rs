// ABOUTME: Store for emotional bridge sightings with atomic occurrence counting
// ABOUTME: A single upsert-increment statement keeps counts exact under concurrent analyses
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ECHO Labs

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::errors::{AppError, AppResult};

/// Store for `emotional_bridges`
#[derive(Clone)]
pub struct BridgeStore {
    pool: SqlitePool,
}

impl BridgeStore {
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record one sighting of a bridge sentence and return its updated count
    ///
    /// Insert and increment are one statement, so two concurrent sightings of
    /// the same sentence cannot lose an increment.
    ///
    /// # Errors
    ///
    /// Returns a database error if the write fails.
    pub async fn record_sighting(&self, bridge_text: &str) -> AppResult<i64> {
        let now = Utc::now().to_rfc3339();

        let row = sqlx::query(
            r"
            INSERT INTO emotional_bridges (bridge_text, occurrence_count, first_seen_at, last_seen_at)
            VALUES (?, 1, ?, ?)
            ON CONFLICT(bridge_text) DO UPDATE SET
                occurrence_count = occurrence_count + 1,
                last_seen_at = excluded.last_seen_at
            RETURNING occurrence_count
            ",
        )
        .bind(bridge_text)
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("failed to record bridge sighting: {e}")))?;

        row.try_get("occurrence_count")
            .map_err(|e| AppError::database(format!("failed to read occurrence_count: {e}")))
    }

    /// Total sightings across all bridge sentences
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn total_occurrences(&self) -> AppResult<i64> {
        let row = sqlx::query("SELECT COALESCE(SUM(occurrence_count), 0) AS total FROM emotional_bridges")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("failed to sum bridge occurrences: {e}")))?;

        row.try_get("total")
            .map_err(|e| AppError::database(format!("failed to read total: {e}")))
    }
}
