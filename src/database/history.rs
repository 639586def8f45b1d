// ABOUTME: Store for saved conversation analyses keyed by user
// ABOUTME: Analysis results are persisted as JSON text alongside a short display title
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ECHO Labs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

/// One saved analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: Uuid,
    pub user_id: Option<String>,
    pub title: String,
    pub conflict_description: String,
    /// Serialized `AnalysisResult` JSON
    pub analysis_result: String,
    pub llm_config_used: Option<String>,
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
}

/// Store for `conversation_history`
#[derive(Clone)]
pub struct HistoryStore {
    pool: SqlitePool,
}

impl HistoryStore {
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new history entry and return its id
    ///
    /// # Errors
    ///
    /// Returns a database error if the insert fails.
    pub async fn insert(
        &self,
        user_id: Option<&str>,
        title: &str,
        conflict_description: &str,
        analysis_result: &str,
        llm_config_used: Option<&str>,
    ) -> AppResult<Uuid> {
        let id = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r"
            INSERT INTO conversation_history (
                id, user_id, title, conflict_description, analysis_result,
                llm_config_used, is_favorite, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, 0, ?)
            ",
        )
        .bind(id.to_string())
        .bind(user_id)
        .bind(title)
        .bind(conflict_description)
        .bind(analysis_result)
        .bind(llm_config_used)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("failed to insert history entry: {e}")))?;

        Ok(id)
    }

    /// List a user's history, newest first
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<HistoryEntry>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, title, conflict_description, analysis_result,
                   llm_config_used, is_favorite, created_at
            FROM conversation_history
            WHERE user_id = ?
            ORDER BY created_at DESC
            ",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("failed to list history: {e}")))?;

        rows.iter().map(row_to_entry).collect()
    }

    /// Flip the favorite flag on the caller's entry, returning the new value
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when the entry does not exist or belongs
    /// to a different user.
    pub async fn toggle_favorite(&self, id: Uuid, user_id: &str) -> AppResult<bool> {
        let row = sqlx::query(
            r"
            UPDATE conversation_history
            SET is_favorite = 1 - is_favorite
            WHERE id = ? AND user_id = ?
            RETURNING is_favorite
            ",
        )
        .bind(id.to_string())
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("failed to toggle favorite: {e}")))?;

        match row {
            Some(row) => {
                let flag: i64 = row
                    .try_get("is_favorite")
                    .map_err(|e| AppError::database(format!("failed to read is_favorite: {e}")))?;
                Ok(flag != 0)
            }
            None => Err(AppError::not_found(format!("history entry {id} not found"))),
        }
    }

    /// Delete the caller's entry
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when the entry does not exist or belongs
    /// to a different user.
    pub async fn delete(&self, id: Uuid, user_id: &str) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM conversation_history WHERE id = ? AND user_id = ?")
            .bind(id.to_string())
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("failed to delete history entry: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("history entry {id} not found")));
        }
        Ok(())
    }
}

fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> AppResult<HistoryEntry> {
    let id_text: String = row
        .try_get("id")
        .map_err(|e| AppError::database(format!("failed to read id: {e}")))?;
    let id = Uuid::parse_str(&id_text)
        .map_err(|e| AppError::database(format!("invalid history id: {e}")))?;

    let created_text: String = row
        .try_get("created_at")
        .map_err(|e| AppError::database(format!("failed to read created_at: {e}")))?;
    let created_at = DateTime::parse_from_rfc3339(&created_text)
        .map_err(|e| AppError::database(format!("invalid created_at timestamp: {e}")))?
        .with_timezone(&Utc);

    let is_favorite: i64 = row
        .try_get("is_favorite")
        .map_err(|e| AppError::database(format!("failed to read is_favorite: {e}")))?;

    Ok(HistoryEntry {
        id,
        user_id: row
            .try_get("user_id")
            .map_err(|e| AppError::database(format!("failed to read user_id: {e}")))?,
        title: row
            .try_get("title")
            .map_err(|e| AppError::database(format!("failed to read title: {e}")))?,
        conflict_description: row
            .try_get("conflict_description")
            .map_err(|e| AppError::database(format!("failed to read conflict_description: {e}")))?,
        analysis_result: row
            .try_get("analysis_result")
            .map_err(|e| AppError::database(format!("failed to read analysis_result: {e}")))?,
        llm_config_used: row
            .try_get("llm_config_used")
            .map_err(|e| AppError::database(format!("failed to read llm_config_used: {e}")))?,
        is_favorite: is_favorite != 0,
        created_at,
    })
}
