// ABOUTME: Integration tests for history storage and the best-effort recorder
// ABOUTME: Covers the anonymous no-op, title truncation, and result round-tripping
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ECHO Labs

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use echo_council::database::Database;
use echo_council::errors::ErrorCode;
use echo_council::models::{
    AnalysisResult, AttackPattern, DevilsAdvocate, WisdomOfCrowd,
};
use echo_council::orchestrator::HistoryRecorder;
use sqlx::sqlite::SqlitePoolOptions;
use std::time::Duration;
use uuid::Uuid;

async fn test_db() -> Database {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    Database::from_pool(pool).await.unwrap()
}

fn sample_result() -> AnalysisResult {
    AnalysisResult {
        empathy_analysis: "They feel unheard.".to_string(),
        strategy_analysis: "Lead with the shared goal.".to_string(),
        devils_advocate_analysis: Some(DevilsAdvocate::Attacks(vec![AttackPattern {
            attack_type: "deflection".to_string(),
            example_quote: "You're overreacting".to_string(),
            counter_strategy: "Restate the fact.".to_string(),
        }])),
        wisdom_of_crowd: Some(WisdomOfCrowd {
            text: "You both want respect.".to_string(),
            count: 3,
            total_analyzed: 10,
            percentage: 30,
        }),
        detected_language: "en".to_string(),
        voice_metadata: None,
    }
}

/// Wait for the recorder's spawned write to land
async fn wait_for_entries(db: &Database, user: &str, expected: usize) -> bool {
    for _ in 0..50 {
        if db.history().list_for_user(user).await.unwrap().len() >= expected {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

// =============================================================================
// Store
// =============================================================================

#[tokio::test]
async fn test_insert_and_list_is_scoped_per_user() {
    let store = test_db().await.history();

    store
        .insert(Some("alice"), "Chores", "We argue about chores", "{}", None)
        .await
        .unwrap();
    store
        .insert(Some("bob"), "Money", "We argue about money", "{}", None)
        .await
        .unwrap();

    let alice = store.list_for_user("alice").await.unwrap();
    assert_eq!(alice.len(), 1);
    assert_eq!(alice[0].title, "Chores");
    assert!(!alice[0].is_favorite);

    assert_eq!(store.list_for_user("carol").await.unwrap().len(), 0);
}

#[tokio::test]
async fn test_toggle_favorite_flips_both_ways() {
    let store = test_db().await.history();
    let id = store
        .insert(Some("alice"), "Chores", "We argue", "{}", None)
        .await
        .unwrap();

    assert!(store.toggle_favorite(id, "alice").await.unwrap());
    assert!(!store.toggle_favorite(id, "alice").await.unwrap());

    let err = store.toggle_favorite(Uuid::new_v4(), "alice").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
}

#[tokio::test]
async fn test_mutations_cannot_touch_another_users_entry() {
    let store = test_db().await.history();
    let id = store
        .insert(Some("alice"), "Chores", "We argue", "{}", None)
        .await
        .unwrap();

    let err = store.toggle_favorite(id, "mallory").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);

    let err = store.delete(id, "mallory").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);

    // the entry is untouched for its owner
    let entries = store.list_for_user("alice").await.unwrap();
    assert_eq!(entries.len(), 1);
    assert!(!entries[0].is_favorite);
}

#[tokio::test]
async fn test_delete_removes_the_entry() {
    let store = test_db().await.history();
    let id = store
        .insert(Some("alice"), "Chores", "We argue", "{}", None)
        .await
        .unwrap();

    store.delete(id, "alice").await.unwrap();
    assert_eq!(store.list_for_user("alice").await.unwrap().len(), 0);

    let err = store.delete(id, "alice").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
}

// =============================================================================
// Recorder
// =============================================================================

#[tokio::test]
async fn test_recorder_persists_for_identified_users() {
    let db = test_db().await;
    let recorder = HistoryRecorder::new(db.history());

    recorder.record(
        Some("alice".to_string()),
        "We argue about chores".to_string(),
        &sample_result(),
        Some("Primary Claude".to_string()),
    );

    assert!(wait_for_entries(&db, "alice", 1).await);
    let entries = db.history().list_for_user("alice").await.unwrap();
    assert_eq!(entries[0].title, "We argue about chores");
    assert_eq!(entries[0].llm_config_used.as_deref(), Some("Primary Claude"));

    // the stored JSON reconstructs the original result exactly
    let restored: AnalysisResult = serde_json::from_str(&entries[0].analysis_result).unwrap();
    assert_eq!(restored, sample_result());
}

#[tokio::test]
async fn test_recorder_skips_anonymous_requests() {
    let db = test_db().await;
    let recorder = HistoryRecorder::new(db.history());

    recorder.record(
        None,
        "We argue about chores".to_string(),
        &sample_result(),
        None,
    );

    // give any stray write a chance to land before asserting it never does
    tokio::time::sleep(Duration::from_millis(50)).await;
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM conversation_history")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_recorder_truncates_long_titles() {
    let db = test_db().await;
    let recorder = HistoryRecorder::new(db.history());

    let long = "My partner and I keep having the same argument about how we split \
                household responsibilities and it never gets resolved";
    recorder.record(
        Some("alice".to_string()),
        long.to_string(),
        &sample_result(),
        None,
    );

    assert!(wait_for_entries(&db, "alice", 1).await);
    let entries = db.history().list_for_user("alice").await.unwrap();
    assert!(entries[0].title.chars().count() <= 63);
    assert!(entries[0].title.ends_with("..."));
    // the full description is kept even when the title is cut
    assert_eq!(entries[0].conflict_description, long);
}

// =============================================================================
// Serialization shape
// =============================================================================

#[test]
fn test_analysis_result_round_trips_through_json() {
    let original = sample_result();
    let json = serde_json::to_string(&original).unwrap();
    let restored: AnalysisResult = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, original);
}

#[test]
fn test_analysis_result_uses_camel_case_keys() {
    let value = serde_json::to_value(sample_result()).unwrap();
    assert!(value.get("empathyAnalysis").is_some());
    assert!(value.get("devilsAdvocateAnalysis").is_some());
    assert!(value.get("wisdomOfCrowd").is_some());
    assert!(value.get("detectedLanguage").is_some());
    assert_eq!(value["wisdomOfCrowd"]["totalAnalyzed"], 10);
}
