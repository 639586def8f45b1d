// ABOUTME: Integration tests for emotional bridge extraction and crowd scoring
// ABOUTME: Verifies count accumulation, percentage math, and the no-bridge no-write path
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ECHO Labs

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use echo_council::database::Database;
use echo_council::orchestrator::BridgeAggregator;
use sqlx::sqlite::SqlitePoolOptions;

async fn test_db() -> Database {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    Database::from_pool(pool).await.unwrap()
}

fn empath_text(bridge: &str) -> String {
    format!(
        "## Understanding Their Perspective\nThey feel unheard.\n\n\
         ## Emotional Bridge\n{bridge}\n\n\
         ## Communication Translator\nTry saying this instead."
    )
}

#[tokio::test]
async fn test_first_sighting_is_one_hundred_percent() {
    let db = test_db().await;
    let aggregator = BridgeAggregator::new(db.bridges());

    let wisdom = aggregator
        .record_and_score(&empath_text("You both want to feel respected."))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(wisdom.text, "You both want to feel respected.");
    assert_eq!(wisdom.count, 1);
    assert_eq!(wisdom.total_analyzed, 1);
    assert_eq!(wisdom.percentage, 100);
}

#[tokio::test]
async fn test_repeat_sightings_accumulate() {
    let db = test_db().await;
    let aggregator = BridgeAggregator::new(db.bridges());

    let text = empath_text("You both want stability.");
    aggregator.record_and_score(&text).await.unwrap();
    aggregator.record_and_score(&text).await.unwrap();
    let wisdom = aggregator.record_and_score(&text).await.unwrap().unwrap();

    assert_eq!(wisdom.count, 3);
    assert_eq!(wisdom.total_analyzed, 3);
    assert_eq!(wisdom.percentage, 100);
}

#[tokio::test]
async fn test_percentage_reflects_share_of_all_sightings() {
    let db = test_db().await;
    let aggregator = BridgeAggregator::new(db.bridges());

    let common = empath_text("You both want stability.");
    aggregator.record_and_score(&common).await.unwrap();
    aggregator.record_and_score(&common).await.unwrap();

    let rare = aggregator
        .record_and_score(&empath_text("You both value honesty."))
        .await
        .unwrap()
        .unwrap();

    // 1 of 3 total sightings, round-half-up
    assert_eq!(rare.count, 1);
    assert_eq!(rare.total_analyzed, 3);
    assert_eq!(rare.percentage, 33);

    let common_again = aggregator.record_and_score(&common).await.unwrap().unwrap();
    assert_eq!(common_again.count, 3);
    assert_eq!(common_again.total_analyzed, 4);
    assert_eq!(common_again.percentage, 75);
}

#[tokio::test]
async fn test_no_bridge_section_writes_nothing() {
    let db = test_db().await;
    let aggregator = BridgeAggregator::new(db.bridges());

    let result = aggregator
        .record_and_score("## Understanding Their Perspective\nThey feel unheard.")
        .await
        .unwrap();
    assert!(result.is_none());

    assert_eq!(db.bridges().total_occurrences().await.unwrap(), 0);
}

#[tokio::test]
async fn test_concurrent_sightings_do_not_lose_increments() {
    let db = test_db().await;
    let text = empath_text("You both want to be heard.");

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let aggregator = BridgeAggregator::new(db.bridges());
            let text = text.clone();
            tokio::spawn(async move { aggregator.record_and_score(&text).await })
        })
        .collect();

    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(db.bridges().total_occurrences().await.unwrap(), 8);
}
