// ABOUTME: Best-effort conversation history persistence for identified users
// ABOUTME: Writes happen on a spawned task so analysis latency never waits on storage
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ECHO Labs

use tracing::{debug, warn};

use crate::database::HistoryStore;
use crate::models::AnalysisResult;

/// Longest title derived from a conflict description
const MAX_TITLE_LEN: usize = 60;

/// Fire-and-forget recorder for completed analyses
#[derive(Clone)]
pub struct HistoryRecorder {
    store: HistoryStore,
}

impl HistoryRecorder {
    #[must_use]
    pub const fn new(store: HistoryStore) -> Self {
        Self { store }
    }

    /// Persist an analysis for a user without blocking the caller
    ///
    /// Anonymous requests (no user id) are skipped entirely. Storage failures
    /// are logged and swallowed; the analysis response never depends on them.
    pub fn record(
        &self,
        user_id: Option<String>,
        conflict_description: String,
        result: &AnalysisResult,
        llm_config_used: Option<String>,
    ) {
        let Some(user_id) = user_id else {
            debug!("Skipping history write for anonymous request");
            return;
        };

        let serialized = match serde_json::to_string(result) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize analysis for history: {e}");
                return;
            }
        };

        let store = self.store.clone();
        let title = derive_title(&conflict_description);
        tokio::spawn(async move {
            match store
                .insert(
                    Some(&user_id),
                    &title,
                    &conflict_description,
                    &serialized,
                    llm_config_used.as_deref(),
                )
                .await
            {
                Ok(id) => debug!("Recorded history entry {id}"),
                Err(e) => warn!("Failed to record history entry: {e}"),
            }
        });
    }
}

/// Build a short display title from the start of a conflict description
#[must_use]
pub fn derive_title(conflict_description: &str) -> String {
    let trimmed = conflict_description.trim();
    if trimmed.chars().count() <= MAX_TITLE_LEN {
        return trimmed.to_string();
    }

    let cut: String = trimmed.chars().take(MAX_TITLE_LEN).collect();
    let base = cut.rfind(' ').map_or(cut.as_str(), |idx| &cut[..idx]);
    format!("{}...", base.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_descriptions_become_the_title() {
        assert_eq!(derive_title("We argue about chores"), "We argue about chores");
    }

    #[test]
    fn long_descriptions_truncate_at_a_word_boundary() {
        let long = "My partner and I keep having the same argument about how we split \
                    household responsibilities and it never gets resolved";
        let title = derive_title(long);
        assert!(title.chars().count() <= MAX_TITLE_LEN + 3);
        assert!(title.ends_with("..."));
        assert!(!title.trim_end_matches("...").ends_with(' '));
    }

    #[test]
    fn whitespace_is_trimmed() {
        assert_eq!(derive_title("  spaced out  "), "spaced out");
    }
}
