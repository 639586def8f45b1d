// ABOUTME: Extracts the emotional bridge sentence from empathy analyses and scores it
// ABOUTME: Aggregated sighting counts become the wisdom-of-crowd percentage shown to users
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ECHO Labs

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::database::BridgeStore;
use crate::errors::AppResult;
use crate::models::WisdomOfCrowd;

/// Longest bridge text kept for aggregation
const MAX_BRIDGE_LEN: usize = 200;

/// Matches the bridge heading in markdown or bold form, capturing any inline
/// remainder on the same line. "Next Emotional Bridge" from coaching
/// continuations matches too.
static BRIDGE_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t>]*(?:#{1,6}[ \t]*)?\**[ \t]*(?:next[ \t]+)?emotional[ \t]+bridge[ \t]*:?\**[ \t]*(.*)$")
        .unwrap_or_else(|e| unreachable!("bridge heading regex is valid: {e}"))
});

/// Matches any markdown heading line, used to find where a bridge section ends
static ANY_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(?:#{1,6}\s+\S|\*\*[^*]+\*\*\s*:?\s*$)")
        .unwrap_or_else(|e| unreachable!("heading regex is valid: {e}"))
});

/// Records bridge sightings and computes crowd statistics
#[derive(Clone)]
pub struct BridgeAggregator {
    store: BridgeStore,
}

impl BridgeAggregator {
    #[must_use]
    pub const fn new(store: BridgeStore) -> Self {
        Self { store }
    }

    /// Extract the bridge sentence from an empathy analysis, record one
    /// sighting, and return the crowd statistics for it
    ///
    /// Returns `Ok(None)` without touching storage when the analysis carries
    /// no recognizable bridge section.
    ///
    /// # Errors
    ///
    /// Returns a database error if recording the sighting fails.
    pub async fn record_and_score(&self, empathy_text: &str) -> AppResult<Option<WisdomOfCrowd>> {
        let Some(bridge) = extract_bridge(empathy_text) else {
            debug!("No emotional bridge found in analysis");
            return Ok(None);
        };

        let count = self.store.record_sighting(&bridge).await?;
        let total = self.store.total_occurrences().await?;
        let percentage = if total > 0 {
            // round-half-up integer percentage
            (count * 100 + total / 2) / total
        } else {
            0
        };

        debug!("Bridge seen {count}/{total} times ({percentage}%)");
        Ok(Some(WisdomOfCrowd {
            text: bridge,
            count,
            total_analyzed: total,
            percentage,
        }))
    }
}

/// Pull the bridge sentence out of an empathy analysis
///
/// Looks for an "Emotional Bridge" heading, takes the inline remainder or the
/// paragraph below it, strips markdown emphasis, and truncates to a sentence
/// boundary.
#[must_use]
pub fn extract_bridge(text: &str) -> Option<String> {
    let captures = BRIDGE_HEADING.captures(text)?;
    let heading_match = captures.get(0)?;

    let inline = captures.get(1).map_or("", |m| m.as_str());
    let cleaned_inline = strip_emphasis(inline);

    let raw = if cleaned_inline.is_empty() {
        // Take the paragraph following the heading, stopping at the next
        // heading or a blank-line break.
        let rest = &text[heading_match.end()..];
        let section_end = ANY_HEADING.find(rest).map_or(rest.len(), |m| m.start());
        let section = &rest[..section_end];
        let paragraph = section
            .split("\n\n")
            .map(str::trim)
            .find(|p| !p.is_empty())?;
        strip_emphasis(&paragraph.replace('\n', " "))
    } else {
        cleaned_inline
    };

    if raw.is_empty() {
        return None;
    }
    Some(truncate_sentence(&raw, MAX_BRIDGE_LEN))
}

fn strip_emphasis(text: &str) -> String {
    text.replace(['*', '_', '`'], "")
        .trim()
        .trim_matches('"')
        .trim()
        .to_string()
}

/// Truncate to at most `max` characters, preferring a sentence boundary and
/// falling back to a word boundary
fn truncate_sentence(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }

    let cut: String = text.chars().take(max).collect();
    if let Some(boundary) = cut.rfind(['.', '!', '?']) {
        return cut[..=boundary].trim().to_string();
    }
    if let Some(space) = cut.rfind(' ') {
        return cut[..space].trim().to_string();
    }
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_from_markdown_heading() {
        let text = "## Understanding Their Perspective\nThey feel unheard.\n\n\
                    ## Emotional Bridge\nYou both want to feel respected by each other.\n\n\
                    ## Communication Translator\nTry saying this instead.";
        assert_eq!(
            extract_bridge(text).as_deref(),
            Some("You both want to feel respected by each other.")
        );
    }

    #[test]
    fn extracts_from_bold_heading_with_inline_text() {
        let text = "**Emotional Bridge:** You both care deeply about this family.";
        assert_eq!(
            extract_bridge(text).as_deref(),
            Some("You both care deeply about this family.")
        );
    }

    #[test]
    fn matches_next_bridge_qualifier() {
        let text = "## Next Emotional Bridge\nYou both want the project to succeed.";
        assert_eq!(
            extract_bridge(text).as_deref(),
            Some("You both want the project to succeed.")
        );
    }

    #[test]
    fn strips_emphasis_markers() {
        let text = "## Emotional Bridge\n*You both value honesty* in this relationship.";
        assert_eq!(
            extract_bridge(text).as_deref(),
            Some("You both value honesty in this relationship.")
        );
    }

    #[test]
    fn returns_none_without_bridge_section() {
        let text = "## Understanding Their Perspective\nThey feel unheard.";
        assert_eq!(extract_bridge(text), None);
    }

    #[test]
    fn returns_none_for_empty_bridge_section() {
        let text = "## Emotional Bridge\n\n## Communication Translator\nSay this.";
        assert_eq!(extract_bridge(text), None);
    }

    #[test]
    fn truncates_long_bridges_at_sentence_boundary() {
        let long = format!(
            "## Emotional Bridge\nYou both want stability. {}",
            "Filler sentence padding the bridge well past the limit. ".repeat(10)
        );
        let bridge = extract_bridge(&long).unwrap();
        assert!(bridge.chars().count() <= 200);
        assert!(bridge.ends_with('.'));
        assert!(bridge.starts_with("You both want stability."));
    }

    #[test]
    fn truncate_falls_back_to_word_boundary() {
        let no_punctuation = "word ".repeat(100);
        let out = truncate_sentence(no_punctuation.trim(), 50);
        assert!(out.chars().count() <= 50);
        assert!(!out.ends_with(' '));
    }
}
