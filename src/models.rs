// ABOUTME: Domain types shared across the orchestration layer
// ABOUTME: Analysis results, conversation turns, wisdom-of-crowd aggregates, voice metadata
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ECHO Labs

//! # Domain Models
//!
//! The normalized result shapes returned by the orchestrator and persisted
//! (as JSON) inside conversation history rows. Field names serialize in
//! camelCase to match the wire format consumed by the web client.

use serde::{Deserialize, Serialize};

/// A single turn of a multi-turn coaching conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// What kind of turn this is
    pub role: TurnRole,
    /// Turn content (problem statement, analysis JSON, or the other party's reply)
    pub content: String,
}

/// Role of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    /// The user's original description of the conflict
    InitialProblem,
    /// A prior analysis produced by the service
    AiAnalysis,
    /// The other party's reply, pasted in by the user
    TheirReply,
}

/// Analysis request accepted by the `/analyze` endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    /// Free text describing the conflict, or a transcript derived from audio
    pub conflict_description: String,
    /// Prior turns for coaching mode, oldest first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_history: Option<Vec<ConversationTurn>>,
}

/// Devil's Advocate output: free text, or the structured attack list some
/// models return when asked for JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DevilsAdvocate {
    /// Structured enumeration of anticipated attacks
    Attacks(Vec<AttackPattern>),
    /// Plain prose argument enumeration
    Text(String),
}

impl DevilsAdvocate {
    /// Whether the analysis carries any content
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Attacks(attacks) => attacks.is_empty(),
        }
    }

    /// Parse raw provider text, recognizing a JSON attack list when present
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        // Models sometimes wrap JSON output in a markdown fence
        let candidate = trimmed
            .strip_prefix("```json")
            .or_else(|| trimmed.strip_prefix("```"))
            .map_or(trimmed, |s| s.trim_end_matches("```").trim());

        if candidate.starts_with('[') {
            if let Ok(attacks) = serde_json::from_str::<Vec<AttackPattern>>(candidate) {
                return Self::Attacks(attacks);
            }
        }
        Self::Text(raw.to_owned())
    }
}

/// One anticipated adversarial argument
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackPattern {
    /// Category of the attack (e.g. "guilt trip", "whataboutism")
    pub attack_type: String,
    /// A representative quote the other party might use
    pub example_quote: String,
    /// How to respond without escalating
    pub counter_strategy: String,
}

/// Wisdom-of-the-crowd aggregate for a recurring emotional bridge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WisdomOfCrowd {
    /// Human-readable summary sentence
    pub text: String,
    /// How many times this bridge has been seen, including this sighting
    pub count: i64,
    /// Total bridge sightings across the whole corpus
    pub total_analyzed: i64,
    /// `round(count / total_analyzed * 100)`
    pub percentage: i64,
}

/// Sentiment score for a span of transcribed speech
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    /// Transcript span this score applies to
    pub text: String,
    /// Sentiment label (POSITIVE, NEGATIVE, NEUTRAL)
    pub sentiment: String,
    /// Confidence in [0, 1]
    pub confidence: f64,
}

/// Metadata attached to results produced from an audio recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceMetadata {
    /// Transcript produced by the speech-to-text collaborator
    pub transcribed_text: String,
    /// Per-span sentiment scores, when the collaborator provides them
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sentiment_data: Vec<SentimentScore>,
}

/// Normalized multi-perspective analysis result
///
/// At least one of the three analysis fields is non-empty; the orchestrator
/// fails the whole request otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Perspective-taking analysis from the Empath role
    #[serde(default)]
    pub empathy_analysis: String,
    /// Tactical, interest-based plan from the Strategist role
    #[serde(default)]
    pub strategy_analysis: String,
    /// Adversarial argument enumeration from the Devil's Advocate role
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devils_advocate_analysis: Option<DevilsAdvocate>,
    /// Aggregate statistics for the extracted emotional bridge
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wisdom_of_crowd: Option<WisdomOfCrowd>,
    /// Detected language of the analysis ("en", "fr", ...)
    pub detected_language: String,
    /// Present when the request came in as audio
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_metadata: Option<VoiceMetadata>,
}

impl AnalysisResult {
    /// Whether any of the three analysis fields carries content
    #[must_use]
    pub fn has_content(&self) -> bool {
        !self.empathy_analysis.trim().is_empty()
            || !self.strategy_analysis.trim().is_empty()
            || self
                .devils_advocate_analysis
                .as_ref()
                .is_some_and(|d| !d.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_devils_advocate_from_raw_json() {
        let raw = r#"[{"attack_type":"guilt trip","example_quote":"after all I did","counter_strategy":"acknowledge, then refocus"}]"#;
        let parsed = DevilsAdvocate::from_raw(raw);
        match parsed {
            DevilsAdvocate::Attacks(attacks) => {
                assert_eq!(attacks.len(), 1);
                assert_eq!(attacks[0].attack_type, "guilt trip");
            }
            DevilsAdvocate::Text(_) => panic!("expected structured attacks"),
        }
    }

    #[test]
    fn test_devils_advocate_from_raw_fenced_json() {
        let raw = "```json\n[{\"attack_type\":\"deflection\",\"example_quote\":\"what about you\",\"counter_strategy\":\"name the pattern\"}]\n```";
        assert!(matches!(
            DevilsAdvocate::from_raw(raw),
            DevilsAdvocate::Attacks(_)
        ));
    }

    #[test]
    fn test_devils_advocate_from_raw_prose() {
        let parsed = DevilsAdvocate::from_raw("They will say you are overreacting.");
        assert!(matches!(parsed, DevilsAdvocate::Text(_)));
        assert!(!parsed.is_empty());
    }

    #[test]
    fn test_result_has_content() {
        let empty = AnalysisResult {
            empathy_analysis: String::new(),
            strategy_analysis: "  ".to_owned(),
            devils_advocate_analysis: None,
            wisdom_of_crowd: None,
            detected_language: "en".to_owned(),
            voice_metadata: None,
        };
        assert!(!empty.has_content());

        let with_empathy = AnalysisResult {
            empathy_analysis: "They feel unheard.".to_owned(),
            ..empty
        };
        assert!(with_empathy.has_content());
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let result = AnalysisResult {
            empathy_analysis: "a".to_owned(),
            strategy_analysis: "b".to_owned(),
            devils_advocate_analysis: Some(DevilsAdvocate::Text("c".to_owned())),
            wisdom_of_crowd: None,
            detected_language: "en".to_owned(),
            voice_metadata: None,
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("empathyAnalysis"));
        assert!(json.contains("detectedLanguage"));
        assert!(!json.contains("empathy_analysis"));
    }
}
