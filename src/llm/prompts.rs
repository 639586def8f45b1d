// ABOUTME: Council of Sages role prompts and coaching transcript linearization
// ABOUTME: Empath, Strategist, and Devil's Advocate templates in single-shot and coaching variants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ECHO Labs

//! # Council Prompts
//!
//! The three fixed role prompts behind Council mode. The Empath's
//! single-shot variant pins the three Markdown section headings the bridge
//! extractor and the web client both rely on; the coaching variant swaps
//! them for two shorter tactical headings. Coaching mode linearizes prior
//! conversation turns into one labeled transcript before substitution.

use crate::models::{ConversationTurn, TurnRole};

/// Council analysis mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CouncilMode {
    /// First analysis of a conflict description
    SingleShot,
    /// Follow-up analysis of the other party's latest reply
    CoachingContinuation,
}

/// Section heading the Empath must emit for the perspective analysis
pub const HEADING_PERSPECTIVE: &str = "## Understanding Their Perspective";
/// Section heading the Empath must emit for the emotional bridge
pub const HEADING_BRIDGE: &str = "## Emotional Bridge";
/// Section heading the Empath must emit for the communication translator
pub const HEADING_TRANSLATOR: &str = "## Communication Translator";

/// Heading spelling comes from the consts above, shared with the bridge
/// extractor.
fn empath_single_shot(text: &str) -> String {
    format!(
        "You are the Empath, a mediator who helps people in conflict \
understand each other. Analyze the conflict below from the other person's point of view. \
Respond in the same language as the conflict description, using exactly these three Markdown \
sections:\n\n\
{HEADING_PERSPECTIVE}\nWhat the other person is likely feeling and why, stated \
without judgment.\n\n\
{HEADING_BRIDGE}\nOne short phrase naming the shared feeling or need that connects both \
sides of this conflict.\n\n\
{HEADING_TRANSLATOR}\nRewrite the user's main grievance as a non-violent, need-based \
statement they could actually say.\n\nConflict:\n{text}"
    )
}

fn empath_coaching(text: &str) -> String {
    format!(
        "You are the Empath, a mediator coaching someone through an \
ongoing conflict. Below is the conversation so far, followed by the other person's latest \
reply. Respond in the same language as the conversation, using exactly these two Markdown \
sections:\n\n\
## What Their Reply Reveals\nWhat the latest reply tells us about their emotional state.\n\n\
{HEADING_BRIDGE}\nOne short phrase naming the shared feeling or need still connecting both \
sides.\n\nConversation:\n{text}"
    )
}

const STRATEGIST_SINGLE_SHOT: &str = "You are the Strategist, a negotiation coach. Analyze \
the conflict below and produce a tactical, interest-based plan: the user's underlying \
interests, the other party's likely interests, and three concrete next moves ordered from \
lowest to highest risk. Respond in the same language as the conflict description.\n\n\
Conflict:\n";

const STRATEGIST_COACHING: &str = "You are the Strategist, a negotiation coach mid-engagement. \
Below is the conversation so far, followed by the other person's latest reply. Update the \
tactical plan: what the reply changes, and the single best next move. Respond in the same \
language as the conversation.\n\nConversation:\n";

const DEVIL_SINGLE_SHOT: &str = "You are the Devil's Advocate. Steelman the other party: \
enumerate the strongest attacks, dismissals, or counter-arguments they could raise against \
the user's position in the conflict below, and for each one give a short counter-strategy. \
Respond in the same language as the conflict description.\n\nConflict:\n";

const DEVIL_COACHING: &str = "You are the Devil's Advocate mid-engagement. Below is the \
conversation so far, followed by the other person's latest reply. Enumerate the attacks \
hiding in that reply and how to counter each without escalating. Respond in the same \
language as the conversation.\n\nConversation:\n";

/// Build the Empath prompt for the given mode and conflict text
#[must_use]
pub fn empath_prompt(mode: CouncilMode, text: &str) -> String {
    match mode {
        CouncilMode::SingleShot => empath_single_shot(text),
        CouncilMode::CoachingContinuation => empath_coaching(text),
    }
}

/// Build the Strategist prompt for the given mode and conflict text
#[must_use]
pub fn strategist_prompt(mode: CouncilMode, text: &str) -> String {
    match mode {
        CouncilMode::SingleShot => format!("{STRATEGIST_SINGLE_SHOT}{text}"),
        CouncilMode::CoachingContinuation => format!("{STRATEGIST_COACHING}{text}"),
    }
}

/// Build the Devil's Advocate prompt for the given mode and conflict text
#[must_use]
pub fn devil_prompt(mode: CouncilMode, text: &str) -> String {
    match mode {
        CouncilMode::SingleShot => format!("{DEVIL_SINGLE_SHOT}{text}"),
        CouncilMode::CoachingContinuation => format!("{DEVIL_COACHING}{text}"),
    }
}

/// Linearize prior conversation turns into a single labeled transcript
///
/// Turn order is preserved; analyses and replies are numbered in order of
/// appearance so the models can refer back to "analysis 2" unambiguously.
/// The latest reply drives the new analysis, but the full history is kept
/// as context.
#[must_use]
pub fn linearize_history(turns: &[ConversationTurn]) -> String {
    let mut transcript = String::new();
    let mut analysis_n = 0usize;
    let mut reply_n = 0usize;

    for turn in turns {
        let label = match turn.role {
            TurnRole::InitialProblem => "Initial problem".to_owned(),
            TurnRole::AiAnalysis => {
                analysis_n += 1;
                format!("Analysis #{analysis_n}")
            }
            TurnRole::TheirReply => {
                reply_n += 1;
                format!("Their reply #{reply_n}")
            }
        };
        transcript.push_str(&label);
        transcript.push_str(": ");
        transcript.push_str(turn.content.trim());
        transcript.push_str("\n\n");
    }

    transcript.trim_end().to_owned()
}
