// ABOUTME: Library root for the ECHO conflict-analysis service
// ABOUTME: Re-exports the orchestration, storage, and HTTP layers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ECHO Labs

//! # ECHO Council Service
//!
//! Multi-provider LLM orchestration for interpersonal conflict analysis.
//! Conflict text flows through one of three paths — a dynamic single-provider
//! call, the fixed "Council of Sages" triad, or a caller-chosen multi-provider
//! fan-out — and comes back as a normalized [`models::AnalysisResult`].
//! Recurring "emotional bridge" phrases are counted across analyses to build
//! a simple wisdom-of-the-crowd signal.

#![deny(unsafe_code)]

pub mod config;
pub mod database;
pub mod errors;
pub mod llm;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod routes;
pub mod voice;

pub use errors::{AppError, AppResult, ErrorCode};
