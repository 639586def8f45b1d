// ABOUTME: HTTP route assembly, shared server resources, and CORS configuration
// ABOUTME: Every handler borrows its dependencies from one Arc'd ServerResources
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ECHO Labs

pub mod analysis;
pub mod configs;
pub mod health;

use axum::Router;
use http::{header::HeaderName, HeaderValue, Method};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::database::{ConfigStore, Database, HistoryStore};
use crate::llm::AdapterRegistry;
use crate::orchestrator::{BridgeAggregator, HistoryRecorder, Orchestrator};
use crate::voice::TranscriptionClient;

/// Shared state for all HTTP handlers
pub struct ServerResources {
    pub orchestrator: Orchestrator,
    pub configs: ConfigStore,
    pub history: HistoryStore,
    pub transcription: TranscriptionClient,
    pub registry: Arc<AdapterRegistry>,
}

impl ServerResources {
    /// Wire the full dependency graph from its roots
    #[must_use]
    pub fn new(config: &ServerConfig, database: &Database, registry: Arc<AdapterRegistry>) -> Self {
        let orchestrator = Orchestrator::new(
            Arc::clone(&registry),
            database.configs(),
            BridgeAggregator::new(database.bridges()),
            HistoryRecorder::new(database.history()),
        );

        Self {
            orchestrator,
            configs: database.configs(),
            history: database.history(),
            transcription: TranscriptionClient::new(config.transcription.clone()),
            registry,
        }
    }
}

/// Assemble the full application router
#[must_use]
pub fn router(resources: Arc<ServerResources>, cors_allowed_origins: &str) -> Router {
    Router::new()
        .merge(analysis::AnalysisRoutes::routes(Arc::clone(&resources)))
        .merge(configs::ConfigRoutes::routes(Arc::clone(&resources)))
        .merge(health::HealthRoutes::routes(resources))
        .layer(setup_cors(cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
}

/// Configure CORS from a comma-separated origin list
///
/// An empty list or "*" allows any origin, which is how the browser client is
/// served during development.
#[must_use]
pub fn setup_cors(allowed_origins: &str) -> CorsLayer {
    let allow_origin = if allowed_origins.is_empty() || allowed_origins == "*" {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .split(',')
            .filter_map(|s| {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    HeaderValue::from_str(trimmed).ok()
                }
            })
            .collect();

        if origins.is_empty() {
            AllowOrigin::any()
        } else {
            AllowOrigin::list(origins)
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("accept"),
            HeaderName::from_static("origin"),
            HeaderName::from_static("x-requested-with"),
            HeaderName::from_static("x-user-id"),
        ])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
}
