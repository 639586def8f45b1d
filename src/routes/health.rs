// ABOUTME: Health endpoint reporting service status and registered providers
// ABOUTME: Used by the web client and deployment probes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ECHO Labs

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;

use super::ServerResources;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub providers: Vec<String>,
}

/// Health routes container
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create the health route
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/health", get(Self::health))
            .with_state(resources)
    }

    async fn health(State(resources): State<Arc<ServerResources>>) -> Json<HealthResponse> {
        let mut providers: Vec<String> = resources
            .registry
            .providers()
            .iter()
            .map(|p| p.as_str().to_string())
            .collect();
        providers.sort();

        Json(HealthResponse {
            status: "ok",
            service: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            providers,
        })
    }
}
