// ABOUTME: Server binary wiring configuration, storage, adapters, and the HTTP router
// ABOUTME: Reads everything from the environment; flags only override the port
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ECHO Labs

//! # ECHO Server Binary
//!
//! Starts the conflict-analysis HTTP service: SQLite storage, the provider
//! adapter registry, and the analysis/configuration/health routes.

use anyhow::Result;
use clap::Parser;
use echo_council::config::ServerConfig;
use echo_council::database::Database;
use echo_council::llm::AdapterRegistry;
use echo_council::logging;
use echo_council::routes::{self, ServerResources};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "echo-server")]
#[command(about = "ECHO - multi-provider LLM conflict analysis service")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env();
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }

    logging::init_from_env()?;

    info!("Starting ECHO council service");
    info!("{}", config.summary());

    let database = Database::connect(&config.database_url).await?;

    let registry = Arc::new(AdapterRegistry::from_env(config.provider_timeout_secs));
    info!("Registered {} provider adapters", registry.providers().len());

    let resources = Arc::new(ServerResources::new(&config, &database, registry));
    let app = routes::router(resources, &config.cors_allowed_origins);

    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        return;
    }
    info!("Shutdown signal received");
}
