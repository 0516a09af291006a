//! LearnPath · progress and leaderboard backend
//!
//! - Axum HTTP JSON API for quizzes, courses/lessons and rankings
//! - XP accrual with derived levels, course completion tracking
//! - In-process relational store with optional JSON snapshot
//!
//! Important env variables:
//!   PORT               : u16 (default 3000)
//!   APP_CONFIG_PATH    : path to TOML config (admins, storage, content bank)
//!   ADMIN_EMAILS       : comma-separated admin emails, merged into config
//!   DATA_SNAPSHOT_PATH : JSON snapshot file for the store
//!   LOG_LEVEL          : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT         : "pretty" (default) or "json"

mod telemetry;
mod util;
mod error;
mod domain;
mod leveling;
mod scoring;
mod ranking;
mod progress;
mod config;
mod seeds;
mod store;
mod state;
mod protocol;
mod logic;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Shared application state: store (snapshot-backed if configured) + seeded content.
  let state = Arc::new(AppState::from_env().await?);

  let app = build_router(state);

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "learnpath", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "learnpath", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    warn!(target: "learnpath", error = %e, "Failed to listen for Ctrl-C; shutting down");
  }
}
