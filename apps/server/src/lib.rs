//! # Innkeep Server
//!
//! REST API for the hotel back office.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Innkeep Server                                  │
//! │                                                                         │
//! │  Browser ──► axum Router ──► AuthUser (JWT) ──► innkeep-db repositories │
//! │                  │                                     │                │
//! │                  ▼                                     ▼                │
//! │            TraceLayer / CORS                    SQLite (WAL)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables override the TOML file:
//! - `INNKEEP_CONFIG` - config file path
//! - `INNKEEP_BIND_ADDR` / `INNKEEP_PORT` - listen address (default 0.0.0.0:8080)
//! - `INNKEEP_DATABASE_PATH` - SQLite file
//! - `INNKEEP_MAX_CONNECTIONS` - pool size
//! - `INNKEEP_JWT_SECRET` - HS256 secret shared with the login service
//! - `INNKEEP_CORS_PERMISSIVE` - allow any origin (development)

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

// Re-exports
pub use config::ServerConfig;
pub use error::{ApiError, ErrorCode};
pub use routes::build_router;
pub use state::AppState;
