use axum::extract::State;
use axum::routing::get;
use axum::Router;
use serde::Serialize;

use super::{ok, ApiResult};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub database: bool,
}

/// Unauthenticated liveness check.
async fn health(State(state): State<AppState>) -> ApiResult<HealthResponse> {
    ok(HealthResponse {
        service: "innkeep-server",
        version: env!("CARGO_PKG_VERSION"),
        database: state.db.health_check().await,
    })
}
