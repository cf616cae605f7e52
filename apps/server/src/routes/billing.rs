//! Billing ledgers: charges, payments and completion.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use innkeep_core::{Ledger, LegacyLedgerArrays, Money, NewLineItem};
use serde::Deserialize;

use super::{ok, today, ApiResult};
use crate::auth::AuthUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/Billing", get(list))
        .route("/api/Billing/{id}", get(get_one))
        .route("/api/Billing/{id}/items", post(add_item))
        .route("/api/Billing/{id}/payments", post(record_payment))
        .route("/api/Billing/{id}/complete", post(complete))
        .route("/api/Billing/{id}/legacy", get(legacy))
}

/// A charge plus the ledger version the desk last saw.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    #[serde(flatten)]
    pub item: NewLineItem,
    #[serde(default)]
    pub version: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub amount: Money,
    pub mode: String,
    #[serde(default)]
    pub remark: Option<String>,
    #[serde(default)]
    pub version: Option<i64>,
}

async fn list(State(state): State<AppState>, user: AuthUser) -> ApiResult<Vec<Ledger>> {
    ok(state.db.ledgers().list(&user.tenant).await?)
}

async fn get_one(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Ledger> {
    ok(state.db.ledgers().get(&user.tenant, &id).await?)
}

async fn add_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(request): Json<AddItemRequest>,
) -> ApiResult<Ledger> {
    let ledger = state
        .db
        .ledgers()
        .add_line_item(&user.tenant, &id, request.item, request.version)
        .await?;
    ok(ledger)
}

async fn record_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(request): Json<PaymentRequest>,
) -> ApiResult<Ledger> {
    let ledger = state
        .db
        .ledgers()
        .record_payment(
            &user.tenant,
            &id,
            request.amount,
            &request.mode,
            request.remark,
            request.version,
        )
        .await?;
    ok(ledger)
}

/// Marks the bill paid, checks the booking out and promotes the next stay
/// on each room.
async fn complete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Ledger> {
    ok(state.db.ledgers().complete_bill(&user.tenant, &id, today()).await?)
}

/// Parallel-array view for clients that predate line items.
async fn legacy(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<LegacyLedgerArrays> {
    let ledger = state.db.ledgers().get(&user.tenant, &id).await?;
    ok(ledger.legacy_arrays())
}
