use axum::extract::{Path, State};
use axum::routing::{delete, get};
use axum::{Json, Router};
use innkeep_core::{Expense, ExpenseSummary, NewExpense};

use super::{deleted, ok, ApiResult, Deleted};
use crate::auth::AuthUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/Expense", get(list).post(create))
        .route("/api/Expense/summary", get(summary))
        .route("/api/Expense/{id}", delete(remove))
}

async fn list(State(state): State<AppState>, user: AuthUser) -> ApiResult<Vec<Expense>> {
    ok(state.db.expenses().list(&user.tenant).await?)
}

async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(expense): Json<NewExpense>,
) -> ApiResult<Expense> {
    ok(state.db.expenses().create(&user.tenant, expense).await?)
}

async fn summary(State(state): State<AppState>, user: AuthUser) -> ApiResult<Vec<ExpenseSummary>> {
    ok(state.db.expenses().summary(&user.tenant).await?)
}

async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    state.db.expenses().delete(&user.tenant, &id).await?;
    deleted(id)
}
