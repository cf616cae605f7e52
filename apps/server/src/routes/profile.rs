use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use innkeep_core::{Profile, ProfileUpdate};

use super::{ok, ApiResult};
use crate::auth::AuthUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/Profile/{user_id}", get(get_profile).put(put_profile))
}

async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Path(user_id): Path<String>,
) -> ApiResult<Profile> {
    user.ensure_self(&user_id)?;
    ok(state.db.profiles().get(&user_id).await?)
}

/// The profile's `state` decides the GST regime of later bookings.
async fn put_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Path(user_id): Path<String>,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult<Profile> {
    user.ensure_self(&user_id)?;
    ok(state.db.profiles().upsert(&user_id, &user.tenant, update).await?)
}
