use axum::{extract::State, Extension, Json};
use serde::Serialize;

use crate::{
    error::Result,
    models::payload::Payload,
    services::session as session_service,
    state::AppState,
};

/// The sealed view of the current user.
///
/// `id` is a freshly sealed token, never the raw identifier.
#[derive(Serialize)]
pub struct SealedUser {
    pub id: String,
    pub exp: i64,
}

#[derive(Serialize)]
pub struct MeResponse {
    pub user: SealedUser,
}

/// Returns the current user with a freshly sealed id.
#[axum::debug_handler]
pub async fn me(
    State(state): State<AppState>,
    Extension(payload): Extension<Payload>,
) -> Result<Json<MeResponse>> {
    tracing::debug!("/api/user/me for user: {}", payload.id);

    let issued = session_service::issue(
        &state.sealer,
        &payload.id,
        state.config.token_ttl_secs,
        chrono::Utc::now().timestamp(),
    )?;

    Ok(Json(MeResponse {
        user: SealedUser {
            id: issued.token,
            exp: issued.exp,
        },
    }))
}
