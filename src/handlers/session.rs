use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use garde::Validate;
use serde::{Deserialize, Serialize};
use tower_cookies::cookie::time::Duration;
use tower_cookies::{Cookie, Cookies};

use crate::{
    error::{AppError, Result},
    middleware_layer::auth::SESSION_COOKIE,
    models::payload::Payload,
    services::session::{self as session_service, IssuedToken},
    state::AppState,
    validation::payload::validate_user_id,
};

/// The request payload for issuing a sealed token.
#[derive(Deserialize, Debug, Validate)]
pub struct IssueRequest {
    #[garde(length(min = 1, max = 256))]
    pub id: String,
}

/// The request payload for verifying a sealed token.
#[derive(Deserialize)]
pub struct VerifyRequest {
    pub token: String,
}

/// The response payload for token verification.
///
/// A rejected token only ever yields `{"valid":false}`.
#[derive(Serialize, Debug, PartialEq)]
pub struct VerifyResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// The response payload for logout.
#[derive(Serialize)]
pub struct LogoutResponse {
    pub success: bool,
    pub message: String,
}

/// Creates the session cookie carrying a sealed token.
pub fn create_session_cookie(value: String, max_age_secs: i64, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, value);

    cookie.set_http_only(true);
    if secure {
        cookie.set_secure(true);
    }

    cookie.set_same_site(tower_cookies::cookie::SameSite::Lax);
    cookie.set_max_age(Duration::seconds(max_age_secs));
    cookie.set_path("/");

    cookie
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn set_session_cookie(state: &AppState, cookies: &Cookies, issued: &IssuedToken) {
    cookies.add(create_session_cookie(
        issued.token.clone(),
        state.config.token_ttl_secs,
        state.config.secure_cookies,
    ));
}

/// Issues a sealed token for a user an upstream issuer has authenticated.
#[axum::debug_handler]
pub async fn issue(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<IssueRequest>,
) -> Result<Response> {
    payload
        .validate()
        .map_err(|report| AppError::Validation(report.to_string()))?;
    validate_user_id(&payload.id)?;

    let issued = session_service::issue(&state.sealer, &payload.id, state.config.token_ttl_secs, now())?;
    set_session_cookie(&state, &cookies, &issued);

    tracing::info!("✅ Sealed session issued for user: {}", payload.id);

    Ok((StatusCode::CREATED, Json(issued)).into_response())
}

/// Reports whether a token is live, and for whom.
#[axum::debug_handler]
pub async fn verify(
    State(state): State<AppState>,
    Json(payload): Json<VerifyRequest>,
) -> Json<VerifyResponse> {
    match session_service::authenticate(&state.sealer, &payload.token, now()) {
        Ok(Payload { id, exp }) => Json(VerifyResponse {
            valid: true,
            id: Some(id),
            exp: Some(exp),
        }),
        Err(e) => {
            tracing::debug!("Verification rejected token: {}", e);
            Json(VerifyResponse {
                valid: false,
                id: None,
                exp: None,
            })
        }
    }
}

/// Reissues the caller's token with a fresh expiry.
#[axum::debug_handler]
pub async fn refresh(
    State(state): State<AppState>,
    Extension(payload): Extension<Payload>,
    cookies: Cookies,
) -> Result<Response> {
    let issued = session_service::refresh(&state.sealer, &payload, state.config.token_ttl_secs, now())?;
    set_session_cookie(&state, &cookies, &issued);

    tracing::info!("🔄 Sealed session refreshed for user: {}", payload.id);

    Ok((StatusCode::OK, Json(issued)).into_response())
}

/// Clears the session cookie.
///
/// Tokens are not tracked server-side, so a copy captured elsewhere stays
/// valid until it expires.
#[axum::debug_handler]
pub async fn logout(cookies: Cookies) -> Response {
    let mut session_cookie = Cookie::new(SESSION_COOKIE, "");
    session_cookie.set_max_age(Duration::seconds(0));
    session_cookie.set_path("/");
    cookies.remove(session_cookie);

    tracing::info!("👋 Session cookie cleared");

    let response = LogoutResponse {
        success: true,
        message: "Logout successful".to_string(),
    };

    (StatusCode::OK, Json(response)).into_response()
}
