use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use tower_cookies::Cookies;

use crate::{
    error::AppError,
    services::session,
    state::AppState,
};

/// Cookie carrying the sealed token.
pub const SESSION_COOKIE: &str = "user-data";
/// Header a client may use to re-send the sealed token instead of the cookie.
pub const SESSION_HEADER: &str = "x-encrypted-user-id";

/// Extracts the sealed token from the cookie, falling back to the header.
///
/// # Arguments
///
/// * `cookies` - The request cookies.
/// * `headers` - The request headers.
///
/// # Returns
///
/// An `Option` containing the token if one was presented.
pub fn extract_session_token(cookies: &Cookies, headers: &HeaderMap) -> Option<String> {
    cookies
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| {
            headers
                .get(SESSION_HEADER)
                .and_then(|h| h.to_str().ok())
                .map(str::to_string)
                .filter(|v| !v.is_empty())
        })
}

/// A middleware that requires a live sealed token.
///
/// On success the opened [`Payload`](crate::models::payload::Payload) is
/// inserted into the request extensions. Every failure produces the same
/// `401` response.
pub async fn require_sealed_user(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    tracing::debug!("🔐 Checking sealed session...");

    let token = extract_session_token(&cookies, request.headers()).ok_or_else(|| {
        tracing::warn!("❌ No sealed session token presented");
        AppError::Unauthorized
    })?;

    let now = chrono::Utc::now().timestamp();
    let payload = session::authenticate(&state.sealer, &token, now).map_err(|e| {
        tracing::warn!("❌ Sealed session rejected: {}", e);
        AppError::Unauthorized
    })?;

    tracing::debug!("✅ Sealed session valid for user: {}", payload.id);

    request.extensions_mut().insert(payload);

    Ok(next.run(request).await)
}
