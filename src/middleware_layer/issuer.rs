use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

use crate::{error::AppError, state::AppState};

/// Header an upstream issuer uses to present the shared issuer key.
pub const ISSUER_HEADER: &str = "x-issuer-key";

/// A middleware that admits only trusted upstream issuers.
///
/// The presented key is compared in constant time.
pub async fn require_issuer(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let presented = match req.headers().get(ISSUER_HEADER).map(|h| h.as_bytes()) {
        Some(key) => key,
        None => {
            tracing::warn!("❌ Issuer: header {} missing", ISSUER_HEADER);
            return AppError::IssuerRejected.into_response();
        }
    };

    let expected = state.config.issuer_api_key.as_bytes();
    if !bool::from(presented.ct_eq(expected)) {
        tracing::warn!("❌ Issuer: key mismatch");
        return AppError::IssuerRejected.into_response();
    }

    tracing::debug!("✅ Issuer key valid");
    next.run(req).await
}
