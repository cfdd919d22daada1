use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_cookies::CookieManagerLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::{handlers, middleware_layer, state::AppState};

/// Builds the application [`Router`] with all routes and middleware attached.
///
/// CORS and rate limiting are layered on in `main`.
pub fn build(state: AppState) -> Router {
    let issuer_routes = Router::new()
        .route("/api/session", post(handlers::session::issue))
        .route("/api/session/verify", post(handlers::session::verify))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware_layer::issuer::require_issuer,
        ));

    let protected_routes = Router::new()
        .route("/api/user/me", get(handlers::user::me))
        .route("/api/session/refresh", post(handlers::session::refresh))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware_layer::auth::require_sealed_user,
        ));

    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/auth/logout", post(handlers::session::logout))
        .merge(issuer_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default())
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(CookieManagerLayer::new())
        .with_state(state)
}
