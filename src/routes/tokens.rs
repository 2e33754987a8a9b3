use crate::{AppState, handlers::tokens};
use axum::{
    Router,
    routing::{get, post},
};

/// Token Router Module
///
/// Unauthenticated by nature: these endpoints are how a client gets a token.
pub fn token_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check for load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /api-token-auth/
        // Username and password in, token out.
        .route("/api-token-auth/", post(tokens::obtain_token))
        // POST /api-token-refresh/
        // Same refresh chain (`orig_iat`), later expiry.
        .route("/api-token-refresh/", post(tokens::refresh))
        .route("/api-token-verify/", post(tokens::verify))
}
