use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Defines endpoints that are **unauthenticated** and accessible to any client.
/// These routes cover the identity gateway (account creation, token exchange)
/// and the liveness probe; everything else in the application requires a
/// validated session.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // A simple, unauthenticated endpoint used for monitoring and load balancer checks.
        // Returns 200 immediately to verify the service is running and responsive.
        .route("/health", get(handlers::health))
        // POST /auth/register
        // Endpoint for new user creation. Validates the payload, hashes the
        // password with Argon2id, and rejects duplicate emails/student ids with 409.
        .route("/auth/register", post(handlers::register_user))
        // POST /auth/token
        // Credential exchange: identifier (email or student id) plus password
        // in, signed bearer token out. Failures are uniformly 401.
        .route("/auth/token", post(handlers::login))
}
