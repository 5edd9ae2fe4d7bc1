use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Admin Router Module
///
/// Defines the routes exclusively meaningful to SAO_ADMIN users: global user
/// oversight and club provisioning.
///
/// Access Control:
/// The routes are nested under `/admin` and authenticated by the `AuthUser`
/// extractor like the rest of the protected surface; the SAO_ADMIN role check
/// itself is performed inside each handler so that a non-admin receives a
/// proper 403 body rather than a bare middleware rejection.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/users
        // Lists every registered account. Essential for SAO oversight of the
        // student body and manager assignments.
        .route("/users", get(handlers::list_users))
        // POST /admin/clubs
        // Provisions a new club, optionally assigning its manager up front.
        // Managers are otherwise assigned later via PUT /clubs/{id}.
        .route("/clubs", post(handlers::create_club))
}
