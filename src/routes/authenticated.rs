use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, post, put},
};

/// Authenticated Router Module
///
/// Defines the routes accessible to any user who has successfully passed the
/// authentication layer. This module implements all core portal features:
/// profile self-service, club browsing and membership, the event lifecycle,
/// and attendance.
///
/// Access Control Strategy:
/// Every handler in this module relies on the `AuthUser` extractor, which
/// guarantees a validated `{id, role}` pair. Finer-grained authorization
/// (ownership, role capability sets, status visibility) is enforced per
/// handler through the `policy` module.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // --- Users ---
        // GET /users/me
        // Retrieves the currently authenticated user's own profile.
        .route("/users/me", get(handlers::get_me))
        // GET/PUT/DELETE /users/{id}
        // Detail is open to admins, club managers and the user themselves;
        // updates and deletion to the user themselves or an admin. Role
        // changes within an update are admin-only.
        .route(
            "/users/{id}",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        // --- Clubs ---
        // GET /clubs?active_only=...&skip=...&limit=...
        // Paged listing, inactive clubs hidden by default.
        .route("/clubs", get(handlers::list_clubs))
        // GET/PUT/DELETE /clubs/{id}
        // Updates run under the per-role capability sets (admin: name,
        // is_active, manager_id; owning manager: presentation fields).
        // Deletion is admin or owning manager, and cascades over the club's
        // membership rows, events, and attendance.
        .route(
            "/clubs/{id}",
            get(handlers::get_club)
                .put(handlers::update_club)
                .delete(handlers::delete_club),
        )
        // POST/GET /clubs/{id}/members
        // POST is student self-join; duplicate joins resolve at the composite
        // primary key and surface as 409. GET is admin, owning manager, or a
        // member of the club.
        .route(
            "/clubs/{id}/members",
            post(handlers::join_club).get(handlers::list_club_members),
        )
        // DELETE /clubs/{id}/members/{user_id}
        // Admin, owning manager, or the member removing themselves.
        .route(
            "/clubs/{id}/members/{user_id}",
            delete(handlers::remove_club_member),
        )
        // GET /clubs/{id}/stats
        // Aggregated counters; admin or owning manager only.
        .route("/clubs/{id}/stats", get(handlers::get_club_stats))
        // --- Events ---
        // POST /events
        // Creates an event for a club the caller administers, starting at
        // IDEATION (or PLANNING when explicitly requested).
        .route("/events", post(handlers::create_event))
        // GET /events?status=...&club_id=...
        // Visibility-scoped listing; the status filter narrows within the
        // caller's allowed set and never widens it.
        .route("/events", get(handlers::list_events))
        // GET/PUT/DELETE /events/{id}
        // Detail follows the same visibility rules as the listing; updates
        // and deletion are admin or owning manager. Status is not updatable
        // here: transitions go through the lifecycle endpoints below.
        .route(
            "/events/{id}",
            get(handlers::get_event)
                .put(handlers::update_event)
                .delete(handlers::delete_event),
        )
        // POST /events/{id}/advance
        // Owning manager pushes the event one lifecycle step forward. PENDING
        // is the review gate (manager is refused), PAST is terminal.
        .route("/events/{id}/advance", post(handlers::advance_event))
        // POST /events/{id}/review
        // Admin resolves a PENDING event: approve publishes, reject returns
        // it to PLANNING.
        .route("/events/{id}/review", post(handlers::review_event))
        // --- Attendance ---
        // GET /events/{id}/attendees
        // Attendee listing; admin or owning manager only.
        .route("/events/{id}/attendees", get(handlers::list_attendees))
        // POST/DELETE /events/{id}/attendees/{user_id}
        // Self-registration, or an admin / owning manager acting on any user.
        // The composite primary key keeps registration idempotent under races.
        .route(
            "/events/{id}/attendees/{user_id}",
            post(handlers::register_attendee).delete(handlers::remove_attendee),
        )
        // GET /events/{id}/stats
        // Attendance ratios; admin or owning manager only.
        .route("/events/{id}/stats", get(handlers::get_event_stats))
}
