use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    auth::{self, AuthUser},
    config::AppConfig,
    error::ApiError,
    lifecycle,
    models::{
        Club, ClubStats, CreateClubRequest, CreateEventRequest, Event, EventStats, EventStatus,
        LoginRequest, RegisterUserRequest, ReviewRequest, Role, TokenResponse, UpdateClubRequest,
        UpdateEventRequest, UpdateUserRequest, UserChanges, UserProfile,
    },
    policy,
    repository::{EventQuery, NewUser, RepositoryState},
};

// --- Query Parameter Schemas ---

/// ClubFilter
///
/// Paging and activity filter for the club listing.
#[derive(Debug, Deserialize, IntoParams)]
pub struct ClubFilter {
    /// When true (the default), inactive clubs are omitted.
    pub active_only: Option<bool>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// EventFilter
///
/// Optional narrowing for the event listing. The status filter intersects with
/// the caller's visibility set; it can narrow what they see but never widen it.
#[derive(Debug, Deserialize, IntoParams)]
pub struct EventFilter {
    pub status: Option<EventStatus>,
    pub club_id: Option<i64>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

const DEFAULT_PAGE_LIMIT: i64 = 100;

// --- Public Handlers ---

/// health
///
/// Liveness probe. No auth, no database.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up"))
)]
pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// register_user
///
/// Creates a user account. The plaintext password is hashed with Argon2id
/// before the repository sees it; a duplicate email or student id surfaces as
/// a 409.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "User created", body = UserProfile),
        (status = 409, description = "Email or student id already registered"),
        (status = 422, description = "Payload failed validation")
    )
)]
pub async fn register_user(
    State(repo): State<RepositoryState>,
    Json(req): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<UserProfile>), ApiError> {
    req.validate()?;

    let hashed_password = auth::hash_password(&req.password)?;
    let user = repo
        .create_user(NewUser {
            student_id: req.student_id,
            name: req.name,
            email: req.email,
            hashed_password,
            role: req.role,
            wants_email_notif: req.wants_email_notif.unwrap_or(true),
        })
        .await
        .ok_or(ApiError::AlreadyExists(
            "a user with this email or student id already exists",
        ))?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// login
///
/// Exchanges credentials for a bearer token. The identifier is matched against
/// the email first, then parsed as a numeric student id. Unknown identifier
/// and wrong password are deliberately indistinguishable.
#[utoipa::path(
    post,
    path = "/auth/token",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Incorrect username or password")
    )
)]
pub async fn login(
    State(repo): State<RepositoryState>,
    State(config): State<AppConfig>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = auth::resolve_subject(&repo, &req.identifier)
        .await
        .ok_or(ApiError::InvalidCredentials)?;

    if !auth::verify_password(&req.password, &user.hashed_password) {
        return Err(ApiError::InvalidCredentials);
    }

    let access_token = auth::issue_token(&user, &config)?;
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

// --- User Handlers ---

/// get_me
///
/// Returns the authenticated caller's own profile.
#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "Caller profile", body = UserProfile),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_me(
    auth_user: AuthUser,
    State(repo): State<RepositoryState>,
) -> Result<Json<UserProfile>, ApiError> {
    let user = repo
        .get_user(auth_user.id)
        .await
        .ok_or(ApiError::UserNotFound)?;
    Ok(Json(user.into()))
}

/// get_user
///
/// User detail: admin, any club manager, or the user themselves.
#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User profile", body = UserProfile),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "User does not exist")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_user(
    auth_user: AuthUser,
    State(repo): State<RepositoryState>,
    Path(id): Path<i64>,
) -> Result<Json<UserProfile>, ApiError> {
    let allowed = policy::is_admin(auth_user.role)
        || auth_user.role == Role::ClubManager
        || policy::is_self(auth_user.id, id);
    if !allowed {
        return Err(ApiError::Forbidden);
    }

    let user = repo.get_user(id).await.ok_or(ApiError::NotFound("user"))?;
    Ok(Json(user.into()))
}

/// update_user
///
/// Partial profile update: the user themselves or an admin. Role changes are
/// admin-only; a supplied password is re-hashed before storage.
#[utoipa::path(
    put,
    path = "/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserProfile),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "User does not exist"),
        (status = 422, description = "Payload failed validation")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_user(
    auth_user: AuthUser,
    State(repo): State<RepositoryState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    if !(policy::is_admin(auth_user.role) || policy::is_self(auth_user.id, id)) {
        return Err(ApiError::Forbidden);
    }
    req.validate()?;

    if req.role.is_some() && !policy::is_admin(auth_user.role) {
        return Err(ApiError::Validation(
            "field `role` is not permitted for your role".into(),
        ));
    }

    let hashed_password = match &req.password {
        Some(password) => Some(auth::hash_password(password)?),
        None => None,
    };

    let user = repo
        .update_user(
            id,
            UserChanges {
                student_id: req.student_id,
                name: req.name,
                email: req.email,
                role: req.role,
                wants_email_notif: req.wants_email_notif,
                hashed_password,
            },
        )
        .await
        .ok_or(ApiError::NotFound("user"))?;

    Ok(Json(user.into()))
}

/// delete_user
///
/// Removes an account: the user themselves or an admin. Membership and
/// attendance rows go with it.
#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "User does not exist")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_user(
    auth_user: AuthUser,
    State(repo): State<RepositoryState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if !(policy::is_admin(auth_user.role) || policy::is_self(auth_user.id, id)) {
        return Err(ApiError::Forbidden);
    }
    if repo.delete_user(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("user"))
    }
}

/// list_users
///
/// Global user listing, admin only.
#[utoipa::path(
    get,
    path = "/admin/users",
    responses(
        (status = 200, description = "All registered users", body = [UserProfile]),
        (status = 403, description = "Not authorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    auth_user: AuthUser,
    State(repo): State<RepositoryState>,
) -> Result<Json<Vec<UserProfile>>, ApiError> {
    if !policy::is_admin(auth_user.role) {
        return Err(ApiError::Forbidden);
    }
    let users = repo.list_users().await;
    Ok(Json(users.into_iter().map(UserProfile::from).collect()))
}

// --- Club Handlers ---

/// create_club
///
/// Admin-only club creation; a manager may be assigned at creation time or
/// later through the partial update.
#[utoipa::path(
    post,
    path = "/admin/clubs",
    request_body = CreateClubRequest,
    responses(
        (status = 201, description = "Club created", body = Club),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "Assigned manager does not exist"),
        (status = 422, description = "Payload failed validation")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_club(
    auth_user: AuthUser,
    State(repo): State<RepositoryState>,
    Json(req): Json<CreateClubRequest>,
) -> Result<(StatusCode, Json<Club>), ApiError> {
    if !policy::is_admin(auth_user.role) {
        return Err(ApiError::Forbidden);
    }
    req.validate()?;

    if let Some(manager_id) = req.manager_id {
        repo.get_user(manager_id)
            .await
            .ok_or(ApiError::NotFound("user"))?;
    }

    let club = repo.create_club(req).await.ok_or(ApiError::Internal)?;
    Ok((StatusCode::CREATED, Json(club)))
}

/// list_clubs
///
/// Paged club listing, visible to every authenticated user. Inactive clubs
/// are omitted unless `active_only=false` is requested.
#[utoipa::path(
    get,
    path = "/clubs",
    params(ClubFilter),
    responses((status = 200, description = "Clubs", body = [Club])),
    security(("bearer_auth" = []))
)]
pub async fn list_clubs(
    _auth_user: AuthUser,
    State(repo): State<RepositoryState>,
    Query(filter): Query<ClubFilter>,
) -> Result<Json<Vec<Club>>, ApiError> {
    let clubs = repo
        .list_clubs(
            filter.active_only.unwrap_or(true),
            filter.skip.unwrap_or(0).max(0),
            filter.limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(0, 500),
        )
        .await;
    Ok(Json(clubs))
}

/// get_club
#[utoipa::path(
    get,
    path = "/clubs/{id}",
    params(("id" = i64, Path, description = "Club id")),
    responses(
        (status = 200, description = "Club", body = Club),
        (status = 404, description = "Club does not exist")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_club(
    _auth_user: AuthUser,
    State(repo): State<RepositoryState>,
    Path(id): Path<i64>,
) -> Result<Json<Club>, ApiError> {
    let club = repo.get_club(id).await.ok_or(ApiError::NotFound("club"))?;
    Ok(Json(club))
}

/// update_club
///
/// Partial club update under the per-role capability sets: admins control
/// name, active flag and manager assignment; the owning manager controls the
/// presentation fields. A supplied field outside the caller's set is a 422.
#[utoipa::path(
    put,
    path = "/clubs/{id}",
    params(("id" = i64, Path, description = "Club id")),
    request_body = UpdateClubRequest,
    responses(
        (status = 200, description = "Updated club", body = Club),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "Club does not exist"),
        (status = 422, description = "Payload failed validation or out-of-scope field")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_club(
    auth_user: AuthUser,
    State(repo): State<RepositoryState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateClubRequest>,
) -> Result<Json<Club>, ApiError> {
    let club = repo.get_club(id).await.ok_or(ApiError::NotFound("club"))?;

    req.validate()?;
    policy::check_club_update(auth_user.id, auth_user.role, &club, &req)?;

    if let Some(manager_id) = req.manager_id {
        repo.get_user(manager_id)
            .await
            .ok_or(ApiError::NotFound("user"))?;
    }

    let updated = repo
        .update_club(id, req)
        .await
        .ok_or(ApiError::NotFound("club"))?;
    Ok(Json(updated))
}

/// delete_club
///
/// Admin or owning manager. Membership rows, the club's events and their
/// attendance rows are removed in the same transaction.
#[utoipa::path(
    delete,
    path = "/clubs/{id}",
    params(("id" = i64, Path, description = "Club id")),
    responses(
        (status = 204, description = "Club deleted"),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "Club does not exist")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_club(
    auth_user: AuthUser,
    State(repo): State<RepositoryState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let club = repo.get_club(id).await.ok_or(ApiError::NotFound("club"))?;
    if !policy::can_manage_club(auth_user.id, auth_user.role, &club) {
        return Err(ApiError::Forbidden);
    }
    if repo.delete_club(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("club"))
    }
}

/// join_club
///
/// Self-service membership: a STUDENT adds themselves to a club. The
/// existence check is advisory; the composite primary key is the backstop, so
/// a race between two identical joins still yields exactly one row and one 409.
#[utoipa::path(
    post,
    path = "/clubs/{id}/members",
    params(("id" = i64, Path, description = "Club id")),
    responses(
        (status = 201, description = "Joined"),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "Club does not exist"),
        (status = 409, description = "Already a member")
    ),
    security(("bearer_auth" = []))
)]
pub async fn join_club(
    auth_user: AuthUser,
    State(repo): State<RepositoryState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if auth_user.role != Role::Student {
        return Err(ApiError::Forbidden);
    }
    repo.get_club(id).await.ok_or(ApiError::NotFound("club"))?;

    if repo.add_membership(id, auth_user.id).await {
        Ok(StatusCode::CREATED)
    } else {
        Err(ApiError::AlreadyExists("already a member of this club"))
    }
}

/// list_club_members
///
/// Admin, the owning manager, or a member of the club.
#[utoipa::path(
    get,
    path = "/clubs/{id}/members",
    params(("id" = i64, Path, description = "Club id")),
    responses(
        (status = 200, description = "Members", body = [UserProfile]),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "Club does not exist")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_club_members(
    auth_user: AuthUser,
    State(repo): State<RepositoryState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<UserProfile>>, ApiError> {
    let club = repo.get_club(id).await.ok_or(ApiError::NotFound("club"))?;

    let allowed = policy::can_manage_club(auth_user.id, auth_user.role, &club)
        || repo.is_member(id, auth_user.id).await;
    if !allowed {
        return Err(ApiError::Forbidden);
    }

    let members = repo.club_members(id).await;
    Ok(Json(members.into_iter().map(UserProfile::from).collect()))
}

/// remove_club_member
///
/// Admin, the owning manager, or the member removing themselves.
#[utoipa::path(
    delete,
    path = "/clubs/{id}/members/{user_id}",
    params(
        ("id" = i64, Path, description = "Club id"),
        ("user_id" = i64, Path, description = "Member user id")
    ),
    responses(
        (status = 204, description = "Membership removed"),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "Club or membership does not exist")
    ),
    security(("bearer_auth" = []))
)]
pub async fn remove_club_member(
    auth_user: AuthUser,
    State(repo): State<RepositoryState>,
    Path((id, user_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    let club = repo.get_club(id).await.ok_or(ApiError::NotFound("club"))?;

    let allowed = policy::can_manage_club(auth_user.id, auth_user.role, &club)
        || policy::is_self(auth_user.id, user_id);
    if !allowed {
        return Err(ApiError::Forbidden);
    }

    if repo.remove_membership(id, user_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("membership"))
    }
}

/// get_club_stats
///
/// Aggregated counters for a club; admin or owning manager only.
#[utoipa::path(
    get,
    path = "/clubs/{id}/stats",
    params(("id" = i64, Path, description = "Club id")),
    responses(
        (status = 200, description = "Club statistics", body = ClubStats),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "Club does not exist")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_club_stats(
    auth_user: AuthUser,
    State(repo): State<RepositoryState>,
    Path(id): Path<i64>,
) -> Result<Json<ClubStats>, ApiError> {
    let club = repo.get_club(id).await.ok_or(ApiError::NotFound("club"))?;
    if !policy::can_manage_club(auth_user.id, auth_user.role, &club) {
        return Err(ApiError::Forbidden);
    }
    Ok(Json(repo.club_stats(id).await))
}

// --- Event Handlers ---

/// create_event
///
/// Admin or the owning club manager. The initial status defaults to IDEATION;
/// an event can never be born past the review gate.
#[utoipa::path(
    post,
    path = "/events",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = Event),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "Club does not exist"),
        (status = 422, description = "Payload failed validation")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_event(
    auth_user: AuthUser,
    State(repo): State<RepositoryState>,
    Json(req): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<Event>), ApiError> {
    req.validate()?;

    let club = repo
        .get_club(req.club_id)
        .await
        .ok_or(ApiError::NotFound("club"))?;
    if !policy::can_manage_club(auth_user.id, auth_user.role, &club) {
        return Err(ApiError::Forbidden);
    }

    let status = lifecycle::initial_status(req.status)?;
    let event = repo
        .create_event(req, status)
        .await
        .ok_or(ApiError::Internal)?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// list_events
///
/// Visibility-scoped event listing. The caller's role decides the base status
/// set; a club manager additionally sees their own clubs' full lifecycle. A
/// requested status filter narrows within the allowed sets and a filter
/// outside them yields an empty list, never a 403.
#[utoipa::path(
    get,
    path = "/events",
    params(EventFilter),
    responses((status = 200, description = "Visible events", body = [Event])),
    security(("bearer_auth" = []))
)]
pub async fn list_events(
    auth_user: AuthUser,
    State(repo): State<RepositoryState>,
    Query(filter): Query<EventFilter>,
) -> Result<Json<Vec<Event>>, ApiError> {
    let statuses = policy::narrow_statuses(policy::visible_statuses(auth_user.role), filter.status);

    let (manager_id, managed_statuses) = if auth_user.role == Role::ClubManager {
        (
            Some(auth_user.id),
            policy::narrow_statuses(policy::MANAGED_VISIBLE, filter.status),
        )
    } else {
        (None, vec![])
    };

    let events = repo
        .list_events(EventQuery {
            statuses,
            club_id: filter.club_id,
            manager_id,
            managed_statuses,
            skip: filter.skip.unwrap_or(0).max(0),
            limit: filter.limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(0, 500),
        })
        .await;
    Ok(Json(events))
}

/// get_event
///
/// Event detail under the same visibility rules as the listing. A hidden
/// event reads as 404, not 403, so drafts do not leak their existence.
#[utoipa::path(
    get,
    path = "/events/{id}",
    params(("id" = i64, Path, description = "Event id")),
    responses(
        (status = 200, description = "Event", body = Event),
        (status = 404, description = "Event does not exist or is not visible")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_event(
    auth_user: AuthUser,
    State(repo): State<RepositoryState>,
    Path(id): Path<i64>,
) -> Result<Json<Event>, ApiError> {
    let event = repo
        .get_event(id)
        .await
        .ok_or(ApiError::NotFound("event"))?;
    let club = repo
        .get_club(event.club_id)
        .await
        .ok_or(ApiError::NotFound("event"))?;

    if !policy::can_view_event(auth_user.id, auth_user.role, &club, event.status) {
        return Err(ApiError::NotFound("event"));
    }
    Ok(Json(event))
}

/// update_event
///
/// Admin or the owning club manager. Status and club assignment are absent
/// from the payload: transitions go through advance/review only.
#[utoipa::path(
    put,
    path = "/events/{id}",
    params(("id" = i64, Path, description = "Event id")),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Updated event", body = Event),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "Event does not exist"),
        (status = 422, description = "Payload failed validation")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_event(
    auth_user: AuthUser,
    State(repo): State<RepositoryState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateEventRequest>,
) -> Result<Json<Event>, ApiError> {
    let event = repo
        .get_event(id)
        .await
        .ok_or(ApiError::NotFound("event"))?;
    let club = repo
        .get_club(event.club_id)
        .await
        .ok_or(ApiError::NotFound("event"))?;
    if !policy::can_manage_club(auth_user.id, auth_user.role, &club) {
        return Err(ApiError::Forbidden);
    }
    req.validate()?;

    let updated = repo
        .update_event(id, req)
        .await
        .ok_or(ApiError::NotFound("event"))?;
    Ok(Json(updated))
}

/// delete_event
///
/// Admin or the owning club manager; attendance rows go with the event.
#[utoipa::path(
    delete,
    path = "/events/{id}",
    params(("id" = i64, Path, description = "Event id")),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "Event does not exist")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_event(
    auth_user: AuthUser,
    State(repo): State<RepositoryState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let event = repo
        .get_event(id)
        .await
        .ok_or(ApiError::NotFound("event"))?;
    let club = repo
        .get_club(event.club_id)
        .await
        .ok_or(ApiError::NotFound("event"))?;
    if !policy::can_manage_club(auth_user.id, auth_user.role, &club) {
        return Err(ApiError::Forbidden);
    }

    if repo.delete_event(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("event"))
    }
}

/// advance_event
///
/// Pushes an event one step along the lifecycle. Only the owning club manager
/// may advance; at PENDING the manager must wait for the review gate, and PAST
/// is terminal.
#[utoipa::path(
    post,
    path = "/events/{id}/advance",
    params(("id" = i64, Path, description = "Event id")),
    responses(
        (status = 200, description = "Event advanced", body = Event),
        (status = 403, description = "Not authorized or awaiting review"),
        (status = 404, description = "Event does not exist"),
        (status = 409, description = "Event is at its terminal status")
    ),
    security(("bearer_auth" = []))
)]
pub async fn advance_event(
    auth_user: AuthUser,
    State(repo): State<RepositoryState>,
    Path(id): Path<i64>,
) -> Result<Json<Event>, ApiError> {
    let event = repo
        .get_event(id)
        .await
        .ok_or(ApiError::NotFound("event"))?;
    let club = repo
        .get_club(event.club_id)
        .await
        .ok_or(ApiError::NotFound("event"))?;

    let next = lifecycle::advance(auth_user.id, auth_user.role, &club, event.status)?;
    let updated = repo
        .set_event_status(id, next)
        .await
        .ok_or(ApiError::NotFound("event"))?;
    Ok(Json(updated))
}

/// review_event
///
/// The admin review gate for PENDING events: approve publishes (POSTED),
/// reject sends the event back to PLANNING.
#[utoipa::path(
    post,
    path = "/events/{id}/review",
    params(("id" = i64, Path, description = "Event id")),
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Review applied", body = Event),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "Event does not exist"),
        (status = 409, description = "Event is not awaiting review")
    ),
    security(("bearer_auth" = []))
)]
pub async fn review_event(
    auth_user: AuthUser,
    State(repo): State<RepositoryState>,
    Path(id): Path<i64>,
    Json(req): Json<ReviewRequest>,
) -> Result<Json<Event>, ApiError> {
    let event = repo
        .get_event(id)
        .await
        .ok_or(ApiError::NotFound("event"))?;

    let next = lifecycle::review(auth_user.role, event.status, req.approve)?;
    let updated = repo
        .set_event_status(id, next)
        .await
        .ok_or(ApiError::NotFound("event"))?;
    Ok(Json(updated))
}

// --- Attendance Handlers ---

/// register_attendee
///
/// Records attendance: a user registering themselves, an admin, or the owning
/// club manager registering anyone. Duplicate registration is a 409; the
/// composite key resolves races.
#[utoipa::path(
    post,
    path = "/events/{id}/attendees/{user_id}",
    params(
        ("id" = i64, Path, description = "Event id"),
        ("user_id" = i64, Path, description = "Attendee user id")
    ),
    responses(
        (status = 201, description = "Attendance recorded"),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "Event or user does not exist"),
        (status = 409, description = "Already registered")
    ),
    security(("bearer_auth" = []))
)]
pub async fn register_attendee(
    auth_user: AuthUser,
    State(repo): State<RepositoryState>,
    Path((id, user_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    let event = repo
        .get_event(id)
        .await
        .ok_or(ApiError::NotFound("event"))?;
    let club = repo
        .get_club(event.club_id)
        .await
        .ok_or(ApiError::NotFound("event"))?;

    let allowed = policy::is_self(auth_user.id, user_id)
        || policy::can_manage_club(auth_user.id, auth_user.role, &club);
    if !allowed {
        return Err(ApiError::Forbidden);
    }

    repo.get_user(user_id)
        .await
        .ok_or(ApiError::NotFound("user"))?;

    if repo.add_attendance(id, user_id).await {
        Ok(StatusCode::CREATED)
    } else {
        Err(ApiError::AlreadyExists(
            "already registered for this event",
        ))
    }
}

/// list_attendees
///
/// Attendee listing; admin or owning manager only.
#[utoipa::path(
    get,
    path = "/events/{id}/attendees",
    params(("id" = i64, Path, description = "Event id")),
    responses(
        (status = 200, description = "Attendees", body = [UserProfile]),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "Event does not exist")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_attendees(
    auth_user: AuthUser,
    State(repo): State<RepositoryState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<UserProfile>>, ApiError> {
    let event = repo
        .get_event(id)
        .await
        .ok_or(ApiError::NotFound("event"))?;
    let club = repo
        .get_club(event.club_id)
        .await
        .ok_or(ApiError::NotFound("event"))?;
    if !policy::can_manage_club(auth_user.id, auth_user.role, &club) {
        return Err(ApiError::Forbidden);
    }

    let attendees = repo.event_attendees(id).await;
    Ok(Json(attendees.into_iter().map(UserProfile::from).collect()))
}

/// remove_attendee
///
/// Removes an attendance record: self, admin, or the owning club manager.
#[utoipa::path(
    delete,
    path = "/events/{id}/attendees/{user_id}",
    params(
        ("id" = i64, Path, description = "Event id"),
        ("user_id" = i64, Path, description = "Attendee user id")
    ),
    responses(
        (status = 204, description = "Attendance removed"),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "Event or attendance does not exist")
    ),
    security(("bearer_auth" = []))
)]
pub async fn remove_attendee(
    auth_user: AuthUser,
    State(repo): State<RepositoryState>,
    Path((id, user_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    let event = repo
        .get_event(id)
        .await
        .ok_or(ApiError::NotFound("event"))?;
    let club = repo
        .get_club(event.club_id)
        .await
        .ok_or(ApiError::NotFound("event"))?;

    let allowed = policy::is_self(auth_user.id, user_id)
        || policy::can_manage_club(auth_user.id, auth_user.role, &club);
    if !allowed {
        return Err(ApiError::Forbidden);
    }

    if repo.remove_attendance(id, user_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("attendance"))
    }
}

/// get_event_stats
///
/// Aggregated attendance counters for an event; admin or owning manager only.
#[utoipa::path(
    get,
    path = "/events/{id}/stats",
    params(("id" = i64, Path, description = "Event id")),
    responses(
        (status = 200, description = "Event statistics", body = EventStats),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "Event does not exist")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_event_stats(
    auth_user: AuthUser,
    State(repo): State<RepositoryState>,
    Path(id): Path<i64>,
) -> Result<Json<EventStats>, ApiError> {
    let event = repo
        .get_event(id)
        .await
        .ok_or(ApiError::NotFound("event"))?;
    let club = repo
        .get_club(event.club_id)
        .await
        .ok_or(ApiError::NotFound("event"))?;
    if !policy::can_manage_club(auth_user.id, auth_user.role, &club) {
        return Err(ApiError::Forbidden);
    }
    Ok(Json(repo.event_stats(id).await))
}
