use crate::{
    error::ApiError,
    models::{Club, EventStatus, Role, UpdateClubRequest},
};

/// Authorization Policy
///
/// The original application duplicated its role checks inline in every route
/// handler. Here they are collected into one stateless module consulted by all
/// handlers, so each predicate and capability set is written exactly once.
///
/// Three primitive predicates cover everything:
/// - `is_admin`: SAO_ADMIN, global authority.
/// - `is_club_manager`: CLUB_MANAGER whose id matches the club's `manager_id`.
///   Ownership is the 1:1 pointer on the club, never derived from membership.
/// - `is_self`: identity equality for self-service operations.

pub fn is_admin(role: Role) -> bool {
    role == Role::SaoAdmin
}

pub fn is_club_manager(user_id: i64, role: Role, club: &Club) -> bool {
    role == Role::ClubManager && club.manager_id == Some(user_id)
}

pub fn is_self(actor_id: i64, target_id: i64) -> bool {
    actor_id == target_id
}

/// True when the actor may administer the club: delete it, manage its events,
/// view its member/attendee data and stats.
pub fn can_manage_club(user_id: i64, role: Role, club: &Club) -> bool {
    is_admin(role) || is_club_manager(user_id, role, club)
}

// --- Event visibility ---

/// Statuses every authenticated user may see.
pub const STUDENT_VISIBLE: &[EventStatus] =
    &[EventStatus::Posted, EventStatus::Current, EventStatus::Past];

/// Statuses an SAO_ADMIN may see: everything in review or later. IDEATION
/// drafts stay private to the owning manager.
pub const ADMIN_VISIBLE: &[EventStatus] = &[
    EventStatus::Planning,
    EventStatus::Pending,
    EventStatus::Posted,
    EventStatus::Current,
    EventStatus::Past,
];

/// Statuses the owning CLUB_MANAGER may see for their own club's events:
/// the full lifecycle, IDEATION included.
pub const MANAGED_VISIBLE: &[EventStatus] = &[
    EventStatus::Ideation,
    EventStatus::Planning,
    EventStatus::Pending,
    EventStatus::Posted,
    EventStatus::Current,
    EventStatus::Past,
];

/// The caller's role-wide allowed set, independent of club ownership.
/// A CLUB_MANAGER's extra visibility only applies to clubs they manage and is
/// handled separately (see `MANAGED_VISIBLE`).
pub fn visible_statuses(role: Role) -> &'static [EventStatus] {
    match role {
        Role::SaoAdmin => ADMIN_VISIBLE,
        Role::ClubManager | Role::Student => STUDENT_VISIBLE,
    }
}

/// Intersects an optional status filter with an allowed set. A filter outside
/// the allowed set narrows to nothing: the caller gets an empty result, never
/// a Forbidden error, and never the hidden events.
pub fn narrow_statuses(
    allowed: &'static [EventStatus],
    filter: Option<EventStatus>,
) -> Vec<EventStatus> {
    match filter {
        Some(wanted) if allowed.contains(&wanted) => vec![wanted],
        Some(_) => vec![],
        None => allowed.to_vec(),
    }
}

/// True when the actor may see an event of this club at this status.
pub fn can_view_event(user_id: i64, role: Role, club: &Club, status: EventStatus) -> bool {
    if is_club_manager(user_id, role, club) {
        MANAGED_VISIBLE.contains(&status)
    } else {
        visible_statuses(role).contains(&status)
    }
}

// --- Club update capability sets ---

/// Enforces the per-role capability sets for club partial updates:
///
/// - admin: {name, is_active, manager_id}
/// - owning club manager: {description, color_code, image_url}
///
/// A supplied field outside the caller's set is rejected with a `Validation`
/// error instead of being silently dropped, so callers learn immediately that
/// the write would not have taken effect. Anyone else is refused outright.
pub fn check_club_update(
    user_id: i64,
    role: Role,
    club: &Club,
    req: &UpdateClubRequest,
) -> Result<(), ApiError> {
    let supplied = |name: &'static str, present: bool| {
        if present {
            Err(ApiError::Validation(format!(
                "field `{name}` is not permitted for your role"
            )))
        } else {
            Ok(())
        }
    };

    if is_admin(role) {
        supplied("description", req.description.is_some())?;
        supplied("color_code", req.color_code.is_some())?;
        supplied("image_url", req.image_url.is_some())?;
        Ok(())
    } else if is_club_manager(user_id, role, club) {
        supplied("name", req.name.is_some())?;
        supplied("is_active", req.is_active.is_some())?;
        supplied("manager_id", req.manager_id.is_some())?;
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}
