use crate::{
    error::ApiError,
    models::{Club, EventStatus, Role},
    policy,
};

/// Event Lifecycle State Machine
///
/// Events progress along a fixed linear order with a single review gate:
///
/// ```text
/// IDEATION → PLANNING → PENDING → POSTED → CURRENT → PAST
///                          │
///                          └─ admin review: approve → POSTED, reject → PLANNING
/// ```
///
/// The owning club manager drives the flow with `advance`; the PENDING stop is
/// exclusively resolved by an SAO_ADMIN through `review`. PAST is terminal:
/// advancing a PAST event is an `InvalidState` error, never a wrap or regress.
pub const STATUS_FLOW: [EventStatus; 6] = [
    EventStatus::Ideation,
    EventStatus::Planning,
    EventStatus::Pending,
    EventStatus::Posted,
    EventStatus::Current,
    EventStatus::Past,
];

/// The next status in the flow, or `None` at the terminal state.
pub fn next_status(current: EventStatus) -> Option<EventStatus> {
    let index = STATUS_FLOW.iter().position(|s| *s == current)?;
    STATUS_FLOW.get(index + 1).copied()
}

/// advance
///
/// Computes the status an event moves to when its owning club manager pushes
/// it forward. Gating:
/// - only the owning club manager may advance; SAO_ADMIN is refused for every
///   status (the admin's lever is `review`, not `advance`),
/// - at PENDING even the manager is refused and must wait for review,
/// - at PAST the transition itself is illegal.
pub fn advance(
    user_id: i64,
    role: Role,
    club: &Club,
    current: EventStatus,
) -> Result<EventStatus, ApiError> {
    if !policy::is_club_manager(user_id, role, club) {
        return Err(ApiError::Forbidden);
    }
    if current == EventStatus::Pending {
        // Awaiting admin review; the manager cannot push past the gate.
        return Err(ApiError::Forbidden);
    }
    next_status(current).ok_or_else(|| {
        ApiError::InvalidState("event is already at its terminal status PAST".into())
    })
}

/// review
///
/// The SAO_ADMIN review gate. Only meaningful at PENDING: approval publishes
/// the event (POSTED), rejection sends it back to PLANNING for rework.
pub fn review(role: Role, current: EventStatus, approve: bool) -> Result<EventStatus, ApiError> {
    if !policy::is_admin(role) {
        return Err(ApiError::Forbidden);
    }
    if current != EventStatus::Pending {
        return Err(ApiError::InvalidState(
            "only events in PENDING status can be reviewed".into(),
        ));
    }
    Ok(if approve {
        EventStatus::Posted
    } else {
        EventStatus::Planning
    })
}

/// initial_status
///
/// Resolves the status a newly created event starts at. Omitted → IDEATION.
/// Supplied → only the pre-review drafting states are accepted; an event can
/// never be born past the review gate.
pub fn initial_status(requested: Option<EventStatus>) -> Result<EventStatus, ApiError> {
    match requested {
        None => Ok(EventStatus::Ideation),
        Some(status @ (EventStatus::Ideation | EventStatus::Planning)) => Ok(status),
        Some(other) => Err(ApiError::Validation(format!(
            "events cannot be created at status {other:?}; start at IDEATION or PLANNING"
        ))),
    }
}
