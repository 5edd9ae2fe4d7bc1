use async_trait::async_trait;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use club_portal::{
    auth::AuthUser,
    error::ApiError,
    handlers::{self, ClubFilter, EventFilter},
    models::{
        Club, ClubStats, CreateClubRequest, CreateEventRequest, Event, EventStats, EventStatus,
        RegisterUserRequest, ReviewRequest, Role, UpdateClubRequest, UpdateEventRequest,
        UpdateUserRequest, User, UserChanges,
    },
    repository::{EventQuery, NewUser, Repository, RepositoryState},
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::test;

// --- MOCK REPOSITORY IMPLEMENTATION ---

// A small in-memory fake driving the handlers. Read-mostly fixtures (users,
// clubs) are plain vectors; the relations the tests mutate (events,
// memberships, attendance) sit behind mutexes so the trait's &self methods
// can update them.
pub struct MockRepoControl {
    pub users: Vec<User>,
    pub clubs: Vec<Club>,
    pub events: Mutex<Vec<Event>>,
    pub memberships: Mutex<HashSet<(i64, i64)>>,
    pub attendance: Mutex<HashSet<(i64, i64)>>,
    // Knob: force create_user to report a unique-key conflict.
    pub create_user_conflict: bool,
}

impl Default for MockRepoControl {
    fn default() -> Self {
        MockRepoControl {
            users: vec![],
            clubs: vec![],
            events: Mutex::new(vec![]),
            memberships: Mutex::new(HashSet::new()),
            attendance: Mutex::new(HashSet::new()),
            create_user_conflict: false,
        }
    }
}

#[async_trait]
impl Repository for MockRepoControl {
    async fn create_user(&self, user: NewUser) -> Option<User> {
        if self.create_user_conflict {
            return None;
        }
        Some(User {
            id: 99,
            student_id: user.student_id,
            name: user.name,
            email: user.email,
            hashed_password: user.hashed_password,
            role: user.role,
            wants_email_notif: user.wants_email_notif,
            ..User::default()
        })
    }
    async fn get_user(&self, id: i64) -> Option<User> {
        self.users.iter().find(|u| u.id == id).cloned()
    }
    async fn get_user_by_email(&self, email: &str) -> Option<User> {
        self.users.iter().find(|u| u.email == email).cloned()
    }
    async fn get_user_by_student_id(&self, student_id: i64) -> Option<User> {
        self.users.iter().find(|u| u.student_id == student_id).cloned()
    }
    async fn list_users(&self) -> Vec<User> {
        self.users.clone()
    }
    async fn update_user(&self, id: i64, changes: UserChanges) -> Option<User> {
        let mut user = self.users.iter().find(|u| u.id == id).cloned()?;
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        Some(user)
    }
    async fn delete_user(&self, id: i64) -> bool {
        self.users.iter().any(|u| u.id == id)
    }
    async fn count_users(&self) -> i64 {
        self.users.len() as i64
    }

    async fn create_club(&self, req: CreateClubRequest) -> Option<Club> {
        Some(Club {
            id: 11,
            name: req.name,
            description: req.description,
            image_url: req.image_url,
            color_code: req.color_code,
            is_active: req.is_active.unwrap_or(true),
            manager_id: req.manager_id,
            ..Club::default()
        })
    }
    async fn list_clubs(&self, active_only: bool, _skip: i64, _limit: i64) -> Vec<Club> {
        self.clubs
            .iter()
            .filter(|c| !active_only || c.is_active)
            .cloned()
            .collect()
    }
    async fn get_club(&self, id: i64) -> Option<Club> {
        self.clubs.iter().find(|c| c.id == id).cloned()
    }
    async fn update_club(&self, id: i64, req: UpdateClubRequest) -> Option<Club> {
        let mut club = self.clubs.iter().find(|c| c.id == id).cloned()?;
        if let Some(name) = req.name {
            club.name = name;
        }
        if let Some(color) = req.color_code {
            club.color_code = Some(color);
        }
        if let Some(manager_id) = req.manager_id {
            club.manager_id = Some(manager_id);
        }
        Some(club)
    }
    async fn delete_club(&self, id: i64) -> bool {
        self.clubs.iter().any(|c| c.id == id)
    }
    async fn club_members(&self, club_id: i64) -> Vec<User> {
        let memberships = self.memberships.lock().unwrap();
        self.users
            .iter()
            .filter(|u| memberships.contains(&(club_id, u.id)))
            .cloned()
            .collect()
    }
    async fn club_stats(&self, club_id: i64) -> ClubStats {
        let events = self.events.lock().unwrap();
        let club_events: Vec<i64> = events
            .iter()
            .filter(|e| e.club_id == club_id)
            .map(|e| e.id)
            .collect();
        let member_count = self
            .memberships
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| *c == club_id)
            .count() as i64;
        let total_attendance = self
            .attendance
            .lock()
            .unwrap()
            .iter()
            .filter(|(e, _)| club_events.contains(e))
            .count() as i64;
        ClubStats::from_counts(club_events.len() as i64, member_count, total_attendance)
    }

    async fn add_membership(&self, club_id: i64, user_id: i64) -> bool {
        self.memberships.lock().unwrap().insert((club_id, user_id))
    }
    async fn remove_membership(&self, club_id: i64, user_id: i64) -> bool {
        self.memberships.lock().unwrap().remove(&(club_id, user_id))
    }
    async fn is_member(&self, club_id: i64, user_id: i64) -> bool {
        self.memberships.lock().unwrap().contains(&(club_id, user_id))
    }

    async fn create_event(&self, req: CreateEventRequest, status: EventStatus) -> Option<Event> {
        let mut events = self.events.lock().unwrap();
        let event = Event {
            id: 100 + events.len() as i64,
            club_id: req.club_id,
            name: req.name,
            description: req.description,
            location: req.location,
            status,
            ..Event::default()
        };
        events.push(event.clone());
        Some(event)
    }
    async fn list_events(&self, query: EventQuery) -> Vec<Event> {
        let events = self.events.lock().unwrap();
        events
            .iter()
            .filter(|e| {
                let managed = query.manager_id.is_some_and(|manager_id| {
                    self.clubs
                        .iter()
                        .any(|c| c.id == e.club_id && c.manager_id == Some(manager_id))
                        && query.managed_statuses.contains(&e.status)
                });
                query.statuses.contains(&e.status) || managed
            })
            .filter(|e| query.club_id.is_none_or(|club_id| e.club_id == club_id))
            .cloned()
            .collect()
    }
    async fn get_event(&self, id: i64) -> Option<Event> {
        self.events.lock().unwrap().iter().find(|e| e.id == id).cloned()
    }
    async fn update_event(&self, id: i64, req: UpdateEventRequest) -> Option<Event> {
        let mut events = self.events.lock().unwrap();
        let event = events.iter_mut().find(|e| e.id == id)?;
        if let Some(name) = req.name {
            event.name = name;
        }
        if let Some(location) = req.location {
            event.location = location;
        }
        Some(event.clone())
    }
    async fn delete_event(&self, id: i64) -> bool {
        let mut events = self.events.lock().unwrap();
        let before = events.len();
        events.retain(|e| e.id != id);
        events.len() < before
    }
    async fn set_event_status(&self, id: i64, status: EventStatus) -> Option<Event> {
        let mut events = self.events.lock().unwrap();
        let event = events.iter_mut().find(|e| e.id == id)?;
        event.status = status;
        Some(event.clone())
    }
    async fn event_stats(&self, event_id: i64) -> EventStats {
        let club_id = self
            .events
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.id == event_id)
            .map(|e| e.club_id)
            .unwrap_or(0);
        let attendance = self.attendance.lock().unwrap();
        let memberships = self.memberships.lock().unwrap();
        let attendees: Vec<i64> = attendance
            .iter()
            .filter(|(e, _)| *e == event_id)
            .map(|(_, u)| *u)
            .collect();
        let member_attendees = attendees
            .iter()
            .filter(|u| memberships.contains(&(club_id, **u)))
            .count() as i64;
        let total_club_members = memberships.iter().filter(|(c, _)| *c == club_id).count() as i64;
        EventStats::from_counts(
            attendees.len() as i64,
            self.users.len() as i64,
            member_attendees,
            total_club_members,
        )
    }

    async fn add_attendance(&self, event_id: i64, user_id: i64) -> bool {
        self.attendance.lock().unwrap().insert((event_id, user_id))
    }
    async fn remove_attendance(&self, event_id: i64, user_id: i64) -> bool {
        self.attendance.lock().unwrap().remove(&(event_id, user_id))
    }
    async fn event_attendees(&self, event_id: i64) -> Vec<User> {
        let attendance = self.attendance.lock().unwrap();
        self.users
            .iter()
            .filter(|u| attendance.contains(&(event_id, u.id)))
            .cloned()
            .collect()
    }
}

// --- Fixtures ---

// User 1: SAO admin. User 2: manager of club 10. User 3/5: students.
// User 4: a club manager who owns nothing.
fn seeded_repo() -> Arc<MockRepoControl> {
    let user = |id: i64, role: Role| User {
        id,
        student_id: 1000 + id,
        name: format!("user-{id}"),
        email: format!("user{id}@campus.edu"),
        role,
        ..User::default()
    };
    Arc::new(MockRepoControl {
        users: vec![
            user(1, Role::SaoAdmin),
            user(2, Role::ClubManager),
            user(3, Role::Student),
            user(4, Role::ClubManager),
            user(5, Role::Student),
        ],
        clubs: vec![Club {
            id: 10,
            name: "Chess Club".to_string(),
            is_active: true,
            manager_id: Some(2),
            ..Club::default()
        }],
        ..MockRepoControl::default()
    })
}

fn admin() -> AuthUser {
    AuthUser {
        id: 1,
        role: Role::SaoAdmin,
    }
}

fn owning_manager() -> AuthUser {
    AuthUser {
        id: 2,
        role: Role::ClubManager,
    }
}

fn student() -> AuthUser {
    AuthUser {
        id: 3,
        role: Role::Student,
    }
}

fn other_manager() -> AuthUser {
    AuthUser {
        id: 4,
        role: Role::ClubManager,
    }
}

fn repo_state(mock: &Arc<MockRepoControl>) -> State<RepositoryState> {
    State(mock.clone() as RepositoryState)
}

fn event_filter(status: Option<EventStatus>) -> Query<EventFilter> {
    Query(EventFilter {
        status,
        club_id: None,
        skip: None,
        limit: None,
    })
}

async fn seed_event(mock: &Arc<MockRepoControl>, status: EventStatus) -> i64 {
    let event = mock
        .create_event(
            CreateEventRequest {
                club_id: 10,
                name: "Blitz Night".to_string(),
                location: "Main Hall".to_string(),
                ..CreateEventRequest::default()
            },
            status,
        )
        .await
        .unwrap();
    event.id
}

// --- Membership Tests ---

#[test]
async fn second_join_on_same_pair_conflicts() {
    let mock = seeded_repo();

    let first = handlers::join_club(student(), repo_state(&mock), Path(10)).await;
    assert_eq!(first.unwrap(), StatusCode::CREATED);

    let second = handlers::join_club(student(), repo_state(&mock), Path(10)).await;
    assert!(matches!(second, Err(ApiError::AlreadyExists(_))));
}

#[test]
async fn join_is_student_only() {
    let mock = seeded_repo();
    let result = handlers::join_club(owning_manager(), repo_state(&mock), Path(10)).await;
    assert!(matches!(result, Err(ApiError::Forbidden)));
}

#[test]
async fn join_unknown_club_is_not_found() {
    let mock = seeded_repo();
    let result = handlers::join_club(student(), repo_state(&mock), Path(999)).await;
    assert!(matches!(result, Err(ApiError::NotFound(_))));
}

#[test]
async fn member_can_remove_themselves() {
    let mock = seeded_repo();
    mock.add_membership(10, 3).await;

    let result = handlers::remove_club_member(student(), repo_state(&mock), Path((10, 3))).await;
    assert_eq!(result.unwrap(), StatusCode::NO_CONTENT);
}

#[test]
async fn member_cannot_remove_someone_else() {
    let mock = seeded_repo();
    mock.add_membership(10, 5).await;

    let result = handlers::remove_club_member(student(), repo_state(&mock), Path((10, 5))).await;
    assert!(matches!(result, Err(ApiError::Forbidden)));
}

#[test]
async fn removing_missing_membership_is_not_found() {
    let mock = seeded_repo();
    let result = handlers::remove_club_member(admin(), repo_state(&mock), Path((10, 3))).await;
    assert!(matches!(result, Err(ApiError::NotFound(_))));
}

#[test]
async fn member_listing_requires_membership_or_management() {
    let mock = seeded_repo();
    mock.add_membership(10, 5).await;

    // User 3 is not a member: refused.
    let refused = handlers::list_club_members(student(), repo_state(&mock), Path(10)).await;
    assert!(matches!(refused, Err(ApiError::Forbidden)));

    // The owning manager sees the roster.
    let Json(members) = handlers::list_club_members(owning_manager(), repo_state(&mock), Path(10))
        .await
        .unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].id, 5);
}

// --- Event Visibility Tests ---

#[test]
async fn student_never_sees_ideation_events() {
    let mock = seeded_repo();
    seed_event(&mock, EventStatus::Ideation).await;
    seed_event(&mock, EventStatus::Posted).await;

    // Explicit IDEATION filter narrows to nothing rather than leaking drafts.
    let Json(filtered) = handlers::list_events(
        student(),
        repo_state(&mock),
        event_filter(Some(EventStatus::Ideation)),
    )
    .await
    .unwrap();
    assert!(filtered.is_empty());

    // No filter: only the published event comes back.
    let Json(all) = handlers::list_events(student(), repo_state(&mock), event_filter(None))
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].status, EventStatus::Posted);
}

#[test]
async fn owning_manager_sees_their_own_drafts() {
    let mock = seeded_repo();
    seed_event(&mock, EventStatus::Ideation).await;

    let Json(own) = handlers::list_events(owning_manager(), repo_state(&mock), event_filter(None))
        .await
        .unwrap();
    assert_eq!(own.len(), 1);

    // A manager with no claim on the club sees nothing.
    let Json(other) = handlers::list_events(other_manager(), repo_state(&mock), event_filter(None))
        .await
        .unwrap();
    assert!(other.is_empty());
}

#[test]
async fn admin_sees_pending_but_not_ideation() {
    let mock = seeded_repo();
    seed_event(&mock, EventStatus::Ideation).await;
    seed_event(&mock, EventStatus::Pending).await;

    let Json(visible) = handlers::list_events(admin(), repo_state(&mock), event_filter(None))
        .await
        .unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].status, EventStatus::Pending);
}

#[test]
async fn hidden_event_detail_reads_as_not_found() {
    let mock = seeded_repo();
    let id = seed_event(&mock, EventStatus::Ideation).await;

    let result = handlers::get_event(student(), repo_state(&mock), Path(id)).await;
    assert!(matches!(result, Err(ApiError::NotFound(_))));

    // The owner, however, can read the draft.
    let Json(event) = handlers::get_event(owning_manager(), repo_state(&mock), Path(id))
        .await
        .unwrap();
    assert_eq!(event.id, id);
}

// --- Event Management & Lifecycle Tests ---

#[test]
async fn non_owning_manager_cannot_touch_club_events() {
    let mock = seeded_repo();
    let id = seed_event(&mock, EventStatus::Ideation).await;

    let update = handlers::update_event(
        other_manager(),
        repo_state(&mock),
        Path(id),
        Json(UpdateEventRequest {
            name: Some("Hijacked".to_string()),
            ..UpdateEventRequest::default()
        }),
    )
    .await;
    assert!(matches!(update, Err(ApiError::Forbidden)));

    let delete = handlers::delete_event(other_manager(), repo_state(&mock), Path(id)).await;
    assert!(matches!(delete, Err(ApiError::Forbidden)));

    let advance = handlers::advance_event(other_manager(), repo_state(&mock), Path(id)).await;
    assert!(matches!(advance, Err(ApiError::Forbidden)));
}

#[test]
async fn admin_cannot_advance_only_review() {
    let mock = seeded_repo();
    let id = seed_event(&mock, EventStatus::Planning).await;

    let result = handlers::advance_event(admin(), repo_state(&mock), Path(id)).await;
    assert!(matches!(result, Err(ApiError::Forbidden)));
}

#[test]
async fn event_creation_rejects_post_review_statuses() {
    let mock = seeded_repo();
    let result = handlers::create_event(
        owning_manager(),
        repo_state(&mock),
        Json(CreateEventRequest {
            club_id: 10,
            name: "Blitz Night".to_string(),
            location: "Main Hall".to_string(),
            status: Some(EventStatus::Posted),
            ..CreateEventRequest::default()
        }),
    )
    .await;
    assert!(matches!(result, Err(ApiError::Validation(_))));
}

#[test]
async fn full_lifecycle_from_ideation_to_posted() {
    let mock = seeded_repo();

    // The owning manager drafts an event; it starts at IDEATION.
    let (code, Json(event)) = handlers::create_event(
        owning_manager(),
        repo_state(&mock),
        Json(CreateEventRequest {
            club_id: 10,
            name: "Spring Tournament".to_string(),
            location: "Main Hall".to_string(),
            ..CreateEventRequest::default()
        }),
    )
    .await
    .unwrap();
    assert_eq!(code, StatusCode::CREATED);
    assert_eq!(event.status, EventStatus::Ideation);

    // IDEATION -> PLANNING -> PENDING.
    let Json(event) = handlers::advance_event(owning_manager(), repo_state(&mock), Path(event.id))
        .await
        .unwrap();
    assert_eq!(event.status, EventStatus::Planning);
    let Json(event) = handlers::advance_event(owning_manager(), repo_state(&mock), Path(event.id))
        .await
        .unwrap();
    assert_eq!(event.status, EventStatus::Pending);

    // At the review gate the manager is stuck.
    let stuck = handlers::advance_event(owning_manager(), repo_state(&mock), Path(event.id)).await;
    assert!(matches!(stuck, Err(ApiError::Forbidden)));

    // Admin approval publishes.
    let Json(event) = handlers::review_event(
        admin(),
        repo_state(&mock),
        Path(event.id),
        Json(ReviewRequest { approve: true }),
    )
    .await
    .unwrap();
    assert_eq!(event.status, EventStatus::Posted);
}

#[test]
async fn rejection_returns_event_to_planning() {
    let mock = seeded_repo();
    let id = seed_event(&mock, EventStatus::Pending).await;

    let Json(event) = handlers::review_event(
        admin(),
        repo_state(&mock),
        Path(id),
        Json(ReviewRequest { approve: false }),
    )
    .await
    .unwrap();
    assert_eq!(event.status, EventStatus::Planning);
}

#[test]
async fn review_outside_pending_is_invalid_state() {
    let mock = seeded_repo();
    let id = seed_event(&mock, EventStatus::Ideation).await;

    let result = handlers::review_event(
        admin(),
        repo_state(&mock),
        Path(id),
        Json(ReviewRequest { approve: true }),
    )
    .await;
    assert!(matches!(result, Err(ApiError::InvalidState(_))));
}

#[test]
async fn advancing_past_event_is_invalid_state() {
    let mock = seeded_repo();
    let id = seed_event(&mock, EventStatus::Past).await;

    let result = handlers::advance_event(owning_manager(), repo_state(&mock), Path(id)).await;
    assert!(matches!(result, Err(ApiError::InvalidState(_))));
}

// --- Club Update Capability Tests ---

#[test]
async fn admin_cannot_touch_presentation_fields() {
    let mock = seeded_repo();
    let result = handlers::update_club(
        admin(),
        repo_state(&mock),
        Path(10),
        Json(UpdateClubRequest {
            description: Some("new blurb".to_string()),
            ..UpdateClubRequest::default()
        }),
    )
    .await;
    assert!(matches!(result, Err(ApiError::Validation(_))));
}

#[test]
async fn manager_cannot_rename_or_reassign_club() {
    let mock = seeded_repo();
    let result = handlers::update_club(
        owning_manager(),
        repo_state(&mock),
        Path(10),
        Json(UpdateClubRequest {
            manager_id: Some(4),
            ..UpdateClubRequest::default()
        }),
    )
    .await;
    assert!(matches!(result, Err(ApiError::Validation(_))));
}

#[test]
async fn manager_updates_branding_admin_updates_assignment() {
    let mock = seeded_repo();

    let Json(club) = handlers::update_club(
        owning_manager(),
        repo_state(&mock),
        Path(10),
        Json(UpdateClubRequest {
            color_code: Some("#a1b2c3".to_string()),
            ..UpdateClubRequest::default()
        }),
    )
    .await
    .unwrap();
    assert_eq!(club.color_code.as_deref(), Some("#a1b2c3"));

    let Json(club) = handlers::update_club(
        admin(),
        repo_state(&mock),
        Path(10),
        Json(UpdateClubRequest {
            manager_id: Some(4),
            ..UpdateClubRequest::default()
        }),
    )
    .await
    .unwrap();
    assert_eq!(club.manager_id, Some(4));
}

#[test]
async fn student_cannot_update_clubs_at_all() {
    let mock = seeded_repo();
    let result = handlers::update_club(
        student(),
        repo_state(&mock),
        Path(10),
        Json(UpdateClubRequest::default()),
    )
    .await;
    assert!(matches!(result, Err(ApiError::Forbidden)));
}

// --- Attendance Tests ---

#[test]
async fn self_registration_and_duplicate_conflict() {
    let mock = seeded_repo();
    let id = seed_event(&mock, EventStatus::Posted).await;

    let first = handlers::register_attendee(student(), repo_state(&mock), Path((id, 3))).await;
    assert_eq!(first.unwrap(), StatusCode::CREATED);

    let second = handlers::register_attendee(student(), repo_state(&mock), Path((id, 3))).await;
    assert!(matches!(second, Err(ApiError::AlreadyExists(_))));
}

#[test]
async fn student_cannot_register_someone_else() {
    let mock = seeded_repo();
    let id = seed_event(&mock, EventStatus::Posted).await;

    let result = handlers::register_attendee(student(), repo_state(&mock), Path((id, 5))).await;
    assert!(matches!(result, Err(ApiError::Forbidden)));
}

#[test]
async fn owning_manager_records_attendance_for_anyone() {
    let mock = seeded_repo();
    let id = seed_event(&mock, EventStatus::Current).await;

    let result =
        handlers::register_attendee(owning_manager(), repo_state(&mock), Path((id, 5))).await;
    assert_eq!(result.unwrap(), StatusCode::CREATED);

    let Json(attendees) = handlers::list_attendees(owning_manager(), repo_state(&mock), Path(id))
        .await
        .unwrap();
    assert_eq!(attendees.len(), 1);
    assert_eq!(attendees[0].id, 5);
}

#[test]
async fn attendee_listing_is_not_for_students() {
    let mock = seeded_repo();
    let id = seed_event(&mock, EventStatus::Posted).await;

    let result = handlers::list_attendees(student(), repo_state(&mock), Path(id)).await;
    assert!(matches!(result, Err(ApiError::Forbidden)));
}

// --- Stats Tests ---

#[test]
async fn club_stats_with_no_events_has_zero_average() {
    let mock = seeded_repo();
    mock.add_membership(10, 3).await;

    let Json(stats) = handlers::get_club_stats(admin(), repo_state(&mock), Path(10))
        .await
        .unwrap();
    assert_eq!(stats.event_count, 0);
    assert_eq!(stats.member_count, 1);
    assert_eq!(stats.avg_attendance, 0.0);
}

#[test]
async fn event_stats_distinguish_member_attendance() {
    let mock = seeded_repo();
    let id = seed_event(&mock, EventStatus::Current).await;
    mock.add_membership(10, 3).await;
    mock.add_attendance(id, 3).await;
    mock.add_attendance(id, 5).await;

    let Json(stats) = handlers::get_event_stats(owning_manager(), repo_state(&mock), Path(id))
        .await
        .unwrap();
    assert_eq!(stats.total_attendance, 2);
    assert_eq!(stats.non_member_attendance, 1);
    assert_eq!(stats.member_attendance_rate, 1.0);
}

// --- User & Admin Surface Tests ---

#[test]
async fn user_listing_is_admin_only() {
    let mock = seeded_repo();

    let refused = handlers::list_users(student(), repo_state(&mock)).await;
    assert!(matches!(refused, Err(ApiError::Forbidden)));

    let Json(users) = handlers::list_users(admin(), repo_state(&mock)).await.unwrap();
    assert_eq!(users.len(), 5);
}

#[test]
async fn club_creation_is_admin_only() {
    let mock = seeded_repo();
    let req = CreateClubRequest {
        name: "Debate Society".to_string(),
        manager_id: Some(2),
        ..CreateClubRequest::default()
    };

    let refused =
        handlers::create_club(owning_manager(), repo_state(&mock), Json(req.clone())).await;
    assert!(matches!(refused, Err(ApiError::Forbidden)));

    let (code, Json(club)) = handlers::create_club(admin(), repo_state(&mock), Json(req))
        .await
        .unwrap();
    assert_eq!(code, StatusCode::CREATED);
    assert_eq!(club.manager_id, Some(2));
}

#[test]
async fn club_creation_validates_manager_exists() {
    let mock = seeded_repo();
    let result = handlers::create_club(
        admin(),
        repo_state(&mock),
        Json(CreateClubRequest {
            name: "Ghost Club".to_string(),
            manager_id: Some(404),
            ..CreateClubRequest::default()
        }),
    )
    .await;
    assert!(matches!(result, Err(ApiError::NotFound(_))));
}

#[test]
async fn inactive_clubs_are_hidden_by_default() {
    let mut base = MockRepoControl::default();
    base.clubs = vec![
        Club {
            id: 10,
            name: "Active".to_string(),
            is_active: true,
            ..Club::default()
        },
        Club {
            id: 11,
            name: "Dormant".to_string(),
            is_active: false,
            ..Club::default()
        },
    ];
    let mock = Arc::new(base);

    let Json(clubs) = handlers::list_clubs(
        student(),
        repo_state(&mock),
        Query(ClubFilter {
            active_only: None,
            skip: None,
            limit: None,
        }),
    )
    .await
    .unwrap();
    assert_eq!(clubs.len(), 1);
    assert_eq!(clubs[0].name, "Active");
}

#[test]
async fn duplicate_registration_conflicts() {
    let mock = Arc::new(MockRepoControl {
        create_user_conflict: true,
        ..MockRepoControl::default()
    });

    let result = handlers::register_user(
        repo_state(&mock),
        Json(RegisterUserRequest {
            student_id: 12345,
            name: "Sam".to_string(),
            email: "sam@campus.edu".to_string(),
            password: "hunter2hunter2".to_string(),
            role: Role::Student,
            wants_email_notif: None,
        }),
    )
    .await;
    assert!(matches!(result, Err(ApiError::AlreadyExists(_))));
}

#[test]
async fn registration_validates_password_length() {
    let mock = seeded_repo();
    let result = handlers::register_user(
        repo_state(&mock),
        Json(RegisterUserRequest {
            student_id: 12345,
            name: "Sam".to_string(),
            email: "sam@campus.edu".to_string(),
            password: "short".to_string(),
            role: Role::Student,
            wants_email_notif: None,
        }),
    )
    .await;
    assert!(matches!(result, Err(ApiError::Validation(_))));
}

#[test]
async fn role_changes_are_admin_only() {
    let mock = seeded_repo();

    let refused = handlers::update_user(
        student(),
        repo_state(&mock),
        Path(3),
        Json(UpdateUserRequest {
            role: Some(Role::SaoAdmin),
            ..UpdateUserRequest::default()
        }),
    )
    .await;
    assert!(matches!(refused, Err(ApiError::Validation(_))));

    let Json(profile) = handlers::update_user(
        admin(),
        repo_state(&mock),
        Path(3),
        Json(UpdateUserRequest {
            role: Some(Role::ClubManager),
            ..UpdateUserRequest::default()
        }),
    )
    .await
    .unwrap();
    assert_eq!(profile.role, Role::ClubManager);
}

#[test]
async fn users_cannot_read_arbitrary_profiles() {
    let mock = seeded_repo();

    let refused = handlers::get_user(student(), repo_state(&mock), Path(5)).await;
    assert!(matches!(refused, Err(ApiError::Forbidden)));

    let Json(own) = handlers::get_user(student(), repo_state(&mock), Path(3))
        .await
        .unwrap();
    assert_eq!(own.id, 3);
}
