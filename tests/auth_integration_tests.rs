use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::Request};
use club_portal::{
    AppState,
    auth::{self, AuthUser},
    config::{AppConfig, Env},
    error::ApiError,
    models::{
        Club, ClubStats, CreateClubRequest, CreateEventRequest, Event, EventStats, EventStatus,
        Role, UpdateClubRequest, UpdateEventRequest, User, UserChanges,
    },
    repository::{EventQuery, NewUser, Repository, RepositoryState},
};
use std::sync::Arc;
use tokio::test;

// --- Minimal Mock Repository ---

// The extractor only resolves users; every other method is an inert stub.
struct MockAuthRepo {
    user: User,
}

fn known_user() -> User {
    User {
        id: 7,
        student_id: 24001007,
        name: "Alex Doe".to_string(),
        email: "alex@campus.edu".to_string(),
        role: Role::ClubManager,
        ..User::default()
    }
}

#[async_trait]
impl Repository for MockAuthRepo {
    async fn create_user(&self, _user: NewUser) -> Option<User> {
        None
    }
    async fn get_user(&self, id: i64) -> Option<User> {
        (self.user.id == id).then(|| self.user.clone())
    }
    async fn get_user_by_email(&self, email: &str) -> Option<User> {
        (self.user.email == email).then(|| self.user.clone())
    }
    async fn get_user_by_student_id(&self, student_id: i64) -> Option<User> {
        (self.user.student_id == student_id).then(|| self.user.clone())
    }
    async fn list_users(&self) -> Vec<User> {
        vec![]
    }
    async fn update_user(&self, _id: i64, _changes: UserChanges) -> Option<User> {
        None
    }
    async fn delete_user(&self, _id: i64) -> bool {
        false
    }
    async fn count_users(&self) -> i64 {
        0
    }
    async fn create_club(&self, _req: CreateClubRequest) -> Option<Club> {
        None
    }
    async fn list_clubs(&self, _active_only: bool, _skip: i64, _limit: i64) -> Vec<Club> {
        vec![]
    }
    async fn get_club(&self, _id: i64) -> Option<Club> {
        None
    }
    async fn update_club(&self, _id: i64, _req: UpdateClubRequest) -> Option<Club> {
        None
    }
    async fn delete_club(&self, _id: i64) -> bool {
        false
    }
    async fn club_members(&self, _club_id: i64) -> Vec<User> {
        vec![]
    }
    async fn club_stats(&self, _club_id: i64) -> ClubStats {
        ClubStats::default()
    }
    async fn add_membership(&self, _club_id: i64, _user_id: i64) -> bool {
        false
    }
    async fn remove_membership(&self, _club_id: i64, _user_id: i64) -> bool {
        false
    }
    async fn is_member(&self, _club_id: i64, _user_id: i64) -> bool {
        false
    }
    async fn create_event(&self, _req: CreateEventRequest, _status: EventStatus) -> Option<Event> {
        None
    }
    async fn list_events(&self, _query: EventQuery) -> Vec<Event> {
        vec![]
    }
    async fn get_event(&self, _id: i64) -> Option<Event> {
        None
    }
    async fn update_event(&self, _id: i64, _req: UpdateEventRequest) -> Option<Event> {
        None
    }
    async fn delete_event(&self, _id: i64) -> bool {
        false
    }
    async fn set_event_status(&self, _id: i64, _status: EventStatus) -> Option<Event> {
        None
    }
    async fn event_stats(&self, _event_id: i64) -> EventStats {
        EventStats::default()
    }
    async fn add_attendance(&self, _event_id: i64, _user_id: i64) -> bool {
        false
    }
    async fn remove_attendance(&self, _event_id: i64, _user_id: i64) -> bool {
        false
    }
    async fn event_attendees(&self, _event_id: i64) -> Vec<User> {
        vec![]
    }
}

// --- Fixtures ---

fn test_state(env: Env) -> AppState {
    let repo = Arc::new(MockAuthRepo { user: known_user() }) as RepositoryState;
    AppState {
        repo,
        config: AppConfig {
            env,
            ..AppConfig::default()
        },
    }
}

async fn extract(state: &AppState, request: Request<()>) -> Result<AuthUser, ApiError> {
    let (mut parts, _) = request.into_parts();
    AuthUser::from_request_parts(&mut parts, state).await
}

// --- Password Hashing Tests ---

#[test]
async fn hash_then_verify_roundtrip() {
    let hash = auth::hash_password("correct horse battery staple").unwrap();
    assert!(hash.starts_with("$argon2"));
    assert!(auth::verify_password("correct horse battery staple", &hash));
    assert!(!auth::verify_password("wrong password", &hash));
}

#[test]
async fn salts_are_unique_per_hash() {
    let first = auth::hash_password("same input").unwrap();
    let second = auth::hash_password("same input").unwrap();
    assert_ne!(first, second);
}

#[test]
async fn corrupted_stored_hash_fails_closed() {
    assert!(!auth::verify_password("anything", "not-a-phc-string"));
    // A hash damaged by stray whitespace must fail verbatim, not be repaired.
    let hash = auth::hash_password("some password").unwrap();
    let padded = format!("{hash}   ");
    assert!(!auth::verify_password("some password", &padded));
}

// --- Token Issue / Extract Tests ---

#[test]
async fn issued_token_authenticates_a_request() {
    let state = test_state(Env::Production);
    let token = auth::issue_token(&known_user(), &state.config).unwrap();

    let request = Request::builder()
        .uri("/users/me")
        .header("authorization", format!("Bearer {token}"))
        .body(())
        .unwrap();

    let auth_user = extract(&state, request).await.unwrap();
    assert_eq!(auth_user.id, 7);
    assert_eq!(auth_user.role, Role::ClubManager);
}

#[test]
async fn missing_header_is_rejected() {
    let state = test_state(Env::Production);
    let request = Request::builder().uri("/users/me").body(()).unwrap();

    let result = extract(&state, request).await;
    assert!(matches!(result, Err(ApiError::InvalidToken)));
}

#[test]
async fn non_bearer_scheme_is_rejected() {
    let state = test_state(Env::Production);
    let request = Request::builder()
        .uri("/users/me")
        .header("authorization", "Basic YWxleDpwdw==")
        .body(())
        .unwrap();

    let result = extract(&state, request).await;
    assert!(matches!(result, Err(ApiError::InvalidToken)));
}

#[test]
async fn token_signed_with_wrong_secret_is_rejected() {
    let state = test_state(Env::Production);
    let foreign_config = AppConfig {
        jwt_secret: "a-completely-different-secret".to_string(),
        ..AppConfig::default()
    };
    let token = auth::issue_token(&known_user(), &foreign_config).unwrap();

    let request = Request::builder()
        .uri("/users/me")
        .header("authorization", format!("Bearer {token}"))
        .body(())
        .unwrap();

    let result = extract(&state, request).await;
    assert!(matches!(result, Err(ApiError::InvalidToken)));
}

#[test]
async fn expired_token_is_rejected() {
    let state = test_state(Env::Production);
    // Negative lifetime puts exp well past the validation leeway.
    let stale_config = AppConfig {
        token_expire_minutes: -10,
        ..AppConfig::default()
    };
    let token = auth::issue_token(&known_user(), &stale_config).unwrap();

    let request = Request::builder()
        .uri("/users/me")
        .header("authorization", format!("Bearer {token}"))
        .body(())
        .unwrap();

    let result = extract(&state, request).await;
    assert!(matches!(result, Err(ApiError::InvalidToken)));
}

#[test]
async fn deleted_subject_is_rejected() {
    let state = test_state(Env::Production);
    let ghost = User {
        email: "ghost@campus.edu".to_string(),
        student_id: 0,
        ..known_user()
    };
    let token = auth::issue_token(&ghost, &state.config).unwrap();

    let request = Request::builder()
        .uri("/users/me")
        .header("authorization", format!("Bearer {token}"))
        .body(())
        .unwrap();

    let result = extract(&state, request).await;
    assert!(matches!(result, Err(ApiError::UserNotFound)));
}

// --- Subject Resolution Tests ---

#[test]
async fn subject_resolves_by_email_then_student_id() {
    let state = test_state(Env::Local);

    let by_email = auth::resolve_subject(&state.repo, "alex@campus.edu").await;
    assert_eq!(by_email.unwrap().id, 7);

    let by_student_id = auth::resolve_subject(&state.repo, "24001007").await;
    assert_eq!(by_student_id.unwrap().id, 7);

    assert!(auth::resolve_subject(&state.repo, "nobody@campus.edu").await.is_none());
}

// --- Dev Bypass Tests ---

#[test]
async fn local_bypass_header_resolves_a_known_user() {
    let state = test_state(Env::Local);
    let request = Request::builder()
        .uri("/users/me")
        .header("x-user-id", "7")
        .body(())
        .unwrap();

    let auth_user = extract(&state, request).await.unwrap();
    assert_eq!(auth_user.id, 7);
}

#[test]
async fn bypass_header_is_inert_in_production() {
    let state = test_state(Env::Production);
    let request = Request::builder()
        .uri("/users/me")
        .header("x-user-id", "7")
        .body(())
        .unwrap();

    // Without a valid bearer token the request must still fail.
    let result = extract(&state, request).await;
    assert!(matches!(result, Err(ApiError::InvalidToken)));
}

#[test]
async fn bypass_with_unknown_id_falls_through_to_token_auth() {
    let state = test_state(Env::Local);
    let token = auth::issue_token(&known_user(), &state.config).unwrap();

    let request = Request::builder()
        .uri("/users/me")
        .header("x-user-id", "9999")
        .header("authorization", format!("Bearer {token}"))
        .body(())
        .unwrap();

    let auth_user = extract(&state, request).await.unwrap();
    assert_eq!(auth_user.id, 7);
}
