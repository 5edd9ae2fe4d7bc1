use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::error::ApiError;

// --- Enumerations (Mapped to Postgres enum types) ---

/// Role
///
/// The single RBAC field carried by every user. Exactly one role per user:
/// SAO_ADMIN has global authority, CLUB_MANAGER authority is scoped to clubs
/// whose `manager_id` points at the user, STUDENT is the base authenticated role.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, sqlx::Type, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum Role {
    SaoAdmin,
    ClubManager,
    #[default]
    Student,
}

/// EventStatus
///
/// The event lifecycle states, in fixed linear order. Transitions only ever
/// move one step forward along this order (see the `lifecycle` module); the
/// PENDING → POSTED/PLANNING fork is reserved for the admin review gate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, sqlx::Type, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "event_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum EventStatus {
    #[default]
    Ideation,
    Planning,
    Pending,
    Posted,
    Current,
    Past,
}

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// Canonical identity record from the `users` table, including the stored
/// Argon2id password hash. Never serialized directly to API responses; use
/// `UserProfile` for output.
#[derive(Debug, Clone, FromRow, Default)]
pub struct User {
    pub id: i64,
    // University-issued numeric identifier, unique across users.
    pub student_id: i64,
    pub name: String,
    pub email: String,
    // PHC-format Argon2id hash. Compared verbatim on login, no trimming.
    pub hashed_password: String,
    pub role: Role,
    pub wants_email_notif: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// UserProfile
///
/// Output schema for user data (GET /users/me, member listings, attendee
/// listings). Identical to `User` minus the credential hash.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserProfile {
    pub id: i64,
    pub student_id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub wants_email_notif: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        UserProfile {
            id: user.id,
            student_id: user.student_id,
            name: user.name,
            email: user.email,
            role: user.role,
            wants_email_notif: user.wants_email_notif,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Club
///
/// A club record from the `clubs` table. `manager_id` is the ownership pointer:
/// club-management authority derives from this field, not from membership rows.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Club {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    // Branding color, hex form (#rgb or #rrggbb).
    pub color_code: Option<String>,
    pub is_active: bool,
    // FK to users.id; exactly one manager per club (or none yet).
    pub manager_id: Option<i64>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Event
///
/// An event record from the `events` table. Belongs to exactly one club and
/// carries a lifecycle `status` that gates its visibility per role.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Event {
    pub id: i64,
    pub club_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub location: String,
    pub status: EventStatus,
    pub image_url: Option<String>,
    #[ts(type = "string | null")]
    pub start_time: Option<DateTime<Utc>>,
    #[ts(type = "string | null")]
    pub end_time: Option<DateTime<Utc>>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

// --- Request Payloads (Input Schemas) ---

/// RegisterUserRequest
///
/// Input payload for POST /auth/register. The password is hashed before it
/// ever reaches the repository; the plaintext is neither persisted nor logged.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RegisterUserRequest {
    pub student_id: i64,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub wants_email_notif: Option<bool>,
}

impl RegisterUserRequest {
    /// Schema-level constraints; violations surface as `Validation` errors.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.is_empty() || self.name.len() > 255 {
            return Err(ApiError::Validation(
                "name must be between 1 and 255 characters".into(),
            ));
        }
        if !self.email.contains('@') {
            return Err(ApiError::Validation("email is not valid".into()));
        }
        if self.password.len() < 8 {
            return Err(ApiError::Validation(
                "password must be at least 8 characters".into(),
            ));
        }
        Ok(())
    }
}

/// LoginRequest
///
/// Input payload for POST /auth/token. `identifier` is matched against the
/// email first, then parsed as a numeric student id.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
}

/// TokenResponse
///
/// Output schema for a successful login: a signed bearer token.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

/// UpdateUserRequest
///
/// Partial update payload for PUT /users/{id}. Only supplied fields change;
/// a supplied password is re-hashed before storage.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub wants_email_notif: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl UpdateUserRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(name) = &self.name {
            if name.is_empty() || name.len() > 255 {
                return Err(ApiError::Validation(
                    "name must be between 1 and 255 characters".into(),
                ));
            }
        }
        if let Some(email) = &self.email {
            if !email.contains('@') {
                return Err(ApiError::Validation("email is not valid".into()));
            }
        }
        if let Some(password) = &self.password {
            if password.len() < 8 {
                return Err(ApiError::Validation(
                    "password must be at least 8 characters".into(),
                ));
            }
        }
        Ok(())
    }
}

/// UserChanges
///
/// Repository-facing variant of `UpdateUserRequest` with the plaintext
/// password replaced by its hash. Built by the user-update handler.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub student_id: Option<i64>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub wants_email_notif: Option<bool>,
    pub hashed_password: Option<String>,
}

/// CreateClubRequest
///
/// Input payload for POST /admin/clubs. The manager assignment happens here
/// or later through the admin's partial update.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateClubRequest {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub color_code: Option<String>,
    pub is_active: Option<bool>,
    pub manager_id: Option<i64>,
}

impl CreateClubRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.is_empty() || self.name.len() > 255 {
            return Err(ApiError::Validation(
                "name must be between 1 and 255 characters".into(),
            ));
        }
        if let Some(color) = &self.color_code {
            if !is_valid_hex_color(color) {
                return Err(ApiError::Validation(
                    "color_code must be a hex color like #103105".into(),
                ));
            }
        }
        Ok(())
    }
}

/// UpdateClubRequest
///
/// Partial update payload for PUT /clubs/{id}. Which fields a caller may
/// supply depends on their role; the policy module enforces the capability
/// sets and rejects out-of-scope fields before the repository is touched.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateClubRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_id: Option<i64>,
}

impl UpdateClubRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(name) = &self.name {
            if name.is_empty() || name.len() > 255 {
                return Err(ApiError::Validation(
                    "name must be between 1 and 255 characters".into(),
                ));
            }
        }
        if let Some(color) = &self.color_code {
            if !is_valid_hex_color(color) {
                return Err(ApiError::Validation(
                    "color_code must be a hex color like #103105".into(),
                ));
            }
        }
        Ok(())
    }
}

/// CreateEventRequest
///
/// Input payload for POST /events. `status` is optional and defaults to
/// IDEATION; only IDEATION and PLANNING are accepted as initial states.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateEventRequest {
    pub club_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub location: String,
    pub status: Option<EventStatus>,
    pub image_url: Option<String>,
    #[ts(type = "string | null")]
    pub start_time: Option<DateTime<Utc>>,
    #[ts(type = "string | null")]
    pub end_time: Option<DateTime<Utc>>,
}

impl CreateEventRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.is_empty() || self.name.len() > 255 {
            return Err(ApiError::Validation(
                "name must be between 1 and 255 characters".into(),
            ));
        }
        if self.location.is_empty() {
            return Err(ApiError::Validation("location must not be empty".into()));
        }
        Ok(())
    }
}

/// UpdateEventRequest
///
/// Partial update payload for PUT /events/{id}. Status is deliberately absent:
/// lifecycle transitions only happen through the advance and review endpoints.
/// Events cannot be moved between clubs.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateEventRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub start_time: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub end_time: Option<DateTime<Utc>>,
}

impl UpdateEventRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(name) = &self.name {
            if name.is_empty() || name.len() > 255 {
                return Err(ApiError::Validation(
                    "name must be between 1 and 255 characters".into(),
                ));
            }
        }
        if let Some(location) = &self.location {
            if location.is_empty() {
                return Err(ApiError::Validation("location must not be empty".into()));
            }
        }
        Ok(())
    }
}

/// ReviewRequest
///
/// Input payload for the admin review gate: approve sends a PENDING event to
/// POSTED, reject sends it back to PLANNING for rework.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ReviewRequest {
    pub approve: bool,
}

// --- Statistics Schemas (Output) ---

/// ClubStats
///
/// Output schema for GET /clubs/{id}/stats.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct ClubStats {
    pub event_count: i64,
    pub member_count: i64,
    /// Sum of per-event attendee counts divided by event count; 0 for clubs
    /// with no events.
    pub avg_attendance: f64,
}

impl ClubStats {
    /// Builds the stats from raw counters, guarding the division by zero.
    pub fn from_counts(event_count: i64, member_count: i64, total_attendance: i64) -> Self {
        let avg_attendance = if event_count == 0 {
            0.0
        } else {
            total_attendance as f64 / event_count as f64
        };
        ClubStats {
            event_count,
            member_count,
            avg_attendance,
        }
    }
}

/// EventStats
///
/// Output schema for GET /events/{id}/stats. Every ratio guards its divisor:
/// an empty campus or an empty club yields 0, never an error.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct EventStats {
    pub total_attendance: i64,
    /// total_attendance / total registered users.
    pub attendance_rate: f64,
    /// Attendees who are members of the event's club / total club members.
    pub member_attendance_rate: f64,
    /// Attendees with no membership in the event's club.
    pub non_member_attendance: i64,
}

impl EventStats {
    pub fn from_counts(
        total_attendance: i64,
        total_users: i64,
        member_attendees: i64,
        total_club_members: i64,
    ) -> Self {
        let attendance_rate = if total_users == 0 {
            0.0
        } else {
            total_attendance as f64 / total_users as f64
        };
        let member_attendance_rate = if total_club_members == 0 {
            0.0
        } else {
            member_attendees as f64 / total_club_members as f64
        };
        EventStats {
            total_attendance,
            attendance_rate,
            member_attendance_rate,
            non_member_attendance: total_attendance - member_attendees,
        }
    }
}

/// is_valid_hex_color
///
/// Accepts #rgb and #rrggbb forms, matching the schema constraint on club
/// branding colors.
pub fn is_valid_hex_color(value: &str) -> bool {
    let Some(digits) = value.strip_prefix('#') else {
        return false;
    };
    (digits.len() == 3 || digits.len() == 6) && digits.chars().all(|c| c.is_ascii_hexdigit())
}
