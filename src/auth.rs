use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{
    config::{AppConfig, Env},
    error::ApiError,
    models::{Role, User},
    repository::RepositoryState,
};

/// Claims
///
/// The payload structure carried inside every issued JSON Web Token. Signed
/// with the server's shared secret (HS256) and validated on every
/// authenticated request.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the user's email. On verify it is resolved back to a
    /// user record by email lookup first, then numeric student-id lookup.
    pub sub: String,
    /// The role claim, for quick client-side checks. The server re-reads the
    /// role from the database on every request, so a stale claim cannot
    /// elevate a demoted user.
    pub role: Role,
    /// Expiration Time (exp): timestamp after which the token must not be accepted.
    pub exp: usize,
    /// Issued At (iat): timestamp when the token was issued.
    pub iat: usize,
}

/// issue_token
///
/// Mints a signed bearer token for an authenticated user, expiring after the
/// configured number of minutes (default 30).
pub fn issue_token(user: &User, config: &AppConfig) -> Result<String, ApiError> {
    let now = Utc::now();
    let expires = now + Duration::minutes(config.token_expire_minutes);

    let claims = Claims {
        sub: user.email.clone(),
        role: user.role,
        exp: expires.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| {
        tracing::error!("token encoding failed: {:?}", e);
        ApiError::Internal
    })
}

/// hash_password
///
/// Hashes a plaintext password with Argon2id and a fresh random salt,
/// producing a PHC-format string for storage.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            tracing::error!("password hashing failed: {:?}", e);
            ApiError::Internal
        })
}

/// verify_password
///
/// Verifies a plaintext password against the stored PHC hash. The stored hash
/// is compared exactly as persisted: an unparsable or corrupted hash fails
/// verification rather than being trimmed or repaired first, so corruption
/// surfaces as a login failure instead of being masked.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let parsed = match PasswordHash::new(stored_hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!("stored password hash failed to parse: {:?}", e);
            return false;
        }
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// resolve_subject
///
/// Maps a token subject back to a user record: email lookup first, then, if
/// the subject parses as a number, student-id lookup.
pub async fn resolve_subject(repo: &RepositoryState, subject: &str) -> Option<User> {
    if let Some(user) = repo.get_user_by_email(subject).await {
        return Some(user);
    }
    if let Ok(student_id) = subject.parse::<i64>() {
        return repo.get_user_by_student_id(student_id).await;
    }
    None
}

/// AuthUser Extractor Result
///
/// The resolved identity of an authenticated request. Handlers take this as
/// an argument to obtain the caller's id and role for every policy check.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub role: Role,
}

/// AuthUser Extractor Implementation
///
/// Implements Axum's FromRequestParts trait, making AuthUser usable as a
/// function argument in any authenticated handler. This cleanly separates
/// authentication (extractor) from business logic (the handler).
///
/// The process:
/// 1. Dependency Resolution: Repository and AppConfig from the application state.
/// 2. Local Bypass: development-time access via the 'x-user-id' header.
/// 3. Token Validation: Bearer extraction and JWT decoding.
/// 4. DB Lookup: resolving the subject to a live user record.
///
/// Rejection: `InvalidToken` on any decode failure, `UserNotFound` when the
/// subject no longer resolves (both mapping to 401).
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // 1. Dependency Resolution
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        // 2. Local Development Bypass Check
        // In Env::Local only, a known user id in the 'x-user-id' header
        // authenticates the request. The id must still map to a real user so
        // roles are loaded correctly.
        if config.env == Env::Local {
            if let Some(user_id_header) = parts.headers.get("x-user-id") {
                if let Ok(id_str) = user_id_header.to_str() {
                    if let Ok(user_id) = id_str.parse::<i64>() {
                        if let Some(user) = repo.get_user(user_id).await {
                            return Ok(AuthUser {
                                id: user.id,
                                role: user.role,
                            });
                        }
                    }
                }
            }
        }
        // In Production, or when the bypass did not resolve, execution falls
        // through to the standard JWT validation flow.

        // 3. Token Extraction
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::InvalidToken)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::InvalidToken)?;

        // 4. JWT Decoding
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        let mut validation = Validation::default();
        validation.validate_exp = true;

        // Any decode failure (expired, malformed, bad signature) collapses to
        // the same InvalidToken rejection.
        let token_data = decode::<Claims>(token, &decoding_key, &validation)
            .map_err(|_| ApiError::InvalidToken)?;

        // 5. Subject Resolution (Final Verification)
        // Resolving against the database prevents access if the user was
        // deleted after the token was issued, and refreshes the role.
        let user = resolve_subject(&repo, &token_data.claims.sub)
            .await
            .ok_or(ApiError::UserNotFound)?;

        Ok(AuthUser {
            id: user.id,
            role: user.role,
        })
    }
}
