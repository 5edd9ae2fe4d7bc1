/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated modules,
/// enforcing a Defense-in-Depth strategy. This structure ensures that
/// access control is applied explicitly at the module level (via Axum layers),
/// preventing accidental exposure of protected endpoints.
///
/// The three modules map directly to the access tiers of the portal.

/// Routes accessible without a session: health, registration, login.
pub mod public;

/// Routes protected by the `AuthUser` extractor.
/// Requires a validated bearer token (or the local dev bypass header).
pub mod authenticated;

/// Routes restricted to users with the SAO_ADMIN role.
/// The role check itself lives in the handlers.
pub mod admin;
