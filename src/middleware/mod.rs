//! Request extractors for authentication and capability checks.
//!
//! 1. Client sends `Authorization: Bearer <token>`
//! 2. [`AuthUser`](auth::AuthUser) verifies the JWT and exposes its claims
//! 3. `Require*` extractors check an unscoped capability for the token's role
//! 4. Handlers check scoped capabilities once the target student is known
//!
//! ```ignore
//! async fn create_class(
//!     RequireManageClasses(auth_user): RequireManageClasses,
//! ) -> impl IntoResponse {
//!     // Only admins get here
//! }
//! ```

pub mod auth;
