use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use gradebook_auth::{Claims, verify_token};
use gradebook_core::{Actor, AppError, Capability, Role, StudentScope, authorize};
use gradebook_models::UserId;

use crate::state::AppState;

/// Extractor that validates the bearer token and provides its claims.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn user_id(&self) -> Result<UserId, AppError> {
        self.0.user_id().map(UserId::from)
    }

    pub fn role(&self) -> Role {
        self.0.role
    }

    pub fn actor(&self) -> Result<Actor, AppError> {
        self.0.actor()
    }

    /// Checks `capability`, against `scope` when it is a scoped one.
    pub fn authorize(
        &self,
        capability: Capability,
        scope: Option<&StudentScope>,
    ) -> Result<(), AppError> {
        authorize(&self.actor()?, capability, scope).into_result()
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::unauthorized("Invalid authorization header format"))?;

        let claims = verify_token(token, &state.jwt_config)?;

        Ok(AuthUser(claims))
    }
}

/// Declares an extractor that authenticates and then checks an unscoped
/// capability.
#[macro_export]
macro_rules! require_capability {
    ($name:ident, $capability:expr) => {
        #[derive(Debug, Clone)]
        pub struct $name(pub $crate::middleware::auth::AuthUser);

        impl axum::extract::FromRequestParts<$crate::state::AppState> for $name {
            type Rejection = gradebook_core::AppError;

            async fn from_request_parts(
                parts: &mut axum::http::request::Parts,
                state: &$crate::state::AppState,
            ) -> Result<Self, Self::Rejection> {
                let auth_user =
                    $crate::middleware::auth::AuthUser::from_request_parts(parts, state).await?;
                auth_user.authorize($capability, None)?;
                Ok($name(auth_user))
            }
        }
    };
}

require_capability!(RequireManageUsers, Capability::ManageUsers);
require_capability!(RequireManageClasses, Capability::ManageClasses);
require_capability!(RequireManageSubjects, Capability::ManageSubjects);
require_capability!(RequireManageBulletins, Capability::ManageBulletins);
require_capability!(RequireCreateAssignments, Capability::CreateAssignments);
require_capability!(RequireRecordGrades, Capability::RecordGrades);
require_capability!(RequireViewGradebook, Capability::ViewGradebook);
require_capability!(RequireDownloadClassBulletin, Capability::DownloadClassBulletin);
require_capability!(RequireViewTeachingLoad, Capability::ViewTeachingLoad);
require_capability!(RequireViewChildren, Capability::ViewChildren);
require_capability!(RequireMarkAttendance, Capability::MarkAttendance);
require_capability!(RequireViewOwnAttendance, Capability::ViewOwnAttendance);
require_capability!(RequireViewAttendanceStats, Capability::ViewAttendanceStats);
