use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use gradebook_core::{Actor, AppError, Role};

/// JWT claims for access tokens.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// User ID (subject claim)
    pub sub: String,
    pub username: String,
    pub role: Role,
    /// Expiration (Unix timestamp)
    pub exp: usize,
    /// Issued-at (Unix timestamp)
    pub iat: usize,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::unauthorized("Invalid user ID in token"))
    }

    pub fn actor(&self) -> Result<Actor, AppError> {
        Ok(Actor {
            user_id: self.user_id()?,
            role: self.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(sub: String, role: Role) -> Claims {
        Claims {
            sub,
            username: "mdiallo".to_string(),
            role,
            exp: 9999999999,
            iat: 1234567890,
        }
    }

    #[test]
    fn test_claims_serialize_role_lowercase() {
        let serialized =
            serde_json::to_string(&claims("user-id-123".to_string(), Role::Parent)).unwrap();
        assert!(serialized.contains(r#""sub":"user-id-123""#));
        assert!(serialized.contains(r#""role":"parent""#));
    }

    #[test]
    fn test_claims_deserialize() {
        let json = r#"{"sub":"abc","username":"prof1","role":"professor","exp":9999999999,"iat":9999999900}"#;
        let claims: Claims = serde_json::from_str(json).unwrap();
        assert_eq!(claims.username, "prof1");
        assert_eq!(claims.role, Role::Professor);
    }

    #[test]
    fn test_actor_from_claims() {
        let id = Uuid::new_v4();
        let actor = claims(id.to_string(), Role::Student).actor().unwrap();
        assert_eq!(actor.user_id, id);
        assert_eq!(actor.role, Role::Student);
    }

    #[test]
    fn test_invalid_subject_is_unauthorized() {
        let err = claims("not-a-uuid".to_string(), Role::Admin)
            .user_id()
            .unwrap_err();
        assert_eq!(err.status.as_u16(), 401);
    }
}
