//! # Gradebook Auth
//!
//! Access tokens are HS256 JWTs carrying the account id, username and
//! [`Role`](gradebook_core::Role). Handlers authorize from the claims alone,
//! without a database round trip.
//!
//! ```ignore
//! use gradebook_auth::{create_access_token, verify_token};
//!
//! let token = create_access_token(user_id, "jdupont", Role::Professor, &config)?;
//! let claims = verify_token(&token, &config)?;
//! ```

pub mod claims;
pub mod jwt;

pub use claims::Claims;
pub use jwt::{create_access_token, verify_token};
