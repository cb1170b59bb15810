//! # Gradebook Core
//!
//! Foundational types shared by every Gradebook crate:
//!
//! - [`errors`]: Application error type with HTTP response conversion
//! - [`pagination`]: Offset pagination for list endpoints
//! - [`password`]: bcrypt password hashing and verification
//! - [`permissions`]: The closed role set and capability checks
//!
//! # Example
//!
//! ```ignore
//! use gradebook_core::{Actor, Capability, Role, authorize};
//!
//! let actor = Actor { user_id, role: Role::Professor };
//! authorize(&actor, Capability::RecordGrades, None).into_result()?;
//! ```

pub mod errors;
pub mod pagination;
pub mod password;
pub mod permissions;

pub use errors::AppError;
pub use pagination::{Paginated, PaginationMeta, PaginationParams};
pub use password::{hash_password, verify_password};
pub use permissions::{Actor, Capability, Decision, Role, StudentScope, authorize};
