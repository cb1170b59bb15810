//! # Gradebook API
//!
//! A REST API built with Rust, Axum and PostgreSQL for running a school
//! gradebook: classes, subjects weighted by a coefficient, assignments,
//! grades on a 0 to 20 scale, and the term bulletins built from them.
//!
//! ## Architecture
//!
//! ```text
//! src/
//! ├── middleware/      # Bearer-token and capability extractors
//! ├── modules/         # Feature modules
//! │   ├── auth/        # Login
//! │   ├── users/       # Accounts of every role
//! │   ├── classes/     # Classes and rosters
//! │   ├── subjects/    # Subjects and coefficients
//! │   ├── assignments/ # Graded work
//! │   ├── grades/      # Grades, averages, rankings
//! │   └── bulletins/   # Term bulletins
//! ├── reports/         # Printable HTML rendering
//! └── grading.rs       # Engine errors to HTTP responses
//! ```
//!
//! Each feature module has the same layout:
//!
//! - `controller.rs`: HTTP handlers
//! - `service.rs`: Database access
//! - `model.rs`: Re-exports from `gradebook-models`
//! - `router.rs`: Axum router
//!
//! Averages, rankings and bulletins are computed by the
//! [`gradebook_grading::GradingEngine`], which reads through
//! [`gradebook_db::PgGradebookStore`]. Nothing derived is stored.
//!
//! ## Roles
//!
//! | Role | Can |
//! |------|-----|
//! | Admin | Manage accounts, classes, subjects and bulletins; download any bulletin |
//! | Professor | Create assignments and record grades for their subjects |
//! | Student | View their own record and bulletin |
//! | Parent | View their children's records and bulletins |
//!
//! Admin accounts are created with `gradebook-cli create-admin`.
//!
//! ## API Documentation
//!
//! - Swagger UI: `http://localhost:3000/swagger-ui`
//! - Scalar: `http://localhost:3000/scalar`

pub mod docs;
pub mod grading;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod modules;
pub mod reports;
pub mod router;
pub mod state;
pub mod validator;

// Re-export workspace crates for convenience
pub use gradebook_auth;
pub use gradebook_config;
pub use gradebook_core;
pub use gradebook_db;
pub use gradebook_grading;
pub use gradebook_models;
