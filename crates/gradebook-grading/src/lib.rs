//! # Gradebook Grading
//!
//! The weighted-average ("moyenne générale") engine: per-student averages,
//! class rankings, student reports and bulletin assembly.
//!
//! The engine is storage-agnostic. It reads through the traits in [`store`],
//! implemented for Postgres by `gradebook-db`.
//!
//! ```ignore
//! let engine = GradingEngine::new(Arc::new(store));
//! let ranking = engine.class_ranking(class_id).await?;
//! ```

pub mod average;
pub mod engine;
pub mod error;
pub mod model;
pub mod ranking;
pub mod report;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use average::{Aggregate, AverageResult, MalformedAggregate, weighted_average};
pub use engine::{GradingEngine, StudentBulletinTarget};
pub use error::GradingError;
pub use model::{BulletinRecord, BulletinState, ClassInfo, GradeEntry, Student, weight_from_coefficient};
pub use ranking::{ClassRanking, RankedStudent};
pub use report::{
    BulletinLine, BulletinReport, Document, JsonRenderer, ReportData, ReportRenderer,
    StudentReport, SubjectLine, bulletin_file_name,
};
pub use store::{BulletinStore, GradeStore, GradebookStore, RosterStore};
