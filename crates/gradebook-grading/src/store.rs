//! Collaborator traits the engine reads through.
//!
//! The Postgres adapter lives in `gradebook-db`; tests use an in-memory store.

use async_trait::async_trait;

use gradebook_models::{BulletinId, ClassId, UserId};

use crate::model::{BulletinRecord, ClassInfo, GradeEntry, Student};

#[async_trait]
pub trait GradeStore: Send + Sync {
    /// Every recorded grade of the student, with its subject's weight.
    async fn grade_entries(&self, student_id: UserId) -> anyhow::Result<Vec<GradeEntry>>;
}

#[async_trait]
pub trait RosterStore: Send + Sync {
    /// Resolves only student-role accounts.
    async fn student(&self, student_id: UserId) -> anyhow::Result<Option<Student>>;

    /// Students of the class in listing order. Ranking ties keep this order.
    async fn enrolled_students(&self, class_id: ClassId) -> anyhow::Result<Vec<Student>>;

    async fn class(&self, class_id: ClassId) -> anyhow::Result<Option<ClassInfo>>;
}

#[async_trait]
pub trait BulletinStore: Send + Sync {
    async fn bulletin(&self, bulletin_id: BulletinId) -> anyhow::Result<Option<BulletinRecord>>;
}

/// Everything the engine needs, as one object-safe bound.
pub trait GradebookStore: GradeStore + RosterStore + BulletinStore {}

impl<T> GradebookStore for T where T: GradeStore + RosterStore + BulletinStore {}
