use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use gradebook_grading::{
    BulletinRecord, BulletinState, BulletinStore, ClassInfo, GradeEntry, GradeStore, RosterStore,
    Student, weight_from_coefficient,
};
use gradebook_models::{AssignmentId, BulletinId, ClassId, GradeId, SubjectId, UserId};

/// Reads the gradebook tables on behalf of the grading engine.
#[derive(Clone, Debug)]
pub struct PgGradebookStore {
    pool: PgPool,
}

impl PgGradebookStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct GradeEntryRow {
    id: GradeId,
    student_id: UserId,
    assignment_id: AssignmentId,
    assignment_title: String,
    subject_id: SubjectId,
    subject_name: String,
    professor_id: UserId,
    value: f64,
    coefficient: i32,
    recorded_at: DateTime<Utc>,
}

impl From<GradeEntryRow> for GradeEntry {
    fn from(row: GradeEntryRow) -> Self {
        GradeEntry {
            id: row.id,
            student_id: row.student_id,
            assignment_id: row.assignment_id,
            assignment_title: row.assignment_title,
            subject_id: row.subject_id,
            subject_name: row.subject_name,
            professor_id: row.professor_id,
            value: row.value,
            subject_weight: weight_from_coefficient(row.coefficient),
            recorded_at: row.recorded_at,
        }
    }
}

#[derive(FromRow)]
struct StudentRow {
    id: UserId,
    username: String,
    first_name: String,
    last_name: String,
    class_id: Option<ClassId>,
    parent_id: Option<UserId>,
}

impl From<StudentRow> for Student {
    fn from(row: StudentRow) -> Self {
        Student {
            id: row.id,
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            class_id: row.class_id,
            parent_id: row.parent_id,
        }
    }
}

#[derive(FromRow)]
struct BulletinRow {
    id: BulletinId,
    class_id: ClassId,
    term_name: String,
    is_confirmed: bool,
    created_at: DateTime<Utc>,
}

#[async_trait]
impl GradeStore for PgGradebookStore {
    async fn grade_entries(&self, student_id: UserId) -> anyhow::Result<Vec<GradeEntry>> {
        let rows = sqlx::query_as::<_, GradeEntryRow>(
            r#"
            SELECT g.id, g.student_id, g.assignment_id, a.title AS assignment_title,
                   s.id AS subject_id, s.name AS subject_name, g.professor_id, g.value,
                   s.coefficient, g.recorded_at
            FROM grades g
            JOIN assignments a ON a.id = g.assignment_id
            JOIN subjects s ON s.id = a.subject_id
            WHERE g.student_id = $1
            ORDER BY s.name, g.recorded_at, g.id
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch grade entries")?;

        Ok(rows.into_iter().map(GradeEntry::from).collect())
    }
}

#[async_trait]
impl RosterStore for PgGradebookStore {
    async fn student(&self, student_id: UserId) -> anyhow::Result<Option<Student>> {
        let row = sqlx::query_as::<_, StudentRow>(
            r#"
            SELECT id, username, first_name, last_name, class_id, parent_id
            FROM users
            WHERE id = $1 AND role = 'student'
            "#,
        )
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch student")?;

        Ok(row.map(Student::from))
    }

    async fn enrolled_students(&self, class_id: ClassId) -> anyhow::Result<Vec<Student>> {
        let rows = sqlx::query_as::<_, StudentRow>(
            r#"
            SELECT id, username, first_name, last_name, class_id, parent_id
            FROM users
            WHERE class_id = $1 AND role = 'student'
            ORDER BY last_name, first_name, id
            "#,
        )
        .bind(class_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch enrolled students")?;

        Ok(rows.into_iter().map(Student::from).collect())
    }

    async fn class(&self, class_id: ClassId) -> anyhow::Result<Option<ClassInfo>> {
        let row = sqlx::query_as::<_, (ClassId, String)>("SELECT id, name FROM classes WHERE id = $1")
            .bind(class_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch class")?;

        Ok(row.map(|(id, name)| ClassInfo { id, name }))
    }
}

#[async_trait]
impl BulletinStore for PgGradebookStore {
    async fn bulletin(&self, bulletin_id: BulletinId) -> anyhow::Result<Option<BulletinRecord>> {
        let row = sqlx::query_as::<_, BulletinRow>(
            r#"
            SELECT id, class_id, term_name, is_confirmed, created_at
            FROM bulletins
            WHERE id = $1
            "#,
        )
        .bind(bulletin_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch bulletin")?;

        Ok(row.map(|row| BulletinRecord {
            id: row.id,
            class_id: row.class_id,
            term_name: row.term_name,
            state: BulletinState::from_confirmed(row.is_confirmed),
            created_at: row.created_at,
        }))
    }
}
