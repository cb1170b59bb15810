//! Builders and an in-memory store for engine tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use gradebook_models::{AssignmentId, BulletinId, ClassId, GradeId, SubjectId, UserId};

use crate::model::{BulletinRecord, BulletinState, ClassInfo, GradeEntry, Student};
use crate::store::{BulletinStore, GradeStore, RosterStore};

pub fn student(username: &str) -> Student {
    Student {
        id: UserId::new(),
        username: username.to_string(),
        first_name: username.to_string(),
        last_name: "Test".to_string(),
        class_id: None,
        parent_id: None,
    }
}

pub fn entry_in(subject_id: SubjectId, subject_name: &str, value: f64, weight: u32) -> GradeEntry {
    GradeEntry {
        id: GradeId::new(),
        student_id: UserId::new(),
        assignment_id: AssignmentId::new(),
        assignment_title: "Devoir".to_string(),
        subject_id,
        subject_name: subject_name.to_string(),
        professor_id: UserId::new(),
        value,
        subject_weight: weight,
        recorded_at: Utc::now(),
    }
}

pub fn entry(value: f64, weight: u32) -> GradeEntry {
    entry_in(SubjectId::new(), "Maths", value, weight)
}

#[derive(Default)]
pub struct InMemoryStore {
    pub classes: Vec<ClassInfo>,
    pub students: Vec<Student>,
    pub grades: Vec<GradeEntry>,
    pub bulletins: Mutex<Vec<BulletinRecord>>,
    pub fail: bool,
}

impl InMemoryStore {
    pub fn add_class(&mut self, name: &str) -> ClassId {
        let id = ClassId::new();
        self.classes.push(ClassInfo {
            id,
            name: name.to_string(),
        });
        id
    }

    pub fn add_student(&mut self, student: Student) -> UserId {
        let id = student.id;
        self.students.push(student);
        id
    }

    pub fn enroll(&mut self, student: Student, class_id: ClassId) -> UserId {
        self.add_student(Student {
            class_id: Some(class_id),
            ..student
        })
    }

    pub fn grade(
        &mut self,
        student_id: UserId,
        subject_id: SubjectId,
        subject_name: &str,
        value: f64,
        weight: u32,
    ) {
        self.grades.push(GradeEntry {
            student_id,
            ..entry_in(subject_id, subject_name, value, weight)
        });
    }

    pub fn add_bulletin(&mut self, class_id: ClassId, term_name: &str, state: BulletinState) -> BulletinId {
        let id = BulletinId::new();
        self.bulletins.lock().unwrap().push(BulletinRecord {
            id,
            class_id,
            term_name: term_name.to_string(),
            state,
            created_at: Utc::now(),
        });
        id
    }

    pub fn confirm(&self, bulletin_id: BulletinId) {
        let mut bulletins = self.bulletins.lock().unwrap();
        if let Some(bulletin) = bulletins.iter_mut().find(|b| b.id == bulletin_id) {
            bulletin.state = bulletin.state.confirm();
        }
    }

    fn check(&self) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("store unavailable");
        }
        Ok(())
    }
}

#[async_trait]
impl GradeStore for InMemoryStore {
    async fn grade_entries(&self, student_id: UserId) -> anyhow::Result<Vec<GradeEntry>> {
        self.check()?;
        Ok(self
            .grades
            .iter()
            .filter(|g| g.student_id == student_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RosterStore for InMemoryStore {
    async fn student(&self, student_id: UserId) -> anyhow::Result<Option<Student>> {
        self.check()?;
        Ok(self.students.iter().find(|s| s.id == student_id).cloned())
    }

    async fn enrolled_students(&self, class_id: ClassId) -> anyhow::Result<Vec<Student>> {
        self.check()?;
        Ok(self
            .students
            .iter()
            .filter(|s| s.class_id == Some(class_id))
            .cloned()
            .collect())
    }

    async fn class(&self, class_id: ClassId) -> anyhow::Result<Option<ClassInfo>> {
        self.check()?;
        Ok(self.classes.iter().find(|c| c.id == class_id).cloned())
    }
}

#[async_trait]
impl BulletinStore for InMemoryStore {
    async fn bulletin(&self, bulletin_id: BulletinId) -> anyhow::Result<Option<BulletinRecord>> {
        self.check()?;
        Ok(self
            .bulletins
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.id == bulletin_id)
            .cloned())
    }
}
