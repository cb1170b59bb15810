//! The grade aggregation engine.

use std::sync::Arc;

use chrono::Utc;
use tracing::{instrument, warn};

use gradebook_models::{BulletinId, ClassId, UserId};

use crate::average::{Aggregate, AverageResult, weighted_average};
use crate::error::GradingError;
use crate::model::{BulletinRecord, ClassInfo, GradeEntry, Student};
use crate::ranking::{ClassRanking, rank, rank_by};
use crate::report::{BulletinLine, BulletinReport, StudentReport, subject_lines};
use crate::store::GradebookStore;

/// A bulletin resolved for one of its students, ready to be assembled once
/// the caller has checked access to that student.
#[derive(Debug, Clone)]
pub struct StudentBulletinTarget {
    pub bulletin: BulletinRecord,
    pub class: ClassInfo,
    pub student: Student,
}

pub struct GradingEngine<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for GradingEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> GradingEngine<S>
where
    S: GradebookStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Loads a student's entries and aggregates them.
    async fn aggregate(&self, student: &Student) -> Result<(Vec<GradeEntry>, Aggregate), GradingError> {
        let entries = self.store.grade_entries(student.id).await?;
        let aggregate = weighted_average(&entries);
        if let Some(kind) = aggregate.malformed() {
            warn!(
                student_id = %student.id,
                entries = entries.len(),
                kind = ?kind,
                "Malformed aggregate recovered as zero"
            );
        }
        Ok((entries, aggregate))
    }

    async fn find_student(&self, student_id: UserId) -> Result<Student, GradingError> {
        self.store
            .student(student_id)
            .await?
            .ok_or(GradingError::StudentNotFound)
    }

    async fn find_class(&self, class_id: ClassId) -> Result<ClassInfo, GradingError> {
        self.store
            .class(class_id)
            .await?
            .ok_or(GradingError::ClassNotFound)
    }

    #[instrument(skip(self))]
    pub async fn student_average(&self, student_id: UserId) -> Result<AverageResult, GradingError> {
        let student = self.find_student(student_id).await?;
        let (_, aggregate) = self.aggregate(&student).await?;
        Ok(AverageResult::new(student.id, student.username, aggregate))
    }

    #[instrument(skip(self))]
    pub async fn class_ranking(&self, class_id: ClassId) -> Result<ClassRanking, GradingError> {
        let class = self.find_class(class_id).await?;
        let students = self.store.enrolled_students(class_id).await?;

        let mut averages = Vec::with_capacity(students.len());
        for student in students {
            let (_, aggregate) = self.aggregate(&student).await?;
            averages.push((student, aggregate));
        }

        Ok(ClassRanking {
            class_id: class.id,
            class_name: class.name,
            ranking: rank(averages),
        })
    }

    #[instrument(skip(self))]
    pub async fn student_report(&self, student_id: UserId) -> Result<StudentReport, GradingError> {
        let student = self.find_student(student_id).await?;
        let class_name = match student.class_id {
            Some(class_id) => self.store.class(class_id).await?.map(|class| class.name),
            None => None,
        };
        let (grades, aggregate) = self.aggregate(&student).await?;

        Ok(StudentReport {
            student,
            class_name,
            weighted_average: aggregate.value(),
            grades,
            malformed: aggregate.malformed(),
        })
    }

    /// Resolves a bulletin, refusing drafts.
    #[instrument(skip(self))]
    pub async fn confirmed_bulletin(
        &self,
        bulletin_id: BulletinId,
    ) -> Result<(BulletinRecord, ClassInfo), GradingError> {
        let bulletin = self
            .store
            .bulletin(bulletin_id)
            .await?
            .ok_or(GradingError::BulletinNotFound)?;
        if !bulletin.state.is_confirmed() {
            return Err(GradingError::Unconfirmed);
        }
        let class = self.find_class(bulletin.class_id).await?;
        Ok((bulletin, class))
    }

    /// Every enrolled student of the bulletin's class, in listing order, or by
    /// rank when `ranked` is set.
    #[instrument(skip(self))]
    pub async fn class_bulletin(
        &self,
        bulletin_id: BulletinId,
        ranked: bool,
    ) -> Result<BulletinReport, GradingError> {
        let (bulletin, class) = self.confirmed_bulletin(bulletin_id).await?;
        let lines = self.bulletin_lines(class.id).await?;

        let students = if ranked {
            rank_by(lines, |line| line.weighted_average)
                .into_iter()
                .map(|(line, rank)| BulletinLine {
                    rank: Some(rank),
                    ..line
                })
                .collect()
        } else {
            lines
        };

        Ok(assemble(bulletin, class, ranked, students))
    }

    /// Checks, in order: the bulletin is confirmed, the student exists and
    /// the student is enrolled in the bulletin's class.
    #[instrument(skip(self))]
    pub async fn student_bulletin_target(
        &self,
        bulletin_id: BulletinId,
        student_id: UserId,
    ) -> Result<StudentBulletinTarget, GradingError> {
        let (bulletin, class) = self.confirmed_bulletin(bulletin_id).await?;
        let student = self.find_student(student_id).await?;
        if student.class_id != Some(bulletin.class_id) {
            return Err(GradingError::NotInClass);
        }
        Ok(StudentBulletinTarget {
            bulletin,
            class,
            student,
        })
    }

    /// One student's bulletin, always carrying the student's class rank.
    #[instrument(skip(self, target), fields(student_id = %target.student.id))]
    pub async fn student_bulletin(
        &self,
        target: StudentBulletinTarget,
    ) -> Result<BulletinReport, GradingError> {
        let StudentBulletinTarget {
            bulletin,
            class,
            student,
        } = target;

        let ranked = rank_by(self.bulletin_lines(class.id).await?, |line| {
            line.weighted_average
        });
        let line = match ranked
            .into_iter()
            .find(|(line, _)| line.student.id == student.id)
        {
            Some((line, rank)) => BulletinLine {
                rank: Some(rank),
                ..line
            },
            // Enrollment changed between the two reads.
            None => return Err(GradingError::NotInClass),
        };

        Ok(assemble(bulletin, class, true, vec![line]))
    }

    async fn bulletin_lines(&self, class_id: ClassId) -> Result<Vec<BulletinLine>, GradingError> {
        let students = self.store.enrolled_students(class_id).await?;
        let mut lines = Vec::with_capacity(students.len());
        for student in students {
            let (grades, aggregate) = self.aggregate(&student).await?;
            lines.push(BulletinLine {
                subjects: subject_lines(&grades),
                student,
                weighted_average: aggregate.value(),
                rank: None,
                grades,
                malformed: aggregate.malformed(),
            });
        }
        Ok(lines)
    }
}

fn assemble(
    bulletin: BulletinRecord,
    class: ClassInfo,
    ranked: bool,
    students: Vec<BulletinLine>,
) -> BulletinReport {
    BulletinReport {
        bulletin_id: bulletin.id,
        class_id: class.id,
        class_name: class.name,
        term_name: bulletin.term_name,
        generated_at: Utc::now(),
        ranked,
        students,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BulletinState;
    use crate::testing::{InMemoryStore, student};
    use gradebook_models::SubjectId;

    struct Fixture {
        engine: GradingEngine<InMemoryStore>,
        class_id: ClassId,
        awa: UserId,
        binta: UserId,
        cheikh: UserId,
        draft: BulletinId,
        confirmed: BulletinId,
    }

    fn fixture() -> Fixture {
        let mut store = InMemoryStore::default();
        let class_id = store.add_class("6eme A");
        let maths = SubjectId::new();
        let french = SubjectId::new();

        let awa = store.enroll(student("awa"), class_id);
        let binta = store.enroll(student("binta"), class_id);
        let cheikh = store.enroll(student("cheikh"), class_id);

        store.grade(awa, maths, "Maths", 18.0, 2);
        store.grade(awa, french, "Francais", 12.0, 1);
        store.grade(binta, maths, "Maths", 16.0, 2);
        store.grade(binta, french, "Francais", 16.0, 1);
        // cheikh has no grades

        let draft = store.add_bulletin(class_id, "Semestre 1", BulletinState::Draft);
        let confirmed = store.add_bulletin(class_id, "Semestre 2", BulletinState::Confirmed);

        Fixture {
            engine: GradingEngine::new(Arc::new(store)),
            class_id,
            awa,
            binta,
            cheikh,
            draft,
            confirmed,
        }
    }

    #[tokio::test]
    async fn test_student_average() {
        let f = fixture();
        let result = f.engine.student_average(f.awa).await.unwrap();
        assert_eq!(result.weighted_average, 16.0);
        assert_eq!(result.username, "awa");
    }

    #[tokio::test]
    async fn test_student_without_grades_averages_zero() {
        let f = fixture();
        let result = f.engine.student_average(f.cheikh).await.unwrap();
        assert_eq!(result.weighted_average, 0.0);
        assert_eq!(result.malformed, None);
    }

    #[tokio::test]
    async fn test_unknown_student_is_not_found() {
        let f = fixture();
        let err = f.engine.student_average(UserId::new()).await.unwrap_err();
        assert!(matches!(err, GradingError::StudentNotFound));

        let err = f.engine.student_report(UserId::new()).await.unwrap_err();
        assert!(matches!(err, GradingError::StudentNotFound));
    }

    #[tokio::test]
    async fn test_class_ranking_ties_keep_listing_order() {
        let f = fixture();
        let ranking = f.engine.class_ranking(f.class_id).await.unwrap();
        assert_eq!(ranking.class_name, "6eme A");

        let order: Vec<(UserId, u32, f64)> = ranking
            .ranking
            .iter()
            .map(|r| (r.student.id, r.rank, r.weighted_average))
            .collect();
        assert_eq!(
            order,
            vec![(f.awa, 1, 16.0), (f.binta, 2, 16.0), (f.cheikh, 3, 0.0)]
        );
    }

    #[tokio::test]
    async fn test_class_ranking_is_idempotent() {
        let f = fixture();
        let first = f.engine.class_ranking(f.class_id).await.unwrap();
        let second = f.engine.class_ranking(f.class_id).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_empty_class_ranks_nothing() {
        let mut store = InMemoryStore::default();
        let class_id = store.add_class("Terminale S");
        let engine = GradingEngine::new(Arc::new(store));

        let ranking = engine.class_ranking(class_id).await.unwrap();
        assert!(ranking.ranking.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_class_is_not_found() {
        let f = fixture();
        let err = f.engine.class_ranking(ClassId::new()).await.unwrap_err();
        assert!(matches!(err, GradingError::ClassNotFound));
    }

    #[tokio::test]
    async fn test_student_report() {
        let f = fixture();
        let report = f.engine.student_report(f.binta).await.unwrap();
        assert_eq!(report.class_name.as_deref(), Some("6eme A"));
        assert_eq!(report.weighted_average, 16.0);
        assert_eq!(report.grades.len(), 2);
    }

    #[tokio::test]
    async fn test_student_report_without_class() {
        let mut store = InMemoryStore::default();
        let loner = store.add_student(student("loner"));
        let engine = GradingEngine::new(Arc::new(store));

        let report = engine.student_report(loner).await.unwrap();
        assert_eq!(report.class_name, None);
        assert_eq!(report.weighted_average, 0.0);
        assert!(report.grades.is_empty());
    }

    #[tokio::test]
    async fn test_draft_bulletin_is_unconfirmed() {
        let f = fixture();
        let err = f.engine.class_bulletin(f.draft, false).await.unwrap_err();
        assert!(matches!(err, GradingError::Unconfirmed));

        let err = f
            .engine
            .student_bulletin_target(f.draft, f.awa)
            .await
            .unwrap_err();
        assert!(matches!(err, GradingError::Unconfirmed));
    }

    #[tokio::test]
    async fn test_confirming_unlocks_the_same_bulletin() {
        let mut store = InMemoryStore::default();
        let class_id = store.add_class("5eme B");
        store.enroll(student("awa"), class_id);
        let bulletin_id = store.add_bulletin(class_id, "Trimestre 1", BulletinState::Draft);
        let store = Arc::new(store);
        let engine = GradingEngine::new(Arc::clone(&store));

        assert!(matches!(
            engine.class_bulletin(bulletin_id, true).await,
            Err(GradingError::Unconfirmed)
        ));

        store.confirm(bulletin_id);
        let report = engine.class_bulletin(bulletin_id, true).await.unwrap();
        assert_eq!(report.term_name, "Trimestre 1");
        assert_eq!(report.class_name, "5eme B");
        assert_eq!(report.students.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_bulletin() {
        let f = fixture();
        let err = f
            .engine
            .class_bulletin(BulletinId::new(), false)
            .await
            .unwrap_err();
        assert!(matches!(err, GradingError::BulletinNotFound));
    }

    #[tokio::test]
    async fn test_class_bulletin_unranked_keeps_listing_order() {
        let f = fixture();
        let report = f.engine.class_bulletin(f.confirmed, false).await.unwrap();
        assert!(!report.ranked);
        let ids: Vec<UserId> = report.students.iter().map(|l| l.student.id).collect();
        assert_eq!(ids, vec![f.awa, f.binta, f.cheikh]);
        assert!(report.students.iter().all(|l| l.rank.is_none()));
    }

    #[tokio::test]
    async fn test_class_bulletin_ranked() {
        let f = fixture();
        let report = f.engine.class_bulletin(f.confirmed, true).await.unwrap();
        assert!(report.ranked);
        let ranks: Vec<Option<u32>> = report.students.iter().map(|l| l.rank).collect();
        assert_eq!(ranks, vec![Some(1), Some(2), Some(3)]);

        let awa = &report.students[0];
        assert_eq!(awa.subjects.len(), 2);
        assert_eq!(awa.subjects[0].subject_name, "Francais");
        assert_eq!(awa.subjects[1].average, 18.0);
    }

    #[tokio::test]
    async fn test_student_bulletin_carries_rank() {
        let f = fixture();
        let target = f
            .engine
            .student_bulletin_target(f.confirmed, f.binta)
            .await
            .unwrap();
        let report = f.engine.student_bulletin(target).await.unwrap();
        assert_eq!(report.students.len(), 1);
        assert_eq!(report.students[0].student.id, f.binta);
        assert_eq!(report.students[0].rank, Some(2));
        assert_eq!(report.term_name, "Semestre 2");
    }

    #[tokio::test]
    async fn test_student_bulletin_rejects_other_class() {
        let mut store = InMemoryStore::default();
        let class_a = store.add_class("A");
        let class_b = store.add_class("B");
        let outsider = store.enroll(student("outsider"), class_b);
        let bulletin_id = store.add_bulletin(class_a, "Semestre 1", BulletinState::Confirmed);
        let engine = GradingEngine::new(Arc::new(store));

        let err = engine
            .student_bulletin_target(bulletin_id, outsider)
            .await
            .unwrap_err();
        assert!(matches!(err, GradingError::NotInClass));

        let err = engine
            .student_bulletin_target(bulletin_id, UserId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, GradingError::StudentNotFound));
    }

    #[tokio::test]
    async fn test_zero_weight_is_recovered() {
        let mut store = InMemoryStore::default();
        let class_id = store.add_class("A");
        let awa = store.enroll(student("awa"), class_id);
        store.grade(awa, SubjectId::new(), "EPS", 15.0, 0);
        let engine = GradingEngine::new(Arc::new(store));

        let result = engine.student_average(awa).await.unwrap();
        assert_eq!(result.weighted_average, 0.0);
        assert!(result.malformed.is_some());
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let store = InMemoryStore {
            fail: true,
            ..InMemoryStore::default()
        };
        let engine = GradingEngine::new(Arc::new(store));
        let err = engine.student_average(UserId::new()).await.unwrap_err();
        assert!(matches!(err, GradingError::Store(_)));
    }
}
