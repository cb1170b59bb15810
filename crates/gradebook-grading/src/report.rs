//! Report shapes handed to renderers, and the JSON renderer.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use gradebook_models::{BulletinId, ClassId, SubjectId};

use crate::average::{MalformedAggregate, weighted_average};
use crate::model::{GradeEntry, Student};

/// One student's average with every grade behind it.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct StudentReport {
    pub student: Student,
    pub class_name: Option<String>,
    pub weighted_average: f64,
    pub grades: Vec<GradeEntry>,
    #[serde(skip)]
    pub malformed: Option<MalformedAggregate>,
}

/// Per-subject breakdown of a bulletin line.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SubjectLine {
    pub subject_id: SubjectId,
    pub subject_name: String,
    pub coefficient: u32,
    pub average: f64,
    pub grade_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BulletinLine {
    pub student: Student,
    pub weighted_average: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
    pub subjects: Vec<SubjectLine>,
    pub grades: Vec<GradeEntry>,
    #[serde(skip)]
    pub malformed: Option<MalformedAggregate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BulletinReport {
    pub bulletin_id: BulletinId,
    pub class_id: ClassId,
    pub class_name: String,
    pub term_name: String,
    pub generated_at: DateTime<Utc>,
    pub ranked: bool,
    pub students: Vec<BulletinLine>,
}

/// What a renderer is asked to format.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ReportData {
    Student(StudentReport),
    ClassBulletin(BulletinReport),
    StudentBulletin(BulletinReport),
}

impl ReportData {
    pub fn file_name(&self, extension: &str) -> String {
        match self {
            ReportData::Student(report) => {
                sanitize(&format!("Report_{}.{extension}", report.student.username))
            }
            ReportData::ClassBulletin(report) => {
                bulletin_file_name(&report.class_name, &report.term_name, None, extension)
            }
            ReportData::StudentBulletin(report) => bulletin_file_name(
                &report.class_name,
                &report.term_name,
                report.students.first().map(|line| line.student.username.as_str()),
                extension,
            ),
        }
    }
}

/// A rendered report, ready to be sent as a download.
#[derive(Debug, Clone)]
pub struct Document {
    pub file_name: String,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

pub trait ReportRenderer: Send + Sync {
    fn render(&self, data: &ReportData) -> anyhow::Result<Document>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl ReportRenderer for JsonRenderer {
    fn render(&self, data: &ReportData) -> anyhow::Result<Document> {
        Ok(Document {
            file_name: data.file_name("json"),
            content_type: "application/json",
            body: serde_json::to_vec_pretty(data)?,
        })
    }
}

/// `Bulletin_<class>_<term>[_student_<username>].<ext>`, passed through
/// [`sanitize`].
pub fn bulletin_file_name(
    class_name: &str,
    term_name: &str,
    student_username: Option<&str>,
    extension: &str,
) -> String {
    let stem = match student_username {
        Some(username) => format!("Bulletin_{class_name}_{term_name}_student_{username}"),
        None => format!("Bulletin_{class_name}_{term_name}"),
    };
    sanitize(&format!("{stem}.{extension}"))
}

/// Replaces spaces, quotes, slashes and control characters with `_` so the
/// name is safe inside a quoted header parameter. Other Unicode is kept.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            ' ' | '"' | '\\' | '/' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Groups entries by subject, sorted by subject name.
pub fn subject_lines(entries: &[GradeEntry]) -> Vec<SubjectLine> {
    let mut groups: BTreeMap<(&str, SubjectId), Vec<&GradeEntry>> = BTreeMap::new();
    for entry in entries {
        groups
            .entry((entry.subject_name.as_str(), entry.subject_id))
            .or_default()
            .push(entry);
    }

    groups
        .into_iter()
        .map(|((name, subject_id), group)| SubjectLine {
            subject_id,
            subject_name: name.to_string(),
            coefficient: group.first().map_or(0, |e| e.subject_weight),
            average: weighted_average(group.iter().copied()).value(),
            grade_count: group.len(),
        })
        .collect()
}
