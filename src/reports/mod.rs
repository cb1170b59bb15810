//! Printable HTML rendering of reports and bulletins.
//!
//! Bulletins are rendered as standalone HTML documents suitable for printing
//! to PDF from a browser.

use anyhow::Context;
use axum::{
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use handlebars::{Handlebars, TemplateError, handlebars_helper};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use gradebook_core::AppError;
use gradebook_grading::{Document, JsonRenderer, ReportData, ReportRenderer};

const BULLETIN_TEMPLATE: &str = include_str!("templates/bulletin.hbs");
const STUDENT_REPORT_TEMPLATE: &str = include_str!("templates/student_report.hbs");

handlebars_helper!(two_decimals: |value: f64| format!("{value:.2}"));

pub struct HtmlRenderer {
    registry: Handlebars<'static>,
}

impl HtmlRenderer {
    pub fn new() -> Result<Self, TemplateError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_helper("two_decimals", Box::new(two_decimals));
        registry.register_template_string("bulletin", BULLETIN_TEMPLATE)?;
        registry.register_template_string("student_report", STUDENT_REPORT_TEMPLATE)?;
        Ok(Self { registry })
    }
}

impl ReportRenderer for HtmlRenderer {
    fn render(&self, data: &ReportData) -> anyhow::Result<Document> {
        let template = match data {
            ReportData::Student(_) => "student_report",
            ReportData::ClassBulletin(_) | ReportData::StudentBulletin(_) => "bulletin",
        };
        let html = self
            .registry
            .render(template, data)
            .with_context(|| format!("Failed to render {template} template"))?;

        Ok(Document {
            file_name: data.file_name("html"),
            content_type: "text/html; charset=utf-8",
            body: html.into_bytes(),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Html,
    Json,
}

impl ReportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportFormat::Html => "html",
            ReportFormat::Json => "json",
        }
    }

    pub fn render(self, html: &HtmlRenderer, data: &ReportData) -> anyhow::Result<Document> {
        match self {
            ReportFormat::Html => html.render(data),
            ReportFormat::Json => JsonRenderer.render(data),
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct DownloadParams {
    /// `html` (default) or `json`
    pub format: Option<ReportFormat>,
    /// Include each student's class rank (class bulletins only)
    pub ranked: Option<bool>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct FormatParams {
    /// `html` or `json`; omitted means the JSON body without a download
    pub format: Option<ReportFormat>,
}

/// `attachment` disposition with an ASCII `filename` fallback and the exact
/// UTF-8 name in `filename*` (RFC 6266).
fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| match c {
            ' '..='~' if c != '"' && c != '\\' => c,
            _ => '_',
        })
        .collect();
    format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
        urlencoding::encode(file_name)
    )
}

/// Sends `document` as an attachment named after its file name.
pub fn download_response(document: Document) -> Result<Response, AppError> {
    let disposition = content_disposition(&document.file_name);
    let disposition = HeaderValue::from_str(&disposition).map_err(AppError::internal)?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static(document.content_type),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document.body,
    )
        .into_response())
}
