//! Glue between the grading engine and the HTTP layer.

use axum::http::StatusCode;

use gradebook_core::AppError;
use gradebook_grading::GradingError;

use crate::metrics::track_malformed_aggregates;

pub fn into_app_error(err: GradingError) -> AppError {
    let status = match &err {
        GradingError::StudentNotFound
        | GradingError::ClassNotFound
        | GradingError::BulletinNotFound => StatusCode::NOT_FOUND,
        GradingError::Unconfirmed => StatusCode::FORBIDDEN,
        GradingError::NotInClass => StatusCode::BAD_REQUEST,
        GradingError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    match err {
        GradingError::Store(source) => AppError::database(source),
        other => AppError::new(status, other),
    }
}

/// Feeds the malformed-aggregate counter from a batch of results.
pub fn record_malformed<I, T>(flags: I)
where
    I: IntoIterator<Item = Option<T>>,
{
    track_malformed_aggregates(flags.into_iter().flatten().count());
}
