use thiserror::Error;

/// Failures the engine reports to its callers.
///
/// Malformed aggregates are not errors: they are recovered as a zero average
/// and flagged on the result.
#[derive(Debug, Error)]
pub enum GradingError {
    #[error("Student not found.")]
    StudentNotFound,

    #[error("Class not found.")]
    ClassNotFound,

    #[error("Bulletin not found.")]
    BulletinNotFound,

    #[error("Bulletin not confirmed.")]
    Unconfirmed,

    #[error("Student does not belong to this bulletin's class.")]
    NotInClass,

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl GradingError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            GradingError::StudentNotFound
                | GradingError::ClassNotFound
                | GradingError::BulletinNotFound
        )
    }
}
