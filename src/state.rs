use std::sync::Arc;

use sqlx::PgPool;

use gradebook_config::{CorsConfig, JwtConfig};
use gradebook_db::PgGradebookStore;
use gradebook_grading::{GradebookStore, GradingEngine};

use crate::reports::HtmlRenderer;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub grading: GradingEngine<dyn GradebookStore>,
    pub reports: Arc<HtmlRenderer>,
    pub jwt_config: JwtConfig,
    pub cors_config: CorsConfig,
}

impl AppState {
    /// Wires the grading engine and the report renderer onto `db`.
    pub fn new(
        db: PgPool,
        jwt_config: JwtConfig,
        cors_config: CorsConfig,
    ) -> Result<Self, handlebars::TemplateError> {
        let store: Arc<dyn GradebookStore> = Arc::new(PgGradebookStore::new(db.clone()));
        Ok(Self {
            db,
            grading: GradingEngine::new(store),
            reports: Arc::new(HtmlRenderer::new()?),
            jwt_config,
            cors_config,
        })
    }
}
