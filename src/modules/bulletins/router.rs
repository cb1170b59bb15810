use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    confirm_bulletin, create_bulletin, delete_bulletin, download_class_bulletin,
    download_student_bulletin, get_bulletin, get_bulletins, update_bulletin,
};

pub fn init_bulletins_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_bulletin).get(get_bulletins))
        .route(
            "/{id}",
            get(get_bulletin).put(update_bulletin).delete(delete_bulletin),
        )
        .route("/{id}/confirm", post(confirm_bulletin))
        .route("/{id}/download", get(download_class_bulletin))
        .route(
            "/{id}/students/{student_id}/download",
            get(download_student_bulletin),
        )
}
