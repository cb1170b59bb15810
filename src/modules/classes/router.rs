use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    create_class, delete_class, get_class, get_class_students, get_class_subjects, get_classes,
    get_my_classes, update_class,
};

pub fn init_classes_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_class).get(get_classes))
        .route("/mine", get(get_my_classes))
        .route(
            "/{id}",
            get(get_class).put(update_class).delete(delete_class),
        )
        .route("/{id}/students", get(get_class_students))
        .route("/{id}/subjects", get(get_class_subjects))
}
