use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    create_grade, delete_grade, get_class_ranking, get_grade, get_grades, get_student_average,
    get_student_report, update_grade,
};

pub fn init_grades_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_grade).get(get_grades))
        .route(
            "/{id}",
            get(get_grade).put(update_grade).delete(delete_grade),
        )
        .route("/students/{id}/average", get(get_student_average))
        .route("/students/{id}/report", get(get_student_report))
        .route("/classes/{id}/ranking", get(get_class_ranking))
}
