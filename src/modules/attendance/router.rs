use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    delete_presence, get_attendance, get_attendance_stats, get_my_attendance, get_presence,
    get_student_attendance, mark_attendance, update_presence,
};

pub fn init_attendance_router() -> Router<AppState> {
    Router::new()
        .route("/", post(mark_attendance).get(get_attendance))
        .route("/mine", get(get_my_attendance))
        .route("/stats", get(get_attendance_stats))
        .route("/students/{id}", get(get_student_attendance))
        .route(
            "/{id}",
            get(get_presence).put(update_presence).delete(delete_presence),
        )
}
