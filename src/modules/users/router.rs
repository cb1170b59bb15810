use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::AppState;

use super::controller::{
    create_user, delete_user, get_my_children, get_my_students, get_profile, get_user, get_users,
    update_user, update_user_role,
};

pub fn init_users_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_user).get(get_users))
        .route("/me", get(get_profile))
        .route("/my-children", get(get_my_children))
        .route("/my-students", get(get_my_students))
        .route(
            "/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/{id}/role", patch(update_user_role))
}
