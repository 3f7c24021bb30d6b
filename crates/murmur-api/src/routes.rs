use axum::{
    Json, Router,
    routing::{delete, get, post},
};
use serde_json::{Value, json};

use crate::{AppState, reactions, thoughts, users};

/// The full HTTP surface: everything under `/api`, plus `/health`.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/{id}",
            get(users::get_user).put(users::update_user).delete(users::delete_user),
        )
        .route(
            "/users/{user_id}/friends/{friend_id}",
            post(users::add_friend).delete(users::remove_friend),
        )
        .route("/thoughts", get(thoughts::list_thoughts).post(thoughts::create_thought))
        .route(
            "/thoughts/{id}",
            get(thoughts::get_thought)
                .put(thoughts::update_thought)
                .delete(thoughts::delete_thought),
        )
        .route("/thoughts/{thought_id}/reactions", post(reactions::create_reaction))
        .route(
            "/thoughts/{thought_id}/reactions/{reaction_id}",
            delete(reactions::delete_reaction),
        )
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .route("/health", get(health))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
