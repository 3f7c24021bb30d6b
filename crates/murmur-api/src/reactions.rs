use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use murmur_types::api::CreateReactionRequest;
use murmur_types::models::Reaction;

use crate::error::ApiError;
use crate::extract::{JsonBody, PathParams};
use crate::{AppState, validation, with_db};

/// Appends to the parent thought and answers with the whole updated thought.
pub async fn create_reaction(
    State(state): State<AppState>,
    PathParams(thought_id): PathParams<Uuid>,
    JsonBody(req): JsonBody<CreateReactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validation::text("reactionBody", &req.reaction_body)?;
    let username = validation::username(&req.username)?;

    let reaction = Reaction::new(req.reaction_body, username);
    let thought = with_db(&state, move |db| db.add_reaction(thought_id, reaction)).await?;

    Ok((StatusCode::CREATED, Json(thought)))
}

pub async fn delete_reaction(
    State(state): State<AppState>,
    PathParams((thought_id, reaction_id)): PathParams<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let thought = with_db(&state, move |db| db.remove_reaction(thought_id, reaction_id)).await?;
    Ok(Json(thought))
}
