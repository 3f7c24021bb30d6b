use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{info, warn};
use uuid::Uuid;

use murmur_types::api::{CreateThoughtRequest, UpdateThoughtRequest};
use murmur_types::models::Thought;

use crate::error::ApiError;
use crate::extract::{JsonBody, PathParams};
use crate::{AppState, validation, with_db};

pub async fn list_thoughts(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let thoughts = with_db(&state, |db| db.list_thoughts()).await?;
    Ok(Json(thoughts))
}

pub async fn get_thought(
    State(state): State<AppState>,
    PathParams(id): PathParams<Uuid>,
) -> Result<Json<Option<Thought>>, ApiError> {
    let thought = with_db(&state, move |db| db.get_thought(id)).await?;
    Ok(Json(thought))
}

pub async fn create_thought(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreateThoughtRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validation::text("thoughtText", &req.thought_text)?;
    let username = validation::username(&req.username)?;
    let user_id = req.user_id;

    let (thought, linked) = with_db(&state, move |db| {
        db.create_thought(&req.thought_text, &username, user_id)
    })
    .await?;

    if let (Some(owner), false) = (user_id, linked) {
        warn!("Thought {} references unknown user {}", thought.id, owner);
    }

    Ok((StatusCode::CREATED, Json(thought)))
}

pub async fn update_thought(
    State(state): State<AppState>,
    PathParams(id): PathParams<Uuid>,
    JsonBody(req): JsonBody<UpdateThoughtRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(text) = &req.thought_text {
        validation::text("thoughtText", text)?;
    }
    let username = req.username.as_deref().map(validation::username).transpose()?;

    let thought = with_db(&state, move |db| {
        db.update_thought(id, req.thought_text.as_deref(), username.as_deref())
    })
    .await?;

    Ok(Json(thought))
}

pub async fn delete_thought(
    State(state): State<AppState>,
    PathParams(id): PathParams<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let removed = with_db(&state, move |db| db.delete_thought(id)).await?;
    info!("Deleted thought {} with {} reactions", id, removed.reaction_count());

    Ok(StatusCode::NO_CONTENT)
}
