use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use murmur_types::api::{CreateUserRequest, UpdateUserRequest};
use murmur_types::models::UserDetail;

use crate::error::ApiError;
use crate::extract::{JsonBody, PathParams};
use crate::{AppState, validation, with_db};

pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let users = with_db(&state, |db| db.list_user_details()).await?;
    Ok(Json(users))
}

/// An unknown id answers `200 null`, not 404.
pub async fn get_user(
    State(state): State<AppState>,
    PathParams(id): PathParams<Uuid>,
) -> Result<Json<Option<UserDetail>>, ApiError> {
    let user = with_db(&state, move |db| db.get_user_detail(id)).await?;
    Ok(Json(user))
}

pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = validation::username(&req.username)?;
    let email = validation::email(&req.email)?;

    let user = with_db(&state, move |db| db.create_user(&username, &email)).await?;
    info!("Created user {} ({})", user.id, user.username);

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    PathParams(id): PathParams<Uuid>,
    JsonBody(req): JsonBody<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = req.username.as_deref().map(validation::username).transpose()?;
    let email = req.email.as_deref().map(validation::email).transpose()?;

    let user = with_db(&state, move |db| {
        db.update_user(id, username.as_deref(), email.as_deref())
    })
    .await?;

    Ok(Json(user))
}

pub async fn delete_user(
    State(state): State<AppState>,
    PathParams(id): PathParams<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let cascade = with_db(&state, move |db| db.delete_user(id)).await?;
    info!(
        "Deleted user {}: {} thoughts removed, unfriended by {} users",
        id, cascade.thoughts_removed, cascade.friend_links_removed
    );

    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_friend(
    State(state): State<AppState>,
    PathParams((user_id, friend_id)): PathParams<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let user = with_db(&state, move |db| db.add_friend(user_id, friend_id)).await?;
    Ok(Json(user))
}

pub async fn remove_friend(
    State(state): State<AppState>,
    PathParams((user_id, friend_id)): PathParams<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let user = with_db(&state, move |db| db.remove_friend(user_id, friend_id)).await?;
    Ok(Json(user))
}
