use serde::Deserialize;
use uuid::Uuid;

// -- Users --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
}

/// Fields left out keep their stored value.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
}

// -- Thoughts --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateThoughtRequest {
    pub thought_text: String,
    pub username: String,
    /// Owner to link the new thought into. Optional, and allowed to dangle.
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateThoughtRequest {
    pub thought_text: Option<String>,
    pub username: Option<String>,
}

// -- Reactions --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateReactionRequest {
    pub reaction_body: String,
    pub username: String,
}
