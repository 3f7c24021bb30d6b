//! Row types, mapped straight from SQLite. Distinct from the murmur-types
//! models so the store layer owns its own encoding.

use murmur_types::models::{Reaction, Thought};
use murmur_types::timestamp;
use uuid::Uuid;

use crate::{DbError, Result};

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
}

pub struct ThoughtRow {
    pub id: String,
    pub thought_text: String,
    pub username: String,
    pub user_id: Option<String>,
    pub reactions: String,
    pub created_at: String,
}

impl TryFrom<ThoughtRow> for Thought {
    type Error = DbError;

    fn try_from(row: ThoughtRow) -> Result<Self> {
        let reactions: Vec<Reaction> = serde_json::from_str(&row.reactions)?;
        let created_at = timestamp::parse(&row.created_at).map_err(|e| {
            DbError::Corrupt(format!("created_at '{}' on thought {}: {}", row.created_at, row.id, e))
        })?;
        let user_id = row.user_id.as_deref().map(parse_id).transpose()?;

        Ok(Thought {
            id: parse_id(&row.id)?,
            thought_text: row.thought_text,
            username: row.username,
            user_id,
            created_at,
            reactions,
        })
    }
}

pub(crate) fn parse_id(raw: &str) -> Result<Uuid> {
    raw.parse()
        .map_err(|e| DbError::Corrupt(format!("id '{}': {}", raw, e)))
}
