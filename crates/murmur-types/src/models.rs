use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

use crate::timestamp;

/// A user record as stored: `thoughts` and `friends` hold ids only.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub thoughts: Vec<Uuid>,
    pub friends: Vec<Uuid>,
}

impl User {
    pub fn friend_count(&self) -> usize {
        self.friends.len()
    }
}

impl Serialize for User {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("User", 6)?;
        s.serialize_field("_id", &self.id)?;
        s.serialize_field("username", &self.username)?;
        s.serialize_field("email", &self.email)?;
        s.serialize_field("thoughts", &self.thoughts)?;
        s.serialize_field("friends", &self.friends)?;
        s.serialize_field("friendCount", &self.friend_count())?;
        s.end()
    }
}

/// A user with `thoughts` and `friends` expanded one level deep.
///
/// References that no longer resolve are left out rather than rendered as
/// nulls.
#[derive(Debug, Clone)]
pub struct UserDetail {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub thoughts: Vec<Thought>,
    pub friends: Vec<User>,
}

impl Serialize for UserDetail {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("UserDetail", 6)?;
        s.serialize_field("_id", &self.id)?;
        s.serialize_field("username", &self.username)?;
        s.serialize_field("email", &self.email)?;
        s.serialize_field("thoughts", &self.thoughts)?;
        s.serialize_field("friends", &self.friends)?;
        s.serialize_field("friendCount", &self.friends.len())?;
        s.end()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Thought {
    pub id: Uuid,
    pub thought_text: String,
    /// Author display name, denormalized from the user at write time.
    pub username: String,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub reactions: Vec<Reaction>,
}

impl Thought {
    pub fn reaction_count(&self) -> usize {
        self.reactions.len()
    }
}

impl Serialize for Thought {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Thought", 7)?;
        s.serialize_field("_id", &self.id)?;
        s.serialize_field("thoughtText", &self.thought_text)?;
        s.serialize_field("username", &self.username)?;
        s.serialize_field("userId", &self.user_id)?;
        s.serialize_field("createdAt", &timestamp::format(&self.created_at))?;
        s.serialize_field("reactions", &self.reactions)?;
        s.serialize_field("reactionCount", &self.reaction_count())?;
        s.end()
    }
}

/// Reactions live inside their thought and are persisted with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    pub reaction_id: Uuid,
    pub reaction_body: String,
    pub username: String,
    #[serde(with = "crate::timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Reaction {
    pub fn new(reaction_body: String, username: String) -> Self {
        Self {
            reaction_id: Uuid::new_v4(),
            reaction_body,
            username,
            created_at: timestamp::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn thought_renders_derived_count_and_formatted_date() {
        let mut thought = Thought {
            id: Uuid::nil(),
            thought_text: "hello".into(),
            username: "ada".into(),
            user_id: None,
            created_at: timestamp::parse("2024-01-02 03:04:05").unwrap(),
            reactions: vec![],
        };
        thought.reactions.push(Reaction::new("hi".into(), "bob".into()));

        let value = serde_json::to_value(&thought).unwrap();
        assert_eq!(value["createdAt"], json!("2024-01-02 03:04:05"));
        assert_eq!(value["reactionCount"], json!(1));
        assert_eq!(value["userId"], json!(null));
        assert_eq!(value["reactions"][0]["reactionBody"], json!("hi"));
    }

    #[test]
    fn reaction_survives_store_encoding() {
        let reaction = Reaction::new("nice".into(), "carol".into());
        let encoded = serde_json::to_string(&vec![reaction.clone()]).unwrap();
        let decoded: Vec<Reaction> = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, vec![reaction]);
    }

    #[test]
    fn user_counts_friends() {
        let user = User {
            id: Uuid::new_v4(),
            username: "ada".into(),
            email: "ada@example.com".into(),
            thoughts: vec![],
            friends: vec![Uuid::new_v4(), Uuid::new_v4()],
        };
        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["friendCount"], json!(2));
        assert_eq!(value["_id"], json!(user.id.to_string()));
    }
}
