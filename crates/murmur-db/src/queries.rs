use murmur_types::models::{Reaction, Thought, User, UserDetail};
use murmur_types::timestamp;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::warn;
use uuid::Uuid;

use crate::models::{ThoughtRow, UserRow, parse_id};
use crate::{Database, DbError, Result};

/// What a user delete removed besides the user row itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserCascade {
    pub thoughts_removed: usize,
    pub friend_links_removed: usize,
}

impl Database {
    // -- Users --

    pub fn create_user(&self, username: &str, email: &str) -> Result<User> {
        let id = Uuid::new_v4();
        self.with_tx(|tx| {
            tx.execute(
                "INSERT INTO users (id, username, email) VALUES (?1, ?2, ?3)",
                params![id.to_string(), username, email],
            )
            .map_err(DbError::from_write)?;
            load_user(tx, id)?.ok_or(DbError::NotFound { entity: "user", id })
        })
    }

    pub fn get_user_detail(&self, id: Uuid) -> Result<Option<UserDetail>> {
        self.with_conn(|conn| match load_user(conn, id)? {
            Some(user) => expand_user(conn, user).map(Some),
            None => Ok(None),
        })
    }

    pub fn list_user_details(&self) -> Result<Vec<UserDetail>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id FROM users ORDER BY rowid")?;
            let ids = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let mut users = Vec::with_capacity(ids.len());
            for raw in ids {
                if let Some(user) = load_user(conn, parse_id(&raw)?)? {
                    users.push(expand_user(conn, user)?);
                }
            }
            Ok(users)
        })
    }

    /// Replaces the supplied fields; `None` keeps the stored value.
    pub fn update_user(&self, id: Uuid, username: Option<&str>, email: Option<&str>) -> Result<User> {
        self.with_tx(|tx| {
            let changed = tx
                .execute(
                    "UPDATE users SET username = COALESCE(?2, username), email = COALESCE(?3, email)
                     WHERE id = ?1",
                    params![id.to_string(), username, email],
                )
                .map_err(DbError::from_write)?;
            if changed == 0 {
                return Err(DbError::NotFound { entity: "user", id });
            }
            load_user(tx, id)?.ok_or(DbError::NotFound { entity: "user", id })
        })
    }

    /// Deletes the user, every thought it owns, and its id from every other
    /// user's friend set. All of it commits or none of it does.
    pub fn delete_user(&self, id: Uuid) -> Result<UserCascade> {
        let key = id.to_string();
        self.with_tx(|tx| {
            if load_user_row(tx, id)?.is_none() {
                return Err(DbError::NotFound { entity: "user", id });
            }

            // Owned either by back-reference or by being linked into the user.
            let mut stmt = tx.prepare(
                "SELECT id FROM thoughts WHERE user_id = ?1
                 UNION
                 SELECT thought_id FROM user_thoughts WHERE user_id = ?1",
            )?;
            let owned = stmt
                .query_map([&key], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let mut thoughts_removed = 0;
            for thought_id in &owned {
                thoughts_removed += tx.execute("DELETE FROM thoughts WHERE id = ?1", [thought_id])?;
                tx.execute("DELETE FROM user_thoughts WHERE thought_id = ?1", [thought_id])?;
            }

            // user_thoughts / user_friends rows owned by the user go via ON DELETE CASCADE
            tx.execute("DELETE FROM users WHERE id = ?1", [&key])?;

            let friend_links_removed =
                tx.execute("DELETE FROM user_friends WHERE friend_id = ?1", [&key])?;

            Ok(UserCascade {
                thoughts_removed,
                friend_links_removed,
            })
        })
    }

    /// Set-add: adding a friend that is already present changes nothing.
    pub fn add_friend(&self, user_id: Uuid, friend_id: Uuid) -> Result<User> {
        self.with_tx(|tx| {
            if load_user_row(tx, user_id)?.is_none() {
                return Err(DbError::NotFound { entity: "user", id: user_id });
            }
            tx.execute(
                "INSERT OR IGNORE INTO user_friends (user_id, friend_id) VALUES (?1, ?2)",
                params![user_id.to_string(), friend_id.to_string()],
            )?;
            load_user(tx, user_id)?.ok_or(DbError::NotFound { entity: "user", id: user_id })
        })
    }

    pub fn remove_friend(&self, user_id: Uuid, friend_id: Uuid) -> Result<User> {
        self.with_tx(|tx| {
            if load_user_row(tx, user_id)?.is_none() {
                return Err(DbError::NotFound { entity: "user", id: user_id });
            }
            tx.execute(
                "DELETE FROM user_friends WHERE user_id = ?1 AND friend_id = ?2",
                params![user_id.to_string(), friend_id.to_string()],
            )?;
            load_user(tx, user_id)?.ok_or(DbError::NotFound { entity: "user", id: user_id })
        })
    }

    // -- Thoughts --

    /// Inserts a thought and links it into its owner's `thoughts`.
    /// Returns the thought and whether the owner existed to be linked.
    pub fn create_thought(
        &self,
        thought_text: &str,
        username: &str,
        user_id: Option<Uuid>,
    ) -> Result<(Thought, bool)> {
        let thought = Thought {
            id: Uuid::new_v4(),
            thought_text: thought_text.to_string(),
            username: username.to_string(),
            user_id,
            created_at: timestamp::now(),
            reactions: vec![],
        };

        self.with_tx(|tx| {
            tx.execute(
                "INSERT INTO thoughts (id, thought_text, username, user_id, reactions, created_at)
                 VALUES (?1, ?2, ?3, ?4, '[]', ?5)",
                params![
                    thought.id.to_string(),
                    thought.thought_text,
                    thought.username,
                    thought.user_id.map(|id| id.to_string()),
                    timestamp::format(&thought.created_at),
                ],
            )?;

            let linked = match thought.user_id {
                Some(owner) => {
                    tx.execute(
                        "INSERT OR IGNORE INTO user_thoughts (user_id, thought_id)
                         SELECT ?1, ?2 WHERE EXISTS (SELECT 1 FROM users WHERE id = ?1)",
                        params![owner.to_string(), thought.id.to_string()],
                    )? > 0
                }
                None => false,
            };

            Ok((thought, linked))
        })
    }

    pub fn get_thought(&self, id: Uuid) -> Result<Option<Thought>> {
        self.with_conn(|conn| load_thought(conn, id))
    }

    pub fn list_thoughts(&self) -> Result<Vec<Thought>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, thought_text, username, user_id, reactions, created_at
                 FROM thoughts ORDER BY rowid",
            )?;
            let rows = stmt
                .query_map([], map_thought_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            rows.into_iter().map(Thought::try_from).collect()
        })
    }

    pub fn update_thought(
        &self,
        id: Uuid,
        thought_text: Option<&str>,
        username: Option<&str>,
    ) -> Result<Thought> {
        self.with_tx(|tx| {
            let changed = tx.execute(
                "UPDATE thoughts SET thought_text = COALESCE(?2, thought_text), username = COALESCE(?3, username)
                 WHERE id = ?1",
                params![id.to_string(), thought_text, username],
            )?;
            if changed == 0 {
                return Err(DbError::NotFound { entity: "thought", id });
            }
            load_thought(tx, id)?.ok_or(DbError::NotFound { entity: "thought", id })
        })
    }

    /// Removes the thought (its embedded reactions go with the row) and
    /// pulls its id from every user's `thoughts`. Returns the removed thought.
    pub fn delete_thought(&self, id: Uuid) -> Result<Thought> {
        let key = id.to_string();
        self.with_tx(|tx| {
            let thought = load_thought(tx, id)?.ok_or(DbError::NotFound { entity: "thought", id })?;
            tx.execute("DELETE FROM thoughts WHERE id = ?1", [&key])?;
            tx.execute("DELETE FROM user_thoughts WHERE thought_id = ?1", [&key])?;
            Ok(thought)
        })
    }

    // -- Reactions --

    pub fn add_reaction(&self, thought_id: Uuid, reaction: Reaction) -> Result<Thought> {
        self.with_tx(|tx| {
            let mut thought = load_thought(tx, thought_id)?
                .ok_or(DbError::NotFound { entity: "thought", id: thought_id })?;
            thought.reactions.push(reaction);
            save_reactions(tx, &thought)?;
            Ok(thought)
        })
    }

    /// Pulls the reaction with `reaction_id`; an unknown id leaves the
    /// thought unchanged.
    pub fn remove_reaction(&self, thought_id: Uuid, reaction_id: Uuid) -> Result<Thought> {
        self.with_tx(|tx| {
            let mut thought = load_thought(tx, thought_id)?
                .ok_or(DbError::NotFound { entity: "thought", id: thought_id })?;
            let before = thought.reactions.len();
            thought.reactions.retain(|r| r.reaction_id != reaction_id);
            if thought.reactions.len() == before {
                warn!("Reaction {} not present on thought {}", reaction_id, thought_id);
            }
            save_reactions(tx, &thought)?;
            Ok(thought)
        })
    }
}

fn load_user_row(conn: &Connection, id: Uuid) -> Result<Option<UserRow>> {
    let row = conn
        .query_row(
            "SELECT id, username, email FROM users WHERE id = ?1",
            [id.to_string()],
            |row| {
                Ok(UserRow {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    email: row.get(2)?,
                })
            },
        )
        .optional()?;

    Ok(row)
}

fn load_user(conn: &Connection, id: Uuid) -> Result<Option<User>> {
    let Some(row) = load_user_row(conn, id)? else {
        return Ok(None);
    };

    let thoughts = id_column(
        conn,
        "SELECT thought_id FROM user_thoughts WHERE user_id = ?1 ORDER BY seq",
        &row.id,
    )?;
    let friends = id_column(
        conn,
        "SELECT friend_id FROM user_friends WHERE user_id = ?1 ORDER BY seq",
        &row.id,
    )?;

    Ok(Some(User {
        id: parse_id(&row.id)?,
        username: row.username,
        email: row.email,
        thoughts,
        friends,
    }))
}

fn id_column(conn: &Connection, sql: &str, key: &str) -> Result<Vec<Uuid>> {
    let mut stmt = conn.prepare(sql)?;
    let raw = stmt
        .query_map([key], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    raw.iter().map(|id| parse_id(id)).collect()
}

/// One level of expansion; references that no longer resolve are skipped.
fn expand_user(conn: &Connection, user: User) -> Result<UserDetail> {
    let mut thoughts = Vec::with_capacity(user.thoughts.len());
    for id in &user.thoughts {
        match load_thought(conn, *id)? {
            Some(thought) => thoughts.push(thought),
            None => warn!("User {} references missing thought {}", user.id, id),
        }
    }

    let mut friends = Vec::with_capacity(user.friends.len());
    for id in &user.friends {
        if let Some(friend) = load_user(conn, *id)? {
            friends.push(friend);
        }
    }

    Ok(UserDetail {
        id: user.id,
        username: user.username,
        email: user.email,
        thoughts,
        friends,
    })
}

fn map_thought_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ThoughtRow> {
    Ok(ThoughtRow {
        id: row.get(0)?,
        thought_text: row.get(1)?,
        username: row.get(2)?,
        user_id: row.get(3)?,
        reactions: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn load_thought(conn: &Connection, id: Uuid) -> Result<Option<Thought>> {
    let row = conn
        .query_row(
            "SELECT id, thought_text, username, user_id, reactions, created_at
             FROM thoughts WHERE id = ?1",
            [id.to_string()],
            map_thought_row,
        )
        .optional()?;

    row.map(Thought::try_from).transpose()
}

fn save_reactions(conn: &Connection, thought: &Thought) -> Result<()> {
    let encoded = serde_json::to_string(&thought.reactions)?;
    conn.execute(
        "UPDATE thoughts SET reactions = ?2 WHERE id = ?1",
        params![thought.id.to_string(), encoded],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn fetch_user(db: &Database, id: Uuid) -> Option<User> {
        db.with_conn(|conn| load_user(conn, id)).unwrap()
    }

    fn block_deletes_on(db: &Database, table: &str) {
        db.with_conn(|conn| {
            conn.execute_batch(&format!(
                "CREATE TEMP TRIGGER block_{table} BEFORE DELETE ON {table}
                 BEGIN SELECT RAISE(ABORT, 'delete blocked'); END;"
            ))?;
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn new_user_has_empty_collections() {
        let db = db();
        let user = db.create_user("ada", "ada@example.com").unwrap();

        let fetched = fetch_user(&db, user.id).unwrap();
        assert!(fetched.thoughts.is_empty());
        assert!(fetched.friends.is_empty());
        assert_eq!(fetched, user);
    }

    #[test]
    fn duplicate_email_is_a_conflict() {
        let db = db();
        db.create_user("ada", "ada@example.com").unwrap();

        let err = db.create_user("ada2", "ada@example.com").unwrap_err();
        assert!(matches!(err, DbError::Conflict(ref col) if col == "email"), "{err:?}");
    }

    #[test]
    fn update_keeps_omitted_fields() {
        let db = db();
        let user = db.create_user("ada", "ada@example.com").unwrap();

        let updated = db.update_user(user.id, Some("lovelace"), None).unwrap();
        assert_eq!(updated.username, "lovelace");
        assert_eq!(updated.email, "ada@example.com");
    }

    #[test]
    fn update_missing_user_is_not_found() {
        let err = db().update_user(Uuid::new_v4(), Some("x"), None).unwrap_err();
        assert!(matches!(err, DbError::NotFound { entity: "user", .. }));
    }

    #[test]
    fn friends_have_set_semantics() {
        let db = db();
        let ada = db.create_user("ada", "ada@example.com").unwrap();
        let bob = db.create_user("bob", "bob@example.com").unwrap();

        db.add_friend(ada.id, bob.id).unwrap();
        let ada = db.add_friend(ada.id, bob.id).unwrap();
        assert_eq!(ada.friends, vec![bob.id]);

        // not reciprocal
        assert!(fetch_user(&db, bob.id).unwrap().friends.is_empty());

        let ada = db.remove_friend(ada.id, bob.id).unwrap();
        assert!(ada.friends.is_empty());
        let ada = db.remove_friend(ada.id, bob.id).unwrap();
        assert!(ada.friends.is_empty());
    }

    #[test]
    fn thought_is_linked_into_owner() {
        let db = db();
        let ada = db.create_user("ada", "ada@example.com").unwrap();

        let (thought, linked) = db.create_thought("hello", "ada", Some(ada.id)).unwrap();
        assert!(linked);
        assert_eq!(fetch_user(&db, ada.id).unwrap().thoughts, vec![thought.id]);
    }

    #[test]
    fn thought_with_dangling_owner_still_exists() {
        let db = db();
        let (thought, linked) = db.create_thought("hello", "ghost", Some(Uuid::new_v4())).unwrap();
        assert!(!linked);
        assert_eq!(db.get_thought(thought.id).unwrap(), Some(thought));
    }

    #[test]
    fn delete_user_cascades() {
        let db = db();
        let ada = db.create_user("ada", "ada@example.com").unwrap();
        let bob = db.create_user("bob", "bob@example.com").unwrap();
        let carol = db.create_user("carol", "carol@example.com").unwrap();
        db.add_friend(bob.id, ada.id).unwrap();
        db.add_friend(carol.id, ada.id).unwrap();
        db.add_friend(carol.id, bob.id).unwrap();
        let (t1, _) = db.create_thought("one", "ada", Some(ada.id)).unwrap();
        let (t2, _) = db.create_thought("two", "ada", Some(ada.id)).unwrap();
        let (kept, _) = db.create_thought("three", "bob", Some(bob.id)).unwrap();

        let cascade = db.delete_user(ada.id).unwrap();
        assert_eq!(
            cascade,
            UserCascade {
                thoughts_removed: 2,
                friend_links_removed: 2
            }
        );

        assert!(fetch_user(&db, ada.id).is_none());
        assert!(db.get_thought(t1.id).unwrap().is_none());
        assert!(db.get_thought(t2.id).unwrap().is_none());
        assert!(db.get_thought(kept.id).unwrap().is_some());
        assert!(fetch_user(&db, bob.id).unwrap().friends.is_empty());
        assert_eq!(fetch_user(&db, carol.id).unwrap().friends, vec![bob.id]);
    }

    #[test]
    fn delete_missing_user_is_not_found() {
        let err = db().delete_user(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, DbError::NotFound { entity: "user", .. }));
    }

    #[test]
    fn delete_thought_unlinks_and_drops_reactions() {
        let db = db();
        let ada = db.create_user("ada", "ada@example.com").unwrap();
        let (thought, _) = db.create_thought("hello", "ada", Some(ada.id)).unwrap();
        db.add_reaction(thought.id, Reaction::new("a".into(), "bob".into())).unwrap();
        db.add_reaction(thought.id, Reaction::new("b".into(), "carol".into())).unwrap();

        let removed = db.delete_thought(thought.id).unwrap();
        assert_eq!(removed.reaction_count(), 2);

        assert!(db.get_thought(thought.id).unwrap().is_none());
        assert!(fetch_user(&db, ada.id).unwrap().thoughts.is_empty());
        let left: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM thoughts", [], |r| r.get(0))?)
            })
            .unwrap();
        assert_eq!(left, 0);
    }

    #[test]
    fn reactions_round_trip_through_parent() {
        let db = db();
        let (thought, _) = db.create_thought("hello", "ada", None).unwrap();

        let reaction = Reaction::new("nice".into(), "bob".into());
        let rid = reaction.reaction_id;
        let updated = db.add_reaction(thought.id, reaction).unwrap();
        assert_eq!(updated.reaction_count(), 1);

        let stored = db.get_thought(thought.id).unwrap().unwrap();
        assert_eq!(stored.reactions[0].reaction_id, rid);

        let updated = db.remove_reaction(thought.id, rid).unwrap();
        assert_eq!(updated.reaction_count(), 0);
        assert_eq!(db.get_thought(thought.id).unwrap().unwrap().reaction_count(), 0);
    }

    #[test]
    fn reaction_on_missing_thought_is_not_found() {
        let err = db()
            .add_reaction(Uuid::new_v4(), Reaction::new("x".into(), "y".into()))
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { entity: "thought", .. }));
    }

    #[test]
    fn failed_cascade_step_rolls_back() {
        let db = db();
        let ada = db.create_user("ada", "ada@example.com").unwrap();

        let res: Result<()> = db.with_tx(|tx| {
            tx.execute("DELETE FROM users WHERE id = ?1", [ada.id.to_string()])?;
            Err(DbError::Corrupt("forced".into()))
        });
        assert!(res.is_err());
        assert!(fetch_user(&db, ada.id).is_some());
    }

    #[test]
    fn delete_user_is_all_or_nothing() {
        let db = db();
        let ada = db.create_user("ada", "ada@example.com").unwrap();
        let bob = db.create_user("bob", "bob@example.com").unwrap();
        db.add_friend(bob.id, ada.id).unwrap();
        let (thought, _) = db.create_thought("one", "ada", Some(ada.id)).unwrap();

        // thoughts and the user row go first; unfriending is the last step
        block_deletes_on(&db, "user_friends");

        let err = db.delete_user(ada.id).unwrap_err();
        assert!(matches!(err, DbError::Sqlite(_)), "{err:?}");

        assert_eq!(fetch_user(&db, ada.id).unwrap().thoughts, vec![thought.id]);
        assert_eq!(db.get_thought(thought.id).unwrap(), Some(thought));
        assert_eq!(fetch_user(&db, bob.id).unwrap().friends, vec![ada.id]);
    }

    #[test]
    fn delete_thought_is_all_or_nothing() {
        let db = db();
        let ada = db.create_user("ada", "ada@example.com").unwrap();
        let (thought, _) = db.create_thought("one", "ada", Some(ada.id)).unwrap();
        let thought = db
            .add_reaction(thought.id, Reaction::new("a".into(), "bob".into()))
            .unwrap();

        // unlinking from the owner runs after the thought row is gone
        block_deletes_on(&db, "user_thoughts");

        assert!(db.delete_thought(thought.id).is_err());
        assert_eq!(db.get_thought(thought.id).unwrap(), Some(thought.clone()));
        assert_eq!(fetch_user(&db, ada.id).unwrap().thoughts, vec![thought.id]);
    }

    #[test]
    fn detail_expands_one_level_and_skips_missing() {
        let db = db();
        let ada = db.create_user("ada", "ada@example.com").unwrap();
        let bob = db.create_user("bob", "bob@example.com").unwrap();
        db.add_friend(ada.id, bob.id).unwrap();
        db.add_friend(ada.id, Uuid::new_v4()).unwrap();
        let (thought, _) = db.create_thought("hello", "ada", Some(ada.id)).unwrap();

        let detail = db.get_user_detail(ada.id).unwrap().unwrap();
        assert_eq!(detail.thoughts, vec![thought]);
        assert_eq!(detail.friends.len(), 1);
        assert_eq!(detail.friends[0].id, bob.id);

        assert_eq!(db.list_user_details().unwrap().len(), 2);
        assert!(db.get_user_detail(Uuid::new_v4()).unwrap().is_none());
    }
}
