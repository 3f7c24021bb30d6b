use rusqlite::Connection;
use tracing::info;

use crate::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                username    TEXT NOT NULL UNIQUE CHECK (length(username) > 0),
                email       TEXT NOT NULL UNIQUE CHECK (length(email) > 0)
            );

            -- Reactions are embedded: a JSON array owned by the thought row.
            CREATE TABLE thoughts (
                id              TEXT PRIMARY KEY,
                thought_text    TEXT NOT NULL CHECK (length(thought_text) BETWEEN 1 AND 280),
                username        TEXT NOT NULL,
                user_id         TEXT,
                reactions       TEXT NOT NULL DEFAULT '[]',
                created_at      TEXT NOT NULL
            );

            CREATE INDEX idx_thoughts_user ON thoughts(user_id);

            -- Ordered reference collections. `seq` keeps insertion order.
            CREATE TABLE user_thoughts (
                seq         INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                thought_id  TEXT NOT NULL,
                UNIQUE(user_id, thought_id)
            );

            CREATE INDEX idx_user_thoughts_thought ON user_thoughts(thought_id);

            CREATE TABLE user_friends (
                seq         INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                friend_id   TEXT NOT NULL,
                UNIQUE(user_id, friend_id)
            );

            CREATE INDEX idx_user_friends_friend ON user_friends(friend_id);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
