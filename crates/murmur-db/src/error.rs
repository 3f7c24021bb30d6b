use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    /// A unique column already holds the value; carries the column name.
    #[error("{0} is already taken")]
    Conflict(String),

    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("embedded document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("DB lock poisoned: {0}")]
    LockPoisoned(String),
}

impl DbError {
    /// Turns a unique-constraint failure into [`DbError::Conflict`], leaving
    /// every other error as-is.
    pub(crate) fn from_write(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(code, Some(msg)) = &err {
            if code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE {
                // "UNIQUE constraint failed: users.email"
                let column = msg.rsplit('.').next().unwrap_or(msg.as_str());
                return DbError::Conflict(column.to_string());
            }
        }
        DbError::Sqlite(err)
    }
}
