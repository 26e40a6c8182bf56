use std::str::FromStr;

use anyhow::Context;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use tracing::info;

const CREATE_USERS: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    )
"#;

const CREATE_MESSAGES: &str = r#"
    CREATE TABLE IF NOT EXISTS messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT,
        user_message TEXT,
        bot_response TEXT,
        timestamp DATETIME DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY(user_id) REFERENCES users(id)
    )
"#;

/// Handle to the SQLite database holding users and their message log.
///
/// Cheap to clone; every clone shares the same pool.
#[derive(Clone, Debug)]
pub struct ChatStore {
    pool: SqlitePool,
}

impl ChatStore {
    /// Open (or create) the database at `url`, e.g. `sqlite://chat.db`.
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("parse database url {}", url))?
            .create_if_missing(true)
            // `messages.user_id` may name a user that was never registered.
            .foreign_keys(false);
        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await
            .context("connect to database")?;
        Ok(Self { pool })
    }

    #[cfg(test)]
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create both tables if they do not exist yet. Safe to call repeatedly.
    pub async fn ensure_schema(&self) -> anyhow::Result<()> {
        sqlx::query(CREATE_USERS)
            .execute(&self.pool)
            .await
            .context("create users table")?;
        sqlx::query(CREATE_MESSAGES)
            .execute(&self.pool)
            .await
            .context("create messages table")?;
        info!("database schema ready");
        Ok(())
    }
}

/// Single-connection in-memory store with the schema applied.
///
/// An in-memory SQLite database lives only as long as its connection, so the
/// pool is pinned to one connection that never expires.
#[cfg(test)]
pub(crate) async fn test_store() -> ChatStore {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("in-memory url")
        .foreign_keys(false);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("in-memory sqlite");
    let store = ChatStore::from_pool(pool);
    store.ensure_schema().await.expect("schema");
    store
}
