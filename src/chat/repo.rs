use anyhow::Context;
use sqlx::{sqlite::SqliteRow, Row};
use time::PrimitiveDateTime;
use tracing::warn;

use super::dto::HistoryEntry;
use crate::db::ChatStore;

fn decode_entry(row: &SqliteRow) -> Result<HistoryEntry, sqlx::Error> {
    let timestamp: PrimitiveDateTime = row.try_get("timestamp")?;
    Ok(HistoryEntry {
        user_message: row.try_get("user_message")?,
        bot_response: row.try_get("bot_response")?,
        // CURRENT_TIMESTAMP is UTC.
        timestamp: timestamp.assume_utc(),
    })
}

impl ChatStore {
    /// Append one exchange to the log. `timestamp` is filled in by the database.
    pub async fn append_message(
        &self,
        user_id: &str,
        user_message: &str,
        bot_response: &str,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO messages (user_id, user_message, bot_response)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(user_id)
        .bind(user_message)
        .bind(bot_response)
        .execute(self.pool())
        .await
        .context("insert message")?;
        Ok(())
    }

    /// All exchanges of a user, oldest first. Rows that fail to decode are skipped.
    pub async fn history(&self, user_id: &str) -> anyhow::Result<Vec<HistoryEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_message, bot_response, timestamp
              FROM messages
             WHERE user_id = ?1
             ORDER BY timestamp ASC, id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await
        .context("list messages by user")?;

        let entries = rows
            .iter()
            .filter_map(|row| match decode_entry(row) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    let id: Option<i64> = row.try_get("id").ok();
                    warn!(error = %e, message_id = ?id, "skipping undecodable message row");
                    None
                }
            })
            .collect();
        Ok(entries)
    }
}
