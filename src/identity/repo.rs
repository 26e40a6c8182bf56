use anyhow::Context;

use crate::db::ChatStore;

impl ChatStore {
    /// Register a new anonymous user. `created_at` is filled in by the database.
    pub async fn create_user(&self, user_id: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id)
            VALUES (?1)
            "#,
        )
        .bind(user_id)
        .execute(self.pool())
        .await
        .context("insert user")?;
        Ok(())
    }
}
