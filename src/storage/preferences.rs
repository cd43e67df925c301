use anyhow::Result;
use secrecy::{ExposeSecret, SecretString};

use super::schema::Database;

/// Preference key holding the saved service API key.
pub const API_KEY_PREF: &str = "session.api_key";

impl Database {
    // ========================================================================
    // User Preferences Operations
    // ========================================================================

    /// Get a single preference value by key, `None` if unset.
    ///
    /// Keys use a dotted convention such as `session.api_key`.
    pub async fn get_preference(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM user_preferences WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(value,)| value))
    }

    /// Insert or update a preference.
    pub async fn set_preference(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_preferences (key, value, updated_at)
            VALUES (?, ?, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Remove a preference. Returns whether it existed.
    pub async fn delete_preference(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM user_preferences WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // ========================================================================
    // API key
    // ========================================================================

    /// The saved API key. Blank values count as unset.
    pub async fn load_api_key(&self) -> Result<Option<SecretString>> {
        let value = self.get_preference(API_KEY_PREF).await?;
        Ok(value
            .filter(|v| !v.trim().is_empty())
            .map(SecretString::from))
    }

    pub async fn save_api_key(&self, key: &SecretString) -> Result<()> {
        self.set_preference(API_KEY_PREF, key.expose_secret()).await
    }

    pub async fn forget_api_key(&self) -> Result<bool> {
        self.delete_preference(API_KEY_PREF).await
    }
}
