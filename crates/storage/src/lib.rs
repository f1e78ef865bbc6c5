use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::domain::{FlashMessage, FlashSeverity, SessionId};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn touch_session(&self, session_id: &SessionId) -> Result<()> {
        sqlx::query(
            "INSERT INTO sessions (session_id) VALUES (?)
             ON CONFLICT(session_id) DO UPDATE SET last_seen_at = CURRENT_TIMESTAMP",
        )
        .bind(session_id.as_str())
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to touch session {session_id}"))?;
        Ok(())
    }

    /// Deletes sessions not seen since `cutoff`, together with their module data
    /// and pending flash messages. Returns the number of sessions removed.
    pub async fn purge_sessions_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE last_seen_at < ?")
            .bind(cutoff.format("%Y-%m-%d %H:%M:%S").to_string())
            .execute(&self.pool)
            .await
            .context("failed to purge stale sessions")?;
        Ok(result.rows_affected())
    }

    pub async fn load_module_data<T: DeserializeOwned>(
        &self,
        session_id: &SessionId,
        module_key: &str,
    ) -> Result<Option<T>> {
        let row = sqlx::query(
            "SELECT data_json FROM module_data WHERE session_id = ? AND module_key = ?",
        )
        .bind(session_id.as_str())
        .bind(module_key)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let raw: String = row.get(0);
        let data = serde_json::from_str(&raw)
            .with_context(|| format!("corrupt module data for '{module_key}' in session {session_id}"))?;
        Ok(Some(data))
    }

    pub async fn store_module_data<T: Serialize>(
        &self,
        session_id: &SessionId,
        module_key: &str,
        data: &T,
    ) -> Result<()> {
        let data_json = serde_json::to_string(data)?;
        self.touch_session(session_id).await?;
        sqlx::query(
            "INSERT INTO module_data (session_id, module_key, data_json, updated_at)
             VALUES (?, ?, ?, CURRENT_TIMESTAMP)
             ON CONFLICT(session_id, module_key)
             DO UPDATE SET data_json = excluded.data_json, updated_at = CURRENT_TIMESTAMP",
        )
        .bind(session_id.as_str())
        .bind(module_key)
        .bind(data_json)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to store module data for '{module_key}'"))?;
        Ok(())
    }

    pub async fn clear_module_data(&self, session_id: &SessionId, module_key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM module_data WHERE session_id = ? AND module_key = ?")
            .bind(session_id.as_str())
            .bind(module_key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn enqueue_flash_message(
        &self,
        session_id: &SessionId,
        queue_identifier: &str,
        message: &FlashMessage,
    ) -> Result<i64> {
        self.touch_session(session_id).await?;
        let rec = sqlx::query(
            "INSERT INTO flash_messages (session_id, queue_identifier, severity, title, message)
             VALUES (?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(session_id.as_str())
        .bind(queue_identifier)
        .bind(message.severity.as_str())
        .bind(&message.title)
        .bind(&message.message)
        .fetch_one(&self.pool)
        .await
        .context("failed to enqueue flash message")?;
        Ok(rec.get::<i64, _>(0))
    }

    /// Returns the queued messages in insertion order and removes them.
    pub async fn drain_flash_messages(
        &self,
        session_id: &SessionId,
        queue_identifier: &str,
    ) -> Result<Vec<FlashMessage>> {
        let mut rows = sqlx::query(
            "DELETE FROM flash_messages
             WHERE session_id = ? AND queue_identifier = ?
             RETURNING id, severity, title, message",
        )
        .bind(session_id.as_str())
        .bind(queue_identifier)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("failed to drain flash queue '{queue_identifier}'"))?;
        // RETURNING gives no ordering guarantee.
        rows.sort_by_key(|row| row.get::<i64, _>(0));

        Ok(rows
            .iter()
            .map(|row| {
                let severity: String = row.get(1);
                FlashMessage {
                    severity: FlashSeverity::parse(&severity).unwrap_or(FlashSeverity::Info),
                    title: row.get(2),
                    message: row.get(3),
                    store_in_session: true,
                }
            })
            .collect())
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
