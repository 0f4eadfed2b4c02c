//! # Activity Repository
//!
//! The append-only audit trail. Entries are written with [`record`] on the
//! workflow's own transaction, so an entry exists if and only if the
//! mutation it describes was committed.

use chrono::{DateTime, Utc};
use saori_core::activity::{format_message, ActivityAction};
use saori_core::models::ActivityEntry;
use saori_core::{PageRequest, Pagination};
use serde_json::Value;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::new_id;

/// Default page size of the log viewer.
pub const DEFAULT_LOG_LIMIT: u32 = 20;

/// Appends one entry on the given connection (normally `&mut *tx`).
pub(crate) async fn record(
    conn: &mut SqliteConnection,
    user_id: &str,
    action: ActivityAction,
    entity: Option<&str>,
    entity_id: Option<&str>,
    details: Value,
) -> DbResult<()> {
    debug!(%action, ?entity_id, "Recording activity");

    let details = match details {
        Value::Null => None,
        other => Some(serde_json::to_string(&other)?),
    };

    sqlx::query(
        r#"
        INSERT INTO activity_logs (id, user_id, action, entity, entity_id, details, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(new_id())
    .bind(user_id)
    .bind(action.as_str())
    .bind(entity)
    .bind(entity_id)
    .bind(details)
    .bind(Utc::now())
    .execute(conn)
    .await?;

    Ok(())
}

#[derive(Debug, sqlx::FromRow)]
struct LogRow {
    id: String,
    action: String,
    entity: Option<String>,
    entity_id: Option<String>,
    details: Option<String>,
    user_name: String,
    created_at: DateTime<Utc>,
}

impl LogRow {
    fn into_entry(self) -> ActivityEntry {
        // Unparseable details still render through the generic message.
        let details = self
            .details
            .as_deref()
            .and_then(|d| serde_json::from_str(d).ok())
            .unwrap_or(Value::Null);
        let message = format_message(
            &self.action,
            &self.user_name,
            self.entity_id.as_deref(),
            &details,
        );
        ActivityEntry {
            id: self.id,
            message,
            action: self.action,
            entity: self.entity,
            entity_id: self.entity_id,
            user_name: self.user_name,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ActivityRepository {
    pool: SqlitePool,
}

impl ActivityRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ActivityRepository { pool }
    }

    /// Newest entries first, with the acting user's name and a rendered
    /// message.
    pub async fn list(&self, page: PageRequest) -> DbResult<(Vec<ActivityEntry>, Pagination)> {
        let rows: Vec<LogRow> = sqlx::query_as(
            r#"
            SELECT l.id, l.action, l.entity, l.entity_id, l.details,
                   u.name AS user_name, l.created_at
            FROM activity_logs l
            JOIN users u ON u.id = l.user_id
            ORDER BY l.created_at DESC, l.rowid DESC
            LIMIT ?1 OFFSET ?2
            "#,
        )
        .bind(page.limit as i64)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM activity_logs")
            .fetch_one(&self.pool)
            .await?;

        let entries = rows.into_iter().map(LogRow::into_entry).collect();
        Ok((entries, page.paginate(total)))
    }

    /// Records a login. Not part of any other workflow, so it gets its own
    /// statement.
    pub async fn record_login(&self, user_id: &str, user_agent: Option<&str>) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        record(
            &mut conn,
            user_id,
            ActivityAction::Login,
            Some("User"),
            Some(user_id),
            serde_json::json!({ "userAgent": user_agent }),
        )
        .await
    }

    /// Number of entries with `action`. Used by diagnostics and tests.
    pub async fn count_action(&self, action: ActivityAction) -> DbResult<i64> {
        let n = sqlx::query_scalar("SELECT COUNT(*) FROM activity_logs WHERE action = ?1")
            .bind(action.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }
}
