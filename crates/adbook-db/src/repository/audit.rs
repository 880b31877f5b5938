//! # Change Log Repository
//!
//! Append-only audit trail. Every state transition writes one entry;
//! control flow never reads them back - the list methods exist for
//! inspection and tests.

use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use adbook_core::ChangeLogEntry;

/// Repository for the append-only change log.
#[derive(Debug, Clone)]
pub struct ChangeLogRepository {
    pool: SqlitePool,
}

impl ChangeLogRepository {
    /// Creates a new ChangeLogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ChangeLogRepository { pool }
    }

    /// Appends one entry. Never updates, never deletes.
    pub async fn append(&self, entry: &ChangeLogEntry) -> DbResult<()> {
        debug!(
            subject_id = %entry.subject_id,
            change_type = %entry.change_type,
            "Appending change log entry"
        );

        sqlx::query(
            r#"
            INSERT INTO change_log (
                id, subject_id, change_type, previous_value, new_value,
                affected_order_ids, actor, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.subject_id)
        .bind(&entry.change_type)
        .bind(entry.previous_value.as_deref())
        .bind(entry.new_value.as_deref())
        .bind(&entry.affected_order_ids)
        .bind(&entry.actor)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// All entries for a subject, oldest first.
    pub async fn list_for_subject(&self, subject_id: &str) -> DbResult<Vec<ChangeLogEntry>> {
        let entries = sqlx::query_as::<_, ChangeLogEntry>(
            r#"
            SELECT id, subject_id, change_type, previous_value, new_value,
                   affected_order_ids, actor, created_at
            FROM change_log
            WHERE subject_id = ?1
            ORDER BY created_at
            "#,
        )
        .bind(subject_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}

/// Builds a change log entry with JSON snapshots of the previous and new
/// values. Serialization failures degrade to `null` snapshots - the audit
/// sink must never block a state transition.
pub fn build_entry<P: Serialize, N: Serialize>(
    subject_id: &str,
    change_type: &str,
    previous: Option<&P>,
    new: Option<&N>,
    affected_order_ids: &[&str],
    actor: &str,
) -> ChangeLogEntry {
    ChangeLogEntry {
        id: Uuid::new_v4().to_string(),
        subject_id: subject_id.to_string(),
        change_type: change_type.to_string(),
        previous_value: previous.and_then(|p| serde_json::to_string(p).ok()),
        new_value: new.and_then(|n| serde_json::to_string(n).ok()),
        affected_order_ids: serde_json::to_string(affected_order_ids)
            .unwrap_or_else(|_| "[]".to_string()),
        actor: actor.to_string(),
        created_at: Utc::now(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use adbook_core::OrderStatus;

    #[tokio::test]
    async fn test_append_and_list() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.change_log();

        let entry = build_entry(
            "o-1",
            "order_status_changed",
            Some(&OrderStatus::PendingApproval),
            Some(&OrderStatus::Approved),
            &["o-1"],
            "admin",
        );
        repo.append(&entry).await.unwrap();

        let entries = repo.list_for_subject("o-1").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].change_type, "order_status_changed");
        assert_eq!(entries[0].previous_value.as_deref(), Some("\"pending_approval\""));
        assert_eq!(entries[0].new_value.as_deref(), Some("\"approved\""));
        assert_eq!(entries[0].affected_order_ids, "[\"o-1\"]");
    }
}
