//! # Schedule Repository
//!
//! Read access to schedules and their items. Schedules are authored and
//! approved by an external workflow; this engine only reads them for
//! conversion. Inserts exist for seeding and tests.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use adbook_core::{Schedule, ScheduleItem};

/// Repository for schedule database operations.
#[derive(Debug, Clone)]
pub struct ScheduleRepository {
    pool: SqlitePool,
}

impl ScheduleRepository {
    /// Creates a new ScheduleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ScheduleRepository { pool }
    }

    /// Gets a schedule by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Schedule>> {
        let schedule = sqlx::query_as::<_, Schedule>(
            r#"
            SELECT id, tenant_id, status, campaign_id, advertiser_id, agency_id,
                   net_amount_cents, created_at, updated_at
            FROM schedules
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(schedule)
    }

    /// Gets all items of a schedule in plan order.
    pub async fn items_for_schedule(&self, schedule_id: &str) -> DbResult<Vec<ScheduleItem>> {
        let items = sqlx::query_as::<_, ScheduleItem>(
            r#"
            SELECT id, schedule_id, show_id, episode_id, placement_type,
                   air_date, length_seconds, rate_cents, position, created_at
            FROM schedule_items
            WHERE schedule_id = ?1
            ORDER BY position, created_at
            "#,
        )
        .bind(schedule_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Inserts a schedule. Seeding/tests only - production schedules arrive
    /// through the external authoring workflow.
    pub async fn insert(&self, schedule: &Schedule) -> DbResult<()> {
        debug!(id = %schedule.id, "Inserting schedule");

        sqlx::query(
            r#"
            INSERT INTO schedules (
                id, tenant_id, status, campaign_id, advertiser_id, agency_id,
                net_amount_cents, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&schedule.id)
        .bind(&schedule.tenant_id)
        .bind(schedule.status)
        .bind(&schedule.campaign_id)
        .bind(&schedule.advertiser_id)
        .bind(schedule.agency_id.as_deref())
        .bind(schedule.net_amount_cents)
        .bind(schedule.created_at)
        .bind(schedule.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts a schedule item. Seeding/tests only.
    pub async fn insert_item(&self, item: &ScheduleItem) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO schedule_items (
                id, schedule_id, show_id, episode_id, placement_type,
                air_date, length_seconds, rate_cents, position, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&item.id)
        .bind(&item.schedule_id)
        .bind(item.show_id.as_deref())
        .bind(&item.episode_id)
        .bind(item.placement_type)
        .bind(&item.air_date)
        .bind(item.length_seconds)
        .bind(item.rate_cents)
        .bind(item.position)
        .bind(item.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use adbook_core::{PlacementType, ScheduleStatus, DEFAULT_TENANT_ID};
    use chrono::Utc;

    #[tokio::test]
    async fn test_schedule_roundtrip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.schedules();
        let now = Utc::now();

        let schedule = Schedule {
            id: "s-1".to_string(),
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            status: ScheduleStatus::Approved,
            campaign_id: "camp-1".to_string(),
            advertiser_id: "adv-1".to_string(),
            agency_id: Some("agency-1".to_string()),
            net_amount_cents: 7_500,
            created_at: now,
            updated_at: now,
        };
        repo.insert(&schedule).await.unwrap();

        repo.insert_item(&ScheduleItem {
            id: "si-1".to_string(),
            schedule_id: "s-1".to_string(),
            show_id: Some("show-1".to_string()),
            episode_id: "ep-1".to_string(),
            placement_type: PlacementType::PreRoll,
            air_date: "2026-09-01".to_string(),
            length_seconds: 30,
            rate_cents: 7_500,
            position: 0,
            created_at: now,
        })
        .await
        .unwrap();

        let fetched = repo.get_by_id("s-1").await.unwrap().unwrap();
        assert_eq!(fetched.status, ScheduleStatus::Approved);

        let items = repo.items_for_schedule("s-1").await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].placement_type, PlacementType::PreRoll);

        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }
}
