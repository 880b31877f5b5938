//! # Inventory Ledger
//!
//! Owns the per-slot counters and the atomic hold/confirm/release
//! primitives. No dependencies on other repositories.
//!
//! ## The Counter Triple
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              Slot Counter Lifecycle (capacity = 3)                      │
//! │                                                                         │
//! │   provision          create_holds        confirm_holds                  │
//! │  ┌───────────┐      ┌───────────┐       ┌───────────┐                  │
//! │  │ avail = 3 │ ───► │ avail = 2 │ ────► │ avail = 2 │                  │
//! │  │ resv  = 0 │      │ resv  = 1 │       │ resv  = 0 │                  │
//! │  │ book  = 0 │      │ book  = 0 │       │ book  = 1 │                  │
//! │  └───────────┘      └───────────┘       └───────────┘                  │
//! │                           │                                             │
//! │                           │ release_holds (rejection)                   │
//! │                           ▼                                             │
//! │                     ┌───────────┐                                       │
//! │                     │ avail = 3 │   back where we started               │
//! │                     │ resv  = 0 │                                       │
//! │                     │ book  = 0 │                                       │
//! │                     └───────────┘                                       │
//! │                                                                         │
//! │  INVARIANT: available + reserved + booked == capacity, always.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//! The check-and-decrement is a single conditional UPDATE per slot
//! (`... AND available >= n`), so the check and the mutation are one
//! statement under SQLite's writer lock. Two concurrent claims on the last
//! unit resolve to exactly one winner: the loser's UPDATE matches zero rows
//! and the whole batch rolls back. Never a read-then-write at the
//! application layer.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use adbook_core::{
    HoldApprovalStatus, HoldRequest, HoldStatus, PlacementType, Reservation, Slot, SlotShortage,
};

/// Result of a hold batch: either every item got its unit, or none did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HoldOutcome {
    /// All holds created; count equals the number of requested items.
    Created(u32),
    /// One or more slots lacked capacity. Zero side effects happened;
    /// every short slot is listed with its pre-batch availability.
    Unavailable(Vec<SlotShortage>),
}

/// Repository owning the slot counters and reservations.
#[derive(Debug, Clone)]
pub struct InventoryLedger {
    pool: SqlitePool,
}

impl InventoryLedger {
    /// Creates a new InventoryLedger.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryLedger { pool }
    }

    // =========================================================================
    // Provisioning & Reads
    // =========================================================================

    /// Creates a slot with the given capacity, fully available.
    ///
    /// Capacity is given, not computed: it is fixed at episode creation and
    /// this engine never resizes it. Existing slots are left untouched.
    pub async fn provision_slot(
        &self,
        episode_id: &str,
        placement_type: PlacementType,
        capacity: i64,
    ) -> DbResult<()> {
        debug!(episode_id = %episode_id, placement = %placement_type, capacity, "Provisioning slot");

        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO episode_slots (
                episode_id, placement_type, capacity, available, reserved, booked, updated_at
            ) VALUES (?1, ?2, ?3, ?3, 0, 0, ?4)
            ON CONFLICT (episode_id, placement_type) DO NOTHING
            "#,
        )
        .bind(episode_id)
        .bind(placement_type)
        .bind(capacity)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a slot's counters.
    pub async fn get_slot(
        &self,
        episode_id: &str,
        placement_type: PlacementType,
    ) -> DbResult<Option<Slot>> {
        let slot = sqlx::query_as::<_, Slot>(
            r#"
            SELECT episode_id, placement_type, capacity, available, reserved, booked, updated_at
            FROM episode_slots
            WHERE episode_id = ?1 AND placement_type = ?2
            "#,
        )
        .bind(episode_id)
        .bind(placement_type)
        .fetch_optional(&self.pool)
        .await?;

        Ok(slot)
    }

    /// Gets all reservations belonging to an order, oldest first.
    pub async fn holds_for_order(&self, order_id: &str) -> DbResult<Vec<Reservation>> {
        let holds = sqlx::query_as::<_, Reservation>(
            r#"
            SELECT id, order_id, episode_id, placement_type, status, approval_status,
                   rejection_reason, approved_by, approved_at, created_at, updated_at
            FROM reservations
            WHERE order_id = ?1
            ORDER BY created_at
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(holds)
    }

    // =========================================================================
    // CreateHolds
    // =========================================================================

    /// Atomically claims one unit per requested item for the order.
    ///
    /// ## All-or-Nothing
    /// Requests are aggregated per slot and each slot must pass
    /// `available >= n` for its aggregate. If ANY slot fails, the
    /// transaction aborts with zero side effects - no partial holds, no
    /// partial counter mutation - and the outcome lists every short slot
    /// with its requested count and its pre-batch availability.
    ///
    /// ## Concurrency
    /// The decrement is conditional inside the UPDATE itself, so concurrent
    /// batches contending on the same slot serialize on the database writer
    /// lock; exactly one claims the last unit.
    pub async fn create_holds(
        &self,
        order_id: &str,
        items: &[HoldRequest],
    ) -> DbResult<HoldOutcome> {
        debug!(order_id = %order_id, items = items.len(), "Creating holds");

        // Aggregate per slot, preserving first-seen order. One UPDATE per
        // slot means a failed slot's row is never touched by this batch, so
        // the shortage probe below reads its true pre-batch availability.
        let mut grouped: Vec<(&HoldRequest, i64)> = Vec::new();
        for item in items {
            match grouped.iter_mut().find(|(req, _)| {
                req.episode_id == item.episode_id && req.placement_type == item.placement_type
            }) {
                Some((_, n)) => *n += 1,
                None => grouped.push((item, 1)),
            }
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let mut shortages: Vec<SlotShortage> = Vec::new();

        // Phase 1: conditional decrement per slot. A failed decrement does
        // not abort the loop - we keep probing so the caller learns about
        // every short slot in one round trip.
        for (slot, requested) in &grouped {
            let result = sqlx::query(
                r#"
                UPDATE episode_slots SET
                    available = available - ?3,
                    reserved = reserved + ?3,
                    updated_at = ?4
                WHERE episode_id = ?1 AND placement_type = ?2 AND available >= ?3
                "#,
            )
            .bind(&slot.episode_id)
            .bind(slot.placement_type)
            .bind(*requested)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                // Missing slot row counts as zero availability.
                let available: Option<i64> = sqlx::query_scalar(
                    r#"
                    SELECT available FROM episode_slots
                    WHERE episode_id = ?1 AND placement_type = ?2
                    "#,
                )
                .bind(&slot.episode_id)
                .bind(slot.placement_type)
                .fetch_optional(&mut *tx)
                .await?;

                shortages.push(SlotShortage {
                    episode_id: slot.episode_id.clone(),
                    placement_type: slot.placement_type,
                    requested: *requested,
                    available: available.unwrap_or(0),
                });
            }
        }

        if !shortages.is_empty() {
            tx.rollback().await?;
            debug!(order_id = %order_id, short = shortages.len(), "Hold batch unavailable, rolled back");
            return Ok(HoldOutcome::Unavailable(shortages));
        }

        // Phase 2: every decrement applied, insert the reservation rows in
        // the same transaction.
        for item in items {
            sqlx::query(
                r#"
                INSERT INTO reservations (
                    id, order_id, episode_id, placement_type,
                    status, approval_status, rejection_reason,
                    approved_by, approved_at, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, NULL, NULL, ?7, ?7)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(order_id)
            .bind(&item.episode_id)
            .bind(item.placement_type)
            .bind(HoldStatus::Reserved)
            .bind(HoldApprovalStatus::Pending)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!(order_id = %order_id, holds = items.len(), "Holds created");
        Ok(HoldOutcome::Created(items.len() as u32))
    }

    // =========================================================================
    // ConfirmHolds
    // =========================================================================

    /// Converts every reserved hold of the order into a booking:
    /// reserved−1, booked+1, reservation → confirmed.
    ///
    /// One transaction per order. Idempotent: an order with no reserved
    /// holds left is a no-op, not an error.
    pub async fn confirm_holds(&self, order_id: &str, approved_by: &str) -> DbResult<u32> {
        let mut tx = self.pool.begin().await?;
        let confirmed = Self::confirm_holds_with(&mut tx, order_id, approved_by).await?;
        tx.commit().await?;
        Ok(confirmed)
    }

    /// Transaction-participating form of [`Self::confirm_holds`], used by
    /// the approval state machine to keep order status and counters in one
    /// commit.
    pub async fn confirm_holds_with(
        conn: &mut SqliteConnection,
        order_id: &str,
        approved_by: &str,
    ) -> DbResult<u32> {
        let now = Utc::now();

        let reserved = reserved_holds(conn, order_id).await?;

        for hold in &reserved {
            sqlx::query(
                r#"
                UPDATE episode_slots SET
                    reserved = reserved - 1,
                    booked = booked + 1,
                    updated_at = ?3
                WHERE episode_id = ?1 AND placement_type = ?2
                "#,
            )
            .bind(&hold.episode_id)
            .bind(hold.placement_type)
            .bind(now)
            .execute(&mut *conn)
            .await?;

            sqlx::query(
                r#"
                UPDATE reservations SET
                    status = ?2,
                    approval_status = ?3,
                    approved_by = ?4,
                    approved_at = ?5,
                    updated_at = ?5
                WHERE id = ?1
                "#,
            )
            .bind(&hold.id)
            .bind(HoldStatus::Confirmed)
            .bind(HoldApprovalStatus::Approved)
            .bind(approved_by)
            .bind(now)
            .execute(&mut *conn)
            .await?;
        }

        debug!(order_id = %order_id, confirmed = reserved.len(), "Holds confirmed");
        Ok(reserved.len() as u32)
    }

    // =========================================================================
    // ReleaseHolds
    // =========================================================================

    /// Returns every reserved hold of the order to availability:
    /// reserved−1, available+1, reservation → released with the reason.
    ///
    /// Same atomicity and idempotence as [`Self::confirm_holds`].
    pub async fn release_holds(&self, order_id: &str, reason: &str) -> DbResult<u32> {
        let mut tx = self.pool.begin().await?;
        let released = Self::release_holds_with(&mut tx, order_id, reason).await?;
        tx.commit().await?;
        Ok(released)
    }

    /// Transaction-participating form of [`Self::release_holds`].
    pub async fn release_holds_with(
        conn: &mut SqliteConnection,
        order_id: &str,
        reason: &str,
    ) -> DbResult<u32> {
        let now = Utc::now();

        let reserved = reserved_holds(conn, order_id).await?;

        for hold in &reserved {
            sqlx::query(
                r#"
                UPDATE episode_slots SET
                    reserved = reserved - 1,
                    available = available + 1,
                    updated_at = ?3
                WHERE episode_id = ?1 AND placement_type = ?2
                "#,
            )
            .bind(&hold.episode_id)
            .bind(hold.placement_type)
            .bind(now)
            .execute(&mut *conn)
            .await?;

            sqlx::query(
                r#"
                UPDATE reservations SET
                    status = ?2,
                    approval_status = ?3,
                    rejection_reason = ?4,
                    updated_at = ?5
                WHERE id = ?1
                "#,
            )
            .bind(&hold.id)
            .bind(HoldStatus::Released)
            .bind(HoldApprovalStatus::Rejected)
            .bind(reason)
            .bind(now)
            .execute(&mut *conn)
            .await?;
        }

        debug!(order_id = %order_id, released = reserved.len(), "Holds released");
        Ok(reserved.len() as u32)
    }
}

/// Reserved holds of an order, fetched inside the caller's transaction.
async fn reserved_holds(
    conn: &mut SqliteConnection,
    order_id: &str,
) -> DbResult<Vec<Reservation>> {
    let holds = sqlx::query_as::<_, Reservation>(
        r#"
        SELECT id, order_id, episode_id, placement_type, status, approval_status,
               rejection_reason, approved_by, approved_at, created_at, updated_at
        FROM reservations
        WHERE order_id = ?1 AND status = ?2
        ORDER BY created_at
        "#,
    )
    .bind(order_id)
    .bind(HoldStatus::Reserved)
    .fetch_all(&mut *conn)
    .await?;

    Ok(holds)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use adbook_core::{Order, OrderStatus, DEFAULT_TENANT_ID};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// Reservations reference orders, so every ledger test needs a parent
    /// order row.
    async fn draft_order(db: &Database, id: &str) -> Order {
        let now = Utc::now();
        let order = Order {
            id: id.to_string(),
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            order_number: format!("IO-TEST-{id}"),
            schedule_id: None,
            campaign_id: "camp-1".to_string(),
            advertiser_id: "adv-1".to_string(),
            agency_id: None,
            status: OrderStatus::Draft,
            total_amount_cents: 0,
            net_amount_cents: 0,
            requires_client_approval: false,
            submitted_at: None,
            submitted_by: None,
            approved_at: None,
            approved_by: None,
            client_approved_at: None,
            client_approved_by: None,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        db.orders().insert_draft(&order).await.unwrap();
        order
    }

    fn hold(episode_id: &str, placement: PlacementType) -> HoldRequest {
        HoldRequest {
            episode_id: episode_id.to_string(),
            placement_type: placement,
        }
    }

    async fn assert_consistent(db: &Database, episode_id: &str, placement: PlacementType) -> Slot {
        let slot = db
            .inventory()
            .get_slot(episode_id, placement)
            .await
            .unwrap()
            .unwrap();
        assert!(slot.is_consistent(), "invariant broken: {slot:?}");
        slot
    }

    #[tokio::test]
    async fn test_create_holds_decrements_counters() {
        let db = test_db().await;
        let ledger = db.inventory();
        ledger
            .provision_slot("ep-1", PlacementType::PreRoll, 3)
            .await
            .unwrap();
        draft_order(&db, "o-1").await;

        let outcome = ledger
            .create_holds("o-1", &[hold("ep-1", PlacementType::PreRoll)])
            .await
            .unwrap();
        assert_eq!(outcome, HoldOutcome::Created(1));

        let slot = assert_consistent(&db, "ep-1", PlacementType::PreRoll).await;
        assert_eq!((slot.available, slot.reserved, slot.booked), (2, 1, 0));

        let holds = ledger.holds_for_order("o-1").await.unwrap();
        assert_eq!(holds.len(), 1);
        assert_eq!(holds[0].status, HoldStatus::Reserved);
        assert_eq!(holds[0].approval_status, HoldApprovalStatus::Pending);
    }

    #[tokio::test]
    async fn test_failed_batch_has_zero_side_effects() {
        let db = test_db().await;
        let ledger = db.inventory();
        ledger
            .provision_slot("ep-1", PlacementType::PreRoll, 3)
            .await
            .unwrap();
        ledger
            .provision_slot("ep-2", PlacementType::MidRoll, 0)
            .await
            .unwrap();
        draft_order(&db, "o-1").await;

        let outcome = ledger
            .create_holds(
                "o-1",
                &[
                    hold("ep-1", PlacementType::PreRoll),
                    hold("ep-2", PlacementType::MidRoll),
                ],
            )
            .await
            .unwrap();

        match outcome {
            HoldOutcome::Unavailable(shortages) => {
                assert_eq!(shortages.len(), 1);
                assert_eq!(shortages[0].episode_id, "ep-2");
                assert_eq!(shortages[0].placement_type, PlacementType::MidRoll);
                assert_eq!(shortages[0].requested, 1);
                assert_eq!(shortages[0].available, 0);
            }
            other => panic!("expected Unavailable, got {other:?}"),
        }

        // ep-1 passed its check inside the aborted batch; its counters must
        // be exactly as provisioned.
        let slot = assert_consistent(&db, "ep-1", PlacementType::PreRoll).await;
        assert_eq!((slot.available, slot.reserved, slot.booked), (3, 0, 0));
        assert!(ledger.holds_for_order("o-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_slot_requests_report_pre_batch_availability() {
        let db = test_db().await;
        let ledger = db.inventory();
        ledger
            .provision_slot("ep-1", PlacementType::MidRoll, 1)
            .await
            .unwrap();
        draft_order(&db, "o-1").await;

        // Two items on the same slot with one unit left: the shortage must
        // say "asked for 2, had 1", not the post-decrement zero.
        let outcome = ledger
            .create_holds(
                "o-1",
                &[
                    hold("ep-1", PlacementType::MidRoll),
                    hold("ep-1", PlacementType::MidRoll),
                ],
            )
            .await
            .unwrap();

        match outcome {
            HoldOutcome::Unavailable(shortages) => {
                assert_eq!(shortages.len(), 1);
                assert_eq!(shortages[0].requested, 2);
                assert_eq!(shortages[0].available, 1);
            }
            other => panic!("expected Unavailable, got {other:?}"),
        }

        let slot = assert_consistent(&db, "ep-1", PlacementType::MidRoll).await;
        assert_eq!((slot.available, slot.reserved, slot.booked), (1, 0, 0));
        assert!(ledger.holds_for_order("o-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_slot_reported_as_zero_availability() {
        let db = test_db().await;
        draft_order(&db, "o-1").await;

        let outcome = db
            .inventory()
            .create_holds("o-1", &[hold("ep-nowhere", PlacementType::PostRoll)])
            .await
            .unwrap();

        match outcome {
            HoldOutcome::Unavailable(shortages) => {
                assert_eq!(shortages[0].available, 0);
            }
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_confirm_moves_reserved_to_booked() {
        let db = test_db().await;
        let ledger = db.inventory();
        ledger
            .provision_slot("ep-1", PlacementType::PreRoll, 2)
            .await
            .unwrap();
        draft_order(&db, "o-1").await;
        ledger
            .create_holds("o-1", &[hold("ep-1", PlacementType::PreRoll)])
            .await
            .unwrap();

        let confirmed = ledger.confirm_holds("o-1", "admin").await.unwrap();
        assert_eq!(confirmed, 1);

        let slot = assert_consistent(&db, "ep-1", PlacementType::PreRoll).await;
        assert_eq!((slot.available, slot.reserved, slot.booked), (1, 0, 1));

        let holds = ledger.holds_for_order("o-1").await.unwrap();
        assert_eq!(holds[0].status, HoldStatus::Confirmed);
        assert_eq!(holds[0].approved_by.as_deref(), Some("admin"));

        // Idempotent: confirming again is a no-op, not an error.
        let again = ledger.confirm_holds("o-1", "admin").await.unwrap();
        assert_eq!(again, 0);
        let slot = assert_consistent(&db, "ep-1", PlacementType::PreRoll).await;
        assert_eq!((slot.available, slot.reserved, slot.booked), (1, 0, 1));
    }

    #[tokio::test]
    async fn test_release_restores_availability() {
        let db = test_db().await;
        let ledger = db.inventory();
        ledger
            .provision_slot("ep-1", PlacementType::MidRoll, 2)
            .await
            .unwrap();
        draft_order(&db, "o-1").await;
        ledger
            .create_holds(
                "o-1",
                &[
                    hold("ep-1", PlacementType::MidRoll),
                    hold("ep-1", PlacementType::MidRoll),
                ],
            )
            .await
            .unwrap();

        let released = ledger.release_holds("o-1", "Budget exceeded").await.unwrap();
        assert_eq!(released, 2);

        // Round-trip: availability is back at its pre-reservation value.
        let slot = assert_consistent(&db, "ep-1", PlacementType::MidRoll).await;
        assert_eq!((slot.available, slot.reserved, slot.booked), (2, 0, 0));

        let holds = ledger.holds_for_order("o-1").await.unwrap();
        for h in &holds {
            assert_eq!(h.status, HoldStatus::Released);
            assert_eq!(h.rejection_reason.as_deref(), Some("Budget exceeded"));
        }

        // Idempotent.
        assert_eq!(ledger.release_holds("o-1", "again").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_provision_is_insert_only() {
        let db = test_db().await;
        let ledger = db.inventory();
        ledger
            .provision_slot("ep-1", PlacementType::PreRoll, 3)
            .await
            .unwrap();
        draft_order(&db, "o-1").await;
        ledger
            .create_holds("o-1", &[hold("ep-1", PlacementType::PreRoll)])
            .await
            .unwrap();

        // Re-provisioning must not reset live counters.
        ledger
            .provision_slot("ep-1", PlacementType::PreRoll, 10)
            .await
            .unwrap();
        let slot = assert_consistent(&db, "ep-1", PlacementType::PreRoll).await;
        assert_eq!(slot.capacity, 3);
        assert_eq!((slot.available, slot.reserved), (2, 1));
    }
}
