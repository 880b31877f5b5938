//! # Order Repository
//!
//! Database operations for orders and order items.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. PLACEHOLDER                                                         │
//! │     └── insert_draft() → Order { status: Draft }                        │
//! │         (deleted again if the hold batch fails)                         │
//! │                                                                         │
//! │  2. LINE ITEMS                                                          │
//! │     └── insert_item() × N  (snapshots of the schedule items)            │
//! │                                                                         │
//! │  3. SUBMIT                                                              │
//! │     └── submit() → Order { status: PendingApproval, submitted_at/by }   │
//! │                                                                         │
//! │  4. DECIDE (approval state machine, single transaction)                 │
//! │     ├── record_internal_approval_with() / record_client_approval_with() │
//! │     ├── finalize_with() → Approved, items → Confirmed                   │
//! │     └── reject_with()   → Rejected, reason appended to notes            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use adbook_core::{Order, OrderItem, OrderItemStatus, OrderStatus};

const ORDER_COLUMNS: &str = r#"
    id, tenant_id, order_number, schedule_id, campaign_id, advertiser_id, agency_id,
    status, total_amount_cents, net_amount_cents, requires_client_approval,
    submitted_at, submitted_by, approved_at, approved_by,
    client_approved_at, client_approved_by, notes, created_at, updated_at
"#;

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Gets an order by its schedule reference, if one exists.
    pub async fn get_by_schedule(&self, schedule_id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE schedule_id = ?1"
        ))
        .bind(schedule_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Inserts the draft placeholder row.
    ///
    /// The UNIQUE index on schedule_id fires here when another conversion
    /// for the same schedule already inserted - the caller maps that to
    /// Conflict.
    pub async fn insert_draft(&self, order: &Order) -> DbResult<()> {
        debug!(id = %order.id, order_number = %order.order_number, "Inserting draft order");

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, tenant_id, order_number, schedule_id, campaign_id, advertiser_id, agency_id,
                status, total_amount_cents, net_amount_cents, requires_client_approval,
                submitted_at, submitted_by, approved_at, approved_by,
                client_approved_at, client_approved_by, notes, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7,
                ?8, ?9, ?10, ?11,
                ?12, ?13, ?14, ?15,
                ?16, ?17, ?18, ?19, ?20
            )
            "#,
        )
        .bind(&order.id)
        .bind(&order.tenant_id)
        .bind(&order.order_number)
        .bind(&order.schedule_id)
        .bind(&order.campaign_id)
        .bind(&order.advertiser_id)
        .bind(&order.agency_id)
        .bind(order.status)
        .bind(order.total_amount_cents)
        .bind(order.net_amount_cents)
        .bind(order.requires_client_approval)
        .bind(order.submitted_at)
        .bind(order.submitted_by.as_deref())
        .bind(order.approved_at)
        .bind(order.approved_by.as_deref())
        .bind(order.client_approved_at)
        .bind(order.client_approved_by.as_deref())
        .bind(order.notes.as_deref())
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Deletes an order row. Compensating rollback only: the cascade takes
    /// any items and reservations with it, which is exactly the "nothing
    /// persists" guarantee a failed conversion needs.
    pub async fn delete(&self, order_id: &str) -> DbResult<()> {
        debug!(order_id = %order_id, "Deleting order (compensating rollback)");

        sqlx::query("DELETE FROM orders WHERE id = ?1")
            .bind(order_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Adds a line item to an order.
    ///
    /// ## Snapshot Pattern
    /// Episode/placement/rate are copied from the schedule item so that
    /// later schedule edits never rewrite order history.
    pub async fn insert_item(&self, item: &OrderItem) -> DbResult<()> {
        debug!(order_id = %item.order_id, episode_id = %item.episode_id, "Adding order item");

        sqlx::query(
            r#"
            INSERT INTO order_items (
                id, order_id, show_id, episode_id, placement_type,
                air_date, length_seconds, rate_cents, status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&item.id)
        .bind(&item.order_id)
        .bind(item.show_id.as_deref())
        .bind(&item.episode_id)
        .bind(item.placement_type)
        .bind(&item.air_date)
        .bind(item.length_seconds)
        .bind(item.rate_cents)
        .bind(item.status)
        .bind(item.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets all items for an order.
    pub async fn items_for_order(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT id, order_id, show_id, episode_id, placement_type,
                   air_date, length_seconds, rate_cents, status, created_at
            FROM order_items
            WHERE order_id = ?1
            ORDER BY created_at
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Promotes the draft placeholder to PendingApproval with submission
    /// metadata. Fails NotFound if the order is not a draft anymore.
    pub async fn submit(
        &self,
        order_id: &str,
        submitted_by: &str,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = ?2,
                submitted_at = ?3,
                submitted_by = ?4,
                updated_at = ?3
            WHERE id = ?1 AND status = ?5
            "#,
        )
        .bind(order_id)
        .bind(OrderStatus::PendingApproval)
        .bind(now)
        .bind(submitted_by)
        .bind(OrderStatus::Draft)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order (draft)", order_id));
        }

        Ok(())
    }

    // =========================================================================
    // Approval mutations (transaction-participating)
    // =========================================================================
    // These run inside the approval state machine's transaction so that the
    // order status, item statuses and slot counters move in one commit.

    /// Records the internal approval timestamp/actor.
    pub async fn record_internal_approval_with(
        conn: &mut SqliteConnection,
        order_id: &str,
        approved_by: &str,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                approved_at = ?2,
                approved_by = ?3,
                updated_at = ?2
            WHERE id = ?1 AND status = ?4
            "#,
        )
        .bind(order_id)
        .bind(now)
        .bind(approved_by)
        .bind(OrderStatus::PendingApproval)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order (pending approval)", order_id));
        }

        Ok(())
    }

    /// Records the client approval timestamp/actor.
    pub async fn record_client_approval_with(
        conn: &mut SqliteConnection,
        order_id: &str,
        approved_by: &str,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                client_approved_at = ?2,
                client_approved_by = ?3,
                updated_at = ?2
            WHERE id = ?1 AND status = ?4
            "#,
        )
        .bind(order_id)
        .bind(now)
        .bind(approved_by)
        .bind(OrderStatus::PendingApproval)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order (pending approval)", order_id));
        }

        Ok(())
    }

    /// Finalizes the order if, and only if, its approval set is complete:
    /// status → Approved and every line item → Confirmed. Returns whether
    /// it fired; runs with the hold confirmation in the same transaction.
    ///
    /// Completeness lives in the WHERE clause, not in the caller's snapshot:
    /// two concurrent approvals on different tracks serialize on the writer
    /// lock, and whichever records second sees both timestamps here. A
    /// read-then-act version would let both commit without finalizing.
    pub async fn finalize_with(
        conn: &mut SqliteConnection,
        order_id: &str,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = ?2,
                updated_at = ?3
            WHERE id = ?1 AND status = ?4
              AND approved_at IS NOT NULL
              AND (requires_client_approval = 0 OR client_approved_at IS NOT NULL)
            "#,
        )
        .bind(order_id)
        .bind(OrderStatus::Approved)
        .bind(now)
        .bind(OrderStatus::PendingApproval)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        sqlx::query("UPDATE order_items SET status = ?2 WHERE order_id = ?1")
            .bind(order_id)
            .bind(OrderItemStatus::Confirmed)
            .execute(conn)
            .await?;

        Ok(true)
    }

    /// Rejects the order: status → Rejected, reason appended to the notes.
    /// Runs with the hold release in the same transaction.
    pub async fn reject_with(
        conn: &mut SqliteConnection,
        order_id: &str,
        reason: &str,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = ?2,
                notes = CASE
                    WHEN notes IS NULL OR notes = '' THEN ?3
                    ELSE notes || char(10) || ?3
                END,
                updated_at = ?4
            WHERE id = ?1 AND status = ?5
            "#,
        )
        .bind(order_id)
        .bind(OrderStatus::Rejected)
        .bind(reason)
        .bind(now)
        .bind(OrderStatus::PendingApproval)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order (pending approval)", order_id));
        }

        Ok(())
    }
}

/// Generates an order number in format: IO-YYYYMMDD-XXXXXX
///
/// ## Format
/// - IO: insertion order prefix
/// - YYYYMMDD: submission date
/// - XXXXXX: random hex suffix (collision-safe without a daily counter;
///   the UNIQUE constraint is the backstop)
///
/// ## Example
/// `IO-20260823-4F2A1C`
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let date_part = now.format("%Y%m%d");
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(6)
        .collect::<String>()
        .to_uppercase();

    format!("IO-{date_part}-{suffix}")
}

/// Generates a new order item ID.
pub fn generate_order_item_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
