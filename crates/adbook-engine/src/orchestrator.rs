//! # Order Orchestrator
//!
//! Converts an approved schedule into a submitted insertion order with
//! atomic inventory holds.
//!
//! ## Conversion Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              create_order_from_schedule                                 │
//! │                                                                         │
//! │  1. VALIDATE      request ids, schedule exists + Approved, items ok    │
//! │  2. DRAFT         insert placeholder order row                         │
//! │                   └── UNIQUE(schedule_id) loses the race here →        │
//! │                       Conflict, zero side effects                      │
//! │  3. HOLDS         ledger.create_holds() - all-or-nothing batch         │
//! │                   └── Unavailable → delete draft → Unavailable error   │
//! │  4. LINE ITEMS    snapshot schedule items onto the order               │
//! │  5. SUBMIT        Draft → PendingApproval + submission metadata        │
//! │  6. AFTERMATH     change log + approver notifications (best-effort,    │
//! │                   never fail the conversion)                           │
//! │                                                                         │
//! │  Any failure in 3-5 compensates: release holds, delete the order       │
//! │  (cascade removes items and reservations). Retry starts clean.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use adbook_core::{
    validate_note, validate_reference_id, validate_schedule_items, CoreError, HoldRequest, Money,
    NotificationKind, Order, OrderItem, OrderItemStatus, OrderStatus, Schedule, ScheduleItem,
    ScheduleStatus, DEFAULT_TENANT_ID,
};
use adbook_db::repository::audit::build_entry;
use adbook_db::repository::order::{generate_order_item_id, generate_order_number};
use adbook_db::{Database, HoldOutcome};

use crate::directory::ApproverDirectory;
use crate::error::{EngineError, EngineResult};

// =============================================================================
// Request / Receipt
// =============================================================================

/// Everything needed to convert one schedule.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub schedule_id: String,
    /// Actor performing the conversion; recorded as submitted_by.
    pub actor_id: String,
    /// Whether the resulting order needs the advertiser's sign-off in
    /// addition to the internal approval.
    pub requires_client_approval: bool,
    /// Free-text payment terms / special instructions.
    pub notes: Option<String>,
}

/// What a successful conversion returns.
#[derive(Debug, Clone)]
pub struct ConversionReceipt {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub holds_created: u32,
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Coordinates schedule conversion across the order repository and the
/// inventory ledger. Holds no state beyond its collaborators; all handles
/// are passed in explicitly at construction.
#[derive(Clone)]
pub struct OrderOrchestrator {
    db: Database,
    directory: Arc<dyn ApproverDirectory>,
}

impl OrderOrchestrator {
    pub fn new(db: Database, directory: Arc<dyn ApproverDirectory>) -> Self {
        OrderOrchestrator { db, directory }
    }

    /// Converts an approved schedule into a submitted order, claiming one
    /// slot unit per schedule item.
    ///
    /// ## Guarantees
    /// - At most one order ever exists per schedule; a concurrent duplicate
    ///   conversion gets `Conflict`.
    /// - Holds are all-or-nothing: `Unavailable` lists every short slot and
    ///   means zero side effects.
    /// - Any later step failing compensates fully; a retry starts clean.
    pub async fn create_order_from_schedule(
        &self,
        request: &ConversionRequest,
    ) -> EngineResult<ConversionReceipt> {
        validate_reference_id("schedule_id", &request.schedule_id)?;
        validate_reference_id("actor_id", &request.actor_id)?;
        validate_note("notes", request.notes.as_deref())?;

        let schedule = self.eligible_schedule(&request.schedule_id).await?;
        let items = self.db.schedules().items_for_schedule(&schedule.id).await?;
        validate_schedule_items(&items)?;

        let total = Money::checked_sum(items.iter().map(|i| i.rate_cents)).ok_or(
            CoreError::TotalOverflow {
                schedule_id: schedule.id.clone(),
            },
        )?;

        // Draft placeholder. The UNIQUE index on schedule_id makes this the
        // race arbiter: the second conversion fails right here with Conflict
        // and has touched nothing else.
        let now = Utc::now();
        let order_id = Uuid::new_v4().to_string();
        let draft = Order {
            id: order_id.clone(),
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            order_number: generate_order_number(now),
            schedule_id: Some(schedule.id.clone()),
            campaign_id: schedule.campaign_id.clone(),
            advertiser_id: schedule.advertiser_id.clone(),
            agency_id: schedule.agency_id.clone(),
            status: OrderStatus::Draft,
            total_amount_cents: total.cents(),
            net_amount_cents: schedule.net_amount_cents,
            requires_client_approval: request.requires_client_approval,
            submitted_at: None,
            submitted_by: None,
            approved_at: None,
            approved_by: None,
            client_approved_at: None,
            client_approved_by: None,
            notes: request.notes.clone(),
            created_at: now,
            updated_at: now,
        };
        self.db.orders().insert_draft(&draft).await?;

        // Atomic hold batch. On Unavailable the ledger already rolled its
        // transaction back; only the draft row needs compensating.
        let hold_requests: Vec<HoldRequest> = items
            .iter()
            .map(|i| HoldRequest {
                episode_id: i.episode_id.clone(),
                placement_type: i.placement_type,
            })
            .collect();

        let holds_created = match self.db.inventory().create_holds(&order_id, &hold_requests).await
        {
            Ok(HoldOutcome::Created(count)) => count,
            Ok(HoldOutcome::Unavailable(shortages)) => {
                self.delete_draft(&order_id).await;
                info!(
                    schedule_id = %schedule.id,
                    short = shortages.len(),
                    "Conversion refused: insufficient inventory"
                );
                return Err(EngineError::Unavailable(shortages));
            }
            Err(e) => {
                self.delete_draft(&order_id).await;
                return Err(e.into());
            }
        };

        // Snapshot the schedule items onto the order, then promote the
        // draft. Failures from here on must also unwind the holds.
        if let Err(e) = self.attach_items_and_submit(&order_id, &items, request, now).await {
            self.compensate(&order_id).await;
            return Err(e);
        }

        // Aftermath: audit + notifications. Best-effort, the order is
        // already committed.
        let order = self
            .db
            .orders()
            .get_by_id(&order_id)
            .await?
            .ok_or_else(|| EngineError::Persistence("submitted order vanished".to_string()))?;

        self.record_conversion(&schedule, &order, &request.actor_id)
            .await;
        self.notify_approvers(&order).await;

        let order_items = self.db.orders().items_for_order(&order_id).await?;

        info!(
            order_id = %order.id,
            order_number = %order.order_number,
            schedule_id = %schedule.id,
            holds = holds_created,
            "Schedule converted to order"
        );

        Ok(ConversionReceipt {
            order,
            items: order_items,
            holds_created,
        })
    }

    // =========================================================================
    // Pipeline steps
    // =========================================================================

    /// Loads the schedule and checks conversion eligibility.
    async fn eligible_schedule(&self, schedule_id: &str) -> EngineResult<Schedule> {
        let schedule = self
            .db
            .schedules()
            .get_by_id(schedule_id)
            .await?
            .ok_or_else(|| EngineError::NotFound {
                entity: "Schedule".to_string(),
                id: schedule_id.to_string(),
            })?;

        if schedule.status != ScheduleStatus::Approved {
            return Err(EngineError::Conflict(format!(
                "Schedule {} is not approved for conversion",
                schedule_id
            )));
        }

        // Fast-path duplicate check. Purely advisory - the UNIQUE index on
        // orders.schedule_id is what actually decides the race.
        if let Some(existing) = self.db.orders().get_by_schedule(schedule_id).await? {
            return Err(EngineError::Conflict(format!(
                "Schedule {} already converted to order {}",
                schedule_id, existing.order_number
            )));
        }

        Ok(schedule)
    }

    async fn attach_items_and_submit(
        &self,
        order_id: &str,
        items: &[ScheduleItem],
        request: &ConversionRequest,
        now: chrono::DateTime<Utc>,
    ) -> EngineResult<()> {
        for item in items {
            self.db
                .orders()
                .insert_item(&OrderItem {
                    id: generate_order_item_id(),
                    order_id: order_id.to_string(),
                    show_id: item.show_id.clone(),
                    episode_id: item.episode_id.clone(),
                    placement_type: item.placement_type,
                    air_date: item.air_date.clone(),
                    length_seconds: item.length_seconds,
                    rate_cents: item.rate_cents,
                    status: OrderItemStatus::Pending,
                    created_at: now,
                })
                .await?;
        }

        self.db.orders().submit(order_id, &request.actor_id, now).await?;
        Ok(())
    }

    // =========================================================================
    // Compensation
    // =========================================================================

    /// Removes the draft placeholder after a failed hold batch. Nothing was
    /// reserved, so only the order row goes.
    async fn delete_draft(&self, order_id: &str) {
        if let Err(e) = self.db.orders().delete(order_id).await {
            error!(order_id = %order_id, error = %e, "Compensation failed: draft order not deleted");
        }
    }

    /// Full unwind after a post-hold failure: give the slot units back,
    /// then drop the order (cascade removes items and reservation rows).
    ///
    /// The delete only happens after a successful release. If the release
    /// fails the slot counters still carry the units as reserved, and the
    /// reservation rows are the only record of which slots those are - the
    /// cascade would erase exactly what an operator needs to repair them.
    async fn compensate(&self, order_id: &str) {
        match self
            .db
            .inventory()
            .release_holds(order_id, "conversion failed")
            .await
        {
            Ok(_) => self.delete_draft(order_id).await,
            Err(e) => {
                error!(
                    order_id = %order_id,
                    error = %e,
                    "Compensation failed: holds not released, order kept for repair"
                );
            }
        }
    }

    // =========================================================================
    // Aftermath (best-effort)
    // =========================================================================

    async fn record_conversion(&self, schedule: &Schedule, order: &Order, actor: &str) {
        let entry = build_entry(
            &schedule.id,
            "schedule_converted",
            Some(&schedule.status),
            Some(&order.status),
            &[order.id.as_str()],
            actor,
        );
        if let Err(e) = self.db.change_log().append(&entry).await {
            warn!(order_id = %order.id, error = %e, "Change log append failed");
        }
    }

    /// Queues one notification per internal approver, plus the client
    /// contacts when their sign-off is required. Fire-and-forget.
    async fn notify_approvers(&self, order: &Order) {
        let mut recipients = self.directory.internal_approvers();
        if order.requires_client_approval {
            recipients.extend(self.directory.client_contacts(&order.advertiser_id));
        }

        let message = format!(
            "Order {} for campaign {} is waiting for your approval",
            order.order_number, order.campaign_id
        );

        for recipient in recipients {
            if let Err(e) = self
                .db
                .notifications()
                .queue(
                    &recipient,
                    NotificationKind::ApprovalRequested,
                    "Order pending approval",
                    &message,
                    Some(&order.id),
                    Some("order"),
                )
                .await
            {
                warn!(order_id = %order.id, recipient = %recipient, error = %e, "Notification queue failed");
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
