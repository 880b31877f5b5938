//! # Approval Service
//!
//! Applies approve/reject decisions to pending orders.
//!
//! ## Decision Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         decide()                                        │
//! │                                                                         │
//! │  1. VALIDATE    ids, reason (required for reject)                      │
//! │  2. LOAD        order snapshot → NotFound                              │
//! │  3. AUTHORIZE   adbook_core::authorize_decision → track or             │
//! │                 Authorization error (consulted exactly once)           │
//! │  4. EVALUATE    adbook_core::evaluate_decision → pure outcome          │
//! │  5. APPLY       ONE transaction:                                       │
//! │     ├── approve: record approval [+ finalize order & items            │
//! │     │            + confirm holds when the set completes]              │
//! │     └── reject:  order → Rejected + release holds                     │
//! │  6. AFTERMATH   change log + notification to the submitter            │
//! │                 (best-effort, outside the transaction)                 │
//! │                                                                         │
//! │  The slot counters and the order status move in the same commit:      │
//! │  no observer ever sees an Approved order with unconfirmed holds.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use adbook_core::{
    authorize_decision, evaluate_decision, validate_note, validate_reference_id, ApprovalTrack,
    DecisionAction, DecisionOutcome, NotificationKind, Order, OrderStatus, Role,
};
use adbook_db::repository::audit::build_entry;
use adbook_db::repository::order::OrderRepository;
use adbook_db::{Database, DbError, InventoryLedger};

use crate::directory::ApproverDirectory;
use crate::error::{EngineError, EngineResult};

// =============================================================================
// Request / Receipt
// =============================================================================

/// An approve/reject decision on a pending order.
#[derive(Debug, Clone)]
pub struct DecisionRequest {
    pub order_id: String,
    pub actor_id: String,
    pub actor_role: Role,
    pub action: DecisionAction,
    /// Required for rejections, optional otherwise.
    pub reason: Option<String>,
}

/// What a decision returned: the order afterwards and what actually moved.
#[derive(Debug, Clone)]
pub struct DecisionReceipt {
    pub order: Order,
    pub track: ApprovalTrack,
    /// True when this decision completed the approval set (order is now
    /// Approved and its holds confirmed).
    pub finalized: bool,
    pub holds_confirmed: u32,
    pub holds_released: u32,
    /// True when the approval on this track was already recorded and the
    /// decision applied nothing.
    pub already_recorded: bool,
}

// =============================================================================
// Service
// =============================================================================

/// The order approval state machine, applied transactionally.
#[derive(Clone)]
pub struct ApprovalService {
    db: Database,
    directory: Arc<dyn ApproverDirectory>,
}

impl ApprovalService {
    pub fn new(db: Database, directory: Arc<dyn ApproverDirectory>) -> Self {
        ApprovalService { db, directory }
    }

    /// Applies one decision.
    ///
    /// ## Semantics
    /// - Internal approval is always required; client approval only when
    ///   the order says so. The set completes in either arrival order.
    /// - Repeating an approval already on record is a no-op, not an error.
    /// - Rejection from either track is immediately terminal and releases
    ///   every hold.
    /// - Deciding a terminal order is `Conflict`.
    pub async fn decide(&self, request: &DecisionRequest) -> EngineResult<DecisionReceipt> {
        validate_reference_id("order_id", &request.order_id)?;
        validate_reference_id("actor_id", &request.actor_id)?;
        validate_note("reason", request.reason.as_deref())?;

        if request.action == DecisionAction::Reject
            && request.reason.as_deref().map_or(true, |r| r.trim().is_empty())
        {
            return Err(EngineError::Validation(
                "reason is required when rejecting".to_string(),
            ));
        }

        let order = self
            .db
            .orders()
            .get_by_id(&request.order_id)
            .await?
            .ok_or_else(|| EngineError::NotFound {
                entity: "Order".to_string(),
                id: request.order_id.clone(),
            })?;

        // The single authorization point. Everything after this trusts the
        // returned track and never re-derives permissions.
        let is_contact = self
            .directory
            .is_client_contact(&request.actor_id, &order.advertiser_id);
        let track = authorize_decision(
            request.actor_role,
            is_contact,
            order.requires_client_approval,
        )?;

        let outcome = evaluate_decision(&order, track, request.action)?;

        let receipt = self.apply(&order, track, &outcome, request).await?;

        self.record_decision(order.status, &receipt, request).await;
        self.notify_submitter(&receipt).await;

        Ok(receipt)
    }

    // =========================================================================
    // Transactional application
    // =========================================================================

    /// Applies the evaluated outcome in one transaction, so the order row,
    /// its items and the slot counters commit together.
    async fn apply(
        &self,
        order: &Order,
        track: ApprovalTrack,
        outcome: &DecisionOutcome,
        request: &DecisionRequest,
    ) -> EngineResult<DecisionReceipt> {
        let now = Utc::now();
        let mut holds_confirmed = 0;
        let mut holds_released = 0;
        let mut finalized = false;
        let mut already_recorded = false;

        match *outcome {
            DecisionOutcome::AlreadyRecorded(_) => {
                info!(order_id = %order.id, track = ?track, "Approval already recorded, no-op");
                already_recorded = true;
            }

            DecisionOutcome::RecordInternalApproval | DecisionOutcome::RecordClientApproval => {
                let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;
                match outcome {
                    DecisionOutcome::RecordInternalApproval => {
                        OrderRepository::record_internal_approval_with(
                            &mut tx,
                            &order.id,
                            &request.actor_id,
                            now,
                        )
                        .await?
                    }
                    _ => {
                        OrderRepository::record_client_approval_with(
                            &mut tx,
                            &order.id,
                            &request.actor_id,
                            now,
                        )
                        .await?
                    }
                }

                // Completeness is checked against the row just written, in
                // the same transaction. The pre-read snapshot must not decide
                // this: a concurrent approval on the other track may have
                // committed since, and exactly one of the two decisions has
                // to see the full set.
                if OrderRepository::finalize_with(&mut tx, &order.id, now).await? {
                    holds_confirmed =
                        InventoryLedger::confirm_holds_with(&mut tx, &order.id, &request.actor_id)
                            .await?;
                    finalized = true;
                }
                tx.commit().await.map_err(DbError::from)?;
            }

            DecisionOutcome::Reject => {
                // Reason presence was validated up front.
                let reason = request.reason.as_deref().unwrap_or("rejected");
                let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;
                OrderRepository::reject_with(&mut tx, &order.id, reason, now).await?;
                holds_released =
                    InventoryLedger::release_holds_with(&mut tx, &order.id, reason).await?;
                tx.commit().await.map_err(DbError::from)?;
            }
        }

        let order = self
            .db
            .orders()
            .get_by_id(&order.id)
            .await?
            .ok_or_else(|| EngineError::Persistence("decided order vanished".to_string()))?;

        info!(
            order_id = %order.id,
            status = %order.status,
            track = ?track,
            finalized,
            "Decision applied"
        );

        Ok(DecisionReceipt {
            order,
            track,
            finalized,
            holds_confirmed,
            holds_released,
            already_recorded,
        })
    }

    // =========================================================================
    // Aftermath (best-effort)
    // =========================================================================

    async fn record_decision(
        &self,
        previous: OrderStatus,
        receipt: &DecisionReceipt,
        request: &DecisionRequest,
    ) {
        if receipt.already_recorded {
            return;
        }

        let change_type = match request.action {
            DecisionAction::Approve if receipt.finalized => "order_approved",
            DecisionAction::Approve => "order_approval_recorded",
            DecisionAction::Reject => "order_rejected",
        };

        let entry = build_entry(
            &receipt.order.id,
            change_type,
            Some(&previous),
            Some(&receipt.order.status),
            &[receipt.order.id.as_str()],
            &request.actor_id,
        );
        if let Err(e) = self.db.change_log().append(&entry).await {
            warn!(order_id = %receipt.order.id, error = %e, "Change log append failed");
        }
    }

    /// One notification to whoever submitted the order, on every decision
    /// that changed state - a recorded first leg of a dual approval included.
    /// No-op repeats stay quiet.
    async fn notify_submitter(&self, receipt: &DecisionReceipt) {
        if receipt.already_recorded {
            return;
        }
        let Some(submitter) = receipt.order.submitted_by.as_deref() else {
            return;
        };

        let (kind, title) = match receipt.order.status {
            OrderStatus::Approved if receipt.finalized => {
                (NotificationKind::OrderApproved, "Order approved")
            }
            OrderStatus::Rejected => (NotificationKind::OrderRejected, "Order rejected"),
            OrderStatus::PendingApproval => {
                (NotificationKind::ApprovalRecorded, "Approval recorded")
            }
            _ => return,
        };

        let message = match kind {
            NotificationKind::ApprovalRecorded => format!(
                "Order {} received one approval and is waiting on the other",
                receipt.order.order_number
            ),
            _ => format!(
                "Order {} is now {}",
                receipt.order.order_number, receipt.order.status
            ),
        };

        if let Err(e) = self
            .db
            .notifications()
            .queue(
                submitter,
                kind,
                title,
                &message,
                Some(&receipt.order.id),
                Some("order"),
            )
            .await
        {
            warn!(order_id = %receipt.order.id, error = %e, "Notification queue failed");
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::StaticDirectory;
    use crate::orchestrator::{ConversionRequest, OrderOrchestrator};
    use adbook_core::{
        HoldStatus, OrderItemStatus, PlacementType, Schedule, ScheduleItem, ScheduleStatus,
        DEFAULT_TENANT_ID,
    };
    use adbook_db::DbConfig;
    use uuid::Uuid;

    /// Builds a pending order over one pre-roll hold on `ep-1` (capacity 2)
    /// and returns everything a decision test needs.
    async fn pending_order(requires_client_approval: bool) -> (Database, ApprovalService, Order) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let (service, order) = pending_order_on(&db, requires_client_approval).await;
        (db, service, order)
    }

    async fn pending_order_on(
        db: &Database,
        requires_client_approval: bool,
    ) -> (ApprovalService, Order) {
        let directory: Arc<dyn ApproverDirectory> = Arc::new(
            StaticDirectory::new()
                .with_internal_approver("mgr-1")
                .with_client_contact("adv-1", "contact-1"),
        );

        db.inventory()
            .provision_slot("ep-1", PlacementType::PreRoll, 2)
            .await
            .unwrap();

        let now = Utc::now();
        db.schedules()
            .insert(&Schedule {
                id: "s-1".to_string(),
                tenant_id: DEFAULT_TENANT_ID.to_string(),
                status: ScheduleStatus::Approved,
                campaign_id: "camp-1".to_string(),
                advertiser_id: "adv-1".to_string(),
                agency_id: None,
                net_amount_cents: 2_500,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
        db.schedules()
            .insert_item(&ScheduleItem {
                id: Uuid::new_v4().to_string(),
                schedule_id: "s-1".to_string(),
                show_id: None,
                episode_id: "ep-1".to_string(),
                placement_type: PlacementType::PreRoll,
                air_date: "2026-09-07".to_string(),
                length_seconds: 30,
                rate_cents: 2_500,
                position: 0,
                created_at: now,
            })
            .await
            .unwrap();

        let orchestrator = OrderOrchestrator::new(db.clone(), directory.clone());
        let receipt = orchestrator
            .create_order_from_schedule(&ConversionRequest {
                schedule_id: "s-1".to_string(),
                actor_id: "seller-1".to_string(),
                requires_client_approval,
                notes: None,
            })
            .await
            .unwrap();

        let service = ApprovalService::new(db.clone(), directory);
        (service, receipt.order)
    }

    fn approve_as(order_id: &str, actor_id: &str, role: Role) -> DecisionRequest {
        DecisionRequest {
            order_id: order_id.to_string(),
            actor_id: actor_id.to_string(),
            actor_role: role,
            action: DecisionAction::Approve,
            reason: None,
        }
    }

    fn reject_as(order_id: &str, actor_id: &str, role: Role, reason: &str) -> DecisionRequest {
        DecisionRequest {
            order_id: order_id.to_string(),
            actor_id: actor_id.to_string(),
            actor_role: role,
            action: DecisionAction::Reject,
            reason: Some(reason.to_string()),
        }
    }

    async fn slot_counters(db: &Database) -> (i64, i64, i64) {
        let slot = db
            .inventory()
            .get_slot("ep-1", PlacementType::PreRoll)
            .await
            .unwrap()
            .unwrap();
        assert!(slot.is_consistent(), "invariant broken: {slot:?}");
        (slot.available, slot.reserved, slot.booked)
    }

    #[tokio::test]
    async fn test_internal_approval_finalizes_single_track_order() {
        let (db, service, order) = pending_order(false).await;
        assert_eq!(slot_counters(&db).await, (1, 1, 0));

        let receipt = service
            .decide(&approve_as(&order.id, "mgr-1", Role::SalesManager))
            .await
            .unwrap();

        assert!(receipt.finalized);
        assert_eq!(receipt.track, ApprovalTrack::Internal);
        assert_eq!(receipt.holds_confirmed, 1);
        assert_eq!(receipt.order.status, OrderStatus::Approved);
        assert_eq!(receipt.order.approved_by.as_deref(), Some("mgr-1"));
        assert_eq!(slot_counters(&db).await, (1, 0, 1));

        let items = db.orders().items_for_order(&order.id).await.unwrap();
        assert!(items.iter().all(|i| i.status == OrderItemStatus::Confirmed));

        let holds = db.inventory().holds_for_order(&order.id).await.unwrap();
        assert!(holds.iter().all(|h| h.status == HoldStatus::Confirmed));

        // Exactly one "approved" note back to the submitter.
        let inbox = db.notifications().list_for_recipient("seller-1").await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].kind, NotificationKind::OrderApproved);
    }

    #[tokio::test]
    async fn test_dual_approval_internal_then_client() {
        let (db, service, order) = pending_order(true).await;

        let first = service
            .decide(&approve_as(&order.id, "mgr-1", Role::SalesManager))
            .await
            .unwrap();
        assert!(!first.finalized);
        assert_eq!(first.order.status, OrderStatus::PendingApproval);
        // Holds stay reserved until the set completes.
        assert_eq!(slot_counters(&db).await, (1, 1, 0));

        // The submitter hears about the recorded first leg too.
        let inbox = db.notifications().list_for_recipient("seller-1").await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].kind, NotificationKind::ApprovalRecorded);

        let second = service
            .decide(&approve_as(&order.id, "contact-1", Role::Client))
            .await
            .unwrap();
        assert!(second.finalized);
        assert_eq!(second.track, ApprovalTrack::Client);
        assert_eq!(second.order.status, OrderStatus::Approved);
        assert_eq!(second.order.client_approved_by.as_deref(), Some("contact-1"));
        assert_eq!(slot_counters(&db).await, (1, 0, 1));

        let inbox = db.notifications().list_for_recipient("seller-1").await.unwrap();
        assert_eq!(inbox.len(), 2);
        assert_eq!(
            inbox
                .iter()
                .filter(|n| n.kind == NotificationKind::OrderApproved)
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_dual_approval_client_then_internal() {
        let (db, service, order) = pending_order(true).await;

        let first = service
            .decide(&approve_as(&order.id, "contact-1", Role::Client))
            .await
            .unwrap();
        assert!(!first.finalized);
        assert_eq!(slot_counters(&db).await, (1, 1, 0));

        let second = service
            .decide(&approve_as(&order.id, "mgr-1", Role::Admin))
            .await
            .unwrap();
        assert!(second.finalized);
        assert_eq!(second.track, ApprovalTrack::Internal);
        assert_eq!(second.order.status, OrderStatus::Approved);
        assert_eq!(slot_counters(&db).await, (1, 0, 1));
    }

    #[tokio::test]
    async fn test_repeat_approval_is_noop() {
        let (db, service, order) = pending_order(true).await;

        service
            .decide(&approve_as(&order.id, "mgr-1", Role::SalesManager))
            .await
            .unwrap();
        let repeat = service
            .decide(&approve_as(&order.id, "mgr-1", Role::SalesManager))
            .await
            .unwrap();

        assert!(repeat.already_recorded);
        assert!(!repeat.finalized);
        assert_eq!(repeat.holds_confirmed, 0);
        assert_eq!(repeat.order.status, OrderStatus::PendingApproval);
        assert_eq!(slot_counters(&db).await, (1, 1, 0));

        // The no-op queues nothing: still just the first leg's notification.
        let inbox = db.notifications().list_for_recipient("seller-1").await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].kind, NotificationKind::ApprovalRecorded);
    }

    #[tokio::test]
    async fn test_reject_releases_holds() {
        let (db, service, order) = pending_order(false).await;

        let receipt = service
            .decide(&reject_as(&order.id, "mgr-1", Role::Admin, "Budget exceeded"))
            .await
            .unwrap();

        assert_eq!(receipt.order.status, OrderStatus::Rejected);
        assert_eq!(receipt.holds_released, 1);
        assert!(receipt.order.notes.unwrap().contains("Budget exceeded"));
        // Availability is fully restored.
        assert_eq!(slot_counters(&db).await, (2, 0, 0));

        let holds = db.inventory().holds_for_order(&order.id).await.unwrap();
        assert!(holds.iter().all(|h| h.status == HoldStatus::Released));
        assert_eq!(holds[0].rejection_reason.as_deref(), Some("Budget exceeded"));

        // Exactly one rejection notification to the submitter.
        let inbox = db.notifications().list_for_recipient("seller-1").await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].kind, NotificationKind::OrderRejected);

        // The audit entry carries the before/after status pair.
        let trail = db.change_log().list_for_subject(&order.id).await.unwrap();
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].change_type, "order_rejected");
        assert_eq!(trail[0].previous_value.as_deref(), Some("\"pending_approval\""));
        assert_eq!(trail[0].new_value.as_deref(), Some("\"rejected\""));

        // Rejection is terminal: any further decision conflicts.
        let err = service
            .decide(&approve_as(&order.id, "mgr-1", Role::Admin))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_reject_requires_reason() {
        let (_db, service, order) = pending_order(false).await;

        let mut request = reject_as(&order.id, "mgr-1", Role::Admin, "x");
        request.reason = None;
        let err = service.decide(&request).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));

        request.reason = Some("   ".to_string());
        let err = service.decide(&request).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn test_sales_role_cannot_decide() {
        let (db, service, order) = pending_order(false).await;

        let err = service
            .decide(&approve_as(&order.id, "seller-1", Role::Sales))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Authorization(_)));

        // Denial changed nothing.
        let unchanged = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, OrderStatus::PendingApproval);
        assert_eq!(slot_counters(&db).await, (1, 1, 0));
    }

    #[tokio::test]
    async fn test_contact_denied_when_client_approval_not_required() {
        let (_db, service, order) = pending_order(false).await;

        let err = service
            .decide(&approve_as(&order.id, "contact-1", Role::Client))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Authorization(_)));
    }

    #[tokio::test]
    async fn test_unknown_order_not_found() {
        let (_db, service, _order) = pending_order(false).await;

        let err = service
            .decide(&approve_as("o-missing", "mgr-1", Role::Admin))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
    }

    // -------------------------------------------------------------------------
    // Concurrency (file-backed database so writers actually contend)
    // -------------------------------------------------------------------------

    async fn file_db() -> (Database, std::path::PathBuf) {
        let path = std::env::temp_dir().join(format!("adbook-test-{}.db", Uuid::new_v4()));
        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        (db, path)
    }

    fn cleanup(path: &std::path::Path) {
        for suffix in ["", "-wal", "-shm"] {
            let mut p = path.as_os_str().to_owned();
            p.push(suffix);
            let _ = std::fs::remove_file(std::path::PathBuf::from(p));
        }
    }

    /// Both tracks decide at the same time on a dual-approval order. Each
    /// side's pre-read snapshot shows the other approval as absent, so the
    /// completeness check has to happen against the written row - otherwise
    /// both commit without finalizing and the order is stranded with both
    /// approvals recorded, status PendingApproval and holds stuck Reserved.
    #[tokio::test]
    async fn test_concurrent_dual_approvals_finalize_exactly_once() {
        let (db, path) = file_db().await;
        let (service, order) = pending_order_on(&db, true).await;

        let a = tokio::spawn({
            let service = service.clone();
            let id = order.id.clone();
            async move { service.decide(&approve_as(&id, "mgr-1", Role::SalesManager)).await }
        });
        let b = tokio::spawn({
            let service = service.clone();
            let id = order.id.clone();
            async move { service.decide(&approve_as(&id, "contact-1", Role::Client)).await }
        });

        let results = [a.await.unwrap().unwrap(), b.await.unwrap().unwrap()];
        let finalized = results.iter().filter(|r| r.finalized).count();
        assert_eq!(finalized, 1, "exactly one decision completes the set: {results:?}");

        let order = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Approved);
        assert!(order.approvals_complete());
        assert_eq!(slot_counters(&db).await, (1, 0, 1));

        let holds = db.inventory().holds_for_order(&order.id).await.unwrap();
        assert!(holds.iter().all(|h| h.status == HoldStatus::Confirmed));

        // One approval-set-complete notification, no matter who won.
        let inbox = db.notifications().list_for_recipient("seller-1").await.unwrap();
        assert_eq!(
            inbox
                .iter()
                .filter(|n| n.kind == NotificationKind::OrderApproved)
                .count(),
            1
        );

        db.close().await;
        cleanup(&path);
    }
}
