//! # Domain Types
//!
//! Core domain types for the reservation and approval engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Schedule     │   │     Order       │   │   Reservation   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │──►│  order_number   │──►│  order_id (FK)  │       │
//! │  │  status         │   │  status         │   │  status         │       │
//! │  │  items[]        │   │  items[]        │   │  slot key       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                      │                  │
//! │  ┌─────────────────┐   ┌─────────────────┐          ▼                  │
//! │  │  PlacementType  │   │   OrderStatus   │   ┌─────────────────┐       │
//! │  │  ─────────────  │   │  ─────────────  │   │      Slot       │       │
//! │  │  PreRoll        │   │  Draft          │   │  ─────────────  │       │
//! │  │  MidRoll        │   │  PendingApproval│   │  available      │       │
//! │  │  PostRoll       │   │  Approved       │   │  reserved       │       │
//! │  └─────────────────┘   │  Rejected       │   │  booked         │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Lifecycle
//! Schedule (external, pre-approved) → Order + Reservations created together,
//! atomically, exactly once per schedule → Order enters PendingApproval →
//! terminal Approved (holds → confirmed, reserved → booked) or Rejected
//! (holds → released, reserved → available). No partially-confirmed state is
//! ever externally observable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Placement Type
// =============================================================================

/// Where an ad runs inside an episode. Together with the episode id this
/// forms the slot key - the addressable inventory unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PlacementType {
    /// Before the episode content.
    PreRoll,
    /// During the episode content.
    MidRoll,
    /// After the episode content.
    PostRoll,
}

impl PlacementType {
    /// Stable lowercase label, used in error messages and audit entries.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlacementType::PreRoll => "pre_roll",
            PlacementType::MidRoll => "mid_roll",
            PlacementType::PostRoll => "post_roll",
        }
    }
}

impl std::fmt::Display for PlacementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Status Enums
// =============================================================================

/// Status of a schedule. Schedules are authored and approved by an external
/// workflow; only `Approved` schedules are eligible for conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    Draft,
    PendingApproval,
    Approved,
    Rejected,
}

/// The status of an order.
///
/// ## Transitions
/// ```text
/// Draft ──► PendingApproval ──► Approved   (terminal)
///                           └─► Rejected   (terminal)
/// ```
/// `Draft` exists only as a placeholder during conversion; a failed
/// conversion deletes the row, so external callers never observe it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Draft,
    PendingApproval,
    Approved,
    Rejected,
}

impl OrderStatus {
    /// Terminal states admit no further decisions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Approved | OrderStatus::Rejected)
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Draft
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            OrderStatus::Draft => "draft",
            OrderStatus::PendingApproval => "pending_approval",
            OrderStatus::Approved => "approved",
            OrderStatus::Rejected => "rejected",
        };
        f.write_str(label)
    }
}

/// Status of an order line item. Flips to `Confirmed` only on full approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum OrderItemStatus {
    Pending,
    Confirmed,
}

/// Status of a reservation (hold) on one slot.
///
/// Holds are destroyed logically, never deleted: `Confirmed` and `Released`
/// are both terminal and keep the row for the audit trail. The one exception
/// is compensating rollback during a failed conversion, which removes the
/// whole order and everything hanging off it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum HoldStatus {
    Reserved,
    Confirmed,
    Released,
}

/// Approval verdict recorded on a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum HoldApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

// =============================================================================
// Schedule
// =============================================================================

/// A negotiated, already-approved plan of placements. Created by an external
/// authoring workflow; read-only to this engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Schedule {
    pub id: String,
    pub tenant_id: String,
    pub status: ScheduleStatus,
    pub campaign_id: String,
    pub advertiser_id: String,
    pub agency_id: Option<String>,
    pub net_amount_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One placement in a schedule: which episode, where in the episode, and the
/// negotiated price.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ScheduleItem {
    pub id: String,
    pub schedule_id: String,
    pub show_id: Option<String>,
    pub episode_id: String,
    pub placement_type: PlacementType,
    /// Air date of the episode, ISO-8601 date string.
    pub air_date: String,
    /// Spot length in seconds (15/30/60 typically).
    pub length_seconds: i64,
    /// Negotiated rate for this placement, in cents.
    pub rate_cents: i64,
    /// Ordering within the schedule.
    pub position: i64,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Order
// =============================================================================

/// The unit of commitment: a binding insertion order converted from exactly
/// one schedule.
///
/// Created once by the order orchestrator; mutated only by the approval
/// state machine thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    pub id: String,
    pub tenant_id: String,
    /// Human-readable order number, e.g. `IO-20260823-4F2A1C`.
    pub order_number: String,
    /// At most one order per schedule (UNIQUE index in the database).
    pub schedule_id: Option<String>,
    pub campaign_id: String,
    pub advertiser_id: String,
    pub agency_id: Option<String>,
    pub status: OrderStatus,
    pub total_amount_cents: i64,
    pub net_amount_cents: i64,
    /// When true the order needs the advertiser's client contact to approve
    /// in addition to the internal approver.
    pub requires_client_approval: bool,
    pub submitted_at: Option<DateTime<Utc>>,
    pub submitted_by: Option<String>,
    /// Internal approval track.
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by: Option<String>,
    /// Client approval track (only meaningful when requires_client_approval).
    pub client_approved_at: Option<DateTime<Utc>>,
    pub client_approved_by: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Whether the internal approval has been recorded.
    #[inline]
    pub fn internal_approval_recorded(&self) -> bool {
        self.approved_at.is_some()
    }

    /// Whether the client approval has been recorded.
    #[inline]
    pub fn client_approval_recorded(&self) -> bool {
        self.client_approved_at.is_some()
    }

    /// The finalization rule: an order finalizes to Approved exactly when
    /// the internal approval is present, and the client approval is present
    /// whenever it is required. Order of arrival does not matter.
    pub fn approvals_complete(&self) -> bool {
        self.internal_approval_recorded()
            && (!self.requires_client_approval || self.client_approval_recorded())
    }
}

/// A line binding an order to one slot. Snapshot of the schedule item at
/// conversion time, so later schedule edits never rewrite order history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub show_id: Option<String>,
    pub episode_id: String,
    pub placement_type: PlacementType,
    pub air_date: String,
    pub length_seconds: i64,
    pub rate_cents: i64,
    pub status: OrderItemStatus,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Slot
// =============================================================================

/// Per-slot counters. The only shared mutable resource in the engine,
/// mutated exclusively by the inventory ledger's three operations.
///
/// ## Invariant
/// `available + reserved + booked == capacity` at every observable point.
/// Capacity is fixed at episode creation; resizing is out of scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Slot {
    pub episode_id: String,
    pub placement_type: PlacementType,
    pub capacity: i64,
    pub available: i64,
    pub reserved: i64,
    pub booked: i64,
    pub updated_at: DateTime<Utc>,
}

impl Slot {
    /// Checks the counter invariant. The database CHECK constraint enforces
    /// this too; the method exists so tests can assert it at every step.
    pub fn is_consistent(&self) -> bool {
        self.available >= 0
            && self.reserved >= 0
            && self.booked >= 0
            && self.available + self.reserved + self.booked == self.capacity
    }
}

/// A request to hold one unit of one slot on behalf of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldRequest {
    pub episode_id: String,
    pub placement_type: PlacementType,
}

/// Per-item availability failure, returned as structured data so the caller
/// can adjust the schedule and retry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotShortage {
    pub episode_id: String,
    pub placement_type: PlacementType,
    /// Units the batch asked for on this slot, aggregated across items.
    pub requested: i64,
    /// Units actually available before the batch touched anything.
    pub available: i64,
}

impl std::fmt::Display for SlotShortage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}: requested {}, available {}",
            self.episode_id, self.placement_type, self.requested, self.available
        )
    }
}

// =============================================================================
// Reservation
// =============================================================================

/// A provisional claim on one slot for one order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Reservation {
    pub id: String,
    pub order_id: String,
    pub episode_id: String,
    pub placement_type: PlacementType,
    pub status: HoldStatus,
    pub approval_status: HoldApprovalStatus,
    pub rejection_reason: Option<String>,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Change Log
// =============================================================================

/// Append-only audit record. Written on every state transition, never read
/// by control flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ChangeLogEntry {
    pub id: String,
    /// Id of the entity the change happened to (order id, schedule id...).
    pub subject_id: String,
    /// Machine-readable change type, e.g. `order_submitted`.
    pub change_type: String,
    /// JSON snapshot before the change.
    pub previous_value: Option<String>,
    /// JSON snapshot after the change.
    pub new_value: Option<String>,
    /// JSON array of order ids touched by the change.
    pub affected_order_ids: String,
    pub actor: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Notifications
// =============================================================================

/// Category of an outbound notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ApprovalRequested,
    /// One leg of a dual-approval order landed; the other is still pending.
    ApprovalRecorded,
    OrderApproved,
    OrderRejected,
}

/// A fire-and-forget event queued for the external notification dispatcher.
/// Uses the outbox pattern: the row is the contract, delivery is someone
/// else's job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Notification {
    pub id: String,
    pub tenant_id: String,
    pub recipient_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub related_id: Option<String>,
    pub related_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn order_with_approvals(
        requires_client: bool,
        internal: bool,
        client: bool,
    ) -> Order {
        let now = Utc::now();
        Order {
            id: "o1".to_string(),
            tenant_id: crate::DEFAULT_TENANT_ID.to_string(),
            order_number: "IO-20260823-TEST01".to_string(),
            schedule_id: Some("s1".to_string()),
            campaign_id: "c1".to_string(),
            advertiser_id: "a1".to_string(),
            agency_id: None,
            status: OrderStatus::PendingApproval,
            total_amount_cents: 0,
            net_amount_cents: 0,
            requires_client_approval: requires_client,
            submitted_at: Some(now),
            submitted_by: Some("seller".to_string()),
            approved_at: internal.then_some(now),
            approved_by: internal.then(|| "admin".to_string()),
            client_approved_at: client.then_some(now),
            client_approved_by: client.then(|| "contact".to_string()),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_finalization_rule_single_track() {
        assert!(!order_with_approvals(false, false, false).approvals_complete());
        assert!(order_with_approvals(false, true, false).approvals_complete());
    }

    #[test]
    fn test_finalization_rule_dual_track() {
        // Internal alone never finalizes a dual-approval order.
        assert!(!order_with_approvals(true, true, false).approvals_complete());
        // Client alone never finalizes either.
        assert!(!order_with_approvals(true, false, true).approvals_complete());
        // Both present, in any order of arrival.
        assert!(order_with_approvals(true, true, true).approvals_complete());
    }

    #[test]
    fn test_slot_consistency() {
        let slot = Slot {
            episode_id: "e1".to_string(),
            placement_type: PlacementType::PreRoll,
            capacity: 3,
            available: 1,
            reserved: 1,
            booked: 1,
            updated_at: Utc::now(),
        };
        assert!(slot.is_consistent());

        let broken = Slot {
            available: 2,
            ..slot
        };
        assert!(!broken.is_consistent());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!OrderStatus::Draft.is_terminal());
        assert!(!OrderStatus::PendingApproval.is_terminal());
        assert!(OrderStatus::Approved.is_terminal());
        assert!(OrderStatus::Rejected.is_terminal());
    }

    #[test]
    fn test_placement_labels() {
        assert_eq!(PlacementType::PreRoll.to_string(), "pre_roll");
        assert_eq!(PlacementType::MidRoll.as_str(), "mid_roll");
    }
}
