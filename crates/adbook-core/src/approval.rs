//! # Approval State Machine (pure evaluation)
//!
//! Pure evaluation of approve/reject decisions against an order snapshot.
//! Returns WHAT should happen; the engine applies it transactionally.
//!
//! ## States & Transitions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Order Approval State Machine                         │
//! │                                                                         │
//! │                    ┌──────────────────┐                                 │
//! │                    │ PendingApproval  │                                 │
//! │                    └───────┬──────────┘                                 │
//! │          approve           │            reject (either track)           │
//! │   ┌────────────────────────┼──────────────────────────┐                 │
//! │   ▼                        ▼                          ▼                 │
//! │  internal track        client track              ┌──────────┐           │
//! │  record approved_at    record client_approved_at │ Rejected │ terminal  │
//! │   │                        │                     └──────────┘           │
//! │   └──── both present? ─────┘        holds → released                    │
//! │              │ yes                                                      │
//! │              ▼                                                          │
//! │        ┌──────────┐                                                     │
//! │        │ Approved │ terminal, holds → confirmed                         │
//! │        └──────────┘                                                     │
//! │                                                                         │
//! │  Finalization fires on whichever required approval arrives LAST.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::policy::ApprovalTrack;
use crate::types::{Order, OrderStatus};

// =============================================================================
// Decision Inputs / Outputs
// =============================================================================

/// The action an authorized actor takes on a pending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionAction {
    Approve,
    Reject,
}

/// What the engine must apply for a decision. Pure data, no side effects.
///
/// Whether a recorded approval completes the set - and therefore finalizes
/// the order - is NOT part of this outcome: that answer depends on what a
/// concurrent decision on the other track may have committed in the
/// meantime, so the apply transaction decides it against the row it just
/// wrote ([`Order::approvals_complete`] is the rule).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionOutcome {
    /// Record the internal approval timestamp/actor.
    RecordInternalApproval,
    /// Record the client approval timestamp/actor.
    RecordClientApproval,
    /// Terminal rejection: release all holds, append the reason to notes.
    Reject,
    /// The approval on this track is already recorded; apply nothing.
    AlreadyRecorded(ApprovalTrack),
}

// =============================================================================
// Evaluation
// =============================================================================

/// Evaluates a decision against the current order snapshot.
///
/// ## Preconditions
/// The actor has already been authorized onto `track` by
/// [`crate::policy::authorize_decision`]; this function only decides state
/// transitions.
///
/// ## Errors
/// [`CoreError::InvalidOrderStatus`] when the order is not PendingApproval
/// (terminal orders admit no further decisions; Draft means conversion has
/// not finished).
pub fn evaluate_decision(
    order: &Order,
    track: ApprovalTrack,
    action: DecisionAction,
) -> CoreResult<DecisionOutcome> {
    if order.status != OrderStatus::PendingApproval {
        return Err(CoreError::InvalidOrderStatus {
            order_id: order.id.clone(),
            current_status: order.status,
        });
    }

    match (action, track) {
        // Rejection is immediately terminal regardless of track.
        (DecisionAction::Reject, _) => Ok(DecisionOutcome::Reject),

        (DecisionAction::Approve, ApprovalTrack::Internal) => {
            if order.internal_approval_recorded() {
                return Ok(DecisionOutcome::AlreadyRecorded(ApprovalTrack::Internal));
            }
            Ok(DecisionOutcome::RecordInternalApproval)
        }

        (DecisionAction::Approve, ApprovalTrack::Client) => {
            if order.client_approval_recorded() {
                return Ok(DecisionOutcome::AlreadyRecorded(ApprovalTrack::Client));
            }
            Ok(DecisionOutcome::RecordClientApproval)
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
