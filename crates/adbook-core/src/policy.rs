//! # Authorization Policy
//!
//! The single place where approve/reject permissions are decided.
//!
//! ## Why Centralized?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Authorization Flow                                   │
//! │                                                                         │
//! │  DecisionRequest { actor_role, actor_is_client_contact, ... }          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  authorize_decision()  ← consulted ONCE per operation                  │
//! │       │                                                                 │
//! │       ├── Ok(ApprovalTrack::Internal)  → record approved_at/by         │
//! │       ├── Ok(ApprovalTrack::Client)    → record client_approved_at/by  │
//! │       └── Err(NotAuthorized { reason }) → no state changes, ever       │
//! │                                                                         │
//! │  Permission logic is never re-derived per branch downstream.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Role resolution itself (who has which role, who is a client contact) is
//! an external collaborator's job; this module only consumes the result.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Role
// =============================================================================

/// Closed set of actor roles the engine recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full administrative access.
    Admin,
    /// Manages the sales team; counts as administrative for approvals.
    SalesManager,
    /// Creates schedules and submits orders; cannot approve them.
    Sales,
    /// External advertiser-side user; approves only via the client track.
    Client,
}

impl Role {
    /// Administrative roles may decide on the internal approval track.
    pub fn is_administrative(&self) -> bool {
        matches!(self, Role::Admin | Role::SalesManager)
    }
}

// =============================================================================
// Approval Track
// =============================================================================

/// Which of the two parallel approval tracks an authorized decision
/// belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalTrack {
    /// The always-required internal approval.
    Internal,
    /// The optional advertiser-side approval.
    Client,
}

// =============================================================================
// Policy
// =============================================================================

/// Decides whether the actor may approve/reject the order, and on which
/// track. Returns an explicit allow (with track) or deny (with reason).
///
/// ## Rules
/// - Internal track: requires an administrative role.
/// - Client track: requires the actor to be the registered client contact
///   for the order's advertiser AND the order to have
///   `requires_client_approval == true`.
/// - Administrative role wins when both could apply (an admin who also
///   happens to be a client contact acts internally).
pub fn authorize_decision(
    role: Role,
    actor_is_client_contact: bool,
    requires_client_approval: bool,
) -> CoreResult<ApprovalTrack> {
    if role.is_administrative() {
        return Ok(ApprovalTrack::Internal);
    }

    if actor_is_client_contact {
        if requires_client_approval {
            return Ok(ApprovalTrack::Client);
        }
        return Err(CoreError::NotAuthorized {
            role,
            reason: "order does not require client approval".to_string(),
        });
    }

    Err(CoreError::NotAuthorized {
        role,
        reason: "approval requires an administrative role or the registered client contact"
            .to_string(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_gets_internal_track() {
        assert_eq!(
            authorize_decision(Role::Admin, false, true).unwrap(),
            ApprovalTrack::Internal
        );
        assert_eq!(
            authorize_decision(Role::SalesManager, false, false).unwrap(),
            ApprovalTrack::Internal
        );
    }

    #[test]
    fn test_client_contact_gets_client_track() {
        assert_eq!(
            authorize_decision(Role::Client, true, true).unwrap(),
            ApprovalTrack::Client
        );
    }

    #[test]
    fn test_client_contact_denied_when_not_required() {
        let err = authorize_decision(Role::Client, true, false).unwrap_err();
        assert!(matches!(err, CoreError::NotAuthorized { .. }));
    }

    #[test]
    fn test_sales_role_denied() {
        let err = authorize_decision(Role::Sales, false, true).unwrap_err();
        assert!(matches!(err, CoreError::NotAuthorized { .. }));
    }

    #[test]
    fn test_admin_who_is_also_contact_acts_internally() {
        assert_eq!(
            authorize_decision(Role::Admin, true, true).unwrap(),
            ApprovalTrack::Internal
        );
    }
}
