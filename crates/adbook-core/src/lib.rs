//! # adbook-core: Pure Business Logic for Adbook
//!
//! This crate is the **heart** of the Adbook inventory reservation and
//! order approval engine. It contains all business rules as pure functions
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Adbook Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  adbook-engine (Composition)                    │   │
//! │  │   OrderOrchestrator ──► ApprovalService ──► Notifications      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ adbook-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  policy   │  │ approval  │  │ validation│  │   │
//! │  │   │  Order    │  │  Role     │  │ Decision  │  │   rules   │  │   │
//! │  │   │  Slot     │  │  Track    │  │ Outcome   │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    adbook-db (Database Layer)                   │   │
//! │  │           SQLite queries, migrations, inventory ledger           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Schedule, Order, Slot, Reservation, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//! - [`policy`] - Centralized authorization for approve/reject decisions
//! - [`approval`] - Pure evaluation of the order approval state machine
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Closed Enums**: Statuses and roles are tagged variants, never loose strings

// =============================================================================
// Module Declarations
// =============================================================================

pub mod approval;
pub mod error;
pub mod money;
pub mod policy;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use adbook_core::Order` instead of
// `use adbook_core::types::Order`

pub use approval::{evaluate_decision, DecisionAction, DecisionOutcome};
pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use policy::{authorize_decision, ApprovalTrack, Role};
pub use types::*;
pub use validation::{validate_note, validate_reference_id, validate_schedule_items};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default tenant ID for v0.1 (single-tenant runtime with multi-tenant schema)
///
/// ## Why a constant?
/// v0.1 runs single-tenant, but the schema carries tenant_id so that
/// tenant-scoped storage routing (an external collaborator) can take over
/// without a migration.
pub const DEFAULT_TENANT_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Maximum line items allowed on a single schedule conversion.
///
/// ## Business Reason
/// Bounds the size of the all-or-nothing hold transaction. A schedule
/// larger than this is a data-entry error, not a real campaign.
pub const MAX_SCHEDULE_ITEMS: usize = 500;

/// Maximum length of free-text reasons and special instructions.
pub const MAX_NOTE_LENGTH: usize = 2000;
