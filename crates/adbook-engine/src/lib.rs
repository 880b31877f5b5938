//! # adbook-engine: Orchestration Layer for Adbook
//!
//! Composes adbook-core (pure rules) and adbook-db (storage) into the
//! operations external callers use.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Adbook Engine                                    │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              ★ adbook-engine (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │  ┌───────────────────┐        ┌───────────────────┐           │   │
//! │  │  │ OrderOrchestrator │        │  ApprovalService  │           │   │
//! │  │  │                   │        │                   │           │   │
//! │  │  │ schedule → order  │        │ approve / reject  │           │   │
//! │  │  │ atomic holds      │        │ dual-track, one   │           │   │
//! │  │  │ compensation      │        │ transaction       │           │   │
//! │  │  └─────────┬─────────┘        └─────────┬─────────┘           │   │
//! │  │            │     ┌──────────────────┐   │                     │   │
//! │  │            └────►│ ApproverDirectory│◄──┘                     │   │
//! │  │                  │ (trait seam)     │                         │   │
//! │  │                  └──────────────────┘                         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │            │                                      │                    │
//! │            ▼                                      ▼                    │
//! │      adbook-core                             adbook-db                 │
//! │      (policy, state machine)                 (ledger, repositories)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`orchestrator`] - schedule-to-order conversion with atomic holds
//! - [`approval`] - the approval state machine, applied transactionally
//! - [`directory`] - approver/contact resolution seam
//! - [`error`] - the error taxonomy external callers see
//!
//! ## Usage
//! ```rust,ignore
//! let db = Database::new(DbConfig::new("./adbook.db")).await?;
//! let directory = Arc::new(StaticDirectory::new().with_internal_approver("mgr-1"));
//!
//! let orchestrator = OrderOrchestrator::new(db.clone(), directory.clone());
//! let receipt = orchestrator.create_order_from_schedule(&request).await?;
//!
//! let approvals = ApprovalService::new(db, directory);
//! approvals.decide(&decision).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod approval;
pub mod directory;
pub mod error;
pub mod orchestrator;

// =============================================================================
// Re-exports
// =============================================================================

pub use approval::{ApprovalService, DecisionReceipt, DecisionRequest};
pub use directory::{ApproverDirectory, StaticDirectory};
pub use error::{EngineError, EngineResult};
pub use orchestrator::{ConversionReceipt, ConversionRequest, OrderOrchestrator};
