//! # Repository Implementations
//!
//! One repository per aggregate:
//!
//! - [`inventory`] - the inventory ledger: atomic hold/confirm/release on
//!   per-slot counters
//! - [`order`] - orders and order items
//! - [`schedule`] - read access to pre-approved schedules (plus inserts
//!   for seeding and tests)
//! - [`audit`] - append-only change log
//! - [`notification`] - fire-and-forget notification outbox
//!
//! Methods that must share a transaction with other repositories come in
//! `*_with` form taking an explicit `&mut SqliteConnection`; the plain
//! methods wrap them in their own transaction.

pub mod audit;
pub mod inventory;
pub mod notification;
pub mod order;
pub mod schedule;
