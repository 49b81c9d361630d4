//! Core business logic - framework-agnostic ledger, catalog and redemption operations.

/// Idempotency keys and reconciliation anomalies
pub mod journal;
/// Append-only points ledger and balance reconciliation
pub mod ledger;
/// Rewards page read model
pub mod overview;
/// The redemption workflow and the service that owns it
pub mod redemption;
/// Reward catalog operations
pub mod reward;
/// Storage traits and their database implementation
pub mod store;
/// User accounts
pub mod user;
