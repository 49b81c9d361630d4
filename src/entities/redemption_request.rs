//! Redemption request entity - Idempotency record for one redemption attempt.
//!
//! The `request_id` is generated by the client per attempt; a second attempt with
//! the same id is rejected before any side effect happens.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Redemption request database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "redemption_requests")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Client-generated idempotency key
    #[sea_orm(unique)]
    pub request_id: String,
    /// User who submitted the request
    pub user_id: i64,
    /// Requested reward, `0` for "redeem all points"
    pub reward_id: i64,
    /// `"pending"`, `"completed"`, `"failed"` or `"needs_reconciliation"`
    pub status: String,
    /// When the request was claimed
    pub created_at: DateTimeUtc,
    /// When the status last changed
    pub updated_at: DateTimeUtc,
}

/// Redemption requests are looked up by key only
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
