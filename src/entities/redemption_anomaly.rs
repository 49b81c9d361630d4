//! Redemption anomaly entity - Tokens minted without a matching ledger debit.
//!
//! Written when recording a redemption fails after the mint succeeded, so an
//! operator can reconcile the books by hand.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Redemption anomaly database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "redemption_anomalies")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// User whose ledger is out of balance
    pub user_id: i64,
    /// Reward that was being redeemed, `0` for "redeem all points"
    pub reward_id: i64,
    /// Wallet the tokens were minted to
    pub wallet_address: String,
    /// Points that were minted but not debited
    pub amount: i64,
    /// Why the ledger write failed
    pub reason: String,
    /// Set by an operator once the ledger has been corrected
    pub resolved: bool,
    /// When the anomaly was detected
    pub created_at: DateTimeUtc,
}

/// Anomalies reference users by id only so they survive ledger failures
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
