//! Transaction entity - One immutable entry in a user's points ledger.
//!
//! Rows are only ever inserted. `transaction_type` holds `"earned_report"`,
//! `"earned_collect"` or `"redeemed"`; see [`crate::core::ledger::TransactionKind`].
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Transaction database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Unique identifier for the transaction
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the user this ledger entry belongs to
    pub user_id: i64,
    /// Kind of entry: `"earned_report"`, `"earned_collect"` or `"redeemed"`
    pub transaction_type: String,
    /// Points moved by this entry, never negative
    pub amount: i64,
    /// Human-readable description of the transaction
    pub description: String,
    /// When the transaction was created
    pub timestamp: DateTimeUtc,
}

/// Defines relationships between Transaction and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each transaction belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
