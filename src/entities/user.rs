//! User entity - The session identity points are earned and redeemed against.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Login email, unique across users
    #[sea_orm(unique)]
    pub email: String,
    /// Display name
    pub name: String,
    /// When the user signed up
    pub created_at: DateTimeUtc,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user has many ledger transactions
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
    /// One user has many rewards
    #[sea_orm(has_many = "super::reward::Entity")]
    Rewards,
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::reward::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rewards.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
