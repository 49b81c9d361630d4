//! Reward entity - A redeemable catalog item with a point cost.
//!
//! Rewards are owned per user, matching how the catalog is seeded. The
//! "redeem all points" option (id `0`) is never stored here.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Reward database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rewards")]
pub struct Model {
    /// Unique identifier for the reward, always greater than zero
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner of this catalog entry
    pub user_id: i64,
    /// Name shown in the catalog (e.g., "Eco Tote Bag")
    pub name: String,
    /// Cost in points
    pub cost: i64,
    /// Optional longer description
    pub description: Option<String>,
    /// Where and how the reward is collected
    pub collection_info: String,
    /// False once the reward has been redeemed
    pub is_available: bool,
    /// When the reward was created
    pub created_at: DateTimeUtc,
    /// When the reward was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Reward and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each reward belongs to one user
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
