//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod redemption_anomaly;
pub mod redemption_request;
pub mod reward;
pub mod transaction;
pub mod user;

// Re-export specific types to avoid conflicts
pub use redemption_anomaly::{
    Column as RedemptionAnomalyColumn, Entity as RedemptionAnomaly,
    Model as RedemptionAnomalyModel,
};
pub use redemption_request::{
    Column as RedemptionRequestColumn, Entity as RedemptionRequest,
    Model as RedemptionRequestModel,
};
pub use reward::{Column as RewardColumn, Entity as Reward, Model as RewardModel};
pub use transaction::{
    Column as TransactionColumn, Entity as Transaction, Model as TransactionModel,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
