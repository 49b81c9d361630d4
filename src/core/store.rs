//! Storage seams used by the redemption workflow.
//!
//! The workflow only sees these traits. [`SeaOrmStore`] implements all three over a
//! single database connection by delegating to the ledger, reward and journal modules.

use crate::{
    core::{
        journal::{self, NewAnomaly, RequestStatus},
        ledger::{self, TransactionKind},
        reward,
    },
    entities::{reward as reward_entity, transaction},
    errors::Result,
};
use async_trait::async_trait;
use sea_orm::DatabaseConnection;

/// Append-only, per-user points ledger.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Full history of one user, newest first.
    async fn list_transactions(&self, user_id: i64) -> Result<Vec<transaction::Model>>;

    /// Appends one entry and returns it as stored.
    async fn append_transaction(
        &self,
        user_id: i64,
        kind: TransactionKind,
        amount: i64,
        description: String,
    ) -> Result<transaction::Model>;
}

/// Catalog of rewards a user can redeem.
#[async_trait]
pub trait RewardCatalog: Send + Sync {
    /// Rewards currently available to the user.
    async fn list_available_rewards(&self, user_id: i64) -> Result<Vec<reward_entity::Model>>;

    /// Consumes a reward after a successful mint.
    async fn mark_redeemed(&self, user_id: i64, reward_id: i64) -> Result<()>;
}

/// Idempotency claims and reconciliation anomalies.
#[async_trait]
pub trait RedemptionJournal: Send + Sync {
    /// Claims a request id, failing with `DuplicateRequest` on reuse.
    async fn claim_request(&self, request_id: &str, user_id: i64, reward_id: i64) -> Result<()>;

    /// Records how a claimed request ended.
    async fn finish_request(&self, request_id: &str, status: RequestStatus) -> Result<()>;

    /// Stores an anomaly and returns its id.
    async fn record_anomaly(&self, anomaly: NewAnomaly) -> Result<i64>;
}

/// Database-backed implementation of every storage seam.
#[derive(Debug, Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    /// Wraps an open connection.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Closes the underlying connection.
    pub async fn close(self) -> Result<()> {
        self.db.close().await.map_err(Into::into)
    }
}

#[async_trait]
impl TransactionStore for SeaOrmStore {
    async fn list_transactions(&self, user_id: i64) -> Result<Vec<transaction::Model>> {
        ledger::list_transactions(&self.db, user_id).await
    }

    async fn append_transaction(
        &self,
        user_id: i64,
        kind: TransactionKind,
        amount: i64,
        description: String,
    ) -> Result<transaction::Model> {
        ledger::append_transaction(&self.db, user_id, kind, amount, description).await
    }
}

#[async_trait]
impl RewardCatalog for SeaOrmStore {
    async fn list_available_rewards(&self, user_id: i64) -> Result<Vec<reward_entity::Model>> {
        reward::list_available_rewards(&self.db, user_id).await
    }

    async fn mark_redeemed(&self, user_id: i64, reward_id: i64) -> Result<()> {
        reward::mark_redeemed(&self.db, user_id, reward_id).await
    }
}

#[async_trait]
impl RedemptionJournal for SeaOrmStore {
    async fn claim_request(&self, request_id: &str, user_id: i64, reward_id: i64) -> Result<()> {
        journal::claim_request(&self.db, request_id, user_id, reward_id)
            .await
            .map(|_| ())
    }

    async fn finish_request(&self, request_id: &str, status: RequestStatus) -> Result<()> {
        journal::finish_request(&self.db, request_id, status).await
    }

    async fn record_anomaly(&self, anomaly: NewAnomaly) -> Result<i64> {
        journal::record_anomaly(&self.db, anomaly).await
    }
}
