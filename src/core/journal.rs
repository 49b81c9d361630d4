//! Redemption journal - Idempotency keys and reconciliation anomalies.
//!
//! Each redemption attempt claims its client-generated request id once validation
//! passes and before the mint. When tokens are minted but the ledger debit cannot be written, an anomaly
//! row is left for an operator instead of retrying silently.

use crate::{
    entities::{RedemptionAnomaly, RedemptionRequest, redemption_anomaly, redemption_request},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, SqlErr, prelude::*};
use tracing::{error, info};

/// Lifecycle of a claimed redemption request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    /// Claimed, workflow still running
    Pending,
    /// Minted and recorded
    Completed,
    /// Aborted before anything was recorded
    Failed,
    /// Minted but not recorded; see the anomaly log
    NeedsReconciliation,
}

impl RequestStatus {
    /// Value stored in the `status` column
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::NeedsReconciliation => "needs_reconciliation",
        }
    }
}

/// Details of a mint that was not matched by a ledger debit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAnomaly {
    /// User whose ledger is out of balance
    pub user_id: i64,
    /// Reward being redeemed
    pub reward_id: i64,
    /// Wallet that received the tokens
    pub wallet_address: String,
    /// Points minted but not debited
    pub amount: i64,
    /// Why the ledger write failed
    pub reason: String,
}

/// Claims a request id for a new redemption attempt.
///
/// # Errors
/// Returns [`Error::DuplicateRequest`] if the id was claimed before, whatever the
/// outcome of that earlier attempt.
pub async fn claim_request<C>(
    db: &C,
    request_id: &str,
    user_id: i64,
    reward_id: i64,
) -> Result<redemption_request::Model>
where
    C: ConnectionTrait,
{
    let now = chrono::Utc::now();
    let request = redemption_request::ActiveModel {
        request_id: Set(request_id.to_string()),
        user_id: Set(user_id),
        reward_id: Set(reward_id),
        status: Set(RequestStatus::Pending.as_str().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    // The unique index on request_id decides races between concurrent claims
    request.insert(db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => Error::DuplicateRequest {
            request_id: request_id.to_string(),
        },
        _ => e.into(),
    })
}

/// Records the final status of a claimed request.
pub async fn finish_request<C>(db: &C, request_id: &str, status: RequestStatus) -> Result<()>
where
    C: ConnectionTrait,
{
    let existing = RedemptionRequest::find()
        .filter(redemption_request::Column::RequestId.eq(request_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::Config {
            message: format!("Redemption request '{request_id}' was never claimed"),
        })?;

    let mut request: redemption_request::ActiveModel = existing.into();
    request.status = Set(status.as_str().to_string());
    request.updated_at = Set(chrono::Utc::now());
    request.update(db).await?;
    Ok(())
}

/// Finds a request by its client-generated id.
pub async fn get_request<C>(db: &C, request_id: &str) -> Result<Option<redemption_request::Model>>
where
    C: ConnectionTrait,
{
    RedemptionRequest::find()
        .filter(redemption_request::Column::RequestId.eq(request_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Stores a reconciliation anomaly and returns its id.
pub async fn record_anomaly<C>(db: &C, anomaly: NewAnomaly) -> Result<i64>
where
    C: ConnectionTrait,
{
    error!(
        user_id = anomaly.user_id,
        reward_id = anomaly.reward_id,
        amount = anomaly.amount,
        "Reconciliation anomaly: {} points minted to {} without a ledger debit: {}",
        anomaly.amount,
        anomaly.wallet_address,
        anomaly.reason
    );

    let row = redemption_anomaly::ActiveModel {
        user_id: Set(anomaly.user_id),
        reward_id: Set(anomaly.reward_id),
        wallet_address: Set(anomaly.wallet_address),
        amount: Set(anomaly.amount),
        reason: Set(anomaly.reason),
        resolved: Set(false),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    let stored = row.insert(db).await?;
    Ok(stored.id)
}

/// Lists anomalies an operator has not resolved yet, oldest first.
pub async fn list_unresolved_anomalies<C>(db: &C) -> Result<Vec<redemption_anomaly::Model>>
where
    C: ConnectionTrait,
{
    RedemptionAnomaly::find()
        .filter(redemption_anomaly::Column::Resolved.eq(false))
        .order_by_asc(redemption_anomaly::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Marks an anomaly as corrected by an operator.
pub async fn resolve_anomaly<C>(db: &C, anomaly_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let existing = RedemptionAnomaly::find_by_id(anomaly_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::Config {
            message: format!("Anomaly {anomaly_id} not found"),
        })?;

    let mut anomaly: redemption_anomaly::ActiveModel = existing.into();
    anomaly.resolved = Set(true);
    anomaly.update(db).await?;

    info!("Anomaly {} resolved", anomaly_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_claim_request_rejects_reuse() -> Result<()> {
        let (db, user) = setup_with_user().await?;

        let claimed = claim_request(&db, "req-1", user.id, 7).await?;
        assert_eq!(claimed.status, "pending");
        assert_eq!(claimed.reward_id, 7);

        let again = claim_request(&db, "req-1", user.id, 7).await;
        assert!(matches!(
            again,
            Err(Error::DuplicateRequest { request_id }) if request_id == "req-1"
        ));

        // A different id is independent
        claim_request(&db, "req-2", user.id, 7).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_claims_yield_one_winner() -> Result<()> {
        let (db, user) = setup_with_user().await?;

        let (a, b) = tokio::join!(
            claim_request(&db, "dup", user.id, 1),
            claim_request(&db, "dup", user.id, 1)
        );

        let outcomes = [a, b];
        let won = outcomes.iter().filter(|r| r.is_ok()).count();
        let duplicates = outcomes
            .iter()
            .filter(|r| matches!(r, Err(Error::DuplicateRequest { request_id }) if request_id == "dup"))
            .count();
        assert_eq!(won, 1);
        assert_eq!(duplicates, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_finish_request_updates_status() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        claim_request(&db, "req-1", user.id, 0).await?;

        finish_request(&db, "req-1", RequestStatus::Completed).await?;
        let stored = get_request(&db, "req-1").await?.unwrap();
        assert_eq!(stored.status, "completed");

        // Finished requests still block reuse
        let again = claim_request(&db, "req-1", user.id, 0).await;
        assert!(matches!(again, Err(Error::DuplicateRequest { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_finish_unclaimed_request_fails() -> Result<()> {
        let db = setup_test_db().await?;
        let result = finish_request(&db, "missing", RequestStatus::Failed).await;
        assert!(matches!(result, Err(Error::Config { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_record_and_resolve_anomaly() -> Result<()> {
        let (db, user) = setup_with_user().await?;

        let id = record_anomaly(
            &db,
            NewAnomaly {
                user_id: user.id,
                reward_id: 3,
                wallet_address: "0xabc".to_string(),
                amount: 20,
                reason: "database is locked".to_string(),
            },
        )
        .await?;

        let open = list_unresolved_anomalies(&db).await?;
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, id);
        assert_eq!(open[0].amount, 20);
        assert_eq!(open[0].wallet_address, "0xabc");

        resolve_anomaly(&db, id).await?;
        assert!(list_unresolved_anomalies(&db).await?.is_empty());

        Ok(())
    }
}
