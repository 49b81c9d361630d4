//! Redemption workflow - Turning points into minted reward tokens.
//!
//! A redemption runs these steps strictly in order, each waiting for the previous one:
//!
//! 1. **Validate** the session, the wallet, and the reconciled balance against the cost.
//! 2. **Mint** tokens to the wallet. A failure or timeout aborts with nothing recorded.
//! 3. **Record** the redemption: consume the catalog entry and append a `redeemed`
//!    ledger entry. If this fails after the mint, a reconciliation anomaly is stored
//!    and [`Error::LedgerWriteFailed`] is returned; it is never reported as success.
//! 4. **Attest** the activity. Best effort: failures are logged and swallowed.
//! 5. **Refresh** the rewards overview for the caller.
//!
//! Nothing here is transactional across the external systems. Double redemption is
//! prevented by a per-user in-process guard and by a per-request idempotency key
//! claimed in the [`RedemptionJournal`] before the mint.

use crate::{
    config::rewards::{RedemptionConfig, ValuationConfig},
    core::{
        journal::{NewAnomaly, RequestStatus},
        ledger::{TransactionKind, reconcile},
        overview::{RewardsOverview, load_overview},
        reward::REDEEM_ALL_REWARD_ID,
        store::{RedemptionJournal, RewardCatalog, SeaOrmStore, TransactionStore},
    },
    entities::transaction,
    errors::{Error, Result},
    gateway::{AttestationGateway, AttestationReceipt, MintReceipt, TokenGateway},
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};

/// What the user asked to redeem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedemptionTarget {
    /// A specific catalog reward
    Reward(i64),
    /// The entire reconciled balance
    AllPoints,
}

impl RedemptionTarget {
    /// Maps a catalog id to a target, treating [`REDEEM_ALL_REWARD_ID`] as "all points".
    #[must_use]
    pub const fn from_reward_id(reward_id: i64) -> Self {
        if reward_id == REDEEM_ALL_REWARD_ID {
            Self::AllPoints
        } else {
            Self::Reward(reward_id)
        }
    }

    /// Catalog id of the target.
    #[must_use]
    pub const fn reward_id(self) -> i64 {
        match self {
            Self::Reward(id) => id,
            Self::AllPoints => REDEEM_ALL_REWARD_ID,
        }
    }
}

/// One redemption request as submitted by the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedemptionAttempt {
    /// Client-generated idempotency key, unique per attempt
    pub request_id: String,
    /// Logged-in user, if any
    pub user_id: Option<i64>,
    /// Connected wallet, if any
    pub wallet_address: Option<String>,
    /// What to redeem
    pub target: RedemptionTarget,
}

/// Outcome of a successful redemption.
#[derive(Debug, Clone)]
pub struct RedemptionReceipt {
    /// Idempotency key of the attempt
    pub request_id: String,
    /// Ledger entry debiting the points
    pub transaction: transaction::Model,
    /// Confirmed mint
    pub mint: MintReceipt,
    /// Attestation, if it was recorded
    pub attestation: Option<AttestationReceipt>,
    /// Refreshed overview, if it could be loaded
    pub overview: Option<RewardsOverview>,
}

/// Validated redemption, ready to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RedemptionPlan {
    reward_id: i64,
    amount: i64,
    description: String,
    activity_type: &'static str,
}

/// Users with a redemption currently running.
#[derive(Debug, Default)]
struct InFlightUsers {
    users: Mutex<HashSet<i64>>,
}

impl InFlightUsers {
    fn try_acquire(&self, user_id: i64) -> Option<UserGuard<'_>> {
        let inserted = self
            .users
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user_id);
        if !inserted {
            return None;
        }
        Some(UserGuard {
            owner: self,
            user_id,
        })
    }
}

/// Releases the user's slot when the redemption ends, however it ends.
struct UserGuard<'a> {
    owner: &'a InFlightUsers,
    user_id: i64,
}

impl Drop for UserGuard<'_> {
    fn drop(&mut self) {
        self.owner
            .users
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.user_id);
    }
}

/// Entry point for balance queries and redemptions.
///
/// All collaborators are injected. Build one at startup, share it between request
/// handlers, and call [`RewardService::shutdown`] before exiting.
pub struct RewardService {
    transactions: Arc<dyn TransactionStore>,
    catalog: Arc<dyn RewardCatalog>,
    journal: Arc<dyn RedemptionJournal>,
    token: Arc<dyn TokenGateway>,
    attestation: Arc<dyn AttestationGateway>,
    config: RedemptionConfig,
    valuation: Option<ValuationConfig>,
    in_flight: InFlightUsers,
}

impl RewardService {
    /// Creates a service from explicit collaborators.
    #[must_use]
    pub fn new(
        transactions: Arc<dyn TransactionStore>,
        catalog: Arc<dyn RewardCatalog>,
        journal: Arc<dyn RedemptionJournal>,
        token: Arc<dyn TokenGateway>,
        attestation: Arc<dyn AttestationGateway>,
        config: RedemptionConfig,
    ) -> Self {
        Self {
            transactions,
            catalog,
            journal,
            token,
            attestation,
            config,
            valuation: None,
            in_flight: InFlightUsers::default(),
        }
    }

    /// Values every overview this service builds in USD at the given rate.
    #[must_use]
    pub fn with_valuation(mut self, valuation: ValuationConfig) -> Self {
        self.valuation = Some(valuation);
        self
    }

    /// Creates a service whose storage seams are all backed by one database store.
    #[must_use]
    pub fn with_store(
        store: SeaOrmStore,
        token: Arc<dyn TokenGateway>,
        attestation: Arc<dyn AttestationGateway>,
        config: RedemptionConfig,
    ) -> Self {
        let store = Arc::new(store);
        Self::new(
            Arc::clone(&store) as Arc<dyn TransactionStore>,
            Arc::clone(&store) as Arc<dyn RewardCatalog>,
            store,
            token,
            attestation,
            config,
        )
    }

    /// Reconciled spendable balance of a user.
    pub async fn balance(&self, user_id: i64) -> Result<i64> {
        let transactions = self.transactions.list_transactions(user_id).await?;
        Ok(reconcile(&transactions))
    }

    /// Rewards overview of a user, including the on-chain balance when a wallet is given.
    pub async fn overview(
        &self,
        user_id: i64,
        wallet_address: Option<&str>,
    ) -> Result<RewardsOverview> {
        let overview = load_overview(
            self.transactions.as_ref(),
            self.catalog.as_ref(),
            Some(self.token.as_ref()),
            user_id,
            wallet_address,
        )
        .await?;

        Ok(match &self.valuation {
            Some(valuation) => overview.with_valuation(valuation),
            None => overview,
        })
    }

    /// Redeems a reward, or the whole balance, for the attempt's user.
    ///
    /// # Errors
    /// - [`Error::NotAuthenticated`], [`Error::NoWallet`], [`Error::RewardNotFound`],
    ///   [`Error::InsufficientBalance`], [`Error::NothingToRedeem`]: nothing happened.
    /// - [`Error::RedemptionInProgress`], [`Error::DuplicateRequest`]: rejected before any
    ///   side effect.
    /// - [`Error::MintFailed`], [`Error::MintTimeout`]: the mint did not confirm and
    ///   nothing was recorded.
    /// - [`Error::LedgerWriteFailed`]: tokens were minted but the ledger was not debited;
    ///   an anomaly was recorded for manual correction.
    #[instrument(
        skip(self, attempt),
        fields(request_id = %attempt.request_id, reward_id = attempt.target.reward_id())
    )]
    pub async fn redeem(&self, attempt: RedemptionAttempt) -> Result<RedemptionReceipt> {
        let user_id = attempt.user_id.ok_or(Error::NotAuthenticated)?;
        let wallet = attempt
            .wallet_address
            .as_deref()
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .ok_or(Error::NoWallet)?;

        let _guard = self
            .in_flight
            .try_acquire(user_id)
            .ok_or(Error::RedemptionInProgress { user_id })?;

        let plan = self.plan(user_id, attempt.target).await?;
        debug!(
            "Redemption of {} points validated for user {}",
            plan.amount, user_id
        );

        self.journal
            .claim_request(&attempt.request_id, user_id, plan.reward_id)
            .await?;

        let mint = match self.mint(wallet, plan.amount).await {
            Ok(receipt) => receipt,
            Err(e) => {
                self.finish(&attempt.request_id, RequestStatus::Failed).await;
                return Err(e);
            }
        };

        let transaction = match self.record(user_id, wallet, &plan).await {
            Ok(entry) => entry,
            Err(e) => {
                self.finish(&attempt.request_id, RequestStatus::NeedsReconciliation)
                    .await;
                return Err(e);
            }
        };
        self.finish(&attempt.request_id, RequestStatus::Completed)
            .await;

        let attestation = self.attest(wallet, &plan).await;

        let overview = match self.overview(user_id, Some(wallet)).await {
            Ok(overview) => Some(overview),
            Err(e) => {
                warn!("Redemption recorded but refresh failed: {}", e);
                None
            }
        };

        info!(
            "User {} redeemed {} points: {}",
            user_id, plan.amount, plan.description
        );
        Ok(RedemptionReceipt {
            request_id: attempt.request_id,
            transaction,
            mint,
            attestation,
            overview,
        })
    }

    /// Closes both gateways. Failures are logged; shutdown always completes.
    pub async fn shutdown(&self) {
        if let Err(e) = self.token.close().await {
            warn!("Failed to close token gateway: {}", e);
        }
        if let Err(e) = self.attestation.close().await {
            warn!("Failed to close attestation gateway: {}", e);
        }
        info!("Reward service shut down");
    }

    async fn plan(&self, user_id: i64, target: RedemptionTarget) -> Result<RedemptionPlan> {
        let balance = self.balance(user_id).await?;

        match target {
            RedemptionTarget::AllPoints => {
                if balance == 0 {
                    return Err(Error::NothingToRedeem);
                }
                Ok(RedemptionPlan {
                    reward_id: REDEEM_ALL_REWARD_ID,
                    amount: balance,
                    description: "Redeemed all points".to_string(),
                    activity_type: "Redeem All Points",
                })
            }
            RedemptionTarget::Reward(reward_id) => {
                let reward = self
                    .catalog
                    .list_available_rewards(user_id)
                    .await?
                    .into_iter()
                    .find(|r| r.id == reward_id)
                    .ok_or(Error::RewardNotFound { reward_id })?;

                if balance < reward.cost {
                    return Err(Error::InsufficientBalance {
                        balance,
                        required: reward.cost,
                    });
                }
                Ok(RedemptionPlan {
                    reward_id,
                    amount: reward.cost,
                    description: format!("Redeemed {}", reward.name),
                    activity_type: "Redeem Reward",
                })
            }
        }
    }

    async fn mint(&self, wallet: &str, amount: i64) -> Result<MintReceipt> {
        match timeout(self.config.mint_timeout(), self.token.mint(wallet, amount)).await {
            Ok(Ok(receipt)) => {
                debug!("Mint confirmed: {}", receipt.transaction_hash);
                Ok(receipt)
            }
            Ok(Err(e)) => {
                warn!("Mint of {} to {} failed: {}", amount, wallet, e);
                Err(Error::MintFailed {
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                warn!(
                    "Mint of {} to {} timed out after {}s",
                    amount, wallet, self.config.mint_timeout_secs
                );
                Err(Error::MintTimeout {
                    seconds: self.config.mint_timeout_secs,
                })
            }
        }
    }

    async fn record(
        &self,
        user_id: i64,
        wallet: &str,
        plan: &RedemptionPlan,
    ) -> Result<transaction::Model> {
        let written: Result<transaction::Model> = async {
            self.catalog.mark_redeemed(user_id, plan.reward_id).await?;
            self.transactions
                .append_transaction(
                    user_id,
                    TransactionKind::Redeemed,
                    plan.amount,
                    plan.description.clone(),
                )
                .await
        }
        .await;

        let reason = match written {
            Ok(entry) => return Ok(entry),
            Err(e) => e.to_string(),
        };

        let anomaly = NewAnomaly {
            user_id,
            reward_id: plan.reward_id,
            wallet_address: wallet.to_string(),
            amount: plan.amount,
            reason: reason.clone(),
        };
        let anomaly_id = match self.journal.record_anomaly(anomaly).await {
            Ok(id) => Some(id),
            Err(e) => {
                error!(
                    "Could not store anomaly for user {} ({} points minted to {}): {}",
                    user_id, plan.amount, wallet, e
                );
                None
            }
        };

        Err(Error::LedgerWriteFailed { reason, anomaly_id })
    }

    async fn attest(&self, wallet: &str, plan: &RedemptionPlan) -> Option<AttestationReceipt> {
        let call = self
            .attestation
            .record_activity(wallet, plan.activity_type, &plan.description);

        let failure = match timeout(self.config.attestation_timeout(), call).await {
            Ok(Ok(receipt)) => return Some(receipt),
            Ok(Err(e)) => Error::AttestationFailed {
                reason: e.to_string(),
            },
            Err(_) => Error::AttestationTimeout {
                seconds: self.config.attestation_timeout_secs,
            },
        };

        warn!("{}; redemption continues", failure);
        None
    }

    async fn finish(&self, request_id: &str, status: RequestStatus) {
        if let Err(e) = self.journal.finish_request(request_id, status).await {
            warn!(
                "Failed to mark request {} as {}: {}",
                request_id,
                status.as_str(),
                e
            );
        }
    }
}
