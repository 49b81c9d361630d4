//! Rewards overview - The read model shown on the rewards page.
//!
//! Bundles the ledger history, the reconciled balance, the redeemable catalog with
//! the synthesized "redeem all points" option, and the wallet's token balance.

use crate::{
    config::rewards::ValuationConfig,
    core::{
        ledger::reconcile,
        reward::REDEEM_ALL_REWARD_ID,
        store::{RewardCatalog, TransactionStore},
    },
    entities::{reward, transaction},
    errors::Result,
    gateway::TokenGateway,
};
use tracing::warn;

/// One row of the redeemable catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardOption {
    /// Reward id, [`REDEEM_ALL_REWARD_ID`] for the "redeem all points" option
    pub id: i64,
    /// Display name
    pub name: String,
    /// Cost in points; the whole balance for "redeem all points"
    pub cost: i64,
    /// Optional longer description
    pub description: Option<String>,
    /// Where and how the reward is collected
    pub collection_info: String,
    /// Whether the current balance covers the cost
    pub redeemable: bool,
}

impl RewardOption {
    /// The synthesized option that redeems the entire balance.
    #[must_use]
    pub fn redeem_all(balance: i64) -> Self {
        Self {
            id: REDEEM_ALL_REWARD_ID,
            name: "Your Points".to_string(),
            cost: balance,
            description: Some("Redeem all your earned points".to_string()),
            collection_info: "Points earned from reporting and collecting waste".to_string(),
            redeemable: balance > 0,
        }
    }

    fn from_reward(reward: reward::Model, balance: i64) -> Self {
        Self {
            redeemable: balance >= reward.cost,
            id: reward.id,
            name: reward.name,
            cost: reward.cost,
            description: reward.description,
            collection_info: reward.collection_info,
        }
    }

    /// Whether this is the "redeem all points" option.
    #[must_use]
    pub const fn is_redeem_all(&self) -> bool {
        self.id == REDEEM_ALL_REWARD_ID
    }
}

/// Everything the rewards page needs for one user.
#[derive(Debug, Clone)]
pub struct RewardsOverview {
    /// User the overview was built for
    pub user_id: i64,
    /// Reconciled spendable balance
    pub balance: i64,
    /// Ledger history, newest first
    pub transactions: Vec<transaction::Model>,
    /// Redeem-all option followed by the available catalog
    pub rewards: Vec<RewardOption>,
    /// On-chain token balance, when a wallet is bound and the gateway answered
    pub token_balance: Option<String>,
    /// `balance` in USD, once a valuation is applied
    pub balance_usd: Option<String>,
    /// `token_balance` in USD, once a valuation is applied and the balance parses
    pub token_balance_usd: Option<String>,
}

impl RewardsOverview {
    /// Fills in the USD values at the given rate.
    #[must_use]
    pub fn with_valuation(mut self, valuation: &ValuationConfig) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let points = self.balance as f64;
        self.balance_usd = Some(valuation.to_usd(points));
        self.token_balance_usd = self
            .token_balance
            .as_deref()
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .map(|tokens| valuation.to_usd(tokens));
        self
    }
}

/// Builds the overview from the store, the catalog and, optionally, the token gateway.
///
/// A token balance lookup failure is logged and leaves `token_balance` empty.
pub async fn load_overview(
    store: &dyn TransactionStore,
    catalog: &dyn RewardCatalog,
    token: Option<&dyn TokenGateway>,
    user_id: i64,
    wallet_address: Option<&str>,
) -> Result<RewardsOverview> {
    let transactions = store.list_transactions(user_id).await?;
    let balance = reconcile(&transactions);

    let mut rewards = vec![RewardOption::redeem_all(balance)];
    rewards.extend(
        catalog
            .list_available_rewards(user_id)
            .await?
            .into_iter()
            .filter(|r| r.cost > 0)
            .map(|r| RewardOption::from_reward(r, balance)),
    );

    let token_balance = match (token, wallet_address) {
        (Some(gateway), Some(wallet)) => match gateway.token_balance(wallet).await {
            Ok(amount) => Some(amount),
            Err(e) => {
                warn!("Failed to fetch token balance for {}: {}", wallet, e);
                None
            }
        },
        _ => None,
    };

    Ok(RewardsOverview {
        user_id,
        balance,
        transactions,
        rewards,
        token_balance,
        balance_usd: None,
        token_balance_usd: None,
    })
}
