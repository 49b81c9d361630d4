//! Points ledger - Append-only transaction history and balance reconciliation.
//!
//! A user's spendable balance is never stored. It is derived on every read by folding
//! the full transaction history with [`reconcile`]: earning entries add their amount,
//! everything else subtracts it, and the result is clamped at zero. Ledger rows are
//! only ever inserted, never edited or deleted.

use crate::{
    entities::{Transaction, transaction},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix shared by every kind that credits points.
pub const EARNED_PREFIX: &str = "earned";

/// What a ledger entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Points earned by reporting waste
    EarnedReport,
    /// Points earned by collecting reported waste
    EarnedCollect,
    /// Points spent on a reward
    Redeemed,
}

impl TransactionKind {
    /// Value stored in the `transaction_type` column
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EarnedReport => "earned_report",
            Self::EarnedCollect => "earned_collect",
            Self::Redeemed => "redeemed",
        }
    }

    /// Whether entries of this kind credit the balance
    #[must_use]
    pub const fn is_earning(self) -> bool {
        matches!(self, Self::EarnedReport | Self::EarnedCollect)
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "earned_report" => Ok(Self::EarnedReport),
            "earned_collect" => Ok(Self::EarnedCollect),
            "redeemed" => Ok(Self::Redeemed),
            other => Err(Error::Config {
                message: format!("Unknown transaction type '{other}'"),
            }),
        }
    }
}

/// Derives the spendable balance from a user's transaction history.
///
/// Entries whose type starts with `"earned"` add their amount, all others subtract it.
/// The total is clamped at zero, so the result is never negative even if the ledger
/// holds more redemptions than earnings. Input order does not matter and an empty
/// history yields zero.
#[must_use]
pub fn reconcile<'a, I>(transactions: I) -> i64
where
    I: IntoIterator<Item = &'a transaction::Model>,
{
    // Exact in i128; clamping happens once at the end.
    let total = transactions.into_iter().fold(0_i128, |acc, entry| {
        let amount = i128::from(entry.amount);
        if entry.transaction_type.starts_with(EARNED_PREFIX) {
            acc + amount
        } else {
            acc - amount
        }
    });

    i64::try_from(total.max(0)).unwrap_or(i64::MAX)
}

/// Retrieves a user's full transaction history, newest first.
pub async fn list_transactions<C>(db: &C, user_id: i64) -> Result<Vec<transaction::Model>>
where
    C: ConnectionTrait,
{
    Transaction::find()
        .filter(transaction::Column::UserId.eq(user_id))
        .order_by_desc(transaction::Column::Timestamp)
        .order_by_desc(transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Appends a new entry to a user's ledger.
///
/// # Errors
/// Returns an error if:
/// - The amount is negative
/// - The database insert fails (including an unknown `user_id`)
pub async fn append_transaction<C>(
    db: &C,
    user_id: i64,
    kind: TransactionKind,
    amount: i64,
    description: String,
) -> Result<transaction::Model>
where
    C: ConnectionTrait,
{
    if amount < 0 {
        return Err(Error::InvalidAmount { amount });
    }

    let entry = transaction::ActiveModel {
        user_id: Set(user_id),
        transaction_type: Set(kind.as_str().to_string()),
        amount: Set(amount),
        description: Set(description),
        timestamp: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let result = entry.insert(db).await?;
    tracing::debug!(
        "Appended {} transaction {} of {} points for user {}",
        kind,
        result.id,
        amount,
        user_id
    );
    Ok(result)
}

/// Credits points earned by a report or collection.
///
/// Redemptions go through the redemption workflow instead, so a `Redeemed` kind is rejected.
pub async fn record_earning<C>(
    db: &C,
    user_id: i64,
    kind: TransactionKind,
    amount: i64,
    description: String,
) -> Result<transaction::Model>
where
    C: ConnectionTrait,
{
    if !kind.is_earning() {
        return Err(Error::Config {
            message: format!("'{kind}' is not an earning transaction type"),
        });
    }

    append_transaction(db, user_id, kind, amount, description).await
}

/// Reconciles a user's current balance from the database.
pub async fn get_user_balance<C>(db: &C, user_id: i64) -> Result<i64>
where
    C: ConnectionTrait,
{
    let transactions = list_transactions(db, user_id).await?;
    Ok(reconcile(&transactions))
}
