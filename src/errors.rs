//! Unified error type for the reward ledger.
//!
//! Every variant's `Display` output is written to be shown to the user as-is.

use thiserror::Error;

/// All errors produced by the reward ledger and the redemption workflow.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Point amounts are non-negative integers
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: i64,
    },

    /// The reward is not in the user's available catalog
    #[error("Reward not found or no longer available: {reward_id}")]
    RewardNotFound {
        /// Requested reward id
        reward_id: i64,
    },

    /// No user session accompanies the request
    #[error("Please log in to redeem rewards.")]
    NotAuthenticated,

    /// The session has no wallet bound to it
    #[error("Please connect your wallet first.")]
    NoWallet,

    /// Reconciled balance does not cover the reward cost
    #[error("Insufficient balance to redeem this reward: {balance} points available, {required} required")]
    InsufficientBalance {
        /// Reconciled balance at validation time
        balance: i64,
        /// Cost of the requested reward
        required: i64,
    },

    /// "Redeem all" was requested with a zero balance
    #[error("You have no points to redeem.")]
    NothingToRedeem,

    /// The token mint failed; nothing was recorded
    #[error("Failed to mint reward tokens: {reason}")]
    MintFailed {
        /// Gateway failure description
        reason: String,
    },

    /// The token mint did not confirm in time; nothing was recorded
    #[error("Minting reward tokens timed out after {seconds}s")]
    MintTimeout {
        /// Configured timeout
        seconds: u64,
    },

    /// Tokens were minted but the points ledger was not debited
    #[error(
        "Tokens were minted but the redemption could not be recorded ({reason}); an operator has been notified"
    )]
    LedgerWriteFailed {
        /// Store failure description
        reason: String,
        /// Id of the reconciliation anomaly, if it could be recorded
        anomaly_id: Option<i64>,
    },

    /// The off-chain attestation failed
    #[error("Failed to record attestation: {reason}")]
    AttestationFailed {
        /// Gateway failure description
        reason: String,
    },

    /// The off-chain attestation did not complete in time
    #[error("Recording attestation timed out after {seconds}s")]
    AttestationTimeout {
        /// Configured timeout
        seconds: u64,
    },

    /// Another redemption for the same user is still running
    #[error("A redemption is already in progress for this account. Please wait for it to finish.")]
    RedemptionInProgress {
        /// User holding the lock
        user_id: i64,
    },

    /// The request id was already used for an earlier attempt
    #[error("This redemption request was already submitted.")]
    DuplicateRequest {
        /// Reused request id
        request_id: String,
    },
}

impl Error {
    /// Validation failures detected before any external call.
    ///
    /// These leave no trace and can be retried as soon as the condition is corrected.
    #[must_use]
    pub const fn is_retryable_locally(&self) -> bool {
        matches!(
            self,
            Self::NotAuthenticated
                | Self::NoWallet
                | Self::InsufficientBalance { .. }
                | Self::NothingToRedeem
                | Self::RewardNotFound { .. }
                | Self::RedemptionInProgress { .. }
        )
    }

    /// Attestation failures are never surfaced to the user.
    #[must_use]
    pub const fn is_user_visible(&self) -> bool {
        !matches!(
            self,
            Self::AttestationFailed { .. } | Self::AttestationTimeout { .. }
        )
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_locally_retryable() {
        assert!(Error::NotAuthenticated.is_retryable_locally());
        assert!(Error::NoWallet.is_retryable_locally());
        assert!(
            Error::InsufficientBalance {
                balance: 10,
                required: 20
            }
            .is_retryable_locally()
        );
        assert!(
            !Error::MintFailed {
                reason: "reverted".to_string()
            }
            .is_retryable_locally()
        );
        assert!(
            !Error::LedgerWriteFailed {
                reason: "disk full".to_string(),
                anomaly_id: Some(1)
            }
            .is_retryable_locally()
        );
    }

    #[test]
    fn test_only_attestation_errors_are_hidden() {
        assert!(
            !Error::AttestationFailed {
                reason: "schema missing".to_string()
            }
            .is_user_visible()
        );
        assert!(!Error::AttestationTimeout { seconds: 30 }.is_user_visible());
        assert!(Error::MintTimeout { seconds: 120 }.is_user_visible());
        assert!(Error::NothingToRedeem.is_user_visible());
    }

    #[test]
    fn test_messages_are_distinct() {
        let messages = [
            Error::NotAuthenticated.to_string(),
            Error::NoWallet.to_string(),
            Error::InsufficientBalance {
                balance: 1,
                required: 2,
            }
            .to_string(),
            Error::NothingToRedeem.to_string(),
            Error::MintFailed {
                reason: "x".to_string(),
            }
            .to_string(),
            Error::LedgerWriteFailed {
                reason: "x".to_string(),
                anomaly_id: None,
            }
            .to_string(),
        ];
        for (i, a) in messages.iter().enumerate() {
            for b in &messages[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
