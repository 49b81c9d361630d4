//! External gateways - Token minting and activity attestation.
//!
//! The reward ledger never talks to a chain or an attestation service directly.
//! Callers construct concrete clients at startup, hand them to the
//! [`crate::core::redemption::RewardService`], and close them at shutdown through
//! [`TokenGateway::close`] and [`AttestationGateway::close`].

use async_trait::async_trait;
use thiserror::Error;

/// Failure reported by an external gateway.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// The wallet owner declined to sign
    #[error("signature rejected: {reason}")]
    Rejected {
        /// Signer-provided reason
        reason: String,
    },
    /// The transaction was mined but reverted
    #[error("transaction reverted: {reason}")]
    Reverted {
        /// Revert reason
        reason: String,
    },
    /// The service could not be reached or answered with an error
    #[error("gateway unavailable: {reason}")]
    Unavailable {
        /// Transport or service error
        reason: String,
    },
}

/// Result type returned by gateways
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Proof that a mint was confirmed on chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintReceipt {
    /// Hash of the confirmed transaction
    pub transaction_hash: String,
}

/// Identifier of a recorded attestation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationReceipt {
    /// Attestation id assigned by the service
    pub attestation_id: String,
}

/// Mints reward tokens and reports on-chain balances.
#[async_trait]
pub trait TokenGateway: Send + Sync {
    /// Mints `amount` points' worth of tokens to `wallet_address` and waits for confirmation.
    async fn mint(&self, wallet_address: &str, amount: i64) -> GatewayResult<MintReceipt>;

    /// Current token balance of `wallet_address`, formatted for display.
    async fn token_balance(&self, wallet_address: &str) -> GatewayResult<String>;

    /// Releases any connection held by the client.
    async fn close(&self) -> GatewayResult<()> {
        Ok(())
    }
}

/// Records advisory, off-chain attestations of user activity.
#[async_trait]
pub trait AttestationGateway: Send + Sync {
    /// Attests that `wallet_address` performed `activity_type`.
    async fn record_activity(
        &self,
        wallet_address: &str,
        activity_type: &str,
        details: &str,
    ) -> GatewayResult<AttestationReceipt>;

    /// Releases any connection held by the client.
    async fn close(&self) -> GatewayResult<()> {
        Ok(())
    }
}
