//! Shared test utilities for the reward ledger.
//!
//! This module provides common helper functions for setting up test databases,
//! creating test entities with sensible defaults, and in-memory gateway fakes.

use crate::{
    core::{ledger, reward, user},
    entities,
    errors::Result,
    gateway::{
        AttestationGateway, AttestationReceipt, GatewayError, GatewayResult, MintReceipt,
        TokenGateway,
    },
};
use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use std::sync::{
    Mutex, PoisonError,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;

/// Wallet address used by default in tests
pub const TEST_WALLET: &str = "0x00000000000000000000000000000000000000a1";

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a test user named after the email's local part.
pub async fn create_test_user(db: &DatabaseConnection, email: &str) -> Result<entities::user::Model> {
    user::get_or_create_user(db, email).await
}

/// Sets up a database with one user, `test@example.com`.
pub async fn setup_with_user() -> Result<(DatabaseConnection, entities::user::Model)> {
    let db = setup_test_db().await?;
    let user = create_test_user(&db, "test@example.com").await?;
    Ok((db, user))
}

/// Creates an available reward with a default collection note.
pub async fn create_test_reward(
    db: &DatabaseConnection,
    user_id: i64,
    name: &str,
    cost: i64,
) -> Result<entities::reward::Model> {
    reward::create_reward(
        db,
        user_id,
        name.to_string(),
        cost,
        None,
        "Pick up at the community center".to_string(),
    )
    .await
}

/// Credits points as if earned by a waste report.
pub async fn earn_points(
    db: &DatabaseConnection,
    user_id: i64,
    amount: i64,
) -> Result<entities::transaction::Model> {
    ledger::record_earning(
        db,
        user_id,
        ledger::TransactionKind::EarnedReport,
        amount,
        "Points earned for reporting waste".to_string(),
    )
    .await
}

/// Token gateway fake that records mints in memory.
#[derive(Debug, Default)]
pub struct FakeTokenGateway {
    mints: Mutex<Vec<(String, i64)>>,
    fail_with: Option<GatewayError>,
    delay: Option<Duration>,
    closes: AtomicUsize,
    fail_close: bool,
}

impl FakeTokenGateway {
    /// A gateway where every call succeeds immediately.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A gateway whose mint and balance calls revert.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_with: Some(GatewayError::Reverted {
                reason: "execution reverted".to_string(),
            }),
            ..Self::default()
        }
    }

    /// A gateway that waits `delay` before minting.
    #[must_use]
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Every successful mint so far, in order.
    pub fn mints(&self) -> Vec<(String, i64)> {
        self.mints
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Makes `close` report an error after counting the call.
    #[must_use]
    pub fn with_failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    /// How many times `close` was called.
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenGateway for FakeTokenGateway {
    async fn mint(&self, wallet_address: &str, amount: i64) -> GatewayResult<MintReceipt> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(e) = &self.fail_with {
            return Err(e.clone());
        }

        let mut mints = self.mints.lock().unwrap_or_else(PoisonError::into_inner);
        mints.push((wallet_address.to_string(), amount));
        Ok(MintReceipt {
            transaction_hash: format!("0x{:064x}", mints.len()),
        })
    }

    async fn token_balance(&self, wallet_address: &str) -> GatewayResult<String> {
        if let Some(e) = &self.fail_with {
            return Err(e.clone());
        }

        let total: i64 = self
            .mints()
            .iter()
            .filter(|(wallet, _)| wallet == wallet_address)
            .map(|(_, amount)| amount)
            .sum();
        Ok(total.to_string())
    }

    async fn close(&self) -> GatewayResult<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err(GatewayError::Unavailable {
                reason: "provider already disconnected".to_string(),
            });
        }
        Ok(())
    }
}

/// Attestation gateway fake that records activities in memory.
#[derive(Debug, Default)]
pub struct FakeAttestationGateway {
    activities: Mutex<Vec<(String, String, String)>>,
    fail_with: Option<GatewayError>,
    delay: Option<Duration>,
    closes: AtomicUsize,
    fail_close: bool,
}

impl FakeAttestationGateway {
    /// A gateway where every call succeeds immediately.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A gateway that is always unreachable.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_with: Some(GatewayError::Unavailable {
                reason: "attestation service unreachable".to_string(),
            }),
            ..Self::default()
        }
    }

    /// A gateway that waits `delay` before answering.
    #[must_use]
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Every recorded `(wallet, activity_type, details)`, in order.
    pub fn activities(&self) -> Vec<(String, String, String)> {
        self.activities
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Makes `close` report an error after counting the call.
    #[must_use]
    pub fn with_failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    /// How many times `close` was called.
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AttestationGateway for FakeAttestationGateway {
    async fn record_activity(
        &self,
        wallet_address: &str,
        activity_type: &str,
        details: &str,
    ) -> GatewayResult<AttestationReceipt> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(e) = &self.fail_with {
            return Err(e.clone());
        }

        let mut activities = self
            .activities
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        activities.push((
            wallet_address.to_string(),
            activity_type.to_string(),
            details.to_string(),
        ));
        Ok(AttestationReceipt {
            attestation_id: format!("0x{:x}", activities.len()),
        })
    }

    async fn close(&self) -> GatewayResult<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err(GatewayError::Unavailable {
                reason: "signer already dropped".to_string(),
            });
        }
        Ok(())
    }
}
