//! Reward catalog business logic - Listing, creating, seeding and consuming rewards.
//!
//! Rewards are per-user catalog rows with a point cost. Redeeming one marks it
//! unavailable. The "redeem all points" option uses the reserved id
//! [`REDEEM_ALL_REWARD_ID`] and never exists as a row.

use crate::{
    config::rewards::RewardConfig,
    entities::{Reward, reward},
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, QueryOrder, Set, prelude::*};
use tracing::{debug, info};

/// Reserved id of the synthesized "redeem all points" option.
pub const REDEEM_ALL_REWARD_ID: i64 = 0;

/// Retrieves the rewards a user can currently redeem, cheapest first.
///
/// Rewards that cost nothing are excluded.
pub async fn list_available_rewards<C>(db: &C, user_id: i64) -> Result<Vec<reward::Model>>
where
    C: ConnectionTrait,
{
    Reward::find()
        .filter(reward::Column::UserId.eq(user_id))
        .filter(reward::Column::IsAvailable.eq(true))
        .filter(reward::Column::Cost.gt(0))
        .order_by_asc(reward::Column::Cost)
        .order_by_asc(reward::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a specific reward by its unique ID, available or not.
pub async fn get_reward_by_id<C>(db: &C, reward_id: i64) -> Result<Option<reward::Model>>
where
    C: ConnectionTrait,
{
    Reward::find_by_id(reward_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a new reward in a user's catalog, performing input validation.
///
/// # Errors
/// Returns an error if:
/// - The reward name is empty or whitespace-only
/// - The cost is negative
/// - The database insert operation fails
pub async fn create_reward<C>(
    db: &C,
    user_id: i64,
    name: String,
    cost: i64,
    description: Option<String>,
    collection_info: String,
) -> Result<reward::Model>
where
    C: ConnectionTrait,
{
    if name.trim().is_empty() {
        return Err(Error::Config {
            message: "Reward name cannot be empty".to_string(),
        });
    }

    if cost < 0 {
        return Err(Error::InvalidAmount { amount: cost });
    }

    let now = chrono::Utc::now();
    let reward = reward::ActiveModel {
        user_id: Set(user_id),
        name: Set(name.trim().to_string()),
        cost: Set(cost),
        description: Set(description),
        collection_info: Set(collection_info),
        is_available: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    reward.insert(db).await.map_err(Into::into)
}

/// Marks a reward as consumed after it has been redeemed.
///
/// The "redeem all points" id has no catalog row and is accepted as a no-op.
///
/// # Errors
/// Returns [`Error::RewardNotFound`] if the reward does not exist, belongs to another
/// user, or was already redeemed.
pub async fn mark_redeemed<C>(db: &C, user_id: i64, reward_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    if reward_id == REDEEM_ALL_REWARD_ID {
        return Ok(());
    }

    let existing = Reward::find_by_id(reward_id)
        .one(db)
        .await?
        .filter(|r| r.user_id == user_id && r.is_available)
        .ok_or(Error::RewardNotFound { reward_id })?;

    let mut reward: reward::ActiveModel = existing.into();
    reward.is_available = Set(false);
    reward.updated_at = Set(chrono::Utc::now());
    reward.update(db).await?;

    debug!("Reward {} marked redeemed for user {}", reward_id, user_id);
    Ok(())
}

/// Seeds a user's catalog from configuration if they have no rewards yet.
///
/// Returns the number of rewards created.
pub async fn seed_rewards<C>(db: &C, user_id: i64, seeds: &[RewardConfig]) -> Result<usize>
where
    C: ConnectionTrait,
{
    let existing = Reward::find()
        .filter(reward::Column::UserId.eq(user_id))
        .count(db)
        .await?;
    if existing > 0 {
        debug!(
            "User {} already has {} rewards, skipping seed",
            user_id, existing
        );
        return Ok(0);
    }

    for seed in seeds {
        create_reward(
            db,
            user_id,
            seed.name.clone(),
            seed.cost,
            seed.description.clone(),
            seed.collection_info.clone(),
        )
        .await?;
    }

    info!("Seeded {} rewards for user {}", seeds.len(), user_id);
    Ok(seeds.len())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_reward_validation() -> Result<()> {
        let (db, user) = setup_with_user().await?;

        let result = create_reward(&db, user.id, "  ".to_string(), 10, None, String::new()).await;
        assert!(matches!(result, Err(Error::Config { .. })));

        let result = create_reward(&db, user.id, "Bag".to_string(), -10, None, String::new()).await;
        assert!(matches!(result, Err(Error::InvalidAmount { amount: -10 })));
        assert!(list_available_rewards(&db, user.id).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_mark_redeemed_not_found() -> Result<()> {
        let (db, user) = setup_with_user().await?;

        let result = mark_redeemed(&db, user.id, 42).await;
        assert!(matches!(
            result,
            Err(Error::RewardNotFound { reward_id: 42 })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_mark_redeemed_redeem_all_is_noop() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        let bag = create_test_reward(&db, user.id, "Eco Tote Bag", 50).await?;

        mark_redeemed(&db, user.id, REDEEM_ALL_REWARD_ID).await?;

        let stored = get_reward_by_id(&db, bag.id).await?.unwrap();
        assert!(stored.is_available);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_available_rewards_filters_and_orders() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        let other = create_test_user(&db, "other@example.com").await?;

        create_test_reward(&db, user.id, "Plant a Tree", 200).await?;
        create_test_reward(&db, user.id, "Eco Tote Bag", 50).await?;
        create_test_reward(&db, user.id, "Free Sticker", 0).await?;
        create_test_reward(&db, other.id, "Not Mine", 10).await?;

        let rewards = list_available_rewards(&db, user.id).await?;
        let names: Vec<&str> = rewards.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Eco Tote Bag", "Plant a Tree"]);

        Ok(())
    }

    #[tokio::test]
    async fn test_mark_redeemed_integration() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        let reward = create_test_reward(&db, user.id, "Eco Tote Bag", 50).await?;

        mark_redeemed(&db, user.id, reward.id).await?;

        let stored = get_reward_by_id(&db, reward.id).await?.unwrap();
        assert!(!stored.is_available);
        assert!(list_available_rewards(&db, user.id).await?.is_empty());

        // Cannot be consumed twice
        let again = mark_redeemed(&db, user.id, reward.id).await;
        assert!(matches!(again, Err(Error::RewardNotFound { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_mark_redeemed_rejects_other_users_reward() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        let other = create_test_user(&db, "other@example.com").await?;
        let reward = create_test_reward(&db, other.id, "Not Mine", 10).await?;

        let result = mark_redeemed(&db, user.id, reward.id).await;
        assert!(matches!(result, Err(Error::RewardNotFound { .. })));

        let stored = get_reward_by_id(&db, reward.id).await?.unwrap();
        assert!(stored.is_available);

        Ok(())
    }

    #[tokio::test]
    async fn test_seed_rewards_only_once() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        let seeds = vec![
            RewardConfig {
                name: "Eco Tote Bag".to_string(),
                cost: 50,
                description: Some("Reusable cotton bag".to_string()),
                collection_info: "Community center".to_string(),
            },
            RewardConfig {
                name: "Plant a Tree".to_string(),
                cost: 200,
                description: None,
                collection_info: "Planted on your behalf".to_string(),
            },
        ];

        assert_eq!(seed_rewards(&db, user.id, &seeds).await?, 2);
        assert_eq!(seed_rewards(&db, user.id, &seeds).await?, 0);
        assert_eq!(list_available_rewards(&db, user.id).await?.len(), 2);

        Ok(())
    }
}
