use dotenvy::dotenv;
use recycle_rewards::{
    config::{database, rewards},
    core::{ledger::EARNED_PREFIX, overview::load_overview, reward, store::SeaOrmStore, user},
    errors::{Error, Result},
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables may also be set externally
    dotenv().ok();

    let email = std::env::args().nth(1).ok_or_else(|| Error::Config {
        message: "Usage: recycle-rewards <user-email>".to_string(),
    })?;

    // 3. Load the reward catalog and redemption settings
    let app_config = rewards::load_default_config()
        .inspect_err(|e| error!("Failed to load reward configuration: {}", e))?;
    info!(
        "Loaded {} catalog rewards (mint timeout {}s, attestation timeout {}s)",
        app_config.rewards.len(),
        app_config.redemption.mint_timeout_secs,
        app_config.redemption.attestation_timeout_secs
    );

    // 4. Initialize database
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db).await?;

    // 5. Make sure the user exists and has a catalog
    let account = user::get_or_create_user(&db, &email).await?;
    reward::seed_rewards(&db, account.id, &app_config.rewards).await?;

    // 6. Print the rewards overview
    let store = SeaOrmStore::new(db);
    let overview = load_overview(&store, &store, None, account.id, None)
        .await?
        .with_valuation(&app_config.valuation);

    println!("{} <{}>", account.name, account.email);
    println!(
        "Balance: {} points (~${} USD)",
        overview.balance,
        overview.balance_usd.as_deref().unwrap_or("-")
    );
    println!();
    println!("Recent transactions:");
    if overview.transactions.is_empty() {
        println!("  (none)");
    }
    for entry in overview.transactions.iter().take(10) {
        let sign = if entry.transaction_type.starts_with(EARNED_PREFIX) {
            '+'
        } else {
            '-'
        };
        println!(
            "  {}  {}{:<6} {}",
            entry.timestamp.format("%Y-%m-%d"),
            sign,
            entry.amount,
            entry.description
        );
    }
    println!();
    println!("Rewards:");
    for option in &overview.rewards {
        let marker = if option.redeemable { '*' } else { ' ' };
        println!(
            "  {} [{:>3}] {:<24} {:>6} pts  {}",
            marker, option.id, option.name, option.cost, option.collection_info
        );
    }

    store.close().await?;
    Ok(())
}
