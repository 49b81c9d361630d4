/// Database configuration and connection management
pub mod database;

/// Reward catalog seeds and redemption settings loaded from config.toml
pub mod rewards;
