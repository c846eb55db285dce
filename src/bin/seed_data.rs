//! Seed data script - populates the farmers table with sample rows
//!
//! Run with: cargo run --bin seed-data
//!
//! Applies pending migrations first, then inserts the sample farmers.
//! Farmers whose phone is already registered are left untouched.

use anyhow::Context;
use tracing::info;

use farmers_api::{config, db, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::load_config().context("failed to load configuration")?;
    config::init_tracing(cfg.log_level(), cfg.log_json);

    info!("=== Farmers API Seed Data ===");

    let pool = db::establish_connection_from_app_config(&cfg).await?;
    db::run_migrations(&pool).await?;

    let inserted = seed::seed_farmers(&pool).await?;
    info!(
        "Inserted {} of {} sample farmers",
        inserted,
        seed::SAMPLE_FARMERS.len()
    );

    info!("Try: curl http://{}{}", cfg.bind_address(), cfg.farmers_path());

    db::close_pool(pool).await?;
    Ok(())
}
