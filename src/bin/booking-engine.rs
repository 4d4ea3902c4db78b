use std::sync::Arc;

use anyhow::Context;
use booking_engine::{
    logger::init_tracing, AppConfig, BookingCache, BookingEngine, BookingRequest, BookingStore,
    SimulatedCreditCheck, SortOption, Sweeper,
};
use tokio::runtime::Handle;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = AppConfig::from_env();
    init_tracing(cfg.json_logs);

    tracing::info!(?cfg, "Starting booking engine...");

    let runtime = Handle::current();
    let engine = Arc::new(BookingEngine::new(
        Arc::new(BookingCache::new()),
        Arc::new(BookingStore::new()),
        Arc::new(SimulatedCreditCheck::new(cfg.credit_check.clone())),
        cfg.engine.clone(),
        runtime.clone(),
    ));

    let sweeper = Sweeper::spawn(engine.clone(), cfg.engine.sweep_interval, &runtime);

    // A couple of sample bookings so the log shows both paths
    for (user, service, price) in [("demo-user", "massage", 1200.0), ("demo-user", "suite", 75000.0)] {
        let booking = engine
            .create_booking(BookingRequest::new(user, service, price))
            .context("failed to create sample booking")?;
        tracing::info!(booking = %serde_json::to_string(&booking)?, "sample booking");
    }

    let listed = engine.list_bookings(Some(SortOption::Price), None);
    tracing::info!(count = listed.len(), "bookings loaded");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    sweeper.shutdown().await;
    Ok(())
}
