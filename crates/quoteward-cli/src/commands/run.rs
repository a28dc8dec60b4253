use std::sync::Arc;

use quoteward_core::alerts::LogNotifier;
use quoteward_core::{
    AlertEngine, InMemoryAlertRepository, MarketHub, QuotewardConfig, Scheduler,
    TokenBucketLimiter,
};

use crate::error::CliError;

/// Run every background job until Ctrl-C, then stop them all.
pub async fn run(config: &QuotewardConfig, hub: MarketHub) -> Result<(), CliError> {
    let mut scheduler = Scheduler::new();
    hub.schedule_refreshes(&mut scheduler);

    let engine = Arc::new(AlertEngine::new(
        Arc::new(InMemoryAlertRepository::new()),
        Arc::new(LogNotifier),
        Arc::new(hub),
        config.alerts,
    ));
    scheduler.spawn_every("alerts:sweep", config.alerts.sweep_period, move || {
        let engine = Arc::clone(&engine);
        async move {
            if let Err(error) = engine.sweep().await {
                tracing::error!(%error, code = error.code(), "alert sweep failed");
            }
        }
    });

    let limiter = TokenBucketLimiter::new(config.rate_limiter);
    scheduler.spawn_every("rate-limit:sweep", config.rate_limiter.sweep_period, move || {
        let limiter = limiter.clone();
        async move {
            limiter.sweep();
        }
    });

    tracing::info!(tasks = ?scheduler.task_names(), "quoteward running, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    tracing::info!("shutting down");
    scheduler.shutdown().await;
    Ok(())
}
