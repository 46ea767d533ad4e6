use std::time::Duration;

use actix_web::web;

use crate::state::AppState;

const CLEANUP_INTERVAL: Duration = Duration::from_secs(3600);

/// Start the background jobs: hourly notification cleanup and the cache
/// sweepers.
pub fn spawn_scheduler(state: web::Data<AppState>) {
    let sweep = state.config.cache.sweep_interval;
    state.identities.spawn_sweeper("identities", sweep);
    state.templates.spawn_sweeper("templates", sweep);
    state.rate_limiter.spawn_sweeper(sweep);

    actix_web::rt::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            let days = state.config.notification_retention_days;
            match super::queries::cleanup_read_older_than(&state.pool, days).await {
                Ok(0) => {}
                Ok(removed) => log::info!("Removed {removed} read notifications older than {days} days"),
                Err(e) => log::error!("Notification cleanup failed: {e}"),
            }
        }
    });
}
