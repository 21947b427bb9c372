// src/services/scheduler.rs
use anyhow::{anyhow, Result};
use log::info;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};

use super::watchlist::{refresh_all, AppState};

/// Start a background job that refreshes the whole watchlist on a cron schedule.
///
/// The schedule uses the six-field form with seconds, e.g. `0 */15 * * * *`.
pub async fn start_refresh_job(state: Arc<AppState>, schedule: &str) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new()
        .await
        .map_err(|e| anyhow!("Failed to create scheduler: {:?}", e))?;

    let job = Job::new_async(schedule, move |_id, _lock| {
        let state = state.clone();
        Box::pin(async move {
            info!("Scheduled refresh of watchlist starting");
            let companies = refresh_all(&state).await;
            info!("Scheduled refresh finished for {} companies", companies.len());
        })
    })
    .map_err(|e| anyhow!("Invalid refresh schedule '{}': {:?}", schedule, e))?;

    scheduler
        .add(job)
        .await
        .map_err(|e| anyhow!("Failed to register refresh job: {:?}", e))?;
    scheduler
        .start()
        .await
        .map_err(|e| anyhow!("Failed to start scheduler: {:?}", e))?;

    info!("Background refresh scheduled with '{}'", schedule);
    Ok(scheduler)
}
