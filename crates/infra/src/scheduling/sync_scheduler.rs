//! Cron-driven fleet sync scheduler.
//!
//! Triggers a fleet-wide calendar sync at fixed intervals with explicit
//! lifecycle management: the monitor join handle is tracked, cancellation
//! is explicit, and start/stop/job execution are all bounded by timeouts.

use std::sync::Arc;
use std::time::Duration;

use roost_core::CalendarSyncService;
use roost_domain::constants::DEFAULT_SYNC_CRON;
use tokio::task::JoinHandle;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::error::{SchedulerError, SchedulerResult};

/// Configuration for the fleet sync scheduler.
#[derive(Debug, Clone)]
pub struct SyncSchedulerConfig {
    /// Cron expression describing the execution schedule.
    pub cron_expression: String,
    /// Timeout applied to a single fleet sync execution.
    pub job_timeout: Duration,
    /// Timeout for starting the underlying scheduler.
    pub start_timeout: Duration,
    /// Timeout for stopping the scheduler.
    pub stop_timeout: Duration,
    /// Timeout for awaiting the monitor task join handle.
    pub join_timeout: Duration,
}

impl Default for SyncSchedulerConfig {
    fn default() -> Self {
        Self {
            cron_expression: DEFAULT_SYNC_CRON.into(),
            job_timeout: Duration::from_secs(300),
            start_timeout: Duration::from_secs(5),
            stop_timeout: Duration::from_secs(5),
            join_timeout: Duration::from_secs(5),
        }
    }
}

/// Fleet sync scheduler with explicit lifecycle management.
pub struct SyncScheduler {
    scheduler: Option<JobScheduler>,
    config: SyncSchedulerConfig,
    monitor_handle: Option<JoinHandle<()>>,
    cancellation: CancellationToken,
    service: Arc<CalendarSyncService>,
}

impl SyncScheduler {
    /// Create a scheduler with the default configuration.
    pub fn new(cron_expression: String, service: Arc<CalendarSyncService>) -> SchedulerResult<Self> {
        let config = SyncSchedulerConfig { cron_expression, ..Default::default() };
        Self::with_config(config, service)
    }

    /// Create a scheduler with a custom configuration.
    pub fn with_config(
        config: SyncSchedulerConfig,
        service: Arc<CalendarSyncService>,
    ) -> SchedulerResult<Self> {
        Ok(Self {
            scheduler: None,
            config,
            monitor_handle: None,
            cancellation: CancellationToken::new(),
            service,
        })
    }

    /// Start the scheduler, spawning the monitoring task.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        self.cancellation = CancellationToken::new();

        let scheduler_instance = self.build_scheduler().await?;
        let start_timeout = self.config.start_timeout;

        let start_result = tokio::time::timeout(start_timeout, scheduler_instance.start())
            .await
            .map_err(|_| SchedulerError::Timeout { seconds: start_timeout.as_secs() })?;

        start_result.map_err(|source| SchedulerError::StartFailed(source.to_string()))?;

        self.scheduler = Some(scheduler_instance);

        let cancel = self.cancellation.clone();
        let handle = tokio::spawn(async move {
            Self::monitor_task(cancel).await;
        });

        self.monitor_handle = Some(handle);
        info!("Fleet sync scheduler started");
        Ok(())
    }

    /// Stop the scheduler and wait for the monitor task to finish.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        self.cancellation.cancel();

        let mut scheduler = match self.scheduler.take() {
            Some(scheduler) => scheduler,
            None => return Err(SchedulerError::NotRunning),
        };

        let stop_timeout = self.config.stop_timeout;
        let stop_result =
            tokio::time::timeout(stop_timeout, async move { scheduler.shutdown().await })
                .await
                .map_err(|_| SchedulerError::Timeout { seconds: stop_timeout.as_secs() })?;

        stop_result.map_err(|source| SchedulerError::StopFailed(source.to_string()))?;

        if let Some(handle) = self.monitor_handle.take() {
            let join_timeout = self.config.join_timeout;
            tokio::time::timeout(join_timeout, handle)
                .await
                .map_err(|_| SchedulerError::Timeout { seconds: join_timeout.as_secs() })?
                .map_err(|err| SchedulerError::TaskJoinFailed(err.to_string()))?;
        }

        info!("Fleet sync scheduler stopped");
        self.cancellation = CancellationToken::new();
        Ok(())
    }

    /// Returns true when a scheduler instance is active.
    pub fn is_running(&self) -> bool {
        self.scheduler.is_some()
    }

    async fn build_scheduler(&self) -> SchedulerResult<JobScheduler> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|source| SchedulerError::CreationFailed(source.to_string()))?;

        let cron_expr = self.config.cron_expression.clone();
        let service = self.service.clone();
        let job_timeout = self.config.job_timeout;

        let job_definition = Job::new_async(cron_expr.as_str(), move |_id, _lock| {
            let service = service.clone();

            Box::pin(async move {
                debug!("scheduled fleet sync triggered");

                match tokio::time::timeout(job_timeout, service.sync_all()).await {
                    Ok(Ok(report)) => {
                        info!(
                            total = report.total,
                            synced = report.synced,
                            failed = report.failed,
                            "scheduled fleet sync completed"
                        );
                    }
                    Ok(Err(err)) => {
                        error!(error = %err, "scheduled fleet sync failed");
                    }
                    Err(_) => {
                        warn!(
                            timeout_secs = job_timeout.as_secs(),
                            "scheduled fleet sync timed out"
                        );
                    }
                }
            })
        })
        .map_err(|source| SchedulerError::JobRegistrationFailed(source.to_string()))?;

        let job_id = job_definition.guid();
        scheduler
            .add(job_definition)
            .await
            .map_err(|source| SchedulerError::JobRegistrationFailed(source.to_string()))?;

        debug!(cron = %self.config.cron_expression, job_id = %job_id, "Registered fleet sync job");
        Ok(scheduler)
    }

    async fn monitor_task(cancel: CancellationToken) {
        cancel.cancelled().await;
        debug!("Fleet sync scheduler monitor cancelled");
    }
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("SyncScheduler dropped while running; cancelling tasks");
            self.cancellation.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use roost_core::calendar::ports::{FeedFetcher, ListingRepository, ReservationRepository};
    use roost_domain::{
        CalendarFeed, ImportedReservation, Listing, NewReservation, ReservationDates, Result,
        RoostError,
    };

    use super::*;

    struct EmptyListings;

    #[async_trait]
    impl ListingRepository for EmptyListings {
        async fn find_listing(&self, _listing_id: &str) -> Result<Option<Listing>> {
            Ok(None)
        }

        async fn find_listings_with_feeds(&self) -> Result<Vec<CalendarFeed>> {
            Ok(Vec::new())
        }

        async fn set_feed_url(&self, listing_id: &str, _url: Option<&str>) -> Result<()> {
            Err(RoostError::ListingNotFound(listing_id.to_string()))
        }

        async fn set_last_synced(
            &self,
            listing_id: &str,
            _synced_at: DateTime<Utc>,
        ) -> Result<()> {
            Err(RoostError::ListingNotFound(listing_id.to_string()))
        }
    }

    struct EmptyReservations;

    #[async_trait]
    impl ReservationRepository for EmptyReservations {
        async fn find_imported(
            &self,
            _listing_id: &str,
            _starting_after: Option<DateTime<Utc>>,
        ) -> Result<Vec<ImportedReservation>> {
            Ok(Vec::new())
        }

        async fn create_reservations(&self, rows: &[NewReservation]) -> Result<usize> {
            Ok(rows.len())
        }

        async fn update_reservation_dates(&self, updates: &[ReservationDates]) -> Result<usize> {
            Ok(updates.len())
        }

        async fn delete_reservations(&self, ids: &[String]) -> Result<usize> {
            Ok(ids.len())
        }
    }

    struct NoFeeds;

    #[async_trait]
    impl FeedFetcher for NoFeeds {
        async fn fetch_calendar(&self, url: &str) -> Result<String> {
            Err(RoostError::FeedUnavailable(url.to_string()))
        }
    }

    fn idle_service() -> Arc<CalendarSyncService> {
        Arc::new(CalendarSyncService::new(
            Arc::new(EmptyListings),
            Arc::new(EmptyReservations),
            Arc::new(NoFeeds),
        ))
    }

    fn quiet_config() -> SyncSchedulerConfig {
        SyncSchedulerConfig {
            // top of the hour only; never fires during the test
            cron_expression: "0 0 * * * *".into(),
            ..Default::default()
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn lifecycle_runs_successfully() {
        let mut scheduler =
            SyncScheduler::with_config(quiet_config(), idle_service()).expect("scheduler created");

        scheduler.start().await.expect("start succeeds");
        assert!(scheduler.is_running());
        scheduler.stop().await.expect("stop succeeds");
        assert!(!scheduler.is_running());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn double_start_is_rejected() {
        let mut scheduler =
            SyncScheduler::with_config(quiet_config(), idle_service()).expect("scheduler created");

        scheduler.start().await.expect("first start");
        let err = scheduler.start().await.expect_err("second start fails");
        assert!(matches!(err, SchedulerError::AlreadyRunning));
        scheduler.stop().await.expect("stop succeeds");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn stop_without_start_is_rejected() {
        let mut scheduler =
            SyncScheduler::with_config(quiet_config(), idle_service()).expect("scheduler created");

        let err = scheduler.stop().await.expect_err("stop fails");
        assert!(matches!(err, SchedulerError::NotRunning));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn restart_after_stop_succeeds() {
        let mut scheduler =
            SyncScheduler::with_config(quiet_config(), idle_service()).expect("scheduler created");

        scheduler.start().await.expect("start succeeds");
        scheduler.stop().await.expect("stop succeeds");
        assert!(!scheduler.is_running());

        scheduler.start().await.expect("start again");
        scheduler.stop().await.expect("stop again");
    }
}
