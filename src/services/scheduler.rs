use std::error::Error;
use std::sync::Arc;

use sqlx::PgPool;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::services::fitbit_service::FitbitService;

/// Background jobs. Currently the periodic Fitbit sync.
pub struct SchedulerService {
    scheduler: Arc<Mutex<JobScheduler>>,
    pool: PgPool,
    fitbit_service: Arc<FitbitService>,
}

impl SchedulerService {
    pub async fn new(pool: PgPool, fitbit_service: Arc<FitbitService>) -> Result<Self, Box<dyn Error>> {
        let scheduler = JobScheduler::new().await?;

        Ok(Self {
            scheduler: Arc::new(Mutex::new(scheduler)),
            pool,
            fitbit_service,
        })
    }

    pub async fn start(&self) -> Result<(), Box<dyn Error>> {
        if self.fitbit_service.is_configured() {
            self.schedule_fitbit_sync().await?;
        } else {
            tracing::info!("Fitbit is not configured, skipping the sync job");
        }

        let scheduler = self.scheduler.lock().await;
        scheduler.start().await?;

        tracing::info!("Scheduler service started successfully");
        Ok(())
    }

    pub async fn stop(&self) -> Result<(), Box<dyn Error>> {
        let mut scheduler = self.scheduler.lock().await;
        scheduler.shutdown().await?;

        tracing::info!("Scheduler service stopped");
        Ok(())
    }

    async fn schedule_fitbit_sync(&self) -> Result<(), JobSchedulerError> {
        let cron_expr = self.fitbit_service.sync_cron().to_string();
        let pool = self.pool.clone();
        let fitbit_service = self.fitbit_service.clone();

        let sync_job = Job::new_async(cron_expr.as_str(), move |_uuid, _l| {
            let pool = pool.clone();
            let fitbit_service = fitbit_service.clone();

            Box::pin(async move {
                tracing::info!("Running scheduled Fitbit sync");
                match fitbit_service.sync_all(&pool).await {
                    Ok(synced) => tracing::info!("Scheduled Fitbit sync finished for {} connections", synced),
                    Err(e) => tracing::error!("Scheduled Fitbit sync failed: {}", e),
                }
            })
        })?;

        let scheduler = self.scheduler.lock().await;
        scheduler.add(sync_job).await?;

        tracing::info!("Scheduled Fitbit sync ({})", cron_expr);
        Ok(())
    }
}
