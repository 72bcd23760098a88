//! `Beat` — registers the three periodic maintenance tasks against
//! `mg_queue::Scheduler` (spec.md §4.8). Grounded on `celery_config.py`'s
//! `celery_beat_schedule` table: each entry there becomes one
//! `PeriodicSchedule` here, same name, same period, same queue. The ticker
//! loop itself already exists in `mg-queue`; this module only supplies the
//! table.

use std::sync::Arc;
use std::time::Duration;

use mg_queue::{PeriodicSchedule, QueueBackend, QueueResult, Scheduler};

pub struct Beat<B: QueueBackend> {
    scheduler: Arc<Scheduler<B>>,
}

impl<B: QueueBackend + Send + Sync + 'static> Beat<B> {
    pub fn new(backend: Arc<B>) -> Self {
        let scheduler = Arc::new(Scheduler::new(backend));

        scheduler.register(PeriodicSchedule::new(
            "cleanup-stuck-jobs-every-3-minutes",
            "reset_stuck_jobs",
            "maintenance",
            Duration::from_secs(3 * 60),
        ));
        scheduler.register(PeriodicSchedule::new(
            "cleanup-old-jobs-daily",
            "cleanup_old_jobs",
            "maintenance",
            Duration::from_secs(24 * 60 * 60),
        ));
        scheduler.register(PeriodicSchedule::new(
            "check-job-health-hourly",
            "check_job_health",
            "maintenance",
            Duration::from_secs(60 * 60),
        ));

        Self { scheduler }
    }

    /// Runs every registered schedule's ticker loop. Never returns under
    /// normal operation.
    pub async fn run(self) -> QueueResult<()> {
        self.scheduler.run().await
    }
}
