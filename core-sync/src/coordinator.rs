//! # Sync Coordinator
//!
//! Runs one complete sync pass over the account's collection.
//!
//! ## Workflow
//!
//! 1. Create a [`SyncJob`] and move it to `Running`
//! 2. Stream the collection page by page ([`CollectionLister`])
//! 3. Reconcile each release in listing order ([`CatalogReconciler`])
//! 4. Stop at the first failure: the job becomes `Failed` and the error is
//!    returned; releases after the failing one are not touched
//! 5. Otherwise the job becomes `Completed` and is returned
//!
//! Releases are processed strictly one after another. A coordinator runs at
//! most one pass at a time; a second caller gets [`SyncError::SyncInProgress`]
//! instead of a concurrent pass over the same stores.
//!
//! A pass whose future is dropped before it finishes (for example when the
//! scheduler is stopped mid-run) is recorded as `Failed` with the message
//! [`CANCELLED_MESSAGE`] and the counters reached so far.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::SyncCoordinator;
//!
//! let coordinator = SyncCoordinator::new(provider, albums, inventory, clock, None);
//! let job = coordinator.run_sync().await?;
//! println!("{} releases synced", job.stats.releases_seen);
//! ```

use crate::collection::CollectionLister;
use crate::job::{SyncJob, SyncJobStats};
use crate::reconciler::CatalogReconciler;
use crate::{Result, SyncError};
use bridge_traits::catalog::CatalogProvider;
use bridge_traits::time::Clock;
use core_library::repositories::{AlbumRepository, InventoryRepository};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, instrument, warn};

/// Error message of a job whose pass was dropped before it finished
pub const CANCELLED_MESSAGE: &str = "Sync cancelled before completion";

pub struct SyncCoordinator {
    lister: CollectionLister,
    reconciler: CatalogReconciler,
    clock: Arc<dyn Clock>,
    /// Held for the duration of a pass
    run_lock: Mutex<()>,
    last_job: RwLock<Option<SyncJob>>,
}

impl SyncCoordinator {
    pub fn new(
        provider: Arc<dyn CatalogProvider>,
        albums: Arc<dyn AlbumRepository>,
        inventory: Arc<dyn InventoryRepository>,
        clock: Arc<dyn Clock>,
        max_pages: Option<u32>,
    ) -> Self {
        Self {
            lister: CollectionLister::new(Arc::clone(&provider), max_pages),
            reconciler: CatalogReconciler::new(provider, albums, inventory, Arc::clone(&clock)),
            clock,
            run_lock: Mutex::new(()),
            last_job: RwLock::new(None),
        }
    }

    /// Run one full pass.
    ///
    /// # Errors
    ///
    /// - [`SyncError::SyncInProgress`] if a pass is already running
    /// - the first provider or store failure of the pass
    #[instrument(skip(self))]
    pub async fn run_sync(&self) -> Result<SyncJob> {
        let _running = self.run_lock.try_lock().map_err(|_| SyncError::SyncInProgress)?;

        let job = SyncJob::new(self.clock.unix_timestamp()).start(self.clock.unix_timestamp())?;
        info!(job_id = %job.id, "Starting catalog sync");
        self.store_job(&job).await;

        let mut pass = PassGuard::new(self, job.clone());
        let outcome = self.run_pass(&mut pass.stats).await;
        let stats = pass.finish();
        let now = self.clock.unix_timestamp();

        match outcome {
            Ok(()) => {
                let job = job.complete(stats, now)?;
                info!(
                    job_id = %job.id,
                    releases = stats.releases_seen,
                    albums_created = stats.albums_created,
                    albums_updated = stats.albums_updated,
                    inventory_created = stats.inventory_created,
                    inventory_incremented = stats.inventory_incremented,
                    duration_secs = job.duration_secs().unwrap_or_default(),
                    "Catalog sync complete"
                );
                self.store_job(&job).await;
                Ok(job)
            }
            Err(e) => {
                let job = job.fail(e.to_string(), stats, now)?;
                error!(
                    job_id = %job.id,
                    releases = stats.releases_seen,
                    albums_created = stats.albums_created,
                    inventory_created = stats.inventory_created,
                    error = %e,
                    "Catalog sync failed"
                );
                self.store_job(&job).await;
                Err(e)
            }
        }
    }

    async fn run_pass(&self, stats: &mut SyncJobStats) -> Result<()> {
        let mut items = Box::pin(self.lister.stream());

        while let Some(item) = items.next().await {
            let outcome = self.reconciler.reconcile(item?).await?;
            stats.record(&outcome);
        }

        Ok(())
    }

    async fn store_job(&self, job: &SyncJob) {
        *self.last_job.write().await = Some(job.clone());
    }

    /// Whether a pass is currently running
    pub fn is_sync_active(&self) -> bool {
        self.run_lock.try_lock().is_err()
    }

    /// The running or most recently finished job
    pub async fn last_job(&self) -> Option<SyncJob> {
        self.last_job.read().await.clone()
    }
}

/// Owns the counters of a pass in progress and records the job as failed if
/// the pass is dropped before [`PassGuard::finish`].
struct PassGuard<'a> {
    coordinator: &'a SyncCoordinator,
    job: Option<SyncJob>,
    stats: SyncJobStats,
}

impl<'a> PassGuard<'a> {
    fn new(coordinator: &'a SyncCoordinator, job: SyncJob) -> Self {
        Self {
            coordinator,
            job: Some(job),
            stats: SyncJobStats::default(),
        }
    }

    fn finish(mut self) -> SyncJobStats {
        self.job = None;
        self.stats
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        let Some(job) = self.job.take() else {
            return;
        };

        let now = self.coordinator.clock.unix_timestamp();
        let Ok(job) = job.fail(CANCELLED_MESSAGE.to_string(), self.stats, now) else {
            return;
        };
        warn!(
            job_id = %job.id,
            releases = self.stats.releases_seen,
            "Catalog sync cancelled"
        );
        // Never block inside drop.
        if let Ok(mut last_job) = self.coordinator.last_job.try_write() {
            *last_job = Some(job);
        }
    }
}
