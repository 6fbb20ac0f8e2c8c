//! # Catalog Sync Module
//!
//! Keeps the local catalog and inventory in step with a remote collection.
//!
//! ## Overview
//!
//! A sync run lists every release the account owns, resolves each release's
//! metadata and files it into two stores:
//! - the **album catalog**, one record per `(album name, artist)` pair
//! - the **inventory ledger**, one record per release id whose quantity grows
//!   by one each time a run observes the release
//!
//! ## Components
//!
//! - **Normalization** (`normalize`): cover, release year and label derivation
//! - **Catalog Reconciler** (`reconciler`): find-or-create album, create-or-increment inventory
//! - **Collection Lister** (`collection`): lazy stream over every collection page
//! - **Sync Job State Machine** (`job`): run lifecycle and counters
//! - **Sync Coordinator** (`coordinator`): one serial pass, aborting on the first failure
//! - **Sync Scheduler** (`scheduler`): recurring trigger on the background executor

pub mod collection;
pub mod coordinator;
pub mod error;
pub mod job;
pub mod normalize;
pub mod reconciler;
pub mod scheduler;

pub use collection::CollectionLister;
pub use coordinator::{SyncCoordinator, CANCELLED_MESSAGE};
pub use error::{Result, SyncError};
pub use job::{SyncJob, SyncJobId, SyncJobStats, SyncStatus};
pub use reconciler::{CatalogReconciler, ReconcileOutcome};
pub use scheduler::{SyncScheduler, SYNC_TASK_ID};
