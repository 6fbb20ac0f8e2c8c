//! Integration tests for the catalog sync
//!
//! Every scenario runs against both the in-memory and the SQLite stores:
//! - first and repeat observations of a release
//! - cover write-once and creation-time stability
//! - abort on the first failing release
//! - multi-page collections
//! - single pass per coordinator and the recurring scheduler

use async_trait::async_trait;
use bridge_desktop::TokioBackgroundExecutor;
use bridge_traits::background::TaskStatus;
use bridge_traits::catalog::{
    CatalogProvider, CollectionItem, CollectionPage, ReleaseDetail, ReleaseImage, ReleaseLabel,
};
use bridge_traits::error::BridgeError;
use bridge_traits::time::Clock;
use chrono::{DateTime, TimeZone, Utc};
use core_library::db::create_test_pool;
use core_library::repositories::{
    AlbumRepository, InMemoryAlbumRepository, InMemoryInventoryRepository, InventoryRepository,
    PageRequest, SqliteAlbumRepository, SqliteInventoryRepository,
};
use core_sync::{SyncCoordinator, SyncError, SyncScheduler, SyncStatus, CANCELLED_MESSAGE};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

// ============================================================================
// Test doubles
// ============================================================================

/// Catalog whose collection and release metadata are scripted by the test.
#[derive(Default)]
struct ScriptedCatalog {
    pages: Mutex<Vec<Vec<u64>>>,
    releases: Mutex<HashMap<u64, ReleaseDetail>>,
    failing: Mutex<HashSet<u64>>,
    fetched: Mutex<Vec<u64>>,
    hold_fetches: AtomicBool,
    release_gate: Notify,
}

impl ScriptedCatalog {
    fn with_releases(releases: Vec<ReleaseDetail>) -> Self {
        let catalog = Self::default();
        catalog.set_pages(vec![releases.iter().map(|r| r.id).collect()]);
        for release in releases {
            catalog.put_release(release);
        }
        catalog
    }

    fn set_pages(&self, pages: Vec<Vec<u64>>) {
        *self.pages.lock().unwrap() = pages;
    }

    fn put_release(&self, release: ReleaseDetail) {
        self.releases.lock().unwrap().insert(release.id, release);
    }

    fn fail_release(&self, release_id: u64) {
        self.failing.lock().unwrap().insert(release_id);
    }

    fn fetched(&self) -> Vec<u64> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogProvider for ScriptedCatalog {
    async fn list_collection_page(&self, page: u32) -> bridge_traits::error::Result<CollectionPage> {
        let pages = self.pages.lock().unwrap().clone();
        let items = pages
            .get(page as usize - 1)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(CollectionItem::new)
            .collect();
        Ok(CollectionPage::new(items, page, pages.len() as u32))
    }

    async fn fetch_release(&self, release_id: u64) -> bridge_traits::error::Result<ReleaseDetail> {
        self.fetched.lock().unwrap().push(release_id);

        if self.hold_fetches.load(Ordering::SeqCst) {
            self.release_gate.notified().await;
        }

        if self.failing.lock().unwrap().contains(&release_id) {
            return Err(BridgeError::OperationFailed(format!(
                "Discogs API error (status 500): release {}",
                release_id
            )));
        }

        self.releases
            .lock()
            .unwrap()
            .get(&release_id)
            .cloned()
            .ok_or_else(|| BridgeError::OperationFailed(format!("Release not found: {}", release_id)))
    }
}

/// Clock reading unix seconds set by the test.
struct ManualClock {
    secs: AtomicI64,
}

impl ManualClock {
    fn at(secs: i64) -> Arc<Self> {
        Arc::new(Self {
            secs: AtomicI64::new(secs),
        })
    }

    fn set(&self, secs: i64) {
        self.secs.store(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.secs.load(Ordering::SeqCst), 0)
            .single()
            .unwrap()
    }
}

#[derive(Clone)]
struct Stores {
    albums: Arc<dyn AlbumRepository>,
    inventory: Arc<dyn InventoryRepository>,
}

impl Stores {
    fn in_memory() -> Self {
        Self {
            albums: Arc::new(InMemoryAlbumRepository::new()),
            inventory: Arc::new(InMemoryInventoryRepository::new()),
        }
    }

    async fn sqlite() -> Self {
        let pool = create_test_pool().await.unwrap();
        Self {
            albums: Arc::new(SqliteAlbumRepository::new(pool.clone())),
            inventory: Arc::new(SqliteInventoryRepository::new(pool)),
        }
    }

    fn coordinator(&self, catalog: Arc<ScriptedCatalog>, clock: Arc<ManualClock>) -> SyncCoordinator {
        SyncCoordinator::new(
            catalog,
            Arc::clone(&self.albums),
            Arc::clone(&self.inventory),
            clock,
            None,
        )
    }

    async fn counts(&self) -> (u64, u64) {
        (
            self.albums.count().await.unwrap(),
            self.inventory.count().await.unwrap(),
        )
    }
}

fn release(id: u64, title: &str, artist: &str) -> ReleaseDetail {
    ReleaseDetail {
        id,
        title: title.to_string(),
        artists_sort: artist.to_string(),
        images: vec![ReleaseImage {
            uri: format!("https://i.discogs.com/{id}.jpg"),
        }],
        genres: vec!["Rock".to_string()],
        styles: vec!["Pop Rock".to_string()],
        released: "1969-09-26".to_string(),
        labels: vec![ReleaseLabel {
            name: "Apple Records".to_string(),
        }],
        country: "UK".to_string(),
    }
}

macro_rules! store_tests {
    ($($name:ident),* $(,)?) => {
        mod in_memory {
            $(
                #[tokio::test]
                async fn $name() {
                    super::$name(super::Stores::in_memory()).await;
                }
            )*
        }

        mod sqlite {
            $(
                #[tokio::test]
                async fn $name() {
                    super::$name(super::Stores::sqlite().await).await;
                }
            )*
        }
    };
}

store_tests!(
    first_and_second_run_of_single_release,
    created_at_is_set_once,
    cover_url_is_write_once,
    failure_on_third_of_five_aborts_the_run,
    pressings_of_one_album_share_the_catalog_record,
    every_collection_page_is_synced,
    missing_metadata_normalizes_to_empty_fields,
);

// ============================================================================
// Scenarios
// ============================================================================

async fn first_and_second_run_of_single_release(stores: Stores) {
    let catalog = Arc::new(ScriptedCatalog::with_releases(vec![release(
        123,
        "Abbey Road",
        "The Beatles",
    )]));
    let clock = ManualClock::at(1_000);
    let coordinator = stores.coordinator(Arc::clone(&catalog), clock.clone());

    let job = coordinator.run_sync().await.unwrap();
    assert_eq!(job.status, SyncStatus::Completed);
    assert_eq!(job.stats.releases_seen, 1);
    assert_eq!(job.stats.albums_created, 1);
    assert_eq!(job.stats.inventory_created, 1);
    assert_eq!(stores.counts().await, (1, 1));

    let record = stores.inventory.find_by_discogs_id("123").await.unwrap().unwrap();
    assert_eq!(record.quantity, 1);
    assert_eq!(record.album_name, "Abbey Road");
    assert_eq!(record.release_year, "1969");

    // Second run with a refreshed upstream record
    let mut updated = release(123, "Abbey Road", "The Beatles");
    updated.country = "Europe".to_string();
    updated.labels = vec![ReleaseLabel {
        name: "EMI".to_string(),
    }];
    catalog.put_release(updated);
    clock.set(2_000);

    let job = coordinator.run_sync().await.unwrap();
    assert_eq!(job.stats.albums_updated, 1);
    assert_eq!(job.stats.inventory_incremented, 1);
    assert_eq!(stores.counts().await, (1, 1));

    let album = stores
        .albums
        .find_by_name_and_artist("Abbey Road", "The Beatles")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(album.country, "Europe");
    assert_eq!(album.label, "EMI");
    assert_eq!(album.updated_at, 2_000);

    let record = stores.inventory.find_by_discogs_id("123").await.unwrap().unwrap();
    assert_eq!(record.quantity, 2);
    assert_eq!(record.last_updated, 2_000);
    assert_eq!(record.album_id, album.id);
}

async fn created_at_is_set_once(stores: Stores) {
    let catalog = Arc::new(ScriptedCatalog::with_releases(vec![release(
        7,
        "Blue Train",
        "John Coltrane",
    )]));
    let clock = ManualClock::at(100);
    let coordinator = stores.coordinator(catalog, clock.clone());

    coordinator.run_sync().await.unwrap();
    for now in [200, 300] {
        clock.set(now);
        coordinator.run_sync().await.unwrap();
    }

    let album = stores
        .albums
        .find_by_name_and_artist("Blue Train", "John Coltrane")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(album.created_at, 100);
    assert_eq!(album.updated_at, 300);

    let record = stores.inventory.find_by_discogs_id("7").await.unwrap().unwrap();
    assert_eq!(record.quantity, 3);
}

async fn cover_url_is_write_once(stores: Stores) {
    let mut first = release(42, "Kind of Blue", "Miles Davis");
    first.images = vec![ReleaseImage {
        uri: "X".to_string(),
    }];
    let catalog = Arc::new(ScriptedCatalog::with_releases(vec![first]));
    let coordinator = stores.coordinator(Arc::clone(&catalog), ManualClock::at(1));
    coordinator.run_sync().await.unwrap();

    let mut second = release(42, "Kind of Blue", "Miles Davis");
    second.images = vec![
        ReleaseImage {
            uri: "Y".to_string(),
        },
        ReleaseImage {
            uri: "Z".to_string(),
        },
    ];
    catalog.put_release(second);
    coordinator.run_sync().await.unwrap();

    // An empty image list must not clear the stored cover either
    let mut third = release(42, "Kind of Blue", "Miles Davis");
    third.images.clear();
    catalog.put_release(third);
    coordinator.run_sync().await.unwrap();

    let album = stores
        .albums
        .find_by_name_and_artist("Kind of Blue", "Miles Davis")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(album.cover_url, "X");

    let record = stores.inventory.find_by_discogs_id("42").await.unwrap().unwrap();
    assert_eq!(record.cover_url, "X");
    assert_eq!(record.quantity, 3);
}

async fn failure_on_third_of_five_aborts_the_run(stores: Stores) {
    let releases = (1..=5)
        .map(|id| release(id, &format!("Album {id}"), "Various"))
        .collect();
    let catalog = Arc::new(ScriptedCatalog::with_releases(releases));
    catalog.fail_release(3);
    let coordinator = stores.coordinator(Arc::clone(&catalog), ManualClock::at(1));

    let result = coordinator.run_sync().await;
    assert!(matches!(result, Err(SyncError::Provider(_))));
    assert_eq!(stores.counts().await, (2, 2));
    assert_eq!(catalog.fetched(), vec![1, 2, 3]);

    let job = coordinator.last_job().await.unwrap();
    assert_eq!(job.status, SyncStatus::Failed);
    assert_eq!(job.stats.releases_seen, 2);
    assert!(job.error_message.unwrap().contains("status 500"));
    assert!(!coordinator.is_sync_active());

    for id in ["4", "5"] {
        assert!(stores.inventory.find_by_discogs_id(id).await.unwrap().is_none());
    }
}

async fn pressings_of_one_album_share_the_catalog_record(stores: Stores) {
    let mut repress = release(2, "Abbey Road", "The Beatles");
    repress.country = "US".to_string();
    let catalog = Arc::new(ScriptedCatalog::with_releases(vec![
        release(1, "Abbey Road", "The Beatles"),
        repress,
    ]));
    let coordinator = stores.coordinator(catalog, ManualClock::at(1));

    let job = coordinator.run_sync().await.unwrap();
    assert_eq!(job.stats.albums_created, 1);
    assert_eq!(job.stats.albums_updated, 1);
    assert_eq!(job.stats.inventory_created, 2);
    assert_eq!(stores.counts().await, (1, 2));

    let album = stores
        .albums
        .find_by_name_and_artist("Abbey Road", "The Beatles")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(album.discogs_id, 2);
    assert_eq!(album.country, "US");

    let page = stores.inventory.query(PageRequest::new(0, 10)).await.unwrap();
    assert!(page.items.iter().all(|record| record.album_id == album.id));
    assert!(page.items.iter().all(|record| record.quantity == 1));
}

async fn every_collection_page_is_synced(stores: Stores) {
    let releases: Vec<_> = (1..=250)
        .map(|id| release(id, &format!("Album {id}"), "Various"))
        .collect();
    let catalog = Arc::new(ScriptedCatalog::with_releases(releases));
    let ids: Vec<u64> = (1..=250).collect();
    catalog.set_pages(ids.chunks(100).map(|chunk| chunk.to_vec()).collect());
    let coordinator = stores.coordinator(Arc::clone(&catalog), ManualClock::at(1));

    let job = coordinator.run_sync().await.unwrap();
    assert_eq!(job.stats.releases_seen, 250);
    assert_eq!(stores.counts().await, (250, 250));
    assert_eq!(catalog.fetched(), ids);
}

async fn missing_metadata_normalizes_to_empty_fields(stores: Stores) {
    let bare = ReleaseDetail {
        id: 9,
        title: "Untitled".to_string(),
        artists_sort: "Unknown Artist".to_string(),
        ..ReleaseDetail::default()
    };
    let catalog = Arc::new(ScriptedCatalog::with_releases(vec![bare]));
    let coordinator = stores.coordinator(catalog, ManualClock::at(1));
    coordinator.run_sync().await.unwrap();

    let album = stores
        .albums
        .find_by_name_and_artist("Untitled", "Unknown Artist")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(album.cover_url, "");
    assert_eq!(album.release_year, "");
    assert_eq!(album.label, "");
    assert!(album.genres.is_empty());
}

// ============================================================================
// Concurrency and scheduling
// ============================================================================

#[tokio::test]
async fn concurrent_run_is_rejected() {
    let stores = Stores::in_memory();
    let catalog = Arc::new(ScriptedCatalog::with_releases(vec![release(
        1,
        "Abbey Road",
        "The Beatles",
    )]));
    catalog.hold_fetches.store(true, Ordering::SeqCst);
    let coordinator = Arc::new(stores.coordinator(Arc::clone(&catalog), ManualClock::at(1)));

    let running = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move { coordinator.run_sync().await })
    };

    while catalog.fetched().is_empty() {
        tokio::task::yield_now().await;
    }
    assert!(coordinator.is_sync_active());
    assert!(matches!(
        coordinator.run_sync().await,
        Err(SyncError::SyncInProgress)
    ));

    catalog.release_gate.notify_one();
    let job = running.await.unwrap().unwrap();
    assert_eq!(job.status, SyncStatus::Completed);
    assert_eq!(stores.counts().await, (1, 1));
    assert!(!coordinator.is_sync_active());
}

#[tokio::test]
async fn aborted_run_is_recorded_as_cancelled() {
    let stores = Stores::in_memory();
    let catalog = Arc::new(ScriptedCatalog::with_releases(vec![
        release(1, "Abbey Road", "The Beatles"),
        release(2, "Blue Train", "John Coltrane"),
    ]));
    let coordinator = Arc::new(stores.coordinator(Arc::clone(&catalog), ManualClock::at(1)));

    catalog.hold_fetches.store(true, Ordering::SeqCst);
    let running = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move { coordinator.run_sync().await })
    };
    while catalog.fetched().is_empty() {
        tokio::task::yield_now().await;
    }
    assert_eq!(
        coordinator.last_job().await.unwrap().status,
        SyncStatus::Running
    );

    running.abort();
    assert!(running.await.unwrap_err().is_cancelled());

    let job = coordinator.last_job().await.unwrap();
    assert_eq!(job.status, SyncStatus::Failed);
    assert_eq!(job.error_message.as_deref(), Some(CANCELLED_MESSAGE));
    assert!(!coordinator.is_sync_active());

    catalog.hold_fetches.store(false, Ordering::SeqCst);
    let job = coordinator.run_sync().await.unwrap();
    assert_eq!(job.status, SyncStatus::Completed);
    assert_eq!(stores.counts().await, (2, 2));
}

#[tokio::test]
async fn scheduler_runs_first_pass_immediately() {
    let stores = Stores::sqlite().await;
    let catalog = Arc::new(ScriptedCatalog::with_releases(vec![release(
        5,
        "Blue Train",
        "John Coltrane",
    )]));
    let coordinator = Arc::new(stores.coordinator(catalog, ManualClock::at(1)));
    let scheduler = SyncScheduler::new(
        Arc::clone(&coordinator),
        Arc::new(TokioBackgroundExecutor::new()),
        Duration::from_secs(3600),
    );

    assert!(scheduler.status().await.unwrap().is_none());
    scheduler.start().await.unwrap();
    assert!(matches!(
        scheduler.start().await,
        Err(SyncError::Scheduler(_))
    ));

    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if scheduler.status().await.unwrap() == Some(TaskStatus::Completed) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    assert_eq!(stores.counts().await, (1, 1));
    let job = coordinator.last_job().await.unwrap();
    assert_eq!(job.status, SyncStatus::Completed);
    let next = scheduler.next_run_in().await.unwrap().unwrap();
    assert!(next > Duration::from_secs(3000));

    scheduler.stop().await.unwrap();
    assert!(scheduler.status().await.unwrap().is_none());
    scheduler.stop().await.unwrap();
}
