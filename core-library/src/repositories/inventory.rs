//! Inventory repository trait and SQLite implementation

use crate::error::{LibraryError, Result};
use crate::models::{AlbumId, InventoryRecord, InventorySnapshot, InventoryUpsert};
use crate::repositories::{decode_list, encode_list, sql_i64, Page, PageRequest};
use async_trait::async_trait;
use sqlx::{query_as, FromRow, SqlitePool};
use tracing::{debug, instrument};

/// Inventory repository interface
///
/// [`record_observation`](InventoryRepository::record_observation) is an
/// atomic create-or-increment: concurrent observations of the same release
/// never produce two records and never lose an increment.
#[async_trait]
pub trait InventoryRepository: Send + Sync {
    /// Record one observation of `snapshot.discogs_id`.
    ///
    /// - Absent: the snapshot is stored with `quantity = 1`.
    /// - Present: `quantity` grows by exactly one and `last_updated` becomes
    ///   `now`; every other stored field is left as it was.
    async fn record_observation(
        &self,
        snapshot: InventorySnapshot,
        now: i64,
    ) -> Result<InventoryUpsert>;

    async fn find_by_discogs_id(&self, discogs_id: &str) -> Result<Option<InventoryRecord>>;

    async fn count(&self) -> Result<u64>;

    /// Records ordered by artist, album name, then release id
    async fn query(&self, page_request: PageRequest) -> Result<Page<InventoryRecord>>;
}

const INVENTORY_COLUMNS: &str = "discogs_id, album_id, album_name, artist, cover_url, \
                                 release_year, genres, quantity, last_updated";

#[derive(Debug, FromRow)]
struct InventoryRow {
    discogs_id: String,
    album_id: String,
    album_name: String,
    artist: String,
    cover_url: String,
    release_year: String,
    genres: String,
    quantity: i64,
    last_updated: i64,
}

impl TryFrom<InventoryRow> for InventoryRecord {
    type Error = LibraryError;

    fn try_from(row: InventoryRow) -> Result<Self> {
        let album_id =
            AlbumId::from_string(&row.album_id).map_err(|e| LibraryError::InvalidInput {
                field: "inventory.album_id".to_string(),
                message: e.to_string(),
            })?;

        Ok(InventoryRecord {
            discogs_id: row.discogs_id,
            album_id,
            album_name: row.album_name,
            artist: row.artist,
            cover_url: row.cover_url,
            release_year: row.release_year,
            genres: decode_list(&row.genres)?,
            quantity: row.quantity,
            last_updated: row.last_updated,
        })
    }
}

/// SQLite implementation of InventoryRepository
pub struct SqliteInventoryRepository {
    pool: SqlitePool,
}

impl SqliteInventoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InventoryRepository for SqliteInventoryRepository {
    #[instrument(skip(self, snapshot), fields(discogs_id = %snapshot.discogs_id))]
    async fn record_observation(
        &self,
        snapshot: InventorySnapshot,
        now: i64,
    ) -> Result<InventoryUpsert> {
        snapshot.validate()?;

        let genres = encode_list(&snapshot.genres)?;

        // The conflict branch touches only quantity and last_updated.
        let row = query_as::<_, InventoryRow>(&format!(
            r#"
            INSERT INTO inventory (
                discogs_id, album_id, album_name, artist, cover_url,
                release_year, genres, quantity, last_updated
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, 1, ?)
            ON CONFLICT (discogs_id) DO UPDATE SET
                quantity = inventory.quantity + 1,
                last_updated = excluded.last_updated
            RETURNING {}
            "#,
            INVENTORY_COLUMNS
        ))
        .bind(&snapshot.discogs_id)
        .bind(snapshot.album_id.to_string())
        .bind(&snapshot.album_name)
        .bind(&snapshot.artist)
        .bind(&snapshot.cover_url)
        .bind(&snapshot.release_year)
        .bind(&genres)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        let record = InventoryRecord::try_from(row)?;
        let created = record.quantity == 1;
        debug!(quantity = record.quantity, created, "Inventory observation recorded");

        Ok(InventoryUpsert { record, created })
    }

    async fn find_by_discogs_id(&self, discogs_id: &str) -> Result<Option<InventoryRecord>> {
        let row = query_as::<_, InventoryRow>(&format!(
            "SELECT {} FROM inventory WHERE discogs_id = ?",
            INVENTORY_COLUMNS
        ))
        .bind(discogs_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(InventoryRecord::try_from).transpose()
    }

    async fn count(&self) -> Result<u64> {
        let count: (i64,) = query_as("SELECT COUNT(*) FROM inventory")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0.max(0) as u64)
    }

    async fn query(&self, page_request: PageRequest) -> Result<Page<InventoryRecord>> {
        let total = self.count().await?;

        let rows = query_as::<_, InventoryRow>(&format!(
            "SELECT {} FROM inventory ORDER BY artist, album_name, discogs_id LIMIT ? OFFSET ?",
            INVENTORY_COLUMNS
        ))
        .bind(page_request.limit())
        .bind(sql_i64("offset", page_request.offset())?)
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(InventoryRecord::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(Page::new(items, total, page_request))
    }
}
