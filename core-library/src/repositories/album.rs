//! Album repository trait and SQLite implementation

use crate::error::{LibraryError, Result};
use crate::models::{AlbumFields, AlbumId, AlbumRecord, AlbumUpsert};
use crate::repositories::{decode_list, encode_list, sql_i64, Page, PageRequest};
use async_trait::async_trait;
use sqlx::{query, query_as, FromRow, SqlitePool};
use tracing::{debug, instrument};

/// Album repository interface
///
/// Implementations must make [`upsert_by_name_and_artist`] atomic with respect
/// to other callers: two concurrent observations of the same `(album_name,
/// artist)` pair produce one record, never two.
///
/// [`upsert_by_name_and_artist`]: AlbumRepository::upsert_by_name_and_artist
#[async_trait]
pub trait AlbumRepository: Send + Sync {
    /// Find-or-create keyed by exact `(album_name, artist)` equality.
    ///
    /// - Absent: a record is created from `fields` with `created_at` and
    ///   `updated_at` set to `now`.
    /// - Present: every field except `cover_url` and `created_at` is
    ///   overwritten and `updated_at` becomes `now`.
    async fn upsert_by_name_and_artist(&self, fields: AlbumFields, now: i64)
        -> Result<AlbumUpsert>;

    async fn find_by_id(&self, id: &AlbumId) -> Result<Option<AlbumRecord>>;

    async fn find_by_name_and_artist(
        &self,
        album_name: &str,
        artist: &str,
    ) -> Result<Option<AlbumRecord>>;

    async fn count(&self) -> Result<u64>;

    /// Albums ordered by artist, then album name
    async fn query(&self, page_request: PageRequest) -> Result<Page<AlbumRecord>>;
}

const ALBUM_COLUMNS: &str = "id, album_name, artist, cover_url, discogs_id, genres, styles, \
                             release_year, label, country, created_at, updated_at";

#[derive(Debug, FromRow)]
struct AlbumRow {
    id: String,
    album_name: String,
    artist: String,
    cover_url: String,
    discogs_id: i64,
    genres: String,
    styles: String,
    release_year: String,
    label: String,
    country: String,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<AlbumRow> for AlbumRecord {
    type Error = LibraryError;

    fn try_from(row: AlbumRow) -> Result<Self> {
        let id = AlbumId::from_string(&row.id).map_err(|e| LibraryError::InvalidInput {
            field: "albums.id".to_string(),
            message: e.to_string(),
        })?;
        let discogs_id = u64::try_from(row.discogs_id).map_err(|_| LibraryError::InvalidInput {
            field: "albums.discogs_id".to_string(),
            message: format!("negative release id {}", row.discogs_id),
        })?;

        Ok(AlbumRecord {
            id,
            album_name: row.album_name,
            artist: row.artist,
            cover_url: row.cover_url,
            discogs_id,
            genres: decode_list(&row.genres)?,
            styles: decode_list(&row.styles)?,
            release_year: row.release_year,
            label: row.label,
            country: row.country,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// SQLite implementation of AlbumRepository
///
/// Uniqueness is enforced by the `idx_albums_name_artist` index; the
/// find-or-create runs inside a single transaction.
pub struct SqliteAlbumRepository {
    pool: SqlitePool,
}

impl SqliteAlbumRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AlbumRepository for SqliteAlbumRepository {
    #[instrument(skip(self, fields), fields(album_name = %fields.album_name, artist = %fields.artist))]
    async fn upsert_by_name_and_artist(
        &self,
        fields: AlbumFields,
        now: i64,
    ) -> Result<AlbumUpsert> {
        fields.validate()?;

        let discogs_id = sql_i64("discogs_id", fields.discogs_id)?;
        let genres = encode_list(&fields.genres)?;
        let styles = encode_list(&fields.styles)?;

        let mut tx = self.pool.begin().await?;

        let inserted = query(
            r#"
            INSERT INTO albums (
                id, album_name, artist, cover_url, discogs_id, genres, styles,
                release_year, label, country, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (album_name, artist) DO NOTHING
            "#,
        )
        .bind(AlbumId::new().to_string())
        .bind(&fields.album_name)
        .bind(&fields.artist)
        .bind(&fields.cover_url)
        .bind(discogs_id)
        .bind(&genres)
        .bind(&styles)
        .bind(&fields.release_year)
        .bind(&fields.label)
        .bind(&fields.country)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let created = inserted == 1;
        if !created {
            // cover_url and created_at are deliberately absent from the SET list.
            query(
                r#"
                UPDATE albums
                SET discogs_id = ?, genres = ?, styles = ?, release_year = ?,
                    label = ?, country = ?, updated_at = ?
                WHERE album_name = ? AND artist = ?
                "#,
            )
            .bind(discogs_id)
            .bind(&genres)
            .bind(&styles)
            .bind(&fields.release_year)
            .bind(&fields.label)
            .bind(&fields.country)
            .bind(now)
            .bind(&fields.album_name)
            .bind(&fields.artist)
            .execute(&mut *tx)
            .await?;
        }

        let row = query_as::<_, AlbumRow>(&format!(
            "SELECT {} FROM albums WHERE album_name = ? AND artist = ?",
            ALBUM_COLUMNS
        ))
        .bind(&fields.album_name)
        .bind(&fields.artist)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let album = AlbumRecord::try_from(row)?;
        debug!(album_id = %album.id, created, "Album upserted");
        Ok(AlbumUpsert { album, created })
    }

    async fn find_by_id(&self, id: &AlbumId) -> Result<Option<AlbumRecord>> {
        let row = query_as::<_, AlbumRow>(&format!(
            "SELECT {} FROM albums WHERE id = ?",
            ALBUM_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(AlbumRecord::try_from).transpose()
    }

    async fn find_by_name_and_artist(
        &self,
        album_name: &str,
        artist: &str,
    ) -> Result<Option<AlbumRecord>> {
        let row = query_as::<_, AlbumRow>(&format!(
            "SELECT {} FROM albums WHERE album_name = ? AND artist = ?",
            ALBUM_COLUMNS
        ))
        .bind(album_name)
        .bind(artist)
        .fetch_optional(&self.pool)
        .await?;

        row.map(AlbumRecord::try_from).transpose()
    }

    async fn count(&self) -> Result<u64> {
        let count: (i64,) = query_as("SELECT COUNT(*) FROM albums")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0.max(0) as u64)
    }

    async fn query(&self, page_request: PageRequest) -> Result<Page<AlbumRecord>> {
        let total = self.count().await?;

        let rows = query_as::<_, AlbumRow>(&format!(
            "SELECT {} FROM albums ORDER BY artist, album_name LIMIT ? OFFSET ?",
            ALBUM_COLUMNS
        ))
        .bind(page_request.limit())
        .bind(sql_i64("offset", page_request.offset())?)
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(AlbumRecord::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(Page::new(items, total, page_request))
    }
}
