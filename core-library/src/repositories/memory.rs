//! In-memory repositories
//!
//! Lock-guarded `Vec` stores that honour the same contracts as the SQLite
//! repositories. Used by tests and by callers that do not need persistence.

use crate::error::Result;
use crate::models::{
    AlbumFields, AlbumId, AlbumRecord, AlbumUpsert, InventoryRecord, InventorySnapshot,
    InventoryUpsert,
};
use crate::repositories::{AlbumRepository, InventoryRepository, Page, PageRequest};
use async_trait::async_trait;
use tokio::sync::RwLock;

fn paginate<T: Clone>(mut items: Vec<T>, page_request: PageRequest) -> Page<T> {
    let total = items.len() as u64;
    let start = usize::try_from(page_request.offset())
        .unwrap_or(usize::MAX)
        .min(items.len());
    let end = start
        .saturating_add(page_request.limit() as usize)
        .min(items.len());
    let page_items = items.drain(start..end).collect();
    Page::new(page_items, total, page_request)
}

/// Albums kept in insertion order
#[derive(Default)]
pub struct InMemoryAlbumRepository {
    albums: RwLock<Vec<AlbumRecord>>,
}

impl InMemoryAlbumRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AlbumRepository for InMemoryAlbumRepository {
    async fn upsert_by_name_and_artist(
        &self,
        fields: AlbumFields,
        now: i64,
    ) -> Result<AlbumUpsert> {
        fields.validate()?;

        let mut albums = self.albums.write().await;
        if let Some(existing) = albums
            .iter_mut()
            .find(|album| album.matches(&fields.album_name, &fields.artist))
        {
            existing.merge(fields, now);
            return Ok(AlbumUpsert {
                album: existing.clone(),
                created: false,
            });
        }

        let album = AlbumRecord::create(fields, now);
        albums.push(album.clone());
        Ok(AlbumUpsert {
            album,
            created: true,
        })
    }

    async fn find_by_id(&self, id: &AlbumId) -> Result<Option<AlbumRecord>> {
        let albums = self.albums.read().await;
        Ok(albums.iter().find(|album| &album.id == id).cloned())
    }

    async fn find_by_name_and_artist(
        &self,
        album_name: &str,
        artist: &str,
    ) -> Result<Option<AlbumRecord>> {
        let albums = self.albums.read().await;
        Ok(albums
            .iter()
            .find(|album| album.matches(album_name, artist))
            .cloned())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.albums.read().await.len() as u64)
    }

    async fn query(&self, page_request: PageRequest) -> Result<Page<AlbumRecord>> {
        let mut albums = self.albums.read().await.clone();
        albums.sort_by(|a, b| {
            a.artist
                .cmp(&b.artist)
                .then_with(|| a.album_name.cmp(&b.album_name))
        });
        Ok(paginate(albums, page_request))
    }
}

/// Inventory records kept in insertion order
#[derive(Default)]
pub struct InMemoryInventoryRepository {
    records: RwLock<Vec<InventoryRecord>>,
}

impl InMemoryInventoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InventoryRepository for InMemoryInventoryRepository {
    async fn record_observation(
        &self,
        snapshot: InventorySnapshot,
        now: i64,
    ) -> Result<InventoryUpsert> {
        snapshot.validate()?;

        let mut records = self.records.write().await;
        if let Some(existing) = records
            .iter_mut()
            .find(|record| record.discogs_id == snapshot.discogs_id)
        {
            existing.observe_again(now);
            return Ok(InventoryUpsert {
                record: existing.clone(),
                created: false,
            });
        }

        let record = InventoryRecord::first_observation(snapshot, now);
        records.push(record.clone());
        Ok(InventoryUpsert {
            record,
            created: true,
        })
    }

    async fn find_by_discogs_id(&self, discogs_id: &str) -> Result<Option<InventoryRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .find(|record| record.discogs_id == discogs_id)
            .cloned())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.records.read().await.len() as u64)
    }

    async fn query(&self, page_request: PageRequest) -> Result<Page<InventoryRecord>> {
        let mut records = self.records.read().await.clone();
        records.sort_by(|a, b| {
            a.artist
                .cmp(&b.artist)
                .then_with(|| a.album_name.cmp(&b.album_name))
                .then_with(|| a.discogs_id.cmp(&b.discogs_id))
        });
        Ok(paginate(records, page_request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn fields(name: &str, artist: &str) -> AlbumFields {
        AlbumFields {
            album_name: name.to_string(),
            artist: artist.to_string(),
            cover_url: "X".to_string(),
            discogs_id: 1,
            ..AlbumFields::default()
        }
    }

    #[tokio::test]
    async fn test_album_upsert_contract() {
        let repo = InMemoryAlbumRepository::new();
        let first = repo
            .upsert_by_name_and_artist(fields("Abbey Road", "The Beatles"), 5)
            .await
            .unwrap();
        assert!(first.created);

        let mut later = fields("Abbey Road", "The Beatles");
        later.cover_url = "Y".to_string();
        later.country = "US".to_string();
        let second = repo.upsert_by_name_and_artist(later, 9).await.unwrap();

        assert!(!second.created);
        assert_eq!(second.album.id, first.album.id);
        assert_eq!(second.album.cover_url, "X");
        assert_eq!(second.album.country, "US");
        assert_eq!(second.album.created_at, 5);
        assert_eq!(second.album.updated_at, 9);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_album_upserts() {
        let repo = Arc::new(InMemoryAlbumRepository::new());
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let repo = Arc::clone(&repo);
                tokio::spawn(async move {
                    repo.upsert_by_name_and_artist(fields("Blue Train", "John Coltrane"), i)
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_inventory_increment_contract() {
        let repo = InMemoryInventoryRepository::new();
        let snapshot = InventorySnapshot {
            discogs_id: "42".to_string(),
            album_id: AlbumId::new(),
            album_name: "Blue Train".to_string(),
            artist: "John Coltrane".to_string(),
            cover_url: String::new(),
            release_year: "1957".to_string(),
            genres: vec!["Jazz".to_string()],
        };

        assert!(repo
            .record_observation(snapshot.clone(), 1)
            .await
            .unwrap()
            .created);
        let again = repo.record_observation(snapshot, 2).await.unwrap();
        assert!(!again.created);
        assert_eq!(again.record.quantity, 2);
        assert_eq!(again.record.last_updated, 2);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_query_orders_and_pages() {
        let repo = InMemoryAlbumRepository::new();
        for (name, artist) in [
            ("Abbey Road", "The Beatles"),
            ("Kind of Blue", "Miles Davis"),
            ("Blue Train", "John Coltrane"),
        ] {
            repo.upsert_by_name_and_artist(fields(name, artist), 1)
                .await
                .unwrap();
        }

        let page = repo.query(PageRequest::new(0, 2)).await.unwrap();
        assert_eq!(page.total, 3);
        let artists: Vec<_> = page.items.iter().map(|a| a.artist.as_str()).collect();
        assert_eq!(artists, vec!["John Coltrane", "Miles Davis"]);

        let beyond = repo.query(PageRequest::new(5, 2)).await.unwrap();
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.total, 3);
    }
}
