//! # Catalog Reconciler
//!
//! Files one observed release into the catalog and the inventory ledger.
//!
//! ## Per-release steps
//!
//! 1. Resolve the release's full metadata from the [`CatalogProvider`].
//! 2. Normalize it ([`crate::normalize`]).
//! 3. Find-or-create the album keyed by `(album_name, artist)`. An existing
//!    album gets every field refreshed except its cover and creation time.
//! 4. Create-or-increment the inventory record keyed by the release id,
//!    linked to the album from step 3.
//!
//! Steps 3 and 4 are separate atomic writes. A failure between them leaves
//! the album without its inventory record until the next run observes the
//! release again.

use crate::normalize::{album_fields, inventory_snapshot};
use crate::Result;
use bridge_traits::catalog::{CatalogProvider, CollectionItem};
use bridge_traits::time::Clock;
use core_library::models::{AlbumRecord, InventoryRecord};
use core_library::repositories::{AlbumRepository, InventoryRepository};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// What reconciling one release changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub album: AlbumRecord,
    pub album_created: bool,
    pub inventory: InventoryRecord,
    pub inventory_created: bool,
}

/// Reconciliation engine over injected provider and stores
pub struct CatalogReconciler {
    provider: Arc<dyn CatalogProvider>,
    albums: Arc<dyn AlbumRepository>,
    inventory: Arc<dyn InventoryRepository>,
    clock: Arc<dyn Clock>,
}

impl CatalogReconciler {
    pub fn new(
        provider: Arc<dyn CatalogProvider>,
        albums: Arc<dyn AlbumRepository>,
        inventory: Arc<dyn InventoryRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            provider,
            albums,
            inventory,
            clock,
        }
    }

    /// Reconcile one collection item.
    ///
    /// # Errors
    ///
    /// Returns the first provider or store failure; nothing is retried.
    #[instrument(skip(self), fields(release_id = item.release_id))]
    pub async fn reconcile(&self, item: CollectionItem) -> Result<ReconcileOutcome> {
        let detail = self.provider.fetch_release(item.release_id).await?;
        let fields = album_fields(&detail);

        let album = self
            .albums
            .upsert_by_name_and_artist(fields.clone(), self.clock.unix_timestamp())
            .await?;
        debug!(album_id = %album.album.id, created = album.created, "Album reconciled");

        let inventory = self
            .inventory
            .record_observation(
                inventory_snapshot(&fields, album.album.id),
                self.clock.unix_timestamp(),
            )
            .await?;

        info!(
            album_name = %fields.album_name,
            artist = %fields.artist,
            quantity = inventory.record.quantity,
            "Synced and inventoried"
        );

        Ok(ReconcileOutcome {
            album: album.album,
            album_created: album.created,
            inventory: inventory.record,
            inventory_created: inventory.created,
        })
    }
}
