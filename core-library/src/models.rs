//! Domain models for the catalog and the inventory ledger
//!
//! `AlbumRecord` is the canonical catalog entry, unique per `(album_name,
//! artist)`. `InventoryRecord` counts how many times a Discogs release has been
//! observed by the sync, one record per release id.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{LibraryError, Result};

/// Unique identifier for an album
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AlbumId(pub Uuid);

impl AlbumId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> std::result::Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for AlbumId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AlbumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Catalog fields carried by one observation of a release.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumFields {
    pub album_name: String,
    pub artist: String,
    /// Only written when the album is first created
    pub cover_url: String,
    pub discogs_id: u64,
    pub genres: Vec<String>,
    pub styles: Vec<String>,
    pub release_year: String,
    pub label: String,
    pub country: String,
}

impl AlbumFields {
    pub fn validate(&self) -> Result<()> {
        if self.discogs_id > i64::MAX as u64 {
            return Err(LibraryError::InvalidInput {
                field: "discogs_id".to_string(),
                message: format!("{} does not fit in a signed 64-bit column", self.discogs_id),
            });
        }

        Ok(())
    }
}

/// Persisted catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumRecord {
    pub id: AlbumId,
    pub album_name: String,
    pub artist: String,
    pub cover_url: String,
    /// Release id of the most recent observation
    pub discogs_id: u64,
    pub genres: Vec<String>,
    pub styles: Vec<String>,
    pub release_year: String,
    pub label: String,
    pub country: String,
    /// Unix seconds, set once
    pub created_at: i64,
    /// Unix seconds
    pub updated_at: i64,
}

impl AlbumRecord {
    /// Build a fresh record from an observation.
    pub fn create(fields: AlbumFields, now: i64) -> Self {
        Self {
            id: AlbumId::new(),
            album_name: fields.album_name,
            artist: fields.artist,
            cover_url: fields.cover_url,
            discogs_id: fields.discogs_id,
            genres: fields.genres,
            styles: fields.styles,
            release_year: fields.release_year,
            label: fields.label,
            country: fields.country,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge a later observation into this record.
    ///
    /// Every field is overwritten except `cover_url`, `created_at` and the key.
    pub fn merge(&mut self, fields: AlbumFields, now: i64) {
        self.discogs_id = fields.discogs_id;
        self.genres = fields.genres;
        self.styles = fields.styles;
        self.release_year = fields.release_year;
        self.label = fields.label;
        self.country = fields.country;
        self.updated_at = now;
    }

    pub fn matches(&self, album_name: &str, artist: &str) -> bool {
        self.album_name == album_name && self.artist == artist
    }
}

/// Result of an album find-or-create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumUpsert {
    pub album: AlbumRecord,
    /// `true` when the record did not exist before this call
    pub created: bool,
}

/// Inventory fields written when a release is first observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    /// Stringified Discogs release id
    pub discogs_id: String,
    pub album_id: AlbumId,
    pub album_name: String,
    pub artist: String,
    pub cover_url: String,
    pub release_year: String,
    pub genres: Vec<String>,
}

impl InventorySnapshot {
    pub fn validate(&self) -> Result<()> {
        if self.discogs_id.trim().is_empty() {
            return Err(LibraryError::InvalidInput {
                field: "discogs_id".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Persisted per-release stock counter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub discogs_id: String,
    /// Weak back-reference to the album, used for lookups only
    pub album_id: AlbumId,
    pub album_name: String,
    pub artist: String,
    pub cover_url: String,
    pub release_year: String,
    pub genres: Vec<String>,
    /// Number of sync observations, always >= 1
    pub quantity: i64,
    /// Unix seconds
    pub last_updated: i64,
}

impl InventoryRecord {
    pub fn first_observation(snapshot: InventorySnapshot, now: i64) -> Self {
        Self {
            discogs_id: snapshot.discogs_id,
            album_id: snapshot.album_id,
            album_name: snapshot.album_name,
            artist: snapshot.artist,
            cover_url: snapshot.cover_url,
            release_year: snapshot.release_year,
            genres: snapshot.genres,
            quantity: 1,
            last_updated: now,
        }
    }

    /// Count one more observation. No other field changes.
    pub fn observe_again(&mut self, now: i64) {
        self.quantity += 1;
        self.last_updated = now;
    }
}

/// Result of an inventory create-or-increment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryUpsert {
    pub record: InventoryRecord,
    /// `true` when this call created the record with quantity 1
    pub created: bool,
}
