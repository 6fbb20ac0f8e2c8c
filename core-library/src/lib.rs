//! # Catalog Library Module
//!
//! Owns the local catalog store: the `albums` catalog and the per-release
//! `inventory` ledger.
//!
//! ## Overview
//!
//! - SQLite schema, migrations and pool creation ([`db`])
//! - Persisted models ([`models`])
//! - Repository traits with atomic find-or-create / create-or-increment
//!   contracts, plus SQLite and in-memory implementations ([`repositories`])

pub mod db;
pub mod error;
pub mod models;
pub mod repositories;

pub use error::{LibraryError, Result};
pub use models::{
    AlbumFields, AlbumId, AlbumRecord, AlbumUpsert, InventoryRecord, InventorySnapshot,
    InventoryUpsert,
};
pub use repositories::{
    AlbumRepository, InMemoryAlbumRepository, InMemoryInventoryRepository, InventoryRepository,
    Page, PageRequest, SqliteAlbumRepository, SqliteInventoryRepository,
};
