//! # Repository Pattern Implementation
//!
//! Repository traits for the catalog (`albums`) and the stock ledger
//! (`inventory`), each with a SQLite implementation and an in-memory one.
//!
//! ## Architecture
//!
//! - Traits define the interface; the sync engine only sees `Arc<dyn ...>`
//! - Find-or-create and create-or-increment are single calls on the trait, so
//!   each store can make them atomic in its own way
//! - SQLite implementations use sqlx; list columns are stored as JSON text
//! - Pagination is supported via the `Page<T>` wrapper

pub mod album;
pub mod inventory;
pub mod memory;
pub mod pagination;

pub use album::{AlbumRepository, SqliteAlbumRepository};
pub use inventory::{InventoryRepository, SqliteInventoryRepository};
pub use memory::{InMemoryAlbumRepository, InMemoryInventoryRepository};
pub use pagination::{Page, PageRequest};

use crate::error::{LibraryError, Result};

pub(crate) fn encode_list(values: &[String]) -> Result<String> {
    Ok(serde_json::to_string(values)?)
}

pub(crate) fn decode_list(raw: &str) -> Result<Vec<String>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(raw)?)
}

/// SQLite integers are signed; reject values that would wrap.
pub(crate) fn sql_i64(field: &str, value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| LibraryError::InvalidInput {
        field: field.to_string(),
        message: format!("{} exceeds the SQLite integer range", value),
    })
}
