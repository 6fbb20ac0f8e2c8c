//! Remote Catalog Abstraction
//!
//! The sync core reads an account's owned releases and their metadata through
//! [`CatalogProvider`]. The types here are transient: they live for one sync
//! iteration and are never persisted as-is.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One owned release in the remote collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionItem {
    pub release_id: u64,
}

impl CollectionItem {
    pub fn new(release_id: u64) -> Self {
        Self { release_id }
    }
}

/// A single page of the collection listing.
///
/// Pages are 1-based. `pages` is the total page count reported upstream; a
/// listing that reports no pagination is a single page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionPage {
    pub items: Vec<CollectionItem>,
    pub page: u32,
    pub pages: u32,
}

impl CollectionPage {
    pub fn new(items: Vec<CollectionItem>, page: u32, pages: u32) -> Self {
        Self { items, page, pages }
    }

    /// Whether a page after this one exists.
    pub fn has_next(&self) -> bool {
        self.page < self.pages && !self.items.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseImage {
    #[serde(default)]
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseLabel {
    #[serde(default)]
    pub name: String,
}

/// Full metadata for a release.
///
/// Absent arrays and strings deserialize as empty values; `released` is a
/// date string such as `"1969-09-26"`, `"1994"` or `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseDetail {
    pub id: u64,
    pub title: String,
    pub artists_sort: String,
    pub images: Vec<ReleaseImage>,
    pub genres: Vec<String>,
    pub styles: Vec<String>,
    pub released: String,
    pub labels: Vec<ReleaseLabel>,
    pub country: String,
}

/// Remote catalog provider
///
/// Implementations must issue one upstream request per call and must not
/// retry. Any failure (transport, non-2xx, rate-limit rejection) is returned
/// to the caller, which decides whether the sync run continues.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::catalog::CatalogProvider;
///
/// async fn first_title(provider: &dyn CatalogProvider) -> Result<Option<String>> {
///     let page = provider.list_collection_page(1).await?;
///     match page.items.first() {
///         Some(item) => Ok(Some(provider.fetch_release(item.release_id).await?.title)),
///         None => Ok(None),
///     }
/// }
/// ```
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Fetch one 1-based page of the configured account's collection.
    async fn list_collection_page(&self, page: u32) -> Result<CollectionPage>;

    /// Fetch full metadata for a release.
    async fn fetch_release(&self, release_id: u64) -> Result<ReleaseDetail>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_detail_defaults_missing_fields() {
        let detail: ReleaseDetail =
            serde_json::from_str(r#"{"id": 123, "title": "Abbey Road"}"#).unwrap();

        assert_eq!(detail.id, 123);
        assert_eq!(detail.title, "Abbey Road");
        assert!(detail.images.is_empty());
        assert!(detail.labels.is_empty());
        assert_eq!(detail.released, "");
        assert_eq!(detail.country, "");
    }

    #[test]
    fn test_collection_page_has_next() {
        let items = vec![CollectionItem::new(1), CollectionItem::new(2)];
        assert!(CollectionPage::new(items.clone(), 1, 3).has_next());
        assert!(!CollectionPage::new(items, 3, 3).has_next());
        assert!(!CollectionPage::new(Vec::new(), 1, 3).has_next());
    }
}
