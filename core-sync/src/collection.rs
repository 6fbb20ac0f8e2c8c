//! # Collection Lister
//!
//! Lazy, restartable listing of every release in the account's collection.
//!
//! The listing walks the provider's pages in order, starting at page 1 on
//! every call to [`CollectionLister::stream`], until the provider reports the
//! last page or returns an empty one. An optional page cap bounds the walk;
//! hitting it is logged as a truncation.

use crate::{Result, SyncError};
use bridge_traits::catalog::{CatalogProvider, CollectionItem, CollectionPage};
use futures::stream::{self, Stream, StreamExt};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct CollectionLister {
    provider: Arc<dyn CatalogProvider>,
    max_pages: Option<u32>,
}

impl CollectionLister {
    /// `max_pages = None` lists the whole collection.
    pub fn new(provider: Arc<dyn CatalogProvider>, max_pages: Option<u32>) -> Self {
        Self {
            provider,
            max_pages,
        }
    }

    /// Stream of collection pages. A failed fetch is yielded and ends the stream.
    pub fn pages(&self) -> impl Stream<Item = Result<CollectionPage>> + Send + 'static {
        let provider = Arc::clone(&self.provider);
        let max_pages = self.max_pages;

        stream::unfold(Some(1u32), move |next| {
            let provider = Arc::clone(&provider);
            async move {
                let number = next?;

                match provider.list_collection_page(number).await {
                    Ok(page) => {
                        debug!(page = number, pages = page.pages, items = page.items.len(), "Listed collection page");
                        let following = next_page(&page, number, max_pages);
                        Some((Ok(page), following))
                    }
                    Err(e) => Some((Err(SyncError::Provider(e)), None)),
                }
            }
        })
    }

    /// Stream of every collection item, in upstream order.
    pub fn stream(&self) -> impl Stream<Item = Result<CollectionItem>> + Send + 'static {
        self.pages().flat_map(|page| {
            let items: Vec<Result<CollectionItem>> = match page {
                Ok(page) => page.items.into_iter().map(Ok).collect(),
                Err(e) => vec![Err(e)],
            };
            stream::iter(items)
        })
    }
}

fn next_page(page: &CollectionPage, number: u32, max_pages: Option<u32>) -> Option<u32> {
    if !page.has_next() {
        return None;
    }

    if let Some(max) = max_pages {
        if number >= max {
            warn!(
                max_pages = max,
                total_pages = page.pages,
                "Collection listing truncated; later pages are not synced"
            );
            return None;
        }
    }

    number.checked_add(1)
}
