//! Discogs API response types
//!
//! Only the fields the sync reads are modelled; everything else in the
//! Discogs payloads is ignored.

use bridge_traits::catalog::{
    CollectionItem, CollectionPage, ReleaseDetail, ReleaseImage, ReleaseLabel,
};
use serde::Deserialize;

/// `GET /users/{user}/collection/folders/0/releases`
///
/// See: https://www.discogs.com/developers#page:user-collection
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionResponse {
    /// Absent on some proxies and fixtures; treated as a single page.
    #[serde(default)]
    pub pagination: Option<Pagination>,

    #[serde(default)]
    pub releases: Vec<CollectionRelease>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub pages: u32,
    #[serde(default)]
    pub per_page: u32,
    #[serde(default)]
    pub items: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionRelease {
    pub basic_information: BasicInformation,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BasicInformation {
    pub id: u64,
}

impl CollectionResponse {
    /// Convert into a page, filling in pagination for `requested_page` when
    /// the response carries none.
    pub fn into_page(self, requested_page: u32) -> CollectionPage {
        let items = self
            .releases
            .into_iter()
            .map(|release| CollectionItem::new(release.basic_information.id))
            .collect();

        match self.pagination {
            Some(pagination) => CollectionPage::new(items, pagination.page, pagination.pages),
            None => CollectionPage::new(items, requested_page, requested_page),
        }
    }
}

/// `GET /releases/{id}`
///
/// See: https://www.discogs.com/developers#page:database,header:database-release
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Release {
    pub id: u64,
    pub title: String,
    pub artists_sort: String,
    pub images: Vec<Image>,
    pub genres: Vec<String>,
    pub styles: Vec<String>,
    /// `null` on releases without a known date
    pub released: Option<String>,
    pub labels: Vec<Label>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Image {
    pub uri: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Label {
    pub name: String,
    pub catno: String,
}

impl From<Release> for ReleaseDetail {
    fn from(release: Release) -> Self {
        ReleaseDetail {
            id: release.id,
            title: release.title,
            artists_sort: release.artists_sort,
            images: release
                .images
                .into_iter()
                .map(|image| ReleaseImage { uri: image.uri })
                .collect(),
            genres: release.genres,
            styles: release.styles,
            released: release.released.unwrap_or_default(),
            labels: release
                .labels
                .into_iter()
                .map(|label| ReleaseLabel { name: label.name })
                .collect(),
            country: release.country.unwrap_or_default(),
        }
    }
}
