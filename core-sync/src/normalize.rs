//! Release normalization
//!
//! Derives the stored album and inventory fields from a release's raw
//! metadata. Missing values become empty strings, never errors.

use bridge_traits::catalog::{ReleaseDetail, ReleaseImage, ReleaseLabel};
use core_library::models::{AlbumFields, AlbumId, InventorySnapshot};

/// URI of the first image, or `""` when the release has none.
///
/// ```
/// use bridge_traits::catalog::ReleaseImage;
/// use core_sync::normalize::cover_url;
///
/// let images = vec![
///     ReleaseImage { uri: "a".to_string() },
///     ReleaseImage { uri: "b".to_string() },
/// ];
/// assert_eq!(cover_url(&images), "a");
/// assert_eq!(cover_url(&[]), "");
/// ```
pub fn cover_url(images: &[ReleaseImage]) -> String {
    images
        .first()
        .map(|image| image.uri.clone())
        .unwrap_or_default()
}

/// Text before the first `-` of a release date.
///
/// ```
/// use core_sync::normalize::release_year;
///
/// assert_eq!(release_year("1994-03-01"), "1994");
/// assert_eq!(release_year("1994"), "1994");
/// assert_eq!(release_year(""), "");
/// ```
pub fn release_year(released: &str) -> String {
    released.split('-').next().unwrap_or_default().to_string()
}

/// Name of the first label, or `""`.
pub fn primary_label(labels: &[ReleaseLabel]) -> String {
    labels
        .first()
        .map(|label| label.name.clone())
        .unwrap_or_default()
}

/// Album fields for a release: title and `artists_sort` form the catalog key.
pub fn album_fields(detail: &ReleaseDetail) -> AlbumFields {
    AlbumFields {
        album_name: detail.title.clone(),
        artist: detail.artists_sort.clone(),
        cover_url: cover_url(&detail.images),
        discogs_id: detail.id,
        genres: detail.genres.clone(),
        styles: detail.styles.clone(),
        release_year: release_year(&detail.released),
        label: primary_label(&detail.labels),
        country: detail.country.clone(),
    }
}

/// Inventory snapshot for a release, linked to the album it was filed under.
///
/// The cover comes from the observed release, not from the stored album.
pub fn inventory_snapshot(fields: &AlbumFields, album_id: AlbumId) -> InventorySnapshot {
    InventorySnapshot {
        discogs_id: fields.discogs_id.to_string(),
        album_id,
        album_name: fields.album_name.clone(),
        artist: fields.artist.clone(),
        cover_url: fields.cover_url.clone(),
        release_year: fields.release_year.clone(),
        genres: fields.genres.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(uri: &str) -> ReleaseImage {
        ReleaseImage {
            uri: uri.to_string(),
        }
    }

    #[test]
    fn test_cover_url() {
        assert_eq!(cover_url(&[]), "");
        assert_eq!(cover_url(&[image("a"), image("b")]), "a");
    }

    #[test]
    fn test_release_year() {
        assert_eq!(release_year("1994-03-01"), "1994");
        assert_eq!(release_year("1969-00-00"), "1969");
        assert_eq!(release_year("2001"), "2001");
        assert_eq!(release_year(""), "");
        assert_eq!(release_year("-05"), "");
    }

    #[test]
    fn test_primary_label() {
        assert_eq!(primary_label(&[]), "");
        let labels = vec![
            ReleaseLabel {
                name: "Blue Note".to_string(),
            },
            ReleaseLabel {
                name: "Liberty".to_string(),
            },
        ];
        assert_eq!(primary_label(&labels), "Blue Note");
    }

    #[test]
    fn test_album_fields_and_snapshot() {
        let detail = ReleaseDetail {
            id: 123,
            title: "Abbey Road".to_string(),
            artists_sort: "The Beatles".to_string(),
            images: vec![image("https://i.discogs.com/front.jpg")],
            genres: vec!["Rock".to_string()],
            styles: vec!["Pop Rock".to_string()],
            released: "1969-09-26".to_string(),
            labels: vec![ReleaseLabel {
                name: "Apple Records".to_string(),
            }],
            country: "UK".to_string(),
        };

        let fields = album_fields(&detail);
        assert_eq!(fields.album_name, "Abbey Road");
        assert_eq!(fields.artist, "The Beatles");
        assert_eq!(fields.cover_url, "https://i.discogs.com/front.jpg");
        assert_eq!(fields.discogs_id, 123);
        assert_eq!(fields.release_year, "1969");
        assert_eq!(fields.label, "Apple Records");
        assert_eq!(fields.country, "UK");

        let album_id = AlbumId::new();
        let snapshot = inventory_snapshot(&fields, album_id);
        assert_eq!(snapshot.discogs_id, "123");
        assert_eq!(snapshot.album_id, album_id);
        assert_eq!(snapshot.cover_url, fields.cover_url);
        assert_eq!(snapshot.genres, vec!["Rock"]);
    }

    #[test]
    fn test_empty_release_normalizes_to_empty_fields() {
        let fields = album_fields(&ReleaseDetail::default());
        assert_eq!(fields.cover_url, "");
        assert_eq!(fields.release_year, "");
        assert_eq!(fields.label, "");
        assert!(fields.genres.is_empty());
    }
}
