//! Discogs API connector implementation
//!
//! Implements the `CatalogProvider` trait for the Discogs REST API.

use async_trait::async_trait;
use bridge_traits::catalog::{CatalogProvider, CollectionPage, ReleaseDetail};
use bridge_traits::error::BridgeError;
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bridge_traits::time::{Clock, SystemClock};
use core_runtime::config::DiscogsConfig;
use core_runtime::logging::redact_query_secrets;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::error::{DiscogsError, Result};
use crate::rate_limit::RateLimiter;
use crate::types::{CollectionResponse, Release};

/// Timeout for a single API request
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Used when a 429 response carries no usable `Retry-After` header
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Discogs API connector
///
/// Lists the configured user's collection and resolves release metadata.
/// Every request goes through the connector's [`RateLimiter`] first.
///
/// # Example
///
/// ```ignore
/// use provider_discogs::DiscogsConnector;
/// use bridge_traits::catalog::CatalogProvider;
///
/// let connector = DiscogsConnector::new(http_client, config.discogs.clone());
/// let page = connector.list_collection_page(1).await?;
/// ```
pub struct DiscogsConnector {
    http_client: Arc<dyn HttpClient>,
    config: DiscogsConfig,
    rate_limiter: RateLimiter,
}

impl DiscogsConnector {
    pub fn new(http_client: Arc<dyn HttpClient>, config: DiscogsConfig) -> Self {
        Self::with_clock(http_client, config, Arc::new(SystemClock))
    }

    /// Create a connector whose request gate reads time from `clock`.
    pub fn with_clock(
        http_client: Arc<dyn HttpClient>,
        config: DiscogsConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let rate_limiter = RateLimiter::new(config.request_interval(), clock);
        debug!(
            username = %config.username,
            per_page = config.per_page,
            interval = ?rate_limiter.min_interval(),
            "Discogs connector created"
        );

        Self {
            http_client,
            config,
            rate_limiter,
        }
    }

    fn base_url(&self) -> &str {
        self.config.api_base_url.trim_end_matches('/')
    }

    fn token_param(&self) -> String {
        if self.config.token.is_empty() {
            String::new()
        } else {
            format!("token={}&", urlencoding::encode(&self.config.token))
        }
    }

    fn collection_url(&self, page: u32) -> String {
        format!(
            "{}/users/{}/collection/folders/0/releases?{}per_page={}&page={}",
            self.base_url(),
            urlencoding::encode(&self.config.username),
            self.token_param(),
            self.config.per_page,
            page
        )
    }

    fn release_url(&self, release_id: u64) -> String {
        let token = self.token_param();
        let query = token.trim_end_matches('&');
        if query.is_empty() {
            format!("{}/releases/{}", self.base_url(), release_id)
        } else {
            format!("{}/releases/{}?{}", self.base_url(), release_id, query)
        }
    }

    /// Issue one GET request and decode a 2xx body.
    ///
    /// `release_id` is set for release lookups so a 404 can be reported as a
    /// missing release rather than a generic API error.
    async fn get_json<T: DeserializeOwned>(&self, url: String, release_id: Option<u64>) -> Result<T> {
        let redacted = redact_query_secrets(&url);

        let request = HttpRequest::get(url)
            .header("User-Agent", self.config.user_agent.clone())
            .header("Accept", "application/json")
            .timeout(REQUEST_TIMEOUT);

        let response = {
            let _slot = self.rate_limiter.acquire().await;
            self.http_client.execute(request).await
        };
        let response = response.map_err(|e| {
            let error = DiscogsError::NetworkError(Self::transport_message(e));
            warn!(url = %redacted, error = %error, "Discogs request failed");
            error
        })?;

        if !response.is_success() {
            let error = Self::status_error(&response, release_id);
            warn!(url = %redacted, status = response.status, error = %error, "Discogs request rejected");
            return Err(error);
        }

        debug!(url = %redacted, status = response.status, "Discogs request succeeded");

        serde_json::from_slice(&response.body).map_err(|e| DiscogsError::ParseError(e.to_string()))
    }

    /// Transport failure text with any URL query secrets masked.
    fn transport_message(error: BridgeError) -> String {
        let message = match error {
            BridgeError::OperationFailed(message) | BridgeError::NotAvailable(message) => message,
            other => other.to_string(),
        };
        redact_query_secrets(&message)
    }

    fn status_error(response: &HttpResponse, release_id: Option<u64>) -> DiscogsError {
        let message = Self::error_message(response);

        match (response.status, release_id) {
            (401 | 403, _) => DiscogsError::AuthenticationFailed(message),
            (404, Some(release_id)) => DiscogsError::ReleaseNotFound { release_id },
            (429, _) => DiscogsError::RateLimitExceeded {
                retry_after_seconds: response
                    .header("Retry-After")
                    .and_then(|value| value.trim().parse().ok())
                    .unwrap_or(DEFAULT_RETRY_AFTER_SECS),
            },
            (status_code, _) => DiscogsError::ApiError {
                status_code,
                message,
            },
        }
    }

    /// Discogs error bodies look like `{"message": "..."}`.
    fn error_message(response: &HttpResponse) -> String {
        #[derive(serde::Deserialize)]
        struct ErrorBody {
            message: String,
        }

        serde_json::from_slice::<ErrorBody>(&response.body)
            .map(|body| body.message)
            .unwrap_or_else(|_| String::from_utf8_lossy(&response.body).into_owned())
    }
}

#[async_trait]
impl CatalogProvider for DiscogsConnector {
    #[instrument(skip(self))]
    async fn list_collection_page(&self, page: u32) -> bridge_traits::error::Result<CollectionPage> {
        let page = page.max(1);
        let response: CollectionResponse = self.get_json(self.collection_url(page), None).await?;
        let page = response.into_page(page);

        info!(
            page = page.page,
            pages = page.pages,
            items = page.items.len(),
            "Fetched collection page"
        );
        Ok(page)
    }

    #[instrument(skip(self))]
    async fn fetch_release(&self, release_id: u64) -> bridge_traits::error::Result<ReleaseDetail> {
        let release: Release = self
            .get_json(self.release_url(release_id), Some(release_id))
            .await?;

        debug!(title = %release.title, artist = %release.artists_sort, "Fetched release");
        Ok(release.into())
    }
}
