//! # Host Bridge Traits
//!
//! Capability traits that the sync core depends on but does not implement.
//!
//! ## Overview
//!
//! This crate defines the contract between the catalog-sync core and the
//! concrete adapters that talk to the outside world. Each trait represents a
//! capability the core requires: issuing HTTP requests, reading the time,
//! scheduling recurring work, and listing a remote music collection.
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Single-shot async GET requests
//! - [`CatalogProvider`](catalog::CatalogProvider) - Remote collection listing and release lookup
//!
//! ### Scheduling
//! - [`BackgroundExecutor`](background::BackgroundExecutor) - Recurring task execution
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Implementations
//!
//! | Capability | Implementation |
//! |------------|----------------|
//! | `HttpClient` | `bridge_desktop::ReqwestHttpClient` |
//! | `BackgroundExecutor` | `bridge_desktop::TokioBackgroundExecutor` |
//! | `CatalogProvider` | `provider_discogs::DiscogsConnector` |
//! | `Clock` | [`SystemClock`](time::SystemClock) |
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Adapters
//! convert their own error types into `BridgeError` and keep the message
//! actionable (status codes, release ids, endpoints).
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so implementations can be shared
//! across tasks behind an `Arc`.

pub mod background;
pub mod catalog;
pub mod error;
pub mod http;
pub mod time;

pub use error::BridgeError;

pub use background::{BackgroundExecutor, TaskId, TaskStatus};
pub use catalog::{
    CatalogProvider, CollectionItem, CollectionPage, ReleaseDetail, ReleaseImage, ReleaseLabel,
};
pub use http::{HttpClient, HttpRequest, HttpResponse};
pub use time::{Clock, LogEntry, LogLevel, LoggerSink, SystemClock};
