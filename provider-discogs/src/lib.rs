//! # Discogs Provider
//!
//! Implements the `CatalogProvider` trait for the Discogs REST API.
//!
//! ## Overview
//!
//! This crate provides:
//! - Paginated listing of a user's collection (folder `0`, "All")
//! - Release metadata lookup by release id
//! - A fixed-interval request gate shared by every call
//! - Mapping of Discogs HTTP failures onto [`DiscogsError`]
//!
//! Requests are issued exactly once. Retrying is left to the caller, which
//! for the sync core means the next scheduled run.

pub mod connector;
pub mod error;
pub mod rate_limit;
pub mod types;

pub use connector::DiscogsConnector;
pub use error::{DiscogsError, Result};
pub use rate_limit::RateLimiter;
