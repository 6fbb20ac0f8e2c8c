//! # Desktop Bridge Implementations
//!
//! Default implementations of the bridge traits for desktop and server hosts
//! (macOS, Windows, Linux).
//!
//! - `HttpClient` using `reqwest` (one attempt per request, no retry)
//! - `BackgroundExecutor` using Tokio tasks and intervals
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ReqwestHttpClient, TokioBackgroundExecutor};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let http = Arc::new(ReqwestHttpClient::new()?);
//!     let executor = Arc::new(TokioBackgroundExecutor::new());
//!     // hand both to the sync core
//!     Ok(())
//! }
//! ```

mod background;
mod http;

pub use background::TokioBackgroundExecutor;
pub use http::ReqwestHttpClient;
