//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the catalog sync:
//! - Configuration loading and validation ([`config`])
//! - Logging and tracing bootstrap ([`logging`])
//!
//! Every other crate in the workspace reads its settings from
//! [`config::CoreConfig`] and logs through `tracing`, so the binary only needs
//! to call [`logging::init_logging`] once and pass the config down.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{CoreConfig, CoreConfigBuilder, DiscogsConfig};
pub use error::{Error, Result};
pub use logging::{init_logging, LogFormat, LoggingConfig};
