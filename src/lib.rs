//! Dissonant workspace facade.
//!
//! Re-exports the workspace crates so a host can depend on `dissonant` alone
//! and wire a catalog sync without naming each crate.

pub use bridge_desktop;
pub use bridge_traits;
pub use core_library;
pub use core_runtime;
pub use core_sync;
pub use provider_discogs;
