//! Configuration module for paramtune
//!
//! Provides the CLI arguments, the runtime configuration of a tuning run,
//! and the pagecache limit settings file.

mod pagecache;
mod settings;

pub use pagecache::*;
pub use settings::*;
