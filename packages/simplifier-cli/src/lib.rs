#![deny(clippy::all)]

/**
 * Decorator Metadata Simplifier CLI
 *
 * Batch driver behind the `msimplify` binary
 */
pub use metadata_simplifier as simplifier;

pub mod config;
pub mod files;
pub mod logging;
pub mod parallel;

/// CLI version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
