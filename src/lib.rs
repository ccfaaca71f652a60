//! # dxlclean - Clean and count LotusScript/DXL design exports
//!
//! Converts a noisy export of a legacy Lotus Notes application's design
//! elements into a clean corpus of source-code fragments. Files are
//! classified by extension, magic header, and markup likelihood; DXL/XML
//! files are reduced to their interesting tagged fragments (LotusScript,
//! formulas, base64 raw items, Java), blank lines are stripped, and the
//! run ends with aggregate statistics and a line census of the result.
//!
//! ## Quick Start
//!
//! ```bash
//! # Install dxlclean
//! cargo install dxlclean
//!
//! # Process an export tree (results land in ./export-export)
//! dxlclean ./export
//! ```

pub mod classify;
pub mod cli;
pub mod config;
pub mod extract;
pub mod pipeline;
pub mod report;
pub mod stats;

pub use cli::{Cli, Output};
pub use config::CleanConfig;

/// Result type alias for dxlclean operations
pub type Result<T> = anyhow::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
