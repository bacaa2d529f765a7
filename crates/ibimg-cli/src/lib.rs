//! Command-line front end for the Intel boot image layout codec.
//!
//! This crate wires the `ibimg-format` codec to the file system:
//! - `config`: CLI argument parsing and validation
//! - `runner`: unpack/repack orchestration and atomic image writes
//! - `error`: error types surfaced to the binary
//!
//! # Example
//!
//! ```no_run
//! use ibimg_cli::{CliConfig, run};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = CliConfig::from_args();
//!     let report = run(&config)?;
//!     println!("{report}");
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config;
pub mod error;
pub mod runner;

pub use config::{CliConfig, Mode};
pub use error::{CliError, ConfigError};
pub use runner::{Report, repack, run, unpack, write_atomic};
