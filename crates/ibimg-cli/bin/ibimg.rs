//! Intel boot image unpack/repack tool
//!
//! Usage:
//!   ibimg -u -f boot.img -d unpacked    # split into separate files
//!   ibimg -f boot.img -d unpacked       # pack them back into an image
//!
//! Set `RUST_LOG=debug` to see the region probes.

use anyhow::Context;
use clap::Parser;
use ibimg_cli::{CliConfig, Mode, Report, run};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = match CliConfig::try_parse() {
        Ok(config) => config,
        Err(e) => {
            let _ = e.print();
            // --help and --version are not failures
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match try_main(&config) {
        Ok(report) => {
            println!("{report}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("ibimg: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn try_main(config: &CliConfig) -> anyhow::Result<Report> {
    let action = match config.mode() {
        Mode::Unpack => "unpacking error",
        Mode::Repack => "packing error",
    };
    run(config).context(action)
}
