//! Command-line configuration.
//!
//! Configuration can be provided via:
//! - CLI arguments (`-u`, `-f FILE`, `-d DIR`)
//! - Environment variables (`IBIMG_FILE`, `IBIMG_DIR`)
//! - Default values (`boot.img` in the current directory)
//!
//! # Example
//!
//! ```no_run
//! use ibimg_cli::CliConfig;
//!
//! let config = CliConfig::from_args();
//! let dir = config.validate().expect("Invalid configuration");
//! println!("Working in {}", dir.path().display());
//! ```

use crate::error::ConfigError;
use clap::Parser;
use ibimg_format::ArtifactDir;
use std::path::PathBuf;

/// What a run does with the image and the working directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Split the image into artifacts
    Unpack,
    /// Assemble the artifacts into an image
    Repack,
}

/// Configuration loaded from CLI args and environment variables.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "ibimg",
    about = "Unpack an Intel boot image into separate files, or pack a directory \
             with kernel/ramdisk/bootstub into an Intel boot image",
    version
)]
pub struct CliConfig {
    /// Split boot image into kernel, ramdisk, bootstub, etc.
    #[arg(short = 'u', long)]
    pub unpack: bool,

    /// Boot image to unpack or repack
    #[arg(
        short = 'f',
        long,
        value_name = "FILE",
        env = "IBIMG_FILE",
        default_value = "boot.img"
    )]
    pub file: PathBuf,

    /// Directory holding the unpacked files
    #[arg(
        short = 'd',
        long,
        value_name = "DIR",
        env = "IBIMG_DIR",
        default_value = "."
    )]
    pub dir: PathBuf,
}

impl CliConfig {
    /// Parse configuration from command-line arguments.
    #[must_use]
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Selected mode; repacking is the default
    pub const fn mode(&self) -> Mode {
        if self.unpack {
            Mode::Unpack
        } else {
            Mode::Repack
        }
    }

    /// Validate configuration and open the working directory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The working directory doesn't exist or isn't a directory
    /// - The image path is a directory
    pub fn validate(&self) -> Result<ArtifactDir, ConfigError> {
        let dir = ArtifactDir::open(&self.dir)?;

        if self.file.is_dir() {
            return Err(ConfigError::ImageIsDirectory(self.file.clone()));
        }

        Ok(dir)
    }
}
