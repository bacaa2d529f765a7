//! Unpack and repack runs against a working directory

use crate::config::{CliConfig, Mode};
use crate::error::CliError;
use ibimg_format::{ArtifactDir, ImageError, ImageLayout, assemble_image, split};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Outcome of a run, printed to stdout by the binary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    /// What the run did
    pub mode: Mode,
    /// Layout of the image that was read or written
    pub layout: ImageLayout,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.layout)?;
        if self.mode == Mode::Repack {
            writeln!(f)?;
            writeln!(f, "padding size  {}", self.layout.padding_size())?;
            write!(f, "image size    {}", self.layout.padded_size())?;
        }
        Ok(())
    }
}

/// Run the mode selected by `config`
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the run fails.
pub fn run(config: &CliConfig) -> Result<Report, CliError> {
    let mut dir = config.validate()?;
    let layout = match config.mode() {
        Mode::Unpack => unpack(&config.file, &mut dir)?,
        Mode::Repack => repack(&dir, &config.file)?,
    };
    Ok(Report {
        mode: config.mode(),
        layout,
    })
}

/// Split the image at `image_path` into artifacts in `dir`
///
/// Artifacts emitted before a failure stay in `dir`.
///
/// # Errors
///
/// Returns an error if the image cannot be read or split.
pub fn unpack(image_path: &Path, dir: &mut ArtifactDir) -> Result<ImageLayout, CliError> {
    let image = std::fs::read(image_path).map_err(|e| ImageError::io(image_path, e))?;
    info!(
        "Unpacking {} ({} bytes) into {}",
        image_path.display(),
        image.len(),
        dir.path().display()
    );
    Ok(split(&image, dir)?)
}

/// Assemble the artifacts in `dir` into an image at `image_path`
///
/// # Errors
///
/// Returns an error if an artifact is missing or invalid, or the image
/// cannot be written. No output file is left behind on failure.
pub fn repack(dir: &ArtifactDir, image_path: &Path) -> Result<ImageLayout, CliError> {
    let image = assemble_image(dir)?;
    write_atomic(image_path, &image.data)?;
    info!(
        "Wrote {} ({} bytes) from {}",
        image_path.display(),
        image.data.len(),
        dir.path().display()
    );
    Ok(image.layout)
}

/// Write `data` to a sibling temp file, then rename it over `path`
///
/// # Errors
///
/// Returns `CliError::Output` if any step fails. The temp file is removed.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<(), CliError> {
    let temp_path = temp_path_for(path);
    debug!("Writing {} via {}", path.display(), temp_path.display());

    write_and_rename(&temp_path, path, data).map_err(|source| {
        let _ = std::fs::remove_file(&temp_path);
        CliError::Output {
            path: path.to_path_buf(),
            source,
        }
    })
}

fn write_and_rename(temp_path: &Path, path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = std::fs::File::create(temp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    std::fs::rename(temp_path, path)
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_temp_path_is_sibling() {
        assert_eq!(
            temp_path_for(Path::new("out/boot.img")),
            PathBuf::from("out/boot.img.tmp")
        );
    }

    #[test]
    fn test_write_atomic_replaces_file() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let path = temp.path().join("boot.img");
        std::fs::write(&path, b"old").unwrap();

        write_atomic(&path, b"new contents").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"new contents");
        assert!(!temp.path().join("boot.img.tmp").exists());
    }

    #[test]
    fn test_write_atomic_missing_parent() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let path = temp.path().join("missing").join("boot.img");

        let err = write_atomic(&path, b"data").unwrap_err();
        assert!(matches!(err, CliError::Output { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_report_lines() {
        let layout = ImageLayout {
            header_size: 512,
            signature_size: 0,
            bootstub_size: 4096,
            kernel_size: 600_000,
            ramdisk_size: 20_000,
        };
        let unpacked = Report {
            mode: Mode::Unpack,
            layout,
        }
        .to_string();
        assert_eq!(unpacked.lines().count(), 5);
        assert!(unpacked.starts_with("header size   512"));

        let repacked = Report {
            mode: Mode::Repack,
            layout,
        }
        .to_string();
        let last = repacked.lines().last().unwrap();
        assert_eq!(last, format!("image size    {}", layout.padded_size()));
        assert_eq!(layout.padded_size() % 512, 0);
    }
}
