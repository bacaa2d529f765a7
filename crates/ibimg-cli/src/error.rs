//! Error types for the command-line front end.

use ibimg_format::ImageError;
use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The working directory is missing or not a directory
    #[error(transparent)]
    WorkingDirectory(#[from] ImageError),

    /// The image path names a directory
    #[error("Cannot use '{}' as boot image: Is a directory", .0.display())]
    ImageIsDirectory(PathBuf),
}

/// Errors from an unpack or repack run.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Layout codec or artifact I/O error
    #[error(transparent)]
    Image(#[from] ImageError),

    /// Writing the output image failed
    #[error("Cannot write output file '{path}': {source}")]
    Output {
        /// Image path being written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use ibimg_format::Segment;

    #[test]
    fn test_error_messages() {
        let err = ConfigError::ImageIsDirectory(PathBuf::from("/tmp"));
        assert_eq!(
            err.to_string(),
            "Cannot use '/tmp' as boot image: Is a directory"
        );

        let err: CliError = ImageError::MissingSegment {
            segment: Segment::Kernel,
            path: PathBuf::from("out/kernel"),
        }
        .into();
        assert!(err.to_string().contains("out/kernel"));
    }
}
