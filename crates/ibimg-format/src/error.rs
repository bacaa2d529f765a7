//! Error types for the boot image layout codec

use crate::segment::Segment;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when splitting or assembling a boot image
#[derive(Debug, Error)]
pub enum ImageError {
    /// Reading or writing an image, artifact, or directory failed
    #[error("I/O error on '{path}': {source}")]
    Io {
        /// Path that was being accessed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A size field read from the image is outside its sanity bounds
    #[error("{segment} size {size} is outside [{min}, {max}], image layout likely wrong")]
    SizeOutOfBounds {
        /// Region whose size field was rejected
        segment: Segment,
        /// Value found in the size field
        size: u32,
        /// Smallest accepted size
        min: u32,
        /// Largest accepted size
        max: u32,
    },

    /// The input ended before a region was complete
    #[error(
        "Truncated image: {segment} needs {needed} bytes at offset {offset}, only {available} available"
    )]
    Truncated {
        /// Region being read
        segment: Segment,
        /// Offset where the region starts
        offset: usize,
        /// Number of bytes the region needs
        needed: usize,
        /// Number of bytes left in the input from `offset`
        available: usize,
    },

    /// An artifact has a size that does not fit its slot in the image
    #[error("Invalid {segment} size {size}: {reason}")]
    InvalidSegmentSize {
        /// Offending artifact
        segment: Segment,
        /// Artifact length in bytes
        size: usize,
        /// Why the size was rejected
        reason: &'static str,
    },

    /// A required artifact is absent from the working directory
    #[error("Missing required segment {segment} ('{}')", path.display())]
    MissingSegment {
        /// The missing artifact
        segment: Segment,
        /// Where it was looked up
        path: PathBuf,
    },

    /// The working directory does not exist or is not a directory
    #[error("Cannot access '{}': {reason}", path.display())]
    InvalidWorkingDirectory {
        /// Configured directory
        path: PathBuf,
        /// Human-readable cause
        reason: String,
    },

    /// Binary encode/decode error
    #[error("Binary parsing error: {0}")]
    BinRead(String),
}

impl From<binrw::Error> for ImageError {
    fn from(e: binrw::Error) -> Self {
        Self::BinRead(e.to_string())
    }
}

impl ImageError {
    /// Wrap an I/O error with the path it occurred on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for the format-validation kinds (bad size field or truncated input)
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::SizeOutOfBounds { .. } | Self::Truncated { .. } | Self::InvalidSegmentSize { .. }
        )
    }
}

/// Result type alias for layout codec operations
pub type Result<T> = std::result::Result<T, ImageError>;
