//! Storage for split segments
//!
//! The splitter writes segments to an [`ArtifactSink`] as soon as each one
//! is carved out, and the assembler reads them back from an
//! [`ArtifactSource`]. [`ArtifactDir`] is the working directory on disk;
//! [`SegmentSet`] keeps everything in memory.

use crate::error::{ImageError, Result};
use crate::segment::Segment;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Receives segments as the splitter emits them
pub trait ArtifactSink {
    /// Store the bytes of one segment
    fn put(&mut self, segment: Segment, data: &[u8]) -> Result<()>;
}

/// Provides segments to the assembler
pub trait ArtifactSource {
    /// Load one segment, `Ok(None)` when it does not exist
    fn get(&self, segment: Segment) -> Result<Option<Vec<u8>>>;

    /// Where a segment is looked up, for error reporting
    fn locate(&self, segment: Segment) -> PathBuf {
        PathBuf::from(segment.file_name())
    }

    /// Load a segment that must exist
    fn require(&self, segment: Segment) -> Result<Vec<u8>> {
        self.get(segment)?
            .ok_or_else(|| ImageError::MissingSegment {
                segment,
                path: self.locate(segment),
            })
    }
}

/// Working directory holding one artifact file per segment
#[derive(Debug, Clone)]
pub struct ArtifactDir {
    root: PathBuf,
}

impl ArtifactDir {
    /// Open an existing directory
    ///
    /// # Errors
    ///
    /// Returns `InvalidWorkingDirectory` if the path does not exist or is
    /// not a directory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path).map_err(|e| ImageError::InvalidWorkingDirectory {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        if !metadata.is_dir() {
            return Err(ImageError::InvalidWorkingDirectory {
                path: path.to_path_buf(),
                reason: "Is not a directory".to_string(),
            });
        }

        Ok(Self {
            root: path.to_path_buf(),
        })
    }

    /// Directory path
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Path of the artifact file for `segment`
    pub fn artifact_path(&self, segment: Segment) -> PathBuf {
        self.root.join(segment.file_name())
    }
}

impl ArtifactSink for ArtifactDir {
    fn put(&mut self, segment: Segment, data: &[u8]) -> Result<()> {
        let path = self.artifact_path(segment);
        std::fs::write(&path, data).map_err(|e| ImageError::io(&path, e))?;
        debug!("Wrote {} bytes to {}", data.len(), path.display());
        Ok(())
    }
}

impl ArtifactSource for ArtifactDir {
    fn get(&self, segment: Segment) -> Result<Option<Vec<u8>>> {
        let path = self.artifact_path(segment);
        match std::fs::read(&path) {
            Ok(data) => {
                debug!("Read {} bytes from {}", data.len(), path.display());
                Ok(Some(data))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ImageError::io(path, e)),
        }
    }

    fn locate(&self, segment: Segment) -> PathBuf {
        self.artifact_path(segment)
    }
}

/// In-memory collection of segments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentSet {
    segments: BTreeMap<Segment, Vec<u8>>,
}

impl SegmentSet {
    /// Create an empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a segment
    #[must_use]
    pub fn with(mut self, segment: Segment, data: impl Into<Vec<u8>>) -> Self {
        self.insert(segment, data);
        self
    }

    /// Add or replace a segment
    pub fn insert(&mut self, segment: Segment, data: impl Into<Vec<u8>>) {
        self.segments.insert(segment, data.into());
    }

    /// Remove a segment, returning its bytes
    pub fn remove(&mut self, segment: Segment) -> Option<Vec<u8>> {
        self.segments.remove(&segment)
    }

    /// Borrow a segment
    pub fn segment(&self, segment: Segment) -> Option<&[u8]> {
        self.segments.get(&segment).map(Vec::as_slice)
    }

    /// Segments present, in stream order
    pub fn present(&self) -> impl Iterator<Item = Segment> + '_ {
        self.segments.keys().copied()
    }

    /// Number of segments held
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether no segment is held
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl ArtifactSink for SegmentSet {
    fn put(&mut self, segment: Segment, data: &[u8]) -> Result<()> {
        self.insert(segment, data);
        Ok(())
    }
}

impl ArtifactSource for SegmentSet {
    fn get(&self, segment: Segment) -> Result<Option<Vec<u8>>> {
        Ok(self.segments.get(&segment).cloned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_rejects_missing_and_files() {
        let temp = TempDir::new().expect("Failed to create temp dir");

        let missing = temp.path().join("nope");
        let err = ArtifactDir::open(&missing).unwrap_err();
        assert!(matches!(err, ImageError::InvalidWorkingDirectory { .. }));

        let file = temp.path().join("boot.img");
        std::fs::write(&file, b"x").unwrap();
        let err = ArtifactDir::open(&file).unwrap_err();
        assert!(err.to_string().contains("Is not a directory"));

        assert!(ArtifactDir::open(temp.path()).is_ok());
    }

    #[test]
    fn test_dir_put_get() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let mut dir = ArtifactDir::open(temp.path()).unwrap();

        dir.put(Segment::Kernel, b"kernel bytes").unwrap();
        assert!(temp.path().join("kernel").exists());
        assert_eq!(
            dir.get(Segment::Kernel).unwrap().as_deref(),
            Some(&b"kernel bytes"[..])
        );
        assert_eq!(dir.get(Segment::Signature).unwrap(), None);
    }

    #[test]
    fn test_require_reports_path() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let dir = ArtifactDir::open(temp.path()).unwrap();

        let err = dir.require(Segment::Bootstub).unwrap_err();
        match err {
            ImageError::MissingSegment { segment, path } => {
                assert_eq!(segment, Segment::Bootstub);
                assert_eq!(path, temp.path().join("bootstub"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_segment_set() {
        let mut set = SegmentSet::new()
            .with(Segment::Ramdisk, vec![1, 2])
            .with(Segment::Cmdline, b"console=ttyS0".to_vec());
        assert_eq!(set.len(), 2);
        assert_eq!(
            set.present().collect::<Vec<_>>(),
            vec![Segment::Cmdline, Segment::Ramdisk]
        );
        assert_eq!(set.require(Segment::Ramdisk).unwrap(), vec![1, 2]);
        assert!(set.require(Segment::Kernel).is_err());

        set.put(Segment::Kernel, &[9]).unwrap();
        assert_eq!(set.segment(Segment::Kernel), Some(&[9u8][..]));
        assert_eq!(set.remove(Segment::Kernel), Some(vec![9]));
        assert!(!set.is_empty());
    }
}
