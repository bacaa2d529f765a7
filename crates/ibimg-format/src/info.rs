//! The 4096-byte info block: command line, payload sizes, parameter
//!
//! Layout (little-endian):
//! ```text
//! offset 0x000: [u8; 1024] cmdline, NUL-padded
//! offset 0x400: u32        kernel size
//! offset 0x404: u32        ramdisk size
//! offset 0x408: [u8; 8]    parameter
//! offset 0x410: [u8; 8]    signed-image marker (signed images only)
//! offset 0x418: zero padding up to 4096 bytes
//! ```

use crate::error::{ImageError, Result};
use crate::layout::{CMDLINE_SIZE, INFO_BLOCK_SIZE, PARAMETER_SIZE, SIGNED_MARKER_OFFSET};
use crate::segment::Segment;
use binrw::{BinRead, BinWrite, binrw};
use std::io::Cursor;

/// Bytes of the info block covered by [`ImageInfo`]
pub const IMAGE_INFO_LEN: usize = SIGNED_MARKER_OFFSET;

/// Decoded leading fields of the info block
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    /// NUL-padded kernel command line
    pub cmdline: [u8; CMDLINE_SIZE],
    /// Kernel payload size
    pub kernel_size: u32,
    /// Ramdisk payload size
    pub ramdisk_size: u32,
    /// Opaque parameter bytes
    pub parameter: [u8; PARAMETER_SIZE],
}

impl ImageInfo {
    /// Build an info block from artifact contents
    ///
    /// `cmdline` may be shorter than 1024 bytes and is NUL-padded;
    /// `parameter` may be shorter than 8 bytes and is zero-padded.
    pub fn new(cmdline: &[u8], parameter: &[u8], kernel_size: u32, ramdisk_size: u32) -> Result<Self> {
        if cmdline.len() > CMDLINE_SIZE {
            return Err(ImageError::InvalidSegmentSize {
                segment: Segment::Cmdline,
                size: cmdline.len(),
                reason: "command line is longer than 1024 bytes",
            });
        }
        if parameter.len() > PARAMETER_SIZE {
            return Err(ImageError::InvalidSegmentSize {
                segment: Segment::Parameter,
                size: parameter.len(),
                reason: "parameter is longer than 8 bytes",
            });
        }

        let mut info = Self {
            cmdline: [0; CMDLINE_SIZE],
            kernel_size,
            ramdisk_size,
            parameter: [0; PARAMETER_SIZE],
        };
        info.cmdline[..cmdline.len()].copy_from_slice(cmdline);
        info.parameter[..parameter.len()].copy_from_slice(parameter);
        Ok(info)
    }

    /// Decode from the start of an info block
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < IMAGE_INFO_LEN {
            return Err(ImageError::Truncated {
                segment: Segment::Cmdline,
                offset: 0,
                needed: IMAGE_INFO_LEN,
                available: data.len(),
            });
        }
        let mut cursor = Cursor::new(&data[..IMAGE_INFO_LEN]);
        Ok(Self::read(&mut cursor)?)
    }

    /// Encode into a zeroed 4096-byte info block
    pub fn build(&self) -> Result<Vec<u8>> {
        let mut block = vec![0u8; INFO_BLOCK_SIZE];
        self.write(&mut Cursor::new(&mut block[..]))?;
        Ok(block)
    }

    /// Command line text: the bytes before the first NUL
    pub fn cmdline_text(&self) -> &[u8] {
        let end = self
            .cmdline
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(CMDLINE_SIZE);
        &self.cmdline[..end]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::layout::{KERNEL_SIZE_OFFSET, PARAMETER_OFFSET, RAMDISK_SIZE_OFFSET};

    #[test]
    fn test_build_places_fields() {
        let info = ImageInfo::new(b"console=ttyS0", &[1, 2, 3, 4, 5, 6, 7, 8], 600_000, 20_000)
            .unwrap();
        let block = info.build().unwrap();

        assert_eq!(block.len(), INFO_BLOCK_SIZE);
        assert_eq!(&block[..13], b"console=ttyS0");
        assert!(block[13..CMDLINE_SIZE].iter().all(|&b| b == 0));
        assert_eq!(
            block[KERNEL_SIZE_OFFSET..KERNEL_SIZE_OFFSET + 4],
            600_000u32.to_le_bytes()
        );
        assert_eq!(
            block[RAMDISK_SIZE_OFFSET..RAMDISK_SIZE_OFFSET + 4],
            20_000u32.to_le_bytes()
        );
        assert_eq!(
            block[PARAMETER_OFFSET..PARAMETER_OFFSET + 8],
            [1, 2, 3, 4, 5, 6, 7, 8]
        );
        assert!(block[IMAGE_INFO_LEN..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_parse_reads_fields() {
        let info = ImageInfo::new(b"root=/dev/ram0", b"\xAA\xBB", 1, 2).unwrap();
        let block = info.build().unwrap();
        let parsed = ImageInfo::parse(&block).unwrap();

        assert_eq!(parsed.cmdline_text(), b"root=/dev/ram0");
        assert_eq!(parsed.kernel_size, 1);
        assert_eq!(parsed.ramdisk_size, 2);
        assert_eq!(parsed.parameter, [0xAA, 0xBB, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_cmdline_without_nul_uses_whole_field() {
        let info = ImageInfo::new(&[b'x'; CMDLINE_SIZE], &[], 0, 0).unwrap();
        assert_eq!(info.cmdline_text().len(), CMDLINE_SIZE);
    }

    #[test]
    fn test_oversized_artifacts_rejected() {
        let err = ImageInfo::new(&[b'a'; CMDLINE_SIZE + 1], &[], 0, 0).unwrap_err();
        assert!(matches!(
            err,
            ImageError::InvalidSegmentSize {
                segment: Segment::Cmdline,
                ..
            }
        ));

        let err = ImageInfo::new(b"", &[0; 9], 0, 0).unwrap_err();
        assert!(matches!(
            err,
            ImageError::InvalidSegmentSize {
                segment: Segment::Parameter,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_truncated() {
        let err = ImageInfo::parse(&[0u8; 100]).unwrap_err();
        assert!(matches!(err, ImageError::Truncated { needed: 1040, .. }));
    }
}
