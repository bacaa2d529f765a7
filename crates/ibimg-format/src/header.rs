//! Device header fields that are derived from the final image
//!
//! Only three fields of the 512-byte header are interpreted:
//!
//! ```text
//! offset 0x07: u8   xor checksum over bytes [0, 56) with this byte as zero
//! offset 0x30: u32  sector count minus one (little-endian)
//! offset 0x34: u32  image type (little-endian), +1 for unsigned images
//! ```
//!
//! Everything else is copied through untouched.

use crate::error::{ImageError, Result};
use crate::layout::{read_u32_le, write_u32_le};
use crate::segment::Segment;

/// Offset of the checksum byte
pub const CHECKSUM_OFFSET: usize = 7;

/// Offset of the sector count field
pub const SECTOR_COUNT_OFFSET: usize = 48;

/// Offset of the image type field
pub const IMAGE_TYPE_OFFSET: usize = 52;

/// Number of leading header bytes covered by the checksum
pub const CHECKSUM_SPAN: usize = 56;

/// XOR checksum over `bytes[..56]`, treating the checksum byte as zero
///
/// Returns `None` when fewer than 56 bytes are given.
pub fn header_checksum(bytes: &[u8]) -> Option<u8> {
    let span = bytes.get(..CHECKSUM_SPAN)?;
    Some(
        span.iter()
            .enumerate()
            .filter(|(i, _)| *i != CHECKSUM_OFFSET)
            .fold(0u8, |acc, (_, b)| acc ^ b),
    )
}

/// Mutable view over the header bytes at the start of an image
#[derive(Debug)]
pub struct BootHeader<'a> {
    bytes: &'a mut [u8],
}

impl<'a> BootHeader<'a> {
    /// Wrap header bytes, which must cover at least the checksummed span
    pub fn new(bytes: &'a mut [u8]) -> Result<Self> {
        if bytes.len() < CHECKSUM_SPAN {
            return Err(ImageError::InvalidSegmentSize {
                segment: Segment::Header,
                size: bytes.len(),
                reason: "header must cover the 56 checksummed bytes",
            });
        }
        Ok(Self { bytes })
    }

    /// Stored checksum byte
    pub fn checksum(&self) -> u8 {
        self.bytes[CHECKSUM_OFFSET]
    }

    /// Stored sector count
    pub fn sector_count(&self) -> u32 {
        read_u32_le(self.bytes, SECTOR_COUNT_OFFSET).unwrap_or_default()
    }

    /// Stored image type
    pub fn image_type(&self) -> u32 {
        read_u32_le(self.bytes, IMAGE_TYPE_OFFSET).unwrap_or_default()
    }

    /// Overwrite the sector count
    pub fn set_sector_count(&mut self, sectors: u32) {
        let _ = write_u32_le(self.bytes, SECTOR_COUNT_OFFSET, sectors);
    }

    /// Overwrite the image type
    pub fn set_image_type(&mut self, image_type: u32) {
        let _ = write_u32_le(self.bytes, IMAGE_TYPE_OFFSET, image_type);
    }

    /// Mark the image as unsigned
    pub fn mark_unsigned(&mut self) {
        let image_type = self.image_type().wrapping_add(1);
        self.set_image_type(image_type);
    }

    /// Undo [`BootHeader::mark_unsigned`]
    pub fn mark_signed(&mut self) {
        let image_type = self.image_type().wrapping_sub(1);
        self.set_image_type(image_type);
    }

    /// Recompute and store the checksum, returning the new value
    pub fn update_checksum(&mut self) -> u8 {
        let checksum = header_checksum(self.bytes).unwrap_or_default();
        self.bytes[CHECKSUM_OFFSET] = checksum;
        checksum
    }

    /// Whether the stored checksum matches the header contents
    pub fn checksum_valid(&self) -> bool {
        header_checksum(self.bytes) == Some(self.checksum())
    }
}
