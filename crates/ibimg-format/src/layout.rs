//! Fixed offsets, size bounds and region arithmetic for the image layout
//!
//! Stream order never varies:
//!
//! ```text
//! [hdr 512]? [sig 0|480|728|1024]? [info block 4096] [bootstub 4096|8192]
//! [kernel] [ramdisk] [0xFF padding to the next 512-byte sector]
//! ```
//!
//! The info block holds the command line (1024 bytes), the little-endian
//! kernel and ramdisk sizes, the 8-byte parameter, and zero padding.

use crate::error::{ImageError, Result};
use crate::segment::Segment;
use std::fmt;
use std::ops::RangeInclusive;

/// Size of the optional device header
pub const HEADER_SIZE: usize = 512;

/// Deltas tried, in order, when probing for the end of the signature block
///
/// Cumulative signature sizes are therefore 0, 480, 728 and 1024 bytes.
pub const SIGNATURE_PROBE_DELTAS: [usize; 4] = [0, 480, 248, 296];

/// Size of the block holding cmdline, size fields and parameter
pub const INFO_BLOCK_SIZE: usize = 4096;

/// Size of the NUL-padded command line
pub const CMDLINE_SIZE: usize = 1024;

/// Offset of the kernel size field inside the info block
pub const KERNEL_SIZE_OFFSET: usize = CMDLINE_SIZE;

/// Offset of the ramdisk size field inside the info block
pub const RAMDISK_SIZE_OFFSET: usize = CMDLINE_SIZE + 4;

/// Offset of the parameter inside the info block
pub const PARAMETER_OFFSET: usize = CMDLINE_SIZE + 8;

/// Size of the opaque parameter
pub const PARAMETER_SIZE: usize = 8;

/// Offset of the signed-image marker inside the info block
pub const SIGNED_MARKER_OFFSET: usize = CMDLINE_SIZE + 16;

/// Marker written into the info block of images that carry a signature
pub const SIGNED_MARKER: [u8; 8] = [0xBD, 0x02, 0xBD, 0x02, 0xBD, 0x12, 0xBD, 0x12];

/// Base bootstub size; some devices use twice this
pub const BOOTSTUB_UNIT: usize = 4096;

/// Accepted kernel sizes when splitting
pub const KERNEL_SIZE_RANGE: RangeInclusive<u32> = 500_000..=15_000_000;

/// Accepted ramdisk sizes when splitting
pub const RAMDISK_SIZE_RANGE: RangeInclusive<u32> = 10_000..=300_000_000;

/// Alignment unit of the assembled image
pub const SECTOR_SIZE: usize = 512;

/// Fill byte for the trailing sector padding
pub const PADDING_FILL: u8 = 0xFF;

/// Bytes of padding needed to bring `image_size` to a sector boundary
pub const fn padding_for(image_size: usize) -> usize {
    (SECTOR_SIZE - image_size % SECTOR_SIZE) % SECTOR_SIZE
}

/// Reject a size field that is outside its sanity bounds
pub fn check_size_bounds(segment: Segment, size: u32, range: &RangeInclusive<u32>) -> Result<()> {
    if range.contains(&size) {
        Ok(())
    } else {
        Err(ImageError::SizeOutOfBounds {
            segment,
            size,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

/// Decode a little-endian `u32` at `offset`, `None` if it would overrun `buf`
pub fn read_u32_le(buf: &[u8], offset: usize) -> Option<u32> {
    let bytes: [u8; 4] = buf.get(offset..offset.checked_add(4)?)?.try_into().ok()?;
    Some(u32::from_le_bytes(bytes))
}

/// Encode `value` little-endian at `offset`, `None` if it would overrun `buf`
pub fn write_u32_le(buf: &mut [u8], offset: usize, value: u32) -> Option<()> {
    buf.get_mut(offset..offset.checked_add(4)?)?
        .copy_from_slice(&value.to_le_bytes());
    Some(())
}

/// Region sizes of one image and the offsets derived from them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageLayout {
    /// Header size (0 or 512)
    pub header_size: usize,
    /// Signature size (0 when unsigned)
    pub signature_size: usize,
    /// Bootstub size (4096 or 8192)
    pub bootstub_size: usize,
    /// Kernel size
    pub kernel_size: usize,
    /// Ramdisk size
    pub ramdisk_size: usize,
}

impl ImageLayout {
    /// Offset of the info block (cmdline, size fields, parameter)
    pub const fn info_offset(&self) -> usize {
        self.header_size + self.signature_size
    }

    /// Offset of the bootstub
    pub const fn bootstub_offset(&self) -> usize {
        self.info_offset() + INFO_BLOCK_SIZE
    }

    /// Offset of the kernel
    pub const fn kernel_offset(&self) -> usize {
        self.bootstub_offset() + self.bootstub_size
    }

    /// Offset of the ramdisk
    pub const fn ramdisk_offset(&self) -> usize {
        self.kernel_offset() + self.kernel_size
    }

    /// Image size before trailing padding
    pub const fn image_size(&self) -> usize {
        self.ramdisk_offset() + self.ramdisk_size
    }

    /// Trailing padding up to the next sector boundary
    pub const fn padding_size(&self) -> usize {
        padding_for(self.image_size())
    }

    /// Image size including trailing padding
    pub const fn padded_size(&self) -> usize {
        self.image_size() + self.padding_size()
    }

    /// Number of sectors minus one, as stored in the header
    pub fn sector_count(&self) -> Result<u32> {
        let sectors = self.padded_size() / SECTOR_SIZE;
        u32::try_from(sectors.saturating_sub(1)).map_err(|_| ImageError::InvalidSegmentSize {
            segment: Segment::Ramdisk,
            size: self.ramdisk_size,
            reason: "image does not fit a 32-bit sector count",
        })
    }
}

impl fmt::Display for ImageLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "header size   {}", self.header_size)?;
        writeln!(f, "sig size      {}", self.signature_size)?;
        writeln!(f, "bootstub size {}", self.bootstub_size)?;
        writeln!(f, "kernel size   {}", self.kernel_size)?;
        write!(f, "ramdisk size  {}", self.ramdisk_size)
    }
}
