//! Rebuilding a monolithic image from segments
//!
//! All required segments are loaded before anything is laid out, so a
//! missing artifact aborts without producing output. The header's derived
//! fields (image type, sector count, checksum) are recomputed from the final
//! layout rather than copied from the `hdr` artifact.

use crate::artifact::ArtifactSource;
use crate::error::{ImageError, Result};
use crate::header::{BootHeader, CHECKSUM_SPAN};
use crate::info::ImageInfo;
use crate::layout::{
    BOOTSTUB_UNIT, HEADER_SIZE, INFO_BLOCK_SIZE, ImageLayout, KERNEL_SIZE_RANGE, PADDING_FILL,
    RAMDISK_SIZE_RANGE, SIGNED_MARKER, SIGNED_MARKER_OFFSET,
};
use crate::segment::Segment;
use tracing::{debug, info, warn};

/// An assembled image together with the layout it was built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledImage {
    /// Region sizes and offsets
    pub layout: ImageLayout,
    /// Complete, sector-padded image bytes
    pub data: Vec<u8>,
}

impl AssembledImage {
    /// Take the image bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

/// Assemble an image from `source`, returning its bytes
///
/// See [`assemble_image`] for the layout rules.
pub fn assemble<S: ArtifactSource + ?Sized>(source: &S) -> Result<Vec<u8>> {
    assemble_image(source).map(AssembledImage::into_bytes)
}

/// Assemble an image from `source`
///
/// # Errors
///
/// - `MissingSegment` when a required artifact is absent
/// - `InvalidSegmentSize` when an artifact cannot fit its slot
/// - any error reported by the source
pub fn assemble_image<S: ArtifactSource + ?Sized>(source: &S) -> Result<AssembledImage> {
    // Empty optional artifacts count as absent
    let header = source.get(Segment::Header)?.filter(|d| !d.is_empty());
    let signature = source.get(Segment::Signature)?.filter(|d| !d.is_empty());

    let cmdline = source.require(Segment::Cmdline)?;
    let parameter = source.require(Segment::Parameter)?;
    let bootstub = source.require(Segment::Bootstub)?;
    let kernel = source.require(Segment::Kernel)?;
    let ramdisk = source.require(Segment::Ramdisk)?;

    let layout = ImageLayout {
        header_size: header.as_ref().map_or(0, Vec::len),
        signature_size: signature.as_ref().map_or(0, Vec::len),
        bootstub_size: bootstub.len(),
        kernel_size: kernel.len(),
        ramdisk_size: ramdisk.len(),
    };

    let kernel_size = payload_size(Segment::Kernel, kernel.len())?;
    let ramdisk_size = payload_size(Segment::Ramdisk, ramdisk.len())?;
    warn_unusual_sizes(&layout, kernel_size, ramdisk_size);

    let image_info = ImageInfo::new(&cmdline, &parameter, kernel_size, ramdisk_size)?;

    let mut data = vec![0u8; layout.padded_size()];

    if let Some(header) = &header {
        if header.len() < CHECKSUM_SPAN {
            return Err(ImageError::InvalidSegmentSize {
                segment: Segment::Header,
                size: header.len(),
                reason: "header must cover the 56 checksummed bytes",
            });
        }
        data[..header.len()].copy_from_slice(header);
    }

    let info_offset = layout.info_offset();
    data[info_offset..info_offset + INFO_BLOCK_SIZE].copy_from_slice(&image_info.build()?);

    if let Some(signature) = &signature {
        data[layout.header_size..info_offset].copy_from_slice(signature);
        let marker_offset = info_offset + SIGNED_MARKER_OFFSET;
        data[marker_offset..marker_offset + SIGNED_MARKER.len()].copy_from_slice(&SIGNED_MARKER);
        debug!("Marked image as signed at {:#x}", marker_offset);
    } else if header.is_some() {
        let mut view = BootHeader::new(&mut data[..layout.header_size])?;
        view.mark_unsigned();
        debug!("Unsigned image, image type now {}", view.image_type());
    }

    data[layout.bootstub_offset()..layout.kernel_offset()].copy_from_slice(&bootstub);
    data[layout.kernel_offset()..layout.ramdisk_offset()].copy_from_slice(&kernel);
    data[layout.ramdisk_offset()..layout.image_size()].copy_from_slice(&ramdisk);
    data[layout.image_size()..].fill(PADDING_FILL);

    if header.is_some() {
        let sectors = layout.sector_count()?;
        let mut view = BootHeader::new(&mut data[..layout.header_size])?;
        view.set_sector_count(sectors);
        let checksum = view.update_checksum();
        debug!("Header sectors {} checksum {:#04x}", sectors, checksum);
    }

    info!(
        "Assembled {} byte image ({} bytes padding)",
        data.len(),
        layout.padding_size()
    );

    Ok(AssembledImage { layout, data })
}

fn payload_size(segment: Segment, len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| ImageError::InvalidSegmentSize {
        segment,
        size: len,
        reason: "does not fit the 32-bit size field",
    })
}

/// Sizes the splitter would reject still assemble, but are worth a warning
fn warn_unusual_sizes(layout: &ImageLayout, kernel_size: u32, ramdisk_size: u32) {
    if layout.header_size != 0 && layout.header_size != HEADER_SIZE {
        warn!(
            "Header is {} bytes, expected {}",
            layout.header_size, HEADER_SIZE
        );
    }
    if layout.bootstub_size != BOOTSTUB_UNIT && layout.bootstub_size != 2 * BOOTSTUB_UNIT {
        warn!(
            "Bootstub is {} bytes, expected {} or {}",
            layout.bootstub_size,
            BOOTSTUB_UNIT,
            2 * BOOTSTUB_UNIT
        );
    }
    if !KERNEL_SIZE_RANGE.contains(&kernel_size) {
        warn!(
            "Kernel size {} is outside {:?}, the image will not split again",
            kernel_size, KERNEL_SIZE_RANGE
        );
    }
    if !RAMDISK_SIZE_RANGE.contains(&ramdisk_size) {
        warn!(
            "Ramdisk size {} is outside {:?}, the image will not split again",
            ramdisk_size, RAMDISK_SIZE_RANGE
        );
    }
}
