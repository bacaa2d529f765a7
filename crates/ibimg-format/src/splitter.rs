//! Carving a monolithic image into segments
//!
//! The splitter walks the image once, front to back. Fixed offsets and the
//! two size fields locate most regions; the header, signature and bootstub
//! boundaries are found by probing short windows with the
//! [`classifier`](crate::classifier). Segments are handed to
//! the sink as soon as they are carved, so a size-field failure part-way
//! through leaves the earlier segments stored.

use crate::artifact::ArtifactSink;
use crate::classifier::{
    BOOTSTUB_PROBE_LEN, BOOTSTUB_PROBE_MIN_ALNUM, REGION_PROBE_LEN, REGION_PROBE_MIN_ALNUM,
    looks_textual, opens_text_block,
};
use crate::error::{ImageError, Result};
use crate::header::BootHeader;
use crate::info::{IMAGE_INFO_LEN, ImageInfo};
use crate::layout::{
    BOOTSTUB_UNIT, HEADER_SIZE, ImageLayout, KERNEL_SIZE_RANGE, RAMDISK_SIZE_RANGE,
    SIGNATURE_PROBE_DELTAS, check_size_bounds,
};
use crate::segment::Segment;
use tracing::{debug, info};

/// Read-only view of the input with bounds-checked access
struct ImageBytes<'a> {
    data: &'a [u8],
}

impl<'a> ImageBytes<'a> {
    /// Up to `len` bytes at `offset`, shorter near the end of the input
    fn window(&self, offset: usize, len: usize) -> &'a [u8] {
        let start = offset.min(self.data.len());
        let end = offset.saturating_add(len).min(self.data.len());
        &self.data[start..end]
    }

    fn probe(
        &self,
        offset: usize,
        len: usize,
        min_alnum: usize,
        classify: fn(&[u8], usize) -> bool,
    ) -> bool {
        let window = self.window(offset, len);
        let textual = classify(window, min_alnum);
        debug!(
            "Probe at {:#x} [{}] min_alnum={} -> {}",
            offset,
            hex::encode(window),
            min_alnum,
            if textual { "textual" } else { "binary" }
        );
        textual
    }

    fn region(&self, segment: Segment, offset: usize, len: usize) -> Result<&'a [u8]> {
        offset
            .checked_add(len)
            .and_then(|end| self.data.get(offset..end))
            .ok_or_else(|| ImageError::Truncated {
                segment,
                offset,
                needed: len,
                available: self.data.len().saturating_sub(offset),
            })
    }
}

/// Split `data` into segments, storing each one in `sink`
///
/// Returns the detected layout. Bytes after the ramdisk are sector padding
/// and are discarded.
///
/// The `hdr` artifact of an image without a signature is not byte-identical
/// to the image's header: its image type is decremented and its checksum
/// refreshed, undoing the increment [`assemble`](crate::assemble) applies to
/// unsigned images.
///
/// # Errors
///
/// - `SizeOutOfBounds` when the kernel or ramdisk size field fails its
///   sanity check (earlier segments have already been stored)
/// - `Truncated` when the input ends inside a region
/// - any error reported by the sink
pub fn split<S: ArtifactSink + ?Sized>(data: &[u8], sink: &mut S) -> Result<ImageLayout> {
    let image = ImageBytes { data };
    let mut layout = ImageLayout::default();

    // A header starts with packed binary fields, the info block with text
    let has_header = !image.probe(
        0,
        REGION_PROBE_LEN,
        REGION_PROBE_MIN_ALNUM,
        opens_text_block,
    );
    if has_header {
        layout.header_size = HEADER_SIZE;
    }

    layout.signature_size = detect_signature(&image, layout.header_size);

    if has_header {
        let mut header = image.region(Segment::Header, 0, HEADER_SIZE)?.to_vec();
        if layout.signature_size == 0 {
            normalize_unsigned_header(&mut header)?;
        }
        sink.put(Segment::Header, &header)?;
    }
    info!("header size   {}", layout.header_size);

    if layout.signature_size > 0 {
        let signature = image.region(
            Segment::Signature,
            layout.header_size,
            layout.signature_size,
        )?;
        sink.put(Segment::Signature, signature)?;
    }
    info!("sig size      {}", layout.signature_size);

    let info_block = image.region(Segment::Cmdline, layout.info_offset(), IMAGE_INFO_LEN)?;
    let image_info = ImageInfo::parse(info_block)?;
    debug!(
        "cmdline: {}",
        String::from_utf8_lossy(image_info.cmdline_text())
    );
    sink.put(Segment::Cmdline, image_info.cmdline_text())?;
    sink.put(Segment::Parameter, &image_info.parameter)?;

    let bootstub_offset = layout.bootstub_offset();
    layout.bootstub_size = if image.probe(
        bootstub_offset + BOOTSTUB_UNIT,
        BOOTSTUB_PROBE_LEN,
        BOOTSTUB_PROBE_MIN_ALNUM,
        looks_textual,
    ) {
        2 * BOOTSTUB_UNIT
    } else {
        BOOTSTUB_UNIT
    };
    let bootstub = image.region(Segment::Bootstub, bootstub_offset, layout.bootstub_size)?;
    sink.put(Segment::Bootstub, bootstub)?;
    info!("bootstub size {}", layout.bootstub_size);

    check_size_bounds(Segment::Kernel, image_info.kernel_size, &KERNEL_SIZE_RANGE)?;
    layout.kernel_size = image_info.kernel_size as usize;
    let kernel = image.region(Segment::Kernel, layout.kernel_offset(), layout.kernel_size)?;
    sink.put(Segment::Kernel, kernel)?;
    info!("kernel size   {}", layout.kernel_size);

    check_size_bounds(Segment::Ramdisk, image_info.ramdisk_size, &RAMDISK_SIZE_RANGE)?;
    layout.ramdisk_size = image_info.ramdisk_size as usize;
    let ramdisk = image.region(
        Segment::Ramdisk,
        layout.ramdisk_offset(),
        layout.ramdisk_size,
    )?;
    sink.put(Segment::Ramdisk, ramdisk)?;
    info!("ramdisk size  {}", layout.ramdisk_size);

    let trailing = data.len().saturating_sub(layout.image_size());
    if trailing > 0 {
        debug!("Discarding {} trailing bytes", trailing);
    }

    Ok(layout)
}

/// Probe forward from the end of the header until text is found
///
/// The probe offsets are cumulative: 0, 480, 728, 1024 bytes past the header.
/// When no probe matches the signature is taken to be the full 1024 bytes.
fn detect_signature(image: &ImageBytes<'_>, header_size: usize) -> usize {
    let mut offset = header_size;
    for delta in SIGNATURE_PROBE_DELTAS {
        offset += delta;
        if image.probe(
            offset,
            REGION_PROBE_LEN,
            REGION_PROBE_MIN_ALNUM,
            opens_text_block,
        ) {
            break;
        }
    }
    offset - header_size
}

/// Store an unsigned image's header with the image type it would carry
/// when signed, so assembling it again restores the original value
fn normalize_unsigned_header(header: &mut [u8]) -> Result<()> {
    let mut view = BootHeader::new(header)?;
    view.mark_signed();
    view.update_checksum();
    Ok(())
}
