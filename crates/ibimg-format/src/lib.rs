//! Layout codec for Intel Android boot images
//!
#![allow(clippy::cast_possible_truncation)] // Size fields are 32-bit by format
#![allow(clippy::doc_markdown)] // Format terms don't need backticks
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::return_self_not_must_use)] // Builder patterns
//! Intel boot images are a flat concatenation of regions with almost no
//! self-description: an optional device header, an optional signature, a
//! 4096-byte info block (command line, payload sizes, parameter), a bootstub,
//! the kernel, and the ramdisk, padded to a 512-byte sector boundary.
//!
//! This crate provides both directions of the codec:
//!
//! - **Split**: find the region boundaries (partly by content sniffing, see
//!   [`classifier`]) and emit each region as a named artifact
//! - **Assemble**: lay the artifacts back out, recomputing the size fields,
//!   signed/unsigned marking, sector count and header checksum
//!
//! # Usage
//!
//! ```rust,no_run
//! use ibimg_format::{ArtifactDir, assemble, split};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let image = std::fs::read("boot.img")?;
//! let mut dir = ArtifactDir::open("unpacked")?;
//!
//! // Split into hdr, sig, cmdline.txt, parameter, bootstub, kernel, ramdisk.cpio.gz
//! let layout = split(&image, &mut dir)?;
//! println!("{layout}");
//!
//! // Reassemble from the same directory
//! let rebuilt = assemble(&dir)?;
//! assert_eq!(rebuilt.len() % 512, 0);
//! # Ok(())
//! # }
//! ```
//!
//! # Design Principles
//!
//! - **Explicit positions**: the classifier is a pure function over a byte
//!   slice; the splitter tracks offsets itself instead of seeking a stream
//! - **Fail fast**: the first bad size field or missing artifact aborts
//! - **Round-trip**: assembling the artifacts of a split image reproduces it,
//!   trailing padding included

#![warn(missing_docs)]

pub mod artifact;
pub mod assembler;
pub mod classifier;
pub mod error;
pub mod header;
pub mod info;
pub mod layout;
pub mod segment;
pub mod splitter;

// Re-export main types
pub use artifact::{ArtifactDir, ArtifactSink, ArtifactSource, SegmentSet};
pub use assembler::{AssembledImage, assemble, assemble_image};
pub use classifier::{looks_textual, opens_text_block};
pub use error::{ImageError, Result};
pub use header::BootHeader;
pub use info::ImageInfo;
pub use layout::ImageLayout;
pub use segment::Segment;
pub use splitter::split;
