//! Named regions of a boot image and the artifact files they map to

use std::fmt;

/// A region of the boot image that is persisted as its own artifact
///
/// Variants are declared in stream order, so the derived `Ord` sorts
/// segments the way they appear in the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Segment {
    /// Optional 512-byte device header
    Header,
    /// Optional signature block following the header
    Signature,
    /// Kernel command line, NUL-padded to 1024 bytes in the image
    Cmdline,
    /// 8 opaque bytes following the kernel and ramdisk size fields
    Parameter,
    /// 4096 or 8192 byte stub preceding the kernel
    Bootstub,
    /// Kernel payload
    Kernel,
    /// Ramdisk payload
    Ramdisk,
}

impl Segment {
    /// Every segment, in stream order
    pub const ALL: [Self; 7] = [
        Self::Header,
        Self::Signature,
        Self::Cmdline,
        Self::Parameter,
        Self::Bootstub,
        Self::Kernel,
        Self::Ramdisk,
    ];

    /// Segments that must be present to assemble an image
    pub const REQUIRED: [Self; 5] = [
        Self::Cmdline,
        Self::Parameter,
        Self::Bootstub,
        Self::Kernel,
        Self::Ramdisk,
    ];

    /// Artifact file name inside the working directory
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Header => "hdr",
            Self::Signature => "sig",
            Self::Cmdline => "cmdline.txt",
            Self::Parameter => "parameter",
            Self::Bootstub => "bootstub",
            Self::Kernel => "kernel",
            Self::Ramdisk => "ramdisk.cpio.gz",
        }
    }

    /// Whether the segment may be absent
    pub const fn is_optional(self) -> bool {
        matches!(self, Self::Header | Self::Signature)
    }

    /// Human-readable name used in logs and errors
    pub const fn name(self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Signature => "signature",
            Self::Cmdline => "cmdline",
            Self::Parameter => "parameter",
            Self::Bootstub => "bootstub",
            Self::Kernel => "kernel",
            Self::Ramdisk => "ramdisk",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
