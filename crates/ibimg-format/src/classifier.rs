//! Content sniffing for region boundaries that carry no tag
//!
//! Several boundaries in the image (header present or not, signature length,
//! bootstub length) are only recognisable by what the bytes look like. The
//! classifier answers a single question about a short window: does it read
//! like the start of text (a command line, a string table) or like packed
//! binary data?

/// Window length used for the header and signature probes
pub const REGION_PROBE_LEN: usize = 4;

/// Alphanumeric tolerance for the header and signature probes
pub const REGION_PROBE_MIN_ALNUM: usize = 1;

/// Window length used for the bootstub probe
pub const BOOTSTUB_PROBE_LEN: usize = 2;

/// Alphanumeric tolerance for the bootstub probe
pub const BOOTSTUB_PROBE_MIN_ALNUM: usize = 0;

/// Classify a byte window as textual (`true`) or binary (`false`)
///
/// A single leading `0x00` is dropped before counting when the window is
/// longer than one byte, since NUL-terminated strings ending right before the
/// window are a common false positive. The window is textual when more than
/// `min_alnum` of the retained bytes are ASCII alphanumerics and fewer than
/// the full window length, so a window that is alphanumeric throughout (the
/// `MZ` magic of an EFI-stub kernel) reads as binary.
///
/// Windows cut short by the end of the input are classified on the bytes
/// that exist; an empty window is never textual.
pub fn looks_textual(window: &[u8], min_alnum: usize) -> bool {
    let alnum = alnum_count(window);
    alnum > min_alnum && alnum < window.len()
}

/// Classify a window at a possible info block start
///
/// The info block opens with the kernel command line, whose first bytes are
/// usually all alphanumeric (`cons`, `init`). Unlike [`looks_textual`] a
/// fully alphanumeric window counts as text here. Used by the header and
/// signature probes.
pub fn opens_text_block(window: &[u8], min_alnum: usize) -> bool {
    alnum_count(window) > min_alnum
}

fn alnum_count(window: &[u8]) -> usize {
    let retained = match window {
        [0, rest @ ..] if !rest.is_empty() => rest,
        _ => window,
    };

    retained
        .iter()
        .filter(|b| b.is_ascii_alphanumeric())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_command_line_opens_text_block() {
        assert!(opens_text_block(b"cons", REGION_PROBE_MIN_ALNUM));
        assert!(opens_text_block(b"init", REGION_PROBE_MIN_ALNUM));
        assert!(opens_text_block(b"vt.g", REGION_PROBE_MIN_ALNUM));
        assert!(!opens_text_block(&[0x01, 0x10, 0x00, 0x00], REGION_PROBE_MIN_ALNUM));
    }

    #[test]
    fn test_fully_alphanumeric_window_is_binary() {
        assert!(!looks_textual(b"MZ", BOOTSTUB_PROBE_MIN_ALNUM));
        assert!(!looks_textual(b"cons", REGION_PROBE_MIN_ALNUM));
        assert!(!looks_textual(b"ab", BOOTSTUB_PROBE_MIN_ALNUM));
        // three of four alphanumerics is textual
        assert!(looks_textual(b"vt.g", REGION_PROBE_MIN_ALNUM));
    }

    #[test]
    fn test_packed_binary_is_not_textual() {
        assert!(!looks_textual(&[0x01, 0x10, 0x00, 0x00], REGION_PROBE_MIN_ALNUM));
        assert!(!looks_textual(&[0xFF; 4], REGION_PROBE_MIN_ALNUM));
        assert!(!looks_textual(&[0x00; 4], REGION_PROBE_MIN_ALNUM));
        // one alphanumeric byte is within tolerance
        assert!(!looks_textual(&[0x41, 0x00, 0x00, 0x00], REGION_PROBE_MIN_ALNUM));
    }

    #[test]
    fn test_leading_nul_is_skipped() {
        // "\0ab" keeps two alphanumerics after dropping the NUL
        assert!(looks_textual(b"\0ab\xFF", REGION_PROBE_MIN_ALNUM));
        // the skipped NUL still counts toward the window length
        assert!(looks_textual(b"\0abc", REGION_PROBE_MIN_ALNUM));
        // only the first NUL is dropped
        assert!(!looks_textual(b"\0\0a\xFF", REGION_PROBE_MIN_ALNUM));
        // single-byte windows are never shortened
        assert!(!looks_textual(&[0x00], BOOTSTUB_PROBE_MIN_ALNUM));
    }

    #[test]
    fn test_bootstub_probe_tolerance() {
        assert!(looks_textual(b"A\xFF", BOOTSTUB_PROBE_MIN_ALNUM));
        assert!(looks_textual(b"\0Z", BOOTSTUB_PROBE_MIN_ALNUM));
        assert!(!looks_textual(b"MZ", BOOTSTUB_PROBE_MIN_ALNUM));
        assert!(!looks_textual(&[0x00, 0x01], BOOTSTUB_PROBE_MIN_ALNUM));
        assert!(!looks_textual(&[0xEA, 0x05], BOOTSTUB_PROBE_MIN_ALNUM));
    }

    #[test]
    fn test_short_windows() {
        assert!(!looks_textual(&[], BOOTSTUB_PROBE_MIN_ALNUM));
        assert!(!opens_text_block(&[], BOOTSTUB_PROBE_MIN_ALNUM));
        assert!(!looks_textual(b"a", BOOTSTUB_PROBE_MIN_ALNUM));
        assert!(opens_text_block(b"ab", REGION_PROBE_MIN_ALNUM));
        assert!(!opens_text_block(b"a", REGION_PROBE_MIN_ALNUM));
    }

    proptest! {
        #[test]
        fn classifier_is_deterministic(
            window in prop::collection::vec(any::<u8>(), 0..16),
            min_alnum in 0usize..4
        ) {
            let snapshot = window.clone();
            let first = looks_textual(&window, min_alnum);
            let second = looks_textual(&window, min_alnum);
            prop_assert_eq!(first, second);
            prop_assert_eq!(window, snapshot);
        }

        #[test]
        fn raising_tolerance_never_adds_matches(
            window in prop::collection::vec(any::<u8>(), 0..16),
            min_alnum in 0usize..4
        ) {
            if looks_textual(&window, min_alnum + 1) {
                prop_assert!(looks_textual(&window, min_alnum));
            }
            if opens_text_block(&window, min_alnum + 1) {
                prop_assert!(opens_text_block(&window, min_alnum));
            }
        }

        #[test]
        fn textual_windows_also_open_text_blocks(
            window in prop::collection::vec(any::<u8>(), 0..16),
            min_alnum in 0usize..4
        ) {
            if looks_textual(&window, min_alnum) {
                prop_assert!(opens_text_block(&window, min_alnum));
            }
        }

        #[test]
        fn alphanumeric_windows_are_binary(
            window in "[a-zA-Z0-9]{1,8}",
            min_alnum in 0usize..4
        ) {
            prop_assert!(!looks_textual(window.as_bytes(), min_alnum));
        }
    }
}
