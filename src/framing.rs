// MIT License - Copyright (c) 2026 dsc2mqtt contributors
// DSC panel bridge

//! Line assembly and checksum validation for frames read off the panel.
//!
//! Frames are `<code><payload><checksum>` terminated by CR/LF. Carriage
//! returns are dropped wherever they appear, a line feed ends the frame,
//! and empty frames are skipped. Frames stay raw bytes until they have
//! been length-checked and checksummed.

use crate::checksum;
use crate::constants::{CHECKSUM_LEN, CR, LF, MIN_FRAME_LEN};
use crate::error::FrameError;

/// Reassembles newline-delimited frames from arbitrary read chunks.
#[derive(Debug, Default)]
pub struct LineFramer {
    leftover: Vec<u8>,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes and return every frame it completes.
    ///
    /// Bytes after the last line feed are kept until a later chunk
    /// terminates them.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Vec<u8>> {
        let mut frames = Vec::new();

        for &b in bytes {
            match b {
                CR => continue,
                LF => {
                    if self.leftover.is_empty() {
                        continue;
                    }
                    frames.push(std::mem::take(&mut self.leftover));
                }
                _ => self.leftover.push(b),
            }
        }

        frames
    }

    /// Number of bytes waiting for a terminator.
    pub fn pending(&self) -> usize {
        self.leftover.len()
    }
}

/// Verify a frame's trailing checksum and return the command bytes without it.
pub fn validate_frame(frame: &[u8]) -> Result<&[u8], FrameError> {
    if frame.len() < MIN_FRAME_LEN {
        return Err(FrameError::Malformed(lossy(frame)));
    }

    let (command, supplied) = frame.split_at(frame.len() - CHECKSUM_LEN);
    if !checksum::verify(command, supplied) {
        return Err(FrameError::BadChecksum(lossy(frame)));
    }
    Ok(command)
}

/// Printable rendering of raw frame bytes for error reports.
pub(crate) fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_simple() {
        let mut framer = LineFramer::new();
        let frames = framer.push(b"50095\r\n60900837\r\n");
        assert_eq!(frames, vec![b"50095".to_vec(), b"60900837".to_vec()]);
        assert_eq!(framer.pending(), 0);
    }

    #[test]
    fn test_lines_split_across_reads() {
        let mut framer = LineFramer::new();
        assert!(framer.push(b"609").is_empty());
        assert!(framer.push(b"008").is_empty());
        assert_eq!(framer.pending(), 6);
        assert_eq!(framer.push(b"37\r\n50"), vec![b"60900837".to_vec()]);
        assert_eq!(framer.pending(), 2);
    }

    #[test]
    fn test_no_terminator_never_emits() {
        let mut framer = LineFramer::new();
        for _ in 0..100 {
            assert!(framer.push(b"6090\r").is_empty());
        }
        assert_eq!(framer.pending(), 400);
    }

    #[test]
    fn test_carriage_returns_dropped_anywhere() {
        let mut framer = LineFramer::new();
        let frames = framer.push(b"5\r0\r0\r9\r5\n");
        assert_eq!(frames, vec![b"50095".to_vec()]);
    }

    #[test]
    fn test_empty_lines_ignored() {
        let mut framer = LineFramer::new();
        assert!(framer.push(b"\n").is_empty());
        assert!(framer.push(b"\r\n").is_empty());
        assert!(framer.push(b"\r\r\n\n\r\n").is_empty());
        assert_eq!(framer.push(b"\n50095\n\n"), vec![b"50095".to_vec()]);
    }

    #[test]
    fn test_validate_strips_checksum() {
        assert_eq!(validate_frame(b"60900837"), Ok(&b"609008"[..]));
        assert_eq!(validate_frame(b"50095"), Ok(&b"500"[..]));
    }

    #[test]
    fn test_validate_short_frame_is_malformed() {
        assert_eq!(
            validate_frame(b"5009"),
            Err(FrameError::Malformed("5009".to_string()))
        );
        assert_eq!(validate_frame(b"x"), Err(FrameError::Malformed("x".to_string())));
    }

    #[test]
    fn test_validate_bad_checksum() {
        assert_eq!(
            validate_frame(b"60900838"),
            Err(FrameError::BadChecksum("60900838".to_string()))
        );
        // lowercase hex is not accepted
        assert_eq!(
            validate_frame(b"849a5"),
            Err(FrameError::BadChecksum("849a5".to_string()))
        );
        assert_eq!(validate_frame(b"849A5"), Ok(&b"849"[..]));
    }

    #[test]
    fn test_validate_checksums_raw_bytes() {
        // 0x38 + 0x34 + 0x39 + 0x80 = 0x125
        let mut framer = LineFramer::new();
        let frames = framer.push(b"849\x8025\r\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(validate_frame(&frames[0]), Ok(&b"849\x80"[..]));
    }

    #[test]
    fn test_validate_short_non_utf8_is_malformed() {
        let mut framer = LineFramer::new();
        let frames = framer.push(b"\xff\xff\n");
        assert_eq!(frames, vec![b"\xff\xff".to_vec()]);
        assert!(matches!(
            validate_frame(&frames[0]),
            Err(FrameError::Malformed(_))
        ));
    }

    #[test]
    fn test_validate_non_hex_tail() {
        assert!(matches!(
            validate_frame("6090\u{e9}".as_bytes()),
            Err(FrameError::BadChecksum(_))
        ));
    }
}
