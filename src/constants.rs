// MIT License - Copyright (c) 2026 dsc2mqtt contributors
// DSC panel bridge

use std::time::Duration;

/// Frame terminator bytes.
pub const CR: u8 = b'\r';
pub const LF: u8 = b'\n';

/// Every frame starts with a 3-digit command code.
pub const CODE_LEN: usize = 3;
/// Two uppercase hex digits trail every frame.
pub const CHECKSUM_LEN: usize = 2;
/// Shortest frame that can carry a code and a checksum.
pub const MIN_FRAME_LEN: usize = CODE_LEN + CHECKSUM_LEN;
/// Zone messages carry a 3-digit zone id right after the code.
pub const ZONE_ID_END: usize = CODE_LEN + 3;

/// Outbound command codes.
pub mod command {
    /// Poll / connectivity check.
    pub const NOOP: &str = "000";
    /// Ask the panel to dump the status of every zone and partition.
    pub const FULL_STATUS: &str = "001";
    /// Set the panel clock. Payload is `HHMMmmDDYY`.
    pub const TIME_UPDATE: &str = "010";
}

/// Inbound response codes.
pub mod response {
    /// Command acknowledged.
    pub const ACK: &str = "500";
    /// Command error (the panel rejected our checksum).
    pub const BAD_CHECKSUM: &str = "501";
    /// Zone opened. Payload is a 3-digit zone id.
    pub const ZONE_OPEN: &str = "609";
    /// Zone restored/closed. Payload is a 3-digit zone id.
    pub const ZONE_CLOSED: &str = "610";
    /// Software version broadcast.
    pub const SOFTWARE_VERSION: &str = "908";
}

/// Panel clock payload layout: hour, minute, month, day, 2-digit year.
pub const TIME_UPDATE_FORMAT: &str = "%H%M%m%d%y";

/// How long a sender waits for `500`/`501` before giving up.
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(5);

/// Depth of the outbound event queue before the reader applies back-pressure.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

pub const DEFAULT_PORT: &str = "/dev/alarmsystem";
pub const DEFAULT_BAUD: u32 = 9600;

/// Size of a single read from the stream.
pub const READ_BUF_SIZE: usize = 256;
