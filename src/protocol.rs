// MIT License - Copyright (c) 2026 dsc2mqtt contributors
// DSC panel bridge

use chrono::NaiveDateTime;

use crate::checksum;
use crate::constants::{command, response, CODE_LEN, TIME_UPDATE_FORMAT, ZONE_ID_END};
use crate::error::FrameError;
use crate::event::{PanelEvent, ZoneState};
use crate::framing::lossy;

/// Commands that can be sent to the panel.
///
/// Every command goes out as `<code><payload><checksum>\r\n` and is
/// answered by `500` (accepted) or `501` (bad checksum) before the next
/// command may be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `000`: poll. Used at connect time to prove the panel is listening.
    NoOp,
    /// `001`: status request. The panel answers with a burst of zone and
    /// partition messages after the acknowledgement.
    FullStatus,
    /// `010HHMMmmDDYY`: set the panel date and time.
    TimeUpdate(NaiveDateTime),
    /// Any other code with a free-form payload.
    Raw { code: String, payload: String },
}

impl Command {
    pub fn code(&self) -> &str {
        match self {
            Command::NoOp => command::NOOP,
            Command::FullStatus => command::FULL_STATUS,
            Command::TimeUpdate(_) => command::TIME_UPDATE,
            Command::Raw { code, .. } => code,
        }
    }

    pub fn payload(&self) -> String {
        match self {
            Command::NoOp | Command::FullStatus => String::new(),
            Command::TimeUpdate(now) => time_payload(now),
            Command::Raw { payload, .. } => payload.clone(),
        }
    }

    /// The command string as the panel checksums it (code + payload).
    pub fn to_wire_string(&self) -> String {
        format!("{}{}", self.code(), self.payload())
    }
}

/// Fixed-width clock payload for the time update command.
pub fn time_payload(now: &NaiveDateTime) -> String {
    now.format(TIME_UPDATE_FORMAT).to_string()
}

/// Build the full frame for a code and payload, terminator included.
pub fn encode_frame(code: &str, payload: &str) -> String {
    let body = format!("{code}{payload}");
    let sum = checksum::compute(body.as_bytes());
    format!("{body}{sum}\r\n")
}

/// Command codes are exactly three ASCII digits.
pub fn is_valid_code(code: &str) -> bool {
    code.len() == CODE_LEN && code.bytes().all(|b| b.is_ascii_digit())
}

/// Panel verdict on the command currently in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ack {
    Accepted,
    Rejected(String),
}

/// Result of interpreting one validated frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified {
    /// Goes to the sender waiting on the acknowledgement slot.
    Ack(Ack),
    /// Goes to the outbound event queue.
    Event(PanelEvent),
}

/// Interpret command bytes whose checksum has already been stripped.
///
/// The code is always the first [`CODE_LEN`] bytes, which
/// [`validate_frame`](crate::framing::validate_frame) guarantees are present.
/// Payload bytes are decoded to text only after the code is known.
pub fn classify(command: &[u8]) -> Classified {
    let (code, payload) = command.split_at(CODE_LEN.min(command.len()));
    let code = lossy(code);

    match code.as_str() {
        response::ACK => Classified::Ack(Ack::Accepted),
        response::BAD_CHECKSUM => Classified::Ack(Ack::Rejected("bad checksum".to_string())),
        response::ZONE_OPEN => Classified::Event(zone_event(command, ZoneState::Open)),
        response::ZONE_CLOSED => Classified::Event(zone_event(command, ZoneState::Closed)),
        response::SOFTWARE_VERSION => Classified::Event(PanelEvent::Version {
            version: lossy(payload),
        }),
        _ => Classified::Event(PanelEvent::Unknown { code }),
    }
}

fn zone_event(command: &[u8], state: ZoneState) -> PanelEvent {
    match command.get(CODE_LEN..ZONE_ID_END) {
        Some(raw_id) => PanelEvent::Zone {
            state,
            id: normalize_zone_id(&lossy(raw_id)),
        },
        None => PanelEvent::Error(FrameError::InvalidZone(lossy(command))),
    }
}

/// Strip leading zeros. An all-zero id becomes the empty string.
pub fn normalize_zone_id(raw: &str) -> String {
    raw.trim_start_matches('0').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn zone(state: ZoneState, id: &str) -> Classified {
        Classified::Event(PanelEvent::Zone {
            state,
            id: id.to_string(),
        })
    }

    #[test]
    fn test_command_wire_strings() {
        assert_eq!(Command::NoOp.to_wire_string(), "000");
        assert_eq!(Command::FullStatus.to_wire_string(), "001");
        assert_eq!(
            Command::Raw {
                code: "020".into(),
                payload: "1".into()
            }
            .to_wire_string(),
            "0201"
        );
    }

    #[test]
    fn test_time_update_payload() {
        let now = NaiveDate::from_ymd_opt(2026, 3, 7)
            .unwrap()
            .and_hms_opt(9, 5, 59)
            .unwrap();
        let cmd = Command::TimeUpdate(now);
        assert_eq!(cmd.code(), "010");
        assert_eq!(cmd.payload(), "0905030726");
        assert_eq!(cmd.payload().len(), 10);
    }

    #[test]
    fn test_encode_frame() {
        assert_eq!(encode_frame("000", ""), "00090\r\n");
        assert_eq!(encode_frame("001", ""), "00191\r\n");
        assert_eq!(encode_frame("609", "008"), "60900837\r\n");
    }

    #[test]
    fn test_is_valid_code() {
        assert!(is_valid_code("000"));
        assert!(is_valid_code("849"));
        assert!(!is_valid_code("00"));
        assert!(!is_valid_code("0000"));
        assert!(!is_valid_code("0a0"));
        assert!(!is_valid_code(""));
    }

    #[test]
    fn test_classify_acks() {
        assert_eq!(classify(b"500"), Classified::Ack(Ack::Accepted));
        // trailing echo of the acknowledged command is ignored
        assert_eq!(classify(b"500000"), Classified::Ack(Ack::Accepted));
        assert_eq!(
            classify(b"501"),
            Classified::Ack(Ack::Rejected("bad checksum".into()))
        );
    }

    #[test]
    fn test_classify_zones() {
        assert_eq!(classify(b"609008"), zone(ZoneState::Open, "8"));
        assert_eq!(classify(b"610128"), zone(ZoneState::Closed, "128"));
        assert_eq!(classify(b"609010"), zone(ZoneState::Open, "10"));
        // extra payload past the id is ignored
        assert_eq!(classify(b"6090051"), zone(ZoneState::Open, "5"));
    }

    #[test]
    fn test_classify_all_zero_zone_is_empty() {
        assert_eq!(classify(b"610000"), zone(ZoneState::Closed, ""));
    }

    #[test]
    fn test_classify_short_zone_is_error() {
        assert_eq!(
            classify(b"60900"),
            Classified::Event(PanelEvent::Error(FrameError::InvalidZone("60900".into())))
        );
        assert_eq!(
            classify(b"610"),
            Classified::Event(PanelEvent::Error(FrameError::InvalidZone("610".into())))
        );
    }

    #[test]
    fn test_classify_version() {
        assert_eq!(
            classify(b"9080100"),
            Classified::Event(PanelEvent::Version {
                version: "0100".into()
            })
        );
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(
            classify(b"849"),
            Classified::Event(PanelEvent::Unknown { code: "849".into() })
        );
        assert_eq!(
            classify(b"6501"),
            Classified::Event(PanelEvent::Unknown { code: "650".into() })
        );
    }

    #[test]
    fn test_classify_code_is_first_three_bytes() {
        // 0x80 is not UTF-8; the code must still come from bytes 0..3
        assert_eq!(
            classify(b"849\x80"),
            Classified::Event(PanelEvent::Unknown { code: "849".into() })
        );
        assert_eq!(
            classify("60\u{e9}1".as_bytes()),
            Classified::Event(PanelEvent::Unknown {
                code: "60\u{fffd}".into()
            })
        );
        assert_eq!(
            classify(b"908\xff1"),
            Classified::Event(PanelEvent::Version {
                version: "\u{fffd}1".into()
            })
        );
    }

    #[test]
    fn test_normalize_zone_id() {
        assert_eq!(normalize_zone_id("008"), "8");
        assert_eq!(normalize_zone_id("100"), "100");
        assert_eq!(normalize_zone_id("000"), "");
    }
}
