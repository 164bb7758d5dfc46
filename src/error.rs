// MIT License - Copyright (c) 2026 dsc2mqtt contributors
// DSC panel bridge

/// Per-frame problems reported by the reader task.
///
/// These travel through the event queue inside [`PanelEvent::Error`](crate::event::PanelEvent::Error)
/// so a consumer can log them without mistaking them for zone activity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// Non-empty frame too short to carry a code and a checksum.
    #[error("malformed response: {0:?}")]
    Malformed(String),

    #[error("bad checksum: {0:?}")]
    BadChecksum(String),

    /// Zone open/close message without a 3-digit zone id.
    #[error("invalid zone: {0:?}")]
    InvalidZone(String),

    /// The stream failed or closed. Always the last event the reader emits.
    #[error("transport error: {0}")]
    Transport(String),
}

impl FrameError {
    /// Whether the reader task stopped after emitting this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FrameError::Transport(_))
    }
}

/// All errors returned by the dsc-bridge library.
#[derive(Debug, thiserror::Error)]
pub enum DscError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not open serial port {port}: {source}")]
    Serial {
        port: String,
        #[source]
        source: tokio_serial::Error,
    },

    #[error("could not send check command: {0}")]
    Handshake(Box<DscError>),

    #[error("timeout on command {command}")]
    CommandTimeout { command: String },

    #[error("command {command} rejected by panel: {reason}")]
    CommandRejected { command: String, reason: String },

    #[error("invalid command code {code:?} (expected 3 digits)")]
    InvalidCommandCode { code: String },

    #[error("panel reader stopped")]
    Disconnected,
}

impl DscError {
    /// Whether reopening the session could clear this error.
    pub fn is_retryable(&self) -> bool {
        match self {
            DscError::Io(_)
            | DscError::Serial { .. }
            | DscError::CommandTimeout { .. }
            | DscError::Disconnected => true,
            DscError::Handshake(inner) => inner.is_retryable(),
            DscError::CommandRejected { .. } | DscError::InvalidCommandCode { .. } => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, DscError>;
