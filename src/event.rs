// MIT License - Copyright (c) 2026 dsc2mqtt contributors
// DSC panel bridge

use std::fmt;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use crate::error::FrameError;

/// Reported state of a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneState {
    Open,
    Closed,
}

impl ZoneState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneState::Open => "open",
            ZoneState::Closed => "closed",
        }
    }
}

impl fmt::Display for ZoneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse category of a [`PanelEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Zone,
    Unknown,
    Version,
    Error,
}

/// Everything the panel says that is not an acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelEvent {
    /// Zone opened or closed.
    ///
    /// `id` has its leading zeros stripped, so zone `000` is reported as `""`.
    Zone { state: ZoneState, id: String },
    /// Software version broadcast (`908`), usually sent after the panel boots.
    Version { version: String },
    /// Any code this bridge does not interpret.
    Unknown { code: String },
    /// A frame could not be used, or the stream failed.
    Error(FrameError),
}

impl PanelEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            PanelEvent::Zone { .. } => EventKind::Zone,
            PanelEvent::Version { .. } => EventKind::Version,
            PanelEvent::Unknown { .. } => EventKind::Unknown,
            PanelEvent::Error(_) => EventKind::Error,
        }
    }

    /// True for the terminal event emitted when the reader stops.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PanelEvent::Error(e) if e.is_fatal())
    }
}

/// Type alias for the queue sender held by the reader task.
pub type EventSender = mpsc::Sender<PanelEvent>;

/// Type alias for the raw queue receiver.
pub type EventReceiver = mpsc::Receiver<PanelEvent>;

/// Create a new event queue with the given capacity.
pub fn event_channel(capacity: usize) -> (EventSender, EventReceiver) {
    mpsc::channel(capacity.max(1))
}

/// Cloneable handle on the outbound event queue.
///
/// Every event is delivered to exactly one consumer; clones share the same
/// queue rather than each getting a copy.
#[derive(Debug, Clone)]
pub struct EventQueue {
    rx: Arc<Mutex<EventReceiver>>,
}

impl EventQueue {
    pub fn new(rx: EventReceiver) -> Self {
        Self {
            rx: Arc::new(Mutex::new(rx)),
        }
    }

    /// Wait for the next event.
    ///
    /// Returns `None` once the reader has stopped and the queue is drained.
    pub async fn recv(&self) -> Option<PanelEvent> {
        self.rx.lock().await.recv().await
    }

    /// Take the next event if one is already queued.
    ///
    /// Also returns `None` while another consumer is parked in [`recv`](Self::recv).
    pub fn try_recv(&self) -> Option<PanelEvent> {
        let mut rx = self.rx.try_lock().ok()?;
        rx.try_recv().ok()
    }
}
