// MIT License - Copyright (c) 2026 dsc2mqtt contributors
// DSC panel bridge
//
//! # dsc-bridge
//!
//! Talks to a DSC security panel over its serial interface (IT-100 /
//! PC5401 ASCII protocol): `<3-digit code><payload><2-hex checksum>\r\n`.
//!
//! A background task reads frames off the stream, validates their
//! checksums and sorts them into command acknowledgements and unsolicited
//! events. Commands are sent one at a time; each waits for the panel's
//! `500` (accepted) or `501` (rejected) for up to five seconds.
//!
//! ## Quick Start
//!
//! ```no_run
//! use dsc_bridge::{PanelEvent, PanelSession, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = SessionConfig::builder()
//!         .port("/dev/ttyUSB0")
//!         .baud_rate(9600)
//!         .build();
//!
//!     let panel = PanelSession::open(config).await?;
//!     panel.request_full_status().await?;
//!
//!     while let Some(event) = panel.next_event(true).await {
//!         match event {
//!             PanelEvent::Zone { state, id } => println!("zone {id} is {state}"),
//!             PanelEvent::Error(e) if e.is_fatal() => break,
//!             other => println!("{other:?}"),
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod checksum;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod framing;
pub mod protocol;
pub mod session;
pub mod transport;

// Re-exports for convenience
pub use config::{SessionConfig, SessionConfigBuilder};
pub use error::{DscError, FrameError, Result};
pub use event::{EventKind, EventQueue, PanelEvent, ZoneState};
pub use protocol::{Ack, Command};
pub use session::PanelSession;
