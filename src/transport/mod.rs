// MIT License - Copyright (c) 2026 dsc2mqtt contributors
// DSC panel bridge

pub mod serial;

use tokio::io::{AsyncRead, AsyncWrite};

pub use serial::open_serial;

/// Any full-duplex byte stream the panel can be reached over.
///
/// Implemented for every `AsyncRead + AsyncWrite` type, so a serial port,
/// a TCP socket to a serial server, or an in-memory duplex all work.
pub trait PanelStream: AsyncRead + AsyncWrite + Send + 'static {}

impl<T> PanelStream for T where T: AsyncRead + AsyncWrite + Send + 'static {}
