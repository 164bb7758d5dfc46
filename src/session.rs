// MIT License - Copyright (c) 2026 dsc2mqtt contributors
// DSC panel bridge

//! The panel session: one background reader, serialized command sends.
//!
//! The reader task owns the read half of the stream. Every frame it reads
//! ends up in exactly one place: the acknowledgement slot (`500`/`501`),
//! the event queue (everything else, including per-frame errors), or
//! nowhere when an acknowledgement arrives with no command in flight.
//!
//! Senders hold the write-half mutex from the moment they arm the slot
//! until the acknowledgement arrives or the timeout fires, so at most one
//! command is ever awaiting acknowledgement.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn, Instrument, Span};

use crate::config::SessionConfig;
use crate::constants::READ_BUF_SIZE;
use crate::error::{DscError, FrameError, Result};
use crate::event::{event_channel, EventQueue, EventSender, PanelEvent};
use crate::framing::{validate_frame, LineFramer};
use crate::protocol::{classify, encode_frame, is_valid_code, Ack, Classified, Command};
use crate::transport::{open_serial, PanelStream};

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Single-slot hand-off between the reader task and the sender in flight.
///
/// Holds at most one pending receiver. An acknowledgement that finds the
/// slot empty is dropped. Once the reader has stopped the slot is closed
/// and refuses to arm.
#[derive(Debug, Default)]
struct AckSlot {
    state: Mutex<SlotState>,
}

#[derive(Debug, Default)]
struct SlotState {
    pending: Option<oneshot::Sender<Ack>>,
    closed: bool,
}

impl AckSlot {
    /// Install a fresh receiver, replacing any stale one.
    ///
    /// Returns `None` if the reader has already stopped.
    async fn arm(&self) -> Option<oneshot::Receiver<Ack>> {
        let mut state = self.state.lock().await;
        if state.closed {
            return None;
        }
        let (tx, rx) = oneshot::channel();
        state.pending = Some(tx);
        Some(rx)
    }

    async fn disarm(&self) {
        self.state.lock().await.pending.take();
    }

    /// Fail the waiting sender, if any, and refuse all later arms.
    async fn close(&self) {
        let mut state = self.state.lock().await;
        state.closed = true;
        state.pending.take();
    }

    /// Hand an acknowledgement to the waiting sender. Returns false if nobody was waiting.
    async fn deliver(&self, ack: Ack) -> bool {
        match self.state.lock().await.pending.take() {
            Some(tx) => tx.send(ack).is_ok(),
            None => false,
        }
    }
}

/// An open connection to the panel.
///
/// Created by [`PanelSession::open`] once the panel has answered a poll.
/// Dropping the session stops the reader task.
pub struct PanelSession {
    /// Send mutex. Guards the write half for the whole write + ack wait.
    writer: Mutex<BoxedWriter>,
    ack_slot: Arc<AckSlot>,
    events: EventQueue,
    ack_timeout: Duration,
    span: Span,
    reader_handle: Option<JoinHandle<()>>,
}

impl PanelSession {
    /// Open the configured serial device and verify the panel responds.
    pub async fn open(config: SessionConfig) -> Result<Self> {
        let stream = open_serial(&config)?;
        Self::with_stream(stream, config).await
    }

    /// Start a session over an already-open stream.
    ///
    /// Spawns the reader task, then sends a poll (`000`). Fails with
    /// [`DscError::Handshake`] if the poll is rejected or times out.
    pub async fn with_stream<S: PanelStream>(stream: S, config: SessionConfig) -> Result<Self> {
        let span = config.log_span();
        let (reader, writer) = tokio::io::split(stream);
        let (event_tx, event_rx) = event_channel(config.event_capacity);
        let ack_slot = Arc::new(AckSlot::default());

        let reader_handle = spawn_reader_task(reader, ack_slot.clone(), event_tx, span.clone());

        let session = Self {
            writer: Mutex::new(Box::new(writer)),
            ack_slot,
            events: EventQueue::new(event_rx),
            ack_timeout: config.ack_timeout,
            span,
            reader_handle: Some(reader_handle),
        };

        if let Err(e) = session.send(&Command::NoOp).await {
            error!(parent: &session.span, "Panel did not answer poll: {}", e);
            return Err(DscError::Handshake(Box::new(e)));
        }

        info!(parent: &session.span, "Panel session established");
        Ok(session)
    }

    /// Send a typed command and wait for the panel to acknowledge it.
    pub async fn send(&self, command: &Command) -> Result<()> {
        self.send_command(command.code(), &command.payload()).await
    }

    /// Send `code + payload` and wait for the acknowledgement.
    ///
    /// Blocks while another command is in flight. Returns
    /// [`DscError::CommandRejected`] on `501` and [`DscError::CommandTimeout`]
    /// if nothing arrives within the configured timeout.
    pub async fn send_command(&self, code: &str, payload: &str) -> Result<()> {
        if !is_valid_code(code) {
            return Err(DscError::InvalidCommandCode {
                code: code.to_string(),
            });
        }
        let command = format!("{code}{payload}");

        async move {
            let mut writer = self.writer.lock().await;

            if !self.is_connected() {
                return Err(DscError::Disconnected);
            }

            // Arm before writing so a fast acknowledgement is not missed.
            let Some(rx) = self.ack_slot.arm().await else {
                return Err(DscError::Disconnected);
            };

            debug!("Sending command: {}", command);
            let frame = encode_frame(code, payload);
            if let Err(e) = write_frame(&mut writer, frame.as_bytes()).await {
                error!("Failed to write command {}: {}", command, e);
                self.ack_slot.disarm().await;
                return Err(DscError::Io(e));
            }

            match timeout(self.ack_timeout, rx).await {
                Ok(Ok(Ack::Accepted)) => {
                    debug!("Command {} acknowledged", command);
                    Ok(())
                }
                Ok(Ok(Ack::Rejected(reason))) => {
                    warn!("Command {} rejected: {}", command, reason);
                    Err(DscError::CommandRejected { command, reason })
                }
                Ok(Err(_)) => Err(DscError::Disconnected),
                Err(_) => {
                    self.ack_slot.disarm().await;
                    warn!("Timeout waiting for acknowledgement of {}", command);
                    Err(DscError::CommandTimeout { command })
                }
            }
        }
        .instrument(self.span.clone())
        .await
    }

    /// Ask the panel to report the state of every zone and partition.
    pub async fn request_full_status(&self) -> Result<()> {
        self.send(&Command::FullStatus).await
    }

    /// Set the panel clock.
    pub async fn request_time_update(&self, now: NaiveDateTime) -> Result<()> {
        self.send(&Command::TimeUpdate(now)).await
    }

    /// Next queued event.
    ///
    /// With `block` the call waits until an event arrives, returning `None`
    /// only after the reader has stopped and the queue is drained. Without
    /// it the call returns `None` immediately when nothing is queued.
    pub async fn next_event(&self, block: bool) -> Option<PanelEvent> {
        if block {
            self.events.recv().await
        } else {
            self.events.try_recv()
        }
    }

    /// Handle on the event queue for use in a caller's own `select!` loop.
    pub fn event_stream(&self) -> EventQueue {
        self.events.clone()
    }

    /// Whether the reader task is still running.
    pub fn is_connected(&self) -> bool {
        self.reader_handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Shut down the write half and stop the reader task.
    pub async fn close(mut self) -> Result<()> {
        info!(parent: &self.span, "Closing panel session");
        let result = self.writer.lock().await.shutdown().await;
        if let Some(handle) = self.reader_handle.take() {
            handle.abort();
            let _ = handle.await;
        }
        self.ack_slot.close().await;
        result.map_err(DscError::Io)
    }
}

impl Drop for PanelSession {
    fn drop(&mut self) {
        if let Some(handle) = self.reader_handle.take() {
            handle.abort();
        }
    }
}

async fn write_frame(writer: &mut BoxedWriter, frame: &[u8]) -> std::io::Result<()> {
    writer.write_all(frame).await?;
    writer.flush().await
}

/// Spawn the reader task that turns the byte stream into acks and events.
fn spawn_reader_task<R>(
    mut reader: R,
    ack_slot: Arc<AckSlot>,
    event_tx: EventSender,
    span: Span,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(
        async move {
            let mut framer = LineFramer::new();
            let mut buf = vec![0u8; READ_BUF_SIZE];

            let cause = loop {
                match reader.read(&mut buf).await {
                    Ok(0) => {
                        debug!("Reader: stream closed");
                        break "stream closed".to_string();
                    }
                    Ok(n) => {
                        for frame in framer.push(&buf[..n]) {
                            process_frame(&frame, &ack_slot, &event_tx).await;
                        }
                    }
                    Err(e) => {
                        error!("Reader: read error: {}", e);
                        break e.to_string();
                    }
                }
            };

            ack_slot.close().await;
            emit(&event_tx, PanelEvent::Error(FrameError::Transport(cause))).await;
        }
        .instrument(span),
    )
}

/// Validate, classify and route a single frame.
async fn process_frame(frame: &[u8], ack_slot: &AckSlot, event_tx: &EventSender) {
    let command = match validate_frame(frame) {
        Ok(command) => command,
        Err(e) => {
            warn!("Discarding frame: {}", e);
            emit(event_tx, PanelEvent::Error(e)).await;
            return;
        }
    };

    match classify(command) {
        Classified::Ack(ack) => {
            if !ack_slot.deliver(ack.clone()).await {
                debug!("Dropping {:?} with no command in flight", ack);
            }
        }
        Classified::Event(event) => {
            debug!("Panel event: {:?}", event);
            emit(event_tx, event).await;
        }
    }
}

async fn emit(event_tx: &EventSender, event: PanelEvent) {
    if event_tx.send(event).await.is_err() {
        debug!("Event queue closed, dropping event");
    }
}
