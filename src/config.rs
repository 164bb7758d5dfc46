// MIT License - Copyright (c) 2026 dsc2mqtt contributors
// DSC panel bridge

use std::time::Duration;

use tracing::Span;

use crate::constants::{DEFAULT_ACK_TIMEOUT, DEFAULT_BAUD, DEFAULT_EVENT_CAPACITY, DEFAULT_PORT};

/// Configuration for opening a panel session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Serial device path (e.g. `/dev/ttyUSB0`)
    pub port: String,
    /// Serial baud rate (IT-100 ships at 9600)
    pub baud_rate: u32,
    /// How long `send_command` waits for an acknowledgement
    pub ack_timeout: Duration,
    /// Depth of the outbound event queue
    pub event_capacity: usize,
    /// Span the session logs under. Defaults to a `panel` span naming the port.
    pub span: Option<Span>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baud_rate: DEFAULT_BAUD,
            ack_timeout: DEFAULT_ACK_TIMEOUT,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            span: None,
        }
    }
}

impl SessionConfig {
    /// Create a new config builder starting from defaults.
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }

    /// The span to log under, creating the default one if none was given.
    pub(crate) fn log_span(&self) -> Span {
        match &self.span {
            Some(span) => span.clone(),
            None => tracing::info_span!("panel", port = %self.port),
        }
    }
}

/// Builder for SessionConfig.
#[derive(Debug, Clone, Default)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    pub fn port(mut self, port: impl Into<String>) -> Self {
        self.config.port = port.into();
        self
    }

    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.config.baud_rate = baud_rate;
        self
    }

    pub fn ack_timeout(mut self, timeout: Duration) -> Self {
        self.config.ack_timeout = timeout;
        self
    }

    pub fn ack_timeout_ms(self, ms: u64) -> Self {
        self.ack_timeout(Duration::from_millis(ms))
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.config.event_capacity = capacity;
        self
    }

    pub fn span(mut self, span: Span) -> Self {
        self.config.span = Some(span);
        self
    }

    pub fn build(self) -> SessionConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.port, "/dev/alarmsystem");
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.ack_timeout, Duration::from_secs(5));
        assert_eq!(config.event_capacity, 256);
        assert!(config.span.is_none());
    }

    #[test]
    fn test_config_builder() {
        let config = SessionConfig::builder()
            .port("/dev/ttyUSB1")
            .baud_rate(115_200)
            .ack_timeout_ms(250)
            .event_capacity(8)
            .build();

        assert_eq!(config.port, "/dev/ttyUSB1");
        assert_eq!(config.baud_rate, 115_200);
        assert_eq!(config.ack_timeout, Duration::from_millis(250));
        assert_eq!(config.event_capacity, 8);
    }
}
