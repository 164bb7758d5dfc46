// MIT License - Copyright (c) 2026 dsc2mqtt contributors
// DSC panel bridge

use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, error, info};

use crate::config::SessionConfig;
use crate::error::{DscError, Result};

/// Open the panel's serial device as 8N1 with no flow control.
pub fn open_serial(config: &SessionConfig) -> Result<SerialStream> {
    debug!("Opening serial port: {} @ {} baud", config.port, config.baud_rate);

    let port = tokio_serial::new(&config.port, config.baud_rate)
        .data_bits(tokio_serial::DataBits::Eight)
        .parity(tokio_serial::Parity::None)
        .stop_bits(tokio_serial::StopBits::One)
        .flow_control(tokio_serial::FlowControl::None)
        .open_native_async()
        .map_err(|e| {
            error!("Failed to open serial port {}: {}", config.port, e);
            DscError::Serial {
                port: config.port.clone(),
                source: e,
            }
        })?;

    info!("Opened serial port {}", config.port);
    Ok(port)
}
