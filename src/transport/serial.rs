use crate::transport::error::{TransportError, TransportResult};
use crate::transport::types::PortConfig;
use crate::transport::Transport;
use serialport::{ClearBuffer, SerialPort, SerialPortInfo};
use std::io::{self, Read, Write};
use tracing::{debug, info};

/// A physical serial port
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    name: String,
}

impl SerialTransport {
    /// Open and configure the port, discarding any stale input
    pub fn open(config: &PortConfig) -> TransportResult<Self> {
        let port = serialport::new(&config.port, config.baud_rate)
            .stop_bits(config.stop_bits.into())
            .timeout(config.read_timeout)
            .open()
            .map_err(|source| TransportError::OpenFailed {
                port: config.port.clone(),
                source,
            })?;

        port.clear(ClearBuffer::Input)?;

        info!(
            port = %config.port,
            baud_rate = config.baud_rate,
            stop_bits = ?config.stop_bits,
            "Opened serial port"
        );

        Ok(Self {
            port,
            name: config.port.clone(),
        })
    }
}

impl Transport for SerialTransport {
    fn write(&mut self, bytes: &[u8]) -> TransportResult<usize> {
        Ok(self.port.write(bytes)?)
    }

    fn read(&mut self, max_bytes: usize) -> TransportResult<Vec<u8>> {
        let mut buffer = vec![0u8; max_bytes];
        match self.port.read(&mut buffer) {
            Ok(n) => {
                buffer.truncate(n);
                Ok(buffer)
            }
            Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::Interrupted) => {
                debug!(port = %self.name, "Read timed out");
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn try_clone(&self) -> TransportResult<Box<dyn Transport>> {
        Ok(Box::new(SerialTransport {
            port: self.port.try_clone()?,
            name: self.name.clone(),
        }))
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

/// Serial ports visible on this machine
pub fn available_ports() -> TransportResult<Vec<SerialPortInfo>> {
    Ok(serialport::available_ports()?)
}
