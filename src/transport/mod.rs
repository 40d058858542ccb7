//! Byte transports the sessions run over
//!
//! Sessions only need `write`, `read` with a bounded timeout, and an
//! independent handle for background writers. [`SerialTransport`] drives a
//! real port, [`VirtualLink`] is an in-memory loopback for hardware-free runs.

pub mod error;
pub mod serial;
pub mod types;
pub mod virtual_link;

use std::io;

pub use error::{TransportError, TransportResult};
pub use serial::{available_ports, SerialTransport};
pub use types::{PortConfig, StopBitsSetting};
pub use virtual_link::{LinkImpairments, VirtualLink};

pub trait Transport: Send {
    /// Write some of `bytes`, returning how many were accepted
    fn write(&mut self, bytes: &[u8]) -> TransportResult<usize>;

    /// Read up to `max_bytes`. An empty result means the read timed out.
    fn read(&mut self, max_bytes: usize) -> TransportResult<Vec<u8>>;

    /// Independent handle onto the same link, for a second thread
    fn try_clone(&self) -> TransportResult<Box<dyn Transport>>;

    /// Human-readable link name for logs
    fn name(&self) -> String;

    fn write_all(&mut self, mut bytes: &[u8]) -> TransportResult<()> {
        while !bytes.is_empty() {
            let written = self.write(bytes)?;
            if written == 0 {
                return Err(io::Error::from(io::ErrorKind::WriteZero).into());
            }
            bytes = &bytes[written..];
        }
        Ok(())
    }
}

impl Transport for Box<dyn Transport> {
    fn write(&mut self, bytes: &[u8]) -> TransportResult<usize> {
        (**self).write(bytes)
    }

    fn read(&mut self, max_bytes: usize) -> TransportResult<Vec<u8>> {
        (**self).read(max_bytes)
    }

    fn try_clone(&self) -> TransportResult<Box<dyn Transport>> {
        (**self).try_clone()
    }

    fn name(&self) -> String {
        (**self).name()
    }

    fn write_all(&mut self, bytes: &[u8]) -> TransportResult<()> {
        (**self).write_all(bytes)
    }
}
