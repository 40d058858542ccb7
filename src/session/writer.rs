use crate::frame::Frame;
use crate::session::error::{SessionError, SessionResult};
use crate::session::stop::StopSignal;
use crate::transport::{Transport, TransportResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::debug;

/// Repeatedly writes one payload from its own thread.
///
/// Runs until the session signal flips, [`BackgroundWriter::join`] is
/// called, or `limit` payloads have been written. Dropping the writer stops
/// and joins the thread, so the transport handle it owns is always released
/// before the caller's.
pub struct BackgroundWriter {
    halt: StopSignal,
    written: Arc<AtomicU64>,
    handle: Option<JoinHandle<TransportResult<u64>>>,
}

impl BackgroundWriter {
    pub fn spawn(
        mut transport: Box<dyn Transport>,
        payload: Frame,
        limit: Option<u64>,
        interval: Duration,
        session: StopSignal,
    ) -> SessionResult<Self> {
        let halt = StopSignal::new();
        let written = Arc::new(AtomicU64::new(0));

        let thread_halt = halt.clone();
        let thread_written = written.clone();
        let handle = thread::Builder::new()
            .name("link-writer".to_string())
            .spawn(move || {
                let mut sent = 0u64;
                while session.is_running() && thread_halt.is_running() {
                    if limit.is_some_and(|limit| sent >= limit) {
                        break;
                    }
                    transport.write_all(payload.as_bytes())?;
                    thread_written.fetch_add(payload.len() as u64, Ordering::Relaxed);
                    sent += 1;
                    if !interval.is_zero() {
                        thread::sleep(interval);
                    }
                }
                debug!(payloads = sent, link = %transport.name(), "Background writer finished");
                Ok(thread_written.load(Ordering::Relaxed))
            })?;

        Ok(Self {
            halt,
            written,
            handle: Some(handle),
        })
    }

    /// Bytes written so far
    pub fn bytes_written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    /// Whether the thread has exited, on its own or after an error
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |handle| handle.is_finished())
    }

    /// Stop the writer, wait for it, and return the total bytes written
    pub fn join(mut self) -> SessionResult<u64> {
        self.halt.stop();
        match self.handle.take() {
            Some(handle) => {
                let written = handle.join().map_err(|_| SessionError::WriterPanicked)??;
                Ok(written)
            }
            None => Ok(self.bytes_written()),
        }
    }
}

impl Drop for BackgroundWriter {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.halt.stop();
            let _ = handle.join();
        }
    }
}
