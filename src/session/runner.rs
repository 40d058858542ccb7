use crate::frame::{Frame, FrameGenerator};
use crate::metrics::{
    record_bytes_observed, record_bytes_written, record_empty_read, record_frame_outcome,
    record_mismatches, LinkMetrics,
};
use crate::progress::{
    Counter, CrosstermWidth, ProgressDisplay, ProgressReporter, TerminalWidth, RESERVED_COLUMNS,
    RESERVED_COLUMNS_WITH_COUNTERS,
};
use crate::session::error::{SessionError, SessionResult};
use crate::session::stop::StopSignal;
use crate::session::types::{Protocol, SessionConfig, SessionState, SessionSummary};
use crate::session::writer::BackgroundWriter;
use crate::transport::Transport;
use crate::verify::{LinkStats, LoopbackVerifier, Outcome, StreamVerifier};
use std::io::{self, Write};
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// How often the static-send status line refreshes
const STATUS_REFRESH: Duration = Duration::from_millis(100);

/// Drives one test session over a transport.
///
/// A runner is single use: [`SessionRunner::run`] consumes it, and the
/// transport is closed when the session ends.
pub struct SessionRunner<T: Transport> {
    transport: T,
    config: SessionConfig,
    output: Box<dyn Write + Send>,
    width: Box<dyn TerminalWidth>,
    session_id: Uuid,
}

impl<T: Transport> SessionRunner<T> {
    pub fn new(transport: T, config: SessionConfig) -> Self {
        Self {
            transport,
            config,
            output: Box::new(io::stdout()),
            width: Box::new(CrosstermWidth),
            session_id: Uuid::new_v4(),
        }
    }

    /// Send progress and summary lines somewhere other than stdout
    pub fn with_output(mut self, output: impl Write + Send + 'static) -> Self {
        self.output = Box::new(output);
        self
    }

    pub fn with_terminal_width(mut self, width: impl TerminalWidth + 'static) -> Self {
        self.width = Box::new(width);
        self
    }

    /// Run `protocol` to completion, operator stop, or transport failure.
    ///
    /// On transport failure the progress line is closed and the partial
    /// summary printed before [`SessionError::Aborted`] is returned.
    pub fn run(self, protocol: Protocol, stop: &StopSignal) -> SessionResult<SessionSummary> {
        self.config.validate(protocol)?;

        let reserved = match protocol {
            Protocol::Loopback => RESERVED_COLUMNS_WITH_COUNTERS,
            _ => RESERVED_COLUMNS,
        };
        let generator = match self.config.seed {
            Some(seed) => FrameGenerator::with_seed(seed),
            None => FrameGenerator::new(),
        };

        let mut session = Session {
            display: ProgressDisplay::new(self.output, ProgressReporter::new(self.width, reserved)),
            port: self.transport.name(),
            transport: self.transport,
            config: self.config,
            generator,
            stats: LinkStats::new(),
            state: SessionState::Idle,
            protocol,
            metrics: LinkMetrics::start(protocol.as_str()),
            session_id: self.session_id,
            started_at: chrono::Utc::now().timestamp(),
        };

        session.transition(SessionState::Running)?;
        info!(
            session_id = %session.session_id,
            protocol = %protocol,
            port = %session.port,
            "Session started"
        );

        let result = match protocol {
            Protocol::ContinuousSend => session.continuous_send(stop),
            Protocol::Loopback => session.loopback(stop),
            Protocol::StreamVerify => session.stream_verify(stop),
            Protocol::StaticSend => session.static_send(stop),
        };
        session.conclude(result)
    }
}

/// State of a session in flight
struct Session<T: Transport> {
    transport: T,
    config: SessionConfig,
    display: ProgressDisplay,
    generator: FrameGenerator,
    stats: LinkStats,
    state: SessionState,
    protocol: Protocol,
    metrics: LinkMetrics,
    session_id: Uuid,
    port: String,
    started_at: i64,
}

impl<T: Transport> Session<T> {
    fn transition(&mut self, next: SessionState) -> SessionResult<()> {
        if !self.state.can_transition_to(&next, self.protocol) {
            return Err(SessionError::InvalidStateTransition(format!(
                "Cannot move from {:?} to {:?} in {} session",
                self.state, next, self.protocol
            )));
        }
        self.state = next;
        Ok(())
    }

    fn continuous_send(&mut self, stop: &StopSignal) -> SessionResult<SessionState> {
        let total = self.config.total_bytes_planned();

        for _ in 0..self.config.iterations {
            if stop.is_stopped() {
                return Ok(SessionState::Stopped);
            }
            let frame = self.generator.generate(self.config.frame_size);
            self.send(&frame)?;
            self.display.update(self.stats.bytes_written, total, &[])?;
            pause(self.config.interval);
        }
        Ok(SessionState::Done)
    }

    fn loopback(&mut self, stop: &StopSignal) -> SessionResult<SessionState> {
        let total = self.config.total_bytes_planned();
        let iterations = self.config.iterations;

        for iteration in 1..=iterations {
            if stop.is_stopped() {
                return Ok(SessionState::Stopped);
            }
            let sent = self.generator.generate(self.config.frame_size);
            self.send(&sent)?;
            pause(self.config.interval);

            let received = self.read_frame(sent.len())?;
            record_bytes_observed(self.protocol.as_str(), sent.len() as u64);

            match LoopbackVerifier::verify(&mut self.stats, &sent, &received) {
                Outcome::Pass => record_frame_outcome(true),
                Outcome::Fail(mismatch) => {
                    record_frame_outcome(false);
                    record_mismatches(self.protocol.as_str(), mismatch.mismatches.len() as u64);
                    warn!(
                        iteration,
                        short_read = mismatch.is_short_read(),
                        bad_bytes = mismatch.mismatches.len(),
                        "Loopback frame failed"
                    );
                    self.display
                        .println(&format!("[{iteration}/{iterations}] FAIL: {mismatch}"))?;
                }
            }

            let counters = [
                Counter::new("Pass", self.stats.pass_count),
                Counter::new("Fail", self.stats.fail_count),
            ];
            self.display
                .update(self.stats.total_bytes_observed, total, &counters)?;
        }
        Ok(SessionState::Done)
    }

    fn stream_verify(&mut self, stop: &StopSignal) -> SessionResult<SessionState> {
        let mut verifier = StreamVerifier::new(self.config.pattern.clone())?;

        let companion = match self.config.companion_repeats {
            Some(repeats) => Some(BackgroundWriter::spawn(
                self.transport.try_clone()?,
                Frame::from(self.config.pattern.clone()),
                Some(repeats),
                self.config.interval,
                stop.clone(),
            )?),
            None => None,
        };

        while stop.is_running() {
            let chunk = self.transport.read(self.config.read_chunk_size)?;
            if chunk.is_empty() {
                record_empty_read();
                if companion.as_ref().is_some_and(BackgroundWriter::is_finished) {
                    debug!("Companion sender finished and link drained");
                    break;
                }
                debug!("No data received, waiting");
                pause(self.config.empty_read_backoff);
                continue;
            }

            let mismatches = verifier.ingest(&mut self.stats, &chunk);
            record_bytes_observed(self.protocol.as_str(), chunk.len() as u64);
            self.metrics.add_bytes(chunk.len() as u64);

            if !mismatches.is_empty() {
                record_mismatches(self.protocol.as_str(), mismatches.len() as u64);
                warn!(
                    count = mismatches.len(),
                    first = mismatches[0].position,
                    "Pattern mismatches in chunk"
                );
                let positions: Vec<u64> = mismatches.iter().map(|m| m.position).collect();
                self.display
                    .println(&format!("Mismatches at positions (abs): {positions:?}"))?;
                if self.config.show_raw {
                    self.display
                        .println(&format!("Received bytes: {}", hex::encode(&chunk)))?;
                }
            }

            self.display.status(&format!(
                "Total bytes: {}, Errors: {}",
                self.stats.total_bytes_observed, self.stats.error_byte_count
            ))?;
        }

        if let Some(companion) = companion {
            self.stats.bytes_written = companion.join()?;
            record_bytes_written(self.protocol.as_str(), self.stats.bytes_written);
        }
        Ok(SessionState::Stopped)
    }

    fn static_send(&mut self, stop: &StopSignal) -> SessionResult<SessionState> {
        let byte = self.config.static_byte;
        let writer = BackgroundWriter::spawn(
            self.transport.try_clone()?,
            Frame::constant(byte, 1),
            None,
            Duration::ZERO,
            stop.clone(),
        )?;

        while stop.is_running() && !writer.is_finished() {
            self.display.status(&format!(
                "Sending 0x{byte:02X}: {} bytes written",
                writer.bytes_written()
            ))?;
            thread::sleep(STATUS_REFRESH);
        }

        let written = writer.join()?;
        self.stats.bytes_written = written;
        self.metrics.add_bytes(written);
        record_bytes_written(self.protocol.as_str(), written);
        Ok(SessionState::Stopped)
    }

    fn send(&mut self, frame: &Frame) -> SessionResult<()> {
        self.transport.write_all(frame.as_bytes())?;
        self.stats.bytes_written += frame.len() as u64;
        self.metrics.add_bytes(frame.len() as u64);
        record_bytes_written(self.protocol.as_str(), frame.len() as u64);
        Ok(())
    }

    /// Collect up to `len` bytes, giving up at the first timed-out read
    fn read_frame(&mut self, len: usize) -> SessionResult<Frame> {
        let mut received = Vec::with_capacity(len);
        while received.len() < len {
            let chunk = self.transport.read(len - received.len())?;
            if chunk.is_empty() {
                record_empty_read();
                debug!(expected = len, got = received.len(), "Short read");
                break;
            }
            received.extend_from_slice(&chunk);
        }
        Ok(Frame::from(received))
    }

    fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.session_id.to_string(),
            protocol: self.protocol,
            state: self.state.clone(),
            port: self.port.clone(),
            started_at: self.started_at,
            elapsed_secs: self.metrics.elapsed().as_secs_f64(),
            throughput_bps: self.metrics.throughput(),
            stats: self.stats.clone(),
        }
    }

    fn conclude(mut self, result: SessionResult<SessionState>) -> SessionResult<SessionSummary> {
        match result {
            Ok(state) => {
                self.transition(state)?;
                self.metrics.complete();
                let summary = self.summary();
                self.display.finish()?;
                self.display.println(&summary.to_string())?;
                info!(
                    session_id = %self.session_id,
                    state = ?summary.state,
                    bytes = summary.bytes_processed(),
                    errors = summary.stats.error_byte_count,
                    error_rate = summary.stats.error_rate(),
                    "Session finished"
                );
                Ok(summary)
            }
            Err(err) => {
                self.transition(SessionState::Failed {
                    error: err.to_string(),
                })?;
                let summary = self.summary();
                // The session error matters more than a broken console
                let _ = self.display.finish();
                let _ = self.display.println(&summary.to_string());
                error!(
                    session_id = %self.session_id,
                    bytes = summary.bytes_processed(),
                    error = %err,
                    "Session aborted"
                );
                Err(SessionError::Aborted {
                    summary: Box::new(summary),
                    source: Box::new(err),
                })
            }
        }
    }
}

fn pause(interval: Duration) {
    if !interval.is_zero() {
        thread::sleep(interval);
    }
}
