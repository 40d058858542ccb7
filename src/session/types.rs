use crate::session::error::{SessionError, SessionResult};
use crate::verify::{LinkStats, VerifyError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Which test a session runs
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// Fire-and-forget random frames for throughput
    ContinuousSend,
    /// Send a frame, read the echo, compare
    Loopback,
    /// Check an inbound stream against a repeating pattern
    StreamVerify,
    /// Push one constant byte from a background writer until stopped
    StaticSend,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::ContinuousSend => "send",
            Protocol::Loopback => "loopback",
            Protocol::StreamVerify => "verify",
            Protocol::StaticSend => "static",
        }
    }

    /// Whether the session ends on its own after a fixed number of frames
    pub fn is_bounded(&self) -> bool {
        matches!(self, Protocol::ContinuousSend | Protocol::Loopback)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    /// Bounded run reached its iteration count
    Done,
    /// Ended by the operator or a finished companion sender
    Stopped,
    Failed { error: String },
}

impl SessionState {
    pub fn can_transition_to(&self, next: &SessionState, protocol: Protocol) -> bool {
        match (self, next) {
            (SessionState::Idle, SessionState::Running) => true,
            (SessionState::Running, SessionState::Done) => protocol.is_bounded(),
            (SessionState::Running, SessionState::Stopped) => true,
            (SessionState::Idle | SessionState::Running, SessionState::Failed { .. }) => true,
            _ => false,
        }
    }
}

/// Knobs for a test session. Port settings live in `PortConfig`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionConfig {
    /// Bytes per generated frame
    pub frame_size: usize,
    /// Pause after each send
    pub interval: Duration,
    /// Frames to send in bounded protocols
    pub iterations: u64,
    /// Reference pattern for stream verification
    pub pattern: Vec<u8>,
    /// Upper bound on a single stream read
    pub read_chunk_size: usize,
    /// Wait after an empty stream read before trying again
    pub empty_read_backoff: Duration,
    /// Byte pushed by static send
    pub static_byte: u8,
    /// Print raw received chunks alongside mismatch positions
    pub show_raw: bool,
    /// When set, stream verification also sends the pattern this many times
    pub companion_repeats: Option<u64>,
    /// Fixed RNG seed for reproducible frames
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            frame_size: 8,
            interval: Duration::from_millis(100),
            iterations: 100,
            pattern: b"AC".to_vec(),
            read_chunk_size: 1024,
            empty_read_backoff: Duration::from_millis(100),
            static_byte: 0xAA,
            show_raw: true,
            companion_repeats: None,
            seed: None,
        }
    }
}

impl SessionConfig {
    pub fn with_frame_size(mut self, frame_size: usize) -> Self {
        self.frame_size = frame_size;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_iterations(mut self, iterations: u64) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<Vec<u8>>) -> Self {
        self.pattern = pattern.into();
        self
    }

    pub fn with_read_chunk_size(mut self, read_chunk_size: usize) -> Self {
        self.read_chunk_size = read_chunk_size;
        self
    }

    pub fn with_empty_read_backoff(mut self, backoff: Duration) -> Self {
        self.empty_read_backoff = backoff;
        self
    }

    pub fn with_static_byte(mut self, byte: u8) -> Self {
        self.static_byte = byte;
        self
    }

    pub fn with_show_raw(mut self, show_raw: bool) -> Self {
        self.show_raw = show_raw;
        self
    }

    pub fn with_companion(mut self, repeats: u64) -> Self {
        self.companion_repeats = Some(repeats);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Bytes a bounded protocol plans to send in total
    pub fn total_bytes_planned(&self) -> u64 {
        (self.frame_size as u64).saturating_mul(self.iterations)
    }

    /// Reject settings the given protocol cannot run with
    pub fn validate(&self, protocol: Protocol) -> SessionResult<()> {
        if protocol == Protocol::StreamVerify {
            if self.pattern.is_empty() {
                return Err(VerifyError::InvalidPattern.into());
            }
            if self.read_chunk_size == 0 {
                return Err(SessionError::InvalidConfig(
                    "read chunk size must be at least 1 byte".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Final report of one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub protocol: Protocol,
    pub state: SessionState,
    pub port: String,
    pub started_at: i64,
    pub elapsed_secs: f64,
    pub throughput_bps: f64,
    pub stats: LinkStats,
}

impl SessionSummary {
    /// Bytes moved in whichever direction the protocol exercises
    pub fn bytes_processed(&self) -> u64 {
        self.stats.total_bytes_observed.max(self.stats.bytes_written)
    }

    /// Whether the link showed no errors
    pub fn is_clean(&self) -> bool {
        self.stats.fail_count == 0 && self.stats.error_byte_count == 0
    }
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            SessionState::Done => write!(f, "Test complete. ")?,
            SessionState::Stopped => write!(f, "Stopped. ")?,
            SessionState::Failed { error } => write!(f, "Aborted ({error}). ")?,
            SessionState::Idle | SessionState::Running => {}
        }

        let stats = &self.stats;
        match self.protocol {
            Protocol::ContinuousSend => write!(
                f,
                "Sent {} bytes in {:.2}s ({:.0} B/s)",
                stats.bytes_written, self.elapsed_secs, self.throughput_bps
            ),
            Protocol::Loopback => write!(
                f,
                "Success: {}, Fail: {}",
                stats.pass_count, stats.fail_count
            ),
            Protocol::StreamVerify => write!(
                f,
                "Total bytes: {}, Errors: {}",
                stats.total_bytes_observed, stats.error_byte_count
            ),
            Protocol::StaticSend => write!(f, "Sent {} bytes", stats.bytes_written),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(protocol: Protocol, state: SessionState, stats: LinkStats) -> SessionSummary {
        SessionSummary {
            session_id: "test".to_string(),
            protocol,
            state,
            port: "virtual-loopback".to_string(),
            started_at: 0,
            elapsed_secs: 2.0,
            throughput_bps: 400.0,
            stats,
        }
    }

    #[test]
    fn test_state_transitions() {
        let idle = SessionState::Idle;
        assert!(idle.can_transition_to(&SessionState::Running, Protocol::Loopback));
        assert!(!idle.can_transition_to(&SessionState::Done, Protocol::Loopback));

        let running = SessionState::Running;
        assert!(running.can_transition_to(&SessionState::Done, Protocol::ContinuousSend));
        assert!(!running.can_transition_to(&SessionState::Done, Protocol::StreamVerify));
        assert!(running.can_transition_to(&SessionState::Stopped, Protocol::StreamVerify));

        let done = SessionState::Done;
        assert!(!done.can_transition_to(&SessionState::Running, Protocol::Loopback));
    }

    #[test]
    fn test_validate_rejects_empty_pattern() {
        let config = SessionConfig::default().with_pattern(Vec::new());

        assert!(matches!(
            config.validate(Protocol::StreamVerify),
            Err(SessionError::Verify(VerifyError::InvalidPattern))
        ));
        // Only stream verification cares about the pattern
        assert!(config.validate(Protocol::Loopback).is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_chunk() {
        let config = SessionConfig::default().with_read_chunk_size(0);
        let err = config.validate(Protocol::StreamVerify).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_total_bytes_planned() {
        let config = SessionConfig::default()
            .with_frame_size(8)
            .with_iterations(100);
        assert_eq!(config.total_bytes_planned(), 800);
    }

    #[test]
    fn test_summary_lines() {
        let stats = LinkStats {
            total_bytes_observed: 800,
            pass_count: 97,
            fail_count: 3,
            error_byte_count: 5,
            bytes_written: 800,
        };

        let loopback = summary(Protocol::Loopback, SessionState::Done, stats.clone());
        assert_eq!(loopback.to_string(), "Test complete. Success: 97, Fail: 3");
        assert!(!loopback.is_clean());

        let verify = summary(Protocol::StreamVerify, SessionState::Stopped, stats.clone());
        assert_eq!(verify.to_string(), "Stopped. Total bytes: 800, Errors: 5");

        let send = summary(Protocol::ContinuousSend, SessionState::Done, stats);
        assert_eq!(send.to_string(), "Test complete. Sent 800 bytes in 2.00s (400 B/s)");
    }

    #[test]
    fn test_summary_json() {
        let summary = summary(Protocol::StaticSend, SessionState::Stopped, LinkStats::new());
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"protocol\":\"StaticSend\""));

        let parsed: SessionSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.state, SessionState::Stopped);
    }
}
