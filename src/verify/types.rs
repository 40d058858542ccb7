use crate::frame::Frame;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of comparing one observed byte against the reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchResult {
    pub expected: u8,
    pub observed: u8,
    pub is_match: bool,
}

/// Absolute position (0-based across the session) where data diverged.
///
/// `expected` is `None` when more bytes arrived than were sent, `observed`
/// is `None` when a byte never arrived. Stream mismatches always carry both.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MismatchRecord {
    pub position: u64,
    pub expected: Option<u8>,
    pub observed: Option<u8>,
}

impl MismatchRecord {
    pub fn new(position: u64, expected: u8, observed: u8) -> Self {
        Self {
            position,
            expected: Some(expected),
            observed: Some(observed),
        }
    }

    pub fn is_missing(&self) -> bool {
        self.observed.is_none()
    }
}

impl fmt::Display for MismatchRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |b: Option<u8>| b.map_or_else(|| "--".to_string(), |b| format!("{b:02x}"));
        write!(
            f,
            "@{}: expected {}, got {}",
            self.position,
            show(self.expected),
            show(self.observed)
        )
    }
}

/// Details of a failed loopback round trip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameMismatch {
    pub sent: Frame,
    pub received: Frame,
    pub mismatches: Vec<MismatchRecord>,
}

impl FrameMismatch {
    pub fn is_short_read(&self) -> bool {
        self.received.len() < self.sent.len()
    }
}

impl fmt::Display for FrameMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sent {}, Received {}", self.sent, self.received)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Pass,
    Fail(FrameMismatch),
}

impl Outcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, Outcome::Pass)
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, Outcome::Fail(_))
    }
}

/// Aggregate counters for one session.
///
/// Owned by the session and handed to verifiers by `&mut`; everything else
/// only reads it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LinkStats {
    pub total_bytes_observed: u64,
    pub error_byte_count: u64,
    pub pass_count: u64,
    pub fail_count: u64,
    pub bytes_written: u64,
}

impl LinkStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_checked(&self) -> u64 {
        self.pass_count + self.fail_count
    }

    /// Fraction of observed bytes that mismatched
    pub fn error_rate(&self) -> f64 {
        if self.total_bytes_observed == 0 {
            0.0
        } else {
            self.error_byte_count as f64 / self.total_bytes_observed as f64
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
