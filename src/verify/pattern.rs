use crate::verify::error::{VerifyError, VerifyResult};
use crate::verify::types::MatchResult;

/// Cyclic position tracker within a repeating reference pattern.
///
/// The cursor advances on every consumed byte, match or not. It never
/// resynchronizes, so a corrupted byte costs one mismatch as long as the
/// byte count on the link is preserved.
#[derive(Debug, Clone)]
pub struct PatternCursor {
    pattern: Vec<u8>,
    offset: usize,
}

impl PatternCursor {
    pub fn new(pattern: impl Into<Vec<u8>>) -> VerifyResult<Self> {
        let pattern = pattern.into();
        if pattern.is_empty() {
            return Err(VerifyError::InvalidPattern);
        }
        Ok(Self { pattern, offset: 0 })
    }

    /// Parse a hex string (e.g. "4143") into a cursor
    pub fn from_hex(encoded: &str) -> VerifyResult<Self> {
        Self::new(hex::decode(encoded.trim())?)
    }

    /// Compare one observed byte with the expected one, then advance
    pub fn consume(&mut self, observed: u8) -> MatchResult {
        let expected = self.pattern[self.offset];
        self.offset = (self.offset + 1) % self.pattern.len();
        MatchResult {
            expected,
            observed,
            is_match: observed == expected,
        }
    }

    /// Byte the next call to `consume` will be checked against
    pub fn expected(&self) -> u8 {
        self.pattern[self.offset]
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn pattern(&self) -> &[u8] {
        &self.pattern
    }

    pub fn reset(&mut self) {
        self.offset = 0;
    }
}
