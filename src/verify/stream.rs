use crate::verify::error::VerifyResult;
use crate::verify::pattern::PatternCursor;
use crate::verify::types::{LinkStats, MismatchRecord};

/// Verifies a continuous byte stream against a repeating pattern.
pub struct StreamVerifier {
    cursor: PatternCursor,
}

impl StreamVerifier {
    pub fn new(pattern: impl Into<Vec<u8>>) -> VerifyResult<Self> {
        Ok(Self::from_cursor(PatternCursor::new(pattern)?))
    }

    pub fn from_cursor(cursor: PatternCursor) -> Self {
        Self { cursor }
    }

    /// Feed one inbound chunk through the cursor.
    ///
    /// Returns the mismatches found in this chunk at absolute positions.
    /// An empty chunk is a no-op.
    pub fn ingest(&mut self, stats: &mut LinkStats, chunk: &[u8]) -> Vec<MismatchRecord> {
        let base = stats.total_bytes_observed;
        let mut mismatches = Vec::new();

        for (idx, &observed) in chunk.iter().enumerate() {
            let result = self.cursor.consume(observed);
            if !result.is_match {
                mismatches.push(MismatchRecord::new(
                    base + idx as u64,
                    result.expected,
                    observed,
                ));
            }
        }

        stats.total_bytes_observed += chunk.len() as u64;
        stats.error_byte_count += mismatches.len() as u64;
        mismatches
    }

    pub fn cursor(&self) -> &PatternCursor {
        &self.cursor
    }

    /// Start over at the beginning of the pattern with fresh counters
    pub fn reset(&mut self, stats: &mut LinkStats) {
        self.cursor.reset();
        stats.reset();
    }
}
