use crate::frame::Frame;
use crate::verify::types::{FrameMismatch, LinkStats, MismatchRecord, Outcome};

/// Classifies loopback round trips.
pub struct LoopbackVerifier;

impl LoopbackVerifier {
    /// Verify an echoed frame against the one that was sent.
    ///
    /// Pass requires identical length and content. Every call counts the
    /// sent length as observed, whatever the outcome.
    pub fn verify(stats: &mut LinkStats, sent: &Frame, received: &Frame) -> Outcome {
        let base = stats.total_bytes_observed;
        stats.total_bytes_observed += sent.len() as u64;

        if sent == received {
            stats.pass_count += 1;
            return Outcome::Pass;
        }

        let mismatches = Self::diff(base, sent.as_bytes(), received.as_bytes());
        stats.fail_count += 1;
        stats.error_byte_count += mismatches.len() as u64;

        Outcome::Fail(FrameMismatch {
            sent: sent.clone(),
            received: received.clone(),
            mismatches,
        })
    }

    /// Positions where `sent` and `received` disagree, offset by `base`
    pub fn diff(base: u64, sent: &[u8], received: &[u8]) -> Vec<MismatchRecord> {
        let span = sent.len().max(received.len());
        (0..span)
            .filter_map(|idx| {
                let expected = sent.get(idx).copied();
                let observed = received.get(idx).copied();
                (expected != observed).then_some(MismatchRecord {
                    position: base + idx as u64,
                    expected,
                    observed,
                })
            })
            .collect()
    }
}
