//! Metrics and observability module
//!
//! Counters are emitted through the `metrics` facade and reach whatever
//! recorder the host process installs. Without one they are no-ops.
//!
//! Key metrics:
//! - Bytes written to and observed from the link
//! - Loopback frames passed / failed
//! - Mismatched bytes and empty reads

pub mod recorder;

pub use recorder::{
    init_metrics, record_bytes_observed, record_bytes_written, record_empty_read,
    record_frame_outcome, record_mismatches, LinkMetrics,
};
