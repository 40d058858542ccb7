//! Metrics recorder for link test sessions

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initialize metric descriptions (call once at startup)
pub fn init_metrics() {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        return;
    }

    describe_counter!(
        "linkcheck_bytes_written_total",
        "Total bytes written to the link under test"
    );
    describe_counter!(
        "linkcheck_bytes_observed_total",
        "Total bytes read back and verified"
    );
    describe_counter!(
        "linkcheck_frames_passed_total",
        "Loopback frames echoed back intact"
    );
    describe_counter!(
        "linkcheck_frames_failed_total",
        "Loopback frames that came back different or short"
    );
    describe_counter!(
        "linkcheck_mismatched_bytes_total",
        "Bytes that differed from the expected value"
    );
    describe_counter!(
        "linkcheck_empty_reads_total",
        "Reads that timed out without data"
    );

    describe_histogram!(
        "linkcheck_session_duration_seconds",
        "Wall-clock duration of a test session"
    );
    describe_histogram!(
        "linkcheck_throughput_bytes_per_second",
        "Average session throughput"
    );
}

pub fn record_bytes_written(protocol: &str, bytes: u64) {
    counter!("linkcheck_bytes_written_total", "protocol" => protocol.to_string())
        .increment(bytes);
}

pub fn record_bytes_observed(protocol: &str, bytes: u64) {
    counter!("linkcheck_bytes_observed_total", "protocol" => protocol.to_string())
        .increment(bytes);
}

pub fn record_frame_outcome(passed: bool) {
    if passed {
        counter!("linkcheck_frames_passed_total").increment(1);
    } else {
        counter!("linkcheck_frames_failed_total").increment(1);
    }
}

pub fn record_mismatches(protocol: &str, count: u64) {
    if count > 0 {
        counter!("linkcheck_mismatched_bytes_total", "protocol" => protocol.to_string())
            .increment(count);
    }
}

pub fn record_empty_read() {
    counter!("linkcheck_empty_reads_total").increment(1);
}

/// Times a session and tracks how many bytes moved through it
pub struct LinkMetrics {
    protocol: String,
    start_time: Instant,
    bytes_transferred: u64,
}

impl LinkMetrics {
    pub fn start(protocol: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            start_time: Instant::now(),
            bytes_transferred: 0,
        }
    }

    pub fn add_bytes(&mut self, bytes: u64) {
        self.bytes_transferred += bytes;
    }

    pub fn bytes_transferred(&self) -> u64 {
        self.bytes_transferred
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Current throughput in bytes/second
    pub fn throughput(&self) -> f64 {
        let secs = self.start_time.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.bytes_transferred as f64 / secs
        } else {
            0.0
        }
    }

    /// Record duration and throughput histograms for the finished session
    pub fn complete(&self) {
        histogram!("linkcheck_session_duration_seconds", "protocol" => self.protocol.clone())
            .record(self.elapsed().as_secs_f64());
        histogram!("linkcheck_throughput_bytes_per_second", "protocol" => self.protocol.clone())
            .record(self.throughput());
    }
}
