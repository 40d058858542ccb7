//! End-to-end session tests over simulated links
//!
//! Run with: cargo test --test integration_test -- --nocapture

mod simulation;

use simulation::{Captured, ScriptedTransport, Step};
use std::io;
use std::thread;
use std::time::Duration;
use uart_linkcheck::frame::FrameGenerator;
use uart_linkcheck::progress::FixedWidth;
use uart_linkcheck::session::{
    Protocol, SessionConfig, SessionError, SessionRunner, SessionState, StopSignal,
};
use uart_linkcheck::transport::{LinkImpairments, Transport, VirtualLink};

fn fast_config() -> SessionConfig {
    SessionConfig::default()
        .with_interval(Duration::ZERO)
        .with_empty_read_backoff(Duration::from_millis(1))
}

fn runner<T: Transport>(transport: T, config: SessionConfig, out: &Captured) -> SessionRunner<T> {
    SessionRunner::new(transport, config)
        .with_output(out.clone())
        .with_terminal_width(FixedWidth(100))
}

/// Loopback over a corrupting link: every flipped bit shows up as exactly one bad byte
#[test]
fn test_loopback_over_corrupting_link() {
    let link = VirtualLink::new(Duration::from_millis(50))
        .with_impairments(LinkImpairments::with_corruption(0.05))
        .with_seed(11);
    let observer = link.clone();
    let out = Captured::default();
    let config = fast_config()
        .with_frame_size(16)
        .with_iterations(50)
        .with_seed(3);

    let summary = runner(link, config, &out)
        .run(Protocol::Loopback, &StopSignal::new())
        .unwrap();

    let stats = &summary.stats;
    println!("✓ {summary}, corrupted bytes: {}", observer.injected_corruptions());

    assert_eq!(summary.state, SessionState::Done);
    assert_eq!(stats.frames_checked(), 50);
    assert_eq!(stats.bytes_written, 800);
    assert_eq!(stats.total_bytes_observed, 800);
    assert_eq!(stats.error_byte_count, observer.injected_corruptions());
    assert!(stats.fail_count > 0);
    assert!(stats.fail_count <= stats.error_byte_count);

    let text = out.text();
    assert_eq!(text.matches("FAIL: Sent ").count() as u64, stats.fail_count);
    assert!(text.contains(&format!(
        "Test complete. Success: {}, Fail: {}",
        stats.pass_count, stats.fail_count
    )));
}

#[test]
fn test_stream_verify_with_companion_counts_every_corruption() {
    let link = VirtualLink::new(Duration::from_millis(30))
        .with_impairments(LinkImpairments::with_corruption(0.02));
    let observer = link.clone();
    let out = Captured::default();
    let config = fast_config().with_pattern(b"AC".to_vec()).with_companion(200);

    let summary = runner(link, config, &out)
        .run(Protocol::StreamVerify, &StopSignal::new())
        .unwrap();

    assert_eq!(summary.state, SessionState::Stopped);
    assert_eq!(summary.stats.bytes_written, 400);
    assert_eq!(summary.stats.total_bytes_observed, 400);
    assert_eq!(
        summary.stats.error_byte_count,
        observer.injected_corruptions()
    );
    assert_eq!(observer.pending(), 0);
}

#[test]
fn test_stream_verify_reports_absolute_positions_across_chunks() {
    let stop = StopSignal::new();
    let link = ScriptedTransport::new(
        [
            Step::data(b"ACA"),
            Step::data(b"XAC"),
            Step::Silence,
            Step::data(b"A"),
        ],
        stop.clone(),
    );
    let out = Captured::default();

    let summary = runner(link, fast_config().with_pattern(b"AC".to_vec()), &out)
        .run(Protocol::StreamVerify, &stop)
        .unwrap();

    assert_eq!(summary.stats.total_bytes_observed, 7);
    assert_eq!(summary.stats.error_byte_count, 1);

    let lines = out.lines();
    assert!(lines.contains(&"Mismatches at positions (abs): [3]".to_string()));
    assert!(lines.contains(&"Received bytes: 584143".to_string()));
    assert_eq!(
        lines.last().map(String::as_str),
        Some("Stopped. Total bytes: 7, Errors: 1")
    );
}

#[test]
fn test_stream_verify_hex_pattern_over_uneven_reads() {
    let pattern = hex::decode("deadbeef").unwrap();
    let stream: Vec<u8> = pattern.iter().copied().cycle().take(40).collect();
    let stop = StopSignal::new();
    let link = ScriptedTransport::new(
        [
            Step::data(&stream[..1]),
            Step::data(&stream[1..4]),
            Step::Silence,
            Step::data(&stream[4..11]),
            Step::data(&stream[11..]),
        ],
        stop.clone(),
    );
    let observer = link.clone();
    let out = Captured::default();
    let config = fast_config()
        .with_pattern(pattern)
        .with_read_chunk_size(5)
        .with_show_raw(false);

    let summary = runner(link, config, &out)
        .run(Protocol::StreamVerify, &stop)
        .unwrap();

    assert_eq!(summary.stats.total_bytes_observed, 40);
    assert_eq!(summary.stats.error_byte_count, 0);
    assert!(summary.is_clean());
    assert_eq!(observer.remaining_steps(), 0);
    assert!(!out.text().contains("Mismatches"));
}

#[test]
fn test_loopback_read_failure_aborts_with_partial_summary() {
    let first = FrameGenerator::with_seed(7).generate(4);
    let link = ScriptedTransport::new(
        [
            Step::Data(first.as_bytes().to_vec()),
            Step::Fail(io::ErrorKind::BrokenPipe),
        ],
        StopSignal::new(),
    );
    let observer = link.clone();
    let out = Captured::default();
    let config = fast_config()
        .with_frame_size(4)
        .with_iterations(5)
        .with_seed(7);

    let err = runner(link, config, &out)
        .run(Protocol::Loopback, &StopSignal::new())
        .unwrap_err();

    let summary = err.summary().expect("aborted sessions carry a summary");
    assert!(matches!(summary.state, SessionState::Failed { .. }));
    assert_eq!(summary.stats.pass_count, 1);
    assert_eq!(summary.stats.fail_count, 0);
    assert_eq!(summary.stats.bytes_written, 8);
    assert_eq!(observer.written().len(), 8);
    assert!(matches!(
        &err,
        SessionError::Aborted { source, .. } if matches!(**source, SessionError::Transport(_))
    ));
    assert!(out.text().contains("Aborted ("));
    assert!(out.text().contains("Success: 1, Fail: 0"));
}

#[test]
fn test_loopback_silent_link_counts_missing_bytes() {
    let stop = StopSignal::new();
    let link = ScriptedTransport::new([], stop.clone());
    let out = Captured::default();
    let config = fast_config()
        .with_frame_size(6)
        .with_iterations(3)
        .with_seed(1);

    let summary = runner(link, config, &out)
        .run(Protocol::Loopback, &stop)
        .unwrap();

    // The first empty read trips the stop signal, so only one frame runs
    assert_eq!(summary.state, SessionState::Stopped);
    assert_eq!(summary.stats.fail_count, 1);
    assert_eq!(summary.stats.error_byte_count, 6);
    assert!(out.text().contains("[1/3] FAIL: Sent "));
}

#[test]
fn test_continuous_send_summary_serializes() {
    let link = VirtualLink::new(Duration::from_millis(10));
    let observer = link.clone();
    let out = Captured::default();
    let config = fast_config().with_frame_size(10).with_iterations(8);

    let summary = runner(link, config, &out)
        .run(Protocol::ContinuousSend, &StopSignal::new())
        .unwrap();

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["protocol"], "ContinuousSend");
    assert_eq!(json["stats"]["bytes_written"], 80);
    assert_eq!(json["port"], "virtual-loopback");
    assert_eq!(observer.pending(), 80);
    assert!(out.text().contains("100.00%"));
}

#[test]
fn test_static_send_runs_until_stopped() {
    let stop = StopSignal::new();
    let link = ScriptedTransport::new([], stop.clone());
    let observer = link.clone();
    let out = Captured::default();

    let stopper = {
        let stop = stop.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            stop.stop();
        })
    };

    let summary = runner(link, fast_config().with_static_byte(0x55), &out)
        .run(Protocol::StaticSend, &stop)
        .unwrap();
    stopper.join().unwrap();

    let written = observer.written();
    assert_eq!(summary.state, SessionState::Stopped);
    assert!(!written.is_empty());
    assert_eq!(written.len() as u64, summary.stats.bytes_written);
    assert!(written.iter().all(|&b| b == 0x55));
}

#[test]
fn test_empty_pattern_rejected_before_any_io() {
    let link = ScriptedTransport::new([Step::data(b"AC")], StopSignal::new());
    let observer = link.clone();
    let out = Captured::default();

    let err = runner(link, fast_config().with_pattern(Vec::new()), &out)
        .run(Protocol::StreamVerify, &StopSignal::new())
        .unwrap_err();

    assert!(err.is_config_error());
    assert!(err.summary().is_none());
    assert_eq!(observer.reads(), 0);
    assert!(observer.written().is_empty());
    assert!(out.text().is_empty());
}

/// Same shape as the binary: blocking session on a worker thread, stop flipped from async code
#[tokio::test]
async fn test_blocking_session_stopped_from_async_side() {
    let link = VirtualLink::new(Duration::from_millis(10));
    let far_end = link.clone();
    let out = Captured::default();
    let stop = StopSignal::new();

    let session_stop = stop.clone();
    let session_out = out.clone();
    let session = tokio::task::spawn_blocking(move || {
        runner(link, fast_config().with_pattern(b"AC".to_vec()), &session_out)
            .run(Protocol::StreamVerify, &session_stop)
    });

    far_end.inject(b"ACACAC");
    tokio::time::sleep(Duration::from_millis(40)).await;
    far_end.inject(b"ACAX");
    tokio::time::sleep(Duration::from_millis(40)).await;
    stop.stop();

    let summary = session.await.unwrap().unwrap();
    assert_eq!(summary.state, SessionState::Stopped);
    assert_eq!(summary.stats.total_bytes_observed, 10);
    assert_eq!(summary.stats.error_byte_count, 1);
    assert!(out.text().contains("Mismatches at positions (abs): [9]"));
}
