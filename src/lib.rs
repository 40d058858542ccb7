//! Serial link verification
//!
//! Exercises a byte-serial link (typically a UART) with synthetic traffic
//! and checks what comes back: random frames for throughput, echoed frames
//! for loopback, and a repeating pattern for continuous streams. Mismatches
//! are attributed to absolute byte positions across the whole session.

pub mod frame;
pub mod metrics;
pub mod progress;
pub mod session;
pub mod transport;
pub mod verify;

pub use frame::{Frame, FrameGenerator};
pub use session::{Protocol, SessionConfig, SessionError, SessionRunner, SessionSummary, StopSignal};
pub use transport::{PortConfig, SerialTransport, Transport, VirtualLink};
pub use verify::{LinkStats, LoopbackVerifier, PatternCursor, StreamVerifier};
