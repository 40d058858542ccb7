pub mod error;
pub mod loopback;
pub mod pattern;
pub mod stream;
pub mod types;

pub use error::{VerifyError, VerifyResult};
pub use loopback::LoopbackVerifier;
pub use pattern::PatternCursor;
pub use stream::StreamVerifier;
pub use types::{FrameMismatch, LinkStats, MatchResult, MismatchRecord, Outcome};
