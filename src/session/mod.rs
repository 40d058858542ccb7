pub mod error;
pub mod runner;
pub mod stop;
pub mod types;
pub mod writer;

pub use error::{SessionError, SessionResult};
pub use runner::SessionRunner;
pub use stop::StopSignal;
pub use types::{Protocol, SessionConfig, SessionState, SessionSummary};
pub use writer::BackgroundWriter;
