//! In-process link simulation for session tests
//!
//! [`ScriptedTransport`] replays reads with exact chunk boundaries and
//! injected failures, [`Captured`] collects what a session prints.

pub mod capture;
pub mod scripted_link;

pub use capture::Captured;
pub use scripted_link::{ScriptedTransport, Step};
