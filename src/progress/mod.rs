//! Single-line progress rendering
//!
//! [`ProgressReporter`] turns byte counts into a bar line, [`ProgressDisplay`]
//! owns the output stream and keeps that line updating in place.

pub mod display;
pub mod reporter;
pub mod terminal;

pub use display::ProgressDisplay;
pub use reporter::{Counter, ProgressReporter, RESERVED_COLUMNS, RESERVED_COLUMNS_WITH_COUNTERS};
pub use terminal::{CrosstermWidth, FixedWidth, TerminalWidth};
