use crate::progress::terminal::TerminalWidth;
use std::fmt::Write;

/// Columns kept free for the percentage and byte counts
pub const RESERVED_COLUMNS: u16 = 32;

/// Columns kept free when pass/fail counters follow the byte counts
pub const RESERVED_COLUMNS_WITH_COUNTERS: u16 = 45;

pub const MIN_BAR_WIDTH: usize = 10;
pub const MAX_BAR_WIDTH: usize = 60;

const FILLED: char = '=';
const BOUNDARY: char = '>';
const EMPTY: char = '.';

/// Labelled number shown after the byte counts, e.g. `Pass:12`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counter {
    pub label: &'static str,
    pub value: u64,
}

impl Counter {
    pub fn new(label: &'static str, value: u64) -> Self {
        Self { label, value }
    }
}

/// Renders `[=====>....]  50.00% 50/100 bytes` style lines.
pub struct ProgressReporter {
    width: Box<dyn TerminalWidth>,
    reserved: u16,
}

impl ProgressReporter {
    pub fn new(width: impl TerminalWidth + 'static, reserved: u16) -> Self {
        Self {
            width: Box::new(width),
            reserved,
        }
    }

    /// Fraction complete, clamped to [0, 1]. A plan of zero bytes is complete.
    pub fn percent(bytes_sent: u64, total_planned: u64) -> f64 {
        if total_planned == 0 {
            return 1.0;
        }
        (bytes_sent as f64 / total_planned as f64).clamp(0.0, 1.0)
    }

    /// Bar width for the current terminal
    pub fn bar_width(&self) -> usize {
        let available = self.width.columns().saturating_sub(self.reserved) as usize;
        available.clamp(MIN_BAR_WIDTH, MAX_BAR_WIDTH)
    }

    /// Draw just the bar cells
    pub fn bar(width: usize, percent: f64) -> String {
        let filled = ((width as f64 * percent).round() as usize).min(width);
        let mut bar = String::with_capacity(width);
        bar.extend(std::iter::repeat(FILLED).take(filled));
        if filled < width {
            bar.push(BOUNDARY);
            bar.extend(std::iter::repeat(EMPTY).take(width - filled - 1));
        }
        bar
    }

    pub fn render(&self, bytes_sent: u64, total_planned: u64, counters: &[Counter]) -> String {
        let percent = Self::percent(bytes_sent, total_planned);
        let mut line = format!(
            "[{}] {:6.2}% {}/{} bytes",
            Self::bar(self.bar_width(), percent),
            percent * 100.0,
            bytes_sent,
            total_planned
        );

        if !counters.is_empty() {
            line.push_str(" [");
            for (idx, counter) in counters.iter().enumerate() {
                if idx > 0 {
                    line.push(' ');
                }
                // Writing to a String cannot fail
                let _ = write!(line, "{}:{}", counter.label, counter.value);
            }
            line.push(']');
        }
        line
    }
}
