use crate::progress::reporter::{Counter, ProgressReporter};
use std::io::{self, Write};

/// Keeps one progress line updating in place on an output stream.
///
/// Lines printed through [`ProgressDisplay::println`] land above the
/// progress line instead of being glued onto it. [`ProgressDisplay::finish`]
/// terminates the progress line exactly once, also on drop.
pub struct ProgressDisplay {
    out: Box<dyn Write + Send>,
    reporter: ProgressReporter,
    line_active: bool,
    finished: bool,
}

impl ProgressDisplay {
    pub fn new(out: impl Write + Send + 'static, reporter: ProgressReporter) -> Self {
        Self {
            out: Box::new(out),
            reporter,
            line_active: false,
            finished: false,
        }
    }

    pub fn stdout(reporter: ProgressReporter) -> Self {
        Self::new(io::stdout(), reporter)
    }

    pub fn reporter(&self) -> &ProgressReporter {
        &self.reporter
    }

    /// Redraw the bar
    pub fn update(
        &mut self,
        bytes_sent: u64,
        total_planned: u64,
        counters: &[Counter],
    ) -> io::Result<()> {
        let line = self.reporter.render(bytes_sent, total_planned, counters);
        self.draw(&line)
    }

    /// Redraw the line with free-form text, for runs without a planned total
    pub fn status(&mut self, text: &str) -> io::Result<()> {
        self.draw(text)
    }

    /// Print a full line above the progress line
    pub fn println(&mut self, text: &str) -> io::Result<()> {
        if self.line_active {
            self.out.write_all(b"\n")?;
            self.line_active = false;
        }
        writeln!(self.out, "{text}")?;
        self.out.flush()
    }

    /// Move past the progress line. Only the first call writes.
    pub fn finish(&mut self) -> io::Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.line_active = false;
        self.out.write_all(b"\n")?;
        self.out.flush()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn draw(&mut self, line: &str) -> io::Result<()> {
        write!(self.out, "\r{line}")?;
        self.out.flush()?;
        self.line_active = true;
        Ok(())
    }
}

impl Drop for ProgressDisplay {
    fn drop(&mut self) {
        let _ = self.finish();
    }
}
