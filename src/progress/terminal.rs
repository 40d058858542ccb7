/// Columns used when the terminal size cannot be queried
pub const FALLBACK_COLUMNS: u16 = 80;

/// Source of the current display width in columns
pub trait TerminalWidth: Send {
    fn columns(&self) -> u16;
}

impl<W: TerminalWidth + ?Sized> TerminalWidth for Box<W> {
    fn columns(&self) -> u16 {
        (**self).columns()
    }
}

/// Queries the attached terminal through crossterm
#[derive(Debug, Clone, Copy, Default)]
pub struct CrosstermWidth;

impl TerminalWidth for CrosstermWidth {
    fn columns(&self) -> u16 {
        match crossterm::terminal::size() {
            Ok((cols, _)) if cols > 0 => cols,
            _ => FALLBACK_COLUMNS,
        }
    }
}

/// Constant width, for pipes and tests
#[derive(Debug, Clone, Copy)]
pub struct FixedWidth(pub u16);

impl TerminalWidth for FixedWidth {
    fn columns(&self) -> u16 {
        self.0
    }
}
