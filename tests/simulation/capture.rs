#![allow(dead_code)]

use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::Arc;

/// Shared in-memory console
#[derive(Clone, Default)]
pub struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }

    /// Printed lines with in-place progress redraws collapsed to their last state
    pub fn lines(&self) -> Vec<String> {
        self.text()
            .split('\n')
            .map(|line| line.rsplit('\r').next().unwrap_or_default().to_string())
            .filter(|line| !line.trim().is_empty())
            .collect()
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
