use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BAUD_RATE: u32 = 115_200;
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum StopBitsSetting {
    #[default]
    One,
    Two,
}

impl StopBitsSetting {
    pub fn from_count(count: u8) -> Option<Self> {
        match count {
            1 => Some(StopBitsSetting::One),
            2 => Some(StopBitsSetting::Two),
            _ => None,
        }
    }
}

impl From<StopBitsSetting> for serialport::StopBits {
    fn from(value: StopBitsSetting) -> Self {
        match value {
            StopBitsSetting::One => serialport::StopBits::One,
            StopBitsSetting::Two => serialport::StopBits::Two,
        }
    }
}

/// How to open the port under test
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PortConfig {
    /// Device path or name, e.g. `/dev/ttyUSB0` or `COM3`
    pub port: String,
    pub baud_rate: u32,
    pub stop_bits: StopBitsSetting,
    /// Upper bound on a single read; an idle link reads as empty after this
    pub read_timeout: Duration,
}

impl PortConfig {
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            stop_bits: StopBitsSetting::One,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn with_stop_bits(mut self, stop_bits: StopBitsSetting) -> Self {
        self.stop_bits = stop_bits;
        self
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }
}
