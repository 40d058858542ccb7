use crate::transport::error::TransportResult;
use crate::transport::Transport;
use parking_lot::{Condvar, Mutex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Faults injected on the way through a [`VirtualLink`]
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LinkImpairments {
    /// Chance (0.0 - 1.0) that a byte gets one bit flipped
    pub corruption_rate: f64,
    /// Chance (0.0 - 1.0) that a byte never arrives
    pub drop_rate: f64,
    /// Cap on bytes returned per read, to force short reads
    pub max_read_chunk: Option<usize>,
}

impl LinkImpairments {
    pub fn perfect() -> Self {
        Self::default()
    }

    pub fn with_corruption(rate: f64) -> Self {
        Self {
            corruption_rate: rate.clamp(0.0, 1.0),
            ..Default::default()
        }
    }

    pub fn with_drops(rate: f64) -> Self {
        Self {
            drop_rate: rate.clamp(0.0, 1.0),
            ..Default::default()
        }
    }
}

#[derive(Default)]
struct Shared {
    buffer: Mutex<VecDeque<u8>>,
    data_ready: Condvar,
    corrupted: AtomicU64,
    dropped: AtomicU64,
}

/// In-memory loopback: everything written comes back on read.
///
/// Clones share the same buffer, so a background writer and a foreground
/// reader can run on separate threads like they would on a real port.
pub struct VirtualLink {
    shared: Arc<Shared>,
    impairments: LinkImpairments,
    read_timeout: Duration,
    rng: StdRng,
}

impl VirtualLink {
    pub fn new(read_timeout: Duration) -> Self {
        Self {
            shared: Arc::new(Shared::default()),
            impairments: LinkImpairments::perfect(),
            read_timeout,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_impairments(mut self, impairments: LinkImpairments) -> Self {
        self.impairments = impairments;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Push bytes as if the far end sent them, bypassing impairments
    pub fn inject(&self, bytes: &[u8]) {
        self.shared.buffer.lock().extend(bytes);
        self.shared.data_ready.notify_all();
    }

    /// Bytes written but not yet read
    pub fn pending(&self) -> usize {
        self.shared.buffer.lock().len()
    }

    pub fn injected_corruptions(&self) -> u64 {
        self.shared.corrupted.load(Ordering::Relaxed)
    }

    pub fn injected_drops(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }

    fn impair(&mut self, bytes: &[u8]) -> Vec<u8> {
        let mut delivered = Vec::with_capacity(bytes.len());
        for &byte in bytes {
            if self.impairments.drop_rate > 0.0
                && self.rng.gen::<f64>() < self.impairments.drop_rate
            {
                self.shared.dropped.fetch_add(1, Ordering::Relaxed);
                continue;
            }
            if self.impairments.corruption_rate > 0.0
                && self.rng.gen::<f64>() < self.impairments.corruption_rate
            {
                self.shared.corrupted.fetch_add(1, Ordering::Relaxed);
                delivered.push(byte ^ (1 << self.rng.gen_range(0..8u8)));
                continue;
            }
            delivered.push(byte);
        }
        delivered
    }
}

impl Clone for VirtualLink {
    /// Another end of the same link. Each handle draws its own impairments.
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            impairments: self.impairments.clone(),
            read_timeout: self.read_timeout,
            rng: StdRng::from_entropy(),
        }
    }
}

impl Transport for VirtualLink {
    fn write(&mut self, bytes: &[u8]) -> TransportResult<usize> {
        let delivered = self.impair(bytes);
        self.shared.buffer.lock().extend(delivered);
        self.shared.data_ready.notify_all();
        Ok(bytes.len())
    }

    fn read(&mut self, max_bytes: usize) -> TransportResult<Vec<u8>> {
        if max_bytes == 0 {
            return Ok(Vec::new());
        }

        let deadline = Instant::now() + self.read_timeout;
        let mut buffer = self.shared.buffer.lock();
        while buffer.is_empty() {
            if self
                .shared
                .data_ready
                .wait_until(&mut buffer, deadline)
                .timed_out()
            {
                break;
            }
        }

        let limit = self.impairments.max_read_chunk.unwrap_or(usize::MAX).max(1);
        let n = buffer.len().min(max_bytes).min(limit);
        Ok(buffer.drain(..n).collect())
    }

    fn try_clone(&self) -> TransportResult<Box<dyn Transport>> {
        Ok(Box::new(self.clone()))
    }

    fn name(&self) -> String {
        "virtual-loopback".to_string()
    }
}
