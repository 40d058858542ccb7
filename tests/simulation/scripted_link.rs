//! Transport that replays a fixed script of reads
//!
//! Writes are recorded, reads follow the script one step at a time. Once the
//! script runs out the session's stop signal is tripped, standing in for an
//! operator pressing Ctrl-C.

#![allow(dead_code)]

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use uart_linkcheck::session::StopSignal;
use uart_linkcheck::transport::{Transport, TransportResult};

/// One scripted read
#[derive(Debug, Clone)]
pub enum Step {
    /// Deliver these bytes, split further if the reader asks for fewer
    Data(Vec<u8>),
    /// A read that times out
    Silence,
    /// A read that fails
    Fail(io::ErrorKind),
}

impl Step {
    pub fn data(bytes: &[u8]) -> Self {
        Step::Data(bytes.to_vec())
    }
}

#[derive(Default)]
struct Script {
    steps: VecDeque<Step>,
    written: Vec<u8>,
    reads: usize,
}

#[derive(Clone)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
    stop: StopSignal,
}

impl ScriptedTransport {
    pub fn new(steps: impl IntoIterator<Item = Step>, stop: StopSignal) -> Self {
        Self {
            script: Arc::new(Mutex::new(Script {
                steps: steps.into_iter().collect(),
                ..Default::default()
            })),
            stop,
        }
    }

    pub fn written(&self) -> Vec<u8> {
        self.script.lock().written.clone()
    }

    pub fn reads(&self) -> usize {
        self.script.lock().reads
    }

    pub fn remaining_steps(&self) -> usize {
        self.script.lock().steps.len()
    }
}

impl Transport for ScriptedTransport {
    fn write(&mut self, bytes: &[u8]) -> TransportResult<usize> {
        self.script.lock().written.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn read(&mut self, max_bytes: usize) -> TransportResult<Vec<u8>> {
        let step = {
            let mut script = self.script.lock();
            script.reads += 1;
            script.steps.pop_front()
        };

        match step {
            Some(Step::Data(mut bytes)) => {
                if bytes.len() > max_bytes {
                    let rest = bytes.split_off(max_bytes);
                    self.script.lock().steps.push_front(Step::Data(rest));
                }
                Ok(bytes)
            }
            Some(Step::Silence) => Ok(Vec::new()),
            Some(Step::Fail(kind)) => Err(io::Error::from(kind).into()),
            None => {
                self.stop.stop();
                thread::sleep(Duration::from_millis(1));
                Ok(Vec::new())
            }
        }
    }

    fn try_clone(&self) -> TransportResult<Box<dyn Transport>> {
        Ok(Box::new(self.clone()))
    }

    fn name(&self) -> String {
        "scripted".to_string()
    }
}
