//! Scripted in-memory interface for exercising the engine without hardware.

use std::collections::VecDeque;
use std::fmt;
use std::io;
use std::time::Duration;

use ummeter_interface::{InterfaceError, InterfaceResult, MeterInterface};

const KIND: &str = "MOCK";

/// A fake meter link.
///
/// Every [`receive`](MeterInterface::receive) pops the next scripted
/// response (truncated to the requested length); an exhausted script
/// behaves like a timeout and yields an empty buffer.
#[derive(Debug, Default)]
pub struct MockInterface {
    open: bool,
    fail_open: bool,
    connects: usize,
    disconnects: usize,
    timeout: Option<Duration>,
    sent: Vec<u8>,
    responses: VecDeque<Vec<u8>>,
}

impl MockInterface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every [`open`](MeterInterface::open) fail.
    pub fn failing_open() -> Self {
        MockInterface {
            fail_open: true,
            ..Self::default()
        }
    }

    /// Queue a response for a later `receive`.
    pub fn push_response(&mut self, data: impl Into<Vec<u8>>) {
        self.responses.push_back(data.into());
    }

    /// Builder form of [`push_response`](Self::push_response).
    pub fn with_response(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.push_response(data);
        self
    }

    /// All bytes sent so far, in order.
    pub fn sent(&self) -> &[u8] {
        &self.sent
    }

    /// Forget the bytes sent so far.
    pub fn clear_sent(&mut self) {
        self.sent.clear();
    }

    /// Number of successful opens.
    pub fn connects(&self) -> usize {
        self.connects
    }

    /// Number of closes that actually closed something.
    pub fn disconnects(&self) -> usize {
        self.disconnects
    }

    /// Last timeout applied while open.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Scripted responses not consumed yet.
    pub fn pending_responses(&self) -> usize {
        self.responses.len()
    }

    fn ensure_open(&self) -> InterfaceResult<()> {
        if self.open {
            Ok(())
        } else {
            Err(InterfaceError::NotOpen { kind: KIND })
        }
    }
}

impl fmt::Display for MockInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<MOCK: open={}>", self.open)
    }
}

impl MeterInterface for MockInterface {
    fn is_open(&self) -> bool {
        self.open
    }

    fn open(&mut self) -> InterfaceResult<()> {
        if self.open {
            return Ok(());
        }
        if self.fail_open {
            return Err(InterfaceError::Open {
                kind: KIND,
                target: "mock".to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "scripted open failure"),
            });
        }
        self.open = true;
        self.connects += 1;
        Ok(())
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            self.disconnects += 1;
        }
    }

    fn set_timeout(&mut self, timeout: Duration) -> InterfaceResult<()> {
        self.ensure_open()?;
        self.timeout = Some(timeout);
        Ok(())
    }

    fn send(&mut self, data: &[u8]) -> InterfaceResult<usize> {
        self.ensure_open()?;
        self.sent.extend_from_slice(data);
        Ok(data.len())
    }

    fn receive(&mut self, len: usize) -> InterfaceResult<Vec<u8>> {
        self.ensure_open()?;
        let mut data = self.responses.pop_front().unwrap_or_default();
        data.truncate(len);
        Ok(data)
    }
}
