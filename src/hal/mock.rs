//! Mock implementations for testing without hardware.
//!
//! # Available Mocks
//!
//! | Mock | Stands in for | Purpose |
//! |------|---------------|---------|
//! | [`MockDelay`] | [`Delay`] | Records requested delays without sleeping |
//! | [`MockStream`] | `TcpStream` | Scripted pigpio daemon responses |
//!
//! For GPIO itself use [`SimGpio`](crate::hal::SimGpio), which is also the
//! runtime simulation backend.
//!
//! [`Delay`]: crate::traits::Delay

use std::io::{self, Cursor, Read, Write};

use crate::traits::Delay;

/// Mock delay for testing.
///
/// Returns immediately and remembers every request.
///
/// # Example
///
/// ```rust
/// use tb6612_bringup::hal::MockDelay;
/// use tb6612_bringup::traits::Delay;
///
/// let mut delay = MockDelay::new();
/// delay.delay_ms(2000);
/// delay.delay_ms(1000);
///
/// assert_eq!(delay.calls, vec![2000, 1000]);
/// assert_eq!(delay.total_ms(), 3000);
/// ```
#[derive(Debug, Default)]
pub struct MockDelay {
    /// Every requested delay in order.
    pub calls: Vec<u64>,
}

impl MockDelay {
    /// Creates a mock delay with no recorded calls.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of all requested delays.
    pub fn total_ms(&self) -> u64 {
        self.calls.iter().sum()
    }
}

impl Delay for MockDelay {
    fn delay_ms(&mut self, ms: u64) {
        self.calls.push(ms);
    }
}

/// In-memory byte stream for protocol tests.
///
/// Reads come from a prepared response buffer; writes are captured.
///
/// ```rust
/// use std::io::{Read, Write};
/// use tb6612_bringup::hal::MockStream;
///
/// let mut stream = MockStream::with_responses(vec![1, 2, 3]);
/// stream.write_all(b"hi").unwrap();
///
/// let mut buf = [0u8; 3];
/// stream.read_exact(&mut buf).unwrap();
/// assert_eq!(buf, [1, 2, 3]);
/// assert_eq!(stream.written, b"hi");
/// ```
#[derive(Debug, Default)]
pub struct MockStream {
    responses: Cursor<Vec<u8>>,
    /// Every byte written to the stream.
    pub written: Vec<u8>,
}

impl MockStream {
    /// Creates a stream that will yield `responses` to readers.
    pub fn with_responses(responses: Vec<u8>) -> Self {
        Self {
            responses: Cursor::new(responses),
            written: Vec::new(),
        }
    }
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.responses.read(buf)
    }
}

impl Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
