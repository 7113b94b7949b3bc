//! GPIO through the pigpio daemon's socket interface.
//!
//! `pigpiod` listens on TCP port 8888. Every request is a 16-byte frame of
//! four little-endian `u32` words `(cmd, p1, p2, p3)`; the reply echoes
//! `cmd, p1, p2` and carries a signed result in the last word. Negative
//! results are daemon error codes.
//!
//! Only the handful of commands the motor driver needs are implemented.
//! Starting and supervising the daemon itself is left to the system
//! (`sudo systemctl start pigpiod`).
//!
//! # Duty cycle
//!
//! pigpio's default PWM range is 0-255, so percentages are scaled with
//! `percent * 255 / 100`.

use core::fmt;
use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::traits::{Gpio, Level, PinMode};

/// Default daemon port.
pub const DEFAULT_PORT: u16 = 8888;

/// Connect, read and write timeout used by [`PigpiodGpio::connect`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Default PWM range of the daemon.
pub const PWM_RANGE: u32 = 255;

/// Command codes from the pigpio socket interface.
pub mod cmd {
    /// Set pin mode.
    pub const MODES: u32 = 0;
    /// Read pin level.
    pub const READ: u32 = 3;
    /// Write pin level.
    pub const WRITE: u32 = 4;
    /// Set PWM duty (0..range).
    pub const PWM: u32 = 5;
    /// Set PWM frequency.
    pub const PFS: u32 = 7;
}

const MODE_INPUT: u32 = 0;
const MODE_OUTPUT: u32 = 1;
const FRAME_LEN: usize = 16;

/// A negative result code returned by the daemon.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PigpioCode(pub i32);

impl PigpioCode {
    /// Symbolic name for the codes this client can provoke.
    pub const fn name(&self) -> Option<&'static str> {
        match self.0 {
            -2 => Some("PI_BAD_USER_GPIO"),
            -3 => Some("PI_BAD_GPIO"),
            -4 => Some("PI_BAD_MODE"),
            -5 => Some("PI_BAD_LEVEL"),
            -8 => Some("PI_BAD_DUTYCYCLE"),
            -41 => Some("PI_NOT_PERMITTED"),
            _ => None,
        }
    }
}

impl fmt::Display for PigpioCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} ({})", self.0),
            None => write!(f, "error code {}", self.0),
        }
    }
}

/// Errors from the pigpio daemon client.
#[derive(Debug, thiserror::Error)]
pub enum PigpiodError {
    /// Socket failure, including a closed connection.
    #[error("pigpio daemon connection failed")]
    Io(#[from] io::Error),
    /// The daemon rejected a command.
    #[error("pigpio command {cmd} on pin {pin} failed: {code}")]
    Daemon {
        /// Command code sent.
        cmd: u32,
        /// Pin it addressed.
        pin: u8,
        /// Result code returned.
        code: PigpioCode,
    },
    /// The reply did not echo the command that was sent.
    #[error("reply to command {sent} carried command {received}")]
    Mismatch {
        /// Command code sent.
        sent: u32,
        /// Command code in the reply.
        received: u32,
    },
}

/// Scale a percentage onto the daemon's PWM range.
///
/// ```
/// use tb6612_bringup::hal::pigpiod::duty_to_range;
///
/// assert_eq!(duty_to_range(0), 0);
/// assert_eq!(duty_to_range(50), 127);
/// assert_eq!(duty_to_range(100), 255);
/// ```
pub fn duty_to_range(percent: u8) -> u32 {
    u32::from(percent.min(100)) * PWM_RANGE / 100
}

/// Encode one request frame.
pub fn encode_request(cmd: u32, p1: u32, p2: u32) -> [u8; FRAME_LEN] {
    let mut frame = [0u8; FRAME_LEN];
    frame[0..4].copy_from_slice(&cmd.to_le_bytes());
    frame[4..8].copy_from_slice(&p1.to_le_bytes());
    frame[8..12].copy_from_slice(&p2.to_le_bytes());
    // p3 (extension length) stays zero.
    frame
}

/// Client for a running pigpio daemon.
///
/// Generic over the transport so tests can substitute an in-memory stream.
///
/// # Example
///
/// ```ignore
/// use tb6612_bringup::hal::PigpiodGpio;
///
/// let gpio = PigpiodGpio::connect("localhost", 8888)?;
/// ```
#[derive(Debug)]
pub struct PigpiodGpio<S = TcpStream> {
    stream: S,
}

impl PigpiodGpio<TcpStream> {
    /// Connect to the daemon at `host:port` with [`DEFAULT_TIMEOUT`].
    pub fn connect(host: &str, port: u16) -> Result<Self, PigpiodError> {
        Self::connect_with_timeout(host, port, DEFAULT_TIMEOUT)
    }

    /// Connect to the daemon at `host:port`.
    ///
    /// `timeout` bounds the connect and every later socket read and write. A
    /// daemon that stops answering surfaces as [`PigpiodError::Io`].
    pub fn connect_with_timeout(
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<Self, PigpiodError> {
        let mut last_err = None;
        for addr in (host, port).to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    stream.set_read_timeout(Some(timeout))?;
                    stream.set_write_timeout(Some(timeout))?;
                    log::info!("connected to pigpio daemon at {host}:{port}");
                    return Ok(Self { stream });
                }
                Err(err) => last_err = Some(err),
            }
        }
        Err(last_err
            .unwrap_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, format!("{host} did not resolve"))
            })
            .into())
    }
}

impl<S: Read + Write> PigpiodGpio<S> {
    /// Wrap an already connected transport.
    pub fn from_stream(stream: S) -> Self {
        Self { stream }
    }

    /// The underlying transport.
    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Consume the client and return the transport.
    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Send one command and return its non-negative result.
    pub fn command(&mut self, cmd: u32, pin: u8, p2: u32) -> Result<u32, PigpiodError> {
        self.stream.write_all(&encode_request(cmd, u32::from(pin), p2))?;
        self.stream.flush()?;

        let mut reply = [0u8; FRAME_LEN];
        self.stream.read_exact(&mut reply)?;

        let received = u32::from_le_bytes([reply[0], reply[1], reply[2], reply[3]]);
        if received != cmd {
            return Err(PigpiodError::Mismatch {
                sent: cmd,
                received,
            });
        }
        let result = i32::from_le_bytes([reply[12], reply[13], reply[14], reply[15]]);
        if result < 0 {
            return Err(PigpiodError::Daemon {
                cmd,
                pin,
                code: PigpioCode(result),
            });
        }
        Ok(result as u32)
    }
}

impl<S: Read + Write> Gpio for PigpiodGpio<S> {
    type Error = PigpiodError;

    fn configure(&mut self, pin: u8, mode: PinMode) -> Result<(), PigpiodError> {
        match mode {
            PinMode::Input => {
                self.command(cmd::MODES, pin, MODE_INPUT)?;
            }
            PinMode::Output => {
                self.command(cmd::MODES, pin, MODE_OUTPUT)?;
                self.command(cmd::WRITE, pin, 0)?;
            }
        }
        Ok(())
    }

    fn write(&mut self, pin: u8, level: Level) -> Result<(), PigpiodError> {
        self.command(cmd::WRITE, pin, u32::from(level.is_high()))?;
        Ok(())
    }

    fn read(&mut self, pin: u8) -> Result<Level, PigpiodError> {
        let value = self.command(cmd::READ, pin, 0)?;
        Ok(Level::from(value != 0))
    }

    fn pwm_set_frequency(&mut self, pin: u8, hz: u32) -> Result<(), PigpiodError> {
        let actual = self.command(cmd::PFS, pin, hz)?;
        if actual != hz {
            log::info!("pin {pin}: daemon chose {actual} Hz for requested {hz} Hz");
        }
        Ok(())
    }

    fn pwm_start(&mut self, pin: u8, duty: u8) -> Result<(), PigpiodError> {
        self.pwm_set_duty(pin, duty)
    }

    fn pwm_set_duty(&mut self, pin: u8, duty: u8) -> Result<(), PigpiodError> {
        self.command(cmd::PWM, pin, duty_to_range(duty))?;
        Ok(())
    }

    fn pwm_stop(&mut self, pin: u8) -> Result<(), PigpiodError> {
        self.command(cmd::PWM, pin, 0)?;
        self.command(cmd::WRITE, pin, 0)?;
        Ok(())
    }

    fn release(&mut self, pin: u8) -> Result<(), PigpiodError> {
        self.command(cmd::MODES, pin, MODE_INPUT)?;
        Ok(())
    }
}
