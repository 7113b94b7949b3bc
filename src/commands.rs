//! Interactive command words.
//!
//! | Word | Effect |
//! |------|--------|
//! | `af` / `ab` / `as` | Motor A forward / backward / stop |
//! | `bf` / `bb` / `bs` | Motor B forward / backward / stop |
//! | `stop` | Stop both motors |
//! | `q` | Quit |
//!
//! Input is trimmed and case-insensitive.

use core::fmt;

use crate::driver::Tb6612;
use crate::error::DriverError;
use crate::motor::MotorId;
use crate::traits::{Direction, Gpio};

/// Usage line printed for unrecognized input.
pub const USAGE: &str = "Unknown command! Use: af, ab, as, bf, bb, bs, stop, q";

/// One parsed interactive command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Drive or stop a single motor.
    Motor {
        /// Which motor.
        motor: MotorId,
        /// Requested direction.
        direction: Direction,
    },
    /// Stop both motors.
    StopAll,
    /// Leave the session.
    Quit,
}

/// Input that is not a command word.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown command '{0}'")]
pub struct UnknownCommand(pub String);

impl Command {
    /// Parse one line. Blank input yields `Ok(None)`.
    ///
    /// ```
    /// use tb6612_bringup::{Command, Direction, MotorId};
    ///
    /// assert_eq!(
    ///     Command::parse(" AF ").unwrap(),
    ///     Some(Command::Motor { motor: MotorId::A, direction: Direction::Forward })
    /// );
    /// assert_eq!(Command::parse("stop").unwrap(), Some(Command::StopAll));
    /// assert_eq!(Command::parse("").unwrap(), None);
    /// assert!(Command::parse("go").is_err());
    /// ```
    pub fn parse(line: &str) -> Result<Option<Self>, UnknownCommand> {
        let word = line.trim().to_ascii_lowercase();
        let unknown = || UnknownCommand(word.clone());
        let cmd = match word.as_str() {
            "" => return Ok(None),
            "q" => Command::Quit,
            "stop" => Command::StopAll,
            w if w.len() == 2 && w.is_ascii() => {
                let (m, d) = w.split_at(1);
                let motor = match m {
                    "a" => MotorId::A,
                    "b" => MotorId::B,
                    _ => return Err(unknown()),
                };
                let direction = Direction::from_text(d).ok_or_else(unknown)?;
                Command::Motor { motor, direction }
            }
            _ => return Err(unknown()),
        };
        Ok(Some(cmd))
    }

    /// Execute against `driver`, using `speed` for motion commands.
    ///
    /// [`Command::Quit`] does nothing here; the caller ends its loop.
    pub fn apply<G: Gpio>(self, driver: &mut Tb6612<G>, speed: i32) -> Result<(), DriverError> {
        match self {
            Command::Motor {
                motor,
                direction: Direction::Stopped,
            } => driver.stop(motor),
            Command::Motor { motor, direction } => driver.drive(motor, direction, speed),
            Command::StopAll => driver.stop_all(),
            Command::Quit => Ok(()),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Motor { motor, direction } => {
                let d = match direction {
                    Direction::Forward => "f",
                    Direction::Backward => "b",
                    Direction::Stopped => "s",
                };
                write!(f, "{}{d}", motor.to_string().to_ascii_lowercase())
            }
            Command::StopAll => f.write_str("stop"),
            Command::Quit => f.write_str("q"),
        }
    }
}
