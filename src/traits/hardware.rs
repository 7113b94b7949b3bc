//! Hardware abstraction traits for GPIO access and timing.
//!
//! This module defines the capability set every GPIO binding provides, so the
//! TB6612FNG driver can run unchanged against real pins, the pigpio daemon,
//! or the desktop simulation.
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`Gpio`] | Digital pin configuration, reads/writes and per-pin PWM |
//! | [`Delay`] | Blocking delay between demo steps |
//!
//! # Implementation
//!
//! For testing and desktop development, use [`crate::hal::SimGpio`]. On a
//! Raspberry Pi use `hal::RppalGpio` (requires `rpi` feature) or
//! [`crate::hal::PigpiodGpio`] when the pigpio daemon is running.
//!
//! # Example
//!
//! ```rust
//! use tb6612_bringup::traits::{Gpio, Level, PinMode};
//! use tb6612_bringup::hal::SimGpio;
//!
//! let mut gpio = SimGpio::new();
//! gpio.configure(24, PinMode::Output).unwrap();
//! gpio.write(24, Level::High).unwrap();
//! assert_eq!(gpio.read(24).unwrap(), Level::High);
//! ```

/// Direction a motor is driven in.
///
/// Maps onto the two H-bridge inputs of one TB6612FNG channel.
///
/// # Default
///
/// Defaults to [`Stopped`](Self::Stopped) for safety.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    /// IN1 high, IN2 low.
    Forward,
    /// IN1 low, IN2 high.
    Backward,
    /// Both inputs low, duty cycle zero.
    #[default]
    Stopped,
}

impl Direction {
    /// Returns the direction as a lowercase string.
    ///
    /// # Examples
    ///
    /// ```
    /// use tb6612_bringup::Direction;
    ///
    /// assert_eq!(Direction::Forward.as_str(), "forward");
    /// assert_eq!(Direction::Backward.as_str(), "backward");
    /// assert_eq!(Direction::Stopped.as_str(), "stopped");
    /// ```
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Backward => "backward",
            Direction::Stopped => "stopped",
        }
    }

    /// Parse direction from text input.
    ///
    /// Accepts full names, the abbreviations `fwd`/`back`/`stop` and the
    /// single letters `f`/`b`/`s` used by the interactive commands.
    /// Input is trimmed and case-insensitive.
    ///
    /// ```
    /// use tb6612_bringup::Direction;
    ///
    /// assert_eq!(Direction::from_text("Forward"), Some(Direction::Forward));
    /// assert_eq!(Direction::from_text(" b "), Some(Direction::Backward));
    /// assert_eq!(Direction::from_text("stop"), Some(Direction::Stopped));
    /// assert_eq!(Direction::from_text("sideways"), None);
    /// ```
    pub fn from_text(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forward" | "fwd" | "f" => Some(Direction::Forward),
            "backward" | "back" | "b" => Some(Direction::Backward),
            "stopped" | "stop" | "s" => Some(Direction::Stopped),
            _ => None,
        }
    }

    /// Direction pin levels `(in1, in2)` for this direction.
    #[inline]
    pub const fn pin_levels(&self) -> (Level, Level) {
        match self {
            Direction::Forward => (Level::High, Level::Low),
            Direction::Backward => (Level::Low, Level::High),
            Direction::Stopped => (Level::Low, Level::Low),
        }
    }
}

/// Logic level of a digital pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Level {
    /// Driven to ground.
    #[default]
    Low,
    /// Driven to the supply rail.
    High,
}

impl Level {
    /// Returns `true` for [`Level::High`].
    #[inline]
    pub const fn is_high(&self) -> bool {
        matches!(self, Level::High)
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// Pin direction requested from the binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinMode {
    /// Input (the state pins are returned to when released).
    Input,
    /// Push-pull output, initially driven low.
    Output,
}

/// GPIO capability set required by the motor driver.
///
/// Pins are addressed by BCM number. PWM runs on an output pin and takes a
/// duty cycle in whole percent (`0..=100`); bindings scale it to their own
/// range.
///
/// # Implementation Notes
///
/// - `configure(pin, PinMode::Output)` must leave the pin driven low
/// - `pwm_stop` must leave the pin low
/// - `release` returns the pin to the binding and must tolerate pins that
///   were never configured
///
/// # Example Implementation
///
/// ```rust,ignore
/// use tb6612_bringup::traits::{Gpio, Level, PinMode};
///
/// struct MyBoard { /* register handles */ }
///
/// impl Gpio for MyBoard {
///     type Error = std::io::Error;
///
///     fn configure(&mut self, pin: u8, mode: PinMode) -> Result<(), Self::Error> {
///         // Set function select bits...
///         Ok(())
///     }
///
///     // ...
/// }
/// ```
pub trait Gpio {
    /// Error type for pin operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Configure `pin` as input or output.
    fn configure(&mut self, pin: u8, mode: PinMode) -> Result<(), Self::Error>;

    /// Drive an output pin.
    fn write(&mut self, pin: u8, level: Level) -> Result<(), Self::Error>;

    /// Read the current level of a pin.
    fn read(&mut self, pin: u8) -> Result<Level, Self::Error>;

    /// Set the PWM frequency used by the next `pwm_start`.
    fn pwm_set_frequency(&mut self, pin: u8, hz: u32) -> Result<(), Self::Error>;

    /// Start PWM output at `duty` percent.
    fn pwm_start(&mut self, pin: u8, duty: u8) -> Result<(), Self::Error>;

    /// Change the duty cycle of a running PWM channel.
    fn pwm_set_duty(&mut self, pin: u8, duty: u8) -> Result<(), Self::Error>;

    /// Stop PWM output and leave the pin low.
    fn pwm_stop(&mut self, pin: u8) -> Result<(), Self::Error>;

    /// Give the pin back to the binding.
    fn release(&mut self, pin: u8) -> Result<(), Self::Error>;
}

/// Blocking delay used between scripted demo steps.
///
/// On the target this is `std::thread::sleep`; tests use
/// [`crate::hal::MockDelay`] so scripts run instantly.
pub trait Delay {
    /// Block for the specified number of milliseconds.
    fn delay_ms(&mut self, ms: u64);
}
