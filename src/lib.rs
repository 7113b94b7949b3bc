//! # tb6612-bringup
//!
//! Bring-up driver for a TB6612FNG dual H-bridge wired to single-board
//! computer GPIO.
//!
//! ## Features
//!
//! - **Explicit lifecycle**: construct, initialize, command, shut down; safe
//!   after partial bring-up and idempotent on repeat
//! - **Shoot-through safe writes**: direction inputs never pass through
//!   (high, high) while changing direction
//! - **Pluggable GPIO**: one [`Gpio`] trait with a simulation backend, a
//!   pigpio daemon client and native rppal pins (`rpi` feature)
//! - **Bench tooling**: a scripted demo and a line-driven interactive session
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - GPIO and delay abstractions
//! - `pins` - Pin roles and the pin map
//! - `motor` - Per-channel write sequence and speed handling
//! - `driver` - The [`Tb6612`] controller
//! - `shared` - Mutex-guarded handle for the interrupt handler
//! - `commands` / `interactive` / `demo` - Bench sessions
//! - `hal` - Concrete bindings (sim, pigpiod, rppal) and test doubles
//!
//! ## Example
//!
//! ```rust
//! use tb6612_bringup::{hal::SimGpio, Direction, Level, MotorId, PinMap, Tb6612};
//!
//! let pins = PinMap::default();
//! let mut driver = Tb6612::new(SimGpio::new(), pins);
//! driver.initialize().unwrap();
//!
//! driver.forward(MotorId::A, 30).unwrap();
//! assert_eq!(driver.gpio().level(pins.ain1), Some(Level::High));
//! assert_eq!(driver.gpio().level(pins.ain2), Some(Level::Low));
//! assert_eq!(driver.gpio().duty(pins.pwma), Some(30));
//!
//! driver.stop(MotorId::A).unwrap();
//! assert_eq!(driver.motor_state(MotorId::A).direction, Direction::Stopped);
//!
//! assert!(driver.shutdown().is_clean());
//! ```

#![warn(missing_docs)]

/// Command words for the interactive session.
pub mod commands;
/// Application configuration with JSON loading.
pub mod config;
/// Scripted demo sequence.
pub mod demo;
/// The TB6612FNG controller.
pub mod driver;
/// Driver errors and teardown reports.
pub mod error;
/// GPIO bindings and test doubles.
pub mod hal;
/// Interactive session and start-up menu.
pub mod interactive;
/// Per-motor types and the H-bridge write sequence.
pub mod motor;
/// Pin roles and assignments.
pub mod pins;
/// Thread-safe driver handle.
pub mod shared;
/// Core traits for hardware abstraction.
pub mod traits;

// Re-exports for convenience
pub use commands::{Command, UnknownCommand, USAGE};
pub use config::{BackendKind, Config, ConfigError};
pub use demo::{run_demo, DemoScript};
pub use driver::{DriverState, Motor, Tb6612, DEFAULT_PWM_FREQUENCY_HZ};
pub use error::{
    DriverError, DriverPhase, InitStep, ShutdownReport, TeardownFailure, TeardownStep,
};
pub use interactive::{run_interactive, Mode, SessionError, SessionSummary};
pub use motor::{MotorId, MotorState, Speed, SpeedPolicy};
pub use pins::{PinMap, PinMapError, PinRole};
pub use shared::SharedDriver;
pub use traits::{Delay, Direction, Gpio, Level, PinMode};
