//! GPIO binding implementations.
//!
//! This module contains concrete implementations of the traits
//! defined in [`crate::traits`].
//!
//! # Available Implementations
//!
//! - `sim`: In-memory GPIO, used on development machines and in tests
//! - `pigpiod`: Client for the pigpio daemon socket interface
//! - `rpi`: Native Raspberry Pi GPIO via rppal (requires `rpi` feature)
//! - `mock`: Test doubles for delays and sockets

mod delay;
pub mod mock;
pub mod pigpiod;
mod sim;

#[cfg(feature = "rpi")]
mod rpi;

pub use delay::StdDelay;
pub use mock::*;
pub use pigpiod::{PigpiodError, PigpiodGpio};
pub use sim::{GpioEvent, SimError, SimGpio, SimOp};

#[cfg(feature = "rpi")]
pub use rpi::{RppalError, RppalGpio};
