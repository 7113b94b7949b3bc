//! Trait definitions for hardware abstraction.
//!
//! This module defines the seams that let the TB6612FNG driver:
//! - Run against different GPIO bindings (rppal, pigpio daemon, simulation)
//! - Replace wall-clock delays in scripted sequences during tests
//!
//! # Hardware Abstraction
//!
//! - [`Gpio`]: pin configuration, digital writes/reads and PWM
//! - [`Delay`]: blocking delay between demo steps
//! - [`Direction`] and [`Level`]: the values that flow through them

pub mod hardware;

pub use hardware::*;
