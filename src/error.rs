//! Error and teardown report types for the motor driver.

use core::fmt;

use crate::motor::MotorId;
use crate::pins::PinRole;

/// Boxed binding error carried as the source of a [`DriverError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Lifecycle phase of a [`Tb6612`](crate::Tb6612) driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DriverPhase {
    /// Constructed; no pins claimed yet.
    #[default]
    Idle,
    /// Standby is high and both motors accept commands.
    Enabled,
    /// Torn down; may be initialized again.
    ShutDown,
}

impl fmt::Display for DriverPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DriverPhase::Idle => "idle",
            DriverPhase::Enabled => "enabled",
            DriverPhase::ShutDown => "shut down",
        })
    }
}

/// Bring-up step that failed during `initialize()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitStep {
    /// Claiming a pin as an output.
    ConfigurePin,
    /// Setting the PWM carrier frequency.
    PwmFrequency,
    /// Starting a PWM channel at 0 %.
    PwmStart,
    /// Raising STBY.
    EnableStandby,
}

impl fmt::Display for InitStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InitStep::ConfigurePin => "configuring output",
            InitStep::PwmFrequency => "setting PWM frequency",
            InitStep::PwmStart => "starting PWM",
            InitStep::EnableStandby => "enabling standby",
        })
    }
}

/// Errors returned by the motor driver.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// A bring-up step failed. Standby was driven low before returning.
    #[error("initialization failed while {step} on {role} (pin {pin})")]
    Init {
        /// Step that failed.
        step: InitStep,
        /// Role of the pin involved.
        role: PinRole,
        /// BCM pin number.
        pin: u8,
        /// Binding error.
        #[source]
        source: BoxError,
    },

    /// A pin write during a motor command failed.
    #[error("motor {motor}: write to {role} (pin {pin}) failed")]
    Write {
        /// Motor being commanded.
        motor: MotorId,
        /// Role of the pin involved.
        role: PinRole,
        /// BCM pin number.
        pin: u8,
        /// Binding error.
        #[source]
        source: BoxError,
    },

    /// Reading back a pin failed.
    #[error("read of {role} (pin {pin}) failed")]
    Read {
        /// Role of the pin involved.
        role: PinRole,
        /// BCM pin number.
        pin: u8,
        /// Binding error.
        #[source]
        source: BoxError,
    },

    /// A motor command was issued while standby is not raised.
    #[error("driver is not enabled (currently {phase})")]
    NotEnabled {
        /// Phase the driver was in.
        phase: DriverPhase,
    },

    /// Requested speed outside `0..=100` under [`SpeedPolicy::Reject`].
    ///
    /// [`SpeedPolicy::Reject`]: crate::SpeedPolicy::Reject
    #[error("speed {requested} is outside 0-100")]
    SpeedOutOfRange {
        /// The raw value that was requested.
        requested: i32,
    },
}

/// Teardown step recorded in a [`ShutdownReport`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TeardownStep {
    /// Driving a direction pin low or a duty cycle to zero.
    StopMotor,
    /// Stopping a PWM channel.
    StopPwm,
    /// Lowering STBY.
    DisableStandby,
    /// Returning a pin to the binding.
    ReleasePin,
}

impl fmt::Display for TeardownStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TeardownStep::StopMotor => "stop motor",
            TeardownStep::StopPwm => "stop PWM",
            TeardownStep::DisableStandby => "disable standby",
            TeardownStep::ReleasePin => "release pin",
        })
    }
}

/// One teardown step that failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TeardownFailure {
    /// What was being attempted.
    pub step: TeardownStep,
    /// Role of the pin involved.
    pub role: PinRole,
    /// BCM pin number.
    pub pin: u8,
    /// Rendered binding error.
    pub message: String,
}

impl fmt::Display for TeardownFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} on {} (pin {}): {}",
            self.step, self.role, self.pin, self.message
        )
    }
}

/// Outcome of [`Tb6612::shutdown`](crate::Tb6612::shutdown).
///
/// Every step is attempted regardless of earlier failures; the ones that
/// failed are collected here.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Failed steps in the order they were attempted.
    pub failures: Vec<TeardownFailure>,
}

impl ShutdownReport {
    /// Returns `true` when every step succeeded.
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub(crate) fn record(
        &mut self,
        step: TeardownStep,
        role: PinRole,
        pin: u8,
        err: &dyn std::error::Error,
    ) {
        log::warn!("teardown: {step} on {role} (pin {pin}) failed: {err}");
        self.failures.push(TeardownFailure {
            step,
            role,
            pin,
            message: err.to_string(),
        });
    }
}

impl fmt::Display for ShutdownReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_clean() {
            return f.write_str("clean shutdown");
        }
        write!(f, "{} teardown step(s) failed", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "; {failure}")?;
        }
        Ok(())
    }
}
