//! Simulated GPIO for desktop development and tests.
//!
//! [`SimGpio`] keeps the mode, level and PWM state of every claimed pin in
//! memory, logs each operation at `debug` level (target `gpio::sim`) and
//! records it in an event history. Nothing touches real hardware.
//!
//! Failures can be injected per operation and pin to exercise the driver's
//! error paths.
//!
//! # Example
//!
//! ```rust
//! use tb6612_bringup::hal::{GpioEvent, SimGpio, SimOp};
//! use tb6612_bringup::traits::{Gpio, Level, PinMode};
//!
//! let mut gpio = SimGpio::new();
//! gpio.configure(12, PinMode::Output).unwrap();
//! gpio.pwm_set_frequency(12, 1000).unwrap();
//! gpio.pwm_start(12, 0).unwrap();
//! gpio.pwm_set_duty(12, 40).unwrap();
//! assert_eq!(gpio.duty(12), Some(40));
//! assert_eq!(gpio.frequency(12), Some(1000));
//!
//! gpio.fail_on(SimOp::Write, 16);
//! gpio.configure(16, PinMode::Output).unwrap();
//! assert!(gpio.write(16, Level::High).is_err());
//! ```

use std::collections::{BTreeMap, HashSet};

use crate::traits::{Gpio, Level, PinMode};

const LOG_TARGET: &str = "gpio::sim";

/// Operation kinds that can be made to fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SimOp {
    /// `configure`
    Configure,
    /// `write`
    Write,
    /// `read`
    Read,
    /// `pwm_set_frequency`
    PwmFrequency,
    /// `pwm_start`
    PwmStart,
    /// `pwm_set_duty`
    PwmDuty,
    /// `pwm_stop`
    PwmStop,
    /// `release`
    Release,
}

/// Errors reported by [`SimGpio`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SimError {
    /// Failure requested through [`SimGpio::fail_on`].
    #[error("injected {op:?} failure on pin {pin}")]
    Injected {
        /// Operation that failed.
        op: SimOp,
        /// Pin it was applied to.
        pin: u8,
    },
    /// The pin was never configured (or was released).
    #[error("pin {0} is not configured")]
    NotConfigured(u8),
    /// The pin is configured as an input.
    #[error("pin {0} is not an output")]
    NotOutput(u8),
    /// `pwm_set_duty` on a channel that was never started.
    #[error("PWM is not running on pin {0}")]
    PwmNotRunning(u8),
    /// Duty cycle above 100 %.
    #[error("duty cycle {duty} is outside 0-100 on pin {pin}")]
    InvalidDuty {
        /// Pin the duty was written to.
        pin: u8,
        /// The rejected value.
        duty: u8,
    },
}

/// One recorded operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GpioEvent {
    /// Pin claimed with the given mode.
    Configure {
        /// BCM pin.
        pin: u8,
        /// Requested mode.
        mode: PinMode,
    },
    /// Level written.
    Write {
        /// BCM pin.
        pin: u8,
        /// Written level.
        level: Level,
    },
    /// PWM frequency set.
    PwmFrequency {
        /// BCM pin.
        pin: u8,
        /// Frequency in hertz.
        hz: u32,
    },
    /// PWM started.
    PwmStart {
        /// BCM pin.
        pin: u8,
        /// Initial duty in percent.
        duty: u8,
    },
    /// PWM duty changed.
    PwmDuty {
        /// BCM pin.
        pin: u8,
        /// New duty in percent.
        duty: u8,
    },
    /// PWM stopped.
    PwmStop {
        /// BCM pin.
        pin: u8,
    },
    /// Pin released.
    Release {
        /// BCM pin.
        pin: u8,
    },
}

#[derive(Clone, Copy, Debug)]
struct SimPin {
    mode: PinMode,
    level: Level,
    frequency: Option<u32>,
    duty: Option<u8>,
    pwm_running: bool,
}

/// In-memory GPIO binding.
#[derive(Debug, Default)]
pub struct SimGpio {
    pins: BTreeMap<u8, SimPin>,
    history: Vec<GpioEvent>,
    failures: HashSet<(SimOp, u8)>,
}

impl SimGpio {
    /// Creates a simulator with no pins claimed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every future `op` on `pin` fail until [`clear_failures`](Self::clear_failures).
    pub fn fail_on(&mut self, op: SimOp, pin: u8) {
        self.failures.insert((op, pin));
    }

    /// Shorthand for `fail_on(SimOp::Write, pin)`.
    pub fn fail_writes_to(&mut self, pin: u8) {
        self.fail_on(SimOp::Write, pin);
    }

    /// Remove all injected failures.
    pub fn clear_failures(&mut self) {
        self.failures.clear();
    }

    /// Every successful operation in order.
    pub fn history(&self) -> &[GpioEvent] {
        &self.history
    }

    /// Forget recorded events.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Current level of a claimed pin.
    pub fn level(&self, pin: u8) -> Option<Level> {
        self.pins.get(&pin).map(|p| p.level)
    }

    /// Last duty cycle written to a claimed pin, if PWM was ever started.
    pub fn duty(&self, pin: u8) -> Option<u8> {
        self.pins.get(&pin).and_then(|p| p.duty)
    }

    /// Configured PWM frequency of a claimed pin.
    pub fn frequency(&self, pin: u8) -> Option<u32> {
        self.pins.get(&pin).and_then(|p| p.frequency)
    }

    /// Returns `true` if PWM is currently running on `pin`.
    pub fn pwm_running(&self, pin: u8) -> bool {
        self.pins.get(&pin).is_some_and(|p| p.pwm_running)
    }

    /// Returns `true` if `pin` is currently claimed.
    pub fn is_configured(&self, pin: u8) -> bool {
        self.pins.contains_key(&pin)
    }

    /// Pins currently claimed, ascending.
    pub fn configured_pins(&self) -> Vec<u8> {
        self.pins.keys().copied().collect()
    }

    fn check(&self, op: SimOp, pin: u8) -> Result<(), SimError> {
        if self.failures.contains(&(op, pin)) {
            log::debug!(target: LOG_TARGET, "injecting {op:?} failure on pin {pin}");
            return Err(SimError::Injected { op, pin });
        }
        Ok(())
    }

    fn output_mut(&mut self, pin: u8) -> Result<&mut SimPin, SimError> {
        match self.pins.get_mut(&pin) {
            Some(p) if p.mode == PinMode::Output => Ok(p),
            Some(_) => Err(SimError::NotOutput(pin)),
            None => Err(SimError::NotConfigured(pin)),
        }
    }
}

impl Gpio for SimGpio {
    type Error = SimError;

    fn configure(&mut self, pin: u8, mode: PinMode) -> Result<(), SimError> {
        self.check(SimOp::Configure, pin)?;
        self.pins.insert(
            pin,
            SimPin {
                mode,
                level: Level::Low,
                frequency: None,
                duty: None,
                pwm_running: false,
            },
        );
        log::debug!(target: LOG_TARGET, "pin {pin} -> {mode:?}");
        self.history.push(GpioEvent::Configure { pin, mode });
        Ok(())
    }

    fn write(&mut self, pin: u8, level: Level) -> Result<(), SimError> {
        self.check(SimOp::Write, pin)?;
        self.output_mut(pin)?.level = level;
        log::debug!(target: LOG_TARGET, "pin {pin} = {level:?}");
        self.history.push(GpioEvent::Write { pin, level });
        Ok(())
    }

    fn read(&mut self, pin: u8) -> Result<Level, SimError> {
        self.check(SimOp::Read, pin)?;
        self.pins
            .get(&pin)
            .map(|p| p.level)
            .ok_or(SimError::NotConfigured(pin))
    }

    fn pwm_set_frequency(&mut self, pin: u8, hz: u32) -> Result<(), SimError> {
        self.check(SimOp::PwmFrequency, pin)?;
        self.output_mut(pin)?.frequency = Some(hz);
        log::debug!(target: LOG_TARGET, "pin {pin} PWM frequency {hz} Hz");
        self.history.push(GpioEvent::PwmFrequency { pin, hz });
        Ok(())
    }

    fn pwm_start(&mut self, pin: u8, duty: u8) -> Result<(), SimError> {
        self.check(SimOp::PwmStart, pin)?;
        if duty > 100 {
            return Err(SimError::InvalidDuty { pin, duty });
        }
        let p = self.output_mut(pin)?;
        p.duty = Some(duty);
        p.pwm_running = true;
        log::debug!(target: LOG_TARGET, "pin {pin} PWM start at {duty}%");
        self.history.push(GpioEvent::PwmStart { pin, duty });
        Ok(())
    }

    fn pwm_set_duty(&mut self, pin: u8, duty: u8) -> Result<(), SimError> {
        self.check(SimOp::PwmDuty, pin)?;
        if duty > 100 {
            return Err(SimError::InvalidDuty { pin, duty });
        }
        let p = self.output_mut(pin)?;
        if !p.pwm_running {
            return Err(SimError::PwmNotRunning(pin));
        }
        p.duty = Some(duty);
        log::debug!(target: LOG_TARGET, "pin {pin} PWM duty {duty}%");
        self.history.push(GpioEvent::PwmDuty { pin, duty });
        Ok(())
    }

    fn pwm_stop(&mut self, pin: u8) -> Result<(), SimError> {
        self.check(SimOp::PwmStop, pin)?;
        let p = self.output_mut(pin)?;
        p.pwm_running = false;
        p.duty = p.duty.map(|_| 0);
        p.level = Level::Low;
        log::debug!(target: LOG_TARGET, "pin {pin} PWM stop");
        self.history.push(GpioEvent::PwmStop { pin });
        Ok(())
    }

    fn release(&mut self, pin: u8) -> Result<(), SimError> {
        self.check(SimOp::Release, pin)?;
        if self.pins.remove(&pin).is_some() {
            log::debug!(target: LOG_TARGET, "pin {pin} released");
            self.history.push(GpioEvent::Release { pin });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configure_output_starts_low() {
        let mut gpio = SimGpio::new();
        gpio.configure(5, PinMode::Output).unwrap();
        assert_eq!(gpio.level(5), Some(Level::Low));
        assert_eq!(gpio.read(5).unwrap(), Level::Low);
        assert!(gpio.is_configured(5));
    }

    #[test]
    fn write_requires_output() {
        let mut gpio = SimGpio::new();
        assert_eq!(gpio.write(5, Level::High), Err(SimError::NotConfigured(5)));

        gpio.configure(5, PinMode::Input).unwrap();
        assert_eq!(gpio.write(5, Level::High), Err(SimError::NotOutput(5)));
    }

    #[test]
    fn read_unconfigured_pin_fails() {
        let mut gpio = SimGpio::new();
        assert_eq!(gpio.read(9), Err(SimError::NotConfigured(9)));
    }

    #[test]
    fn duty_requires_running_pwm() {
        let mut gpio = SimGpio::new();
        gpio.configure(12, PinMode::Output).unwrap();
        assert_eq!(gpio.pwm_set_duty(12, 10), Err(SimError::PwmNotRunning(12)));

        gpio.pwm_start(12, 0).unwrap();
        gpio.pwm_set_duty(12, 10).unwrap();
        assert_eq!(gpio.duty(12), Some(10));
    }

    #[test]
    fn duty_above_hundred_rejected() {
        let mut gpio = SimGpio::new();
        gpio.configure(12, PinMode::Output).unwrap();
        assert_eq!(
            gpio.pwm_start(12, 101),
            Err(SimError::InvalidDuty { pin: 12, duty: 101 })
        );
    }

    #[test]
    fn pwm_stop_zeroes_duty_and_is_repeatable() {
        let mut gpio = SimGpio::new();
        gpio.configure(12, PinMode::Output).unwrap();
        gpio.pwm_start(12, 70).unwrap();
        gpio.pwm_stop(12).unwrap();
        gpio.pwm_stop(12).unwrap();
        assert!(!gpio.pwm_running(12));
        assert_eq!(gpio.duty(12), Some(0));
        assert_eq!(gpio.level(12), Some(Level::Low));
    }

    #[test]
    fn release_unknown_pin_is_ok() {
        let mut gpio = SimGpio::new();
        gpio.release(3).unwrap();
        assert!(gpio.history().is_empty());

        gpio.configure(3, PinMode::Output).unwrap();
        gpio.release(3).unwrap();
        assert!(!gpio.is_configured(3));
        assert_eq!(gpio.history().last(), Some(&GpioEvent::Release { pin: 3 }));
    }

    #[test]
    fn injected_failure_not_recorded() {
        let mut gpio = SimGpio::new();
        gpio.fail_on(SimOp::Configure, 7);
        assert_eq!(
            gpio.configure(7, PinMode::Output),
            Err(SimError::Injected {
                op: SimOp::Configure,
                pin: 7
            })
        );
        assert!(gpio.history().is_empty());
        assert!(!gpio.is_configured(7));

        gpio.clear_failures();
        gpio.configure(7, PinMode::Output).unwrap();
        assert_eq!(gpio.configured_pins(), vec![7]);
    }
}
