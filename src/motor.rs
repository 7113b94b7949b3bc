//! Per-motor types and the H-bridge write sequence.
//!
//! Each TB6612FNG channel is driven by two direction inputs and one PWM
//! input. [`MotorChannel`] owns the pin numbers for one channel and turns a
//! `(direction, speed)` request into the three writes.
//!
//! # Write ordering
//!
//! The input going low is always written before the input going high, and
//! the duty cycle is written last. A direct Forward → Backward change
//! therefore passes through (low, low), never (high, high).

use core::fmt;

use crate::error::DriverError;
use crate::pins::{PinMap, PinRole};
use crate::traits::{Direction, Gpio, Level};

/// One of the two driver channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MotorId {
    /// Channel A (AIN1/AIN2/PWMA).
    A,
    /// Channel B (BIN1/BIN2/PWMB).
    B,
}

impl MotorId {
    /// Both channels in order.
    pub const ALL: [MotorId; 2] = [MotorId::A, MotorId::B];

    /// Roles `(in1, in2, pwm)` used by this channel.
    pub const fn roles(&self) -> (PinRole, PinRole, PinRole) {
        match self {
            MotorId::A => (PinRole::Ain1, PinRole::Ain2, PinRole::Pwma),
            MotorId::B => (PinRole::Bin1, PinRole::Bin2, PinRole::Pwmb),
        }
    }

    #[inline]
    pub(crate) const fn index(&self) -> usize {
        match self {
            MotorId::A => 0,
            MotorId::B => 1,
        }
    }
}

impl fmt::Display for MotorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MotorId::A => "A",
            MotorId::B => "B",
        })
    }
}

/// Speed as a whole percentage, always within `0..=100`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Speed(u8);

impl Speed {
    /// 0 %.
    pub const ZERO: Speed = Speed(0);
    /// 100 %.
    pub const MAX: Speed = Speed(100);

    /// Returns `None` when `percent` exceeds 100.
    pub const fn new(percent: u8) -> Option<Self> {
        if percent <= 100 {
            Some(Speed(percent))
        } else {
            None
        }
    }

    /// Clamp any integer into `0..=100`.
    ///
    /// ```
    /// use tb6612_bringup::Speed;
    ///
    /// assert_eq!(Speed::clamped(150).percent(), 100);
    /// assert_eq!(Speed::clamped(-20).percent(), 0);
    /// assert_eq!(Speed::clamped(42).percent(), 42);
    /// ```
    pub fn clamped(raw: i32) -> Self {
        Speed(raw.clamp(0, 100) as u8)
    }

    /// The percentage value.
    #[inline]
    pub const fn percent(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// What to do with a requested speed outside `0..=100`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SpeedPolicy {
    /// Clamp into range and log a warning.
    #[default]
    Clamp,
    /// Fail with [`DriverError::SpeedOutOfRange`].
    Reject,
}

impl SpeedPolicy {
    /// Turn a raw request into a [`Speed`] according to this policy.
    pub fn resolve(self, raw: i32) -> Result<Speed, DriverError> {
        if (0..=100).contains(&raw) {
            return Ok(Speed::clamped(raw));
        }
        match self {
            SpeedPolicy::Clamp => {
                let speed = Speed::clamped(raw);
                log::warn!("speed {raw} out of range, clamping to {}", speed.percent());
                Ok(speed)
            }
            SpeedPolicy::Reject => Err(DriverError::SpeedOutOfRange { requested: raw }),
        }
    }
}

/// Last applied command of one motor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotorState {
    /// Current direction.
    pub direction: Direction,
    /// Current duty cycle in percent.
    pub speed: u8,
}

impl MotorState {
    /// Returns `true` if the motor is being driven.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.direction != Direction::Stopped && self.speed > 0
    }
}

/// Pins and state of one driver channel.
#[derive(Clone, Debug)]
pub(crate) struct MotorChannel {
    id: MotorId,
    in1: u8,
    in2: u8,
    pwm: u8,
    state: MotorState,
}

impl MotorChannel {
    pub(crate) fn new(id: MotorId, pins: &PinMap) -> Self {
        let (in1, in2, pwm) = id.roles();
        Self {
            id,
            in1: pins.pin(in1),
            in2: pins.pin(in2),
            pwm: pins.pin(pwm),
            state: MotorState::default(),
        }
    }

    #[inline]
    pub(crate) fn state(&self) -> MotorState {
        self.state
    }

    /// Apply a direction and speed. `Stopped` always writes duty 0.
    ///
    /// If the first write fails nothing has changed and the previous state
    /// is kept. A failure after that leaves the channel half-switched, so it
    /// is forced to a stop and recorded as [`Direction::Stopped`].
    pub(crate) fn apply<G: Gpio>(
        &mut self,
        gpio: &mut G,
        direction: Direction,
        speed: Speed,
    ) -> Result<(), DriverError> {
        let duty = match direction {
            Direction::Stopped => 0,
            _ => speed.percent(),
        };

        let mut landed = 0;
        if let Err(err) = self.write_sequence(gpio, direction, duty, &mut landed) {
            if landed > 0 {
                log::warn!(
                    "motor {}: command failed after {landed} write(s), forcing stop",
                    self.id
                );
                self.force_stop(gpio);
            }
            return Err(err);
        }

        self.state = MotorState {
            direction,
            speed: duty,
        };
        log::debug!("motor {}: {} at {}%", self.id, direction.as_str(), duty);
        Ok(())
    }

    fn write_sequence<G: Gpio>(
        &self,
        gpio: &mut G,
        direction: Direction,
        duty: u8,
        landed: &mut usize,
    ) -> Result<(), DriverError> {
        let (in1_role, in2_role, pwm_role) = self.id.roles();
        let (in1_level, in2_level) = direction.pin_levels();

        let mut writes = [(in1_role, self.in1, in1_level), (in2_role, self.in2, in2_level)];
        // Low before high.
        writes.sort_by_key(|&(_, _, level)| level.is_high());
        for (role, pin, level) in writes {
            self.write(gpio, role, pin, level)?;
            *landed += 1;
        }
        gpio.pwm_set_duty(self.pwm, duty)
            .map_err(|e| self.write_error(pwm_role, self.pwm, e))?;
        *landed += 1;
        Ok(())
    }

    /// Best effort: both inputs low and duty 0, every write attempted.
    fn force_stop<G: Gpio>(&mut self, gpio: &mut G) {
        for pin in [self.in1, self.in2] {
            if let Err(err) = gpio.write(pin, Level::Low) {
                log::warn!("motor {}: could not drive pin {pin} low: {err}", self.id);
            }
        }
        if let Err(err) = gpio.pwm_set_duty(self.pwm, 0) {
            log::warn!(
                "motor {}: could not zero duty on pin {}: {err}",
                self.id,
                self.pwm
            );
        }
        self.state = MotorState::default();
    }

    /// Force the bookkeeping to `Stopped` after teardown.
    pub(crate) fn reset(&mut self) {
        self.state = MotorState::default();
    }

    fn write<G: Gpio>(
        &self,
        gpio: &mut G,
        role: PinRole,
        pin: u8,
        level: Level,
    ) -> Result<(), DriverError> {
        gpio.write(pin, level)
            .map_err(|e| self.write_error(role, pin, e))
    }

    fn write_error<E: std::error::Error + Send + Sync + 'static>(
        &self,
        role: PinRole,
        pin: u8,
        source: E,
    ) -> DriverError {
        DriverError::Write {
            motor: self.id,
            role,
            pin,
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{GpioEvent, SimGpio};
    use crate::traits::PinMode;

    fn ready_sim(pins: &PinMap) -> SimGpio {
        let mut gpio = SimGpio::new();
        for (_, pin) in pins.assignments() {
            gpio.configure(pin, PinMode::Output).unwrap();
        }
        gpio.pwm_start(pins.pwma, 0).unwrap();
        gpio.pwm_start(pins.pwmb, 0).unwrap();
        gpio.clear_history();
        gpio
    }

    #[test]
    fn speed_new_bounds() {
        assert_eq!(Speed::new(0), Some(Speed::ZERO));
        assert_eq!(Speed::new(100), Some(Speed::MAX));
        assert_eq!(Speed::new(101), None);
    }

    #[test]
    fn speed_clamped_extremes() {
        assert_eq!(Speed::clamped(i32::MIN), Speed::ZERO);
        assert_eq!(Speed::clamped(i32::MAX), Speed::MAX);
    }

    #[test]
    fn clamp_policy_accepts_out_of_range() {
        assert_eq!(SpeedPolicy::Clamp.resolve(250).unwrap(), Speed::MAX);
        assert_eq!(SpeedPolicy::Clamp.resolve(-1).unwrap(), Speed::ZERO);
        assert_eq!(SpeedPolicy::Clamp.resolve(55).unwrap().percent(), 55);
    }

    #[test]
    fn reject_policy_refuses_out_of_range() {
        assert!(matches!(
            SpeedPolicy::Reject.resolve(101),
            Err(DriverError::SpeedOutOfRange { requested: 101 })
        ));
        assert!(SpeedPolicy::Reject.resolve(100).is_ok());
        assert!(SpeedPolicy::Reject.resolve(0).is_ok());
    }

    #[test]
    fn motor_id_roles() {
        assert_eq!(
            MotorId::A.roles(),
            (PinRole::Ain1, PinRole::Ain2, PinRole::Pwma)
        );
        assert_eq!(
            MotorId::B.roles(),
            (PinRole::Bin1, PinRole::Bin2, PinRole::Pwmb)
        );
        assert_eq!(MotorId::B.to_string(), "B");
    }

    #[test]
    fn apply_writes_low_pin_first() {
        let pins = PinMap::default();
        let mut gpio = ready_sim(&pins);
        let mut channel = MotorChannel::new(MotorId::A, &pins);

        channel
            .apply(&mut gpio, Direction::Backward, Speed::clamped(30))
            .unwrap();

        assert_eq!(
            gpio.history(),
            &[
                GpioEvent::Write {
                    pin: pins.ain1,
                    level: Level::Low
                },
                GpioEvent::Write {
                    pin: pins.ain2,
                    level: Level::High
                },
                GpioEvent::PwmDuty {
                    pin: pins.pwma,
                    duty: 30
                },
            ]
        );
        assert_eq!(
            channel.state(),
            MotorState {
                direction: Direction::Backward,
                speed: 30
            }
        );
    }

    #[test]
    fn stopped_ignores_speed() {
        let pins = PinMap::default();
        let mut gpio = ready_sim(&pins);
        let mut channel = MotorChannel::new(MotorId::B, &pins);

        channel
            .apply(&mut gpio, Direction::Stopped, Speed::MAX)
            .unwrap();
        assert_eq!(gpio.duty(pins.pwmb), Some(0));
        assert!(!channel.state().is_running());
    }

    #[test]
    fn failed_write_keeps_previous_state() {
        let pins = PinMap::default();
        let mut gpio = ready_sim(&pins);
        let mut channel = MotorChannel::new(MotorId::A, &pins);
        gpio.fail_writes_to(pins.ain1);

        let err = channel
            .apply(&mut gpio, Direction::Forward, Speed::clamped(50))
            .unwrap_err();
        assert!(matches!(
            err,
            DriverError::Write {
                motor: MotorId::A,
                role: PinRole::Ain1,
                ..
            }
        ));
        assert_eq!(channel.state(), MotorState::default());
    }

    #[test]
    fn failure_after_first_write_forces_stop() {
        let pins = PinMap::default();
        let mut gpio = ready_sim(&pins);
        let mut channel = MotorChannel::new(MotorId::A, &pins);
        channel
            .apply(&mut gpio, Direction::Forward, Speed::clamped(50))
            .unwrap();

        // Reversal drives AIN1 low, then fails on AIN2.
        gpio.fail_writes_to(pins.ain2);
        let err = channel
            .apply(&mut gpio, Direction::Backward, Speed::clamped(50))
            .unwrap_err();

        assert!(matches!(
            err,
            DriverError::Write {
                role: PinRole::Ain2,
                ..
            }
        ));
        assert_eq!(channel.state(), MotorState::default());
        assert_eq!(gpio.level(pins.ain1), Some(Level::Low));
        assert_eq!(gpio.level(pins.ain2), Some(Level::Low));
        assert_eq!(gpio.duty(pins.pwma), Some(0));
    }

    #[test]
    fn failed_duty_forces_stop() {
        let pins = PinMap::default();
        let mut gpio = ready_sim(&pins);
        let mut channel = MotorChannel::new(MotorId::B, &pins);
        channel
            .apply(&mut gpio, Direction::Backward, Speed::clamped(40))
            .unwrap();

        gpio.fail_on(crate::hal::SimOp::PwmDuty, pins.pwmb);
        assert!(channel
            .apply(&mut gpio, Direction::Forward, Speed::clamped(80))
            .is_err());

        // Duty stays at 40 but both inputs are low, which is a stop.
        assert_eq!(channel.state().direction, Direction::Stopped);
        assert_eq!(gpio.level(pins.bin1), Some(Level::Low));
        assert_eq!(gpio.level(pins.bin2), Some(Level::Low));
    }
}
