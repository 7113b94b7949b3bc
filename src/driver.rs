//! TB6612FNG dual H-bridge driver.
//!
//! [`Tb6612`] owns a GPIO binding and the seven pins of one driver chip and
//! makes the lifecycle explicit:
//!
//! ```text
//!  new ──► initialize ──► forward/backward/stop ... ──► shutdown
//!  (Idle)   (Enabled)                                   (ShutDown)
//! ```
//!
//! # Example
//!
//! ```rust
//! use tb6612_bringup::{hal::SimGpio, Direction, MotorId, PinMap, Tb6612};
//!
//! let mut driver = Tb6612::new(SimGpio::new(), PinMap::default());
//! driver.initialize().unwrap();
//!
//! driver.motor(MotorId::A).forward(30).unwrap();
//! assert_eq!(driver.motor_state(MotorId::A).direction, Direction::Forward);
//! assert_eq!(driver.motor_state(MotorId::A).speed, 30);
//!
//! let report = driver.shutdown();
//! assert!(report.is_clean());
//! assert!(!driver.is_enabled());
//! ```
//!
//! # Teardown
//!
//! [`Tb6612::shutdown`] attempts every step independently and collects
//! failures into a [`ShutdownReport`]. It only touches what bring-up
//! actually claimed, so it is safe after a failed `initialize()` and safe to
//! call repeatedly. Dropping the driver runs it too.

use crate::config::Config;
use crate::error::{DriverError, DriverPhase, InitStep, ShutdownReport, TeardownStep};
use crate::motor::{MotorChannel, MotorId, MotorState, Speed, SpeedPolicy};
use crate::pins::{PinMap, PinRole};
use crate::traits::{Direction, Gpio, Level, PinMode};

/// Default PWM carrier frequency.
pub const DEFAULT_PWM_FREQUENCY_HZ: u32 = 1000;

/// Snapshot of the driver for status output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DriverState {
    /// Lifecycle phase.
    pub phase: DriverPhase,
    /// Whether STBY is currently driven high.
    pub enabled: bool,
    /// Motor A.
    pub motor_a: MotorState,
    /// Motor B.
    pub motor_b: MotorState,
}

/// TB6612FNG driver.
///
/// # Type Parameter
///
/// - `G`: The GPIO binding ([`Gpio`] trait)
///
/// # Thread Safety
///
/// The driver itself is not synchronized. When a second thread needs access
/// (the interrupt handler in the CLI), wrap it in
/// [`SharedDriver`](crate::SharedDriver) so pin writes are serialized.
pub struct Tb6612<G: Gpio> {
    gpio: G,
    pins: PinMap,
    pwm_frequency_hz: u32,
    speed_policy: SpeedPolicy,
    motors: [MotorChannel; 2],
    phase: DriverPhase,
    claimed: heapless::Vec<PinRole, 7>,
    pwm_started: [bool; 2],
    standby_high: bool,
}

impl<G: Gpio> Tb6612<G> {
    /// Create an idle driver. No pins are touched until [`initialize`](Self::initialize).
    pub fn new(gpio: G, pins: PinMap) -> Self {
        Self {
            gpio,
            pins,
            pwm_frequency_hz: DEFAULT_PWM_FREQUENCY_HZ,
            speed_policy: SpeedPolicy::default(),
            motors: [
                MotorChannel::new(MotorId::A, &pins),
                MotorChannel::new(MotorId::B, &pins),
            ],
            phase: DriverPhase::Idle,
            claimed: heapless::Vec::new(),
            pwm_started: [false; 2],
            standby_high: false,
        }
    }

    /// Create a driver using the pins, PWM frequency and speed policy from `config`.
    pub fn from_config(gpio: G, config: &Config) -> Self {
        Self::new(gpio, config.pins)
            .with_pwm_frequency(config.pwm.frequency_hz)
            .with_speed_policy(config.speed.policy)
    }

    /// Set the PWM carrier frequency used at initialization.
    pub fn with_pwm_frequency(mut self, hz: u32) -> Self {
        self.pwm_frequency_hz = hz;
        self
    }

    /// Set how out-of-range speeds are handled.
    pub fn with_speed_policy(mut self, policy: SpeedPolicy) -> Self {
        self.speed_policy = policy;
        self
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Claim all pins, start both PWM channels at 0 % and raise standby.
    ///
    /// Standby is claimed first and held low; it is raised only after both
    /// PWM channels run at a defined 0 % duty. On failure standby is driven
    /// low again (best effort) and the failing step is returned. Claimed pins
    /// stay tracked so [`shutdown`](Self::shutdown) can release them.
    ///
    /// Calling this on an enabled driver does nothing.
    pub fn initialize(&mut self) -> Result<(), DriverError> {
        if self.phase == DriverPhase::Enabled {
            return Ok(());
        }

        log::info!("initializing TB6612FNG ({})", self.pins);
        if let Err(err) = self.bring_up() {
            log::error!("{err}");
            self.hold_standby_low();
            return Err(err);
        }

        self.phase = DriverPhase::Enabled;
        log::info!("motor driver enabled (STBY high)");
        Ok(())
    }

    fn bring_up(&mut self) -> Result<(), DriverError> {
        for (role, pin) in self.pins.assignments() {
            self.gpio
                .configure(pin, PinMode::Output)
                .map_err(|e| init_error(InitStep::ConfigurePin, role, pin, e))?;
            if !self.claimed.contains(&role) {
                // Capacity matches PinRole::ALL.
                let _ = self.claimed.push(role);
            }
        }

        for id in MotorId::ALL {
            let (_, _, role) = id.roles();
            let pin = self.pins.pin(role);
            self.gpio
                .pwm_set_frequency(pin, self.pwm_frequency_hz)
                .map_err(|e| init_error(InitStep::PwmFrequency, role, pin, e))?;
            self.gpio
                .pwm_start(pin, 0)
                .map_err(|e| init_error(InitStep::PwmStart, role, pin, e))?;
            self.pwm_started[id.index()] = true;
        }

        let pin = self.pins.stby;
        self.gpio
            .write(pin, Level::High)
            .map_err(|e| init_error(InitStep::EnableStandby, PinRole::Stby, pin, e))?;
        self.standby_high = true;
        Ok(())
    }

    fn hold_standby_low(&mut self) {
        if !self.claimed.contains(&PinRole::Stby) {
            return;
        }
        match self.gpio.write(self.pins.stby, Level::Low) {
            Ok(()) => self.standby_high = false,
            Err(e) => log::warn!("could not drive STBY low after failed bring-up: {e}"),
        }
    }

    /// Stop both motors, lower standby and release every claimed pin.
    ///
    /// Never fails: each step is attempted even if an earlier one failed,
    /// and failures are collected in the returned report. A second call
    /// finds nothing claimed and returns a clean report.
    pub fn shutdown(&mut self) -> ShutdownReport {
        let mut report = ShutdownReport::default();
        if self.claimed.is_empty() && self.phase != DriverPhase::Enabled {
            self.phase = DriverPhase::ShutDown;
            return report;
        }

        log::info!("shutting down motor driver");
        for id in MotorId::ALL {
            self.force_stop(id, &mut report);
        }

        for id in MotorId::ALL {
            if !self.pwm_started[id.index()] {
                continue;
            }
            let (_, _, role) = id.roles();
            let pin = self.pins.pin(role);
            if let Err(e) = self.gpio.pwm_stop(pin) {
                report.record(TeardownStep::StopPwm, role, pin, &e);
            }
            self.pwm_started[id.index()] = false;
        }

        if self.claimed.contains(&PinRole::Stby) {
            let pin = self.pins.stby;
            if let Err(e) = self.gpio.write(pin, Level::Low) {
                report.record(TeardownStep::DisableStandby, PinRole::Stby, pin, &e);
            }
        }
        self.standby_high = false;

        while let Some(role) = self.claimed.pop() {
            let pin = self.pins.pin(role);
            if let Err(e) = self.gpio.release(pin) {
                report.record(TeardownStep::ReleasePin, role, pin, &e);
            }
        }

        self.phase = DriverPhase::ShutDown;
        if report.is_clean() {
            log::info!("GPIO cleanup complete");
        } else {
            log::warn!("GPIO cleanup finished with errors: {report}");
        }
        report
    }

    /// Drive a motor's pins to the stopped state during teardown, one
    /// write at a time.
    fn force_stop(&mut self, id: MotorId, report: &mut ShutdownReport) {
        let (in1, in2, pwm) = id.roles();
        for role in [in1, in2] {
            if self.claimed.contains(&role) {
                let pin = self.pins.pin(role);
                if let Err(e) = self.gpio.write(pin, Level::Low) {
                    report.record(TeardownStep::StopMotor, role, pin, &e);
                }
            }
        }
        if self.pwm_started[id.index()] {
            let pin = self.pins.pin(pwm);
            if let Err(e) = self.gpio.pwm_set_duty(pin, 0) {
                report.record(TeardownStep::StopMotor, pwm, pin, &e);
            }
        }
        self.motors[id.index()].reset();
    }

    // ------------------------------------------------------------------------
    // Motor commands
    // ------------------------------------------------------------------------

    /// Handle for commanding one motor.
    pub fn motor(&mut self, id: MotorId) -> Motor<'_, G> {
        Motor { driver: self, id }
    }

    /// Drive `motor` forward at `speed` percent.
    pub fn forward(&mut self, motor: MotorId, speed: i32) -> Result<(), DriverError> {
        self.drive(motor, Direction::Forward, speed)
    }

    /// Drive `motor` backward at `speed` percent.
    pub fn backward(&mut self, motor: MotorId, speed: i32) -> Result<(), DriverError> {
        self.drive(motor, Direction::Backward, speed)
    }

    /// Both inputs low and duty 0.
    ///
    /// On a driver that is not enabled this does nothing: standby is low, so
    /// the motor already draws no drive current.
    pub fn stop(&mut self, motor: MotorId) -> Result<(), DriverError> {
        if self.phase != DriverPhase::Enabled {
            log::debug!("motor {motor}: stop ignored, driver {}", self.phase);
            return Ok(());
        }
        self.drive(motor, Direction::Stopped, 0)
    }

    /// Stop motor A, then motor B. Both are attempted; the first error is
    /// returned.
    pub fn stop_all(&mut self) -> Result<(), DriverError> {
        let a = self.stop(MotorId::A);
        let b = self.stop(MotorId::B);
        a.and(b)
    }

    /// Apply `direction` at `speed` percent to one motor.
    ///
    /// `speed` is resolved through the configured [`SpeedPolicy`]; it is
    /// ignored for [`Direction::Stopped`].
    pub fn drive(
        &mut self,
        motor: MotorId,
        direction: Direction,
        speed: i32,
    ) -> Result<(), DriverError> {
        if self.phase != DriverPhase::Enabled {
            return Err(DriverError::NotEnabled { phase: self.phase });
        }
        let speed = match direction {
            Direction::Stopped => Speed::ZERO,
            _ => self.speed_policy.resolve(speed)?,
        };

        self.motors[motor.index()].apply(&mut self.gpio, direction, speed)?;

        match direction {
            Direction::Forward => log::info!("Motor {motor}: Forward at {speed} speed"),
            Direction::Backward => log::info!("Motor {motor}: Backward at {speed} speed"),
            Direction::Stopped => log::info!("Motor {motor}: Stopped"),
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------------

    /// Last applied state of one motor.
    pub fn motor_state(&self, id: MotorId) -> MotorState {
        self.motors[id.index()].state()
    }

    /// Snapshot of the whole driver.
    pub fn state(&self) -> DriverState {
        DriverState {
            phase: self.phase,
            enabled: self.standby_high,
            motor_a: self.motor_state(MotorId::A),
            motor_b: self.motor_state(MotorId::B),
        }
    }

    /// Current lifecycle phase.
    #[inline]
    pub fn phase(&self) -> DriverPhase {
        self.phase
    }

    /// Returns `true` while standby is driven high.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.standby_high
    }

    /// The pin map in use.
    #[inline]
    pub fn pins(&self) -> &PinMap {
        &self.pins
    }

    /// PWM carrier frequency in hertz.
    #[inline]
    pub fn pwm_frequency_hz(&self) -> u32 {
        self.pwm_frequency_hz
    }

    /// Speed policy in use.
    #[inline]
    pub fn speed_policy(&self) -> SpeedPolicy {
        self.speed_policy
    }

    /// Read the level of one role's pin back from the binding.
    pub fn read_pin(&mut self, role: PinRole) -> Result<Level, DriverError> {
        let pin = self.pins.pin(role);
        self.gpio.read(pin).map_err(|e| DriverError::Read {
            role,
            pin,
            source: Box::new(e),
        })
    }

    /// Shared access to the binding.
    #[inline]
    pub fn gpio(&self) -> &G {
        &self.gpio
    }

    /// Mutable access to the binding.
    ///
    /// Writing pins directly bypasses the driver's bookkeeping.
    #[inline]
    pub fn gpio_mut(&mut self) -> &mut G {
        &mut self.gpio
    }
}

impl<G: Gpio> Drop for Tb6612<G> {
    fn drop(&mut self) {
        if !self.claimed.is_empty() || self.standby_high {
            let _ = self.shutdown();
        }
    }
}

fn init_error<E>(step: InitStep, role: PinRole, pin: u8, source: E) -> DriverError
where
    E: std::error::Error + Send + Sync + 'static,
{
    DriverError::Init {
        step,
        role,
        pin,
        source: Box::new(source),
    }
}

/// Borrowed handle to one motor of a [`Tb6612`].
///
/// ```rust
/// use tb6612_bringup::{hal::SimGpio, MotorId, PinMap, Tb6612};
///
/// let mut driver = Tb6612::new(SimGpio::new(), PinMap::default());
/// driver.initialize().unwrap();
///
/// let mut b = driver.motor(MotorId::B);
/// b.backward(40).unwrap();
/// b.stop().unwrap();
/// assert_eq!(b.state().speed, 0);
/// ```
pub struct Motor<'a, G: Gpio> {
    driver: &'a mut Tb6612<G>,
    id: MotorId,
}

impl<G: Gpio> Motor<'_, G> {
    /// See [`Tb6612::forward`].
    pub fn forward(&mut self, speed: i32) -> Result<(), DriverError> {
        self.driver.forward(self.id, speed)
    }

    /// See [`Tb6612::backward`].
    pub fn backward(&mut self, speed: i32) -> Result<(), DriverError> {
        self.driver.backward(self.id, speed)
    }

    /// See [`Tb6612::stop`].
    pub fn stop(&mut self) -> Result<(), DriverError> {
        self.driver.stop(self.id)
    }

    /// Last applied state.
    pub fn state(&self) -> MotorState {
        self.driver.motor_state(self.id)
    }
}
