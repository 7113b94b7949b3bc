//! Scripted bring-up demo.
//!
//! Exercises each channel on its own, then both together:
//!
//! ```text
//! warm-up
//! === Testing Motor A ===     fwd, stop, back, stop
//! === Testing Motor B ===     fwd, stop, back, stop
//! === Testing Both Motors === both fwd, both back, turn left, turn right
//! stop all
//! ```
//!
//! The script is plain data ([`DemoScript`]) built from [`DemoConfig`], so
//! the sequence can be inspected without running it. [`run_demo`] plays it
//! through a [`SharedDriver`], holding the lock only while pins are written
//! and never across a delay.

use crate::config::DemoConfig;
use crate::driver::Tb6612;
use crate::error::DriverError;
use crate::motor::MotorId;
use crate::shared::SharedDriver;
use crate::traits::{Delay, Direction, Gpio};

/// One motor request inside a demo step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Action {
    /// Motor to command.
    pub motor: MotorId,
    /// Direction to apply.
    pub direction: Direction,
    /// Speed in percent (ignored for [`Direction::Stopped`]).
    pub speed: u8,
}

impl Action {
    /// Drive `motor` forward.
    pub const fn forward(motor: MotorId, speed: u8) -> Self {
        Self {
            motor,
            direction: Direction::Forward,
            speed,
        }
    }

    /// Drive `motor` backward.
    pub const fn backward(motor: MotorId, speed: u8) -> Self {
        Self {
            motor,
            direction: Direction::Backward,
            speed,
        }
    }

    /// Stop `motor`.
    pub const fn stop(motor: MotorId) -> Self {
        Self {
            motor,
            direction: Direction::Stopped,
            speed: 0,
        }
    }

    fn apply<G: Gpio>(&self, driver: &mut Tb6612<G>) -> Result<(), DriverError> {
        match self.direction {
            Direction::Stopped => driver.stop(self.motor),
            direction => driver.drive(self.motor, direction, i32::from(self.speed)),
        }
    }
}

/// One entry of a [`DemoScript`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DemoStep {
    /// Section banner, logged only.
    Section(&'static str),
    /// Apply up to two actions together, then wait.
    Run {
        /// Optional description logged before the actions.
        note: Option<&'static str>,
        /// Actions applied in order under one lock.
        actions: heapless::Vec<Action, 2>,
        /// Time to hold the result (ms).
        hold_ms: u64,
    },
}

impl DemoStep {
    fn run(note: Option<&'static str>, actions: &[Action], hold_ms: u64) -> Self {
        let mut list = heapless::Vec::new();
        for action in actions.iter().take(2) {
            let _ = list.push(*action);
        }
        DemoStep::Run {
            note,
            actions: list,
            hold_ms,
        }
    }
}

/// Ordered demo sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DemoScript {
    /// Pause before the first step (ms).
    pub warmup_ms: u64,
    /// Steps in playback order.
    pub steps: Vec<DemoStep>,
}

impl DemoScript {
    /// Build the standard sequence with the speeds and timings in `config`.
    ///
    /// ```rust
    /// use tb6612_bringup::config::DemoConfig;
    /// use tb6612_bringup::demo::DemoScript;
    ///
    /// let script = DemoScript::from_config(&DemoConfig::default());
    /// // 1 s warm-up, 2 x 2 s + 2 x 1 s per motor, 4 x 2 s together
    /// assert_eq!(script.total_ms(), 1000 + 2 * 6000 + 8000);
    /// ```
    pub fn from_config(config: &DemoConfig) -> Self {
        use MotorId::{A, B};

        let single = config.single_speed;
        let paired = config.paired_speed;
        let run = config.run_ms;
        let pause = config.pause_ms;
        let mut steps = Vec::with_capacity(16);

        for (banner, motor) in [("Testing Motor A", A), ("Testing Motor B", B)] {
            steps.push(DemoStep::Section(banner));
            steps.push(DemoStep::run(None, &[Action::forward(motor, single)], run));
            steps.push(DemoStep::run(None, &[Action::stop(motor)], pause));
            steps.push(DemoStep::run(None, &[Action::backward(motor, single)], run));
            steps.push(DemoStep::run(None, &[Action::stop(motor)], pause));
        }

        steps.push(DemoStep::Section("Testing Both Motors"));
        steps.push(DemoStep::run(
            Some("Both forward..."),
            &[Action::forward(A, paired), Action::forward(B, paired)],
            run,
        ));
        steps.push(DemoStep::run(
            Some("Both backward..."),
            &[Action::backward(A, paired), Action::backward(B, paired)],
            run,
        ));
        steps.push(DemoStep::run(
            Some("Turning left (Motor A back, Motor B forward)..."),
            &[Action::backward(A, paired), Action::forward(B, paired)],
            run,
        ));
        steps.push(DemoStep::run(
            Some("Turning right (Motor A forward, Motor B back)..."),
            &[Action::forward(A, paired), Action::backward(B, paired)],
            run,
        ));

        Self {
            warmup_ms: config.warmup_ms,
            steps,
        }
    }

    /// Sum of the warm-up and every hold time.
    pub fn total_ms(&self) -> u64 {
        self.steps
            .iter()
            .map(|step| match step {
                DemoStep::Section(_) => 0,
                DemoStep::Run { hold_ms, .. } => *hold_ms,
            })
            .sum::<u64>()
            + self.warmup_ms
    }

    /// Every action in playback order.
    pub fn actions(&self) -> impl Iterator<Item = &Action> + '_ {
        let none: &[Action] = &[];
        self.steps.iter().flat_map(move |step| match step {
            DemoStep::Section(_) => none.iter(),
            DemoStep::Run { actions, .. } => actions.iter(),
        })
    }
}

impl Default for DemoScript {
    fn default() -> Self {
        Self::from_config(&DemoConfig::default())
    }
}

/// Play `script` on an initialized driver.
///
/// Both motors are stopped at the end. If a step fails, a best-effort
/// stop of both motors is attempted before the error is returned;
/// shutting the driver down stays with the caller.
pub fn run_demo<G, D>(
    driver: &SharedDriver<G>,
    script: &DemoScript,
    delay: &mut D,
) -> Result<(), DriverError>
where
    G: Gpio,
    D: Delay + ?Sized,
{
    log::info!("Starting TB6612FNG motor test");
    delay.delay_ms(script.warmup_ms);

    if let Err(err) = play(driver, script, delay) {
        log::error!("demo aborted: {err}");
        if let Err(stop_err) = driver.with_driver(|d| d.stop_all()) {
            log::warn!("could not stop motors after failed step: {stop_err}");
        }
        return Err(err);
    }

    driver.with_driver(|d| d.stop_all())?;
    log::info!("=== Test Complete ===");
    Ok(())
}

fn play<G, D>(driver: &SharedDriver<G>, script: &DemoScript, delay: &mut D) -> Result<(), DriverError>
where
    G: Gpio,
    D: Delay + ?Sized,
{
    for step in &script.steps {
        match step {
            DemoStep::Section(title) => log::info!("=== {title} ==="),
            DemoStep::Run {
                note,
                actions,
                hold_ms,
            } => {
                if let Some(note) = note {
                    log::info!("{note}");
                }
                driver.with_driver(|d| actions.iter().try_for_each(|a| a.apply(d)))?;
                delay.delay_ms(*hold_ms);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{MockDelay, SimGpio, SimOp};
    use crate::pins::PinMap;

    fn enabled() -> SharedDriver<SimGpio> {
        let shared = SharedDriver::new(Tb6612::new(SimGpio::new(), PinMap::default()));
        shared.with_driver(|d| d.initialize()).unwrap();
        shared
    }

    #[test]
    fn default_script_sequence() {
        use MotorId::{A, B};

        let script = DemoScript::default();
        let actions: Vec<Action> = script.actions().copied().collect();
        assert_eq!(
            actions,
            vec![
                Action::forward(A, 30),
                Action::stop(A),
                Action::backward(A, 30),
                Action::stop(A),
                Action::forward(B, 30),
                Action::stop(B),
                Action::backward(B, 30),
                Action::stop(B),
                Action::forward(A, 40),
                Action::forward(B, 40),
                Action::backward(A, 40),
                Action::backward(B, 40),
                Action::backward(A, 40),
                Action::forward(B, 40),
                Action::forward(A, 40),
                Action::backward(B, 40),
            ]
        );
        let sections: Vec<_> = script
            .steps
            .iter()
            .filter_map(|s| match s {
                DemoStep::Section(t) => Some(*t),
                _ => None,
            })
            .collect();
        assert_eq!(
            sections,
            vec!["Testing Motor A", "Testing Motor B", "Testing Both Motors"]
        );
    }

    #[test]
    fn configured_speeds_and_timing() {
        let config = DemoConfig::default()
            .with_timing(0, 10, 5)
            .with_speeds(60, 80);
        let script = DemoScript::from_config(&config);
        assert_eq!(script.total_ms(), 2 * (10 + 5 + 10 + 5) + 4 * 10);
        assert!(script
            .actions()
            .filter(|a| a.direction != Direction::Stopped)
            .all(|a| a.speed == 60 || a.speed == 80));
    }

    #[test]
    fn run_waits_and_ends_stopped() {
        let driver = enabled();
        let mut delay = MockDelay::new();

        run_demo(&driver, &DemoScript::default(), &mut delay).unwrap();

        assert_eq!(delay.calls.first(), Some(&1000));
        assert_eq!(delay.total_ms(), DemoScript::default().total_ms());
        let state = driver.state();
        assert!(!state.motor_a.is_running());
        assert!(!state.motor_b.is_running());
        // Standby stays up; shutdown is the caller's job.
        assert!(state.enabled);
    }

    #[test]
    fn failure_stops_motors_and_returns_error() {
        let driver = enabled();
        // BIN1 write fails on the first Motor B step.
        driver.with_driver(|d| d.gpio_mut().fail_on(SimOp::Write, 22));
        let mut delay = MockDelay::new();

        let err = run_demo(&driver, &DemoScript::default(), &mut delay).unwrap_err();

        assert!(matches!(
            err,
            DriverError::Write {
                motor: MotorId::B,
                ..
            }
        ));
        assert!(!driver.state().motor_a.is_running());
        // Motor A ran its four steps before the failure.
        assert_eq!(delay.calls, vec![1000, 2000, 1000, 2000, 1000]);
    }

    #[test]
    fn demo_on_idle_driver_fails_fast() {
        let driver = SharedDriver::new(Tb6612::new(SimGpio::new(), PinMap::default()));
        let mut delay = MockDelay::new();
        assert!(matches!(
            run_demo(&driver, &DemoScript::default(), &mut delay),
            Err(DriverError::NotEnabled { .. })
        ));
    }
}
