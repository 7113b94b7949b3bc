//! Native Raspberry Pi GPIO through `rppal`.
//!
//! Pins are claimed as [`rppal::gpio::IoPin`]s and PWM is rppal's
//! software PWM on the same pin, so any of the seven roles may be moved to
//! a different header pin through configuration. Releasing a pin drops it,
//! which restores the mode it had before the program started.
//!
//! Requires access to `/dev/gpiomem` (member of the `gpio` group or root).

use std::collections::HashMap;

use rppal::gpio::{Gpio as RpiGpio, IoPin, Mode};

use crate::traits::{Gpio, Level, PinMode};

/// Errors from the rppal binding.
#[derive(Debug, thiserror::Error)]
pub enum RppalError {
    /// rppal rejected the operation.
    #[error(transparent)]
    Gpio(#[from] rppal::gpio::Error),
    /// The pin was not claimed through `configure`.
    #[error("pin {0} is not configured")]
    NotConfigured(u8),
    /// Output operation on an input pin.
    #[error("pin {0} is not an output")]
    NotOutput(u8),
}

#[derive(Debug)]
struct Claimed {
    pin: IoPin,
    mode: PinMode,
    frequency: f64,
}

/// rppal-backed GPIO binding.
#[derive(Debug)]
pub struct RppalGpio {
    gpio: RpiGpio,
    pins: HashMap<u8, Claimed>,
}

impl RppalGpio {
    /// PWM frequency used when `pwm_set_frequency` was never called.
    const DEFAULT_FREQUENCY_HZ: f64 = 1000.0;

    /// Open the GPIO peripheral.
    pub fn new() -> Result<Self, RppalError> {
        let gpio = RpiGpio::new()?;
        log::info!("rppal GPIO opened");
        Ok(Self {
            gpio,
            pins: HashMap::new(),
        })
    }

    fn claimed(&mut self, pin: u8) -> Result<&mut Claimed, RppalError> {
        self.pins.get_mut(&pin).ok_or(RppalError::NotConfigured(pin))
    }

    fn output(&mut self, pin: u8) -> Result<&mut Claimed, RppalError> {
        let claimed = self.claimed(pin)?;
        if claimed.mode != PinMode::Output {
            return Err(RppalError::NotOutput(pin));
        }
        Ok(claimed)
    }
}

impl Gpio for RppalGpio {
    type Error = RppalError;

    fn configure(&mut self, pin: u8, mode: PinMode) -> Result<(), RppalError> {
        let mut io = match mode {
            PinMode::Input => self.gpio.get(pin)?.into_io(Mode::Input),
            PinMode::Output => {
                let mut io = self.gpio.get(pin)?.into_io(Mode::Output);
                io.set_low();
                io
            }
        };
        io.set_reset_on_drop(true);
        self.pins.insert(
            pin,
            Claimed {
                pin: io,
                mode,
                frequency: Self::DEFAULT_FREQUENCY_HZ,
            },
        );
        Ok(())
    }

    fn write(&mut self, pin: u8, level: Level) -> Result<(), RppalError> {
        let claimed = self.output(pin)?;
        match level {
            Level::High => claimed.pin.set_high(),
            Level::Low => claimed.pin.set_low(),
        }
        Ok(())
    }

    fn read(&mut self, pin: u8) -> Result<Level, RppalError> {
        let claimed = self.claimed(pin)?;
        Ok(Level::from(claimed.pin.is_high()))
    }

    fn pwm_set_frequency(&mut self, pin: u8, hz: u32) -> Result<(), RppalError> {
        self.output(pin)?.frequency = f64::from(hz);
        Ok(())
    }

    fn pwm_start(&mut self, pin: u8, duty: u8) -> Result<(), RppalError> {
        self.pwm_set_duty(pin, duty)
    }

    fn pwm_set_duty(&mut self, pin: u8, duty: u8) -> Result<(), RppalError> {
        let claimed = self.output(pin)?;
        let frequency = claimed.frequency;
        claimed
            .pin
            .set_pwm_frequency(frequency, f64::from(duty.min(100)) / 100.0)?;
        Ok(())
    }

    fn pwm_stop(&mut self, pin: u8) -> Result<(), RppalError> {
        let claimed = self.output(pin)?;
        claimed.pin.clear_pwm()?;
        claimed.pin.set_low();
        Ok(())
    }

    fn release(&mut self, pin: u8) -> Result<(), RppalError> {
        self.pins.remove(&pin);
        Ok(())
    }
}
