//! Pin assignments for the TB6612FNG wiring.
//!
//! The default map matches the bring-up harness on a Raspberry Pi 40-pin
//! header (BCM numbering). GPIO12 and GPIO13 are the hardware PWM capable
//! pins and carry the two speed channels.
//!
//! ```text
//!  Motor A: AIN1=24  AIN2=23  PWMA=12
//!  Motor B: BIN1=22  BIN2=27  PWMB=13
//!  Driver:  STBY=16
//! ```

use core::fmt;

/// Symbolic role of one driver input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PinRole {
    /// Motor A forward input (AIN1).
    Ain1,
    /// Motor A backward input (AIN2).
    Ain2,
    /// Motor A speed PWM (PWMA).
    Pwma,
    /// Motor B forward input (BIN1).
    Bin1,
    /// Motor B backward input (BIN2).
    Bin2,
    /// Motor B speed PWM (PWMB).
    Pwmb,
    /// Shared standby/enable input (STBY).
    Stby,
}

impl PinRole {
    /// All roles in bring-up order. Standby comes first so it is held low
    /// while everything else is claimed.
    pub const ALL: [PinRole; 7] = [
        PinRole::Stby,
        PinRole::Ain1,
        PinRole::Ain2,
        PinRole::Pwma,
        PinRole::Bin1,
        PinRole::Bin2,
        PinRole::Pwmb,
    ];

    /// Datasheet label of the role.
    pub const fn label(&self) -> &'static str {
        match self {
            PinRole::Ain1 => "AIN1",
            PinRole::Ain2 => "AIN2",
            PinRole::Pwma => "PWMA",
            PinRole::Bin1 => "BIN1",
            PinRole::Bin2 => "BIN2",
            PinRole::Pwmb => "PWMB",
            PinRole::Stby => "STBY",
        }
    }
}

impl fmt::Display for PinRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Two roles were assigned the same physical pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("pin {pin} assigned to both {first} and {second}")]
pub struct PinMapError {
    /// The shared BCM pin number.
    pub pin: u8,
    /// Role that claimed the pin first.
    pub first: PinRole,
    /// Role that collided with it.
    pub second: PinRole,
}

/// Mapping from [`PinRole`] to BCM pin number.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PinMap {
    /// Motor A forward input
    pub ain1: u8,
    /// Motor A backward input
    pub ain2: u8,
    /// Motor A PWM
    pub pwma: u8,
    /// Motor B forward input
    pub bin1: u8,
    /// Motor B backward input
    pub bin2: u8,
    /// Motor B PWM
    pub pwmb: u8,
    /// Standby
    pub stby: u8,
}

impl Default for PinMap {
    fn default() -> Self {
        Self {
            ain1: 24,
            ain2: 23,
            pwma: 12,
            bin1: 22,
            bin2: 27,
            pwmb: 13,
            stby: 16,
        }
    }
}

impl PinMap {
    /// Pin assigned to `role`.
    pub const fn pin(&self, role: PinRole) -> u8 {
        match role {
            PinRole::Ain1 => self.ain1,
            PinRole::Ain2 => self.ain2,
            PinRole::Pwma => self.pwma,
            PinRole::Bin1 => self.bin1,
            PinRole::Bin2 => self.bin2,
            PinRole::Pwmb => self.pwmb,
            PinRole::Stby => self.stby,
        }
    }

    /// Reassign one role.
    pub fn with_pin(mut self, role: PinRole, pin: u8) -> Self {
        match role {
            PinRole::Ain1 => self.ain1 = pin,
            PinRole::Ain2 => self.ain2 = pin,
            PinRole::Pwma => self.pwma = pin,
            PinRole::Bin1 => self.bin1 = pin,
            PinRole::Bin2 => self.bin2 = pin,
            PinRole::Pwmb => self.pwmb = pin,
            PinRole::Stby => self.stby = pin,
        }
        self
    }

    /// Iterate `(role, pin)` pairs in bring-up order.
    pub fn assignments(&self) -> impl Iterator<Item = (PinRole, u8)> + '_ {
        PinRole::ALL.iter().map(move |&role| (role, self.pin(role)))
    }

    /// Check that every role has its own pin.
    pub fn validate(&self) -> Result<(), PinMapError> {
        let mut seen: heapless::Vec<(u8, PinRole), 7> = heapless::Vec::new();
        for (role, pin) in self.assignments() {
            if let Some(&(_, first)) = seen.iter().find(|(p, _)| *p == pin) {
                return Err(PinMapError {
                    pin,
                    first,
                    second: role,
                });
            }
            // Capacity matches PinRole::ALL.
            let _ = seen.push((pin, role));
        }
        Ok(())
    }
}

impl fmt::Display for PinMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "A: AIN1={} AIN2={} PWMA={} | B: BIN1={} BIN2={} PWMB={} | STBY={}",
            self.ain1, self.ain2, self.pwma, self.bin1, self.bin2, self.pwmb, self.stby
        )
    }
}
