//! Configuration for the driver, its GPIO binding and the bring-up sessions.
//!
//! Defaults reproduce the bench harness: simulated GPIO, the standard pin
//! map, 1 kHz PWM, clamp-and-warn speed handling and the demo timings.
//! With the `json` feature a JSON file can override any subset of fields.
//!
//! # Example
//!
//! ```rust
//! use tb6612_bringup::config::{BackendKind, Config, PigpiodConfig, PwmConfig};
//!
//! // Use defaults
//! let config = Config::default();
//! assert_eq!(config.backend, BackendKind::Sim);
//!
//! // Or customize
//! let config = Config::default()
//!     .with_backend(BackendKind::Pigpiod)
//!     .with_pigpiod(PigpiodConfig::default().with_host("raspberrypi.local"))
//!     .with_pwm(PwmConfig::default().with_frequency_hz(2000));
//! assert!(config.validate().is_ok());
//! ```

use core::fmt;
use core::str::FromStr;

use heapless::String as HString;

use crate::hal::pigpiod::DEFAULT_PORT;
use crate::motor::SpeedPolicy;
use crate::pins::{PinMap, PinMapError};

/// Maximum length for host names.
pub const MAX_SHORT_STRING: usize = 64;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

/// Create a ShortString from a &str, truncating at a character boundary if too long
pub fn short_string(s: &str) -> ShortString {
    let mut hs = ShortString::new();
    for c in s.chars() {
        if hs.push(c).is_err() {
            break;
        }
    }
    hs
}

/// Configuration problems detected before any pin is touched.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Two roles share a pin.
    #[error("invalid pin map")]
    Pins(#[from] PinMapError),
    /// PWM frequency of zero.
    #[error("PWM frequency must be greater than 0 Hz")]
    ZeroFrequency,
    /// A speed setting outside `0..=100`.
    #[error("{field} = {value} is outside 0-100")]
    SpeedOutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// Its value.
        value: u8,
    },
    /// Config file could not be read.
    #[cfg(feature = "json")]
    #[error("could not read config file")]
    Io(#[from] std::io::Error),
    /// Config file is not valid JSON for this schema.
    #[cfg(feature = "json")]
    #[error("could not parse config")]
    Parse(#[from] serde_json::Error),
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete application configuration
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// GPIO binding to use
    pub backend: BackendKind,
    /// Pin assignment
    pub pins: PinMap,
    /// PWM settings
    pub pwm: PwmConfig,
    /// Speed handling
    pub speed: SpeedConfig,
    /// Scripted demo timings and speeds
    pub demo: DemoConfig,
    /// pigpio daemon connection
    pub pigpiod: PigpiodConfig,
}

impl Config {
    /// Set the GPIO binding
    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    /// Set the pin map
    pub fn with_pins(mut self, pins: PinMap) -> Self {
        self.pins = pins;
        self
    }

    /// Set PWM configuration
    pub fn with_pwm(mut self, pwm: PwmConfig) -> Self {
        self.pwm = pwm;
        self
    }

    /// Set speed configuration
    pub fn with_speed(mut self, speed: SpeedConfig) -> Self {
        self.speed = speed;
        self
    }

    /// Set demo configuration
    pub fn with_demo(mut self, demo: DemoConfig) -> Self {
        self.demo = demo;
        self
    }

    /// Set pigpio daemon configuration
    pub fn with_pigpiod(mut self, pigpiod: PigpiodConfig) -> Self {
        self.pigpiod = pigpiod;
        self
    }

    /// Check the configuration for values the driver cannot use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pins.validate()?;
        if self.pwm.frequency_hz == 0 {
            return Err(ConfigError::ZeroFrequency);
        }
        for (field, value) in [
            ("speed.interactive", self.speed.interactive),
            ("demo.single_speed", self.demo.single_speed),
            ("demo.paired_speed", self.demo.paired_speed),
        ] {
            if value > 100 {
                return Err(ConfigError::SpeedOutOfRange { field, value });
            }
        }
        Ok(())
    }

    /// Parse a JSON document. Missing fields keep their defaults.
    ///
    /// ```rust
    /// use tb6612_bringup::config::{BackendKind, Config};
    ///
    /// let config = Config::from_json_str(r#"{ "backend": "pigpiod", "pins": { "stby": 5 } }"#).unwrap();
    /// assert_eq!(config.backend, BackendKind::Pigpiod);
    /// assert_eq!(config.pins.stby, 5);
    /// assert_eq!(config.pins.ain1, 24);
    /// ```
    #[cfg(feature = "json")]
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON config file.
    #[cfg(feature = "json")]
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

// ============================================================================
// Backend selection
// ============================================================================

/// Which GPIO binding drives the pins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum BackendKind {
    /// In-memory simulation; writes are logged only.
    #[default]
    Sim,
    /// Native GPIO through rppal (requires the `rpi` feature).
    Rppal,
    /// pigpio daemon over TCP.
    Pigpiod,
}

impl BackendKind {
    /// Lowercase name as used in config files and on the command line.
    pub const fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Sim => "sim",
            BackendKind::Rppal => "rppal",
            BackendKind::Pigpiod => "pigpiod",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown backend name.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown backend '{0}' (expected sim, rppal or pigpiod)")]
pub struct UnknownBackend(pub String);

impl FromStr for BackendKind {
    type Err = UnknownBackend;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sim" | "fake" => Ok(BackendKind::Sim),
            "rppal" | "rpi" => Ok(BackendKind::Rppal),
            "pigpiod" | "pigpio" => Ok(BackendKind::Pigpiod),
            _ => Err(UnknownBackend(s.to_owned())),
        }
    }
}

// ============================================================================
// PWM Config
// ============================================================================

/// PWM configuration
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PwmConfig {
    /// Carrier frequency in hertz
    pub frequency_hz: u32,
}

impl Default for PwmConfig {
    fn default() -> Self {
        Self {
            frequency_hz: crate::driver::DEFAULT_PWM_FREQUENCY_HZ,
        }
    }
}

impl PwmConfig {
    /// Set the carrier frequency
    pub fn with_frequency_hz(mut self, hz: u32) -> Self {
        self.frequency_hz = hz;
        self
    }
}

// ============================================================================
// Speed Config
// ============================================================================

/// Speed handling configuration
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SpeedConfig {
    /// What to do with out-of-range requests
    pub policy: SpeedPolicy,
    /// Speed used by interactive motion commands (percent)
    pub interactive: u8,
}

impl Default for SpeedConfig {
    fn default() -> Self {
        Self {
            policy: SpeedPolicy::Clamp,
            interactive: 50,
        }
    }
}

impl SpeedConfig {
    /// Set the out-of-range policy
    pub fn with_policy(mut self, policy: SpeedPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the interactive speed
    pub fn with_interactive(mut self, percent: u8) -> Self {
        self.interactive = percent;
        self
    }
}

// ============================================================================
// Demo Config
// ============================================================================

/// Scripted demo configuration
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DemoConfig {
    /// Pause after initialization before the first step (ms)
    pub warmup_ms: u64,
    /// How long each motion step runs (ms)
    pub run_ms: u64,
    /// Pause after each single-motor stop (ms)
    pub pause_ms: u64,
    /// Speed for single-motor steps (percent)
    pub single_speed: u8,
    /// Speed for steps driving both motors (percent)
    pub paired_speed: u8,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            warmup_ms: 1000,
            run_ms: 2000,
            pause_ms: 1000,
            single_speed: 30,
            paired_speed: 40,
        }
    }
}

impl DemoConfig {
    /// Set step timings
    pub fn with_timing(mut self, warmup_ms: u64, run_ms: u64, pause_ms: u64) -> Self {
        self.warmup_ms = warmup_ms;
        self.run_ms = run_ms;
        self.pause_ms = pause_ms;
        self
    }

    /// Set step speeds
    pub fn with_speeds(mut self, single: u8, paired: u8) -> Self {
        self.single_speed = single;
        self.paired_speed = paired;
        self
    }
}

// ============================================================================
// pigpiod Config
// ============================================================================

/// pigpio daemon connection
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PigpiodConfig {
    /// Daemon host name or IP
    pub host: ShortString,
    /// Daemon port
    pub port: u16,
}

impl Default for PigpiodConfig {
    fn default() -> Self {
        Self {
            host: short_string("localhost"),
            port: DEFAULT_PORT,
        }
    }
}

impl PigpiodConfig {
    /// Set the daemon host
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = short_string(host);
        self
    }

    /// Set the daemon port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pins::PinRole;

    #[test]
    fn defaults_match_bench_harness() {
        let config = Config::default();
        assert_eq!(config.backend, BackendKind::Sim);
        assert_eq!(config.pwm.frequency_hz, 1000);
        assert_eq!(config.speed.policy, SpeedPolicy::Clamp);
        assert_eq!(config.speed.interactive, 50);
        assert_eq!(config.demo.single_speed, 30);
        assert_eq!(config.demo.paired_speed, 40);
        assert_eq!(config.pigpiod.host.as_str(), "localhost");
        assert_eq!(config.pigpiod.port, 8888);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn short_string_truncates() {
        let long = "x".repeat(100);
        assert_eq!(short_string(&long).len(), MAX_SHORT_STRING);
        assert_eq!(short_string("pi").as_str(), "pi");
    }

    #[test]
    fn validate_rejects_duplicate_pins() {
        let config =
            Config::default().with_pins(PinMap::default().with_pin(PinRole::Stby, 12));
        assert!(matches!(config.validate(), Err(ConfigError::Pins(_))));
    }

    #[test]
    fn validate_rejects_zero_frequency() {
        let config = Config::default().with_pwm(PwmConfig::default().with_frequency_hz(0));
        assert!(matches!(config.validate(), Err(ConfigError::ZeroFrequency)));
    }

    #[test]
    fn validate_rejects_speed_over_100() {
        let config = Config::default().with_speed(SpeedConfig::default().with_interactive(150));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SpeedOutOfRange {
                field: "speed.interactive",
                value: 150
            })
        ));
    }

    #[test]
    fn backend_from_str() {
        assert_eq!("sim".parse::<BackendKind>(), Ok(BackendKind::Sim));
        assert_eq!(" PIGPIO ".parse::<BackendKind>(), Ok(BackendKind::Pigpiod));
        assert_eq!("rpi".parse::<BackendKind>(), Ok(BackendKind::Rppal));
        assert!("gpiozero".parse::<BackendKind>().is_err());
        assert_eq!(BackendKind::Pigpiod.to_string(), "pigpiod");
    }

    #[cfg(feature = "json")]
    #[test]
    fn json_partial_override() {
        let config = Config::from_json_str(
            r#"{
                "speed": { "policy": "reject" },
                "demo": { "run_ms": 500 },
                "pigpiod": { "host": "10.0.0.7", "port": 9999 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.speed.policy, SpeedPolicy::Reject);
        assert_eq!(config.speed.interactive, 50);
        assert_eq!(config.demo.run_ms, 500);
        assert_eq!(config.demo.pause_ms, 1000);
        assert_eq!(config.pigpiod.host.as_str(), "10.0.0.7");
        assert_eq!(config.pigpiod.port, 9999);
    }

    #[cfg(feature = "json")]
    #[test]
    fn json_invalid_pins_rejected() {
        let err = Config::from_json_str(r#"{ "pins": { "ain1": 16 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Pins(_)));
    }

    #[cfg(feature = "json")]
    #[test]
    fn json_syntax_error() {
        assert!(matches!(
            Config::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[cfg(feature = "json")]
    #[test]
    fn json_round_trip_defaults() {
        let text = serde_json::to_string(&Config::default()).unwrap();
        assert_eq!(Config::from_json_str(&text).unwrap(), Config::default());
    }
}
