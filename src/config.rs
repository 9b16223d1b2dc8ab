//! Gesture thresholds with TOML persistence.
//!
//! All fields use `#[serde(default)]`, so a file that only overrides
//! `double_tap_ms` is valid. Millisecond fields are signed so that a negative
//! value in a hand-edited file is reported as an error instead of wrapping.
//!
//! ```toml
//! double_tap_ms = 250
//! long_press_ms = 500
//! long_press_tolerance = 8.0
//! drag_throttle_ms = 100
//! move_throttle_ms = 100
//! velocity_window = 4
//! lump_capacity = 4096
//! ```

use crate::combinators::{
    DoubleSequence, DragEvent, GestureExt, Lump, DEFAULT_LONG_PRESS_TOLERANCE,
    DEFAULT_LUMP_CAPACITY,
};
use crate::context::InputObservable;
use crate::error::ConfigError;
use crate::event::{InputEvent, VelocityInfo};
use crate::stream::Stream;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    pub double_tap_ms: i64,
    pub long_press_ms: i64,
    pub long_press_tolerance: f32,
    pub drag_throttle_ms: i64,
    pub move_throttle_ms: i64,
    pub velocity_window: i64,
    pub lump_capacity: i64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            double_tap_ms: 250,
            long_press_ms: 500,
            long_press_tolerance: DEFAULT_LONG_PRESS_TOLERANCE,
            drag_throttle_ms: 100,
            move_throttle_ms: 100,
            velocity_window: 4,
            lump_capacity: DEFAULT_LUMP_CAPACITY as i64,
        }
    }
}

fn millis(name: &'static str, value: i64) -> Result<Duration, ConfigError> {
    match u64::try_from(value) {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => Err(ConfigError::NonPositiveDuration {
            name,
            millis: value,
        }),
    }
}

fn count(name: &'static str, value: i64, min: usize) -> Result<usize, ConfigError> {
    match usize::try_from(value) {
        Ok(n) if n >= min => Ok(n),
        _ => Err(ConfigError::TooSmall { name, min, value }),
    }
}

impl GestureConfig {
    /// Parse and validate.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: GestureConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file. Missing fields use defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        log::info!("loaded gesture config from {}", path.display());
        Ok(config)
    }

    /// Save to a TOML file (pretty-printed).
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check every field; reports the first invalid one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.double_tap()?;
        self.long_press()?;
        self.tolerance()?;
        self.drag_throttle()?;
        self.move_throttle()?;
        self.velocity_window()?;
        self.lump_capacity()?;
        Ok(())
    }

    pub fn double_tap(&self) -> Result<Duration, ConfigError> {
        millis("double_tap_ms", self.double_tap_ms)
    }

    pub fn long_press(&self) -> Result<Duration, ConfigError> {
        millis("long_press_ms", self.long_press_ms)
    }

    pub fn tolerance(&self) -> Result<f32, ConfigError> {
        crate::combinators::tolerance("long_press_tolerance", self.long_press_tolerance)
    }

    pub fn drag_throttle(&self) -> Result<Duration, ConfigError> {
        millis("drag_throttle_ms", self.drag_throttle_ms)
    }

    pub fn move_throttle(&self) -> Result<Duration, ConfigError> {
        millis("move_throttle_ms", self.move_throttle_ms)
    }

    pub fn velocity_window(&self) -> Result<usize, ConfigError> {
        count("velocity_window", self.velocity_window, 1)
    }

    pub fn lump_capacity(&self) -> Result<usize, ConfigError> {
        count("lump_capacity", self.lump_capacity, 2)
    }

    /// Build every configured stream for one observable.
    pub fn gestures<O: InputObservable + ?Sized>(&self, io: &O) -> Result<GestureSet, ConfigError> {
        Ok(GestureSet {
            lump: io.lump_with_capacity(self.lump_capacity()?)?,
            double: io.double_sequence(self.double_tap()?)?,
            long_press: io.long_sequence_with(self.long_press()?, self.tolerance()?)?,
            drag: io.drag_and_drop(self.long_press()?, self.drag_throttle()?)?,
            throttled_move: io.move_throttle(self.move_throttle()?)?,
            velocity: io.velocity(),
            last_velocities: io.last_velocities(self.velocity_window()?)?,
        })
    }
}

/// Streams built from one [`GestureConfig`]. Each is still cold: subscribe to
/// the ones you need.
#[derive(Clone)]
pub struct GestureSet {
    pub lump: Stream<Lump>,
    pub double: Stream<DoubleSequence>,
    pub long_press: Stream<InputEvent>,
    pub drag: Stream<DragEvent>,
    pub throttled_move: Stream<InputEvent>,
    pub velocity: Stream<VelocityInfo>,
    pub last_velocities: Stream<Vec<VelocityInfo>>,
}
