//! Temporal combinators.
//!
//! Every combinator turns the Begin/Move/End channels of one
//! [`InputContext`] (plus the logical clock) into a derived [`Stream`]. Streams
//! are cold: each `subscribe` gets its own buffers, state machines and timers,
//! and tearing the subscription down disarms every timer it armed.
//!
//! # Preconditions
//! All combinators assume well-formed sequences (see [`crate::event`]). Feeding
//! them an End without a Begin, or nested Begins, gives unspecified output; no
//! error is reported.
//!
//! # Parameters
//! Durations must be at least one millisecond and window sizes at least one.
//! Invalid parameters fail with [`ConfigError`] when the stream is built.

mod double;
mod drag;
mod long_press;
mod lump;
mod throttle;
mod velocity;

pub use double::DoubleSequence;
pub use drag::DragEvent;
pub use lump::{Lump, DEFAULT_LUMP_CAPACITY};

use crate::context::InputObservable;
use crate::error::ConfigError;
use crate::event::{InputEvent, VelocityInfo};
use crate::stream::Stream;
use std::time::Duration;

/// Distance a pointer may travel before a pending long press is abandoned.
pub const DEFAULT_LONG_PRESS_TOLERANCE: f32 = 8.0;

pub(crate) fn positive_millis(name: &'static str, d: Duration) -> Result<u64, ConfigError> {
    match u64::try_from(d.as_millis()) {
        Ok(0) => Err(ConfigError::NonPositiveDuration { name, millis: 0 }),
        Ok(ms) => Ok(ms),
        Err(_) => Ok(u64::MAX),
    }
}

pub(crate) fn tolerance(name: &'static str, value: f32) -> Result<f32, ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidTolerance { name, value })
    }
}

/// Derived gesture streams, available on every [`InputObservable`].
pub trait GestureExt: InputObservable {
    /// Every event of a sequence, delivered once at its End.
    fn lump(&self) -> Stream<Lump> {
        lump::stream(self.context(), DEFAULT_LUMP_CAPACITY)
    }

    /// [`lump`](Self::lump) with an explicit cap (at least 2).
    fn lump_with_capacity(&self, capacity: usize) -> Result<Stream<Lump>, ConfigError> {
        if capacity < 2 {
            return Err(ConfigError::TooSmall {
                name: "lump_capacity",
                min: 2,
                value: capacity as i64,
            });
        }
        Ok(lump::stream(self.context(), capacity))
    }

    /// Second End of two sequences whose gap (End to next Begin) is at most
    /// `threshold`. The bound is inclusive.
    fn double_sequence(&self, threshold: Duration) -> Result<Stream<DoubleSequence>, ConfigError> {
        let ms = positive_millis("double_sequence threshold", threshold)?;
        Ok(double::stream(self.context(), ms))
    }

    /// The Begin of a sequence held for `threshold` without ending or moving
    /// further than [`DEFAULT_LONG_PRESS_TOLERANCE`].
    fn long_sequence(&self, threshold: Duration) -> Result<Stream<InputEvent>, ConfigError> {
        self.long_sequence_with(threshold, DEFAULT_LONG_PRESS_TOLERANCE)
    }

    fn long_sequence_with(
        &self,
        threshold: Duration,
        move_tolerance: f32,
    ) -> Result<Stream<InputEvent>, ConfigError> {
        positive_millis("long_sequence threshold", threshold)?;
        let move_tolerance = tolerance("long_sequence tolerance", move_tolerance)?;
        Ok(long_press::stream(self.context(), threshold, move_tolerance))
    }

    /// Trailing-edge throttled Moves: at most one per `interval`.
    fn move_throttle(&self, interval: Duration) -> Result<Stream<InputEvent>, ConfigError> {
        let ms = positive_millis("move_throttle interval", interval)?;
        Ok(throttle::stream(self.context(), ms))
    }

    /// Long press opens a drag; throttled Moves follow; the End drops it.
    fn drag_and_drop(
        &self,
        long_press: Duration,
        throttle: Duration,
    ) -> Result<Stream<DragEvent>, ConfigError> {
        positive_millis("drag_and_drop long press", long_press)?;
        let ms = positive_millis("drag_and_drop throttle", throttle)?;
        Ok(drag::stream(
            self.context(),
            long_press,
            DEFAULT_LONG_PRESS_TOLERANCE,
            ms,
        ))
    }

    /// Displacement of each Move/End from the previous event of its sequence.
    fn velocity(&self) -> Stream<VelocityInfo> {
        velocity::stream(self.context())
    }

    /// The `count` most recent velocities of the current sequence,
    /// oldest first.
    fn last_velocities(&self, count: usize) -> Result<Stream<Vec<VelocityInfo>>, ConfigError> {
        if count == 0 {
            return Err(ConfigError::TooSmall {
                name: "velocity window",
                min: 1,
                value: 0,
            });
        }
        Ok(velocity::window_stream(self.context(), count))
    }
}

impl<O: InputObservable + ?Sized> GestureExt for O {}
