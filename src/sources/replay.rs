//! Playback of recorded pointer input.
//!
//! A [`Recording`] is a JSON list of raw [`PointerSignal`]s with millisecond
//! offsets. [`ReplaySource`] feeds them through a mouse pipeline as the clock
//! reaches each offset, so recorded sessions drive the same code paths as live
//! input.
//!
//! ```json
//! { "signals": [
//!   { "at": 0,   "signal": { "type": "down",    "position": [10.0, 10.0] } },
//!   { "at": 16,  "signal": { "type": "move_to", "position": [12.0, 10.0] } },
//!   { "at": 120, "signal": { "type": "up",      "position": [12.0, 10.0] } }
//! ] }
//! ```

use super::{InputSource, MouseSource, PointerSignal};
use crate::clock::Clock;
use crate::context::{InputContext, InputObservable};
use crate::error::RecordingError;
use crate::event::{MouseWheelEvent, Timestamp};
use crate::stream::Stream;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;

/// A signal and its offset from the start of playback.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimedSignal {
    pub at: u64,
    pub signal: PointerSignal,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub signals: Vec<TimedSignal>,
}

impl Recording {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a signal; keeps `signals` sorted by offset.
    pub fn push(&mut self, at: u64, signal: PointerSignal) -> &mut Self {
        let index = self.signals.partition_point(|s| s.at <= at);
        self.signals.insert(index, TimedSignal { at, signal });
        self
    }

    pub fn from_json(json: &str) -> Result<Self, RecordingError> {
        let mut recording: Recording = serde_json::from_str(json)?;
        recording.signals.sort_by_key(|s| s.at);
        Ok(recording)
    }

    pub fn to_json(&self) -> Result<String, RecordingError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self, RecordingError> {
        let json = std::fs::read_to_string(path).map_err(|source| RecordingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn save(&self, path: &Path) -> Result<(), RecordingError> {
        std::fs::write(path, self.to_json()?).map_err(|source| RecordingError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Offset of the last signal.
    pub fn duration_ms(&self) -> u64 {
        self.signals.last().map_or(0, |s| s.at)
    }
}

/// Virtual mouse driven by a recording.
pub struct ReplaySource {
    mouse: MouseSource,
    start: Timestamp,
    queue: VecDeque<TimedSignal>,
}

impl ReplaySource {
    /// Playback starts at the clock's current time.
    pub fn new(clock: &Clock, recording: Recording) -> Self {
        log::info!(
            "replaying {} signal(s) over {}ms",
            recording.signals.len(),
            recording.duration_ms()
        );
        ReplaySource {
            mouse: MouseSource::new(clock, 0),
            start: clock.now(),
            queue: recording.signals.into(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn wheel(&self) -> Stream<MouseWheelEvent> {
        self.mouse.wheel()
    }
}

impl InputObservable for ReplaySource {
    fn context(&self) -> &InputContext {
        self.mouse.context()
    }
}

impl InputSource for ReplaySource {
    fn name(&self) -> &str {
        "replay"
    }

    fn poll(&mut self) {
        let now = self.mouse.context().clock().now();
        let elapsed = now.saturating_since(self.start).as_millis();
        while self
            .queue
            .front()
            .is_some_and(|s| u128::from(s.at) <= elapsed)
        {
            if let Some(timed) = self.queue.pop_front() {
                self.mouse.feed(timed.signal);
            }
        }
        self.mouse.poll();
    }
}
