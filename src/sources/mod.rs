//! Event sources.
//!
//! Thin adapters that turn raw platform samples into well-formed sequences on
//! an [`InputContext`]. Platform glue (a window event loop, a touch callback
//! thread, ...) pushes raw samples through an `mpsc` sender; the source drains
//! them once per tick from [`InputManager::tick`](crate::manager::InputManager::tick).
//!
//! # Per-tick contract
//! Each poll emits at most one Begin, then any number of Moves, then at most
//! one End. Samples that would break this (a release in the same tick as the
//! press, a press after a release) are carried over to the next tick.
//!
//! # Feature flags
//! - **`replay`** (default) enables [`replay::ReplaySource`], which plays back a
//!   JSON recording of raw samples.

use crate::context::{InputContext, InputObservable};
use crate::event::{InputEvent, InputEventType, SourceId, Timestamp};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub mod mouse;
#[cfg(feature = "replay")]
#[cfg_attr(docsrs, doc(cfg(feature = "replay")))]
pub mod replay;
pub mod touch;

pub use mouse::MouseSource;
#[cfg(feature = "replay")]
pub use replay::{Recording, ReplaySource, TimedSignal};
pub use touch::{TouchPhase, TouchSample, TouchSource};

/// A polled producer of input sequences.
pub trait InputSource: InputObservable {
    fn name(&self) -> &str;

    fn id(&self) -> SourceId {
        self.context().source_id()
    }

    /// Drain pending platform samples and emit this tick's events.
    fn poll(&mut self);
}

/// Raw pointer sample as delivered by platform glue.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointerSignal {
    Down { position: Vec2 },
    Up { position: Vec2 },
    MoveTo { position: Vec2 },
    Wheel { delta: f32 },
}

/// Returns true when a point is over UI that captures the pointer.
pub type UiCapture = Box<dyn Fn(Vec2) -> bool>;

/// Owns the sequence counters of one source.
struct SequenceTracker {
    sender: SourceId,
    sequence_id: u64,
    next_id: u64,
    open: bool,
    last_position: Vec2,
}

impl SequenceTracker {
    fn new(sender: SourceId) -> Self {
        SequenceTracker {
            sender,
            sequence_id: 0,
            next_id: 0,
            open: false,
            last_position: Vec2::ZERO,
        }
    }

    fn event(&mut self, kind: InputEventType, position: Vec2, at: Timestamp) -> InputEvent {
        let event = InputEvent {
            sequence_id: self.sequence_id,
            id: self.next_id,
            kind,
            position,
            sender: self.sender,
            at,
        };
        self.next_id += 1;
        self.last_position = position;
        event
    }

    fn begin(&mut self, position: Vec2, at: Timestamp) -> InputEvent {
        self.next_id = 0;
        self.open = true;
        self.event(InputEventType::Begin, position, at)
    }

    /// `None` when no sequence is open or the position is unchanged.
    fn moved(&mut self, position: Vec2, at: Timestamp) -> Option<InputEvent> {
        if !self.open || position == self.last_position {
            return None;
        }
        Some(self.event(InputEventType::Move, position, at))
    }

    fn end(&mut self, position: Vec2, at: Timestamp) -> Option<InputEvent> {
        if !self.open {
            return None;
        }
        let event = self.event(InputEventType::End, position, at);
        self.open = false;
        self.next_id = 0;
        self.sequence_id += 1;
        Some(event)
    }
}

/// Folds one tick's worth of raw signals into sequence events.
pub(crate) struct SignalPump {
    tracker: SequenceTracker,
    position: Vec2,
    deferred: VecDeque<PointerSignal>,
    ui_capture: Option<UiCapture>,
}

impl SignalPump {
    pub(crate) fn new(sender: SourceId) -> Self {
        SignalPump {
            tracker: SequenceTracker::new(sender),
            position: Vec2::ZERO,
            deferred: VecDeque::new(),
            ui_capture: None,
        }
    }

    pub(crate) fn set_ui_capture(&mut self, capture: UiCapture) {
        self.ui_capture = Some(capture);
    }

    #[inline]
    pub(crate) fn position(&self) -> Vec2 {
        self.position
    }

    fn captured(&self, position: Vec2) -> bool {
        self.ui_capture.as_ref().is_some_and(|capture| capture(position))
    }

    /// Process deferred and new signals for one tick. Returns the summed
    /// wheel delta.
    pub(crate) fn step(
        &mut self,
        ctx: &InputContext,
        incoming: impl IntoIterator<Item = PointerSignal>,
    ) -> f32 {
        let now = ctx.clock().now();
        let mut queue = std::mem::take(&mut self.deferred);
        queue.extend(incoming);

        let mut pressed = false;
        let mut wheel = 0.0;
        while let Some(signal) = queue.pop_front() {
            match signal {
                PointerSignal::MoveTo { position } => self.position = position,
                PointerSignal::Wheel { delta } => wheel += delta,
                PointerSignal::Down { position } => {
                    self.position = position;
                    if self.tracker.open {
                        log::debug!("{}: press while already pressed ignored", ctx.source_id());
                    } else if self.captured(position) {
                        log::trace!("{}: press captured by UI", ctx.source_id());
                    } else {
                        ctx.emit(self.tracker.begin(position, now));
                        pressed = true;
                    }
                }
                PointerSignal::Up { position } => {
                    if pressed {
                        // Release in the press tick: End goes out next tick.
                        queue.push_front(signal);
                        break;
                    }
                    if let Some(event) = self.tracker.moved(self.position, now) {
                        ctx.emit(event);
                    }
                    self.position = position;
                    if let Some(event) = self.tracker.end(position, now) {
                        ctx.emit(event);
                        break;
                    }
                }
            }
        }
        self.deferred = queue;

        if let Some(event) = self.tracker.moved(self.position, now) {
            ctx.emit(event);
        }
        wheel
    }
}
