//! Events and sequence model.
//!
//! Every pointer interaction is a *sequence*: one [`InputEventType::Begin`],
//! zero or more [`InputEventType::Move`], and one [`InputEventType::End`], all
//! sharing a `sequence_id`. Sources own the counters; everything downstream
//! only reads them.
//!
//! ## Well-formedness
//! The combinators in [`crate::combinators`] assume every sequence they see is
//! well-formed. An End without a Begin, or two Begins without an End in between,
//! produces unspecified output. Nothing checks this at runtime; sources are
//! responsible for emitting correct sequences.
//!
//! ## Time
//! [`Timestamp`] is a logical millisecond count taken from the
//! [`Clock`](crate::clock::Clock) that drives the polling tick. It is not tied to
//! the wall clock of the host.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Logical time in milliseconds since the owning clock started.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0);

    #[inline]
    pub const fn from_millis(ms: u64) -> Self {
        Timestamp(ms)
    }

    #[inline]
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// `self + d`, or `None` if the result does not fit.
    pub fn checked_add(self, d: Duration) -> Option<Self> {
        let ms = u64::try_from(d.as_millis()).ok()?;
        self.0.checked_add(ms).map(Timestamp)
    }

    /// Time elapsed from `earlier` to `self`, zero if `earlier` is later.
    #[inline]
    pub fn saturating_since(self, earlier: Timestamp) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Opaque identifier of the source that produced an event.
///
/// This is a handle, not a reference: holding one keeps nothing alive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(u32);

static NEXT_SOURCE_ID: AtomicU32 = AtomicU32::new(0);

impl SourceId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        SourceId(raw)
    }

    /// Allocate a process-unique id.
    pub fn next() -> Self {
        SourceId(NEXT_SOURCE_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "src{}", self.0)
    }
}

/// Phase of an event within its sequence. Exactly one applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputEventType {
    Begin = 1,
    Move = 2,
    End = 4,
}

impl fmt::Display for InputEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InputEventType::Begin => "Begin",
            InputEventType::Move => "Move",
            InputEventType::End => "End",
        })
    }
}

/// One sample of a pointer sequence.
///
/// Events are immutable snapshots shared by reference with every subscriber.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct InputEvent {
    /// Identifies one Begin..End interaction of the sender.
    pub sequence_id: u64,
    /// Index within the sequence; 0 for the Begin.
    pub id: u64,
    pub kind: InputEventType,
    pub position: Vec2,
    /// Source that emitted the event.
    pub sender: SourceId,
    /// Logical emission time.
    pub at: Timestamp,
}

impl InputEvent {
    #[inline]
    pub fn is_begin(&self) -> bool {
        self.kind == InputEventType::Begin
    }

    #[inline]
    pub fn is_move(&self) -> bool {
        self.kind == InputEventType::Move
    }

    #[inline]
    pub fn is_end(&self) -> bool {
        self.kind == InputEventType::End
    }
}

impl fmt::Display for InputEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}]({}.{},{},({}, {}))",
            self.sender, self.sequence_id, self.id, self.kind, self.position.x, self.position.y
        )
    }
}

/// An event paired with its displacement from the previous event of the
/// same sequence.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VelocityInfo {
    pub event: InputEvent,
    pub vector: Vec2,
}

impl fmt::Display for VelocityInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{},({}, {})>", self.event, self.vector.x, self.vector.y)
    }
}

/// Scroll wheel sample. Not part of any sequence.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MouseWheelEvent {
    pub position: Vec2,
    pub wheel: f32,
    pub sender: SourceId,
    pub at: Timestamp,
}
