use crate::context::InputContext;
use crate::event::{InputEvent, InputEventType};
use crate::stream::Stream;

/// Default cap on buffered events per sequence.
pub const DEFAULT_LUMP_CAPACITY: usize = 4096;

/// All events of one sequence, Begin first and End last.
///
/// When a sequence outgrows the buffer, the first `capacity - 1` events are
/// kept, later Moves are dropped and counted in `dropped`, and the End is
/// always appended.
#[derive(Clone, Debug, PartialEq)]
pub struct Lump {
    pub events: Vec<InputEvent>,
    pub dropped: usize,
}

impl Lump {
    pub fn begin(&self) -> Option<&InputEvent> {
        self.events.first()
    }

    pub fn end(&self) -> Option<&InputEvent> {
        self.events.last()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events strictly between Begin and End.
    pub fn moves(&self) -> &[InputEvent] {
        match self.events.len() {
            0..=2 => &[],
            n => &self.events[1..n - 1],
        }
    }
}

struct LumpBuffer {
    capacity: usize,
    open: bool,
    events: Vec<InputEvent>,
    dropped: usize,
}

impl LumpBuffer {
    fn new(capacity: usize) -> Self {
        LumpBuffer {
            capacity,
            open: false,
            events: Vec::new(),
            dropped: 0,
        }
    }

    fn push(&mut self, event: &InputEvent) -> Option<Lump> {
        match event.kind {
            InputEventType::Begin => {
                self.events.clear();
                self.dropped = 0;
                self.open = true;
                self.events.push(*event);
                None
            }
            // Events of a sequence already under way at subscribe time are ignored.
            _ if !self.open => None,
            InputEventType::Move => {
                if self.events.len() < self.capacity - 1 {
                    self.events.push(*event);
                } else {
                    self.dropped += 1;
                }
                None
            }
            InputEventType::End => {
                self.open = false;
                self.events.push(*event);
                let lump = Lump {
                    events: std::mem::take(&mut self.events),
                    dropped: self.dropped,
                };
                if lump.dropped > 0 {
                    log::debug!(
                        "sequence {} truncated: {} moves dropped",
                        event.sequence_id,
                        lump.dropped
                    );
                }
                self.dropped = 0;
                Some(lump)
            }
        }
    }
}

pub(super) fn stream(ctx: &InputContext, capacity: usize) -> Stream<Lump> {
    let any = ctx.any();
    Stream::from_fn(move |out| {
        let mut buffer = LumpBuffer::new(capacity);
        any.subscribe(move |event| {
            if let Some(lump) = buffer.push(event) {
                out.emit(&lump);
            }
        })
    })
}
