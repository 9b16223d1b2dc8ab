use crate::context::InputContext;
use crate::event::{InputEvent, InputEventType};
use crate::stream::Stream;
use std::fmt;
use std::time::Duration;

/// Two consecutive sequences close enough in time to count as a double
/// tap/click.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DoubleSequence {
    /// End of the first sequence.
    pub previous_end: InputEvent,
    /// Begin of the second sequence.
    pub begin: InputEvent,
    /// End of the second sequence; the moment the double is reported.
    pub event: InputEvent,
}

impl DoubleSequence {
    /// Gap between the first release and the second press.
    pub fn gap(&self) -> Duration {
        self.begin.at.saturating_since(self.previous_end.at)
    }
}

impl fmt::Display for DoubleSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "double {} (gap {:?})", self.event, self.gap())
    }
}

enum State {
    Idle,
    /// A sequence ended; the next Begin may pair with it.
    Released(InputEvent),
    /// Second sequence under way; its End completes the double.
    Paired {
        previous_end: InputEvent,
        begin: InputEvent,
    },
}

struct DoubleDetector {
    threshold_ms: u64,
    state: State,
}

impl DoubleDetector {
    fn observe(&mut self, event: &InputEvent) -> Option<DoubleSequence> {
        match event.kind {
            InputEventType::Begin => {
                self.state = match std::mem::replace(&mut self.state, State::Idle) {
                    State::Released(previous_end)
                        if event.at >= previous_end.at
                            && event.at.as_millis() - previous_end.at.as_millis()
                                <= self.threshold_ms =>
                    {
                        State::Paired {
                            previous_end,
                            begin: *event,
                        }
                    }
                    _ => State::Idle,
                };
                None
            }
            InputEventType::Move => None,
            InputEventType::End => match std::mem::replace(&mut self.state, State::Idle) {
                State::Paired {
                    previous_end,
                    begin,
                } => Some(DoubleSequence {
                    previous_end,
                    begin,
                    event: *event,
                }),
                _ => {
                    self.state = State::Released(*event);
                    None
                }
            },
        }
    }
}

pub(super) fn stream(ctx: &InputContext, threshold_ms: u64) -> Stream<DoubleSequence> {
    let begin = ctx.begin();
    let end = ctx.end();
    Stream::from_fn(move |out| {
        let mut detector = DoubleDetector {
            threshold_ms,
            state: State::Idle,
        };
        // Begin and End of one context never interleave, so one merged
        // subscription keeps the detector's view ordered.
        begin.merge(&end).subscribe(move |event| {
            if let Some(double) = detector.observe(event) {
                out.emit(&double);
            }
        })
    })
}
