use super::long_press;
use super::throttle::Throttle;
use crate::clock::Clock;
use crate::context::InputContext;
use crate::event::InputEvent;
use crate::stream::Stream;
use crate::subscription::Subscription;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

/// Phase of a drag-and-drop session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DragEvent {
    /// Long press completed; carries the sequence's Begin.
    Begin(InputEvent),
    /// Throttled Move while dragging.
    Dragging(InputEvent),
    /// The sequence's End. Always the last event of a session.
    Drop(InputEvent),
}

impl DragEvent {
    pub fn event(&self) -> &InputEvent {
        match self {
            DragEvent::Begin(e) | DragEvent::Dragging(e) | DragEvent::Drop(e) => e,
        }
    }
}

impl fmt::Display for DragEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DragEvent::Begin(e) => write!(f, "drag begin {e}"),
            DragEvent::Dragging(e) => write!(f, "dragging {e}"),
            DragEvent::Drop(e) => write!(f, "drop {e}"),
        }
    }
}

/// Open drag sessions keyed by sequence id. A session exists from the long
/// press until the End of its sequence.
#[derive(Default)]
struct Sessions {
    open: HashMap<u64, Throttle>,
}

impl Sessions {
    fn close_all(&mut self, clock: &Clock) {
        for (_, mut throttle) in self.open.drain() {
            throttle.reset(clock);
        }
    }
}

pub(super) fn stream(
    ctx: &InputContext,
    long_press: Duration,
    tolerance: f32,
    throttle_ms: u64,
) -> Stream<DragEvent> {
    let clock = ctx.clock().clone();
    let pressed = long_press::stream(ctx, long_press, tolerance);
    let moved = ctx.moved();
    let end = ctx.end();

    Stream::from_fn(move |out| {
        let sessions = Rc::new(RefCell::new(Sessions::default()));

        let on_press = {
            let (sessions, clock, out) = (sessions.clone(), clock.clone(), out.clone());
            pressed.subscribe(move |begin| {
                log::debug!("drag session {} opened", begin.sequence_id);
                sessions
                    .borrow_mut()
                    .open
                    .insert(begin.sequence_id, Throttle::new(throttle_ms, clock.now()));
                out.emit(&DragEvent::Begin(*begin));
            })
        };

        let on_move = {
            let (sessions, clock, out) = (sessions.clone(), clock.clone(), out.clone());
            moved.subscribe(move |event| {
                let seq = event.sequence_id;
                let deadline = sessions
                    .borrow_mut()
                    .open
                    .get_mut(&seq)
                    .and_then(|throttle| throttle.offer(*event));
                let Some(deadline) = deadline else {
                    return;
                };
                let weak = Rc::downgrade(&sessions);
                let out = out.clone();
                let timer = clock.schedule_at(deadline, move |_| {
                    let Some(sessions) = weak.upgrade() else {
                        return;
                    };
                    let sample = sessions
                        .borrow_mut()
                        .open
                        .get_mut(&seq)
                        .and_then(Throttle::fire);
                    if let Some(sample) = sample {
                        out.emit(&DragEvent::Dragging(sample));
                    }
                });
                if let Some(throttle) = sessions.borrow_mut().open.get_mut(&seq) {
                    throttle.armed(timer);
                }
            })
        };

        let on_end = {
            let (sessions, clock) = (sessions.clone(), clock.clone());
            end.subscribe(move |event| {
                let session = sessions.borrow_mut().open.remove(&event.sequence_id);
                if let Some(mut throttle) = session {
                    throttle.reset(&clock);
                    log::debug!("drag session {} dropped", event.sequence_id);
                    out.emit(&DragEvent::Drop(*event));
                }
            })
        };

        let clock = clock.clone();
        Subscription::merge([
            on_press,
            on_move,
            on_end,
            Subscription::new(move || sessions.borrow_mut().close_all(&clock)),
        ])
    })
}
