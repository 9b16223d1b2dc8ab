use crate::clock::{Clock, TimerHandle};
use crate::context::InputContext;
use crate::event::{InputEvent, Timestamp};
use crate::stream::Stream;
use crate::subscription::Subscription;
use std::cell::RefCell;
use std::rc::Rc;

/// Trailing-edge sampler.
///
/// Windows sit on a grid `anchor + k * interval`. The first sample of a
/// window arms a timer at the window's end; later samples replace the pending
/// one. When the timer fires the most recent sample is released.
pub(crate) struct Throttle {
    interval_ms: u64,
    anchor: Timestamp,
    pending: Option<InputEvent>,
    timer: Option<TimerHandle>,
}

impl Throttle {
    pub(crate) fn new(interval_ms: u64, anchor: Timestamp) -> Self {
        Throttle {
            interval_ms,
            anchor,
            pending: None,
            timer: None,
        }
    }

    /// Record a sample. Returns the deadline to arm when no timer is armed yet.
    pub(crate) fn offer(&mut self, event: InputEvent) -> Option<Timestamp> {
        let at = event.at;
        self.pending = Some(event);
        if self.timer.is_some() {
            None
        } else {
            Some(self.next_boundary(at))
        }
    }

    pub(crate) fn armed(&mut self, timer: TimerHandle) {
        self.timer = Some(timer);
    }

    /// Timer expiry: hand out the latest sample, if any.
    pub(crate) fn fire(&mut self) -> Option<InputEvent> {
        self.timer = None;
        self.pending.take()
    }

    /// Drop the pending sample and disarm.
    pub(crate) fn reset(&mut self, clock: &Clock) {
        if let Some(timer) = self.timer.take() {
            clock.cancel(timer);
        }
        self.pending = None;
    }

    fn next_boundary(&self, at: Timestamp) -> Timestamp {
        let anchor = self.anchor.as_millis();
        let elapsed = at.as_millis().saturating_sub(anchor);
        let windows = elapsed / self.interval_ms + 1;
        Timestamp::from_millis(anchor.saturating_add(windows.saturating_mul(self.interval_ms)))
    }
}

pub(super) fn stream(ctx: &InputContext, interval_ms: u64) -> Stream<InputEvent> {
    let clock = ctx.clock().clone();
    let moved = ctx.moved();
    let end = ctx.end();

    Stream::from_fn(move |out| {
        let throttle = Rc::new(RefCell::new(Throttle::new(interval_ms, clock.now())));

        let on_move = {
            let (throttle, clock) = (throttle.clone(), clock.clone());
            moved.subscribe(move |event| {
                let Some(deadline) = throttle.borrow_mut().offer(*event) else {
                    return;
                };
                let weak = Rc::downgrade(&throttle);
                let out = out.clone();
                let timer = clock.schedule_at(deadline, move |_| {
                    let Some(throttle) = weak.upgrade() else {
                        return;
                    };
                    let sample = throttle.borrow_mut().fire();
                    if let Some(sample) = sample {
                        out.emit(&sample);
                    }
                });
                throttle.borrow_mut().armed(timer);
            })
        };

        let on_end = {
            let (throttle, clock) = (throttle.clone(), clock.clone());
            end.subscribe(move |_| throttle.borrow_mut().reset(&clock))
        };

        let clock = clock.clone();
        Subscription::merge([
            on_move,
            on_end,
            Subscription::new(move || throttle.borrow_mut().reset(&clock)),
        ])
    })
}

#[cfg(test)]
mod tests {
    use crate::combinators::GestureExt;
    use crate::context::tests::{collect, Script};
    use crate::event::Timestamp;
    use std::time::Duration;

    const EVERY: Duration = Duration::from_millis(100);

    #[test]
    fn releases_latest_sample_at_boundary() {
        let mut s = Script::new();
        let (seen, _sub) = collect(&s.ctx.move_throttle(EVERY).unwrap());
        s.begin(0, 0.0, 0.0);
        s.moved(10, 1.0, 0.0);
        s.moved(50, 2.0, 0.0);
        let last = s.moved(90, 3.0, 0.0);
        s.at(99);
        assert!(seen.borrow().is_empty());
        s.at(100);
        assert_eq!(*seen.borrow(), vec![last]);
        s.at(200);
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn one_emission_per_window() {
        let mut s = Script::new();
        let (seen, _sub) = collect(&s.ctx.move_throttle(EVERY).unwrap());
        s.begin(0, 0.0, 0.0);
        for t in (5..300).step_by(5) {
            s.moved(t, t as f32, 0.0);
        }
        s.at(300);
        let times: Vec<u64> = seen.borrow().iter().map(|e| e.at.as_millis()).collect();
        assert_eq!(times, vec![95, 195, 295]);
        assert!(s.ctx.clock().now() >= Timestamp::from_millis(300));
    }

    #[test]
    fn end_discards_pending_sample() {
        let mut s = Script::new();
        let (seen, _sub) = collect(&s.ctx.move_throttle(EVERY).unwrap());
        s.begin(0, 0.0, 0.0);
        s.moved(20, 1.0, 0.0);
        s.end(40, 1.0, 0.0);
        s.at(500);
        assert!(seen.borrow().is_empty());
        assert_eq!(s.ctx.clock().pending(), 0);

        s.begin(600, 0.0, 0.0);
        let m = s.moved(610, 2.0, 0.0);
        s.at(700);
        assert_eq!(*seen.borrow(), vec![m]);
    }

    #[test]
    fn grid_is_anchored_at_subscription() {
        let mut s = Script::new();
        s.at(30);
        let (seen, _sub) = collect(&s.ctx.move_throttle(EVERY).unwrap());
        s.begin(40, 0.0, 0.0);
        s.moved(50, 1.0, 0.0);
        s.at(129);
        assert!(seen.borrow().is_empty());
        s.at(130);
        assert_eq!(seen.borrow().len(), 1);
    }
}
