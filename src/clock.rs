//! Logical clock and timers.
//!
//! Time only moves when the polling loop (or a test) advances it. Timers are
//! one-shot callbacks ordered by deadline, then by the order they were armed.
//! A timer cancelled before its callback is invoked never runs; a callback that
//! cancels another timer due at the same instant wins over it.
//!
//! The clock is a cheap, cloneable handle. It is single-threaded: share it
//! between the sources and combinators of one polling loop.

use crate::error::TimerError;
use crate::event::Timestamp;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

type TimerCallback = Box<dyn FnOnce(Timestamp)>;

/// Handle to an armed timer, used to cancel it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle {
    deadline: Timestamp,
    seq: u64,
}

impl TimerHandle {
    #[inline]
    pub fn deadline(&self) -> Timestamp {
        self.deadline
    }
}

struct ClockInner {
    now: Cell<Timestamp>,
    next_seq: Cell<u64>,
    timers: RefCell<BTreeMap<TimerHandle, TimerCallback>>,
}

#[derive(Clone)]
pub struct Clock {
    inner: Rc<ClockInner>,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Clock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clock")
            .field("now", &self.now())
            .field("pending", &self.pending())
            .finish()
    }
}

impl Clock {
    pub fn new() -> Self {
        Self::starting_at(Timestamp::ZERO)
    }

    pub fn starting_at(now: Timestamp) -> Self {
        Clock {
            inner: Rc::new(ClockInner {
                now: Cell::new(now),
                next_seq: Cell::new(0),
                timers: RefCell::new(BTreeMap::new()),
            }),
        }
    }

    #[inline]
    pub fn now(&self) -> Timestamp {
        self.inner.now.get()
    }

    /// Number of armed timers.
    pub fn pending(&self) -> usize {
        self.inner.timers.borrow().len()
    }

    /// Arm a timer firing `delay` after now.
    pub fn schedule_after(
        &self,
        delay: Duration,
        callback: impl FnOnce(Timestamp) + 'static,
    ) -> Result<TimerHandle, TimerError> {
        let now = self.now();
        let deadline = now.checked_add(delay).ok_or(TimerError::Overflow {
            now: now.as_millis(),
            delay_ms: delay.as_millis(),
        })?;
        Ok(self.schedule_at(deadline, callback))
    }

    /// Arm a timer at an absolute deadline.
    ///
    /// A deadline already in the past fires on the next advance.
    pub fn schedule_at(
        &self,
        deadline: Timestamp,
        callback: impl FnOnce(Timestamp) + 'static,
    ) -> TimerHandle {
        let seq = self.inner.next_seq.get();
        self.inner.next_seq.set(seq + 1);
        let handle = TimerHandle { deadline, seq };
        self.inner.timers.borrow_mut().insert(handle, Box::new(callback));
        handle
    }

    /// Disarm a timer. Returns `false` if it already fired or was cancelled.
    pub fn cancel(&self, handle: TimerHandle) -> bool {
        self.inner.timers.borrow_mut().remove(&handle).is_some()
    }

    /// Move time forward to `now`, firing every timer due on the way.
    ///
    /// Each callback observes `now()` equal to its own deadline. Moving
    /// backwards is ignored.
    pub fn advance_to(&self, now: Timestamp) {
        self.fire_before(now);
        self.set_now(now);
        self.fire_due();
    }

    /// Convenience for `advance_to(now + d)`.
    pub fn advance_by(&self, d: Duration) {
        match self.now().checked_add(d) {
            Some(t) => self.advance_to(t),
            None => log::error!("clock advance by {d:?} overflows"),
        }
    }

    /// Fire timers with a deadline strictly before `limit`.
    pub(crate) fn fire_before(&self, limit: Timestamp) {
        self.run_while(|deadline| deadline < limit);
    }

    /// Fire timers with a deadline at or before the current time.
    pub(crate) fn fire_due(&self) {
        let now = self.now();
        self.run_while(|deadline| deadline <= now);
    }

    pub(crate) fn set_now(&self, now: Timestamp) {
        if now < self.now() {
            log::warn!("clock asked to move backwards from {} to {}", self.now(), now);
            return;
        }
        self.inner.now.set(now);
    }

    fn run_while(&self, due: impl Fn(Timestamp) -> bool) {
        loop {
            // The borrow must end before the callback runs: callbacks arm and
            // cancel timers.
            let next = {
                let mut timers = self.inner.timers.borrow_mut();
                match timers.first_key_value() {
                    Some((handle, _)) if due(handle.deadline) => timers.pop_first(),
                    _ => None,
                }
            };
            let Some((handle, callback)) = next else {
                break;
            };
            if handle.deadline > self.now() {
                self.inner.now.set(handle.deadline);
            }
            callback(handle.deadline);
        }
    }
}
