use crate::clock::{Clock, TimerHandle};
use crate::context::InputContext;
use crate::event::InputEvent;
use crate::stream::{Emitter, Stream};
use crate::subscription::Subscription;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// Pending press of the current sequence.
#[derive(Default)]
struct PressState {
    begin: Option<InputEvent>,
    timer: Option<TimerHandle>,
}

impl PressState {
    fn disarm(&mut self, clock: &Clock) {
        if let Some(timer) = self.timer.take() {
            clock.cancel(timer);
        }
        self.begin = None;
    }
}

fn arm(
    state: &Rc<RefCell<PressState>>,
    clock: &Clock,
    out: &Emitter<InputEvent>,
    begin: &InputEvent,
    threshold: Duration,
) {
    state.borrow_mut().disarm(clock);

    let weak = Rc::downgrade(state);
    let fire_out = out.clone();
    let armed = clock.schedule_after(threshold, move |_| {
        let Some(state) = weak.upgrade() else {
            return;
        };
        let fired = {
            let mut st = state.borrow_mut();
            st.timer = None;
            st.begin.take()
        };
        if let Some(begin) = fired {
            fire_out.emit(&begin);
        }
    });

    match armed {
        Ok(timer) => {
            let mut st = state.borrow_mut();
            st.begin = Some(*begin);
            st.timer = Some(timer);
        }
        Err(err) => out.fail(err),
    }
}

pub(super) fn stream(ctx: &InputContext, threshold: Duration, tolerance: f32) -> Stream<InputEvent> {
    let clock = ctx.clock().clone();
    let begin = ctx.begin();
    let moved = ctx.moved();
    let end = ctx.end();

    Stream::from_fn(move |out| {
        let state = Rc::new(RefCell::new(PressState::default()));

        let on_begin = {
            let (state, clock, out) = (state.clone(), clock.clone(), out.clone());
            begin.subscribe(move |event| arm(&state, &clock, &out, event, threshold))
        };

        let on_move = {
            let (state, clock) = (state.clone(), clock.clone());
            moved.subscribe(move |event| {
                let mut st = state.borrow_mut();
                let strayed = st
                    .begin
                    .is_some_and(|b| b.position.distance(event.position) > tolerance);
                if strayed {
                    st.disarm(&clock);
                }
            })
        };

        let on_end = {
            let (state, clock) = (state.clone(), clock.clone());
            end.subscribe(move |_| state.borrow_mut().disarm(&clock))
        };

        let clock = clock.clone();
        Subscription::merge([
            on_begin,
            on_move,
            on_end,
            Subscription::new(move || state.borrow_mut().disarm(&clock)),
        ])
    })
}
