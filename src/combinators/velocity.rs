use crate::context::InputContext;
use crate::event::{InputEvent, InputEventType, VelocityInfo};
use crate::stream::Stream;
use std::collections::VecDeque;

/// Remembers the previous event of the open sequence.
#[derive(Default)]
struct VelocityTracker {
    previous: Option<InputEvent>,
}

impl VelocityTracker {
    fn observe(&mut self, event: &InputEvent) -> Option<VelocityInfo> {
        match event.kind {
            InputEventType::Begin => {
                self.previous = Some(*event);
                None
            }
            InputEventType::Move | InputEventType::End => {
                let velocity = self.previous.map(|prev| VelocityInfo {
                    event: *event,
                    vector: event.position - prev.position,
                });
                self.previous = if event.is_end() { None } else { Some(*event) };
                velocity
            }
        }
    }
}

/// Fixed-size ring of the latest velocities.
struct VelocityWindow {
    capacity: usize,
    ring: VecDeque<VelocityInfo>,
}

impl VelocityWindow {
    fn new(capacity: usize) -> Self {
        VelocityWindow {
            capacity,
            // `capacity` is caller-supplied and may be huge; grow on demand past this.
            ring: VecDeque::with_capacity(capacity.min(64)),
        }
    }

    fn push(&mut self, v: VelocityInfo) -> Vec<VelocityInfo> {
        if self.ring.len() == self.capacity {
            self.ring.pop_front();
        }
        self.ring.push_back(v);
        self.ring.iter().copied().collect()
    }
}

pub(super) fn stream(ctx: &InputContext) -> Stream<VelocityInfo> {
    let any = ctx.any();
    Stream::from_fn(move |out| {
        let mut tracker = VelocityTracker::default();
        any.subscribe(move |event| {
            if let Some(v) = tracker.observe(event) {
                out.emit(&v);
            }
        })
    })
}

/// Emits the window after every velocity sample. The window starts empty at
/// each Begin and is never padded.
pub(super) fn window_stream(ctx: &InputContext, count: usize) -> Stream<Vec<VelocityInfo>> {
    let any = ctx.any();
    Stream::from_fn(move |out| {
        let mut tracker = VelocityTracker::default();
        let mut window = VelocityWindow::new(count);
        any.subscribe(move |event| {
            if event.is_begin() {
                window.ring.clear();
            }
            if let Some(v) = tracker.observe(event) {
                out.emit(&window.push(v));
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use crate::combinators::GestureExt;
    use crate::context::tests::{collect, Script};
    use glam::Vec2;

    #[test]
    fn displacement_from_previous_event() {
        let mut s = Script::new();
        let (seen, _sub) = collect(&s.ctx.velocity());
        s.begin(0, 0.0, 0.0);
        assert!(seen.borrow().is_empty());
        let m = s.moved(16, 3.0, 4.0);
        let e = s.end(32, 4.0, 4.0);
        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].event, m);
        assert_eq!(seen[0].vector, Vec2::new(3.0, 4.0));
        assert_eq!(seen[1].event, e);
        assert_eq!(seen[1].vector, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn does_not_bridge_sequences() {
        let mut s = Script::new();
        let (seen, _sub) = collect(&s.ctx.velocity());
        s.begin(0, 0.0, 0.0);
        s.end(10, 0.0, 0.0);
        s.begin(20, 100.0, 100.0);
        s.moved(30, 101.0, 100.0);
        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].vector, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn window_is_partial_then_bounded() {
        let mut s = Script::new();
        let (seen, _sub) = collect(&s.ctx.last_velocities(4).unwrap());
        s.begin(0, 0.0, 0.0);
        s.moved(1, 1.0, 0.0);
        s.moved(2, 3.0, 0.0);
        {
            let seen = seen.borrow();
            let last = seen.last().unwrap();
            assert_eq!(last.len(), 2);
            assert_eq!(last[0].vector, Vec2::new(1.0, 0.0));
            assert_eq!(last[1].vector, Vec2::new(2.0, 0.0));
        }
        for (t, x) in [(3, 6.0), (4, 10.0), (5, 15.0), (6, 21.0)] {
            s.moved(t, x, 0.0);
        }
        let seen = seen.borrow();
        assert_eq!(seen.len(), 6);
        let xs: Vec<f32> = seen.last().unwrap().iter().map(|v| v.vector.x).collect();
        assert_eq!(xs, vec![3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn window_restarts_each_sequence() {
        let mut s = Script::new();
        let (seen, _sub) = collect(&s.ctx.last_velocities(4).unwrap());
        s.begin(0, 0.0, 0.0);
        s.moved(1, 1.0, 0.0);
        s.moved(2, 2.0, 0.0);
        s.end(3, 3.0, 0.0);
        s.begin(10, 0.0, 0.0);
        s.moved(11, 0.0, 5.0);
        assert_eq!(seen.borrow().last().unwrap().len(), 1);
    }

    #[test]
    fn huge_window_behaves_like_unbounded() {
        let mut s = Script::new();
        let (seen, _sub) = collect(&s.ctx.last_velocities(usize::MAX).unwrap());
        s.begin(0, 0.0, 0.0);
        for t in 1..=100 {
            s.moved(t, t as f32, 0.0);
        }
        let seen = seen.borrow();
        assert_eq!(seen.len(), 100);
        assert_eq!(seen.last().unwrap().len(), 100);
    }
}
