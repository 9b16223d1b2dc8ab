//! Per-slot observable context.
//!
//! One [`InputContext`] exists per logical pointer slot (mouse button 0,
//! touch slot 0, ...). It is a pure distribution point: sources stamp and
//! number events, the context routes them to the Begin, Move and End channels
//! and tracks whether a sequence is currently open.

use crate::channel::Channel;
use crate::clock::Clock;
use crate::event::{InputEvent, InputEventType, SourceId};
use crate::filtered_listener::EventFilter;
use crate::stream::Stream;
use std::cell::Cell;
use std::rc::Rc;

#[derive(Clone)]
pub struct InputContext {
    source: SourceId,
    clock: Clock,
    begin: Channel<InputEvent>,
    moved: Channel<InputEvent>,
    end: Channel<InputEvent>,
    began: Rc<Cell<bool>>,
}

impl std::fmt::Debug for InputContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputContext")
            .field("source", &self.source)
            .field("began", &self.began.get())
            .finish()
    }
}

impl InputContext {
    pub fn new(clock: &Clock, source: SourceId) -> Self {
        InputContext {
            source,
            clock: clock.clone(),
            begin: Channel::new(),
            moved: Channel::new(),
            end: Channel::new(),
            began: Rc::new(Cell::new(false)),
        }
    }

    #[inline]
    pub fn source_id(&self) -> SourceId {
        self.source
    }

    #[inline]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// True between a Begin and its matching End.
    #[inline]
    pub fn began(&self) -> bool {
        self.began.get()
    }

    pub fn begin(&self) -> Stream<InputEvent> {
        self.begin.stream()
    }

    pub fn moved(&self) -> Stream<InputEvent> {
        self.moved.stream()
    }

    pub fn end(&self) -> Stream<InputEvent> {
        self.end.stream()
    }

    /// Begin, Move and End interleaved in emission order.
    pub fn any(&self) -> Stream<InputEvent> {
        self.begin().merge(&self.moved()).merge(&self.end())
    }

    /// Route an event to its channel.
    ///
    /// `began()` flips to true before Begin listeners run and back to false
    /// before End listeners run.
    pub fn emit(&self, event: InputEvent) {
        log::trace!("{event}");
        match event.kind {
            InputEventType::Begin => {
                self.began.set(true);
                self.begin.emit(&event);
            }
            InputEventType::Move => self.moved.emit(&event),
            InputEventType::End => {
                self.began.set(false);
                self.end.emit(&event);
            }
        }
    }
}

/// Anything that exposes an [`InputContext`].
///
/// Implemented by the context itself and by every source, so combinators from
/// [`GestureExt`](crate::combinators::GestureExt) work on either.
pub trait InputObservable {
    fn context(&self) -> &InputContext;

    fn begin(&self) -> Stream<InputEvent> {
        self.context().begin()
    }

    fn moved(&self) -> Stream<InputEvent> {
        self.context().moved()
    }

    fn end(&self) -> Stream<InputEvent> {
        self.context().end()
    }

    fn any(&self) -> Stream<InputEvent> {
        self.context().any()
    }

    fn began(&self) -> bool {
        self.context().began()
    }

    /// Merged stream restricted by `filter`.
    fn filtered(&self, filter: EventFilter) -> Stream<InputEvent> {
        self.any().filter(move |e| filter.matches(e))
    }
}

impl InputObservable for InputContext {
    fn context(&self) -> &InputContext {
        self
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::event::Timestamp;
    use glam::Vec2;
    use std::cell::RefCell;

    /// Emits well-formed sequences on a context, stamped with the clock.
    pub(crate) struct Script {
        pub ctx: InputContext,
        seq: u64,
        id: u64,
    }

    impl Script {
        pub(crate) fn new() -> Self {
            Self::with_clock(Clock::new())
        }

        pub(crate) fn with_clock(clock: Clock) -> Self {
            Script {
                ctx: InputContext::new(&clock, SourceId::new(0)),
                seq: 0,
                id: 0,
            }
        }

        pub(crate) fn at(&self, ms: u64) -> &Self {
            self.ctx.clock().advance_to(Timestamp::from_millis(ms));
            self
        }

        fn push(&mut self, kind: InputEventType, x: f32, y: f32) -> InputEvent {
            let e = InputEvent {
                sequence_id: self.seq,
                id: self.id,
                kind,
                position: Vec2::new(x, y),
                sender: self.ctx.source_id(),
                at: self.ctx.clock().now(),
            };
            self.ctx.emit(e);
            e
        }

        pub(crate) fn begin(&mut self, ms: u64, x: f32, y: f32) -> InputEvent {
            self.at(ms);
            self.id = 0;
            let e = self.push(InputEventType::Begin, x, y);
            self.id += 1;
            e
        }

        pub(crate) fn moved(&mut self, ms: u64, x: f32, y: f32) -> InputEvent {
            self.at(ms);
            let e = self.push(InputEventType::Move, x, y);
            self.id += 1;
            e
        }

        pub(crate) fn end(&mut self, ms: u64, x: f32, y: f32) -> InputEvent {
            self.at(ms);
            let e = self.push(InputEventType::End, x, y);
            self.id = 0;
            self.seq += 1;
            e
        }
    }

    pub(crate) fn collect<T: Clone + 'static>(
        stream: &Stream<T>,
    ) -> (Rc<RefCell<Vec<T>>>, crate::Subscription) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let sub = stream.subscribe(move |v: &T| s.borrow_mut().push(v.clone()));
        (seen, sub)
    }

    #[test]
    fn any_interleaves_in_emission_order() {
        let mut s = Script::new();
        let (seen, _sub) = collect(&s.ctx.any());
        s.begin(0, 0.0, 0.0);
        s.moved(10, 1.0, 0.0);
        s.end(20, 1.0, 0.0);
        let kinds: Vec<_> = seen.borrow().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![InputEventType::Begin, InputEventType::Move, InputEventType::End]
        );
    }

    #[test]
    fn began_tracks_open_sequence() {
        let mut s = Script::new();
        let ctx = s.ctx.clone();
        let during_begin = Rc::new(Cell::new(false));
        let during_end = Rc::new(Cell::new(true));
        let (b, e) = (during_begin.clone(), during_end.clone());
        let (c1, c2) = (ctx.clone(), ctx.clone());
        let _s1 = ctx.begin().subscribe(move |_| b.set(c1.began()));
        let _s2 = ctx.end().subscribe(move |_| e.set(c2.began()));
        assert!(!ctx.began());
        s.begin(0, 0.0, 0.0);
        assert!(ctx.began());
        s.end(5, 0.0, 0.0);
        assert!(!ctx.began());
        assert!(during_begin.get());
        assert!(!during_end.get());
    }

    #[test]
    fn detached_end_listeners_stay_attached() {
        let mut s = Script::new();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        s.ctx.end().first().subscribe(move |_| h.set(h.get() + 1)).detach();
        let h = hits.clone();
        s.ctx.end().subscribe(move |_| h.set(h.get() + 10)).detach();
        s.begin(0, 0.0, 0.0);
        s.end(10, 0.0, 0.0);
        assert_eq!(hits.get(), 11);
        s.begin(20, 0.0, 0.0);
        s.end(30, 0.0, 0.0);
        assert_eq!(hits.get(), 21);
    }

    #[test]
    fn filtered_restricts_kinds() {
        let mut s = Script::new();
        let (seen, _sub) = collect(&s.ctx.filtered(EventFilter::EndOnly));
        s.begin(0, 0.0, 0.0);
        s.moved(1, 1.0, 1.0);
        s.end(2, 1.0, 1.0);
        assert_eq!(seen.borrow().len(), 1);
        assert!(seen.borrow()[0].is_end());
    }
}
