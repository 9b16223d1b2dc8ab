//! Cold, composable streams.
//!
//! A [`Stream`] describes how to attach to one or more channels. Nothing
//! happens until [`subscribe`](Stream::subscribe) is called, and each
//! subscription builds its own state: two subscribers of the same stream never
//! share counters, buffers or timers.

use crate::channel::{Callback, Listener};
use crate::error::ListenerError;
use crate::subscription::Subscription;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Downstream end of one subscription.
///
/// Owns the upstream subscription feeding it. Once closed (by teardown, by a
/// completing operator, or by a failing listener) every further `emit` is a
/// no-op and the upstream is released.
pub(crate) struct Emitter<T> {
    alive: Rc<Cell<bool>>,
    sink: Rc<RefCell<Callback<T>>>,
    upstream: Rc<RefCell<Option<Subscription>>>,
}

impl<T> Clone for Emitter<T> {
    fn clone(&self) -> Self {
        Emitter {
            alive: self.alive.clone(),
            sink: self.sink.clone(),
            upstream: self.upstream.clone(),
        }
    }
}

impl<T> Emitter<T> {
    fn new(sink: Callback<T>) -> Self {
        Emitter {
            alive: Rc::new(Cell::new(true)),
            sink: Rc::new(RefCell::new(sink)),
            upstream: Rc::new(RefCell::new(None)),
        }
    }

    /// Keep `upstream` until close. Released at once if already closed.
    fn hold(&self, upstream: Subscription) {
        if self.is_closed() {
            drop(upstream);
        } else {
            *self.upstream.borrow_mut() = Some(upstream);
        }
    }

    pub(crate) fn emit(&self, value: &T) {
        if !self.alive.get() {
            return;
        }
        let result = match self.sink.try_borrow_mut() {
            Ok(mut sink) => sink(value),
            Err(_) => {
                log::warn!("stream listener re-entered itself; nested value dropped");
                return;
            }
        };
        if let Err(err) = result {
            log::error!("stream listener failed and was detached: {err}");
            self.close();
        }
    }

    pub(crate) fn close(&self) {
        self.alive.set(false);
        // Taken out first: dropping it re-enters channels and the clock.
        let upstream = self.upstream.borrow_mut().take();
        drop(upstream);
    }

    #[inline]
    pub(crate) fn is_closed(&self) -> bool {
        !self.alive.get()
    }

    /// Close after an internal failure (e.g. a timer that could not be armed).
    pub(crate) fn fail(&self, err: impl fmt::Display) {
        log::error!("stream terminated: {err}");
        self.close();
    }
}

type Source<T> = dyn Fn(Emitter<T>) -> Subscription;

pub struct Stream<T> {
    source: Rc<Source<T>>,
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Stream {
            source: self.source.clone(),
        }
    }
}

impl<T: 'static> Stream<T> {
    pub(crate) fn from_fn(source: impl Fn(Emitter<T>) -> Subscription + 'static) -> Self {
        Stream {
            source: Rc::new(source),
        }
    }

    pub fn subscribe(&self, mut f: impl FnMut(&T) + 'static) -> Subscription {
        self.attach(Box::new(move |value: &T| {
            f(value);
            Ok(())
        }))
    }

    /// Like [`subscribe`](Self::subscribe), but the callback may fail. A failure
    /// ends this subscription only.
    pub fn try_subscribe(
        &self,
        f: impl FnMut(&T) -> Result<(), ListenerError> + 'static,
    ) -> Subscription {
        self.attach(Box::new(f))
    }

    pub fn subscribe_listener(&self, mut listener: impl Listener<T>) -> Subscription {
        self.attach(Box::new(move |value: &T| listener.on_event(value)))
    }

    fn attach(&self, sink: Callback<T>) -> Subscription {
        let emitter = Emitter::new(sink);
        let upstream = (self.source)(emitter.clone());
        emitter.hold(upstream);
        Subscription::new(move || emitter.close())
    }

    pub fn map<U: 'static>(&self, f: impl Fn(&T) -> U + 'static) -> Stream<U> {
        let upstream = self.clone();
        let f = Rc::new(f);
        Stream::from_fn(move |out: Emitter<U>| {
            let f = f.clone();
            upstream.subscribe(move |value| out.emit(&f(value)))
        })
    }

    pub fn filter(&self, predicate: impl Fn(&T) -> bool + 'static) -> Stream<T> {
        let upstream = self.clone();
        let predicate = Rc::new(predicate);
        Stream::from_fn(move |out: Emitter<T>| {
            let predicate = predicate.clone();
            upstream.subscribe(move |value| {
                if predicate(value) {
                    out.emit(value);
                }
            })
        })
    }

    /// Interleave both streams in emission order.
    pub fn merge(&self, other: &Stream<T>) -> Stream<T> {
        let left = self.clone();
        let right = other.clone();
        Stream::from_fn(move |out: Emitter<T>| {
            let out2 = out.clone();
            Subscription::merge([
                left.subscribe(move |value| out.emit(value)),
                right.subscribe(move |value| out2.emit(value)),
            ])
        })
    }

    /// Forward values until `notifier` produces its first value, then release
    /// both upstreams.
    pub fn take_until<U: 'static>(&self, notifier: &Stream<U>) -> Stream<T> {
        let upstream = self.clone();
        let notifier = notifier.clone();
        Stream::from_fn(move |out: Emitter<T>| {
            let stop = out.clone();
            let stop_sub = notifier.subscribe(move |_| stop.close());
            let value_sub = upstream.subscribe(move |value| out.emit(value));
            Subscription::merge([stop_sub, value_sub])
        })
    }

    /// Forward the first value only, then release the upstream.
    pub fn first(&self) -> Stream<T> {
        let upstream = self.clone();
        Stream::from_fn(move |out: Emitter<T>| {
            upstream.subscribe(move |value| {
                if !out.is_closed() {
                    out.emit(value);
                    out.close();
                }
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Channel;

    fn collect<T: Clone + 'static>(stream: &Stream<T>) -> (Rc<RefCell<Vec<T>>>, Subscription) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let sub = stream.subscribe(move |v: &T| s.borrow_mut().push(v.clone()));
        (seen, sub)
    }

    #[test]
    fn map_and_filter() {
        let ch = Channel::new();
        let (seen, _sub) = collect(&ch.stream().filter(|v: &i32| v % 2 == 0).map(|v| v * 10));
        for v in 1..=4 {
            ch.emit(&v);
        }
        assert_eq!(*seen.borrow(), vec![20, 40]);
    }

    #[test]
    fn merge_preserves_emission_order() {
        let a = Channel::new();
        let b = Channel::new();
        let (seen, _sub) = collect(&a.stream().merge(&b.stream()));
        a.emit(&1);
        b.emit(&2);
        a.emit(&3);
        assert_eq!(*seen.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn take_until_stops_on_notifier() {
        let values = Channel::new();
        let stop: Channel<()> = Channel::new();
        let (seen, _sub) = collect(&values.stream().take_until(&stop.stream()));
        values.emit(&1);
        stop.emit(&());
        values.emit(&2);
        assert_eq!(*seen.borrow(), vec![1]);
    }

    #[test]
    fn first_takes_one() {
        let ch = Channel::new();
        let (seen, _sub) = collect(&ch.stream().first());
        ch.emit(&7);
        ch.emit(&8);
        assert_eq!(*seen.borrow(), vec![7]);
    }

    #[test]
    fn subscriptions_are_independent() {
        let ch = Channel::new();
        let stream = ch.stream().first();
        let (a, _sa) = collect(&stream);
        ch.emit(&1);
        let (b, _sb) = collect(&stream);
        ch.emit(&2);
        assert_eq!(*a.borrow(), vec![1]);
        assert_eq!(*b.borrow(), vec![2]);
    }

    #[test]
    fn dropping_subscription_detaches_upstream() {
        let ch = Channel::new();
        let (seen, sub) = collect(&ch.stream().map(|v: &i32| v + 1));
        assert_eq!(ch.listener_count(), 1);
        drop(sub);
        assert_eq!(ch.listener_count(), 0);
        ch.emit(&1);
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn failing_stream_listener_ends_only_itself() {
        let ch = Channel::new();
        let _bad = ch
            .stream()
            .try_subscribe(|_: &i32| Err(ListenerError::msg("nope")));
        let (seen, _good) = collect(&ch.stream());
        ch.emit(&1);
        ch.emit(&2);
        assert_eq!(*seen.borrow(), vec![1, 2]);
    }

    #[test]
    fn failing_listener_releases_its_upstream() {
        let ch = Channel::new();
        let _bad = ch
            .stream()
            .map(|v: &i32| v + 1)
            .try_subscribe(|_| Err(ListenerError::msg("nope")));
        let (_seen, _good) = collect(&ch.stream());
        assert_eq!(ch.listener_count(), 2);
        ch.emit(&1);
        assert_eq!(ch.listener_count(), 1);
    }

    #[test]
    fn detached_subscription_keeps_listening() {
        let ch = Channel::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        ch.stream()
            .map(|v: &i32| v * 2)
            .subscribe(move |v| s.borrow_mut().push(*v))
            .detach();
        ch.emit(&1);
        ch.emit(&2);
        assert_eq!(*seen.borrow(), vec![2, 4]);
        assert_eq!(ch.listener_count(), 1);
    }

    #[test]
    fn detached_first_completes_and_lets_go() {
        let ch = Channel::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        ch.stream()
            .first()
            .subscribe(move |v: &i32| s.borrow_mut().push(*v))
            .detach();
        assert_eq!(ch.listener_count(), 1);
        ch.emit(&7);
        ch.emit(&8);
        assert_eq!(*seen.borrow(), vec![7]);
        assert_eq!(ch.listener_count(), 0);
    }

    #[test]
    fn detached_take_until_lets_go_of_both_sides() {
        let values = Channel::new();
        let stop: Channel<()> = Channel::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        values
            .stream()
            .take_until(&stop.stream())
            .subscribe(move |v: &i32| s.borrow_mut().push(*v))
            .detach();
        values.emit(&1);
        stop.emit(&());
        values.emit(&2);
        assert_eq!(*seen.borrow(), vec![1]);
        assert_eq!(values.listener_count(), 0);
        assert_eq!(stop.listener_count(), 0);
    }
}
