use crate::channel::Listener;
use crate::error::ListenerError;
use crate::event::{InputEvent, InputEventType};

/// Determines which kinds of events a listener wants to receive.
#[derive(Debug, Clone, Copy)]
pub enum EventFilter {
    All,
    BeginOnly,
    MoveOnly,
    EndOnly,
    Custom(fn(&InputEvent) -> bool),
}

impl EventFilter {
    pub fn matches(&self, event: &InputEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::BeginOnly => event.kind == InputEventType::Begin,
            EventFilter::MoveOnly => event.kind == InputEventType::Move,
            EventFilter::EndOnly => event.kind == InputEventType::End,
            EventFilter::Custom(f) => f(event),
        }
    }
}

/// Wraps a listener and filters values based on a user-supplied predicate.
pub struct Filtered<T> {
    predicate: Box<dyn Fn(&T) -> bool>,
    inner: Box<dyn Listener<T>>,
}

impl<T: 'static> Filtered<T> {
    pub fn new(predicate: impl Fn(&T) -> bool + 'static, inner: impl Listener<T>) -> Self {
        Self {
            predicate: Box::new(predicate),
            inner: Box::new(inner),
        }
    }
}

impl Filtered<InputEvent> {
    pub fn by_kind(filter: EventFilter, inner: impl Listener<InputEvent>) -> Self {
        Self::new(move |e: &InputEvent| filter.matches(e), inner)
    }
}

impl<T: 'static> Listener<T> for Filtered<T> {
    fn on_event(&mut self, value: &T) -> Result<(), ListenerError> {
        if (self.predicate)(value) {
            self.inner.on_event(value)?;
        }
        Ok(())
    }
}
