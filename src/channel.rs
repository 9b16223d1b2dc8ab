use crate::error::ListenerError;
use crate::stream::Stream;
use crate::subscription::Subscription;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Trait for reacting to values delivered by a channel or stream.
///
/// Returning an error detaches this listener only.
pub trait Listener<T>: 'static {
    fn on_event(&mut self, value: &T) -> Result<(), ListenerError>;
}

pub(crate) type Callback<T> = Box<dyn FnMut(&T) -> Result<(), ListenerError>>;

/// Identifies a listener registered on one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Listener with its control flags.
struct ListenerEntry<T> {
    id: ListenerId,
    enabled: Cell<bool>,
    removed: Cell<bool>,
    callback: RefCell<Callback<T>>,
}

struct Bus<T> {
    next_id: Cell<u64>,
    listeners: RefCell<Vec<Rc<ListenerEntry<T>>>>,
}

impl<T> Bus<T> {
    fn remove(&self, id: ListenerId) {
        self.listeners.borrow_mut().retain(|entry| {
            if entry.id == id {
                entry.removed.set(true);
                false
            } else {
                true
            }
        });
    }

    fn find(&self, id: ListenerId) -> Option<Rc<ListenerEntry<T>>> {
        self.listeners
            .borrow()
            .iter()
            .find(|entry| entry.id == id)
            .cloned()
    }
}

/// Hot broadcast point.
///
/// Listeners receive every value emitted after they subscribe, in
/// subscription order; nothing is replayed. Dispatch runs over a snapshot of
/// the listener list: a listener added during dispatch first hears the next
/// value, and a listener removed during dispatch is skipped for the rest of the
/// pass.
pub struct Channel<T> {
    bus: Rc<Bus<T>>,
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Channel {
            bus: self.bus.clone(),
        }
    }
}

impl<T: 'static> Default for Channel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Channel<T> {
    pub fn new() -> Self {
        Channel {
            bus: Rc::new(Bus {
                next_id: Cell::new(0),
                listeners: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Registers a listener.
    pub fn add_listener(&self, mut listener: impl Listener<T>) -> Subscription {
        self.insert(Box::new(move |value: &T| listener.on_event(value)))
    }

    pub fn subscribe(&self, mut f: impl FnMut(&T) + 'static) -> Subscription {
        self.insert(Box::new(move |value: &T| {
            f(value);
            Ok(())
        }))
    }

    pub fn try_subscribe(
        &self,
        f: impl FnMut(&T) -> Result<(), ListenerError> + 'static,
    ) -> Subscription {
        self.insert(Box::new(f))
    }

    fn insert(&self, callback: Callback<T>) -> Subscription {
        let id = ListenerId(self.bus.next_id.get());
        self.bus.next_id.set(id.0 + 1);
        self.bus.listeners.borrow_mut().push(Rc::new(ListenerEntry {
            id,
            enabled: Cell::new(true),
            removed: Cell::new(false),
            callback: RefCell::new(callback),
        }));

        let bus: Weak<Bus<T>> = Rc::downgrade(&self.bus);
        Subscription::for_listener(id, move || {
            if let Some(bus) = bus.upgrade() {
                bus.remove(id);
            }
        })
    }

    /// Enables a previously muted listener.
    pub fn enable(&self, id: ListenerId) {
        if let Some(entry) = self.bus.find(id) {
            entry.enabled.set(true);
        }
    }

    /// Mutes a listener without removing it.
    pub fn disable(&self, id: ListenerId) {
        if let Some(entry) = self.bus.find(id) {
            entry.enabled.set(false);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.bus.listeners.borrow().len()
    }

    /// Emits one value to every enabled listener.
    pub fn emit(&self, value: &T) {
        let snapshot: Vec<Rc<ListenerEntry<T>>> = self.bus.listeners.borrow().clone();
        for entry in snapshot {
            if entry.removed.get() || !entry.enabled.get() {
                continue;
            }
            let result = match entry.callback.try_borrow_mut() {
                Ok(mut callback) => callback(value),
                Err(_) => {
                    log::warn!(
                        "listener {:?} re-entered its own channel; nested value dropped for it",
                        entry.id
                    );
                    continue;
                }
            };
            if let Err(err) = result {
                log::error!("listener {:?} failed and was detached: {err}", entry.id);
                self.bus.remove(entry.id);
            }
        }
    }

    /// Cold view of this channel: each subscription attaches a fresh listener.
    pub fn stream(&self) -> Stream<T> {
        let channel = self.clone();
        Stream::from_fn(move |out| channel.subscribe(move |value| out.emit(value)))
    }
}
