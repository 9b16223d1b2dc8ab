//! Subscription handles.
//!
//! A [`Subscription`] keeps a listener attached. Calling
//! [`unsubscribe`](Subscription::unsubscribe) or dropping the handle detaches it
//! immediately: once teardown returns, the listener is never called again and
//! every timer the subscription armed is disarmed.

use crate::channel::ListenerId;

#[must_use = "dropping a Subscription unsubscribes it"]
pub struct Subscription {
    listener: Option<ListenerId>,
    teardown: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub(crate) fn new(teardown: impl FnOnce() + 'static) -> Self {
        Subscription {
            listener: None,
            teardown: Some(Box::new(teardown)),
        }
    }

    pub(crate) fn for_listener(id: ListenerId, teardown: impl FnOnce() + 'static) -> Self {
        Subscription {
            listener: Some(id),
            teardown: Some(Box::new(teardown)),
        }
    }

    /// A handle that owns nothing.
    pub fn empty() -> Self {
        Subscription {
            listener: None,
            teardown: None,
        }
    }

    /// Tear down several subscriptions as one, in order.
    pub(crate) fn merge(parts: impl IntoIterator<Item = Subscription>) -> Self {
        let parts: Vec<Subscription> = parts.into_iter().collect();
        Subscription::new(move || drop(parts))
    }

    /// Channel listener id, when this handle was returned by a [`Channel`](crate::Channel).
    #[inline]
    pub fn listener_id(&self) -> Option<ListenerId> {
        self.listener
    }

    pub fn unsubscribe(mut self) {
        self.run_teardown();
    }

    /// Give up the handle and keep the listener attached for the lifetime of
    /// the stream it was subscribed to, or until an operator such as
    /// [`first`](crate::Stream::first) completes it.
    ///
    /// The teardown is leaked, never run: dropping it could release upstream
    /// handles it owns.
    pub fn detach(mut self) {
        if let Some(teardown) = self.teardown.take() {
            std::mem::forget(teardown);
        }
    }

    fn run_teardown(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_teardown();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("listener", &self.listener)
            .field("active", &self.teardown.is_some())
            .finish()
    }
}

/// A bag of subscriptions torn down together.
///
/// Typical use is one bag per UI selection: `clear()` when the selection
/// changes, then wire up the new set.
#[derive(Debug, Default)]
pub struct Subscriptions {
    items: Vec<Subscription>,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, subscription: Subscription) {
        self.items.push(subscription);
    }

    /// Unsubscribe everything, in the order it was added.
    pub fn clear(&mut self) {
        for sub in self.items.drain(..) {
            sub.unsubscribe();
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Extend<Subscription> for Subscriptions {
    fn extend<I: IntoIterator<Item = Subscription>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

impl Drop for Subscriptions {
    fn drop(&mut self) {
        self.clear();
    }
}
