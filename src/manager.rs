use crate::clock::Clock;
use crate::event::{SourceId, Timestamp};
use crate::sources::InputSource;
#[cfg(feature = "debug-log")]
use crate::subscription::Subscriptions;

/// Owns the clock and the sources of one polling loop.
///
/// Call [`tick`](Self::tick) once per frame. Within a tick:
/// 1. timers due strictly before `now` fire, each at its own deadline;
/// 2. the clock moves to `now`;
/// 3. every source polls, in registration order, stamping events with `now`;
/// 4. timers due at `now` fire.
///
/// An End emitted in step 3 therefore cancels a timer whose deadline is `now`.
pub struct InputManager {
    clock: Clock,
    sources: Vec<Box<dyn InputSource>>,
    #[cfg(feature = "debug-log")]
    traces: Subscriptions,
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InputManager {
    pub fn new() -> Self {
        Self::with_clock(Clock::new())
    }

    pub fn with_clock(clock: Clock) -> Self {
        Self {
            clock,
            sources: vec![],
            #[cfg(feature = "debug-log")]
            traces: Subscriptions::new(),
        }
    }

    /// The clock sources must be built with.
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Registers a source and returns its slot.
    pub fn add_source<S: InputSource + 'static>(&mut self, source: S) -> usize {
        log::info!("registered input source {} ({})", source.name(), source.id());

        #[cfg(feature = "debug-log")]
        {
            let label = source.name().to_string();
            self.traces
                .add(source.any().subscribe_listener(crate::logger::LogListener::new(label)));
        }

        self.sources.push(Box::new(source));
        self.sources.len() - 1
    }

    pub fn source(&self, slot: usize) -> Option<&dyn InputSource> {
        self.sources.get(slot).map(|s| s.as_ref())
    }

    pub fn find(&self, id: SourceId) -> Option<&dyn InputSource> {
        self.sources.iter().map(|s| s.as_ref()).find(|s| s.id() == id)
    }

    pub fn sources(&self) -> impl Iterator<Item = &dyn InputSource> {
        self.sources.iter().map(|s| s.as_ref())
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Run one polling step at `now`.
    pub fn tick(&mut self, now: Timestamp) {
        self.clock.fire_before(now);
        self.clock.set_now(now);
        for source in self.sources.iter_mut() {
            source.poll();
        }
        self.clock.fire_due();
    }
}
