//! pointer-stream: composable pointer and touch event streams.
//!
//! Sources turn raw mouse/touch samples into Begin/Move/End sequences on a
//! per-slot [`InputContext`]. Combinators derive higher-level streams from
//! those sequences: lumps, double taps, long presses, drag-and-drop, throttled
//! moves and velocities. Everything runs on one thread, driven by
//! [`InputManager::tick`] and a logical [`Clock`].
//!
//! ```no_run
//! use pointer_stream::{GestureExt, InputManager, MouseSource, Subscriptions, Timestamp};
//! use std::time::Duration;
//!
//! let mut manager = InputManager::new();
//! let mouse = MouseSource::new(manager.clock(), 0);
//! let mut subs = Subscriptions::new();
//! subs.add(
//!     mouse
//!         .double_sequence(Duration::from_millis(250))
//!         .expect("valid threshold")
//!         .subscribe(|d| println!("double click {d}")),
//! );
//! manager.add_source(mouse);
//! for frame in 0..600u64 {
//!     manager.tick(Timestamp::from_millis(frame * 16));
//! }
//! ```

pub mod channel;
pub mod clock;
pub mod combinators;
pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod filtered_listener;
pub mod logger;
pub mod manager;
pub mod sources;
pub mod stream;
pub mod subscription;

pub use channel::{Channel, Listener, ListenerId};
pub use clock::{Clock, TimerHandle};
pub use combinators::{DoubleSequence, DragEvent, GestureExt, Lump};
pub use config::{GestureConfig, GestureSet};
pub use context::{InputContext, InputObservable};
pub use error::*;
pub use event::*;
pub use filtered_listener::{EventFilter, Filtered};
pub use logger::LogListener;
pub use manager::InputManager;
pub use sources::{InputSource, MouseSource, PointerSignal, TouchPhase, TouchSample, TouchSource};
#[cfg(feature = "replay")]
pub use sources::{Recording, ReplaySource, TimedSignal};
pub use stream::Stream;
pub use subscription::{Subscription, Subscriptions};
