use super::{InputSource, PointerSignal, SignalPump};
use crate::channel::Channel;
use crate::clock::Clock;
use crate::context::{InputContext, InputObservable};
use crate::event::{MouseWheelEvent, SourceId};
use crate::stream::Stream;
use glam::Vec2;
use std::sync::mpsc::{self, Receiver, Sender};

/// One mouse button as a pointer slot.
///
/// Press and release of `button` delimit sequences; cursor movement while
/// pressed produces Moves. Wheel deltas are reported on their own stream
/// regardless of the button state.
pub struct MouseSource {
    name: String,
    button: u8,
    ctx: InputContext,
    wheel: Channel<MouseWheelEvent>,
    pump: SignalPump,
    tx: Sender<PointerSignal>,
    rx: Receiver<PointerSignal>,
}

impl MouseSource {
    pub fn new(clock: &Clock, button: u8) -> Self {
        let id = SourceId::next();
        let (tx, rx) = mpsc::channel();
        MouseSource {
            name: format!("mouse:{button}"),
            button,
            ctx: InputContext::new(clock, id),
            wheel: Channel::new(),
            pump: SignalPump::new(id),
            tx,
            rx,
        }
    }

    /// Ignore presses that start over UI for which `captures` returns true.
    pub fn with_ui_capture(mut self, captures: impl Fn(Vec2) -> bool + 'static) -> Self {
        self.pump.set_ui_capture(Box::new(captures));
        self
    }

    #[inline]
    pub fn button(&self) -> u8 {
        self.button
    }

    /// Sender for platform glue; may be moved to another thread.
    pub fn sender(&self) -> Sender<PointerSignal> {
        self.tx.clone()
    }

    /// Queue a signal for the next poll.
    pub fn feed(&self, signal: PointerSignal) {
        // Cannot fail: `self.rx` keeps the channel open.
        let _ = self.tx.send(signal);
    }

    pub fn wheel(&self) -> Stream<MouseWheelEvent> {
        self.wheel.stream()
    }
}

impl InputObservable for MouseSource {
    fn context(&self) -> &InputContext {
        &self.ctx
    }
}

impl InputSource for MouseSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn poll(&mut self) {
        let delta = self.pump.step(&self.ctx, self.rx.try_iter());
        if delta != 0.0 {
            self.wheel.emit(&MouseWheelEvent {
                position: self.pump.position(),
                wheel: delta,
                sender: self.ctx.source_id(),
                at: self.ctx.clock().now(),
            });
        }
    }
}
