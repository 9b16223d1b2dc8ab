use super::{InputSource, PointerSignal, SignalPump};
use crate::clock::Clock;
use crate::context::{InputContext, InputObservable};
use crate::event::SourceId;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{self, Receiver, Sender};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchPhase {
    Began,
    Moved,
    Stationary,
    Ended,
    Canceled,
}

/// Platform report for one touch slot.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TouchSample {
    pub phase: TouchPhase,
    pub position: Vec2,
}

impl TouchSample {
    pub fn new(phase: TouchPhase, position: Vec2) -> Self {
        TouchSample { phase, position }
    }

    fn signal(self) -> Option<PointerSignal> {
        let position = self.position;
        match self.phase {
            TouchPhase::Began => Some(PointerSignal::Down { position }),
            TouchPhase::Moved => Some(PointerSignal::MoveTo { position }),
            TouchPhase::Stationary => None,
            TouchPhase::Ended | TouchPhase::Canceled => Some(PointerSignal::Up { position }),
        }
    }
}

/// One touch slot (finger index) as a pointer slot.
pub struct TouchSource {
    name: String,
    slot: usize,
    ctx: InputContext,
    pump: SignalPump,
    tx: Sender<TouchSample>,
    rx: Receiver<TouchSample>,
}

impl TouchSource {
    pub fn new(clock: &Clock, slot: usize) -> Self {
        let id = SourceId::next();
        let (tx, rx) = mpsc::channel();
        TouchSource {
            name: format!("touch:{slot}"),
            slot,
            ctx: InputContext::new(clock, id),
            pump: SignalPump::new(id),
            tx,
            rx,
        }
    }

    /// Ignore touches that begin over UI for which `captures` returns true.
    pub fn with_ui_capture(mut self, captures: impl Fn(Vec2) -> bool + 'static) -> Self {
        self.pump.set_ui_capture(Box::new(captures));
        self
    }

    #[inline]
    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn sender(&self) -> Sender<TouchSample> {
        self.tx.clone()
    }

    pub fn feed(&self, sample: TouchSample) {
        let _ = self.tx.send(sample);
    }
}

impl InputObservable for TouchSource {
    fn context(&self) -> &InputContext {
        &self.ctx
    }
}

impl InputSource for TouchSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn poll(&mut self) {
        let signals = self.rx.try_iter().filter_map(TouchSample::signal);
        self.pump.step(&self.ctx, signals);
    }
}
