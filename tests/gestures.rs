use glam::Vec2;
use pointer_stream::{
    DragEvent, GestureConfig, GestureExt, InputEventType, InputManager, InputObservable,
    MouseSource, PointerSignal, Stream, Subscription, Subscriptions, Timestamp, TouchPhase,
    TouchSample, TouchSource,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::mpsc::Sender;
use std::time::Duration;

const FRAME: u64 = 10;

fn collect<T: Clone + 'static>(stream: &Stream<T>) -> (Rc<RefCell<Vec<T>>>, Subscription) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = seen.clone();
    let sub = stream.subscribe(move |v: &T| s.borrow_mut().push(v.clone()));
    (seen, sub)
}

/// Manager with one mouse source, ticking every `FRAME` ms.
struct Rig {
    manager: InputManager,
    tx: Sender<PointerSignal>,
    now: u64,
}

impl Rig {
    fn new() -> Self {
        let mut manager = InputManager::new();
        let mouse = MouseSource::new(manager.clock(), 0);
        let tx = mouse.sender();
        manager.add_source(mouse);
        Rig { manager, tx, now: 0 }
    }

    fn io(&self) -> &dyn pointer_stream::InputSource {
        self.manager.source(0).unwrap()
    }

    fn send(&self, signal: PointerSignal) {
        self.tx.send(signal).unwrap();
    }

    fn run_until(&mut self, t: u64) {
        while self.now <= t {
            self.manager.tick(Timestamp::from_millis(self.now));
            self.now += FRAME;
        }
    }

    /// Queue `signal` for the frame at `t` and run through it.
    fn at(&mut self, t: u64, signal: PointerSignal) {
        self.run_until(t.saturating_sub(FRAME));
        self.send(signal);
        self.run_until(t);
    }
}

fn down(x: f32, y: f32) -> PointerSignal {
    PointerSignal::Down { position: Vec2::new(x, y) }
}

fn up(x: f32, y: f32) -> PointerSignal {
    PointerSignal::Up { position: Vec2::new(x, y) }
}

fn to(x: f32, y: f32) -> PointerSignal {
    PointerSignal::MoveTo { position: Vec2::new(x, y) }
}

#[test]
fn lump_matches_sequence_exactly() {
    let mut rig = Rig::new();
    let (lumps, _a) = collect(&rig.io().lump());
    let (all, _b) = collect(&rig.io().any());
    rig.at(0, down(0.0, 0.0));
    rig.at(20, to(5.0, 0.0));
    rig.at(40, to(9.0, 2.0));
    rig.at(60, up(9.0, 2.0));
    assert_eq!(lumps.borrow().len(), 1);
    assert_eq!(lumps.borrow()[0].events, *all.borrow());
    let kinds: Vec<_> = all.borrow().iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            InputEventType::Begin,
            InputEventType::Move,
            InputEventType::Move,
            InputEventType::End
        ]
    );
}

#[test]
fn double_click_boundary_through_manager() {
    for (second_press, expected) in [(250, 1), (260, 0)] {
        let mut rig = Rig::new();
        let (seen, _sub) = collect(&rig.io().double_sequence(Duration::from_millis(250)).unwrap());
        rig.at(0, down(0.0, 0.0));
        rig.at(10, up(0.0, 0.0));
        rig.at(10 + second_press, down(0.0, 0.0));
        rig.at(20 + second_press, up(0.0, 0.0));
        assert_eq!(seen.borrow().len(), expected, "gap {second_press}");
    }
}

#[test]
fn drag_and_drop_session() {
    let mut rig = Rig::new();
    let (seen, _sub) = collect(
        &rig.io()
            .drag_and_drop(Duration::from_millis(500), Duration::from_millis(100))
            .unwrap(),
    );
    rig.at(0, down(10.0, 10.0));
    rig.run_until(500);
    for (i, t) in (510..=700).step_by(10).enumerate() {
        rig.at(t, to(10.0 + i as f32, 10.0));
    }
    rig.at(710, up(30.0, 10.0));
    rig.run_until(1000);

    let seen = seen.borrow();
    assert!(matches!(seen.first(), Some(DragEvent::Begin(_))));
    assert!(matches!(seen.last(), Some(DragEvent::Drop(_))));
    let dragging: Vec<u64> = seen
        .iter()
        .filter_map(|d| match d {
            DragEvent::Dragging(e) => Some(e.at.as_millis()),
            _ => None,
        })
        .collect();
    assert_eq!(dragging, vec![600, 700]);
}

#[test]
fn clearing_a_bag_silences_everything() {
    let mut rig = Rig::new();
    let config = GestureConfig::default();
    let set = config.gestures(rig.io()).unwrap();
    let count = Rc::new(RefCell::new(0usize));
    let mut bag = Subscriptions::new();
    for stream in [set.long_press.clone(), set.throttled_move.clone()] {
        let c = count.clone();
        bag.add(stream.subscribe(move |_| *c.borrow_mut() += 1));
    }
    let c = count.clone();
    bag.add(set.drag.subscribe(move |_| *c.borrow_mut() += 1));
    assert_eq!(bag.len(), 3);

    rig.at(0, down(0.0, 0.0));
    rig.run_until(520);
    let before = *count.borrow();
    assert_eq!(before, 2);
    bag.clear();
    assert_eq!(rig.manager.clock().pending(), 0);
    rig.at(540, to(50.0, 0.0));
    rig.at(700, up(50.0, 0.0));
    rig.run_until(1000);
    assert_eq!(*count.borrow(), before);
}

#[test]
fn touch_and_mouse_slots_are_independent() {
    let mut manager = InputManager::new();
    let mouse = MouseSource::new(manager.clock(), 0);
    let touch = TouchSource::new(manager.clock(), 0);
    let mouse_tx = mouse.sender();
    let touch_tx = touch.sender();
    let (mouse_seen, _a) = collect(&mouse.any());
    let (touch_seen, _b) = collect(&touch.any());
    manager.add_source(mouse);
    manager.add_source(touch);

    mouse_tx.send(down(1.0, 1.0)).unwrap();
    touch_tx
        .send(TouchSample::new(TouchPhase::Began, Vec2::new(100.0, 100.0)))
        .unwrap();
    manager.tick(Timestamp::from_millis(0));
    touch_tx
        .send(TouchSample::new(TouchPhase::Ended, Vec2::new(100.0, 100.0)))
        .unwrap();
    manager.tick(Timestamp::from_millis(16));

    assert_eq!(mouse_seen.borrow().len(), 1);
    assert_eq!(touch_seen.borrow().len(), 2);
    assert_ne!(mouse_seen.borrow()[0].sender, touch_seen.borrow()[0].sender);
    assert!(manager.source(0).unwrap().began());
    assert!(!manager.source(1).unwrap().began());
}

#[cfg(feature = "replay")]
#[test]
fn replayed_recording_drives_velocity() {
    use pointer_stream::{Recording, ReplaySource};

    let mut recording = Recording::new();
    recording
        .push(0, down(0.0, 0.0))
        .push(16, to(3.0, 4.0))
        .push(32, to(6.0, 8.0))
        .push(48, up(6.0, 8.0));

    let mut manager = InputManager::new();
    let replay = ReplaySource::new(manager.clock(), recording);
    let (velocities, _sub) = collect(&replay.velocity());
    let (windows, _w) = collect(&replay.last_velocities(2).unwrap());
    manager.add_source(replay);
    for frame in 0..5 {
        manager.tick(Timestamp::from_millis(frame * 16));
    }

    let vectors: Vec<Vec2> = velocities.borrow().iter().map(|v| v.vector).collect();
    assert_eq!(
        vectors,
        vec![Vec2::new(3.0, 4.0), Vec2::new(3.0, 4.0), Vec2::ZERO]
    );
    let sizes: Vec<usize> = windows.borrow().iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![1, 2, 2]);
}
