//! Replays a scripted pointer session through each gesture mode and logs what
//! the combinators report.
//!
//! ```text
//! RUST_LOG=info cargo run --example trace
//! RUST_LOG=info cargo run --example trace -- drag path/to/recording.json
//! ```

use glam::Vec2;
use pointer_stream::{
    GestureExt, InputManager, InputObservable, PointerSignal, Recording, ReplaySource,
    Subscriptions, Timestamp,
};
use std::path::Path;
use std::time::Duration;

const FRAME_MS: u64 = 16;

#[derive(Clone, Copy, Debug)]
enum Mode {
    Basic,
    Lump,
    Double,
    LongPress,
    DragAndDrop,
    Last4,
    Last16,
    Velocity,
}

impl Mode {
    const ALL: [Mode; 8] = [
        Mode::Basic,
        Mode::Lump,
        Mode::Double,
        Mode::LongPress,
        Mode::DragAndDrop,
        Mode::Last4,
        Mode::Last16,
        Mode::Velocity,
    ];

    fn parse(name: &str) -> Option<Mode> {
        Some(match name {
            "basic" => Mode::Basic,
            "lump" => Mode::Lump,
            "double" => Mode::Double,
            "long" => Mode::LongPress,
            "drag" => Mode::DragAndDrop,
            "last4" => Mode::Last4,
            "last16" => Mode::Last16,
            "velocity" => Mode::Velocity,
            _ => return None,
        })
    }
}

/// Wire `mode` onto `io`. Everything lands in `subs`, so clearing the bag
/// switches the mode off.
fn select<O: InputObservable + ?Sized>(
    mode: Mode,
    io: &O,
    subs: &mut Subscriptions,
) -> Result<(), Box<dyn std::error::Error>> {
    subs.clear();
    log::info!("mode {mode:?}");
    match mode {
        Mode::Basic => {
            subs.add(io.begin().subscribe(|e| log::info!("begin {e}")));
            subs.add(io.moved().subscribe(|e| log::info!("move {e}")));
            subs.add(io.end().subscribe(|e| log::info!("end {e}")));
        }
        Mode::Lump => {
            subs.add(io.lump().subscribe(|lump| {
                log::info!("lump of {} event(s), {} dropped", lump.len(), lump.dropped);
            }));
        }
        Mode::Double => {
            subs.add(
                io.double_sequence(Duration::from_millis(250))?
                    .subscribe(|d| log::info!("{d}")),
            );
        }
        Mode::LongPress => {
            subs.add(
                io.long_sequence(Duration::from_millis(500))?
                    .subscribe(|e| log::info!("long press {e}")),
            );
        }
        Mode::DragAndDrop => {
            // Built by hand from the primitives; drag_and_drop() packages the same thing.
            let throttled = io.move_throttle(Duration::from_millis(100))?;
            let end = io.end();
            subs.add(
                io.long_sequence(Duration::from_millis(500))?
                    .subscribe(move |begin| {
                        log::info!("drag start {begin}");
                        throttled
                            .take_until(&end)
                            .subscribe(|e| log::info!("dragging {e}"))
                            .detach();
                        end.first()
                            .subscribe(|e| log::info!("drop {e}"))
                            .detach();
                    }),
            );
        }
        Mode::Last4 | Mode::Last16 => {
            let count = if matches!(mode, Mode::Last4) { 4 } else { 16 };
            subs.add(io.last_velocities(count)?.subscribe(|window| {
                let sum: Vec2 = window.iter().map(|v| v.vector).sum();
                log::info!("last {} velocities sum {sum}", window.len());
            }));
        }
        Mode::Velocity => {
            subs.add(io.velocity().subscribe(|v| log::info!("velocity {v}")));
        }
    }
    Ok(())
}

/// Click, double click, a long hold and a drag.
fn scripted() -> Recording {
    let down = |x, y| PointerSignal::Down { position: Vec2::new(x, y) };
    let up = |x, y| PointerSignal::Up { position: Vec2::new(x, y) };
    let to = |x, y| PointerSignal::MoveTo { position: Vec2::new(x, y) };

    let mut rec = Recording::new();
    rec.push(0, down(10.0, 10.0))
        .push(32, to(14.0, 12.0))
        .push(64, up(14.0, 12.0))
        .push(160, down(14.0, 12.0))
        .push(224, up(14.0, 12.0));
    rec.push(600, down(100.0, 100.0));
    for step in 0..30u16 {
        let t = 1200 + u64::from(step) * FRAME_MS;
        rec.push(t, to(100.0 + f32::from(step) * 4.0, 100.0 + f32::from(step)));
    }
    rec.push(1800, up(216.0, 129.0));
    rec
}

fn run(mode: Mode, recording: Recording) -> Result<(), Box<dyn std::error::Error>> {
    let mut manager = InputManager::new();
    let end = manager.clock().now().as_millis() + recording.duration_ms() + 1000;
    let replay = ReplaySource::new(manager.clock(), recording);
    let mut subs = Subscriptions::new();
    select(mode, &replay, &mut subs)?;
    manager.add_source(replay);

    let mut now = 0;
    while now <= end {
        manager.tick(Timestamp::from_millis(now));
        now += FRAME_MS;
    }
    subs.clear();
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let modes = match args.next() {
        Some(name) => match Mode::parse(&name) {
            Some(mode) => vec![mode],
            None => {
                log::error!("unknown mode {name}");
                return Ok(());
            }
        },
        None => Mode::ALL.to_vec(),
    };
    let recording = match args.next() {
        Some(path) => Recording::load(Path::new(&path))?,
        None => scripted(),
    };

    for mode in modes {
        run(mode, recording.clone())?;
    }
    Ok(())
}
