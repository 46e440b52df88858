//! Walks through the ordering contract of the event loop.
//!
//! Run with `RUST_LOG=trace` to see the phase transitions.

use spindle_loop::EventLoop;

fn main() {
    env_logger::init();

    let event_loop = EventLoop::new();
    let log = event_loop.run(|handle| {
        println!("sync block");

        let tick_handle = handle.clone();
        handle
            .schedule_timer(
                move || {
                    println!("timer fired at tick {}", tick_handle.current_tick());
                    spindle_loop::schedule_check(|| println!("check, after the timers phase"))
                        .unwrap();
                },
                2,
            )
            .unwrap();

        handle
            .schedule_io(|| {
                println!("poll callback");
                spindle_loop::schedule_microtask(|| println!("microtask from poll")).unwrap();
            })
            .unwrap();

        handle.schedule_priority(|| println!("priority, first")).unwrap();
        handle.schedule_microtask(|| println!("microtask, second")).unwrap();
    });

    println!("executed {} tasks:", log.len());
    for entry in log.entries() {
        println!("  #{} {:?}", entry.id(), entry.kind());
    }
}
