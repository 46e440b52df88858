use std::borrow::Cow;

use bencher::{run_tests_console, Bencher, TestDesc, TestDescAndFn, TestFn, TestOpts};
use spindle_loop::EventLoop;

struct TimerBench {
    timers: usize,
    spread: u64,
}

impl TimerBench {
    fn new(timers: usize, spread: u64) -> Self {
        Self { timers, spread }
    }
}

impl bencher::TDynBenchFn for TimerBench {
    fn run(&self, b: &mut Bencher) {
        let timers = self.timers;
        let spread = self.spread;
        b.iter(|| {
            let event_loop = EventLoop::new();
            event_loop.run(|handle| {
                for i in 0..timers {
                    let delay = i as u64 % spread;
                    handle.schedule_timer(|| {}, delay).unwrap();
                }
            })
        })
    }
}

pub fn benches() -> Vec<TestDescAndFn> {
    let mut benches = vec![];
    for timers in [64, 1024] {
        for spread in [1, 16, 256] {
            benches.push(TestDescAndFn {
                desc: TestDesc {
                    name: Cow::from(format!("bench_timers/timers={}/spread={}", timers, spread)),
                    ignore: false,
                },
                testfn: TestFn::DynBenchFn(Box::new(TimerBench::new(timers, spread))),
            });
        }
    }
    benches
}

fn main() {
    let mut test_opts = TestOpts::default();
    if let Some(arg) = std::env::args().skip(1).find(|arg| *arg != "--bench") {
        test_opts.filter = Some(arg);
    }

    run_tests_console(&test_opts, benches()).unwrap();
}
