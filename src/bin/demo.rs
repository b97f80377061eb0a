//! Host demo binary: runs one of the spec's S1-S6 scenarios against a real
//! `WallClock`, for manual inspection. Replaces the teacher's kernel
//! `main.rs` entry point — this is a demonstration surface, not part of the
//! core's scope (SPEC_FULL.md, "Configuration").

use std::thread;
use std::time::Duration as StdDuration;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use chronos_fiber::clock::WallClock;
use chronos_fiber::task::{DefaultStrategy, Exit, Schedule, Task};
use chronos_fiber::{Duration, Scheduler, TimePoint, TracingLog};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Scenario {
    /// S1: one task, ready now, completes on the first spin.
    Immediate,
    /// S2: one task, ready after a fixed delay.
    Delayed,
    /// S3: one task that awaits an in-fiber `Delay`.
    InFiberDelay,
    /// S4: two tasks, dispatch ordered by earliest deadline.
    DeadlinePriority,
}

#[derive(Debug, Parser)]
#[command(name = "chronos-demo", about = "Run a chronos-fiber scheduling scenario")]
struct Cli {
    /// Which scenario to run.
    #[arg(value_enum)]
    scenario: Scenario,

    /// Log verbosity, passed straight to `tracing_subscriber::EnvFilter`.
    #[arg(long, default_value = "chronos_fiber=debug")]
    log: String,
}

fn main() {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(cli.log))
        .init();

    let clock = WallClock::new();
    let mut scheduler = Scheduler::with_logger(4, &clock, TracingLog);

    match cli.scenario {
        Scenario::Immediate => {
            let task = Task::from_future("immediate", async {
                tracing::info!("fiber body ran");
                Exit::Success
            });
            scheduler
                .add(
                    task,
                    Schedule {
                        ready: TimePoint::ZERO,
                        deadline: TimePoint::from_nanos(Duration::from_millis(1).as_nanos()),
                    },
                    Box::new(DefaultStrategy),
                )
                .expect("scheduler has room");
        }
        Scenario::Delayed => {
            let task = Task::from_future("delayed", async {
                tracing::info!("fiber body ran, one second late");
                Exit::Success
            });
            let ready = TimePoint::from_nanos(Duration::from_millis(1_000).as_nanos());
            scheduler
                .add(
                    task,
                    Schedule {
                        ready,
                        deadline: ready + Duration::from_millis(500),
                    },
                    Box::new(DefaultStrategy),
                )
                .expect("scheduler has room");
        }
        Scenario::InFiberDelay => {
            let task = Task::from_future("in-fiber-delay", async {
                tracing::info!("phase 1");
                chronos_fiber::Delay::new(Duration::from_millis(500)).await;
                tracing::info!("phase 2, after delay");
                Exit::Success
            });
            scheduler
                .add(
                    task,
                    Schedule {
                        ready: TimePoint::ZERO,
                        deadline: TimePoint::from_nanos(Duration::from_millis(2_000).as_nanos()),
                    },
                    Box::new(DefaultStrategy),
                )
                .expect("scheduler has room");
        }
        Scenario::DeadlinePriority => {
            let urgent = Task::from_future("urgent", async {
                tracing::info!("urgent task ran first");
                Exit::Success
            });
            let relaxed = Task::from_future("relaxed", async {
                tracing::info!("relaxed task ran second");
                Exit::Success
            });
            scheduler
                .add(
                    relaxed,
                    Schedule {
                        ready: TimePoint::ZERO,
                        deadline: TimePoint::from_nanos(Duration::from_millis(2_000).as_nanos()),
                    },
                    Box::new(DefaultStrategy),
                )
                .expect("scheduler has room");
            scheduler
                .add(
                    urgent,
                    Schedule {
                        ready: TimePoint::ZERO,
                        deadline: TimePoint::from_nanos(Duration::from_millis(500).as_nanos()),
                    },
                    Box::new(DefaultStrategy),
                )
                .expect("scheduler has room");
        }
    }

    while !scheduler.is_done() {
        scheduler.spin();
        if scheduler.is_done() {
            break;
        }
        thread::sleep(StdDuration::from_millis(10));
    }
    tracing::info!("scenario finished");
}
