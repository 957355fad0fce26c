#![allow(dead_code)]

use std::thread;
use std::time::Duration;

use dagpool::Task;

pub use dagpool_test_utils::builders;
pub use dagpool_test_utils::{init_tracing, with_timeout, OutputBuffer};

pub fn sleep_ms(ms: u64) {
    thread::sleep(Duration::from_millis(ms));
}

/// Task that appends `s` to `out`.
pub fn write(out: &OutputBuffer, s: &'static str) -> Task {
    let out = out.clone();
    Task::new(move || {
        out.push(s);
        Ok(())
    })
    .with_label(s)
}

/// Task that appends `s` to `out`, then sleeps.
pub fn write_then_sleep(out: &OutputBuffer, s: &'static str, ms: u64) -> Task {
    let out = out.clone();
    Task::new(move || {
        out.push(s);
        sleep_ms(ms);
        Ok(())
    })
    .with_label(s)
}

/// Task that sleeps, then appends `s` to `out`.
pub fn sleep_then_write(out: &OutputBuffer, s: &'static str, ms: u64) -> Task {
    let out = out.clone();
    Task::new(move || {
        sleep_ms(ms);
        out.push(s);
        Ok(())
    })
    .with_label(s)
}
