//! Fuzz target: `Scheduler` schedule / cancel / poll sequences
//!
//! Each input byte pair is one operation.  Checks:
//! - No panics under any operation sequence
//! - `pending()` never exceeds capacity
//! - A cancelled handle never fires and never reports as scheduled
//! - One-shot tasks fire at most once
//!
//! cargo fuzz run fuzz_scheduler

#![no_main]

use libfuzzer_sys::fuzz_target;
use doorlock::clock::Instant;
use doorlock::scheduler::{Scheduler, TaskHandle};

const CAP: usize = 8;

fuzz_target!(|data: &[u8]| {
    let mut sched: Scheduler<u16, CAP> = Scheduler::new();
    let mut issued: Vec<(TaskHandle, bool)> = Vec::new();
    let mut cancelled: Vec<u16> = Vec::new();
    let mut fired: Vec<u32> = Vec::new();
    let mut now = 0u32;

    for op in data.chunks_exact(2) {
        let (kind, arg) = (op[0] % 4, op[1]);
        match kind {
            0 | 1 => {
                let id = issued.len() as u16;
                let repeat = (kind == 1).then(|| u32::from(arg % 16) + 1);
                if let Ok(h) = sched.schedule(id, u32::from(arg % 32), repeat) {
                    issued.push((h, repeat.is_some()));
                    fired.push(0);
                } else {
                    assert_eq!(sched.available(), 0);
                }
            }
            2 => {
                if let Some((h, _)) = issued.get(arg as usize) {
                    sched.cancel(*h);
                    assert!(!sched.is_scheduled(*h));
                    cancelled.push(arg as u16);
                }
            }
            _ => {
                now = now.wrapping_add(u32::from(arg % 24));
                sched.poll(Instant::from_millis(now), |_, id| {
                    assert!(!cancelled.contains(&id), "cancelled task {id} fired");
                    fired[id as usize] += 1;
                });
            }
        }
        assert!(sched.pending() <= CAP);
    }

    for (i, (_, repeating)) in issued.iter().enumerate() {
        if !repeating {
            assert!(fired[i] <= 1, "one-shot {i} fired {} times", fired[i]);
        }
    }
});
