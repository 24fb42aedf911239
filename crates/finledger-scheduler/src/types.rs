use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Counters since the scheduler was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStats {
    /// Bounded timers armed (one per segment, chain hops included).
    pub timers_armed: u64,
    /// Segments that ended short of the target and were re-armed.
    pub chain_hops: u64,
    /// Notifications delivered after a timer fired.
    pub fired: u64,
    /// Notifications delivered synchronously because the target had passed.
    pub fired_overdue: u64,
    /// Live slots removed by `cancel`, re-`schedule` or `cancel_all`.
    pub cancelled: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub timers_armed: AtomicU64,
    pub chain_hops: AtomicU64,
    pub fired: AtomicU64,
    pub fired_overdue: AtomicU64,
    pub cancelled: AtomicU64,
}

impl Counters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SchedulerStats {
        SchedulerStats {
            timers_armed: self.timers_armed.load(Ordering::Relaxed),
            chain_hops: self.chain_hops.load(Ordering::Relaxed),
            fired: self.fired.load(Ordering::Relaxed),
            fired_overdue: self.fired_overdue.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
        }
    }
}
