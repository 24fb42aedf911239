use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use finledger_core::config::SchedulerConfig;
use finledger_core::{NotificationSink, Reminder, ReminderId};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::{
    clock::Clock,
    error::Result,
    types::{Counters, SchedulerStats},
};

/// Bookkeeping for one live reminder.
struct Slot {
    /// Re-issued on every chain hop; only the holder may re-arm or fire.
    ticket: u64,
    /// Chain hops completed so far.
    hops: u32,
    /// Wakes the sleeping task when the slot is cancelled or replaced.
    cancel: CancellationToken,
}

struct Shared {
    slots: DashMap<ReminderId, Slot>,
    sink: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    title: String,
    max_delay: Duration,
    next_ticket: AtomicU64,
    counters: Counters,
}

impl Shared {
    fn issue_ticket(&self) -> u64 {
        self.next_ticket.fetch_add(1, Ordering::Relaxed)
    }

    /// Remove the slot if `ticket` still owns it. Exactly one of
    /// release / cancel succeeds for a given ticket.
    fn release(&self, id: &ReminderId, ticket: u64) -> bool {
        self.slots
            .remove_if(id, |_, slot| slot.ticket == ticket)
            .is_some()
    }

    /// Hand the slot to a fresh ticket for the next chain hop.
    fn advance(&self, id: &ReminderId, ticket: u64) -> Option<u64> {
        let mut slot = self.slots.get_mut(id)?;
        if slot.ticket != ticket {
            return None;
        }
        let next = self.issue_ticket();
        slot.ticket = next;
        slot.hops += 1;
        Some(next)
    }

    fn deliver(&self, id: &ReminderId, body: &str, overdue: bool) {
        self.sink.notify(&self.title, body);
        if overdue {
            Counters::bump(&self.counters.fired_overdue);
        } else {
            Counters::bump(&self.counters.fired);
        }
        info!(reminder_id = %id, overdue, "reminder fired");
    }
}

/// Time left until `target`, or `None` when it is due.
fn remaining(target: DateTime<Utc>, now: DateTime<Utc>) -> Option<Duration> {
    (target - now).to_std().ok().filter(|d| !d.is_zero())
}

/// Owns the id → in-flight timer mapping for every scheduled reminder.
///
/// Construct once per process and share it (by reference or `Arc`) with
/// whatever creates or deletes reminders.
pub struct ReminderScheduler {
    shared: Arc<Shared>,
    runtime: Handle,
}

impl ReminderScheduler {
    /// Create a scheduler bound to the current Tokio runtime.
    ///
    /// `title` is the notification title used for every reminder.
    pub fn new(
        sink: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
        config: &SchedulerConfig,
        title: &str,
    ) -> Result<Self> {
        let runtime = Handle::try_current()?;
        let max_delay = Duration::from_millis(config.effective_max_delay_ms());
        debug!(max_delay_ms = max_delay.as_millis() as u64, "reminder scheduler created");
        Ok(Self {
            shared: Arc::new(Shared {
                slots: DashMap::new(),
                sink,
                clock,
                title: title.to_string(),
                max_delay,
                next_ticket: AtomicU64::new(1),
                counters: Counters::default(),
            }),
            runtime,
        })
    }

    /// Arrange for `reminder` to fire at its target instant.
    ///
    /// Any timer already outstanding for the same id is cancelled first. A
    /// target at or before now fires synchronously, before this returns.
    /// Reminders without an id, text or resolvable datetime are ignored.
    pub fn schedule(&self, reminder: &Reminder) {
        if reminder.id.is_empty() || reminder.text.trim().is_empty() {
            trace!(reminder_id = %reminder.id, "reminder without id or text ignored");
            return;
        }
        let Some(target) = reminder.target_instant() else {
            trace!(reminder_id = %reminder.id, datetime = %reminder.datetime, "unresolvable datetime ignored");
            return;
        };

        self.remove_slot(&reminder.id, "rescheduled");

        let Some(delay) = remaining(target, self.shared.clock.now()) else {
            self.shared.deliver(&reminder.id, &reminder.text, true);
            return;
        };

        let ticket = self.shared.issue_ticket();
        let cancel = CancellationToken::new();
        let slot = Slot {
            ticket,
            hops: 0,
            cancel: cancel.clone(),
        };
        if let Some(stale) = self.shared.slots.insert(reminder.id.clone(), slot) {
            // Lost a race with a concurrent schedule() for the same id.
            stale.cancel.cancel();
            Counters::bump(&self.shared.counters.cancelled);
        }

        debug!(
            reminder_id = %reminder.id,
            fire_at = %target,
            delay_ms = delay.as_millis() as u64,
            "reminder scheduled"
        );

        self.runtime.spawn(run_timer(
            Arc::clone(&self.shared),
            TimerJob {
                id: reminder.id.clone(),
                body: reminder.text.clone(),
                target,
                ticket,
                delay,
                cancel,
            },
        ));
    }

    /// Cancel the outstanding timer for `id`, if any.
    pub fn cancel(&self, id: &ReminderId) {
        self.remove_slot(id, "cancelled");
    }

    /// Cancel every outstanding timer. Returns how many were live.
    pub fn cancel_all(&self) -> usize {
        let ids: Vec<ReminderId> = self
            .shared
            .slots
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        let mut live = 0;
        for id in &ids {
            if self.remove_slot(id, "shutdown") {
                live += 1;
            }
        }
        live
    }

    pub fn is_scheduled(&self, id: &ReminderId) -> bool {
        self.shared.slots.contains_key(id)
    }

    /// Number of reminders with a live timer.
    pub fn pending(&self) -> usize {
        self.shared.slots.len()
    }

    /// Chain hops completed by the live timer for `id`.
    pub fn hops(&self, id: &ReminderId) -> Option<u32> {
        self.shared.slots.get(id).map(|slot| slot.hops)
    }

    pub fn max_delay(&self) -> Duration {
        self.shared.max_delay
    }

    pub fn stats(&self) -> SchedulerStats {
        self.shared.counters.snapshot()
    }

    fn remove_slot(&self, id: &ReminderId, reason: &'static str) -> bool {
        match self.shared.slots.remove(id) {
            Some((_, slot)) => {
                slot.cancel.cancel();
                Counters::bump(&self.shared.counters.cancelled);
                debug!(reminder_id = %id, reason, "reminder timer cancelled");
                true
            }
            None => false,
        }
    }
}

impl Drop for ReminderScheduler {
    fn drop(&mut self) {
        let live = self.cancel_all();
        if live > 0 {
            debug!(count = live, "scheduler dropped with live timers");
        }
    }
}

struct TimerJob {
    id: ReminderId,
    body: String,
    target: DateTime<Utc>,
    ticket: u64,
    delay: Duration,
    cancel: CancellationToken,
}

/// Sleep in segments of at most `max_delay` until the target is reached.
///
/// The chain is a loop, not recursion: after every segment the remaining
/// time is re-measured against the clock, so a reminder never fires before
/// its target even if wall time moved backwards. Re-arming requires still
/// owning the slot.
async fn run_timer(shared: Arc<Shared>, job: TimerJob) {
    let TimerJob {
        id,
        body,
        target,
        mut ticket,
        mut delay,
        cancel,
    } = job;

    loop {
        let segment = delay.min(shared.max_delay);
        Counters::bump(&shared.counters.timers_armed);
        trace!(reminder_id = %id, segment_ms = segment.as_millis() as u64, "timer armed");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(segment) => {}
        }

        let Some(left) = remaining(target, shared.clock.now()) else {
            if shared.release(&id, ticket) {
                shared.deliver(&id, &body, false);
            }
            return;
        };

        // Either a capped segment elapsed or the wall clock was set back
        // while sleeping: re-arm for whatever is left.
        let Some(next) = shared.advance(&id, ticket) else {
            trace!(reminder_id = %id, "chain hop lost ownership");
            return;
        };
        ticket = next;
        Counters::bump(&shared.counters.chain_hops);
        debug!(
            reminder_id = %id,
            remaining_ms = left.as_millis() as u64,
            "chain hop re-armed"
        );
        delay = left;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn remaining_is_none_when_due_or_past() {
        assert!(remaining(t0(), t0()).is_none());
        assert!(remaining(t0(), t0() + chrono::Duration::seconds(5)).is_none());
    }

    #[test]
    fn remaining_is_exact_when_in_future() {
        let left = remaining(t0() + chrono::Duration::milliseconds(1500), t0()).unwrap();
        assert_eq!(left, Duration::from_millis(1500));
    }

    #[test]
    fn new_outside_runtime_is_an_error() {
        struct Null;
        impl NotificationSink for Null {
            fn notify(&self, _: &str, _: &str) {}
        }
        let result = ReminderScheduler::new(
            Arc::new(Null),
            Arc::new(crate::clock::SystemClock),
            &SchedulerConfig::default(),
            "t",
        );
        assert!(matches!(
            result,
            Err(crate::error::SchedulerError::NoRuntime(_))
        ));
    }
}
