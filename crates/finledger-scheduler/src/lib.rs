//! `finledger-scheduler` — fires reminder notifications at arbitrary future
//! instants using timers whose delay is capped at [`MAX_DELAY_MS`].
//!
//! # Overview
//!
//! Each scheduled reminder owns one slot in an id → slot map. The slot holds a
//! ticket and a cancellation token; one Tokio task per slot sleeps in bounded
//! segments until the target instant is reached.
//!
//! | Delay                 | Behaviour                                           |
//! |-----------------------|-----------------------------------------------------|
//! | `<= 0`                | Overdue: notify synchronously, no timer, no slot    |
//! | `<= MAX_DELAY`        | One timer, notify on fire, slot cleared             |
//! | `>  MAX_DELAY`        | Chain hops of `MAX_DELAY`, re-measured on each fire |
//!
//! A task only re-arms or fires while it still holds the slot's current
//! ticket, so `cancel` and re-`schedule` win over any hop already in flight.

pub mod clock;
pub mod engine;
pub mod error;
pub mod types;

pub use clock::{Clock, SystemClock, TokioClock};
pub use engine::ReminderScheduler;
pub use error::{Result, SchedulerError};
pub use finledger_core::config::MAX_TIMER_DELAY_MS as MAX_DELAY_MS;
pub use types::SchedulerStats;
