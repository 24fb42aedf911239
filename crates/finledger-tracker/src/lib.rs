//! `finledger-tracker` — the personal finance ledger: expense and income
//! entries, timed reminders, and the summaries shown alongside them.

pub mod error;
pub mod summary;
pub mod tracker;

pub use error::{Result, TrackerError};
pub use summary::{format_currency, BalanceOverview, CategoryTotal};
pub use tracker::{ReminderReceipt, Tracker};
