//! `finledger-core` — record types, configuration, errors and the notification
//! sink shared by the scheduler, the store and the tracker.

pub mod config;
pub mod error;
pub mod notify;
pub mod types;

pub use error::{FinledgerError, Result};
pub use notify::{Delivery, Notification, NotificationSink, Notifier, Permission, PermissionGate};
pub use types::{Expense, Income, Reminder, ReminderId};
