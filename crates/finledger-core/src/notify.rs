//! Notification sink: how a fired reminder reaches the user.
//!
//! Two delivery variants exist side by side and are picked per call from the
//! current [`PermissionGate`] state:
//!
//! | Permission | Variant          | Behaviour                                   |
//! |------------|------------------|---------------------------------------------|
//! | `granted`  | [`NativeNotifier`] | queued to the native delivery task (mpsc) |
//! | otherwise  | [`AlertNotifier`]  | synchronous blocking alert on a writer    |
//!
//! Delivery is fire-and-forget: nothing here returns an error.

use std::io::Write;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Anything that can show a human-visible alert.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, title: &str, body: &str);
}

/// Native-notification permission, mirroring the states a desktop or browser
/// notification API reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Granted,
    Denied,
    /// Never asked.
    #[default]
    Default,
}

impl Permission {
    fn to_u8(self) -> u8 {
        match self {
            Permission::Granted => 0,
            Permission::Denied => 1,
            Permission::Default => 2,
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            0 => Permission::Granted,
            1 => Permission::Denied,
            _ => Permission::Default,
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Permission::Granted => "granted",
            Permission::Denied => "denied",
            Permission::Default => "default",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "granted" => Ok(Permission::Granted),
            "denied" => Ok(Permission::Denied),
            "default" => Ok(Permission::Default),
            other => Err(format!("unknown permission: {other}")),
        }
    }
}

/// Shared, runtime-updatable permission state. Clones observe the same value.
#[derive(Debug, Clone)]
pub struct PermissionGate(Arc<AtomicU8>);

impl PermissionGate {
    pub fn new(initial: Permission) -> Self {
        Self(Arc::new(AtomicU8::new(initial.to_u8())))
    }

    pub fn get(&self) -> Permission {
        Permission::from_u8(self.0.load(Ordering::Acquire))
    }

    pub fn set(&self, permission: Permission) {
        debug!(%permission, "notification permission changed");
        self.0.store(permission.to_u8(), Ordering::Release);
    }

    pub fn delivery(&self) -> Delivery {
        match self.get() {
            Permission::Granted => Delivery::Native,
            Permission::Denied | Permission::Default => Delivery::Alert,
        }
    }
}

impl Default for PermissionGate {
    fn default() -> Self {
        Self::new(Permission::Default)
    }
}

/// Which delivery variant a notification takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delivery {
    Native,
    Alert,
}

/// A notification handed to the native delivery task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub queued_at: DateTime<Utc>,
}

/// Native delivery: queues onto a bounded channel drained by a separate task.
///
/// `try_send` never blocks the caller; a full or closed queue drops the
/// notification with a warning.
#[derive(Debug, Clone)]
pub struct NativeNotifier {
    tx: mpsc::Sender<Notification>,
}

impl NativeNotifier {
    pub fn new(tx: mpsc::Sender<Notification>) -> Self {
        Self { tx }
    }

    /// Create a notifier together with the receiving end of its queue.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }
}

impl NotificationSink for NativeNotifier {
    fn notify(&self, title: &str, body: &str) {
        let notification = Notification {
            title: title.to_string(),
            body: body.to_string(),
            queued_at: Utc::now(),
        };
        if self.tx.try_send(notification).is_err() {
            warn!(%title, "native notification queue full or closed, notification dropped");
        }
    }
}

/// Blocking alert written straight to an output stream.
pub struct AlertNotifier {
    out: Mutex<Box<dyn Write + Send>>,
}

impl AlertNotifier {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }
}

impl NotificationSink for AlertNotifier {
    fn notify(&self, title: &str, body: &str) {
        let Ok(mut out) = self.out.lock() else {
            warn!(%title, "alert output poisoned, notification dropped");
            return;
        };
        if let Err(e) = write!(out, "{title}\n\n{body}\n").and_then(|_| out.flush()) {
            warn!(%title, error = %e, "alert write failed");
        }
    }
}

/// The sink the scheduler talks to: routes each notification to the native
/// or the alert variant depending on the permission at call time.
pub struct Notifier {
    gate: PermissionGate,
    native: NativeNotifier,
    alert: AlertNotifier,
}

impl Notifier {
    pub fn new(gate: PermissionGate, native: NativeNotifier, alert: AlertNotifier) -> Self {
        Self {
            gate,
            native,
            alert,
        }
    }

    pub fn delivery(&self) -> Delivery {
        self.gate.delivery()
    }

    pub fn gate(&self) -> &PermissionGate {
        &self.gate
    }
}

impl NotificationSink for Notifier {
    fn notify(&self, title: &str, body: &str) {
        match self.delivery() {
            Delivery::Native => self.native.notify(title, body),
            Delivery::Alert => self.alert.notify(title, body),
        }
    }
}
