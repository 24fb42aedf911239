use std::sync::Arc;

use finledger_core::config::FinledgerConfig;
use finledger_core::notify::{AlertNotifier, NativeNotifier, Notifier, PermissionGate};
use finledger_scheduler::{ReminderScheduler, SystemClock};
use finledger_store::{CollectionStore, SqliteStore};
use finledger_tracker::{format_currency, Tracker};
use tracing::info;

// Single event loop: scheduler operations and timer callbacks never overlap.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "finledger=info".into()),
        )
        .init();

    // load config: FINLEDGER_CONFIG env > ~/.finledger/finledger.toml
    let config_path = std::env::var("FINLEDGER_CONFIG").ok();
    let config = FinledgerConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        FinledgerConfig::default()
    });

    let db_path = &config.storage.path;
    ensure_parent_dir(db_path);
    let store = CollectionStore::new(SqliteStore::open(db_path)?);

    // Notification sink: native queue when permitted, stderr alert otherwise.
    let gate = PermissionGate::new(config.notifications.permission);
    let (native, mut native_rx) = NativeNotifier::channel(config.notifications.capacity);
    let notifier = Arc::new(Notifier::new(
        gate.clone(),
        native,
        AlertNotifier::stderr(),
    ));

    tokio::spawn(async move {
        while let Some(n) = native_rx.recv().await {
            info!(title = %n.title, body = %n.body, at = %n.queued_at, "notification");
        }
    });

    let scheduler = Arc::new(ReminderScheduler::new(
        notifier,
        Arc::new(SystemClock),
        &config.scheduler,
        &config.notifications.title,
    )?);

    let tracker = Tracker::open(store, Arc::clone(&scheduler), gate);
    let balance = tracker.balance();
    info!(
        income = %format_currency(balance.income, &config.currency),
        expenses = %format_currency(balance.expenses, &config.currency),
        net = %format_currency(balance.net, &config.currency),
        pending_reminders = scheduler.pending(),
        delivery = ?tracker.delivery(),
        "finledger running, Ctrl-C to stop"
    );

    tokio::signal::ctrl_c().await?;

    let cancelled = scheduler.cancel_all();
    info!(cancelled, "finledger shutting down");
    Ok(())
}

/// Ensure the parent directory for a file path exists.
fn ensure_parent_dir(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
}
