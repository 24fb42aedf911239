use std::sync::Arc;

use chrono::NaiveDate;
use finledger_core::{Delivery, Expense, Income, PermissionGate, Reminder};
use finledger_scheduler::ReminderScheduler;
use finledger_store::{Collection, CollectionStore, KeyValueStore};
use tracing::{info, instrument};

use crate::error::{Result, TrackerError};
use crate::summary::{self, BalanceOverview, CategoryTotal};

/// Result of creating a reminder.
#[derive(Debug, Clone)]
pub struct ReminderReceipt {
    pub reminder: Reminder,
    /// How the reminder will be delivered given the current permission;
    /// `Alert` means native notifications are unavailable.
    pub delivery: Delivery,
}

/// In-memory mirror of the persisted ledger.
///
/// Every mutation rewrites the collection it touched; a mutation whose write
/// fails is rolled back so memory never runs ahead of storage. Reminders are handed to
/// the shared [`ReminderScheduler`] on creation and on open, and their timer
/// is cancelled before the record is removed.
pub struct Tracker<S> {
    store: CollectionStore<S>,
    scheduler: Arc<ReminderScheduler>,
    permission: PermissionGate,
    expenses: Vec<Expense>,
    income: Vec<Income>,
    reminders: Vec<Reminder>,
}

impl<S: KeyValueStore> Tracker<S> {
    /// Load all collections and re-submit every stored reminder to the
    /// scheduler. Reminders whose time passed while the process was down
    /// fire immediately.
    pub fn open(
        store: CollectionStore<S>,
        scheduler: Arc<ReminderScheduler>,
        permission: PermissionGate,
    ) -> Self {
        let tracker = Self {
            expenses: store.load(Collection::Expenses),
            income: store.load(Collection::Income),
            reminders: store.load(Collection::Reminders),
            store,
            scheduler,
            permission,
        };
        info!(
            expenses = tracker.expenses.len(),
            income = tracker.income.len(),
            reminders = tracker.reminders.len(),
            "ledger loaded"
        );
        tracker.reconcile();
        tracker
    }

    /// Submit every known reminder to the scheduler.
    pub fn reconcile(&self) {
        for reminder in &self.reminders {
            self.scheduler.schedule(reminder);
        }
        info!(
            reminders = self.reminders.len(),
            armed = self.scheduler.pending(),
            "reminders reconciled"
        );
    }

    #[instrument(skip(self))]
    pub fn add_expense(&mut self, category: &str, amount: f64, date: &str) -> Result<&Expense> {
        let category = category.trim();
        if category.is_empty() {
            return Err(TrackerError::Validation("category is required".into()));
        }
        validate_amount(amount)?;
        let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
            .map_err(|e| TrackerError::Validation(format!("invalid date '{date}': {e}")))?;

        self.expenses.push(Expense {
            category: category.to_string(),
            amount,
            date: Some(date),
        });
        if let Err(e) = self.persist(Collection::Expenses) {
            self.expenses.pop();
            return Err(e);
        }
        info!("expense added");
        Ok(&self.expenses[self.expenses.len() - 1])
    }

    pub fn delete_expense(&mut self, index: usize) -> Result<Expense> {
        if index >= self.expenses.len() {
            return Err(TrackerError::NotFound {
                collection: Collection::Expenses.key(),
                index,
            });
        }
        let removed = self.expenses.remove(index);
        if let Err(e) = self.persist(Collection::Expenses) {
            self.expenses.insert(index, removed);
            return Err(e);
        }
        info!(index, category = %removed.category, "expense deleted");
        Ok(removed)
    }

    #[instrument(skip(self))]
    pub fn add_income(&mut self, source: &str, amount: f64) -> Result<&Income> {
        validate_amount(amount)?;
        self.income.push(Income {
            source: source.trim().to_string(),
            amount,
        });
        if let Err(e) = self.persist(Collection::Income) {
            self.income.pop();
            return Err(e);
        }
        info!("income added");
        Ok(&self.income[self.income.len() - 1])
    }

    /// Create, persist and schedule a reminder.
    pub fn add_reminder(&mut self, text: &str, datetime: &str) -> Result<ReminderReceipt> {
        let text = text.trim();
        let datetime = datetime.trim();
        if text.is_empty() || datetime.is_empty() {
            return Err(TrackerError::Validation(
                "reminder text and datetime are both required".into(),
            ));
        }

        let reminder = Reminder::new(text, datetime);
        if reminder.target_instant().is_none() {
            return Err(TrackerError::Validation(format!(
                "unrecognised reminder datetime '{datetime}'"
            )));
        }

        self.reminders.push(reminder.clone());
        if let Err(e) = self.persist(Collection::Reminders) {
            self.reminders.pop();
            return Err(e);
        }
        self.scheduler.schedule(&reminder);

        let delivery = self.permission.delivery();
        info!(reminder_id = %reminder.id, ?delivery, "reminder set");
        Ok(ReminderReceipt { reminder, delivery })
    }

    /// Cancel the reminder's timer, then remove and persist. If the write
    /// fails the reminder is put back and re-armed.
    pub fn delete_reminder(&mut self, index: usize) -> Result<Reminder> {
        let Some(reminder) = self.reminders.get(index) else {
            return Err(TrackerError::NotFound {
                collection: Collection::Reminders.key(),
                index,
            });
        };
        self.scheduler.cancel(&reminder.id);

        let removed = self.reminders.remove(index);
        if let Err(e) = self.persist(Collection::Reminders) {
            self.scheduler.schedule(&removed);
            self.reminders.insert(index, removed);
            return Err(e);
        }
        info!(index, reminder_id = %removed.id, "reminder deleted");
        Ok(removed)
    }

    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn income(&self) -> &[Income] {
        &self.income
    }

    pub fn reminders(&self) -> &[Reminder] {
        &self.reminders
    }

    pub fn scheduler(&self) -> &ReminderScheduler {
        &self.scheduler
    }

    pub fn delivery(&self) -> Delivery {
        self.permission.delivery()
    }

    pub fn total_expenses(&self) -> f64 {
        summary::total_expenses(&self.expenses)
    }

    pub fn total_income(&self) -> f64 {
        summary::total_income(&self.income)
    }

    pub fn balance(&self) -> BalanceOverview {
        summary::balance(&self.expenses, &self.income)
    }

    pub fn category_breakdown(&self) -> Vec<CategoryTotal> {
        summary::category_breakdown(&self.expenses)
    }

    fn persist(&self, collection: Collection) -> Result<()> {
        match collection {
            Collection::Expenses => self.store.save(collection, &self.expenses)?,
            Collection::Income => self.store.save(collection, &self.income)?,
            Collection::Reminders => self.store.save(collection, &self.reminders)?,
        }
        Ok(())
    }
}

fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(TrackerError::Validation(format!(
            "amount must be a positive number, got {amount}"
        )));
    }
    Ok(())
}
