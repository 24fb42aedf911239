use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::Result;
use crate::store::KeyValueStore;

/// The three persisted record collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Expenses,
    Income,
    Reminders,
}

impl Collection {
    pub const ALL: [Collection; 3] = [Collection::Expenses, Collection::Income, Collection::Reminders];

    /// Storage key.
    pub fn key(self) -> &'static str {
        match self {
            Collection::Expenses => "expenses",
            Collection::Income => "income",
            Collection::Reminders => "reminders",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Typed view over a [`KeyValueStore`]: each collection is an ordered JSON
/// array of flat records.
pub struct CollectionStore<S> {
    inner: S,
}

impl<S: KeyValueStore> CollectionStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    /// Load a collection. Missing, unreadable or corrupt data yields an empty
    /// collection; the problem is logged, never returned. Records that do not
    /// fit `T` are skipped one by one, the rest load in order.
    pub fn load<T: DeserializeOwned>(&self, collection: Collection) -> Vec<T> {
        let raw = match self.inner.get(collection.key()) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(%collection, error = %e, "collection read failed; starting empty");
                return Vec::new();
            }
        };

        let rows = match serde_json::from_str::<Option<Vec<Value>>>(&raw) {
            Ok(rows) => rows.unwrap_or_default(),
            Err(e) => {
                warn!(%collection, error = %e, "corrupt collection JSON; starting empty");
                return Vec::new();
            }
        };

        rows.into_iter()
            .enumerate()
            .filter_map(|(index, row)| match serde_json::from_value(row) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(%collection, index, error = %e, "skipping malformed record");
                    None
                }
            })
            .collect()
    }

    /// Rewrite a collection in full, preserving record order.
    pub fn save<T: Serialize>(&self, collection: Collection, records: &[T]) -> Result<()> {
        let json = serde_json::to_string(records)?;
        self.inner.set(collection.key(), &json)
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}
