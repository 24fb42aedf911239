//! `finledger-store` — durable key-value storage for the three record
//! collections (expenses, income, reminders).
//!
//! Each collection is one JSON array under a fixed key, loaded once at
//! startup and rewritten whole on every mutation.

pub mod collection;
pub mod db;
pub mod error;
pub mod store;

pub use collection::{Collection, CollectionStore};
pub use error::{Result, StoreError};
pub use store::{KeyValueStore, MemoryStore, SqliteStore};
