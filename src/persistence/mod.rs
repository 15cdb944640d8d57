//! Client-local cart persistence
//!
//! The cart is stored as one JSON document under a fixed key of a
//! localStorage-like key/value store. Every save overwrites the whole record.

mod background;
mod file;
mod memory;

pub use background::BackgroundWriter;
pub use file::FileStorage;
pub use memory::MemoryStorage;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use crate::domain::aggregates::{CartEntry, ProductSnapshot};
use crate::domain::value_objects::{ProductId, Quantity};

pub const CART_STORAGE_KEY: &str = "relieve-cart";

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed cart record: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("background writer has shut down")]
    WriterClosed,
}

pub type Result<T> = std::result::Result<T, PersistenceError>;

/// Port the cart store persists through.
pub trait CartPersistence: Send + Sync {
    fn load(&self) -> Result<Vec<CartEntry>>;
    fn save(&self, entries: &[CartEntry]) -> Result<()>;
}

impl<P: CartPersistence + ?Sized> CartPersistence for Arc<P> {
    fn load(&self) -> Result<Vec<CartEntry>> { (**self).load() }
    fn save(&self, entries: &[CartEntry]) -> Result<()> { (**self).save(entries) }
}

impl<P: CartPersistence + ?Sized> CartPersistence for Box<P> {
    fn load(&self) -> Result<Vec<CartEntry>> { (**self).load() }
    fn save(&self, entries: &[CartEntry]) -> Result<()> { (**self).save(entries) }
}

/// String key/value store with browser localStorage semantics.
pub trait KeyValueStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;
}

/// On-disk shape of one entry. Quantities are read leniently so that a
/// record with a zero or negative quantity drops that entry instead of the cart.
#[derive(Serialize, Deserialize)]
struct StoredEntry {
    product_id: ProductId,
    quantity: i64,
    #[serde(default)]
    product: Option<ProductSnapshot>,
}

impl From<&CartEntry> for StoredEntry {
    fn from(e: &CartEntry) -> Self {
        Self { product_id: e.product_id.clone(), quantity: i64::from(e.quantity.value()), product: e.product.clone() }
    }
}

/// Cart persistence over any key/value storage, under `CART_STORAGE_KEY`.
pub struct LocalCartPersistence<S> {
    storage: S,
    key: String,
}

impl<S: KeyValueStorage> LocalCartPersistence<S> {
    pub fn new(storage: S) -> Self { Self::with_key(storage, CART_STORAGE_KEY) }
    pub fn with_key(storage: S, key: impl Into<String>) -> Self { Self { storage, key: key.into() } }
}

impl<S: KeyValueStorage> CartPersistence for LocalCartPersistence<S> {
    fn load(&self) -> Result<Vec<CartEntry>> {
        let Some(raw) = self.storage.get_item(&self.key)? else { return Ok(Vec::new()) };
        let stored: Vec<StoredEntry> = serde_json::from_str(&raw)?;
        let total = stored.len();
        let entries: Vec<CartEntry> = stored
            .into_iter()
            .filter_map(|s| Quantity::new(s.quantity).map(|q| CartEntry::new(s.product_id, q, s.product)))
            .collect();
        if entries.len() != total {
            tracing::debug!(dropped = total - entries.len(), "Dropped stored cart entries with non-positive quantity");
        }
        Ok(entries)
    }

    fn save(&self, entries: &[CartEntry]) -> Result<()> {
        let stored: Vec<StoredEntry> = entries.iter().map(StoredEntry::from).collect();
        let raw = serde_json::to_string(&stored)?;
        self.storage.set_item(&self.key, &raw)
    }
}
