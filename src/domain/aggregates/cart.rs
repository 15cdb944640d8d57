//! Cart Aggregate

use serde::{Deserialize, Serialize};
use crate::domain::aggregates::product::{Product, ProductSnapshot};
use crate::domain::events::{CartEvent, DomainEvent};
use crate::domain::value_objects::{Money, ProductId, Quantity};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartEntry {
    pub product_id: ProductId,
    pub quantity: Quantity,
    #[serde(default)]
    pub product: Option<ProductSnapshot>,
}

impl CartEntry {
    pub fn new(product_id: ProductId, quantity: Quantity, product: Option<ProductSnapshot>) -> Self {
        Self { product_id, quantity, product }
    }

    /// Snapshot price times quantity; zero when no snapshot is cached.
    pub fn line_total(&self) -> Money {
        self.product.as_ref().map(|p| p.price.multiply(self.quantity.value())).unwrap_or(Money::ZERO)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CartState {
    Empty,
    NonEmpty,
}

/// At most one entry per product, kept in insertion order.
#[derive(Clone, Debug, Default)]
pub struct Cart {
    entries: Vec<CartEntry>,
    events: Vec<DomainEvent>,
}

impl Cart {
    pub fn new() -> Self { Self::default() }

    /// Builds a cart from entries of unknown origin. Repeated product ids are
    /// merged by summing their quantities; the first snapshot wins.
    pub fn from_entries(entries: impl IntoIterator<Item = CartEntry>) -> Self {
        let mut cart = Self::new();
        for entry in entries {
            match cart.position(&entry.product_id) {
                Some(idx) => {
                    let existing = &mut cart.entries[idx];
                    existing.quantity = existing.quantity.add(entry.quantity);
                    if existing.product.is_none() {
                        existing.product = entry.product;
                    }
                }
                None => cart.entries.push(entry),
            }
        }
        cart
    }

    pub fn entries(&self) -> &[CartEntry] { &self.entries }
    pub fn get(&self, product_id: &ProductId) -> Option<&CartEntry> {
        self.entries.iter().find(|e| &e.product_id == product_id)
    }
    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn state(&self) -> CartState {
        if self.is_empty() { CartState::Empty } else { CartState::NonEmpty }
    }

    /// Sums into an existing entry, otherwise appends a new one carrying the snapshot.
    pub fn add(&mut self, product_id: ProductId, quantity: Quantity, snapshot: Option<ProductSnapshot>) {
        let total = match self.position(&product_id) {
            Some(idx) => {
                let existing = &mut self.entries[idx];
                existing.quantity = existing.quantity.add(quantity);
                if snapshot.is_some() {
                    existing.product = snapshot;
                }
                existing.quantity
            }
            None => {
                self.entries.push(CartEntry::new(product_id.clone(), quantity, snapshot));
                quantity
            }
        };
        self.raise_event(DomainEvent::Cart(CartEvent::ItemAdded { product_id, quantity: total.value() }));
    }

    pub fn add_product(&mut self, product: &Product, quantity: Quantity) {
        self.add(product.id.clone(), quantity, Some(product.snapshot()));
    }

    /// Sets the quantity of an existing entry. Zero or below removes it.
    /// Returns `false` when the product is not in the cart.
    pub fn update_quantity(&mut self, product_id: &ProductId, quantity: i64) -> bool {
        let Some(idx) = self.position(product_id) else { return false };
        match Quantity::new(quantity) {
            Some(q) => {
                self.entries[idx].quantity = q;
                self.raise_event(DomainEvent::Cart(CartEvent::QuantityChanged {
                    product_id: product_id.clone(),
                    quantity: q.value(),
                }));
            }
            None => {
                self.entries.remove(idx);
                self.raise_event(DomainEvent::Cart(CartEvent::ItemRemoved { product_id: product_id.clone() }));
            }
        }
        true
    }

    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let Some(idx) = self.position(product_id) else { return false };
        self.entries.remove(idx);
        self.raise_event(DomainEvent::Cart(CartEvent::ItemRemoved { product_id: product_id.clone() }));
        true
    }

    pub fn refresh_snapshot(&mut self, product: &Product) -> bool {
        let Some(idx) = self.position(&product.id) else { return false };
        self.entries[idx].product = Some(product.snapshot());
        self.raise_event(DomainEvent::Cart(CartEvent::SnapshotRefreshed { product_id: product.id.clone() }));
        true
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.raise_event(DomainEvent::Cart(CartEvent::Cleared));
    }

    pub fn total(&self) -> Money { self.entries.iter().map(CartEntry::line_total).sum() }
    pub fn count(&self) -> u64 { self.entries.iter().map(|e| u64::from(e.quantity.value())).sum() }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
    fn position(&self, product_id: &ProductId) -> Option<usize> {
        self.entries.iter().position(|e| &e.product_id == product_id)
    }
}
