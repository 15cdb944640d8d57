//! Session cart store
//!
//! Owns the in-memory cart of one shopper session and writes the full cart
//! through a [`CartPersistence`] after every mutating call. Storage problems
//! never reach the caller: unreadable state opens as an empty cart and failed
//! writes are logged while the in-memory cart stays authoritative.

use tracing::{debug, info, warn};
use crate::domain::aggregates::{Cart, CartEntry, CartState, Product, ProductSnapshot};
use crate::domain::value_objects::{Money, ProductId, Quantity};
use crate::persistence::CartPersistence;

pub struct CartStore<P> {
    cart: Cart,
    persistence: P,
}

impl<P: CartPersistence> CartStore<P> {
    /// Restores the cart from `persistence`, falling back to an empty cart.
    pub fn open(persistence: P) -> Self {
        let cart = match persistence.load() {
            Ok(entries) => Cart::from_entries(entries),
            Err(e) => {
                warn!(error = %e, "Stored cart unreadable; starting with an empty cart");
                Cart::new()
            }
        };
        info!(entries = cart.len(), items = cart.count(), "Cart store opened");
        Self { cart, persistence }
    }

    /// Adds `quantity` units of `product`, summing with any existing entry.
    /// Quantities below one are treated as one.
    pub fn add_to_cart(&mut self, product: &Product, quantity: i64) {
        self.cart.add_product(product, Quantity::clamped(quantity));
        self.commit();
    }

    /// Same as [`add_to_cart`](Self::add_to_cart) for callers that hold only
    /// the id and, optionally, display data.
    pub fn add_entry(&mut self, product_id: ProductId, snapshot: Option<ProductSnapshot>, quantity: i64) {
        self.cart.add(product_id, Quantity::clamped(quantity), snapshot);
        self.commit();
    }

    /// Sets the quantity of an entry already in the cart; `<= 0` removes it.
    /// Unknown products are ignored.
    pub fn update_quantity(&mut self, product_id: &ProductId, quantity: i64) {
        if !self.cart.update_quantity(product_id, quantity) {
            debug!(%product_id, "Quantity update for product not in cart");
        }
        self.commit();
    }

    pub fn remove_from_cart(&mut self, product_id: &ProductId) {
        if !self.cart.remove(product_id) {
            debug!(%product_id, "Remove for product not in cart");
        }
        self.commit();
    }

    pub fn clear_cart(&mut self) {
        self.cart.clear();
        self.commit();
    }

    /// Replaces the cached display data of an existing entry.
    pub fn refresh_snapshot(&mut self, product: &Product) {
        if self.cart.refresh_snapshot(product) {
            self.commit();
        }
    }

    /// Σ quantity × snapshot price. Snapshot prices are display-only.
    pub fn cart_total(&self) -> Money { self.cart.total() }
    pub fn cart_count(&self) -> u64 { self.cart.count() }
    pub fn state(&self) -> CartState { self.cart.state() }
    pub fn entries(&self) -> &[CartEntry] { self.cart.entries() }
    pub fn get(&self, product_id: &ProductId) -> Option<&CartEntry> { self.cart.get(product_id) }
    pub fn len(&self) -> usize { self.cart.len() }
    pub fn is_empty(&self) -> bool { self.cart.is_empty() }

    fn commit(&mut self) {
        for event in self.cart.take_events() {
            debug!(?event, "Cart changed");
        }
        if let Err(e) = self.persistence.save(self.cart.entries()) {
            warn!(error = %e, "Cart write failed; keeping in-memory cart");
        }
    }
}
