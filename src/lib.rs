//! RELIEVE storefront core
//!
//! Client-side cart state and checkout glue for a perfume storefront whose
//! catalog, orders and accounts live on an external backend.
//!
//! ## Features
//! - Session cart store with add, update, remove and clear
//! - Cart persistence to local storage, optionally written in the background
//! - Checkout that reprices against the catalog and supports cash-on-delivery,
//!   bKash and Nagad payments for registered and guest shoppers
//! - HTTP surface over the cart store

pub mod api;
pub mod checkout;
pub mod config;
pub mod domain;
pub mod persistence;
pub mod store;

pub use checkout::{CheckoutError, CheckoutRequest, CheckoutService, GatewayError, OrderGateway, ProductCatalog};
pub use config::{AppConfig, ConfigError, LogFormat};
pub use domain::aggregates::{Cart, CartEntry, CartState, Order, PaymentMethod, Product, ProductSnapshot};
pub use domain::value_objects::{Money, ProductId, Quantity};
pub use persistence::{BackgroundWriter, CartPersistence, FileStorage, LocalCartPersistence, MemoryStorage, PersistenceError};
pub use store::CartStore;
