//! Aggregates module
pub mod product;
pub mod order;
pub mod cart;

pub use product::{PerfumeCategory, Product, ProductSnapshot};
pub use order::{compose_direct_notes, compose_notes, Customer, NewOrder, Order, OrderItem, OrderStatus, PaymentMethod, ShippingDetails, WalletPayment};
pub use cart::{Cart, CartEntry, CartState};
