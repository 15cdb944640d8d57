//! Checkout: turns the session cart into an order on the backend.
//!
//! Prices and stock are always re-read from the catalog; the snapshots in the
//! cart are never trusted for the order. The cart is cleared only after the
//! backend accepted the order.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use validator::Validate;
use crate::domain::aggregates::{
    compose_direct_notes, compose_notes, Customer, NewOrder, Order, OrderItem, OrderStatus, PaymentMethod, Product,
    ShippingDetails, WalletPayment,
};
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::value_objects::{is_bd_mobile, Money, ProductId, Quantity};
use crate::persistence::CartPersistence;
use crate::store::CartStore;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("backend rejected the request: {0}")]
    Rejected(String),
    #[error("backend unreachable: {0}")]
    Unreachable(String),
}

/// Read side of the external product catalog.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn find_product(&self, id: &ProductId) -> Result<Option<Product>, GatewayError>;
}

/// Order insertion on the external backend.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    async fn submit(&self, order: NewOrder) -> Result<Order, GatewayError>;
}

#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,
    #[error("invalid checkout details: {0}")]
    Invalid(String),
    #[error("product {0} is no longer available")]
    ProductUnavailable(ProductId),
    #[error("only {available} of product {product_id} left in stock")]
    InsufficientStock { product_id: ProductId, available: u32 },
    #[error("order could not be placed: {0}")]
    Gateway(#[from] GatewayError),
}

impl From<validator::ValidationErrors> for CheckoutError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<&str> = errors.field_errors().into_keys().collect();
        fields.sort_unstable();
        CheckoutError::Invalid(format!("invalid fields: {}", fields.join(", ")))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub customer: Customer,
    pub shipping: ShippingDetails,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub wallet: Option<WalletPayment>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CheckoutRequest {
    fn check(&self) -> Result<(), CheckoutError> {
        self.shipping.validate()?;
        if let Customer::Guest { name, phone } = &self.customer {
            if name.trim().is_empty() {
                return Err(CheckoutError::Invalid("guest name is required".into()));
            }
            if !is_bd_mobile(phone) {
                return Err(CheckoutError::Invalid("guest phone must be a Bangladeshi mobile number".into()));
            }
        }
        if self.payment_method.is_wallet() {
            let wallet = self.wallet.as_ref().filter(|w| !w.sender_number.trim().is_empty()).ok_or_else(|| {
                CheckoutError::Invalid(format!("{} sender number is required", self.payment_method.label()))
            })?;
            let has_txn = wallet.transaction_id.as_deref().is_some_and(|t| !t.trim().is_empty());
            if self.customer.is_guest() && !has_txn {
                return Err(CheckoutError::Invalid("transaction id is required".into()));
            }
        }
        Ok(())
    }

    fn into_new_order(self, items: Vec<OrderItem>, notes: Option<String>) -> NewOrder {
        let total: Money = items.iter().map(OrderItem::line_total).sum();
        let shipping = self.shipping.trimmed();
        let customer = match self.customer {
            Customer::Guest { name, phone } => Customer::Guest { name: name.trim().to_string(), phone: phone.trim().to_string() },
            registered => registered,
        };
        NewOrder {
            customer,
            items,
            total,
            status: OrderStatus::Pending,
            payment_method: self.payment_method,
            shipping_address: shipping.address,
            shipping_city: shipping.city,
            shipping_phone: shipping.phone,
            notes,
        }
    }
}

pub struct CheckoutService<C, G> {
    catalog: C,
    gateway: G,
}

impl<C: ProductCatalog, G: OrderGateway> CheckoutService<C, G> {
    pub fn new(catalog: C, gateway: G) -> Self { Self { catalog, gateway } }

    /// Reprices the cart, submits the order and, only on success, clears the cart.
    pub async fn place_order<P: CartPersistence>(
        &self,
        store: &mut CartStore<P>,
        request: CheckoutRequest,
    ) -> Result<Order, CheckoutError> {
        if store.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        request.check()?;

        let mut items = Vec::with_capacity(store.len());
        for entry in store.entries() {
            items.push(self.price_item(&entry.product_id, entry.quantity).await?);
        }
        let notes = compose_notes(request.notes.as_deref(), request.payment_method, request.wallet.as_ref());
        let order = self.submit(request.into_new_order(items, notes)).await?;
        store.clear_cart();
        Ok(order)
    }

    /// "Buy now": orders a single product straight from its page. The cart is
    /// neither read nor cleared. Quantities below one are treated as one.
    pub async fn place_direct_order(
        &self,
        product_id: &ProductId,
        quantity: i64,
        request: CheckoutRequest,
    ) -> Result<Order, CheckoutError> {
        request.check()?;
        let item = self.price_item(product_id, Quantity::clamped(quantity)).await?;
        let notes = compose_direct_notes(request.notes.as_deref(), request.payment_method, request.wallet.as_ref());
        self.submit(request.into_new_order(vec![item], notes)).await
    }

    async fn price_item(&self, product_id: &ProductId, quantity: Quantity) -> Result<OrderItem, CheckoutError> {
        let product = self
            .catalog
            .find_product(product_id)
            .await?
            .ok_or_else(|| CheckoutError::ProductUnavailable(product_id.clone()))?;
        let quantity = quantity.value();
        if !product.has_stock_for(quantity) {
            return Err(CheckoutError::InsufficientStock { product_id: product.id, available: product.stock });
        }
        Ok(OrderItem { product_id: product.id, product_name: product.name, quantity, price: product.price })
    }

    async fn submit(&self, new_order: NewOrder) -> Result<Order, CheckoutError> {
        let order = match self.gateway.submit(new_order).await {
            Ok(order) => order,
            Err(e) => {
                warn!(error = %e, "Order submission failed");
                return Err(e.into());
            }
        };
        let event = DomainEvent::Order(OrderEvent::Placed { order_id: order.id.clone(), total: order.details.total });
        info!(?event, payment = order.details.payment_method.label(), "Order placed");
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::product::fixtures::perfume;
    use crate::persistence::{LocalCartPersistence, MemoryStorage};
    use chrono::Utc;
    use mockall::mock;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    #[derive(Default)]
    struct InMemoryCatalog(HashMap<ProductId, Product>);

    impl InMemoryCatalog {
        fn with(products: Vec<Product>) -> Self {
            Self(products.into_iter().map(|p| (p.id.clone(), p)).collect())
        }
    }

    #[async_trait]
    impl ProductCatalog for InMemoryCatalog {
        async fn find_product(&self, id: &ProductId) -> Result<Option<Product>, GatewayError> {
            Ok(self.0.get(id).cloned())
        }
    }

    #[derive(Clone, Default)]
    struct RecordingGateway(Arc<Mutex<Vec<NewOrder>>>);

    #[async_trait]
    impl OrderGateway for RecordingGateway {
        async fn submit(&self, order: NewOrder) -> Result<Order, GatewayError> {
            self.0.lock().push(order.clone());
            Ok(Order { id: "9b1deb4d-3b7d-4bad-9bdd-2b0d7b3dcb6d".into(), details: order, created_at: Utc::now() })
        }
    }

    mock! {
        pub Gateway {}

        #[async_trait]
        impl OrderGateway for Gateway {
            async fn submit(&self, order: NewOrder) -> Result<Order, GatewayError>;
        }
    }

    fn store_with(products: &[(&Product, i64)]) -> CartStore<LocalCartPersistence<MemoryStorage>> {
        let mut store = CartStore::open(LocalCartPersistence::new(MemoryStorage::new()));
        for (p, q) in products {
            store.add_to_cart(p, *q);
        }
        store
    }

    fn registered(method: PaymentMethod, wallet: Option<WalletPayment>) -> CheckoutRequest {
        CheckoutRequest {
            customer: Customer::Registered { user_id: "user-1".into() },
            shipping: ShippingDetails { address: " House 4, Road 2 ".into(), city: "Dhaka".into(), phone: "01712345678".into() },
            payment_method: method,
            wallet,
            notes: None,
        }
    }

    #[tokio::test]
    async fn should_place_order_with_catalog_prices_and_clear_cart() {
        let a = perfume("A", 1000);
        let b = perfume("B", 500);
        let mut store = store_with(&[(&a, 2), (&b, 1)]);
        let mut repriced = a.clone();
        repriced.price = Money::from_taka(1200);
        let gateway = RecordingGateway::default();
        let service = CheckoutService::new(InMemoryCatalog::with(vec![repriced, b]), gateway.clone());

        let order = service.place_order(&mut store, registered(PaymentMethod::Cod, None)).await.unwrap();

        assert_eq!(order.details.total, Money::from_taka(2900));
        assert_eq!(order.details.items[0].price, Money::from_taka(1200));
        assert_eq!(order.details.shipping_address, "House 4, Road 2");
        assert_eq!(order.details.status, OrderStatus::Pending);
        assert_eq!(order.short_id(), "9B1DEB4D");
        assert!(store.is_empty());
        assert_eq!(gateway.0.lock().len(), 1);
    }

    #[tokio::test]
    async fn should_reject_empty_cart() {
        let mut store = store_with(&[]);
        let service = CheckoutService::new(InMemoryCatalog::default(), RecordingGateway::default());
        let err = service.place_order(&mut store, registered(PaymentMethod::Cod, None)).await.unwrap_err();
        assert!(matches!(err, CheckoutError::EmptyCart));
    }

    #[tokio::test]
    async fn should_require_wallet_sender_number() {
        let a = perfume("A", 1000);
        let mut store = store_with(&[(&a, 1)]);
        let service = CheckoutService::new(InMemoryCatalog::with(vec![a]), RecordingGateway::default());
        let err = service.place_order(&mut store, registered(PaymentMethod::Bkash, None)).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Invalid(ref m) if m.contains("bKash")));
        assert_eq!(store.cart_count(), 1);
    }

    #[tokio::test]
    async fn should_require_transaction_id_from_guests() {
        let a = perfume("A", 1000);
        let mut store = store_with(&[(&a, 1)]);
        let service = CheckoutService::new(InMemoryCatalog::with(vec![a]), RecordingGateway::default());
        let mut request = registered(PaymentMethod::Nagad, Some(WalletPayment { sender_number: "01811111111".into(), transaction_id: None }));
        request.customer = Customer::Guest { name: "Karim".into(), phone: "01712345678".into() };
        let err = service.place_order(&mut store, request).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Invalid(_)));
    }

    #[tokio::test]
    async fn should_record_wallet_reference_in_notes() {
        let a = perfume("A", 1000);
        let mut store = store_with(&[(&a, 1)]);
        let service = CheckoutService::new(InMemoryCatalog::with(vec![a]), RecordingGateway::default());
        let mut request = registered(
            PaymentMethod::Bkash,
            Some(WalletPayment { sender_number: "01811111111".into(), transaction_id: Some("8N7A6D5".into()) }),
        );
        request.notes = Some("Gift wrap".into());
        let order = service.place_order(&mut store, request).await.unwrap();
        assert_eq!(order.details.notes.as_deref(), Some("Gift wrap | bKash: 01811111111, TxnID: 8N7A6D5"));
    }

    #[tokio::test]
    async fn should_reject_invalid_phone() {
        let a = perfume("A", 1000);
        let mut store = store_with(&[(&a, 1)]);
        let service = CheckoutService::new(InMemoryCatalog::with(vec![a]), RecordingGateway::default());
        let mut request = registered(PaymentMethod::Cod, None);
        request.shipping.phone = "555-0100".into();
        let err = service.place_order(&mut store, request).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Invalid(ref m) if m.contains("phone")));
    }

    #[tokio::test]
    async fn should_fail_when_product_vanished_or_short() {
        let a = perfume("A", 1000);
        let mut store = store_with(&[(&a, 1)]);
        let service = CheckoutService::new(InMemoryCatalog::default(), RecordingGateway::default());
        let err = service.place_order(&mut store, registered(PaymentMethod::Cod, None)).await.unwrap_err();
        assert!(matches!(err, CheckoutError::ProductUnavailable(ref id) if id.as_str() == "A"));

        let mut low = a.clone();
        low.stock = 2;
        let mut store = store_with(&[(&a, 3)]);
        let service = CheckoutService::new(InMemoryCatalog::with(vec![low]), RecordingGateway::default());
        let err = service.place_order(&mut store, registered(PaymentMethod::Cod, None)).await.unwrap_err();
        assert!(matches!(err, CheckoutError::InsufficientStock { available: 2, .. }));
        assert_eq!(store.cart_count(), 3);
    }

    fn guest(method: PaymentMethod, wallet: Option<WalletPayment>, phone: &str) -> CheckoutRequest {
        CheckoutRequest { customer: Customer::Guest { name: "Karim".into(), phone: phone.into() }, ..registered(method, wallet) }
    }

    #[tokio::test]
    async fn should_reject_guest_with_missing_or_foreign_phone() {
        let a = perfume("A", 1000);
        let gateway = RecordingGateway::default();
        let service = CheckoutService::new(InMemoryCatalog::with(vec![a.clone()]), gateway.clone());
        for phone in ["", "   ", "12345", "+8801712345678"] {
            let mut store = store_with(&[(&a, 1)]);
            let err = service.place_order(&mut store, guest(PaymentMethod::Cod, None, phone)).await.unwrap_err();
            assert!(matches!(err, CheckoutError::Invalid(ref m) if m.contains("guest phone")));
            assert_eq!(store.cart_count(), 1);
        }
        assert!(gateway.0.lock().is_empty());
    }

    #[tokio::test]
    async fn should_accept_guest_phone_with_spaces() {
        let a = perfume("A", 1000);
        let mut store = store_with(&[(&a, 1)]);
        let service = CheckoutService::new(InMemoryCatalog::with(vec![a]), RecordingGateway::default());
        let order = service.place_order(&mut store, guest(PaymentMethod::Cod, None, " 017 1234 5678 ")).await.unwrap();
        assert_eq!(order.details.customer, Customer::Guest { name: "Karim".into(), phone: "017 1234 5678".into() });
    }

    #[tokio::test]
    async fn should_place_direct_order_without_touching_cart() {
        let a = perfume("A", 1000);
        let b = perfume("B", 850);
        let store = store_with(&[(&a, 2)]);
        let gateway = RecordingGateway::default();
        let service = CheckoutService::new(InMemoryCatalog::with(vec![a, b]), gateway.clone());
        let request = guest(
            PaymentMethod::Bkash,
            Some(WalletPayment { sender_number: "01811111111".into(), transaction_id: Some("TX42".into()) }),
            "01712345678",
        );

        let order = service.place_direct_order(&ProductId::new("B"), 3, request).await.unwrap();

        assert_eq!(order.details.items.len(), 1);
        assert_eq!(order.details.items[0].product_id, ProductId::new("B"));
        assert_eq!(order.details.items[0].quantity, 3);
        assert_eq!(order.details.total, Money::from_taka(2550));
        assert_eq!(order.details.notes.as_deref(), Some("Payment: bKash | Sender: 01811111111 | TxnID: TX42"));
        assert_eq!(store.cart_count(), 2);
        assert_eq!(gateway.0.lock().len(), 1);
    }

    #[tokio::test]
    async fn should_validate_and_check_stock_on_direct_order() {
        let mut a = perfume("A", 1000);
        a.stock = 1;
        let service = CheckoutService::new(InMemoryCatalog::with(vec![a]), RecordingGateway::default());

        let err = service
            .place_direct_order(&ProductId::new("A"), 2, guest(PaymentMethod::Cod, None, "01712345678"))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::InsufficientStock { available: 1, .. }));

        let err = service
            .place_direct_order(&ProductId::new("A"), 1, guest(PaymentMethod::Cod, None, ""))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Invalid(_)));

        let err = service
            .place_direct_order(&ProductId::new("Z"), 1, guest(PaymentMethod::Cod, None, "01712345678"))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::ProductUnavailable(_)));

        let order = service
            .place_direct_order(&ProductId::new("A"), 0, guest(PaymentMethod::Cod, None, "01712345678"))
            .await
            .unwrap();
        assert_eq!(order.details.items[0].quantity, 1);
        assert_eq!(order.details.notes, None);
    }

    #[tokio::test]
    async fn should_keep_cart_when_gateway_fails() {
        let a = perfume("A", 1000);
        let mut store = store_with(&[(&a, 2)]);
        let mut gateway = MockGateway::new();
        gateway
            .expect_submit()
            .times(1)
            .returning(|_| Err(GatewayError::Unreachable("timeout".into())));
        let service = CheckoutService::new(InMemoryCatalog::with(vec![a]), gateway);

        let err = service.place_order(&mut store, registered(PaymentMethod::Cod, None)).await.unwrap_err();

        assert!(matches!(err, CheckoutError::Gateway(_)));
        assert_eq!(store.cart_count(), 2);
    }
}
