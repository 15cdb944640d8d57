//! HTTP surface over the session cart store.

use axum::{extract::{Path, State}, http::StatusCode, routing::{get, put}, Json, Router};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use crate::domain::aggregates::{CartEntry, CartState, ProductSnapshot};
use crate::domain::value_objects::{Money, ProductId};
use crate::persistence::CartPersistence;
use crate::store::CartStore;

pub type SharedCart = Arc<Mutex<CartStore<Box<dyn CartPersistence>>>>;

#[derive(Clone)]
pub struct AppState { pub cart: SharedCart }

impl AppState {
    pub fn new(store: CartStore<Box<dyn CartPersistence>>) -> Self { Self { cart: Arc::new(Mutex::new(store)) } }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "relieve-storefront"})) }))
        .route("/api/v1/cart", get(get_cart).post(add_to_cart).delete(clear_cart))
        .route("/api/v1/cart/:product_id", put(update_quantity).delete(remove_from_cart))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CartView {
    pub entries: Vec<CartEntry>,
    pub count: u64,
    pub total: Money,
    pub total_display: String,
    pub state: CartState,
}

impl<P: CartPersistence> From<&CartStore<P>> for CartView {
    fn from(store: &CartStore<P>) -> Self {
        let total = store.cart_total();
        Self {
            entries: store.entries().to_vec(),
            count: store.cart_count(),
            total,
            total_display: total.format(),
            state: store.state(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub quantity: Option<i64>,
    pub product: Option<ProductSnapshot>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest { pub quantity: i64 }

async fn get_cart(State(s): State<AppState>) -> Json<CartView> {
    Json(CartView::from(&*s.cart.lock()))
}

async fn add_to_cart(State(s): State<AppState>, Json(r): Json<AddToCartRequest>) -> (StatusCode, Json<CartView>) {
    let mut store = s.cart.lock();
    store.add_entry(r.product_id, r.product, r.quantity.unwrap_or(1));
    (StatusCode::CREATED, Json(CartView::from(&*store)))
}

async fn update_quantity(State(s): State<AppState>, Path(id): Path<String>, Json(r): Json<UpdateQuantityRequest>) -> Json<CartView> {
    let mut store = s.cart.lock();
    store.update_quantity(&ProductId::new(id), r.quantity);
    Json(CartView::from(&*store))
}

async fn remove_from_cart(State(s): State<AppState>, Path(id): Path<String>) -> Json<CartView> {
    let mut store = s.cart.lock();
    store.remove_from_cart(&ProductId::new(id));
    Json(CartView::from(&*store))
}

async fn clear_cart(State(s): State<AppState>) -> StatusCode {
    s.cart.lock().clear_cart();
    StatusCode::NO_CONTENT
}
