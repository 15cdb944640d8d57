//! Order Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};
use crate::domain::value_objects::{is_bd_mobile, Money, ProductId};

/// One line of a submitted order, priced from the catalog at submission time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub price: Money,
}

impl OrderItem {
    pub fn line_total(&self) -> Money { self.price.multiply(self.quantity) }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus { #[default] Pending, Processing, Delivered, Cancelled }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod { #[default] Cod, Bkash, Nagad }

impl PaymentMethod {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Cod => "Cash on Delivery",
            Self::Bkash => "bKash",
            Self::Nagad => "Nagad",
        }
    }

    pub fn is_wallet(&self) -> bool { !matches!(self, Self::Cod) }
}

/// Sender details for a bKash or Nagad payment.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletPayment {
    pub sender_number: String,
    #[serde(default)]
    pub transaction_id: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ShippingDetails {
    #[validate(custom = "not_blank")]
    pub address: String,
    #[validate(custom = "not_blank")]
    pub city: String,
    #[validate(custom = "bd_mobile")]
    pub phone: String,
}

impl ShippingDetails {
    pub fn trimmed(&self) -> Self {
        Self {
            address: self.address.trim().to_string(),
            city: self.city.trim().to_string(),
            phone: self.phone.trim().to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Customer {
    Registered { user_id: String },
    Guest { name: String, phone: String },
}

impl Customer {
    pub fn is_guest(&self) -> bool { matches!(self, Self::Guest { .. }) }
}

/// Order as handed to the backend for insertion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub customer: Customer,
    pub items: Vec<OrderItem>,
    pub total: Money,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub shipping_address: String,
    pub shipping_city: String,
    pub shipping_phone: String,
    pub notes: Option<String>,
}

/// Order record returned by the backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    #[serde(flatten)]
    pub details: NewOrder,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// First eight characters of the id, upper-cased, as shown on the confirmation screen.
    pub fn short_id(&self) -> String {
        self.id.chars().take(8).collect::<String>().to_uppercase()
    }
}

/// Joins the shopper's notes with the wallet payment reference.
pub fn compose_notes(notes: Option<&str>, method: PaymentMethod, wallet: Option<&WalletPayment>) -> Option<String> {
    let payment = match (method.is_wallet(), wallet) {
        (true, Some(w)) => {
            let mut s = format!("{}: {}", method.label(), w.sender_number.trim());
            if let Some(txn) = w.transaction_id.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
                s.push_str(&format!(", TxnID: {txn}"));
            }
            Some(s)
        }
        _ => None,
    };
    let parts: Vec<String> = notes
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .into_iter()
        .chain(payment)
        .collect();
    if parts.is_empty() { None } else { Some(parts.join(" | ")) }
}

/// Notes for a single-product "buy now" order:
/// `<notes> | Payment: <label> | Sender: <number> | TxnID: <id>`.
/// Cash-on-delivery orders carry only the shopper's notes.
pub fn compose_direct_notes(notes: Option<&str>, method: PaymentMethod, wallet: Option<&WalletPayment>) -> Option<String> {
    let notes = notes.map(str::trim).filter(|n| !n.is_empty());
    let wallet = match (method.is_wallet(), wallet) {
        (true, Some(w)) => w,
        _ => return notes.map(str::to_string),
    };
    let mut parts: Vec<String> = notes.map(str::to_string).into_iter().collect();
    parts.push(format!("Payment: {}", method.label()));
    parts.push(format!("Sender: {}", wallet.sender_number.trim()));
    parts.push(format!("TxnID: {}", wallet.transaction_id.as_deref().map(str::trim).unwrap_or_default()));
    Some(parts.join(" | "))
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() { Err(ValidationError::new("required")) } else { Ok(()) }
}

fn bd_mobile(value: &str) -> Result<(), ValidationError> {
    if is_bd_mobile(value) { Ok(()) } else { Err(ValidationError::new("bd_mobile")) }
}
