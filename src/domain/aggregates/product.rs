//! Catalog product as served by the backend, and the display snapshot the cart keeps

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::domain::value_objects::{Money, ProductId};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    #[serde(default)]
    pub image_url: String,
    pub category: PerfumeCategory,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub discount_percentage: Option<Decimal>,
    #[serde(default)]
    pub original_price: Option<Money>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PerfumeCategory {
    #[serde(rename = "For Him")] ForHim,
    #[serde(rename = "For Her")] ForHer,
    Unisex,
    Luxury,
    Fresh,
    Woody,
    Floral,
}

impl PerfumeCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::ForHim => "For Him",
            Self::ForHer => "For Her",
            Self::Unisex => "Unisex",
            Self::Luxury => "Luxury",
            Self::Fresh => "Fresh",
            Self::Woody => "Woody",
            Self::Floral => "Floral",
        }
    }
}

/// Display data cached alongside a cart entry. Never used to price an order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub name: String,
    pub price: Money,
    #[serde(default)]
    pub image_url: String,
    pub category: PerfumeCategory,
}

impl Product {
    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            name: self.name.clone(),
            price: self.price,
            image_url: self.image_url.clone(),
            category: self.category,
        }
    }

    pub fn has_stock_for(&self, qty: u32) -> bool { self.stock >= qty }
}
