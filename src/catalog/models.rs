//! Catalog data models

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::validation::{as_integer, as_number, is_integer, is_positive_number, is_string, min_length, Validator};

pub const TEXT_MIN_LENGTH: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub stock: i64,
    pub category: String,
    pub seller_id: String,
    pub image_base64: Option<String>,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub stock: i64,
    pub category: String,
    pub seller_id: String,
    pub image_base64: Option<String>,
}

/// Partial update; `None` keeps the stored value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<i64>,
    pub category: Option<String>,
    pub image_base64: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: i64,
    pub title: String,
    pub price: f64,
    pub quantity: i64,
}

fn text_rules() -> Vec<crate::validation::Rule> {
    vec![is_string(), min_length(TEXT_MIN_LENGTH)]
}

fn stock_rules() -> Vec<crate::validation::Rule> {
    vec![is_integer(), is_positive_number()]
}

fn text(value: &Value) -> String {
    value.as_str().unwrap_or_default().to_string()
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[serde(default)]
    pub title: Value,
    #[serde(default)]
    pub description: Value,
    #[serde(default)]
    pub price: Value,
    #[serde(default)]
    pub stock: Value,
    #[serde(default)]
    pub category: Value,
    #[serde(default)]
    pub image_base64: Option<String>,
}

impl CreateProductRequest {
    /// Validate every field and build the row to insert for `seller_id`.
    pub fn validate(self, seller_id: &str) -> Result<NewProduct> {
        Validator::new()
            .field("title", &self.title, text_rules())
            .field("description", &self.description, text_rules())
            .field("price", &self.price, vec![is_positive_number()])
            .field("stock", &self.stock, stock_rules())
            .field("category", &self.category, text_rules())
            .check()?;

        Ok(NewProduct {
            title: text(&self.title),
            description: text(&self.description),
            price: as_number(&self.price).unwrap_or_default(),
            stock: as_integer(&self.stock).unwrap_or_default(),
            category: text(&self.category),
            seller_id: seller_id.to_string(),
            image_base64: self.image_base64,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    #[serde(default)]
    pub title: Option<Value>,
    #[serde(default)]
    pub description: Option<Value>,
    #[serde(default)]
    pub price: Option<Value>,
    #[serde(default)]
    pub stock: Option<Value>,
    #[serde(default)]
    pub category: Option<Value>,
    #[serde(default)]
    pub image_base64: Option<String>,
}

impl UpdateProductRequest {
    /// Validate only the fields that were sent.
    pub fn validate(self) -> Result<ProductChanges> {
        Validator::new()
            .optional_field("title", self.title.as_ref(), text_rules())
            .optional_field("description", self.description.as_ref(), text_rules())
            .optional_field("price", self.price.as_ref(), vec![is_positive_number()])
            .optional_field("stock", self.stock.as_ref(), stock_rules())
            .optional_field("category", self.category.as_ref(), text_rules())
            .check()?;

        Ok(ProductChanges {
            title: self.title.as_ref().map(text),
            description: self.description.as_ref().map(text),
            price: self.price.as_ref().and_then(as_number),
            stock: self.stock.as_ref().and_then(as_integer),
            category: self.category.as_ref().map(text),
            image_base64: self.image_base64,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemRequest {
    #[serde(default)]
    pub product_id: Value,
    #[serde(default)]
    pub quantity: Value,
}

impl CartItemRequest {
    /// `(product_id, quantity)`, both positive whole numbers
    pub fn validate(&self) -> Result<(i64, i64)> {
        Validator::new()
            .field("productId", &self.product_id, vec![is_integer(), is_positive_number()])
            .field("quantity", &self.quantity, vec![is_integer(), is_positive_number()])
            .check()?;

        Ok((
            as_integer(&self.product_id).unwrap_or_default(),
            as_integer(&self.quantity).unwrap_or_default(),
        ))
    }
}
