//! Book model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::error::{AppError, AppResult};

/// Book record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub name: String,
    pub genre: String,
    pub author: String,
    /// Free-form, not parsed as a date
    pub published_date: String,
    /// Units in stock
    pub stock: i32,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create / update book request.
///
/// `stock` and `price` must be present; zero is a valid value.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(default)]
#[validate(schema(function = "validate_amounts"))]
pub struct BookInput {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "genre is required"))]
    pub genre: String,
    #[validate(length(min = 1, message = "author is required"))]
    pub author: String,
    #[validate(length(min = 1, message = "published_date is required"))]
    pub published_date: String,
    #[validate(required(message = "stock is required"))]
    pub stock: Option<i32>,
    #[serde(with = "rust_decimal::serde::float_option")]
    #[validate(required(message = "price is required"))]
    #[schema(value_type = f64)]
    pub price: Option<Decimal>,
}

/// Prices are stored as `NUMERIC(12, 2)`: at most two decimals, below 10^10
const PRICE_SCALE: u32 = 2;
const PRICE_LIMIT: i64 = 10_000_000_000;

fn validate_amounts(input: &BookInput) -> Result<(), ValidationError> {
    if input.stock.is_some_and(|stock| stock < 0) {
        return Err(ValidationError::new("stock").with_message("stock must not be negative".into()));
    }

    let Some(price) = input.price else {
        return Ok(());
    };
    if price < Decimal::ZERO {
        return Err(ValidationError::new("price").with_message("price must not be negative".into()));
    }
    if price.normalize().scale() > PRICE_SCALE {
        return Err(ValidationError::new("price")
            .with_message("price must have at most two decimal places".into()));
    }
    if price >= Decimal::from(PRICE_LIMIT) {
        return Err(ValidationError::new("price").with_message("price is too large".into()));
    }
    Ok(())
}

/// Validated book fields, ready to persist
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub name: String,
    pub genre: String,
    pub author: String,
    pub published_date: String,
    pub stock: i32,
    pub price: Decimal,
}

impl BookInput {
    /// Validate and convert into persistable fields
    pub fn into_new_book(self) -> AppResult<NewBook> {
        self.validate()?;

        let stock = self
            .stock
            .ok_or_else(|| AppError::Validation("stock is required".to_string()))?;
        let price = self
            .price
            .ok_or_else(|| AppError::Validation("price is required".to_string()))?;

        Ok(NewBook {
            name: self.name,
            genre: self.genre,
            author: self.author,
            published_date: self.published_date,
            stock,
            price,
        })
    }
}

impl Book {
    /// Overwrite every mutable field
    pub fn apply(&mut self, fields: NewBook) {
        self.name = fields.name;
        self.genre = fields.genre;
        self.author = fields.author;
        self.published_date = fields.published_date;
        self.stock = fields.stock;
        self.price = fields.price;
    }
}
