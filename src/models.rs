use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;

/// Sale channel. Online orders require a shipping address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SaleType {
    Instore,
    Online,
}

impl SaleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleType::Instore => "instore",
            SaleType::Online => "online",
        }
    }
}

impl fmt::Display for SaleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SaleType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "instore" => Ok(SaleType::Instore),
            "online" => Ok(SaleType::Online),
            other => Err(AppError::Validation(format!("invalid sale type: {other}"))),
        }
    }
}

/// Lifecycle of both sales and manufacturer orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Shipped,
    Received,
    Canceled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Received => "received",
            OrderStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "shipped" => Ok(OrderStatus::Shipped),
            "received" => Ok(OrderStatus::Received),
            "canceled" => Ok(OrderStatus::Canceled),
            other => Err(AppError::Validation(format!("invalid order status: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Credit,
    Debit,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Credit => "credit",
            PaymentMethod::Debit => "debit",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "credit" => Ok(PaymentMethod::Credit),
            "debit" => Ok(PaymentMethod::Debit),
            other => Err(AppError::Validation(format!(
                "invalid payment method: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

impl Address {
    /// Assemble from nullable columns; all four parts must be present.
    pub fn from_parts(
        street: Option<String>,
        city: Option<String>,
        state: Option<String>,
        zip_code: Option<String>,
    ) -> Option<Self> {
        match (street, city, state, zip_code) {
            (Some(street), Some(city), Some(state), Some(zip_code)) => Some(Self {
                street,
                city,
                state,
                zip_code,
            }),
            _ => None,
        }
    }
}

/// Catalog record. `quantity` is the live stock count; `price` is integer cents.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub isbn: String,
    pub summary: String,
    pub publisher: String,
    pub publication_date: NaiveDate,
    pub page_count: i32,
    pub language: String,
    pub cover_image_url: String,
    pub quantity: i32,
    pub price: i64,
    pub low_stock_threshold: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A persisted sale. `total_price` is fixed at creation from the per-item
/// price snapshots and is never recomputed afterwards.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Sale {
    pub id: Uuid,
    pub sale_type: SaleType,
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
    pub total_price: i64,
    pub payment_method: PaymentMethod,
    pub employee_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub shipping_address: Option<Address>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One book-and-quantity entry within a sale. `price` is the snapshot taken
/// at order time, not the book's current price.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub sale_id: Uuid,
    pub book_id: Uuid,
    pub quantity: i32,
    pub price: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Customer {
    pub id: Uuid,
    pub user_id: Uuid,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Address>,
    pub order_count: i32,
    pub total_spent: i64,
    pub last_purchase: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Employee {
    pub id: Uuid,
    pub user_id: Uuid,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Address>,
    pub job_title: String,
    pub role: String,
    pub hire_date: NaiveDate,
    pub salary: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account record; the password hash stays in the entity layer and is never
/// serialized out.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub customer_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// The profile linked to a user account, resolved by role.
#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "profile_type", content = "profile", rename_all = "lowercase")]
pub enum Profile {
    Customer(Customer),
    Employee(Employee),
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MfrOrder {
    pub id: Uuid,
    pub order_number: String,
    pub supplier_name: String,
    pub status: OrderStatus,
    pub total_cost: i64,
    pub order_date: DateTime<Utc>,
    pub expected_delivery_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_round_trip_through_strings() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Shipped,
            OrderStatus::Received,
            OrderStatus::Canceled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert_eq!("online".parse::<SaleType>().unwrap(), SaleType::Online);
        assert_eq!("cash".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
    }

    #[test]
    fn junk_status_is_rejected() {
        assert!("paid".parse::<OrderStatus>().is_err());
        assert!("".parse::<SaleType>().is_err());
    }
}
