use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::sales::BookSummary;
use crate::models::{MfrOrder, OrderStatus};

#[derive(Debug, Deserialize, ToSchema)]
pub struct MfrOrderItemRequest {
    pub book_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMfrOrderRequest {
    pub order_number: String,
    pub supplier_name: String,
    pub books_ordered: Vec<MfrOrderItemRequest>,
    /// Supplier cost in integer cents; not derivable from retail prices.
    pub total_cost: i64,
    pub expected_delivery_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateMfrOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MfrOrderItemWithBook {
    pub book_id: Uuid,
    pub quantity: i32,
    pub book: Option<BookSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MfrOrderWithItems {
    pub order: MfrOrder,
    pub items: Vec<MfrOrderItemWithBook>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MfrOrderList {
    pub items: Vec<MfrOrder>,
}
