use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Address, OrderStatus, PaymentMethod, Sale, SaleType};

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderItemRequest {
    pub book_id: Uuid,
    pub quantity: i32,
}

/// Line-item prices are never part of the request; the engine snapshots the
/// catalog price itself.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PlaceOrderRequest {
    pub sale_type: SaleType,
    pub order_items: Vec<OrderItemRequest>,
    pub payment_method: PaymentMethod,
    pub customer_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
    pub shipping_address: Option<Address>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSaleStatusRequest {
    pub status: OrderStatus,
}

/// Book metadata joined onto a line item at read time. `None` when the book
/// has since been deleted from the catalog.
#[derive(Debug, Serialize, ToSchema)]
pub struct BookSummary {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub genre: String,
    pub publisher: String,
    pub language: String,
    pub cover_image_url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemWithBook {
    pub book_id: Uuid,
    pub quantity: i32,
    /// Price snapshot from order time, integer cents.
    pub price: i64,
    pub book: Option<BookSummary>,
}

/// Resolved identity of the customer or employee attached to a sale.
#[derive(Debug, Serialize, ToSchema)]
pub struct PartyRef {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithDetails {
    pub order: Sale,
    pub items: Vec<OrderItemWithBook>,
    pub total_items: i64,
    pub customer: Option<PartyRef>,
    pub employee: Option<PartyRef>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SaleList {
    pub items: Vec<Sale>,
}
