use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// One calendar-day bucket of sales activity.
#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct DailySalesRow {
    /// `YYYY-MM-DD`, derived from the order date.
    pub day: String,
    pub total_sales: i64,
    pub total_items: i64,
    pub order_count: i64,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct TopGenreRow {
    pub genre: String,
    pub total_sold: i64,
    pub revenue: i64,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct TopBookRow {
    pub book_id: Uuid,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub total_sold: i64,
    pub revenue: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TypeBreakdown {
    pub sale_type: String,
    pub count: i64,
    pub revenue: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusBreakdown {
    pub status: String,
    pub count: i64,
}

/// All facets are computed from the same filtered snapshot; an empty result
/// set yields zeros and empty breakdowns.
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct SalesSummary {
    pub total_revenue: i64,
    pub total_orders: i64,
    pub total_items: i64,
    pub average_order_value: f64,
    pub sales_by_type: Vec<TypeBreakdown>,
    pub sales_by_status: Vec<StatusBreakdown>,
}
