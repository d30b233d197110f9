use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;
        (page, per_page, offset)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookSortBy {
    Title,
    Price,
    CreatedAt,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BookListQuery {
    #[serde(flatten)]
    pub pagination: Pagination,
    pub genre: Option<String>,
    pub language: Option<String>,
    pub in_stock: Option<bool>,
    /// Case-insensitive substring over title and author.
    pub q: Option<String>,
    pub sort_by: Option<BookSortBy>,
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SaleListQuery {
    #[serde(flatten)]
    pub pagination: Pagination,
    pub status: Option<String>,
    pub sale_type: Option<String>,
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MfrOrderListQuery {
    #[serde(flatten)]
    pub pagination: Pagination,
    pub supplier_name: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LowStockQuery {
    #[serde(flatten)]
    pub pagination: Pagination,
    /// Overrides the per-book threshold when set.
    pub threshold: Option<i32>,
}

/// Sparse report filter; absent parameters impose no constraint.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ReportQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub sale_type: Option<String>,
    pub status: Option<String>,
    pub book_title: Option<String>,
    /// Comma-separated list; any-of semantics.
    pub genre: Option<String>,
    pub customer_id: Option<Uuid>,
    pub limit: Option<i64>,
}
