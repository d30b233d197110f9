use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::reports::{DailySalesRow, SalesSummary, TopBookRow, TopGenreRow},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::ReportQuery,
    services::report_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sales/daily", get(daily_sales))
        .route("/sales/top-genres", get(top_genres))
        .route("/sales/top-books", get(top_books))
        .route("/sales/summary", get(sales_summary))
}

#[utoipa::path(
    get,
    path = "/api/reports/sales/daily",
    params(
        ("start_date" = Option<String>, Query, description = "Start date (YYYY-MM-DD), inclusive"),
        ("end_date" = Option<String>, Query, description = "End date (YYYY-MM-DD), inclusive"),
        ("sale_type" = Option<String>, Query, description = "instore or online"),
        ("status" = Option<String>, Query, description = "Filter by order status"),
        ("book_title" = Option<String>, Query, description = "Whitespace tokens, any-of substring match"),
        ("genre" = Option<String>, Query, description = "Comma-separated genres, any-of"),
        ("customer_id" = Option<Uuid>, Query, description = "Filter by customer"),
    ),
    responses(
        (status = 200, description = "Daily sales buckets", body = ApiResponse<Vec<DailySalesRow>>),
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn daily_sales(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<ApiResponse<Vec<DailySalesRow>>>> {
    let resp = report_service::daily_sales(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/reports/sales/top-genres",
    params(
        ("limit" = Option<i64>, Query, description = "Number of genres, default 5"),
        ("start_date" = Option<String>, Query, description = "Start date (YYYY-MM-DD), inclusive"),
        ("end_date" = Option<String>, Query, description = "End date (YYYY-MM-DD), inclusive"),
    ),
    responses(
        (status = 200, description = "Top selling genres", body = ApiResponse<Vec<TopGenreRow>>),
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn top_genres(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<ApiResponse<Vec<TopGenreRow>>>> {
    let resp = report_service::top_genres(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/reports/sales/top-books",
    params(
        ("limit" = Option<i64>, Query, description = "Number of books, default 10"),
        ("start_date" = Option<String>, Query, description = "Start date (YYYY-MM-DD), inclusive"),
        ("end_date" = Option<String>, Query, description = "End date (YYYY-MM-DD), inclusive"),
    ),
    responses(
        (status = 200, description = "Top selling books", body = ApiResponse<Vec<TopBookRow>>),
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn top_books(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<ApiResponse<Vec<TopBookRow>>>> {
    let resp = report_service::top_books(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/reports/sales/summary",
    params(
        ("start_date" = Option<String>, Query, description = "Start date (YYYY-MM-DD), inclusive"),
        ("end_date" = Option<String>, Query, description = "End date (YYYY-MM-DD), inclusive"),
        ("sale_type" = Option<String>, Query, description = "instore or online"),
        ("status" = Option<String>, Query, description = "Filter by order status"),
        ("book_title" = Option<String>, Query, description = "Whitespace tokens, any-of substring match"),
        ("genre" = Option<String>, Query, description = "Comma-separated genres, any-of"),
        ("customer_id" = Option<Uuid>, Query, description = "Filter by customer"),
    ),
    responses(
        (status = 200, description = "Summary facets over the filtered orders", body = ApiResponse<SalesSummary>),
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn sales_summary(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<ApiResponse<SalesSummary>>> {
    let resp = report_service::sales_summary(&state, &user, query).await?;
    Ok(Json(resp))
}
