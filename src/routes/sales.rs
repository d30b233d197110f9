use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::sales::{OrderWithDetails, PlaceOrderRequest, SaleList, UpdateSaleStatusRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Sale,
    response::ApiResponse,
    routes::params::SaleListQuery,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(place_order))
        .route("/", get(list_sales))
        .route("/{id}", get(get_sale))
        .route("/{id}/status", patch(update_sale_status))
        .route("/{id}", delete(delete_sale))
}

#[utoipa::path(
    post,
    path = "/api/sales",
    request_body = PlaceOrderRequest,
    responses(
        (status = 200, description = "Place an order", body = ApiResponse<OrderWithDetails>),
        (status = 400, description = "Unknown book, insufficient stock or missing shipping address"),
    ),
    security(("bearer_auth" = [])),
    tag = "Sales"
)]
pub async fn place_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<PlaceOrderRequest>,
) -> AppResult<Json<ApiResponse<OrderWithDetails>>> {
    let resp = order_service::place_order(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/sales",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by order status"),
        ("sale_type" = Option<String>, Query, description = "Filter by sale type"),
        ("sort_order" = Option<String>, Query, description = "asc or desc by order date"),
    ),
    responses(
        (status = 200, description = "List sales", body = ApiResponse<SaleList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Sales"
)]
pub async fn list_sales(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<SaleListQuery>,
) -> AppResult<Json<ApiResponse<SaleList>>> {
    let resp = order_service::list_sales(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/sales/{id}",
    params(("id" = Uuid, Path, description = "Sale ID")),
    responses(
        (status = 200, description = "Sale with items and book details", body = ApiResponse<OrderWithDetails>),
        (status = 404, description = "Sale not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Sales"
)]
pub async fn get_sale(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithDetails>>> {
    let resp = order_service::get_sale(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/sales/{id}/status",
    params(("id" = Uuid, Path, description = "Sale ID")),
    request_body = UpdateSaleStatusRequest,
    responses(
        (status = 200, description = "Update sale status", body = ApiResponse<Sale>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Sale not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Sales"
)]
pub async fn update_sale_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSaleStatusRequest>,
) -> AppResult<Json<ApiResponse<Sale>>> {
    let resp = order_service::update_sale_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/sales/{id}",
    params(("id" = Uuid, Path, description = "Sale ID")),
    responses(
        (status = 200, description = "Delete sale"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Sale not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Sales"
)]
pub async fn delete_sale(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = order_service::delete_sale(&state, &user, id).await?;
    Ok(Json(resp))
}
