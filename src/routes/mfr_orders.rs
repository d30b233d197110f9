use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::mfr_orders::{
        CreateMfrOrderRequest, MfrOrderList, MfrOrderWithItems, UpdateMfrOrderStatusRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::MfrOrderListQuery,
    services::mfr_order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_mfr_orders))
        .route("/", post(create_mfr_order))
        .route("/{id}", get(get_mfr_order))
        .route("/{id}/status", patch(update_mfr_order_status))
}

#[utoipa::path(
    get,
    path = "/api/manufacturer-orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("supplier_name" = Option<String>, Query, description = "Filter by supplier"),
        ("status" = Option<String>, Query, description = "Filter by status"),
    ),
    responses(
        (status = 200, description = "List manufacturer orders", body = ApiResponse<MfrOrderList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Manufacturer Orders"
)]
pub async fn list_mfr_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<MfrOrderListQuery>,
) -> AppResult<Json<ApiResponse<MfrOrderList>>> {
    let resp = mfr_order_service::list_mfr_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/manufacturer-orders",
    request_body = CreateMfrOrderRequest,
    responses(
        (status = 200, description = "Create a manufacturer order", body = ApiResponse<MfrOrderWithItems>),
        (status = 400, description = "Unknown book or invalid quantity"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Manufacturer Orders"
)]
pub async fn create_mfr_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateMfrOrderRequest>,
) -> AppResult<Json<ApiResponse<MfrOrderWithItems>>> {
    let resp = mfr_order_service::create_mfr_order(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/manufacturer-orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Manufacturer order with items", body = ApiResponse<MfrOrderWithItems>),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Manufacturer Orders"
)]
pub async fn get_mfr_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<MfrOrderWithItems>>> {
    let resp = mfr_order_service::get_mfr_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/manufacturer-orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateMfrOrderStatusRequest,
    responses(
        (status = 200, description = "Update status; receiving restocks the ordered books", body = ApiResponse<MfrOrderWithItems>),
        (status = 400, description = "Order already received"),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Manufacturer Orders"
)]
pub async fn update_mfr_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMfrOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<MfrOrderWithItems>>> {
    let resp = mfr_order_service::update_mfr_order_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
