use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod books;
pub mod doc;
pub mod health;
pub mod mfr_orders;
pub mod params;
pub mod reports;
pub mod sales;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/books", books::router())
        .nest("/sales", sales::router())
        .nest("/reports", reports::router())
        .nest("/manufacturer-orders", mfr_orders::router())
        .nest("/admin", admin::router())
}
