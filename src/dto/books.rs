use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Book;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBookRequest {
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
    pub quantity: Option<i32>,
    /// Integer cents.
    pub price: i64,
    pub low_stock_threshold: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub isbn: Option<String>,
    pub summary: Option<String>,
    pub publisher: Option<String>,
    pub publication_date: Option<NaiveDate>,
    pub page_count: Option<i32>,
    pub language: Option<String>,
    pub cover_image_url: Option<String>,
    pub quantity: Option<i32>,
    pub price: Option<i64>,
    pub low_stock_threshold: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookList {
    pub items: Vec<Book>,
}
