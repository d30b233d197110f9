use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::books::{BookList, CreateBookRequest, UpdateBookRequest},
    entity::books::{ActiveModel, Column, Entity as Books, Model as BookModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin, ensure_staff},
    models::Book,
    response::{ApiResponse, Meta},
    routes::params::{BookListQuery, BookSortBy, LowStockQuery, SortOrder},
    state::AppState,
};

pub async fn list_books(
    state: &AppState,
    query: BookListQuery,
) -> AppResult<ApiResponse<BookList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all();

    if let Some(genre) = query.genre.as_ref().filter(|g| !g.is_empty()) {
        condition = condition.add(Column::Genre.eq(genre.clone()));
    }
    if let Some(language) = query.language.as_ref().filter(|l| !l.is_empty()) {
        condition = condition.add(Column::Language.eq(language.clone()));
    }
    if query.in_stock == Some(true) {
        condition = condition.add(Column::Quantity.gt(0));
    }
    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Title).ilike(pattern.clone()))
                .add(Expr::col(Column::Author).ilike(pattern)),
        );
    }

    let sort_col = match query.sort_by.unwrap_or(BookSortBy::Title) {
        BookSortBy::Title => Column::Title,
        BookSortBy::Price => Column::Price,
        BookSortBy::CreatedAt => Column::CreatedAt,
    };

    let mut finder = Books::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Asc) {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(book_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Books", BookList { items }, Some(meta)))
}

pub async fn get_book(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Book>> {
    let book = Books::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(book_from_entity);
    let book = match book {
        Some(b) => b,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("Book", book, None))
}

pub async fn create_book(
    state: &AppState,
    user: &AuthUser,
    payload: CreateBookRequest,
) -> AppResult<ApiResponse<Book>> {
    ensure_staff(user)?;

    if payload.price < 0 {
        return Err(AppError::Validation("price must not be negative".into()));
    }
    if payload.quantity.is_some_and(|q| q < 0) {
        return Err(AppError::Validation("quantity must not be negative".into()));
    }

    ensure_isbn_free(state, &payload.isbn, None).await?;

    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(payload.title),
        author: Set(payload.author),
        genre: Set(payload.genre),
        isbn: Set(payload.isbn),
        summary: Set(payload.summary),
        publisher: Set(payload.publisher),
        publication_date: Set(payload.publication_date),
        page_count: Set(payload.page_count),
        language: Set(payload.language),
        cover_image_url: Set(payload.cover_image_url),
        quantity: Set(payload.quantity.unwrap_or(0)),
        price: Set(payload.price),
        low_stock_threshold: Set(payload.low_stock_threshold.unwrap_or(5)),
        created_at: NotSet,
        updated_at: NotSet,
    };
    let book = active.insert(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "book_create",
        Some("books"),
        Some(serde_json::json!({ "book_id": book.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Book created",
        book_from_entity(book),
        Some(Meta::empty()),
    ))
}

pub async fn update_book(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateBookRequest,
) -> AppResult<ApiResponse<Book>> {
    ensure_staff(user)?;
    let existing = Books::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(b) => b,
        None => return Err(AppError::NotFound),
    };

    if let Some(isbn) = payload.isbn.as_ref().filter(|i| **i != existing.isbn) {
        ensure_isbn_free(state, isbn, Some(id)).await?;
    }

    let mut active = existing.into_active_model();
    if let Some(title) = payload.title {
        active.title = Set(title);
    }
    if let Some(author) = payload.author {
        active.author = Set(author);
    }
    if let Some(genre) = payload.genre {
        active.genre = Set(genre);
    }
    if let Some(isbn) = payload.isbn {
        active.isbn = Set(isbn);
    }
    if let Some(summary) = payload.summary {
        active.summary = Set(summary);
    }
    if let Some(publisher) = payload.publisher {
        active.publisher = Set(publisher);
    }
    if let Some(publication_date) = payload.publication_date {
        active.publication_date = Set(publication_date);
    }
    if let Some(page_count) = payload.page_count {
        active.page_count = Set(page_count);
    }
    if let Some(language) = payload.language {
        active.language = Set(language);
    }
    if let Some(cover_image_url) = payload.cover_image_url {
        active.cover_image_url = Set(cover_image_url);
    }
    if let Some(quantity) = payload.quantity {
        if quantity < 0 {
            return Err(AppError::Validation("quantity must not be negative".into()));
        }
        active.quantity = Set(quantity);
    }
    if let Some(price) = payload.price {
        if price < 0 {
            return Err(AppError::Validation("price must not be negative".into()));
        }
        active.price = Set(price);
    }
    if let Some(threshold) = payload.low_stock_threshold {
        if threshold < 1 {
            return Err(AppError::Validation(
                "low_stock_threshold must be at least 1".into(),
            ));
        }
        active.low_stock_threshold = Set(threshold);
    }
    active.updated_at = Set(Utc::now().into());

    let book = active.update(&state.orm).await?;

    if book.quantity <= book.low_stock_threshold {
        tracing::warn!(
            book_id = %book.id,
            title = %book.title,
            quantity = book.quantity,
            threshold = book.low_stock_threshold,
            "book stock at or below threshold"
        );
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "book_update",
        Some("books"),
        Some(serde_json::json!({ "book_id": book.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Book updated",
        book_from_entity(book),
        Some(Meta::empty()),
    ))
}

/// Historical sale lines keep their snapshot and book id; only the catalog
/// record goes away.
pub async fn delete_book(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Books::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "book_delete",
        Some("books"),
        Some(serde_json::json!({ "book_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Books whose stock has fallen to their threshold (or an explicit override).
pub async fn list_low_stock(
    state: &AppState,
    user: &AuthUser,
    query: LowStockQuery,
) -> AppResult<ApiResponse<BookList>> {
    ensure_staff(user)?;
    let (page, limit, offset) = query.pagination.normalize();

    let condition = match query.threshold {
        Some(threshold) => Condition::all().add(Column::Quantity.lte(threshold)),
        None => Condition::all()
            .add(Expr::col(Column::Quantity).lte(Expr::col(Column::LowStockThreshold))),
    };

    let finder = Books::find()
        .filter(condition)
        .order_by_asc(Column::Quantity);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(book_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Low stock",
        BookList { items },
        Some(meta),
    ))
}

async fn ensure_isbn_free(state: &AppState, isbn: &str, except: Option<Uuid>) -> AppResult<()> {
    let mut condition = Condition::all().add(Column::Isbn.eq(isbn));
    if let Some(id) = except {
        condition = condition.add(Column::Id.ne(id));
    }
    let existing = Books::find().filter(condition).one(&state.orm).await?;
    if existing.is_some() {
        return Err(AppError::Conflict("ISBN already exists".into()));
    }
    Ok(())
}

pub fn book_from_entity(model: BookModel) -> Book {
    Book {
        id: model.id,
        title: model.title,
        author: model.author,
        genre: model.genre,
        isbn: model.isbn,
        summary: model.summary,
        publisher: model.publisher,
        publication_date: model.publication_date,
        page_count: model.page_count,
        language: model.language,
        cover_image_url: model.cover_image_url,
        quantity: model.quantity,
        price: model.price,
        low_stock_threshold: model.low_stock_threshold,
        created_at: model.created_at.with_timezone(&chrono::Utc),
        updated_at: model.updated_at.with_timezone(&chrono::Utc),
    }
}
