use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::mfr_orders::{
        CreateMfrOrderRequest, MfrOrderItemWithBook, MfrOrderList, MfrOrderWithItems,
        UpdateMfrOrderStatusRequest,
    },
    dto::sales::BookSummary,
    entity::{
        books::{Column as BookCol, Entity as Books, Model as BookModel},
        mfr_order_items::{
            ActiveModel as MfrItemActive, Column as MfrItemCol, Entity as MfrOrderItems,
        },
        mfr_orders::{
            ActiveModel as MfrOrderActive, Column as MfrOrderCol, Entity as MfrOrders,
            Model as MfrOrderModel,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_staff},
    models::{MfrOrder, OrderStatus},
    response::{ApiResponse, Meta},
    routes::params::MfrOrderListQuery,
    state::AppState,
};

pub async fn list_mfr_orders(
    state: &AppState,
    user: &AuthUser,
    query: MfrOrderListQuery,
) -> AppResult<ApiResponse<MfrOrderList>> {
    ensure_staff(user)?;
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(supplier) = query.supplier_name.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(MfrOrderCol::SupplierName.eq(supplier.clone()));
    }
    if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
        let status: OrderStatus = status.parse()?;
        condition = condition.add(MfrOrderCol::Status.eq(status.as_str()));
    }

    let finder = MfrOrders::find()
        .filter(condition)
        .order_by_desc(MfrOrderCol::OrderDate);

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(mfr_order_from_entity)
        .collect::<AppResult<Vec<MfrOrder>>>()?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Manufacturer orders",
        MfrOrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_mfr_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<MfrOrderWithItems>> {
    ensure_staff(user)?;
    let order = MfrOrders::find_by_id(id).one(&state.orm).await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let details = mfr_order_details(&state.orm, order).await?;
    Ok(ApiResponse::success(
        "Manufacturer order",
        details,
        Some(Meta::empty()),
    ))
}

pub async fn create_mfr_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateMfrOrderRequest,
) -> AppResult<ApiResponse<MfrOrderWithItems>> {
    ensure_staff(user)?;

    if payload.books_ordered.is_empty() {
        return Err(AppError::Validation(
            "order must contain at least one book".into(),
        ));
    }
    for item in &payload.books_ordered {
        if item.quantity < 1 {
            return Err(AppError::Validation(format!(
                "invalid quantity {} for book {}",
                item.quantity, item.book_id
            )));
        }
    }
    if payload.total_cost < 0 {
        return Err(AppError::Validation("total_cost must not be negative".into()));
    }

    let txn = state.orm.begin().await?;

    let mut book_ids: Vec<Uuid> = payload.books_ordered.iter().map(|i| i.book_id).collect();
    book_ids.sort();
    book_ids.dedup();
    let known: Vec<Uuid> = Books::find()
        .filter(BookCol::Id.is_in(book_ids.clone()))
        .all(&txn)
        .await?
        .into_iter()
        .map(|b| b.id)
        .collect();
    for book_id in &book_ids {
        if !known.contains(book_id) {
            return Err(AppError::UnknownBook(*book_id));
        }
    }

    let order_id = Uuid::new_v4();
    let order = MfrOrderActive {
        id: Set(order_id),
        order_number: Set(payload.order_number),
        supplier_name: Set(payload.supplier_name),
        status: Set(OrderStatus::Pending.to_string()),
        total_cost: Set(payload.total_cost),
        order_date: Set(Utc::now().into()),
        expected_delivery_date: Set(payload
            .expected_delivery_date
            .unwrap_or_else(Utc::now)
            .into()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    for item in &payload.books_ordered {
        MfrItemActive {
            id: Set(Uuid::new_v4()),
            mfr_order_id: Set(order_id),
            book_id: Set(item.book_id),
            quantity: Set(item.quantity),
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;

    let details = mfr_order_details(&state.orm, order).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "mfr_order_create",
        Some("mfr_orders"),
        Some(serde_json::json!({ "mfr_order_id": order_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Manufacturer order created",
        details,
        Some(Meta::empty()),
    ))
}

/// Marking an order `received` restocks every ordered book in the same
/// transaction as the status change. A received order cannot be received
/// twice.
pub async fn update_mfr_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateMfrOrderStatusRequest,
) -> AppResult<ApiResponse<MfrOrderWithItems>> {
    ensure_staff(user)?;

    let txn = state.orm.begin().await?;

    let existing = MfrOrders::find_by_id(id).one(&txn).await?;
    let existing = match existing {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    if existing.status == OrderStatus::Received.as_str() {
        return Err(AppError::Validation(
            "order has already been received".into(),
        ));
    }

    if payload.status == OrderStatus::Received {
        let items = MfrOrderItems::find()
            .filter(MfrItemCol::MfrOrderId.eq(id))
            .all(&txn)
            .await?;
        for item in items {
            let result = Books::update_many()
                .col_expr(
                    BookCol::Quantity,
                    Expr::col(BookCol::Quantity).add(item.quantity),
                )
                .filter(BookCol::Id.eq(item.book_id))
                .exec(&txn)
                .await?;
            if result.rows_affected == 0 {
                // Book was deleted from the catalog after the order was
                // placed; nothing to restock.
                tracing::warn!(book_id = %item.book_id, "received stock for a deleted book");
            }
        }
    }

    let mut active = existing.into_active_model();
    active.status = Set(payload.status.to_string());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    txn.commit().await?;

    let details = mfr_order_details(&state.orm, order).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "mfr_order_status_update",
        Some("mfr_orders"),
        Some(serde_json::json!({ "mfr_order_id": id, "status": payload.status.as_str() })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Status updated",
        details,
        Some(Meta::empty()),
    ))
}

async fn mfr_order_details<C: ConnectionTrait>(
    conn: &C,
    order: MfrOrderModel,
) -> AppResult<MfrOrderWithItems> {
    let items = MfrOrderItems::find()
        .filter(MfrItemCol::MfrOrderId.eq(order.id))
        .all(conn)
        .await?;

    let mut book_ids: Vec<Uuid> = items.iter().map(|i| i.book_id).collect();
    book_ids.sort();
    book_ids.dedup();
    let books: HashMap<Uuid, BookModel> = Books::find()
        .filter(BookCol::Id.is_in(book_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|b| (b.id, b))
        .collect();

    let items = items
        .into_iter()
        .map(|item| MfrOrderItemWithBook {
            book_id: item.book_id,
            quantity: item.quantity,
            book: books.get(&item.book_id).map(|b| BookSummary {
                id: b.id,
                title: b.title.clone(),
                author: b.author.clone(),
                isbn: b.isbn.clone(),
                genre: b.genre.clone(),
                publisher: b.publisher.clone(),
                language: b.language.clone(),
                cover_image_url: b.cover_image_url.clone(),
            }),
        })
        .collect();

    Ok(MfrOrderWithItems {
        order: mfr_order_from_entity(order)?,
        items,
    })
}

fn mfr_order_from_entity(model: MfrOrderModel) -> AppResult<MfrOrder> {
    Ok(MfrOrder {
        id: model.id,
        order_number: model.order_number,
        supplier_name: model.supplier_name,
        status: model.status.parse()?,
        total_cost: model.total_cost,
        order_date: model.order_date.with_timezone(&Utc),
        expected_delivery_date: model.expected_delivery_date.with_timezone(&Utc),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}
