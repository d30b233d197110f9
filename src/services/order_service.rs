use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use sea_orm::{ActiveModelTrait, IntoActiveModel};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::sales::{
        BookSummary, OrderItemWithBook, OrderWithDetails, PartyRef, PlaceOrderRequest, SaleList,
        UpdateSaleStatusRequest,
    },
    entity::{
        books::{Column as BookCol, Entity as Books, Model as BookModel},
        customers::{Column as CustomerCol, Entity as Customers},
        employees::Entity as Employees,
        sale_items::{ActiveModel as SaleItemActive, Column as SaleItemCol, Entity as SaleItems},
        sales::{ActiveModel as SaleActive, Column as SaleCol, Entity as Sales, Model as SaleModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin, ensure_staff},
    models::{Address, OrderStatus, Sale, SaleType},
    response::{ApiResponse, Meta},
    routes::params::{SaleListQuery, SortOrder},
    state::AppState,
};

/// Validate a proposed sale against current stock, snapshot prices, persist
/// the order and decrement inventory, all inside one transaction. Any failure
/// rolls the whole order back; stock is never partially consumed.
pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<OrderWithDetails>> {
    if payload.order_items.is_empty() {
        return Err(AppError::Validation(
            "order must contain at least one item".into(),
        ));
    }
    for item in &payload.order_items {
        if item.quantity < 1 {
            return Err(AppError::Validation(format!(
                "invalid quantity {} for book {}",
                item.quantity, item.book_id
            )));
        }
    }

    let txn = state.orm.begin().await?;

    let mut book_ids: Vec<Uuid> = payload.order_items.iter().map(|i| i.book_id).collect();
    book_ids.sort();
    book_ids.dedup();

    let books: HashMap<Uuid, BookModel> = Books::find()
        .filter(BookCol::Id.is_in(book_ids))
        .all(&txn)
        .await?
        .into_iter()
        .map(|b| (b.id, b))
        .collect();

    // Requested quantities are accumulated per book so a book repeated across
    // line items is checked against its stock as a whole.
    let mut requested: HashMap<Uuid, i32> = HashMap::new();
    let mut lines: Vec<(Uuid, i32, i64)> = Vec::with_capacity(payload.order_items.len());
    let mut total_price: i64 = 0;
    for item in &payload.order_items {
        let book = books
            .get(&item.book_id)
            .ok_or(AppError::UnknownBook(item.book_id))?;
        let so_far = requested.entry(item.book_id).or_insert(0);
        *so_far += item.quantity;
        if *so_far > book.quantity {
            return Err(AppError::InsufficientStock {
                book_id: book.id,
                requested: *so_far,
                available: book.quantity,
            });
        }
        // Snapshot the authoritative catalog price; whatever the client may
        // think the price is never enters the order.
        total_price += book.price * i64::from(item.quantity);
        lines.push((item.book_id, item.quantity, book.price));
    }

    if payload.sale_type == SaleType::Online && payload.shipping_address.is_none() {
        return Err(AppError::ShippingAddressRequired);
    }

    let sale_id = Uuid::new_v4();
    let ship = payload.shipping_address.as_ref();
    let sale = SaleActive {
        id: Set(sale_id),
        sale_type: Set(payload.sale_type.to_string()),
        status: Set(OrderStatus::Pending.to_string()),
        order_date: Set(Utc::now().into()),
        total_price: Set(total_price),
        payment_method: Set(payload.payment_method.to_string()),
        employee_id: Set(payload.employee_id),
        customer_id: Set(payload.customer_id),
        ship_street: Set(ship.map(|a| a.street.clone())),
        ship_city: Set(ship.map(|a| a.city.clone())),
        ship_state: Set(ship.map(|a| a.state.clone())),
        ship_zip_code: Set(ship.map(|a| a.zip_code.clone())),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    for (book_id, quantity, price) in &lines {
        SaleItemActive {
            id: Set(Uuid::new_v4()),
            sale_id: Set(sale_id),
            book_id: Set(*book_id),
            quantity: Set(*quantity),
            price: Set(*price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
    }

    // Conditional decrement per book: zero rows affected means a concurrent
    // order won the remaining stock, and the rollback undoes everything done
    // so far. Decrements run in book-id order.
    let mut decrements: Vec<(Uuid, i32)> = requested.into_iter().collect();
    decrements.sort();
    for (book_id, quantity) in decrements {
        let result = Books::update_many()
            .col_expr(BookCol::Quantity, Expr::col(BookCol::Quantity).sub(quantity))
            .filter(BookCol::Id.eq(book_id))
            .filter(BookCol::Quantity.gte(quantity))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            let available = Books::find_by_id(book_id)
                .one(&txn)
                .await?
                .map(|b| b.quantity)
                .unwrap_or(0);
            return Err(AppError::InsufficientStock {
                book_id,
                requested: quantity,
                available,
            });
        }
    }

    if let Some(customer_id) = payload.customer_id {
        Customers::update_many()
            .col_expr(
                CustomerCol::OrderCount,
                Expr::col(CustomerCol::OrderCount).add(1),
            )
            .col_expr(
                CustomerCol::TotalSpent,
                Expr::col(CustomerCol::TotalSpent).add(total_price),
            )
            .col_expr(CustomerCol::LastPurchase, Expr::value(Utc::now()))
            .filter(CustomerCol::Id.eq(customer_id))
            .exec(&txn)
            .await?;
    }

    txn.commit().await?;

    let details = order_details(&state.orm, sale).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "sale_create",
        Some("sales"),
        Some(serde_json::json!({ "sale_id": sale_id, "total_price": total_price })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Sale created",
        details,
        Some(Meta::empty()),
    ))
}

pub async fn list_sales(
    state: &AppState,
    user: &AuthUser,
    query: SaleListQuery,
) -> AppResult<ApiResponse<SaleList>> {
    ensure_staff(user)?;
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
        let status: OrderStatus = status.parse()?;
        condition = condition.add(SaleCol::Status.eq(status.as_str()));
    }
    if let Some(sale_type) = query.sale_type.as_deref().filter(|s| !s.is_empty()) {
        let sale_type: SaleType = sale_type.parse()?;
        condition = condition.add(SaleCol::SaleType.eq(sale_type.as_str()));
    }

    let mut finder = Sales::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(SaleCol::OrderDate),
        SortOrder::Desc => finder.order_by_desc(SaleCol::OrderDate),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let sales = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(sale_from_entity)
        .collect::<AppResult<Vec<Sale>>>()?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Sales",
        SaleList { items: sales },
        Some(meta),
    ))
}

pub async fn get_sale(
    state: &AppState,
    _user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithDetails>> {
    let sale = Sales::find_by_id(id).one(&state.orm).await?;
    let sale = match sale {
        Some(s) => s,
        None => return Err(AppError::NotFound),
    };

    let details = order_details(&state.orm, sale).await?;
    Ok(ApiResponse::success("Sale", details, Some(Meta::empty())))
}

/// Status transitions never touch `total_price`; the total is fixed at
/// creation time.
pub async fn update_sale_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateSaleStatusRequest,
) -> AppResult<ApiResponse<Sale>> {
    ensure_staff(user)?;

    let existing = Sales::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(s) => s,
        None => return Err(AppError::NotFound),
    };

    let mut active = existing.into_active_model();
    active.status = Set(payload.status.to_string());
    active.updated_at = Set(Utc::now().into());
    let sale = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "sale_status_update",
        Some("sales"),
        Some(serde_json::json!({ "sale_id": sale.id, "status": sale.status })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Status updated",
        sale_from_entity(sale)?,
        Some(Meta::empty()),
    ))
}

pub async fn delete_sale(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Sales::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "sale_delete",
        Some("sales"),
        Some(serde_json::json!({ "sale_id": id })),
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

/// Join a persisted sale with current book metadata and the referenced
/// customer/employee identity for display.
async fn order_details<C: ConnectionTrait>(
    conn: &C,
    sale: SaleModel,
) -> AppResult<OrderWithDetails> {
    let items = SaleItems::find()
        .filter(SaleItemCol::SaleId.eq(sale.id))
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

    let items: Vec<OrderItemWithBook> = items
        .into_iter()
        .map(|item| OrderItemWithBook {
            book_id: item.book_id,
            quantity: item.quantity,
            price: item.price,
            book: books.get(&item.book_id).map(book_summary),
        })
        .collect();

    let customer = match sale.customer_id {
        Some(id) => Customers::find_by_id(id).one(conn).await?.map(|c| PartyRef {
            id: c.id,
            name: full_name(c.first_name.as_deref(), c.last_name.as_deref()),
        }),
        None => None,
    };
    let employee = match sale.employee_id {
        Some(id) => Employees::find_by_id(id).one(conn).await?.map(|e| PartyRef {
            id: e.id,
            name: full_name(e.first_name.as_deref(), e.last_name.as_deref()),
        }),
        None => None,
    };

    let total_items = items.iter().map(|i| i64::from(i.quantity)).sum();

    Ok(OrderWithDetails {
        order: sale_from_entity(sale)?,
        items,
        total_items,
        customer,
        employee,
    })
}

fn book_summary(book: &BookModel) -> BookSummary {
    BookSummary {
        id: book.id,
        title: book.title.clone(),
        author: book.author.clone(),
        isbn: book.isbn.clone(),
        genre: book.genre.clone(),
        publisher: book.publisher.clone(),
        language: book.language.clone(),
        cover_image_url: book.cover_image_url.clone(),
    }
}

fn full_name(first: Option<&str>, last: Option<&str>) -> String {
    [first, last]
        .iter()
        .filter_map(|p| *p)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn sale_from_entity(model: SaleModel) -> AppResult<Sale> {
    let shipping_address = Address::from_parts(
        model.ship_street,
        model.ship_city,
        model.ship_state,
        model.ship_zip_code,
    );

    Ok(Sale {
        id: model.id,
        sale_type: model.sale_type.parse()?,
        status: model.status.parse()?,
        order_date: model.order_date.with_timezone(&chrono::Utc),
        total_price: model.total_price,
        payment_method: model.payment_method.parse()?,
        employee_id: model.employee_id,
        customer_id: model.customer_id,
        shipping_address,
        created_at: model.created_at.with_timezone(&chrono::Utc),
        updated_at: model.updated_at.with_timezone(&chrono::Utc),
    })
}
