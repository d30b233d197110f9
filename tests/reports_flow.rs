use bodhi_bookstore_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    entity::{
        books::ActiveModel as BookActive,
        sale_items::ActiveModel as SaleItemActive,
        sales::ActiveModel as SaleActive,
    },
    middleware::auth::AuthUser,
    routes::params::ReportQuery,
    services::report_service,
    state::AppState,
};
use chrono::{NaiveDate, TimeZone, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use uuid::Uuid;

// Integration coverage for the reporting engine: daily buckets, top
// genres/books, the summary facets, and date-filter semantics.

async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url =
        match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
            Ok(url) => url,
            Err(_) => {
                eprintln!(
                    "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
                );
                return Ok(None);
            }
        };

    let pool = create_pool(&database_url).await?;
    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;

    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE sale_items, sales, mfr_order_items, mfr_orders, audit_logs, \
         customers, employees, books, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    Ok(Some(AppState { pool, orm }))
}

async fn create_book(
    state: &AppState,
    title: &str,
    genre: &str,
    isbn: &str,
    price: i64,
) -> anyhow::Result<Uuid> {
    let book = BookActive {
        id: Set(Uuid::new_v4()),
        title: Set(title.into()),
        author: Set("Fixture Author".into()),
        genre: Set(genre.into()),
        isbn: Set(isbn.into()),
        summary: Set("Fixture".into()),
        publisher: Set("Fixture Press".into()),
        publication_date: Set(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()),
        page_count: Set(100),
        language: Set("English".into()),
        cover_image_url: Set("https://covers.test/none.jpg".into()),
        quantity: Set(100),
        price: Set(price),
        low_stock_threshold: Set(1),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(book.id)
}

/// Insert a sale directly with a pinned order date; items are
/// (book, quantity, snapshot price) triples.
async fn create_sale(
    state: &AppState,
    sale_type: &str,
    status: &str,
    order_date: chrono::DateTime<Utc>,
    items: &[(Uuid, i32, i64)],
) -> anyhow::Result<Uuid> {
    let total: i64 = items.iter().map(|(_, q, p)| p * i64::from(*q)).sum();
    let sale_id = Uuid::new_v4();
    SaleActive {
        id: Set(sale_id),
        sale_type: Set(sale_type.into()),
        status: Set(status.into()),
        order_date: Set(order_date.into()),
        total_price: Set(total),
        payment_method: Set("cash".into()),
        employee_id: Set(None),
        customer_id: Set(None),
        ship_street: Set(None),
        ship_city: Set(None),
        ship_state: Set(None),
        ship_zip_code: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    for (book_id, quantity, price) in items {
        SaleItemActive {
            id: Set(Uuid::new_v4()),
            sale_id: Set(sale_id),
            book_id: Set(*book_id),
            quantity: Set(*quantity),
            price: Set(*price),
            created_at: NotSet,
        }
        .insert(&state.orm)
        .await?;
    }

    Ok(sale_id)
}

fn analyst() -> AuthUser {
    AuthUser {
        user_id: Uuid::new_v4(),
        role: "employee".into(),
    }
}

fn date_query(start: NaiveDate, end: NaiveDate) -> ReportQuery {
    ReportQuery {
        start_date: Some(start),
        end_date: Some(end),
        ..Default::default()
    }
}

#[tokio::test]
async fn daily_sales_buckets_by_calendar_day() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let fiction = create_book(&state, "The Silent Orchard", "Fiction", "978-10", 10).await?;

    // One order late on Jan 1 (total 30), two on Jan 2 (total 50 combined).
    create_sale(
        &state,
        "instore",
        "pending",
        Utc.with_ymd_and_hms(2024, 1, 1, 22, 15, 0).unwrap(),
        &[(fiction, 3, 10)],
    )
    .await?;
    create_sale(
        &state,
        "instore",
        "pending",
        Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap(),
        &[(fiction, 2, 10)],
    )
    .await?;
    create_sale(
        &state,
        "online",
        "shipped",
        Utc.with_ymd_and_hms(2024, 1, 2, 18, 30, 0).unwrap(),
        &[(fiction, 3, 10)],
    )
    .await?;

    let rows = report_service::daily_sales(&state, &analyst(), ReportQuery::default())
        .await?
        .data
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].day, "2024-01-01");
    assert_eq!(rows[0].total_sales, 30);
    assert_eq!(rows[0].total_items, 3);
    assert_eq!(rows[0].order_count, 1);
    assert_eq!(rows[1].day, "2024-01-02");
    assert_eq!(rows[1].total_sales, 50);
    assert_eq!(rows[1].total_items, 5);
    assert_eq!(rows[1].order_count, 2);

    Ok(())
}

#[tokio::test]
async fn top_genres_and_books_rank_by_units_sold() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let fiction = create_book(&state, "The Silent Orchard", "Fiction", "978-11", 10).await?;
    let history = create_book(&state, "Rivers of the Old Empire", "History", "978-12", 20).await?;

    // Fiction outsells History 10 units to 3.
    create_sale(
        &state,
        "instore",
        "pending",
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        &[(fiction, 6, 10), (history, 3, 20)],
    )
    .await?;
    create_sale(
        &state,
        "online",
        "shipped",
        Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0).unwrap(),
        &[(fiction, 4, 10)],
    )
    .await?;

    let user = analyst();

    let genres = report_service::top_genres(
        &state,
        &user,
        ReportQuery {
            limit: Some(1),
            ..Default::default()
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(genres.len(), 1);
    assert_eq!(genres[0].genre, "Fiction");
    assert_eq!(genres[0].total_sold, 10);
    assert_eq!(genres[0].revenue, 100);

    let books = report_service::top_books(&state, &user, ReportQuery::default())
        .await?
        .data
        .unwrap();
    assert_eq!(books.len(), 2);
    assert_eq!(books[0].title, "The Silent Orchard");
    assert_eq!(books[0].total_sold, 10);
    assert_eq!(books[1].title, "Rivers of the Old Empire");
    assert_eq!(books[1].total_sold, 3);
    assert_eq!(books[1].revenue, 60);

    Ok(())
}

#[tokio::test]
async fn summary_facets_share_one_filtered_snapshot() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let fiction = create_book(&state, "Lighthouse Arithmetic", "Fiction", "978-13", 10).await?;

    create_sale(
        &state,
        "instore",
        "pending",
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
        &[(fiction, 2, 10)],
    )
    .await?;
    create_sale(
        &state,
        "online",
        "shipped",
        Utc.with_ymd_and_hms(2024, 5, 1, 11, 0, 0).unwrap(),
        &[(fiction, 1, 10)],
    )
    .await?;
    create_sale(
        &state,
        "online",
        "pending",
        Utc.with_ymd_and_hms(2024, 5, 2, 11, 0, 0).unwrap(),
        &[(fiction, 3, 10)],
    )
    .await?;

    let summary = report_service::sales_summary(&state, &analyst(), ReportQuery::default())
        .await?
        .data
        .unwrap();

    assert_eq!(summary.total_orders, 3);
    assert_eq!(summary.total_revenue, 60);
    assert_eq!(summary.total_items, 6);
    assert!((summary.average_order_value - 20.0).abs() < f64::EPSILON);

    let online = summary
        .sales_by_type
        .iter()
        .find(|t| t.sale_type == "online")
        .expect("online bucket");
    assert_eq!(online.count, 2);
    assert_eq!(online.revenue, 40);
    let pending = summary
        .sales_by_status
        .iter()
        .find(|s| s.status == "pending")
        .expect("pending bucket");
    assert_eq!(pending.count, 2);

    Ok(())
}

#[tokio::test]
async fn empty_filtered_set_yields_zeroed_summary() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let query = ReportQuery {
        customer_id: Some(Uuid::new_v4()),
        ..Default::default()
    };
    let summary = report_service::sales_summary(&state, &analyst(), query)
        .await?
        .data
        .unwrap();

    assert_eq!(summary.total_revenue, 0);
    assert_eq!(summary.total_orders, 0);
    assert_eq!(summary.total_items, 0);
    assert_eq!(summary.average_order_value, 0.0);
    assert!(summary.sales_by_type.is_empty());
    assert!(summary.sales_by_status.is_empty());

    Ok(())
}

#[tokio::test]
async fn single_day_filter_matches_any_time_of_day() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let fiction = create_book(&state, "Gardens of Glass", "Sci-Fi", "978-14", 10).await?;

    create_sale(
        &state,
        "instore",
        "pending",
        Utc.with_ymd_and_hms(2024, 1, 1, 23, 59, 59).unwrap(),
        &[(fiction, 1, 10)],
    )
    .await?;
    create_sale(
        &state,
        "instore",
        "pending",
        Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 1).unwrap(),
        &[(fiction, 1, 10)],
    )
    .await?;
    create_sale(
        &state,
        "instore",
        "pending",
        Utc.with_ymd_and_hms(2024, 1, 2, 23, 59, 59).unwrap(),
        &[(fiction, 1, 10)],
    )
    .await?;
    create_sale(
        &state,
        "instore",
        "pending",
        Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap(),
        &[(fiction, 1, 10)],
    )
    .await?;

    let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let rows = report_service::daily_sales(&state, &analyst(), date_query(day, day))
        .await?
        .data
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].day, "2024-01-02");
    assert_eq!(rows[0].order_count, 2);

    Ok(())
}
