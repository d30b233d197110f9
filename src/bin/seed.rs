use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use bodhi_bookstore_api::{config::AppConfig, db::create_pool};
use chrono::NaiveDate;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_user(&pool, "admin@bodhi.example", "admin123", "admin").await?;
    let employee_id = ensure_user(&pool, "clerk@bodhi.example", "clerk123", "employee").await?;
    seed_books(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, Employee ID: {employee_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, first_name, last_name, role)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind("Bodhi")
    .bind("Staff")
    .bind(role)
    .fetch_optional(pool)
    .await?;

    // If user already exists, fetch id
    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn seed_books(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let books = vec![
        (
            "The Silent Orchard",
            "Maya Feldman",
            "Fiction",
            "978-1-0000-0001-1",
            "A family secret unravels across three summers.",
            "Juniper House",
            NaiveDate::from_ymd_opt(2019, 4, 2).unwrap(),
            312,
            "English",
            "https://covers.bodhi.example/silent-orchard.jpg",
            25,
            1899,
        ),
        (
            "Rivers of the Old Empire",
            "Theo Brandt",
            "History",
            "978-1-0000-0002-8",
            "Trade, flood and faith along ancient waterways.",
            "Meridian Press",
            NaiveDate::from_ymd_opt(2021, 9, 14).unwrap(),
            448,
            "English",
            "https://covers.bodhi.example/rivers-old-empire.jpg",
            12,
            2999,
        ),
        (
            "Lighthouse Arithmetic",
            "Ines Calloway",
            "Fiction",
            "978-1-0000-0003-5",
            "A keeper's daughter counts what the sea takes.",
            "Juniper House",
            NaiveDate::from_ymd_opt(2023, 1, 30).unwrap(),
            276,
            "English",
            "https://covers.bodhi.example/lighthouse-arithmetic.jpg",
            40,
            1599,
        ),
        (
            "Gardens of Glass",
            "Rafael Ortiz",
            "Sci-Fi",
            "978-1-0000-0004-2",
            "Terraforming crews tend the last greenhouses on Mars.",
            "Meridian Press",
            NaiveDate::from_ymd_opt(2022, 6, 7).unwrap(),
            390,
            "Spanish",
            "https://covers.bodhi.example/gardens-of-glass.jpg",
            8,
            2199,
        ),
    ];

    for (
        title,
        author,
        genre,
        isbn,
        summary,
        publisher,
        publication_date,
        page_count,
        language,
        cover_image_url,
        quantity,
        price,
    ) in books
    {
        sqlx::query(
            r#"
            INSERT INTO books (id, title, author, genre, isbn, summary, publisher,
                               publication_date, page_count, language, cover_image_url,
                               quantity, price)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (isbn) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(author)
        .bind(genre)
        .bind(isbn)
        .bind(summary)
        .bind(publisher)
        .bind(publication_date)
        .bind(page_count)
        .bind(language)
        .bind(cover_image_url)
        .bind(quantity)
        .bind(price as i64)
        .execute(pool)
        .await?;
    }

    println!("Seeded books");
    Ok(())
}
