use chrono::{DateTime, Days, NaiveTime, Utc};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    dto::reports::{
        DailySalesRow, SalesSummary, StatusBreakdown, TopBookRow, TopGenreRow, TypeBreakdown,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{OrderStatus, SaleType},
    response::{ApiResponse, Meta},
    routes::params::ReportQuery,
    state::AppState,
};

/// Normalized report predicate. Built once per request from the sparse query
/// parameters; every report operation shares the same predicate semantics.
#[derive(Debug, Default, Clone)]
pub struct ReportFilter {
    pub start: Option<DateTime<Utc>>,
    /// Exclusive upper bound: midnight after the requested end date, so a
    /// date range is inclusive on both ends regardless of stored
    /// time-of-day.
    pub end_exclusive: Option<DateTime<Utc>>,
    pub sale_type: Option<SaleType>,
    pub status: Option<OrderStatus>,
    /// Lowercased whitespace tokens from the title filter; matching any token
    /// is sufficient.
    pub title_tokens: Vec<String>,
    pub genres: Vec<String>,
    pub customer_id: Option<Uuid>,
}

impl ReportFilter {
    pub fn build(query: &ReportQuery) -> AppResult<Self> {
        let start = query
            .start_date
            .map(|d| d.and_time(NaiveTime::MIN).and_utc());
        let end_exclusive = query
            .end_date
            .map(|d| {
                d.checked_add_days(Days::new(1))
                    .ok_or_else(|| AppError::Validation("end_date out of range".into()))
                    .map(|next| next.and_time(NaiveTime::MIN).and_utc())
            })
            .transpose()?;
        if let (Some(start), Some(end)) = (start, end_exclusive) {
            if start >= end {
                return Err(AppError::Validation(
                    "start_date must not be after end_date".into(),
                ));
            }
        }

        let sale_type = query
            .sale_type
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .transpose()?;
        let status = query
            .status
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .transpose()?;

        let title_tokens = query
            .book_title
            .as_deref()
            .map(|title| {
                title
                    .split_whitespace()
                    .map(|token| token.to_lowercase())
                    .collect()
            })
            .unwrap_or_default();

        let genres = query
            .genre
            .as_deref()
            .map(|genres| {
                genres
                    .split(',')
                    .map(str::trim)
                    .filter(|g| !g.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            start,
            end_exclusive,
            sale_type,
            status,
            title_tokens,
            genres,
            customer_id: query.customer_id,
        })
    }

    /// Append the predicate to a query whose sales table is aliased `s`.
    /// Title/genre constraints select orders containing at least one matching
    /// line item.
    fn apply(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        if let Some(start) = self.start {
            qb.push(" AND s.order_date >= ").push_bind(start);
        }
        if let Some(end) = self.end_exclusive {
            qb.push(" AND s.order_date < ").push_bind(end);
        }
        if let Some(sale_type) = self.sale_type {
            qb.push(" AND s.sale_type = ").push_bind(sale_type.as_str());
        }
        if let Some(status) = self.status {
            qb.push(" AND s.status = ").push_bind(status.as_str());
        }
        if let Some(customer_id) = self.customer_id {
            qb.push(" AND s.customer_id = ").push_bind(customer_id);
        }
        if !self.title_tokens.is_empty() {
            qb.push(
                " AND EXISTS (SELECT 1 FROM sale_items ti JOIN books tb ON tb.id = ti.book_id \
                 WHERE ti.sale_id = s.id AND (",
            );
            for (i, token) in self.title_tokens.iter().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                qb.push("tb.title ILIKE ").push_bind(format!("%{token}%"));
            }
            qb.push("))");
        }
        if !self.genres.is_empty() {
            qb.push(
                " AND EXISTS (SELECT 1 FROM sale_items gi JOIN books gb ON gb.id = gi.book_id \
                 WHERE gi.sale_id = s.id AND gb.genre = ANY(",
            );
            qb.push_bind(self.genres.clone());
            qb.push("))");
        }
    }
}

/// Per-day rollup of total revenue, items sold and order count, ascending by
/// calendar day.
pub async fn daily_sales(
    state: &AppState,
    _user: &AuthUser,
    query: ReportQuery,
) -> AppResult<ApiResponse<Vec<DailySalesRow>>> {
    let filter = ReportFilter::build(&query)?;

    let mut qb = QueryBuilder::new(
        "SELECT to_char(s.order_date AT TIME ZONE 'UTC', 'YYYY-MM-DD') AS day, \
         COALESCE(SUM(s.total_price), 0)::BIGINT AS total_sales, \
         COALESCE(SUM(i.item_count), 0)::BIGINT AS total_items, \
         COUNT(*) AS order_count \
         FROM sales s \
         LEFT JOIN (SELECT sale_id, SUM(quantity) AS item_count FROM sale_items GROUP BY sale_id) i \
         ON i.sale_id = s.id \
         WHERE TRUE",
    );
    filter.apply(&mut qb);
    qb.push(" GROUP BY 1 ORDER BY 1");

    let rows: Vec<DailySalesRow> = qb.build_query_as().fetch_all(&state.pool).await?;
    Ok(ApiResponse::success("Daily sales", rows, Some(Meta::empty())))
}

/// Genres ranked by units sold over the filtered orders.
pub async fn top_genres(
    state: &AppState,
    _user: &AuthUser,
    query: ReportQuery,
) -> AppResult<ApiResponse<Vec<TopGenreRow>>> {
    let limit = query.limit.unwrap_or(5).clamp(1, 100);
    let filter = ReportFilter::build(&query)?;

    let mut qb = QueryBuilder::new(
        "SELECT b.genre AS genre, \
         COALESCE(SUM(si.quantity), 0)::BIGINT AS total_sold, \
         COALESCE(SUM(si.price * si.quantity), 0)::BIGINT AS revenue \
         FROM sales s \
         JOIN sale_items si ON si.sale_id = s.id \
         JOIN books b ON b.id = si.book_id \
         WHERE TRUE",
    );
    filter.apply(&mut qb);
    qb.push(" GROUP BY b.genre ORDER BY total_sold DESC LIMIT ");
    qb.push_bind(limit);

    let rows: Vec<TopGenreRow> = qb.build_query_as().fetch_all(&state.pool).await?;
    Ok(ApiResponse::success("Top genres", rows, Some(Meta::empty())))
}

/// Books ranked by units sold over the filtered orders.
pub async fn top_books(
    state: &AppState,
    _user: &AuthUser,
    query: ReportQuery,
) -> AppResult<ApiResponse<Vec<TopBookRow>>> {
    let limit = query.limit.unwrap_or(10).clamp(1, 100);
    let filter = ReportFilter::build(&query)?;

    let mut qb = QueryBuilder::new(
        "SELECT b.id AS book_id, b.title AS title, b.author AS author, b.isbn AS isbn, \
         COALESCE(SUM(si.quantity), 0)::BIGINT AS total_sold, \
         COALESCE(SUM(si.price * si.quantity), 0)::BIGINT AS revenue \
         FROM sales s \
         JOIN sale_items si ON si.sale_id = s.id \
         JOIN books b ON b.id = si.book_id \
         WHERE TRUE",
    );
    filter.apply(&mut qb);
    qb.push(" GROUP BY b.id, b.title, b.author, b.isbn ORDER BY total_sold DESC LIMIT ");
    qb.push_bind(limit);

    let rows: Vec<TopBookRow> = qb.build_query_as().fetch_all(&state.pool).await?;
    Ok(ApiResponse::success("Top books", rows, Some(Meta::empty())))
}

#[derive(Debug, sqlx::FromRow)]
struct SummaryRow {
    g_type: i32,
    g_status: i32,
    sale_type: Option<String>,
    status: Option<String>,
    order_count: i64,
    revenue: i64,
    total_items: i64,
}

/// Totals, averages and the by-type/by-status breakdowns, computed over one
/// filtered snapshot via grouping sets rather than repeated scans.
pub async fn sales_summary(
    state: &AppState,
    _user: &AuthUser,
    query: ReportQuery,
) -> AppResult<ApiResponse<SalesSummary>> {
    let filter = ReportFilter::build(&query)?;

    let mut qb = QueryBuilder::new(
        "WITH filtered AS (\
         SELECT s.id, s.sale_type, s.status, s.total_price, COALESCE(i.item_count, 0) AS item_count \
         FROM sales s \
         LEFT JOIN (SELECT sale_id, SUM(quantity) AS item_count FROM sale_items GROUP BY sale_id) i \
         ON i.sale_id = s.id \
         WHERE TRUE",
    );
    filter.apply(&mut qb);
    qb.push(
        ") SELECT GROUPING(sale_type)::INT AS g_type, GROUPING(status)::INT AS g_status, \
         sale_type, status, COUNT(*) AS order_count, \
         COALESCE(SUM(total_price), 0)::BIGINT AS revenue, \
         COALESCE(SUM(item_count), 0)::BIGINT AS total_items \
         FROM filtered GROUP BY GROUPING SETS ((), (sale_type), (status))",
    );

    let rows: Vec<SummaryRow> = qb.build_query_as().fetch_all(&state.pool).await?;

    let mut summary = SalesSummary::default();
    for row in rows {
        match (row.g_type, row.g_status) {
            // Grand total: the empty grouping set yields exactly one row,
            // even over an empty filtered set.
            (1, 1) => {
                summary.total_revenue = row.revenue;
                summary.total_orders = row.order_count;
                summary.total_items = row.total_items;
                summary.average_order_value = if row.order_count > 0 {
                    row.revenue as f64 / row.order_count as f64
                } else {
                    0.0
                };
            }
            (0, 1) => summary.sales_by_type.push(TypeBreakdown {
                sale_type: row.sale_type.unwrap_or_default(),
                count: row.order_count,
                revenue: row.revenue,
            }),
            (1, 0) => summary.sales_by_status.push(StatusBreakdown {
                status: row.status.unwrap_or_default(),
                count: row.order_count,
            }),
            _ => {}
        }
    }
    summary.sales_by_type.sort_by(|a, b| b.count.cmp(&a.count));
    summary
        .sales_by_status
        .sort_by(|a, b| b.count.cmp(&a.count));

    Ok(ApiResponse::success(
        "Sales summary",
        summary,
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn empty_query_builds_an_open_filter() {
        let filter = ReportFilter::build(&ReportQuery::default()).unwrap();
        assert!(filter.start.is_none());
        assert!(filter.end_exclusive.is_none());
        assert!(filter.sale_type.is_none());
        assert!(filter.status.is_none());
        assert!(filter.title_tokens.is_empty());
        assert!(filter.genres.is_empty());
        assert!(filter.customer_id.is_none());
    }

    #[test]
    fn date_range_is_inclusive_on_both_ends() {
        let query = ReportQuery {
            start_date: Some(date(2024, 1, 2)),
            end_date: Some(date(2024, 1, 2)),
            ..Default::default()
        };
        let filter = ReportFilter::build(&query).unwrap();
        let start = filter.start.unwrap();
        let end = filter.end_exclusive.unwrap();
        assert_eq!(start.to_rfc3339(), "2024-01-02T00:00:00+00:00");
        // A timestamp late in the day still falls inside the range.
        let late = date(2024, 1, 2).and_hms_opt(23, 59, 59).unwrap().and_utc();
        assert!(late >= start && late < end);
        assert_eq!(end.to_rfc3339(), "2024-01-03T00:00:00+00:00");
    }

    #[test]
    fn inverted_date_range_is_rejected() {
        let query = ReportQuery {
            start_date: Some(date(2024, 2, 1)),
            end_date: Some(date(2024, 1, 1)),
            ..Default::default()
        };
        assert!(ReportFilter::build(&query).is_err());
    }

    #[test]
    fn title_is_tokenized_and_lowercased() {
        let query = ReportQuery {
            book_title: Some("The GREAT Gatsby".into()),
            ..Default::default()
        };
        let filter = ReportFilter::build(&query).unwrap();
        assert_eq!(filter.title_tokens, vec!["the", "great", "gatsby"]);
    }

    #[test]
    fn genre_list_is_split_and_trimmed() {
        let query = ReportQuery {
            genre: Some("Fiction, History,,  Sci-Fi ".into()),
            ..Default::default()
        };
        let filter = ReportFilter::build(&query).unwrap();
        assert_eq!(filter.genres, vec!["Fiction", "History", "Sci-Fi"]);
    }

    #[test]
    fn junk_sale_type_is_rejected() {
        let query = ReportQuery {
            sale_type: Some("mailorder".into()),
            ..Default::default()
        };
        assert!(ReportFilter::build(&query).is_err());
    }
}
