//! Read queries. Each function runs one statement on the request's connection.

use chrono::NaiveDate;
use sqlx::PgConnection;

use crate::config::{NOTIFICATIONS_LIMIT, REVIEWS_LIMIT, TOP_KEYWORDS_LIMIT};
use crate::db::models::{
    Competitor, CtrMetric, CtrSummary, Keyword, Notification, PositionPoint, ProductSummary,
    Review, SalesPoint, Stats,
};
use crate::error::Result;

/// Products of a user, newest first, each with its latest position and CTR.
/// The two latest values are looked up independently by date.
pub async fn products(
    conn: &mut PgConnection,
    user_id: i32,
    platform: Option<&str>,
) -> Result<Vec<ProductSummary>> {
    let rows = sqlx::query_as::<_, ProductSummary>(
        r#"
        SELECT p.id, p.user_id, p.platform, p.external_id, p.name, p.price,
               p.url, p.image_url, p.category, p.created_at, p.updated_at,
               COALESCE(ph.position, 0) AS current_position,
               COALESCE(cm.ctr, 0)::float8 AS ctr
        FROM products p
        LEFT JOIN LATERAL (
            SELECT position
            FROM position_history
            WHERE product_id = p.id
            ORDER BY date DESC, id DESC
            LIMIT 1
        ) ph ON true
        LEFT JOIN LATERAL (
            SELECT COALESCE(
                       ctr,
                       CASE WHEN impressions > 0
                            THEN ROUND(clicks::numeric / impressions * 100, 2)::float8
                            ELSE 0 END
                   ) AS ctr
            FROM ctr_metrics
            WHERE product_id = p.id
            ORDER BY date DESC, id DESC
            LIMIT 1
        ) cm ON true
        WHERE p.user_id = $1 AND ($2::text IS NULL OR p.platform = $2)
        ORDER BY p.created_at DESC, p.id DESC
        "#,
    )
    .bind(user_id)
    .bind(platform)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows)
}

/// Totals since `since`. Each aggregate runs over the user's products on its
/// own, so rows of one history table never multiply rows of another.
pub async fn stats(conn: &mut PgConnection, user_id: i32, since: NaiveDate) -> Result<Stats> {
    let stats = sqlx::query_as::<_, Stats>(
        r#"
        SELECT
            (SELECT COALESCE(SUM(sh.revenue), 0)::float8
             FROM sales_history sh JOIN products p ON p.id = sh.product_id
             WHERE p.user_id = $1 AND sh.date >= $2) AS total_revenue,
            (SELECT COALESCE(SUM(sh.sales_count), 0)::bigint
             FROM sales_history sh JOIN products p ON p.id = sh.product_id
             WHERE p.user_id = $1 AND sh.date >= $2) AS total_sales,
            (SELECT COALESCE(AVG(ph.position), 0)::float8
             FROM position_history ph JOIN products p ON p.id = ph.product_id
             WHERE p.user_id = $1 AND ph.date >= $2) AS avg_position,
            (SELECT COALESCE(AVG(COALESCE(
                        cm.ctr,
                        CASE WHEN cm.impressions > 0
                             THEN ROUND(cm.clicks::numeric / cm.impressions * 100, 2)::float8
                             ELSE 0 END)), 0)::float8
             FROM ctr_metrics cm JOIN products p ON p.id = cm.product_id
             WHERE p.user_id = $1 AND cm.date >= $2) AS avg_ctr
        "#,
    )
    .bind(user_id)
    .bind(since)
    .fetch_one(&mut *conn)
    .await?;

    Ok(stats)
}

pub async fn product_sales(
    conn: &mut PgConnection,
    product_id: i32,
    since: NaiveDate,
) -> Result<Vec<SalesPoint>> {
    let rows = sqlx::query_as::<_, SalesPoint>(
        r#"
        SELECT date,
               sales_count::bigint AS sales_count,
               revenue,
               orders_count::bigint AS orders_count
        FROM sales_history
        WHERE product_id = $1 AND date >= $2
        ORDER BY date ASC
        "#,
    )
    .bind(product_id)
    .bind(since)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows)
}

/// Daily sales summed over all of a user's products.
pub async fn user_sales(
    conn: &mut PgConnection,
    user_id: i32,
    since: NaiveDate,
) -> Result<Vec<SalesPoint>> {
    let rows = sqlx::query_as::<_, SalesPoint>(
        r#"
        SELECT sh.date,
               SUM(sh.sales_count)::bigint AS sales_count,
               SUM(sh.revenue)::float8 AS revenue,
               SUM(sh.orders_count)::bigint AS orders_count
        FROM sales_history sh
        JOIN products p ON p.id = sh.product_id
        WHERE p.user_id = $1 AND sh.date >= $2
        GROUP BY sh.date
        ORDER BY sh.date ASC
        "#,
    )
    .bind(user_id)
    .bind(since)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows)
}

pub async fn position_history(
    conn: &mut PgConnection,
    product_id: i32,
    since: NaiveDate,
) -> Result<Vec<PositionPoint>> {
    let rows = sqlx::query_as::<_, PositionPoint>(
        r#"
        SELECT date, position, keyword
        FROM position_history
        WHERE product_id = $1 AND date >= $2
        ORDER BY date ASC
        "#,
    )
    .bind(product_id)
    .bind(since)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows)
}

/// Competitors of a product, best-ranked first.
pub async fn competitors(conn: &mut PgConnection, product_id: i32) -> Result<Vec<Competitor>> {
    let rows = sqlx::query_as::<_, Competitor>(
        r#"
        SELECT *
        FROM competitors
        WHERE product_id = $1
        ORDER BY position ASC NULLS LAST
        "#,
    )
    .bind(product_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows)
}

pub async fn product_keywords(conn: &mut PgConnection, product_id: i32) -> Result<Vec<Keyword>> {
    let rows = sqlx::query_as::<_, Keyword>(
        r#"
        SELECT *
        FROM keywords
        WHERE product_id = $1
        ORDER BY impressions DESC
        "#,
    )
    .bind(product_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows)
}

/// Highest-impression keywords across a user's products.
pub async fn top_keywords(conn: &mut PgConnection, user_id: i32) -> Result<Vec<Keyword>> {
    let rows = sqlx::query_as::<_, Keyword>(
        r#"
        SELECT k.*
        FROM keywords k
        JOIN products p ON p.id = k.product_id
        WHERE p.user_id = $1
        ORDER BY k.impressions DESC
        LIMIT $2
        "#,
    )
    .bind(user_id)
    .bind(TOP_KEYWORDS_LIMIT)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows)
}

pub async fn reviews(conn: &mut PgConnection, product_id: i32) -> Result<Vec<Review>> {
    let rows = sqlx::query_as::<_, Review>(
        r#"
        SELECT *
        FROM reviews
        WHERE product_id = $1
        ORDER BY date DESC
        LIMIT $2
        "#,
    )
    .bind(product_id)
    .bind(REVIEWS_LIMIT)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows)
}

pub async fn latest_ctr_metric(
    conn: &mut PgConnection,
    product_id: i32,
) -> Result<Option<CtrMetric>> {
    let row = sqlx::query_as::<_, CtrMetric>(
        r#"
        SELECT id, product_id, date, impressions, clicks, conversions,
               COALESCE(
                   ctr,
                   CASE WHEN impressions > 0
                        THEN ROUND(clicks::numeric / impressions * 100, 2)::float8
                        ELSE 0 END
               )::float8 AS ctr,
               created_at
        FROM ctr_metrics
        WHERE product_id = $1
        ORDER BY date DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row)
}

/// Sums over every metric row of a user's products. CTR is rounded in
/// `numeric` and is 0 when there were no impressions.
pub async fn ctr_totals(conn: &mut PgConnection, user_id: i32) -> Result<CtrSummary> {
    let totals = sqlx::query_as::<_, CtrSummary>(
        r#"
        SELECT COALESCE(SUM(cm.impressions), 0)::bigint AS total_impressions,
               COALESCE(SUM(cm.clicks), 0)::bigint AS total_clicks,
               COALESCE(SUM(cm.conversions), 0)::bigint AS total_conversions,
               CASE WHEN SUM(cm.impressions) > 0
                    THEN ROUND(SUM(cm.clicks)::numeric / SUM(cm.impressions) * 100, 2)::float8
                    ELSE 0::float8 END AS ctr
        FROM ctr_metrics cm
        JOIN products p ON p.id = cm.product_id
        WHERE p.user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(totals)
}

pub async fn notifications(conn: &mut PgConnection, user_id: i32) -> Result<Vec<Notification>> {
    let rows = sqlx::query_as::<_, Notification>(
        r#"
        SELECT id, user_id, type, title, message, is_read, created_at
        FROM notifications
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT $2
        "#,
    )
    .bind(user_id)
    .bind(NOTIFICATIONS_LIMIT)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows)
}
