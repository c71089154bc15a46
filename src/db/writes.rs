//! Idempotent upserts. Each one writes a single row keyed by the table's
//! natural unique constraint and commits before returning it.

use sqlx::{Connection, PgConnection};

use crate::db::models::{Competitor, PositionRecord, Product, Review, SalesRecord};
use crate::error::Result;
use crate::types::{today, NewCompetitor, NewPosition, NewProduct, NewReview, NewSales};

/// A repeated (platform, external_id) refreshes name and price only.
pub async fn add_product(conn: &mut PgConnection, p: &NewProduct, user_id: i32) -> Result<Product> {
    let mut tx = conn.begin().await?;
    let row = sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO products (user_id, platform, external_id, name, price, url, image_url, category)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (platform, external_id) DO UPDATE SET
            name = EXCLUDED.name,
            price = EXCLUDED.price,
            updated_at = CURRENT_TIMESTAMP
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(&p.platform)
    .bind(&p.external_id)
    .bind(&p.name)
    .bind(p.price)
    .bind(&p.url)
    .bind(&p.image_url)
    .bind(&p.category)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    Ok(row)
}

pub async fn add_position(conn: &mut PgConnection, p: &NewPosition) -> Result<PositionRecord> {
    let date = p.date.unwrap_or_else(today);

    let mut tx = conn.begin().await?;
    let row = sqlx::query_as::<_, PositionRecord>(
        r#"
        INSERT INTO position_history (product_id, position, keyword, date)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (product_id, keyword, date) DO UPDATE SET
            position = EXCLUDED.position
        RETURNING *
        "#,
    )
    .bind(p.product_id)
    .bind(p.position)
    .bind(&p.keyword)
    .bind(date)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    Ok(row)
}

/// Same-day ingests replace the day's counters, they do not add to them.
pub async fn add_sales(conn: &mut PgConnection, s: &NewSales) -> Result<SalesRecord> {
    let date = s.date.unwrap_or_else(today);

    let mut tx = conn.begin().await?;
    let row = sqlx::query_as::<_, SalesRecord>(
        r#"
        INSERT INTO sales_history (product_id, date, sales_count, revenue, orders_count)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (product_id, date) DO UPDATE SET
            sales_count = EXCLUDED.sales_count,
            revenue = EXCLUDED.revenue,
            orders_count = EXCLUDED.orders_count
        RETURNING *
        "#,
    )
    .bind(s.product_id)
    .bind(date)
    .bind(s.sales_count)
    .bind(s.revenue)
    .bind(s.orders_count)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    Ok(row)
}

pub async fn add_competitor(conn: &mut PgConnection, c: &NewCompetitor) -> Result<Competitor> {
    let mut tx = conn.begin().await?;
    let row = sqlx::query_as::<_, Competitor>(
        r#"
        INSERT INTO competitors (
            product_id, name, platform, external_id, price, position,
            rating, reviews_count, sales_estimate, url
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (product_id, platform, external_id) DO UPDATE SET
            price = EXCLUDED.price,
            position = EXCLUDED.position,
            rating = EXCLUDED.rating,
            reviews_count = EXCLUDED.reviews_count,
            sales_estimate = EXCLUDED.sales_estimate,
            updated_at = CURRENT_TIMESTAMP
        RETURNING *
        "#,
    )
    .bind(c.product_id)
    .bind(&c.name)
    .bind(&c.platform)
    .bind(&c.external_id)
    .bind(c.price)
    .bind(c.position)
    .bind(c.rating)
    .bind(c.reviews_count)
    .bind(c.sales_estimate)
    .bind(&c.url)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    Ok(row)
}

/// Reviews without an external id never conflict and are always inserted.
pub async fn add_review(conn: &mut PgConnection, r: &NewReview) -> Result<Review> {
    let date = r.date.unwrap_or_else(today);

    let mut tx = conn.begin().await?;
    let row = sqlx::query_as::<_, Review>(
        r#"
        INSERT INTO reviews (product_id, platform, external_id, rating, text, author, date, sentiment)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (product_id, platform, external_id) DO UPDATE SET
            rating = EXCLUDED.rating,
            text = EXCLUDED.text,
            sentiment = EXCLUDED.sentiment
        RETURNING *
        "#,
    )
    .bind(r.product_id)
    .bind(&r.platform)
    .bind(&r.external_id)
    .bind(r.rating)
    .bind(&r.text)
    .bind(&r.author)
    .bind(date)
    .bind(&r.sentiment)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    Ok(row)
}
