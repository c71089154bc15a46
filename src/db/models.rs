//! Row types for the tables in `migrations/`.
//! Used by sqlx for typed queries and serialized as-is into response bodies.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: i32,
    pub user_id: i32,
    pub platform: String,
    pub external_id: String,
    pub name: String,
    pub price: Option<f64>,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product plus its latest known position and CTR (0 when no history exists).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub product: Product,
    pub current_position: i32,
    pub ctr: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Stats {
    pub total_revenue: f64,
    pub total_sales: i64,
    pub avg_position: f64,
    pub avg_ctr: f64,
}

/// One day of sales, either for a single product or summed over a user's products.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SalesPoint {
    pub date: NaiveDate,
    pub sales_count: i64,
    pub revenue: f64,
    pub orders_count: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PositionPoint {
    pub date: NaiveDate,
    pub position: i32,
    pub keyword: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PositionRecord {
    pub id: i32,
    pub product_id: i32,
    pub position: i32,
    pub keyword: String,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SalesRecord {
    pub id: i32,
    pub product_id: i32,
    pub date: NaiveDate,
    pub sales_count: i32,
    pub revenue: f64,
    pub orders_count: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Competitor {
    pub id: i32,
    pub product_id: i32,
    pub name: String,
    pub platform: String,
    pub external_id: String,
    pub price: Option<f64>,
    pub position: Option<i32>,
    pub rating: Option<f64>,
    pub reviews_count: i32,
    pub sales_estimate: i32,
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Keyword {
    pub id: i32,
    pub product_id: i32,
    pub keyword: String,
    pub impressions: i32,
    pub clicks: i32,
    pub ctr: Option<f64>,
    pub position: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Review {
    pub id: i32,
    pub product_id: i32,
    pub platform: String,
    pub external_id: Option<String>,
    pub rating: i32,
    pub text: Option<String>,
    pub author: Option<String>,
    pub date: NaiveDate,
    pub sentiment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Latest metric row of a product. `ctr` is the stored value or, when the
/// loader left it NULL, clicks/impressions as a percentage.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CtrMetric {
    pub id: i32,
    pub product_id: i32,
    pub date: NaiveDate,
    pub impressions: i32,
    pub clicks: i32,
    pub conversions: i32,
    pub ctr: f64,
    pub created_at: DateTime<Utc>,
}

/// User-wide metric sums. `ctr` is rounded in SQL `numeric`, like every other
/// CTR the service reports.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct CtrSummary {
    pub total_impressions: i64,
    pub total_clicks: i64,
    pub total_conversions: i64,
    pub ctr: f64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Notification {
    pub id: i32,
    pub user_id: i32,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_kind_serializes_as_type() {
        let n = Notification {
            id: 1,
            user_id: 1,
            kind: "position_drop".to_string(),
            title: "Position dropped".to_string(),
            message: None,
            is_read: false,
            created_at: Utc::now(),
        };
        let v = serde_json::to_value(&n).unwrap();
        assert_eq!(v["type"], "position_drop");
        assert!(v.get("kind").is_none());
    }
}
