//! Response bodies, one variant per endpoint shape.

use serde::Serialize;

use crate::api::action::Rejection;
use crate::db::models::{
    Competitor, CtrMetric, CtrSummary, Keyword, Notification, PositionPoint, PositionRecord,
    Product, ProductSummary, Review, SalesPoint, SalesRecord, Stats,
};

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Products { products: Vec<ProductSummary> },
    Stats(Stats),
    SalesHistory { history: Vec<SalesPoint> },
    PositionHistory { history: Vec<PositionPoint> },
    Competitors { competitors: Vec<Competitor> },
    Keywords { keywords: Vec<Keyword> },
    Reviews { reviews: Vec<Review> },
    CtrMetric(CtrMetric),
    CtrSummary(CtrSummary),
    Notifications { notifications: Vec<Notification> },
    Product { product: Product },
    Position { record: PositionRecord },
    Sales { record: SalesRecord },
    Competitor { competitor: Competitor },
    Review { review: Review },
    /// `{}`: a per-product lookup that found nothing.
    Empty {},
    Rejected { error: &'static str },
}

impl Reply {
    pub fn rejected(r: Rejection) -> Self {
        Reply::Rejected { error: r.message() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_replies_use_their_dominant_key() {
        let v = serde_json::to_value(Reply::Products { products: vec![] }).unwrap();
        assert_eq!(v, json!({ "products": [] }));

        let v = serde_json::to_value(Reply::PositionHistory { history: vec![] }).unwrap();
        assert_eq!(v, json!({ "history": [] }));
    }

    #[test]
    fn rejection_is_an_error_field() {
        let v = serde_json::to_value(Reply::rejected(Rejection::ProductIdRequired)).unwrap();
        assert_eq!(v, json!({ "error": "product_id required" }));
    }

    #[test]
    fn empty_is_an_empty_object() {
        assert_eq!(serde_json::to_value(Reply::Empty {}).unwrap(), json!({}));
    }

    #[test]
    fn aggregates_are_flat() {
        let v = serde_json::to_value(Reply::Stats(Stats {
            total_revenue: 10.5,
            total_sales: 3,
            avg_position: 0.0,
            avg_ctr: 0.0,
        }))
        .unwrap();
        assert_eq!(v["total_sales"], 3);
        assert_eq!(v["total_revenue"], 10.5);

        let v = serde_json::to_value(Reply::CtrSummary(CtrSummary {
            total_impressions: 0,
            total_clicks: 0,
            total_conversions: 0,
            ctr: 0.0,
        }))
        .unwrap();
        assert_eq!(v["ctr"], 0.0);
    }
}
