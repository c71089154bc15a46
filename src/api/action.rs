//! Closed set of request kinds the dispatcher understands.

use serde_json::{Map, Value};

use crate::api::envelope::ApiRequest;
use crate::api::params::{header_user_id, ReadParams};
use crate::config::DEFAULT_USER_ID;
use crate::error::{AppError, Result};
use crate::types::{NewCompetitor, NewPosition, NewProduct, NewReview, NewSales};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadAction {
    Products,
    Stats,
    SalesHistory,
    PositionHistory,
    Competitors,
    Keywords,
    Reviews,
    CtrMetrics,
    Notifications,
}

impl ReadAction {
    pub const ALL: [ReadAction; 9] = [
        ReadAction::Products,
        ReadAction::Stats,
        ReadAction::SalesHistory,
        ReadAction::PositionHistory,
        ReadAction::Competitors,
        ReadAction::Keywords,
        ReadAction::Reviews,
        ReadAction::CtrMetrics,
        ReadAction::Notifications,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == s)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReadAction::Products => "products",
            ReadAction::Stats => "stats",
            ReadAction::SalesHistory => "sales-history",
            ReadAction::PositionHistory => "position-history",
            ReadAction::Competitors => "competitors",
            ReadAction::Keywords => "keywords",
            ReadAction::Reviews => "reviews",
            ReadAction::CtrMetrics => "ctr-metrics",
            ReadAction::Notifications => "notifications",
        }
    }
}

impl std::fmt::Display for ReadAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteAction {
    AddProduct,
    AddPosition,
    AddSales,
    AddCompetitor,
    AddReview,
}

impl WriteAction {
    pub const ALL: [WriteAction; 5] = [
        WriteAction::AddProduct,
        WriteAction::AddPosition,
        WriteAction::AddSales,
        WriteAction::AddCompetitor,
        WriteAction::AddReview,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == s)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WriteAction::AddProduct => "add-product",
            WriteAction::AddPosition => "add-position",
            WriteAction::AddSales => "add-sales",
            WriteAction::AddCompetitor => "add-competitor",
            WriteAction::AddReview => "add-review",
        }
    }
}

impl std::fmt::Display for WriteAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully parsed write: one row for one table.
#[derive(Debug, Clone)]
pub enum WriteRequest {
    Product { product: NewProduct, user_id: i32 },
    Position(NewPosition),
    Sales(NewSales),
    Competitor(NewCompetitor),
    Review(NewReview),
}

impl WriteRequest {
    pub fn action(&self) -> WriteAction {
        match self {
            WriteRequest::Product { .. } => WriteAction::AddProduct,
            WriteRequest::Position(_) => WriteAction::AddPosition,
            WriteRequest::Sales(_) => WriteAction::AddSales,
            WriteRequest::Competitor(_) => WriteAction::AddCompetitor,
            WriteRequest::Review(_) => WriteAction::AddReview,
        }
    }

    fn from_body(action: WriteAction, body: Map<String, Value>, req: &ApiRequest) -> Result<Self> {
        let body = Value::Object(body);
        Ok(match action {
            WriteAction::AddProduct => {
                let product: NewProduct = serde_json::from_value(body)?;
                let user_id = match product.user_id {
                    Some(id) => id,
                    None => header_user_id(req)?.unwrap_or(DEFAULT_USER_ID),
                };
                WriteRequest::Product { product, user_id }
            }
            WriteAction::AddPosition => WriteRequest::Position(serde_json::from_value(body)?),
            WriteAction::AddSales => WriteRequest::Sales(serde_json::from_value(body)?),
            WriteAction::AddCompetitor => WriteRequest::Competitor(serde_json::from_value(body)?),
            WriteAction::AddReview => WriteRequest::Review(serde_json::from_value(body)?),
        })
    }
}

/// Client-shape problems. Answered with 200 and an `error` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    UnknownAction,
    MethodNotAllowed,
    ProductIdRequired,
}

impl Rejection {
    pub fn message(self) -> &'static str {
        match self {
            Rejection::UnknownAction => "Unknown action",
            Rejection::MethodNotAllowed => "Method not allowed",
            Rejection::ProductIdRequired => "product_id required",
        }
    }
}

/// A read with its per-product id already resolved. Endpoints that have a
/// user-wide fallback keep the optional id in [`ReadParams`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadQuery {
    Products,
    Stats,
    SalesHistory,
    PositionHistory { product_id: i32 },
    Competitors { product_id: i32 },
    Keywords,
    Reviews { product_id: i32 },
    CtrMetrics,
    Notifications,
}

impl ReadQuery {
    /// `None` when the action needs a product id and the request has none.
    fn resolve(action: ReadAction, params: &ReadParams) -> Result<Option<Self>> {
        let query = match action {
            ReadAction::Products => ReadQuery::Products,
            ReadAction::Stats => ReadQuery::Stats,
            ReadAction::SalesHistory => ReadQuery::SalesHistory,
            ReadAction::Keywords => ReadQuery::Keywords,
            ReadAction::CtrMetrics => ReadQuery::CtrMetrics,
            ReadAction::Notifications => ReadQuery::Notifications,
            ReadAction::PositionHistory | ReadAction::Competitors | ReadAction::Reviews => {
                let Some(product_id) = params.product_id()? else {
                    return Ok(None);
                };
                match action {
                    ReadAction::PositionHistory => ReadQuery::PositionHistory { product_id },
                    ReadAction::Competitors => ReadQuery::Competitors { product_id },
                    _ => ReadQuery::Reviews { product_id },
                }
            }
        };
        Ok(Some(query))
    }

    pub fn action(self) -> ReadAction {
        match self {
            ReadQuery::Products => ReadAction::Products,
            ReadQuery::Stats => ReadAction::Stats,
            ReadQuery::SalesHistory => ReadAction::SalesHistory,
            ReadQuery::PositionHistory { .. } => ReadAction::PositionHistory,
            ReadQuery::Competitors { .. } => ReadAction::Competitors,
            ReadQuery::Keywords => ReadAction::Keywords,
            ReadQuery::Reviews { .. } => ReadAction::Reviews,
            ReadQuery::CtrMetrics => ReadAction::CtrMetrics,
            ReadQuery::Notifications => ReadAction::Notifications,
        }
    }
}

/// Work that needs the store.
#[derive(Debug, Clone)]
pub enum Call {
    Read(ReadQuery, ReadParams),
    Write(WriteRequest),
}

impl Call {
    pub fn label(&self) -> &'static str {
        match self {
            Call::Read(query, _) => query.action().as_str(),
            Call::Write(w) => w.action().as_str(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Request {
    Preflight,
    Rejected(Rejection),
    Call(Call),
}

impl Request {
    /// Maps method + action to a request kind. Malformed bodies and
    /// non-numeric identifiers are errors; unknown actions are rejections.
    pub fn resolve(req: &ApiRequest) -> Result<Self> {
        match req.method().as_str() {
            "OPTIONS" => Ok(Request::Preflight),
            "GET" => {
                let name = req.param("action").unwrap_or(ReadAction::Products.as_str());
                let Some(action) = ReadAction::parse(name) else {
                    return Ok(Request::Rejected(Rejection::UnknownAction));
                };
                let params = ReadParams::from_request(req);
                match ReadQuery::resolve(action, &params)? {
                    Some(query) => Ok(Request::Call(Call::Read(query, params))),
                    None => Ok(Request::Rejected(Rejection::ProductIdRequired)),
                }
            }
            "POST" => {
                let body = parse_body(req.body.as_deref())?;
                let name = body
                    .get("action")
                    .and_then(Value::as_str)
                    .or_else(|| req.param("action"))
                    .unwrap_or(WriteAction::AddProduct.as_str())
                    .to_string();
                let Some(action) = WriteAction::parse(&name) else {
                    return Ok(Request::Rejected(Rejection::UnknownAction));
                };
                Ok(Request::Call(Call::Write(WriteRequest::from_body(action, body, req)?)))
            }
            _ => Ok(Request::Rejected(Rejection::MethodNotAllowed)),
        }
    }
}

fn parse_body(raw: Option<&str>) -> Result<Map<String, Value>> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty()).unwrap_or("{}");
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => Ok(map),
        other => Err(AppError::InvalidParameter {
            name: "body",
            value: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(req: ApiRequest) -> Request {
        Request::resolve(&req).unwrap()
    }

    #[test]
    fn action_names_round_trip() {
        for a in ReadAction::ALL {
            assert_eq!(ReadAction::parse(a.as_str()), Some(a));
        }
        for a in WriteAction::ALL {
            assert_eq!(WriteAction::parse(a.as_str()), Some(a));
        }
        assert_eq!(ReadAction::parse("add-product"), None);
        assert_eq!(WriteAction::parse("products"), None);
    }

    #[test]
    fn get_without_action_lists_products() {
        match resolve(ApiRequest::new("GET")) {
            Request::Call(Call::Read(ReadQuery::Products, _)) => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_get_action_is_rejected() {
        match resolve(ApiRequest::new("GET").with_param("action", "bogus")) {
            Request::Rejected(Rejection::UnknownAction) => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn per_product_reads_need_product_id() {
        for action in ["position-history", "competitors", "reviews"] {
            match resolve(ApiRequest::new("GET").with_param("action", action)) {
                Request::Rejected(Rejection::ProductIdRequired) => {}
                other => panic!("{action}: unexpected {other:?}"),
            }
        }
        match resolve(ApiRequest::new("GET").with_param("action", "keywords")) {
            Request::Call(Call::Read(ReadQuery::Keywords, _)) => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn per_product_reads_carry_the_parsed_id() {
        let req = ApiRequest::new("GET")
            .with_param("action", "reviews")
            .with_param("product_id", "17");
        match resolve(req) {
            Request::Call(Call::Read(query, _)) => {
                assert_eq!(query, ReadQuery::Reviews { product_id: 17 });
                assert_eq!(query.action(), ReadAction::Reviews);
            }
            other => panic!("unexpected {other:?}"),
        }

        let req = ApiRequest::new("GET")
            .with_param("action", "position-history")
            .with_param("product_id", "3")
            .with_param("days", "400");
        assert!(matches!(
            resolve(req),
            Request::Call(Call::Read(ReadQuery::PositionHistory { product_id: 3 }, _))
        ));
    }

    #[test]
    fn product_id_is_only_parsed_where_it_is_required() {
        let req = ApiRequest::new("GET")
            .with_param("action", "notifications")
            .with_param("product_id", "abc");
        assert!(matches!(
            resolve(req),
            Request::Call(Call::Read(ReadQuery::Notifications, _))
        ));

        let req = ApiRequest::new("GET")
            .with_param("action", "competitors")
            .with_param("product_id", "abc");
        assert!(matches!(
            Request::resolve(&req),
            Err(AppError::InvalidParameter { name: "product_id", .. })
        ));
    }

    #[test]
    fn other_methods_are_not_allowed() {
        for m in ["PUT", "DELETE", "PATCH"] {
            match resolve(ApiRequest::new(m)) {
                Request::Rejected(Rejection::MethodNotAllowed) => {}
                other => panic!("{m}: unexpected {other:?}"),
            }
        }
        assert!(matches!(resolve(ApiRequest::new("options")), Request::Preflight));
    }

    #[test]
    fn post_action_comes_from_body_then_query() {
        let body = r#"{"action":"add-sales","product_id":5,"sales_count":3}"#;
        let req = ApiRequest::new("POST")
            .with_param("action", "add-review")
            .with_body(body);
        match resolve(req) {
            Request::Call(Call::Write(WriteRequest::Sales(s))) => assert_eq!(s.sales_count, 3),
            other => panic!("unexpected {other:?}"),
        }

        let req = ApiRequest::new("POST")
            .with_param("action", "add-position")
            .with_body(r#"{"product_id":5,"position":2}"#);
        assert!(matches!(
            resolve(req),
            Request::Call(Call::Write(WriteRequest::Position(_)))
        ));
    }

    #[test]
    fn post_defaults_to_add_product_with_header_user() {
        let req = ApiRequest::new("POST")
            .with_header("X-User-Id", "9")
            .with_body(r#"{"platform":"X","external_id":"1","name":"A","price":10}"#);
        match resolve(req) {
            Request::Call(Call::Write(WriteRequest::Product { product, user_id })) => {
                assert_eq!(user_id, 9);
                assert_eq!(product.name, "A");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn body_user_id_wins_over_header() {
        let req = ApiRequest::new("POST")
            .with_header("X-User-Id", "9")
            .with_body(r#"{"user_id":3,"platform":"X","external_id":"1","name":"A"}"#);
        match resolve(req) {
            Request::Call(Call::Write(WriteRequest::Product { user_id, .. })) => assert_eq!(user_id, 3),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_post_action_is_rejected() {
        let req = ApiRequest::new("POST").with_body(r#"{"action":"drop-table"}"#);
        assert!(matches!(resolve(req), Request::Rejected(Rejection::UnknownAction)));
    }

    #[test]
    fn malformed_or_incomplete_bodies_are_errors() {
        let bad_json = ApiRequest::new("POST").with_body("{not json");
        assert!(matches!(Request::resolve(&bad_json), Err(AppError::Json(_))));

        let not_object = ApiRequest::new("POST").with_body("[1,2]");
        assert!(matches!(
            Request::resolve(&not_object),
            Err(AppError::InvalidParameter { name: "body", .. })
        ));

        let missing_field = ApiRequest::new("POST").with_body(r#"{"action":"add-position"}"#);
        assert!(matches!(Request::resolve(&missing_field), Err(AppError::Json(_))));

        // No body at all is an add-product without its required fields.
        assert!(Request::resolve(&ApiRequest::new("POST")).is_err());
    }

    #[test]
    fn call_labels_name_the_action() {
        let req = ApiRequest::new("GET").with_param("action", "ctr-metrics");
        match resolve(req) {
            Request::Call(call) => assert_eq!(call.label(), "ctr-metrics"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
