//! Routes one gateway request to one handler and wraps the outcome.

use std::time::Instant;

use sqlx::PgConnection;
use tracing::{debug, error, info};

use crate::api::action::{Call, ReadQuery, Request, WriteRequest};
use crate::api::envelope::{ApiRequest, ApiResponse};
use crate::api::params::ReadParams;
use crate::api::reply::Reply;
use crate::config::Config;
use crate::db::{reads, writes, Store};
use crate::error::Result;

/// Stateless apart from the connection string; every request opens its own
/// connection.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    database_url: Option<String>,
}

impl Dispatcher {
    pub fn new(cfg: &Config) -> Self {
        Self {
            database_url: cfg.database_url.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.database_url.is_some()
    }

    /// Never fails: store and parse errors become a 500 envelope.
    pub async fn handle(&self, req: &ApiRequest) -> ApiResponse {
        let started = Instant::now();
        let method = req.method();

        let (action, outcome) = match Request::resolve(req) {
            Ok(Request::Preflight) => {
                debug!(method = %method, "CORS preflight");
                return ApiResponse::preflight();
            }
            Ok(Request::Rejected(r)) => ("-", Ok(Reply::rejected(r))),
            Ok(Request::Call(call)) => (call.label(), self.execute(call).await),
            Err(e) => ("-", Err(e)),
        };

        let response = match outcome {
            Ok(reply) => ApiResponse::json(200, &reply),
            Err(e) => {
                error!(method = %method, action, "Request failed: {e}");
                ApiResponse::error(500, &e.to_string())
            }
        };

        info!(
            method = %method,
            action,
            status = response.status_code,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "{method} {action} -> {}",
            response.status_code,
        );
        response
    }

    /// The connection is closed before returning, on success and on failure.
    async fn execute(&self, call: Call) -> Result<Reply> {
        let mut store = Store::connect(self.database_url.as_deref()).await?;
        let outcome = match call {
            Call::Read(query, params) => run_read(store.conn(), query, &params).await,
            Call::Write(write) => run_write(store.conn(), write).await,
        };
        store.close().await;
        outcome
    }
}

async fn run_read(conn: &mut PgConnection, query: ReadQuery, p: &ReadParams) -> Result<Reply> {
    let reply = match query {
        ReadQuery::Products => Reply::Products {
            products: reads::products(conn, p.user_id()?, p.platform()).await?,
        },
        ReadQuery::Stats => Reply::Stats(reads::stats(conn, p.user_id()?, p.since()?).await?),
        ReadQuery::SalesHistory => {
            let since = p.since()?;
            let history = match p.product_id()? {
                Some(id) => reads::product_sales(conn, id, since).await?,
                None => reads::user_sales(conn, p.user_id()?, since).await?,
            };
            Reply::SalesHistory { history }
        }
        ReadQuery::PositionHistory { product_id } => Reply::PositionHistory {
            history: reads::position_history(conn, product_id, p.since()?).await?,
        },
        ReadQuery::Competitors { product_id } => Reply::Competitors {
            competitors: reads::competitors(conn, product_id).await?,
        },
        ReadQuery::Keywords => {
            let keywords = match p.product_id()? {
                Some(id) => reads::product_keywords(conn, id).await?,
                None => reads::top_keywords(conn, p.user_id()?).await?,
            };
            Reply::Keywords { keywords }
        }
        ReadQuery::Reviews { product_id } => Reply::Reviews {
            reviews: reads::reviews(conn, product_id).await?,
        },
        ReadQuery::CtrMetrics => match p.product_id()? {
            Some(id) => match reads::latest_ctr_metric(conn, id).await? {
                Some(metric) => Reply::CtrMetric(metric),
                None => Reply::Empty {},
            },
            None => Reply::CtrSummary(reads::ctr_totals(conn, p.user_id()?).await?),
        },
        ReadQuery::Notifications => Reply::Notifications {
            notifications: reads::notifications(conn, p.user_id()?).await?,
        },
    };
    Ok(reply)
}

async fn run_write(conn: &mut PgConnection, write: WriteRequest) -> Result<Reply> {
    let reply = match write {
        WriteRequest::Product { product, user_id } => Reply::Product {
            product: writes::add_product(conn, &product, user_id).await?,
        },
        WriteRequest::Position(p) => Reply::Position {
            record: writes::add_position(conn, &p).await?,
        },
        WriteRequest::Sales(s) => Reply::Sales {
            record: writes::add_sales(conn, &s).await?,
        },
        WriteRequest::Competitor(c) => Reply::Competitor {
            competitor: writes::add_competitor(conn, &c).await?,
        },
        WriteRequest::Review(r) => Reply::Review {
            review: writes::add_review(conn, &r).await?,
        },
    };
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline() -> Dispatcher {
        Dispatcher::new(&Config::with_database_url(None))
    }

    fn body(resp: &ApiResponse) -> serde_json::Value {
        serde_json::from_str(&resp.body).unwrap()
    }

    #[tokio::test]
    async fn options_short_circuits_without_store() {
        let resp = offline().handle(&ApiRequest::new("OPTIONS")).await;
        assert_eq!(resp, ApiResponse::preflight());
    }

    #[tokio::test]
    async fn rejections_answer_200_without_store() {
        let d = offline();

        let resp = d.handle(&ApiRequest::new("DELETE")).await;
        assert_eq!(resp.status_code, 200);
        assert_eq!(body(&resp)["error"], "Method not allowed");

        let resp = d
            .handle(&ApiRequest::new("GET").with_param("action", "competitors"))
            .await;
        assert_eq!(resp.status_code, 200);
        assert_eq!(body(&resp)["error"], "product_id required");
    }

    #[tokio::test]
    async fn missing_database_url_is_a_500() {
        let resp = offline().handle(&ApiRequest::new("GET")).await;
        assert_eq!(resp.status_code, 500);
        assert_eq!(resp.headers["Access-Control-Allow-Origin"], "*");
        assert_eq!(body(&resp)["error"], "DATABASE_URL is not set");
    }

    #[tokio::test]
    async fn bad_parameters_are_a_500() {
        let req = ApiRequest::new("GET")
            .with_param("action", "reviews")
            .with_param("product_id", "abc");
        let resp = offline().handle(&req).await;
        assert_eq!(resp.status_code, 500);
        assert!(body(&resp)["error"].as_str().unwrap().contains("product_id"));
    }
}
