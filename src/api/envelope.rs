//! Gateway request/response envelope.
//!
//! The dashboard talks to the service through a function-style gateway: the
//! request arrives as `{httpMethod, queryStringParameters, headers, body}` and
//! leaves as `{statusCode, headers, body, isBase64Encoded}`. The axum adapter in
//! [`super::routes`] builds the same envelope from a plain HTTP request.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Caller-supplied user identifier, advertised by the CORS preflight.
pub const USER_ID_HEADER: &str = "X-User-Id";

pub const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type, X-User-Id";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRequest {
    #[serde(default)]
    pub http_method: Option<String>,
    #[serde(default)]
    pub query_string_parameters: Option<HashMap<String, String>>,
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
    /// JSON text; only read for POST.
    #[serde(default)]
    pub body: Option<String>,
}

impl ApiRequest {
    pub fn new(method: &str) -> Self {
        Self {
            http_method: Some(method.to_string()),
            ..Self::default()
        }
    }

    pub fn with_param(mut self, name: &str, value: &str) -> Self {
        self.query_string_parameters
            .get_or_insert_with(HashMap::new)
            .insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .get_or_insert_with(HashMap::new)
            .insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Upper-cased method, GET when the gateway sent none.
    pub fn method(&self) -> String {
        self.http_method
            .as_deref()
            .map(|m| m.trim().to_ascii_uppercase())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "GET".to_string())
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.query_string_parameters
            .as_ref()
            .and_then(|p| p.get(name))
            .map(String::as_str)
    }

    /// Header lookup, case-insensitive on the name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.as_ref().and_then(|h| {
            h.iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub is_base64_encoded: bool,
}

impl ApiResponse {
    /// Answer to a CORS preflight. Never touches the store.
    pub fn preflight() -> Self {
        let headers = BTreeMap::from([
            ("Access-Control-Allow-Origin".to_string(), "*".to_string()),
            ("Access-Control-Allow-Methods".to_string(), ALLOW_METHODS.to_string()),
            ("Access-Control-Allow-Headers".to_string(), ALLOW_HEADERS.to_string()),
        ]);
        Self {
            status_code: 200,
            headers,
            body: String::new(),
            is_base64_encoded: false,
        }
    }

    pub fn json<T: Serialize>(status_code: u16, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self::with_json_body(status_code, body),
            Err(e) => Self::error(500, &e.to_string()),
        }
    }

    pub fn error(status_code: u16, message: &str) -> Self {
        let body = serde_json::json!({ "error": message }).to_string();
        Self::with_json_body(status_code, body)
    }

    fn with_json_body(status_code: u16, body: String) -> Self {
        let headers = BTreeMap::from([
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Access-Control-Allow-Origin".to_string(), "*".to_string()),
        ]);
        Self {
            status_code,
            headers,
            body,
            is_base64_encoded: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_event_deserializes_with_null_parameters() {
        let raw = r#"{"httpMethod":"get","queryStringParameters":null,"body":null}"#;
        let req: ApiRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(req.method(), "GET");
        assert!(req.param("action").is_none());
        assert!(req.header(USER_ID_HEADER).is_none());
    }

    #[test]
    fn missing_method_defaults_to_get() {
        assert_eq!(ApiRequest::default().method(), "GET");
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req = ApiRequest::new("GET").with_header("x-user-id", "7");
        assert_eq!(req.header(USER_ID_HEADER), Some("7"));
    }

    #[test]
    fn preflight_carries_cors_headers_and_empty_body() {
        let resp = ApiResponse::preflight();
        assert_eq!(resp.status_code, 200);
        assert!(resp.body.is_empty());
        assert_eq!(resp.headers.len(), 3);
        assert_eq!(resp.headers["Access-Control-Allow-Origin"], "*");
        assert_eq!(resp.headers["Access-Control-Allow-Methods"], ALLOW_METHODS);
        assert_eq!(resp.headers["Access-Control-Allow-Headers"], ALLOW_HEADERS);
    }

    #[test]
    fn error_response_serializes_in_gateway_shape() {
        let resp = ApiResponse::error(500, "boom");
        let v = serde_json::to_value(&resp).unwrap();
        assert_eq!(v["statusCode"], 500);
        assert_eq!(v["isBase64Encoded"], false);
        assert_eq!(v["headers"]["Access-Control-Allow-Origin"], "*");
        assert_eq!(v["body"], r#"{"error":"boom"}"#);
    }
}
