//! Query-string parameters of the read endpoints.
//!
//! Values are kept raw and parsed on access, so an endpoint only fails on the
//! parameters it actually uses.

use chrono::{Duration, NaiveDate};

use crate::api::envelope::{ApiRequest, USER_ID_HEADER};
use crate::config::{DEFAULT_DAYS, DEFAULT_USER_ID};
use crate::error::{AppError, Result};
use crate::types::today;

#[derive(Debug, Clone, Default)]
pub struct ReadParams {
    user_id: Option<String>,
    product_id: Option<String>,
    platform: Option<String>,
    days: Option<String>,
}

impl ReadParams {
    pub fn from_request(req: &ApiRequest) -> Self {
        let get = |name: &str| non_empty(req.param(name));
        Self {
            user_id: get("user_id").or_else(|| non_empty(req.header(USER_ID_HEADER))),
            product_id: get("product_id"),
            platform: get("platform"),
            days: get("days"),
        }
    }

    pub fn user_id(&self) -> Result<i32> {
        Ok(parse_int("user_id", self.user_id.as_deref())?.unwrap_or(DEFAULT_USER_ID))
    }

    pub fn product_id(&self) -> Result<Option<i32>> {
        parse_int("product_id", self.product_id.as_deref())
    }

    /// Platform filter; `all` means no filter.
    pub fn platform(&self) -> Option<&str> {
        self.platform.as_deref().filter(|p| *p != "all")
    }

    pub fn days(&self) -> Result<i64> {
        Ok(parse_int("days", self.days.as_deref())?.unwrap_or(DEFAULT_DAYS))
    }

    /// Lower date bound of history windows: today minus `days`.
    pub fn since(&self) -> Result<NaiveDate> {
        let days = self.days()?;
        cutoff(today(), days).ok_or_else(|| AppError::InvalidParameter {
            name: "days",
            value: days.to_string(),
        })
    }
}

/// User id from the `X-User-Id` header, if the caller sent one.
pub fn header_user_id(req: &ApiRequest) -> Result<Option<i32>> {
    parse_int("user_id", non_empty(req.header(USER_ID_HEADER)).as_deref())
}

pub fn cutoff(today: NaiveDate, days: i64) -> Option<NaiveDate> {
    today.checked_sub_signed(Duration::try_days(days)?)
}

fn non_empty(v: Option<&str>) -> Option<String> {
    v.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

fn parse_int<T: std::str::FromStr>(name: &'static str, raw: Option<&str>) -> Result<Option<T>> {
    raw.map(|s| {
        s.parse::<T>().map_err(|_| AppError::InvalidParameter {
            name,
            value: s.to_string(),
        })
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> ReadParams {
        let req = pairs
            .iter()
            .fold(ApiRequest::new("GET"), |r, (k, v)| r.with_param(k, v));
        ReadParams::from_request(&req)
    }

    #[test]
    fn defaults_apply_when_absent() {
        let p = params(&[]);
        assert_eq!(p.user_id().unwrap(), DEFAULT_USER_ID);
        assert_eq!(p.product_id().unwrap(), None);
        assert_eq!(p.days().unwrap(), DEFAULT_DAYS);
        assert_eq!(p.platform(), None);
    }

    #[test]
    fn empty_values_count_as_absent() {
        let p = params(&[("product_id", ""), ("platform", " "), ("user_id", "")]);
        assert_eq!(p.product_id().unwrap(), None);
        assert_eq!(p.platform(), None);
        assert_eq!(p.user_id().unwrap(), DEFAULT_USER_ID);
    }

    #[test]
    fn platform_all_is_unfiltered() {
        assert_eq!(params(&[("platform", "all")]).platform(), None);
        assert_eq!(params(&[("platform", "ozon")]).platform(), Some("ozon"));
    }

    #[test]
    fn header_user_id_is_a_fallback() {
        let req = ApiRequest::new("GET").with_header("X-User-Id", "42");
        assert_eq!(ReadParams::from_request(&req).user_id().unwrap(), 42);

        let req = req.with_param("user_id", "7");
        assert_eq!(ReadParams::from_request(&req).user_id().unwrap(), 7);
    }

    #[test]
    fn non_numeric_values_are_errors() {
        let p = params(&[("days", "week"), ("product_id", "x")]);
        assert!(matches!(p.days(), Err(AppError::InvalidParameter { name: "days", .. })));
        assert!(matches!(
            p.product_id(),
            Err(AppError::InvalidParameter { name: "product_id", .. })
        ));
        // Unused parameters do not fail the endpoints that ignore them.
        assert_eq!(p.user_id().unwrap(), DEFAULT_USER_ID);
    }

    #[test]
    fn cutoff_subtracts_days() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(cutoff(today, 30), NaiveDate::from_ymd_opt(2024, 1, 31));
        assert_eq!(cutoff(today, 0), Some(today));
        assert_eq!(cutoff(today, i64::MAX), None);
    }
}
