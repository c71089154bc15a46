use chrono::{Local, NaiveDate};
use serde::{Deserialize, Deserializer};

// ---------------------------------------------------------------------------
// Write payloads
// ---------------------------------------------------------------------------
//
// Required fields are plain values: a body without them fails to deserialize
// and the request answers 500. Optional fields default the way the dashboard
// expects (date = today, counters = 0).

#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    #[serde(default, deserialize_with = "lenient_opt_i32")]
    pub user_id: Option<i32>,
    pub platform: String,
    #[serde(deserialize_with = "lenient_string")]
    pub external_id: String,
    pub name: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPosition {
    #[serde(deserialize_with = "lenient_i32")]
    pub product_id: i32,
    pub position: i32,
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSales {
    #[serde(deserialize_with = "lenient_i32")]
    pub product_id: i32,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub sales_count: i32,
    #[serde(default)]
    pub revenue: f64,
    #[serde(default)]
    pub orders_count: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCompetitor {
    #[serde(deserialize_with = "lenient_i32")]
    pub product_id: i32,
    pub name: String,
    pub platform: String,
    #[serde(deserialize_with = "lenient_string")]
    pub external_id: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub reviews_count: i32,
    #[serde(default)]
    pub sales_estimate: i32,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewReview {
    #[serde(deserialize_with = "lenient_i32")]
    pub product_id: i32,
    pub platform: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub external_id: Option<String>,
    pub rating: i32,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub sentiment: Option<String>,
}

/// Server-local calendar date, used for default record dates and history cutoffs.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

// ---------------------------------------------------------------------------
// Lenient scalars
// ---------------------------------------------------------------------------
//
// Marketplace ids arrive as JSON numbers or strings depending on the scraper.

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Text(s) => s,
        }
    }

    fn into_i32<E: serde::de::Error>(self) -> Result<i32, E> {
        match self {
            Scalar::Int(i) => i32::try_from(i).map_err(|_| E::custom(format!("id out of range: {i}"))),
            Scalar::Float(f) => Err(E::custom(format!("expected an integer id, got {f}"))),
            Scalar::Text(s) => s
                .trim()
                .parse::<i32>()
                .map_err(|_| E::custom(format!("expected an integer id, got {s:?}"))),
        }
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Scalar::deserialize(d).map(Scalar::into_text)
}

fn lenient_opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Scalar>::deserialize(d)?.map(Scalar::into_text))
}

fn lenient_i32<'de, D: Deserializer<'de>>(d: D) -> Result<i32, D::Error> {
    Scalar::deserialize(d)?.into_i32()
}

fn lenient_opt_i32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i32>, D::Error> {
    Option::<Scalar>::deserialize(d)?.map(Scalar::into_i32).transpose()
}
