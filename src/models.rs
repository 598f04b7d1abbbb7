// Wire models for the Healthtrack API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A single health measurement record
#[derive(Debug, Clone, Deserialize)]
pub struct Measurement {
    pub id: i64,
    pub measured_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "deserialize_decimal")]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub systolic: Option<i32>,
    #[serde(default)]
    pub diastolic: Option<i32>,
    #[serde(default, deserialize_with = "deserialize_decimal")]
    pub blood_glucose: Option<f64>,
    #[serde(default)]
    pub heart_rate: Option<i32>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Body for creating a measurement
#[derive(Debug, Clone, Serialize)]
pub struct NewMeasurement {
    pub measured_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub systolic: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diastolic: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_glucose: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// List endpoints answer with either a bare array or a pagination envelope
/// depending on how the backend view is configured; both shapes normalize to
/// a plain vector.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Plain(Vec<T>),
    Paginated {
        #[serde(default)]
        count: Option<u64>,
        #[serde(default)]
        next: Option<String>,
        #[serde(default)]
        previous: Option<String>,
        results: Vec<T>,
    },
}

impl<T> ListResponse<T> {
    /// Collapse either shape into the item list
    pub fn into_vec(self) -> Vec<T> {
        match self {
            ListResponse::Plain(items) => items,
            ListResponse::Paginated { results, .. } => results,
        }
    }
}

/// Decimal fields arrive as JSON numbers or as strings depending on the
/// backend's serializer settings; accept both.
fn deserialize_decimal<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Num(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}
