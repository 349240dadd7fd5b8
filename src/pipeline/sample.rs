use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Smoke status reported by the sensor firmware when no smoke is present.
/// Any other value counts as a smoke condition (exact, case-sensitive match).
pub const SMOKE_STATUS_NORMAL: &str = "NORMAL";

/// One row of the provider's feed payload, exactly as fetched. The envelope
/// fields (`entry_id`, `created_at`) are provider-assigned and strictly typed;
/// the `fieldN` values are written by the sensor firmware and arrive as
/// strings, numbers, or null depending on the deployment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedEntry {
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub entry_id: Option<u64>,
    #[serde(default)]
    pub field1: Option<JsonValue>,
    #[serde(default)]
    pub field2: Option<JsonValue>,
    #[serde(default)]
    pub field3: Option<JsonValue>,
    #[serde(default)]
    pub field4: Option<JsonValue>,
}

/// A validated reading. Field layout of the channel: field1 temperature in
/// degrees C, field2 relative humidity percent, field3 raw smoke level,
/// field4 smoke status text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetrySample {
    pub entry_id: u64,
    pub timestamp: DateTime<Utc>,
    pub temperature_c: f64,
    pub humidity_pct: Option<f64>,
    pub smoke_level: Option<f64>,
    pub smoke_status: String,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SampleError {
    #[error("feed entry has no entry_id")]
    MissingEntryId,
    #[error("entry {0} has no created_at timestamp")]
    MissingTimestamp(u64),
    #[error("entry {entry_id} has unparsable created_at {raw:?}")]
    BadTimestamp { entry_id: u64, raw: String },
    #[error("entry {0} is missing the temperature field")]
    MissingTemperature(u64),
    #[error("entry {entry_id} has non-numeric temperature {raw}")]
    BadTemperature { entry_id: u64, raw: String },
}

/// Checks a raw feed entry and, if it holds a usable reading, turns it into a
/// `TelemetrySample`. Temperature is required and must parse to a finite
/// number; alert comparisons downstream assume it is never NaN. Humidity and
/// smoke level are kept when they parse and dropped to `None` otherwise.
/// A missing smoke status is treated as no classification, i.e. `"NORMAL"`,
/// so a partially populated row cannot raise a phantom smoke alarm.
pub fn validate(entry: &FeedEntry) -> Result<TelemetrySample, SampleError> {
    let entry_id = entry.entry_id.ok_or(SampleError::MissingEntryId)?;

    let raw_timestamp = entry
        .created_at
        .as_deref()
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .ok_or(SampleError::MissingTimestamp(entry_id))?;
    let timestamp = DateTime::parse_from_rfc3339(raw_timestamp)
        .map_err(|_| SampleError::BadTimestamp {
            entry_id,
            raw: raw_timestamp.to_string(),
        })?
        .with_timezone(&Utc);

    let temperature_c = match entry.field1.as_ref().filter(|value| !field_is_blank(value)) {
        None => return Err(SampleError::MissingTemperature(entry_id)),
        Some(value) => finite_f64(value).ok_or_else(|| SampleError::BadTemperature {
            entry_id,
            raw: value.to_string(),
        })?,
    };

    let smoke_status = entry
        .field4
        .as_ref()
        .and_then(JsonValue::as_str)
        .map(str::trim)
        .filter(|status| !status.is_empty())
        .unwrap_or(SMOKE_STATUS_NORMAL)
        .to_string();

    Ok(TelemetrySample {
        entry_id,
        timestamp,
        temperature_c,
        humidity_pct: optional_metric(entry.field2.as_ref()),
        smoke_level: optional_metric(entry.field3.as_ref()),
        smoke_status,
    })
}

fn field_is_blank(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::String(raw) => raw.trim().is_empty(),
        _ => false,
    }
}

fn finite_f64(value: &JsonValue) -> Option<f64> {
    let parsed = match value {
        JsonValue::Number(number) => number.as_f64(),
        JsonValue::String(raw) => raw.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|value| value.is_finite())
}

fn optional_metric(value: Option<&JsonValue>) -> Option<f64> {
    value.filter(|value| !field_is_blank(value)).and_then(finite_f64)
}
