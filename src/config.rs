use crate::pipeline::{HumidityBounds, Thresholds};
use anyhow::{anyhow, bail, Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone)]
pub struct Config {
    pub channel_id: u64,
    /// Provider API root, no trailing slash.
    pub base_url: String,
    pub read_api_key: Option<String>,

    pub poll_interval_ms: u64,
    pub request_timeout_ms: u64,
    pub window_size: u32,
    pub history_limit: usize,

    pub critical_temperature_c: f64,
    pub humidity_bounds: Option<HumidityBounds>,
    pub smoke_display_max: f64,

    pub http_bind: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let channel_id = env_u64("FIREWATCH_CHANNEL_ID", None)?;
        let base_url = normalize_base_url(&env_string(
            "FIREWATCH_BASE_URL",
            Some("https://api.thingspeak.com".to_string()),
        )?)?;
        let read_api_key = env_optional("FIREWATCH_READ_API_KEY");

        let poll_interval_ms = env_u64("FIREWATCH_POLL_INTERVAL_MS", Some(5000))?;
        if poll_interval_ms == 0 {
            bail!("FIREWATCH_POLL_INTERVAL_MS must be positive");
        }
        let request_timeout_ms = env_u64("FIREWATCH_REQUEST_TIMEOUT_MS", Some(10_000))?;
        if request_timeout_ms == 0 {
            bail!("FIREWATCH_REQUEST_TIMEOUT_MS must be positive");
        }

        let window_size = env_u64("FIREWATCH_WINDOW_SIZE", Some(20))? as u32;
        if window_size == 0 {
            bail!("FIREWATCH_WINDOW_SIZE must be positive");
        }
        let history_limit = env_u64("FIREWATCH_HISTORY_LIMIT", Some(5))? as usize;
        if history_limit == 0 {
            bail!("FIREWATCH_HISTORY_LIMIT must be positive");
        }

        let critical_temperature_c = env_f64("FIREWATCH_CRITICAL_TEMPERATURE_C", Some(40.0))?;
        let humidity_bounds = humidity_bounds_from(
            env_optional("FIREWATCH_HUMIDITY_LOW"),
            env_optional("FIREWATCH_HUMIDITY_HIGH"),
        )?;
        let smoke_display_max = env_f64("FIREWATCH_SMOKE_DISPLAY_MAX", Some(2500.0))?;
        if smoke_display_max <= 0.0 {
            bail!("FIREWATCH_SMOKE_DISPLAY_MAX must be positive");
        }

        let http_bind = env_string("FIREWATCH_HTTP_BIND", Some("127.0.0.1:9480".to_string()))?;

        Ok(Self {
            channel_id,
            base_url,
            read_api_key,
            poll_interval_ms,
            request_timeout_ms,
            window_size,
            history_limit,
            critical_temperature_c,
            humidity_bounds,
            smoke_display_max,
            http_bind,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            critical_temperature_c: self.critical_temperature_c,
            humidity_bounds: self.humidity_bounds,
        }
    }
}

fn normalize_base_url(raw: &str) -> Result<String> {
    let url = Url::parse(raw.trim()).context("invalid FIREWATCH_BASE_URL")?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("FIREWATCH_BASE_URL must be http or https");
    }
    Ok(raw.trim().trim_end_matches('/').to_string())
}

fn humidity_bounds_from(
    low: Option<String>,
    high: Option<String>,
) -> Result<Option<HumidityBounds>> {
    match (low, high) {
        (Some(low), Some(high)) => {
            let low = low
                .trim()
                .parse::<f64>()
                .context("invalid FIREWATCH_HUMIDITY_LOW")?;
            let high = high
                .trim()
                .parse::<f64>()
                .context("invalid FIREWATCH_HUMIDITY_HIGH")?;
            if !low.is_finite() || !high.is_finite() {
                bail!("humidity bounds must be finite");
            }
            if low >= high {
                bail!("FIREWATCH_HUMIDITY_LOW must be below FIREWATCH_HUMIDITY_HIGH");
            }
            Ok(Some(HumidityBounds { low, high }))
        }
        (None, None) => Ok(None),
        _ => bail!("FIREWATCH_HUMIDITY_LOW and FIREWATCH_HUMIDITY_HIGH must be set together"),
    }
}

fn env_string(key: &str, default: Option<String>) -> Result<String> {
    match env::var(key) {
        Ok(value) => Ok(value.trim().to_string()),
        Err(_) => default.ok_or_else(|| anyhow!("missing env var {key}")),
    }
}

fn env_u64(key: &str, default: Option<u64>) -> Result<u64> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<u64>()
            .with_context(|| format!("invalid {key}")),
        Err(_) => default.ok_or_else(|| anyhow!("missing env var {key}")),
    }
}

fn env_f64(key: &str, default: Option<f64>) -> Result<f64> {
    match env::var(key) {
        Ok(value) => {
            let parsed = value
                .trim()
                .parse::<f64>()
                .with_context(|| format!("invalid {key}"))?;
            if !parsed.is_finite() {
                bail!("{key} must be finite");
            }
            Ok(parsed)
        }
        Err(_) => default.ok_or_else(|| anyhow!("missing env var {key}")),
    }
}

fn env_optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_validated_and_stripped_of_trailing_slash() {
        assert_eq!(
            normalize_base_url("https://api.thingspeak.com/").unwrap(),
            "https://api.thingspeak.com"
        );
        assert_eq!(
            normalize_base_url("http://127.0.0.1:9999").unwrap(),
            "http://127.0.0.1:9999"
        );
        assert!(normalize_base_url("not a url").is_err());
        assert!(normalize_base_url("ftp://example.com").is_err());
    }

    #[test]
    fn humidity_bounds_require_both_ends_in_order() {
        let bounds = humidity_bounds_from(Some("30".into()), Some("70".into()))
            .unwrap()
            .unwrap();
        assert_eq!((bounds.low, bounds.high), (30.0, 70.0));

        assert!(humidity_bounds_from(None, None).unwrap().is_none());
        assert!(humidity_bounds_from(Some("30".into()), None).is_err());
        assert!(humidity_bounds_from(Some("70".into()), Some("30".into())).is_err());
        assert!(humidity_bounds_from(Some("50".into()), Some("50".into())).is_err());
        assert!(humidity_bounds_from(Some("NaN".into()), Some("70".into())).is_err());
    }
}
