use super::sample::{TelemetrySample, SMOKE_STATUS_NORMAL};
use serde::Serialize;

/// Alarm thresholds, fixed for the lifetime of the process.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub critical_temperature_c: f64,
    pub humidity_bounds: Option<HumidityBounds>,
}

/// Acceptable relative-humidity band. Readings strictly below `low` or
/// strictly above `high` raise the informational humidity flag.
#[derive(Debug, Clone, Copy)]
pub struct HumidityBounds {
    pub low: f64,
    pub high: f64,
}

/// Why the alarm is (or is not) active. Smoke outranks temperature when both
/// fire, which is why the combined case carries its own label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertCause {
    SmokeAndTemperature,
    Smoke,
    Temperature,
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AlertVerdict {
    pub temperature_alert: bool,
    pub smoke_alert: bool,
    pub humidity_alert: bool,
    pub cause: AlertCause,
}

impl AlertVerdict {
    /// Whether the audible alarm should be sounding. Humidity is
    /// informational only and never drives the alarm.
    pub fn alarm_active(&self) -> bool {
        self.cause != AlertCause::Normal
    }
}

/// Classifies one sample against the thresholds. Pure, so it can run on
/// every poll cycle and on every history row without side effects.
///
/// Comparisons are strict: a temperature exactly at the critical threshold
/// or a humidity exactly on a bound is not an alert. The smoke check is an
/// exact, case-sensitive comparison against `"NORMAL"`; any other status
/// string the firmware emits counts as smoke.
pub fn classify(sample: &TelemetrySample, thresholds: &Thresholds) -> AlertVerdict {
    let temperature_alert = sample.temperature_c > thresholds.critical_temperature_c;
    let smoke_alert = sample.smoke_status != SMOKE_STATUS_NORMAL;
    let humidity_alert = match (thresholds.humidity_bounds, sample.humidity_pct) {
        (Some(bounds), Some(humidity)) => humidity < bounds.low || humidity > bounds.high,
        _ => false,
    };

    let cause = match (smoke_alert, temperature_alert) {
        (true, true) => AlertCause::SmokeAndTemperature,
        (true, false) => AlertCause::Smoke,
        (false, true) => AlertCause::Temperature,
        (false, false) => AlertCause::Normal,
    };

    AlertVerdict {
        temperature_alert,
        smoke_alert,
        humidity_alert,
        cause,
    }
}
