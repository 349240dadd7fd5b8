mod alert;
mod history;
mod sample;
mod series;


pub use alert::{classify, AlertCause, AlertVerdict, HumidityBounds, Thresholds};
pub use history::{filter_alerts, AlertHistory};
pub use sample::{validate, FeedEntry, SampleError, TelemetrySample};
pub use series::{project_all, ChartSeries, Metric, SeriesSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollPhase {
    Idle,
    Loading,
    Ready,
    Failed,
}

/// Everything derived from the channel, published as one value. The poller
/// replaces the whole snapshot atomically each cycle; readers clone the `Arc`
/// and never observe a half-updated mix of old and new readings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub phase: PollPhase,
    pub latest: Option<TelemetrySample>,
    pub verdict: Option<AlertVerdict>,
    /// Oldest first, as fetched. `None` until the first successful cycle.
    pub window: Option<Vec<TelemetrySample>>,
    pub series: SeriesSet,
    pub history: AlertHistory,
    /// Edge signal for sirens and banner styling. True while the current
    /// verdict carries a non-normal cause.
    pub alert_active: bool,
    pub last_error: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn initial(smoke_display_max: f64) -> Self {
        Self {
            phase: PollPhase::Idle,
            latest: None,
            verdict: None,
            window: None,
            series: project_all(None, smoke_display_max),
            history: AlertHistory::awaiting_data(),
            alert_active: false,
            last_error: None,
            updated_at: None,
        }
    }
}
