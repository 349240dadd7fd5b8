use super::sample::TelemetrySample;
use chrono::Local;
use serde::Serialize;

/// Fixed axis ceiling for the two percent-ish panels. The smoke panel ceiling
/// varies by deployment (0-2500 or 0-1024) and comes from configuration.
const PERCENT_AXIS_MAX: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Temperature,
    Humidity,
    Smoke,
}

impl Metric {
    /// Parses the metric name as it appears in API paths; the accepted names
    /// are exactly the serialized forms.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "temperature" => Some(Metric::Temperature),
            "humidity" => Some(Metric::Humidity),
            "smoke" => Some(Metric::Smoke),
            _ => None,
        }
    }

    fn select(self, sample: &TelemetrySample) -> Option<f64> {
        match self {
            Metric::Temperature => Some(sample.temperature_c),
            Metric::Humidity => sample.humidity_pct,
            Metric::Smoke => sample.smoke_level,
        }
    }

    fn axis_max(self, smoke_display_max: f64) -> f64 {
        match self {
            Metric::Smoke => smoke_display_max,
            Metric::Temperature | Metric::Humidity => PERCENT_AXIS_MAX,
        }
    }
}

/// One chart-ready series: a wall-clock label and an optional value per
/// sample, index-aligned with the window (oldest first), plus the fixed
/// display range for the panel's y axis. A `None` value renders as a gap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<Option<f64>>,
    pub y_min: f64,
    pub y_max: f64,
}

impl ChartSeries {
    fn empty(y_max: f64) -> Self {
        Self {
            labels: Vec::new(),
            values: Vec::new(),
            y_min: 0.0,
            y_max,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSet {
    pub temperature: ChartSeries,
    pub humidity: ChartSeries,
    pub smoke: ChartSeries,
}

impl SeriesSet {
    pub fn get(&self, metric: Metric) -> &ChartSeries {
        match metric {
            Metric::Temperature => &self.temperature,
            Metric::Humidity => &self.humidity,
            Metric::Smoke => &self.smoke,
        }
    }
}

/// Projects one metric out of the window. `None` (no window fetched yet) and
/// an empty window both yield an empty series so charts render without
/// special cases.
pub fn project(
    window: Option<&[TelemetrySample]>,
    metric: Metric,
    smoke_display_max: f64,
) -> ChartSeries {
    let y_max = metric.axis_max(smoke_display_max);
    let Some(samples) = window else {
        return ChartSeries::empty(y_max);
    };

    let mut labels = Vec::with_capacity(samples.len());
    let mut values = Vec::with_capacity(samples.len());
    for sample in samples {
        labels.push(
            sample
                .timestamp
                .with_timezone(&Local)
                .format("%H:%M:%S")
                .to_string(),
        );
        values.push(metric.select(sample));
    }

    ChartSeries {
        labels,
        values,
        y_min: 0.0,
        y_max,
    }
}

pub fn project_all(window: Option<&[TelemetrySample]>, smoke_display_max: f64) -> SeriesSet {
    SeriesSet {
        temperature: project(window, Metric::Temperature, smoke_display_max),
        humidity: project(window, Metric::Humidity, smoke_display_max),
        smoke: project(window, Metric::Smoke, smoke_display_max),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn window() -> Vec<TelemetrySample> {
        (0..3)
            .map(|i| TelemetrySample {
                entry_id: i + 1,
                timestamp: Utc.with_ymd_and_hms(2023, 5, 1, 12, 0, i as u32 * 10).unwrap(),
                temperature_c: 20.0 + i as f64,
                humidity_pct: if i == 1 { None } else { Some(50.0 + i as f64) },
                smoke_level: Some(100.0 * i as f64),
                smoke_status: "NORMAL".to_string(),
            })
            .collect()
    }

    #[test]
    fn labels_and_values_align_with_the_window() {
        let samples = window();
        for metric in [Metric::Temperature, Metric::Humidity, Metric::Smoke] {
            let series = project(Some(&samples), metric, 2500.0);
            assert_eq!(series.labels.len(), samples.len());
            assert_eq!(series.values.len(), samples.len());
        }
    }

    #[test]
    fn values_keep_window_order_oldest_first() {
        let samples = window();
        let series = project(Some(&samples), Metric::Temperature, 2500.0);
        assert_eq!(series.values, vec![Some(20.0), Some(21.0), Some(22.0)]);
    }

    #[test]
    fn missing_metric_becomes_a_gap_not_a_dropped_point() {
        let samples = window();
        let series = project(Some(&samples), Metric::Humidity, 2500.0);
        assert_eq!(series.values, vec![Some(50.0), None, Some(52.0)]);
    }

    #[test]
    fn labels_are_wall_clock_times() {
        let samples = window();
        let series = project(Some(&samples), Metric::Temperature, 2500.0);
        // Local-zone rendering, so assert the HH:MM:SS shape rather than
        // exact values.
        for label in &series.labels {
            assert_eq!(label.len(), 8, "label {label:?}");
            assert_eq!(&label[2..3], ":");
            assert_eq!(&label[5..6], ":");
        }
        assert_ne!(series.labels[0], series.labels[1]);
    }

    #[test]
    fn empty_and_unloaded_windows_project_to_empty_series() {
        for window in [None, Some(&[][..])] {
            let series = project(window, Metric::Smoke, 1024.0);
            assert!(series.values.is_empty());
            assert!(series.labels.is_empty());
            assert_eq!(series.y_max, 1024.0);
        }
    }

    #[test]
    fn axis_ranges_are_fixed_per_metric() {
        let samples = window();
        let set = project_all(Some(&samples), 1024.0);
        assert_eq!((set.temperature.y_min, set.temperature.y_max), (0.0, 100.0));
        assert_eq!((set.humidity.y_min, set.humidity.y_max), (0.0, 100.0));
        assert_eq!((set.smoke.y_min, set.smoke.y_max), (0.0, 1024.0));
    }

    #[test]
    fn metric_names_match_the_wire_form() {
        for (name, metric) in [
            ("temperature", Metric::Temperature),
            ("humidity", Metric::Humidity),
            ("smoke", Metric::Smoke),
        ] {
            assert_eq!(Metric::from_name(name), Some(metric));
            assert_eq!(
                serde_json::to_value(metric).unwrap(),
                serde_json::json!(name)
            );
        }
        assert_eq!(Metric::from_name("co2"), None);
        assert_eq!(Metric::from_name("Smoke"), None);
    }

    #[test]
    fn series_set_routes_by_metric() {
        let samples = window();
        let set = project_all(Some(&samples), 2500.0);
        assert_eq!(set.get(Metric::Temperature), &set.temperature);
        assert_eq!(set.get(Metric::Humidity), &set.humidity);
        assert_eq!(set.get(Metric::Smoke), &set.smoke);
    }

    #[test]
    fn projection_is_deterministic() {
        let samples = window();
        assert_eq!(
            project(Some(&samples), Metric::Smoke, 2500.0),
            project(Some(&samples), Metric::Smoke, 2500.0)
        );
    }
}
