use super::{classify, AlertCause, TelemetrySample, Thresholds};
use serde::Serialize;

/// One row of the incident table: an alert-bearing sample and the cause it
/// classified to at the time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertIncident {
    pub sample: TelemetrySample,
    pub cause: AlertCause,
}

/// Incident-table state. The two empty cases are distinct variants rather
/// than an empty list, and each carries its own operator-facing message so
/// the table can say "still waiting" or "loaded, nothing burning" without
/// the consumer inventing the wording.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AlertHistory {
    AwaitingData { message: &'static str },
    NoAlerts { message: &'static str },
    Recent { incidents: Vec<AlertIncident> },
}

impl AlertHistory {
    /// Window not fetched yet.
    pub fn awaiting_data() -> Self {
        AlertHistory::AwaitingData {
            message: "no readings loaded yet",
        }
    }

    /// Window loaded and classified, zero qualifying samples.
    pub fn no_alerts() -> Self {
        AlertHistory::NoAlerts {
            message: "no alerts in the recent readings",
        }
    }

    pub fn incidents(&self) -> &[AlertIncident] {
        match self {
            AlertHistory::Recent { incidents } => incidents,
            _ => &[],
        }
    }
}

/// Selects the alert-bearing samples out of the window, newest first, capped
/// at `limit`. A sample qualifies when the classifier assigns it a non-normal
/// cause, so temperature-only incidents appear in the table the same way they
/// light up the live panel. The humidity flag never carries a cause and so
/// never creates an incident.
pub fn filter_alerts(
    window: Option<&[TelemetrySample]>,
    thresholds: &Thresholds,
    limit: usize,
) -> AlertHistory {
    let Some(samples) = window else {
        return AlertHistory::awaiting_data();
    };

    let mut incidents: Vec<AlertIncident> = samples
        .iter()
        .filter_map(|sample| {
            let cause = classify(sample, thresholds).cause;
            (cause != AlertCause::Normal).then(|| AlertIncident {
                sample: sample.clone(),
                cause,
            })
        })
        .collect();

    if incidents.is_empty() {
        return AlertHistory::no_alerts();
    }

    // Window arrives oldest first; the table wants the most recent `limit`
    // incidents with the newest on top.
    incidents.reverse();
    incidents.truncate(limit);
    AlertHistory::Recent { incidents }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample(entry_id: u64, second: u32, temperature_c: f64, smoke_status: &str) -> TelemetrySample {
        TelemetrySample {
            entry_id,
            timestamp: Utc.with_ymd_and_hms(2023, 5, 1, 12, 0, second).unwrap(),
            temperature_c,
            humidity_pct: Some(50.0),
            smoke_level: Some(100.0),
            smoke_status: smoke_status.to_string(),
        }
    }

    fn thresholds() -> Thresholds {
        Thresholds {
            critical_temperature_c: 40.0,
            humidity_bounds: None,
        }
    }

    #[test]
    fn unloaded_window_reports_awaiting_data() {
        assert_eq!(
            filter_alerts(None, &thresholds(), 5),
            AlertHistory::awaiting_data()
        );
    }

    #[test]
    fn loaded_but_quiet_window_reports_no_alerts() {
        assert_eq!(
            filter_alerts(Some(&[]), &thresholds(), 5),
            AlertHistory::no_alerts()
        );

        let quiet: Vec<_> = (0..4).map(|i| sample(i + 1, i as u32, 25.0, "NORMAL")).collect();
        assert_eq!(
            filter_alerts(Some(&quiet), &thresholds(), 5),
            AlertHistory::no_alerts()
        );
    }

    #[test]
    fn empty_states_carry_distinct_operator_messages() {
        match (AlertHistory::awaiting_data(), AlertHistory::no_alerts()) {
            (
                AlertHistory::AwaitingData { message: awaiting },
                AlertHistory::NoAlerts { message: quiet },
            ) => {
                assert!(!awaiting.is_empty());
                assert!(!quiet.is_empty());
                assert_ne!(awaiting, quiet);
            }
            other => panic!("constructors returned the wrong variants: {other:?}"),
        }
    }

    #[test]
    fn picks_exactly_the_alerting_samples_newest_first() {
        let mut window: Vec<_> = (0..20)
            .map(|i| sample(i + 1, i as u32, 25.0, "NORMAL"))
            .collect();
        window[4] = sample(5, 4, 25.0, "FIRE_DETECTED");
        window[11] = sample(12, 11, 25.0, "FIRE_DETECTED");

        let history = filter_alerts(Some(&window), &thresholds(), 5);
        let incidents = history.incidents();
        assert_eq!(incidents.len(), 2);
        assert_eq!(incidents[0].sample.entry_id, 12);
        assert_eq!(incidents[1].sample.entry_id, 5);
        assert_eq!(incidents[0].cause, AlertCause::Smoke);
    }

    #[test]
    fn caps_at_limit_keeping_the_most_recent() {
        let window: Vec<_> = (0..7)
            .map(|i| sample(i + 1, i as u32, 25.0, "FIRE_DETECTED"))
            .collect();

        let history = filter_alerts(Some(&window), &thresholds(), 5);
        let ids: Vec<u64> = history
            .incidents()
            .iter()
            .map(|incident| incident.sample.entry_id)
            .collect();
        assert_eq!(ids, vec![7, 6, 5, 4, 3]);
    }

    #[test]
    fn temperature_only_incidents_are_included() {
        let window = vec![
            sample(1, 0, 25.0, "NORMAL"),
            sample(2, 10, 45.0, "NORMAL"),
            sample(3, 20, 25.0, "NORMAL"),
        ];

        let history = filter_alerts(Some(&window), &thresholds(), 5);
        let incidents = history.incidents();
        assert_eq!(incidents.len(), 1);
        assert_eq!(incidents[0].sample.entry_id, 2);
        assert_eq!(incidents[0].cause, AlertCause::Temperature);
    }

    #[test]
    fn humidity_excursions_do_not_create_incidents() {
        use crate::pipeline::HumidityBounds;

        let config = Thresholds {
            critical_temperature_c: 40.0,
            humidity_bounds: Some(HumidityBounds {
                low: 30.0,
                high: 70.0,
            }),
        };
        let mut reading = sample(1, 0, 25.0, "NORMAL");
        reading.humidity_pct = Some(95.0);

        assert_eq!(
            filter_alerts(Some(&[reading]), &config, 5),
            AlertHistory::no_alerts()
        );
    }

    #[test]
    fn combined_cause_is_preserved_per_incident() {
        let window = vec![sample(1, 0, 45.0, "FIRE_DETECTED")];
        let history = filter_alerts(Some(&window), &thresholds(), 5);
        assert_eq!(history.incidents()[0].cause, AlertCause::SmokeAndTemperature);
    }
}
