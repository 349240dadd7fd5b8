use crate::config::Config;
use crate::pipeline::{
    AlertHistory, AlertVerdict, ChartSeries, Metric, PollPhase, Snapshot, TelemetrySample,
};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct HttpState {
    pub snapshot: watch::Receiver<Arc<Snapshot>>,
    pub channel_id: u64,
    pub poll_interval_ms: u64,
}

impl HttpState {
    pub fn new(config: &Config, snapshot: watch::Receiver<Arc<Snapshot>>) -> Self {
        Self {
            snapshot,
            channel_id: config.channel_id,
            poll_interval_ms: config.poll_interval_ms,
        }
    }

    fn current(&self) -> Arc<Snapshot> {
        self.snapshot.borrow().clone()
    }
}

#[derive(Debug, Serialize)]
struct StatusBody {
    phase: PollPhase,
    channel_id: u64,
    poll_interval_ms: u64,
    alert_active: bool,
    verdict: Option<AlertVerdict>,
    last_error: Option<String>,
    updated_at: Option<DateTime<Utc>>,
    window_len: usize,
}

/// Latest reading plus its verdict. Both stay null until the first
/// successful cycle; the phase lets the dashboard render a loading state
/// instead of special-casing an error status.
#[derive(Debug, Serialize)]
struct LatestBody {
    phase: PollPhase,
    sample: Option<TelemetrySample>,
    verdict: Option<AlertVerdict>,
}

#[derive(Debug, Serialize)]
struct SeriesBody {
    metric: Metric,
    range: RangeBody,
    labels: Vec<String>,
    values: Vec<Option<f64>>,
}

#[derive(Debug, Serialize)]
struct RangeBody {
    min: f64,
    max: f64,
}

impl SeriesBody {
    fn new(metric: Metric, series: &ChartSeries) -> Self {
        Self {
            metric,
            range: RangeBody {
                min: series.y_min,
                max: series.y_max,
            },
            labels: series.labels.clone(),
            values: series.values.clone(),
        }
    }
}

async fn healthz() -> &'static str {
    "ok"
}

async fn get_status(State(state): State<HttpState>) -> Json<StatusBody> {
    let snapshot = state.current();
    Json(StatusBody {
        phase: snapshot.phase,
        channel_id: state.channel_id,
        poll_interval_ms: state.poll_interval_ms,
        alert_active: snapshot.alert_active,
        verdict: snapshot.verdict,
        last_error: snapshot.last_error.clone(),
        updated_at: snapshot.updated_at,
        window_len: snapshot.window.as_ref().map_or(0, Vec::len),
    })
}

async fn get_latest(State(state): State<HttpState>) -> Json<LatestBody> {
    let snapshot = state.current();
    Json(LatestBody {
        phase: snapshot.phase,
        sample: snapshot.latest.clone(),
        verdict: snapshot.verdict,
    })
}

async fn get_series(
    State(state): State<HttpState>,
    Path(name): Path<String>,
) -> Result<Json<SeriesBody>, (StatusCode, String)> {
    let Some(metric) = Metric::from_name(&name) else {
        return Err((StatusCode::NOT_FOUND, format!("unknown metric {name}")));
    };
    let snapshot = state.current();
    Ok(Json(SeriesBody::new(metric, snapshot.series.get(metric))))
}

async fn get_history(State(state): State<HttpState>) -> Json<AlertHistory> {
    Json(state.current().history.clone())
}

pub fn router(state: HttpState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/status", get(get_status))
        .route("/v1/latest", get(get_latest))
        .route("/v1/series/{metric}", get(get_series))
        .route("/v1/history", get(get_history))
        .layer(cors)
        .with_state(state)
}
