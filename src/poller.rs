use crate::channel::{ChannelClient, FetchError};
use crate::config::Config;
use crate::pipeline::{
    self, PollPhase, SampleError, Snapshot, TelemetrySample, Thresholds,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
enum CycleError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("latest sample rejected: {0}")]
    Sample(#[from] SampleError),
}

/// Drives the poll loop: one fetch cycle per interval tick, each cycle
/// publishing a fresh snapshot through the watch channel. Single writer; the
/// HTTP layer and any other consumer hold receivers.
pub struct TelemetryPoller {
    client: ChannelClient,
    thresholds: Thresholds,
    poll_interval: Duration,
    window_size: u32,
    history_limit: usize,
    smoke_display_max: f64,
    tx: watch::Sender<Arc<Snapshot>>,
}

impl TelemetryPoller {
    pub fn new(client: ChannelClient, config: &Config, tx: watch::Sender<Arc<Snapshot>>) -> Self {
        Self {
            client,
            thresholds: config.thresholds(),
            poll_interval: config.poll_interval(),
            window_size: config.window_size,
            history_limit: config.history_limit,
            smoke_display_max: config.smoke_display_max,
            tx,
        }
    }

    pub fn start(self, cancel: CancellationToken) {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.poll_interval);
            // A cycle that outlives one or more periods absorbs those ticks;
            // the next cycle starts on the next scheduled edge with no
            // backlog and no second cycle ever runs concurrently.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                if cancel.is_cancelled() {
                    break;
                }
                // Racing the cycle against cancellation drops an in-flight
                // fetch on teardown before it can publish.
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = self.run_cycle() => {}
                }
            }
            tracing::info!("telemetry poller stopped");
        });
    }

    async fn run_cycle(&self) {
        self.publish_loading();
        match self.poll_once().await {
            Ok((latest, window)) => self.publish_ready(latest, window),
            Err(err) => {
                tracing::warn!(error = %err, "poll cycle failed");
                self.publish_failed(&err);
            }
        }
    }

    /// One fetch cycle: latest entry first, and only if it validates, the
    /// trailing window. Malformed rows inside the window are dropped
    /// individually; a malformed latest entry fails the whole cycle so the
    /// prior snapshot stays up.
    async fn poll_once(&self) -> Result<(TelemetrySample, Vec<TelemetrySample>), CycleError> {
        let entry = self.client.fetch_latest().await?;
        let latest = pipeline::validate(&entry)?;

        let feeds = self.client.fetch_window(self.window_size).await?;
        let mut window = Vec::with_capacity(feeds.len());
        for entry in &feeds {
            match pipeline::validate(entry) {
                Ok(sample) => window.push(sample),
                Err(err) => {
                    tracing::warn!(
                        entry_id = entry.entry_id,
                        error = %err,
                        "dropping malformed window entry"
                    );
                }
            }
        }
        Ok((latest, window))
    }

    fn publish_loading(&self) {
        let mut next = self.tx.borrow().as_ref().clone();
        next.phase = PollPhase::Loading;
        self.tx.send_replace(Arc::new(next));
    }

    fn publish_failed(&self, err: &CycleError) {
        let mut next = self.tx.borrow().as_ref().clone();
        next.phase = PollPhase::Failed;
        next.last_error = Some(err.to_string());
        self.tx.send_replace(Arc::new(next));
    }

    fn publish_ready(&self, latest: TelemetrySample, window: Vec<TelemetrySample>) {
        let verdict = pipeline::classify(&latest, &self.thresholds);
        let series = pipeline::project_all(Some(&window), self.smoke_display_max);
        let history = pipeline::filter_alerts(Some(&window), &self.thresholds, self.history_limit);
        let alert_active = verdict.alarm_active();

        let was_active = self.tx.borrow().alert_active;
        if alert_active && !was_active {
            tracing::warn!(
                cause = ?verdict.cause,
                entry_id = latest.entry_id,
                temperature_c = latest.temperature_c,
                smoke_status = %latest.smoke_status,
                recent_incidents = history.incidents().len(),
                "alert raised"
            );
        } else if !alert_active && was_active {
            tracing::info!(entry_id = latest.entry_id, "alert cleared");
        }

        let next = Snapshot {
            phase: PollPhase::Ready,
            latest: Some(latest),
            verdict: Some(verdict),
            window: Some(window),
            series,
            history,
            alert_active,
            last_error: None,
            updated_at: Some(Utc::now()),
        };
        self.tx.send_replace(Arc::new(next));
    }
}
