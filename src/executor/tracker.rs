use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::Serialize;
use std::sync::Arc;
use strum_macros::Display;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::time::sleep;

use crate::config::TrackingConfig;
use crate::passes::{TrackingPass, Waypoint};
use crate::rotor::{AzEl, Rotor, RotorError};

use super::executor::{EngagementGuard, ExecutorHandle, ExecutorMode};
use super::interpolate::interpolate;

#[derive(Debug, Error)]
pub enum TrackError {
    #[error("seek failed after {attempts} attempts: {source}")]
    SeekFailed { attempts: u32, source: RotorError },
}

/// How a tracked pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum TrackOutcome {
    Completed,
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TrackerPhase {
    /// Holding at the first waypoint until the start time.
    Pending,
    /// Steering along the trajectory.
    Active,
}

/// Worker that carries one pass from engagement to a terminal state.
pub(crate) struct PassTracker {
    rotor: Arc<Rotor>,
    pass: TrackingPass,
    config: TrackingConfig,
    handle: ExecutorHandle,
    guard: EngagementGuard,
    abort_rx: oneshot::Receiver<()>,
}

impl PassTracker {
    pub(crate) fn new(
        rotor: Arc<Rotor>,
        pass: TrackingPass,
        config: TrackingConfig,
        handle: ExecutorHandle,
        guard: EngagementGuard,
        abort_rx: oneshot::Receiver<()>,
    ) -> Self {
        PassTracker {
            rotor,
            pass,
            config,
            handle,
            guard,
            abort_rx,
        }
    }

    pub(crate) async fn run(mut self) -> Result<TrackOutcome, TrackError> {
        let result = self.track().await;
        match &result {
            Ok(outcome) => info!("Pass {} {}", self.pass.id(), outcome),
            Err(e) => error!("Pass {} failed: {}", self.pass.id(), e),
        }
        // Reset the shared slot before the engagement guard drops, so an
        // observer that sees the slot free also sees the mode idle.
        self.handle.finish();
        drop(self.guard);
        result
    }

    async fn track(&mut self) -> Result<TrackOutcome, TrackError> {
        let pass = self.pass.clone();

        info!(
            "Pre-positioning rotor at {} for pass {}",
            pass.first_waypoint().position,
            pass.id()
        );
        self.seek_with_retry(pass.first_waypoint().position)
            .await?;

        // Pending: hold until the start time, watching for an early abort.
        while Utc::now() < pass.start_time() {
            if self.abort_requested() {
                return Ok(TrackOutcome::Aborted);
            }
            sleep(self.config.pre_start_poll).await;
        }

        self.handle
            .set_mode(ExecutorMode::tracking(&pass, TrackerPhase::Active));
        info!("Pass {} active", pass.id());

        // Active: tick until the trajectory end time.
        let mut cursor = 0;
        loop {
            let now = Utc::now();
            if now > pass.end_time() {
                break;
            }
            if self.abort_requested() {
                return Ok(TrackOutcome::Aborted);
            }

            cursor = advance_cursor(pass.waypoints(), cursor, now);
            let target = if cursor == 0 {
                pass.waypoints()[0].position
            } else {
                interpolate(&pass.waypoints()[cursor - 1], &pass.waypoints()[cursor], now)
            };

            let current = self.rotor.position().await;
            if drift_exceeds(current, target, self.config.dead_band_deg) {
                self.seek_with_retry(target).await?;
            } else {
                sleep(self.config.active_poll).await;
            }
        }

        // Land on the trajectory's terminal sample. A no-op when the last
        // corrective seek already reached it.
        self.seek_with_retry(pass.last_waypoint().position).await?;
        Ok(TrackOutcome::Completed)
    }

    fn abort_requested(&mut self) -> bool {
        self.abort_rx.try_recv().is_ok()
    }

    /// One commanded seek gets `seek_retries` extra attempts before the
    /// pass is given up.
    async fn seek_with_retry(&mut self, target: AzEl) -> Result<(), TrackError> {
        let mut attempts = 0;
        loop {
            match self.rotor.seek(target).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    attempts += 1;
                    if attempts > self.config.seek_retries {
                        return Err(TrackError::SeekFailed {
                            attempts,
                            source: e,
                        });
                    }
                    warn!("Seek to {} failed (attempt {}): {}", target, attempts, e);
                    sleep(self.config.active_poll).await;
                }
            }
        }
    }
}

/// First waypoint index whose time is not before `now`, never less than
/// `from`. The active loop only calls this while `now` is inside the
/// trajectory, so the result stays in bounds.
fn advance_cursor(waypoints: &[Waypoint], from: usize, now: DateTime<Utc>) -> usize {
    let mut cursor = from;
    while cursor < waypoints.len() && waypoints[cursor].time < now {
        cursor += 1;
    }
    cursor
}

fn drift_exceeds(current: AzEl, target: AzEl, dead_band_deg: f64) -> bool {
    (target.azimuth_deg - current.azimuth_deg).abs() > dead_band_deg
        || (target.elevation_deg - current.elevation_deg).abs() > dead_band_deg
}
