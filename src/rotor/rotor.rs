use tokio::sync::RwLock;
use tokio::time::sleep;

use super::error::RotorError;
use super::types::{Axis, AzEl};

/// Motion backend that advances one axis by at most one increment.
///
/// `step` returns the angle actually reached. Implementations must land
/// exactly on `target_deg` once the remaining distance fits within one
/// increment, otherwise `seek` never terminates.
pub trait RotorDrive: Send + Sync {
    fn step(&self, axis: Axis, from_deg: f64, target_deg: f64) -> Result<f64, RotorError>;
}

/// Simulated drive that slews in fixed-size increments.
pub struct SlewSim {
    step_deg: f64,
}

impl SlewSim {
    pub fn new(step_deg: f64) -> Self {
        SlewSim { step_deg }
    }
}

impl RotorDrive for SlewSim {
    fn step(&self, _axis: Axis, from_deg: f64, target_deg: f64) -> Result<f64, RotorError> {
        let remaining = target_deg - from_deg;
        if remaining.abs() <= self.step_deg {
            Ok(target_deg)
        } else {
            Ok(from_deg + self.step_deg.copysign(remaining))
        }
    }
}

/// A two-axis rotator. All position updates go through one lock, so
/// concurrent seeks run one after another and readers never observe a
/// torn az/el pair.
pub struct Rotor {
    state: RwLock<AzEl>,
    drive: Box<dyn RotorDrive>,
    pacing: std::time::Duration,
}

impl Rotor {
    pub fn new(initial: AzEl, drive: Box<dyn RotorDrive>, pacing: std::time::Duration) -> Self {
        Rotor {
            state: RwLock::new(initial),
            drive,
            pacing,
        }
    }

    pub async fn position(&self) -> AzEl {
        *self.state.read().await
    }

    /// Slews to `target`, azimuth first and then elevation. The position
    /// lock is held until both axes have landed.
    pub async fn seek(&self, target: AzEl) -> Result<(), RotorError> {
        let mut state = self.state.write().await;
        self.slew_axis(Axis::Azimuth, &mut state, target.azimuth_deg)
            .await?;
        self.slew_axis(Axis::Elevation, &mut state, target.elevation_deg)
            .await?;
        Ok(())
    }

    async fn slew_axis(
        &self,
        axis: Axis,
        state: &mut AzEl,
        target_deg: f64,
    ) -> Result<(), RotorError> {
        while state.axis_deg(axis) != target_deg {
            sleep(self.pacing).await;
            let reached = self.drive.step(axis, state.axis_deg(axis), target_deg)?;
            state.set_axis_deg(axis, reached);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct CountingDrive {
        inner: SlewSim,
        steps: Arc<AtomicU32>,
    }

    impl RotorDrive for CountingDrive {
        fn step(&self, axis: Axis, from_deg: f64, target_deg: f64) -> Result<f64, RotorError> {
            self.steps.fetch_add(1, Ordering::SeqCst);
            self.inner.step(axis, from_deg, target_deg)
        }
    }

    struct FailingDrive;

    impl RotorDrive for FailingDrive {
        fn step(&self, axis: Axis, _from_deg: f64, _target_deg: f64) -> Result<f64, RotorError> {
            Err(RotorError::DriveFault {
                axis,
                message: "stalled".to_string(),
            })
        }
    }

    fn sim_rotor(initial: AzEl, step_deg: f64) -> Rotor {
        Rotor::new(initial, Box::new(SlewSim::new(step_deg)), Duration::ZERO)
    }

    #[test]
    fn slew_sim_steps_toward_target_and_lands_exactly() {
        let sim = SlewSim::new(0.25);
        assert_eq!(sim.step(Axis::Azimuth, 0.0, 1.0).unwrap(), 0.25);
        assert_eq!(sim.step(Axis::Azimuth, 1.0, 0.0).unwrap(), 0.75);
        assert_eq!(sim.step(Axis::Elevation, 0.9, 1.0).unwrap(), 1.0);
    }

    #[tokio::test]
    async fn seek_reaches_target_on_both_axes() {
        let rotor = sim_rotor(AzEl::new(0.0, 0.0), 0.25);
        rotor.seek(AzEl::new(1.5, 0.75)).await.unwrap();
        assert_eq!(rotor.position().await, AzEl::new(1.5, 0.75));
    }

    #[tokio::test]
    async fn seek_moves_downward() {
        let rotor = sim_rotor(AzEl::new(10.0, 5.0), 0.25);
        rotor.seek(AzEl::new(3.0, 1.0)).await.unwrap();
        assert_eq!(rotor.position().await, AzEl::new(3.0, 1.0));
    }

    #[tokio::test]
    async fn zero_distance_seek_issues_no_steps() {
        let steps = Arc::new(AtomicU32::new(0));
        let drive = CountingDrive {
            inner: SlewSim::new(0.25),
            steps: steps.clone(),
        };
        let rotor = Rotor::new(AzEl::new(12.0, 34.0), Box::new(drive), Duration::ZERO);
        rotor.seek(AzEl::new(12.0, 34.0)).await.unwrap();
        assert_eq!(steps.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn seek_propagates_drive_fault() {
        let rotor = Rotor::new(AzEl::default(), Box::new(FailingDrive), Duration::ZERO);
        let err = rotor.seek(AzEl::new(1.0, 0.0)).await.unwrap_err();
        assert!(matches!(
            err,
            RotorError::DriveFault {
                axis: Axis::Azimuth,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn concurrent_seeks_serialize() {
        let rotor = Arc::new(Rotor::new(
            AzEl::default(),
            Box::new(SlewSim::new(0.5)),
            Duration::from_millis(1),
        ));
        let first = tokio::spawn({
            let rotor = rotor.clone();
            async move { rotor.seek(AzEl::new(5.0, 0.0)).await }
        });
        let second = tokio::spawn({
            let rotor = rotor.clone();
            async move { rotor.seek(AzEl::new(-5.0, 0.0)).await }
        });
        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();

        // Seeks never interleave, so the rotor ends on whichever target
        // was commanded last rather than somewhere in between.
        let az = rotor.position().await.azimuth_deg;
        assert!(az == 5.0 || az == -5.0);
    }
}
