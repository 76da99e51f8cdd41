use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use utoipa::ToSchema;

use crate::rotor::AzEl;

#[derive(Debug, Error)]
pub enum PassError {
    #[error("pass needs at least 2 waypoints, got {0}")]
    TooFewWaypoints(usize),
    #[error("waypoint times must be strictly increasing (index {0})")]
    NonMonotonicTimes(usize),
    #[error("times and states length mismatch ({times} vs {states})")]
    MismatchedLengths { times: usize, states: usize },
}

/// One trajectory sample: where the rotator should point at an instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Waypoint {
    pub time: DateTime<Utc>,
    #[serde(flatten)]
    pub position: AzEl,
}

/// Submission body for a tracking pass: parallel arrays of sample times
/// and rotator states.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PassRequest {
    pub spacecraft: String,
    pub times: Vec<DateTime<Utc>>,
    pub states: Vec<AzEl>,
}

/// A validated tracking pass. Construction guarantees at least two
/// waypoints with strictly increasing timestamps, so `start_time` and
/// `end_time` are always defined.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TrackingPass {
    id: String,
    spacecraft: String,
    waypoints: Vec<Waypoint>,
}

impl TrackingPass {
    pub fn new(
        id: String,
        spacecraft: String,
        waypoints: Vec<Waypoint>,
    ) -> Result<Self, PassError> {
        if waypoints.len() < 2 {
            return Err(PassError::TooFewWaypoints(waypoints.len()));
        }
        for i in 1..waypoints.len() {
            if waypoints[i].time <= waypoints[i - 1].time {
                return Err(PassError::NonMonotonicTimes(i));
            }
        }
        Ok(TrackingPass {
            id,
            spacecraft,
            waypoints,
        })
    }

    pub fn from_request(id: String, request: PassRequest) -> Result<Self, PassError> {
        if request.times.len() != request.states.len() {
            return Err(PassError::MismatchedLengths {
                times: request.times.len(),
                states: request.states.len(),
            });
        }
        let waypoints = request
            .times
            .into_iter()
            .zip(request.states)
            .map(|(time, position)| Waypoint { time, position })
            .collect();
        Self::new(id, request.spacecraft, waypoints)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn spacecraft(&self) -> &str {
        &self.spacecraft
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn first_waypoint(&self) -> &Waypoint {
        &self.waypoints[0]
    }

    pub fn last_waypoint(&self) -> &Waypoint {
        &self.waypoints[self.waypoints.len() - 1]
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.first_waypoint().time
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.last_waypoint().time
    }
}

impl fmt::Display for TrackingPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{} - {}] id={}",
            self.spacecraft,
            self.start_time(),
            self.end_time(),
            self.id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    fn request(times: Vec<i64>, azimuths: Vec<f64>) -> PassRequest {
        PassRequest {
            spacecraft: "ARMADILLO".to_string(),
            times: times.into_iter().map(at).collect(),
            states: azimuths.into_iter().map(|az| AzEl::new(az, 5.0)).collect(),
        }
    }

    #[test]
    fn from_request_zips_times_and_states() {
        let pass =
            TrackingPass::from_request("p1".to_string(), request(vec![0, 5, 10], vec![10.0, 11.0, 12.0]))
                .unwrap();
        assert_eq!(pass.waypoints().len(), 3);
        assert_eq!(pass.start_time(), at(0));
        assert_eq!(pass.end_time(), at(10));
        assert_eq!(pass.waypoints()[1].position, AzEl::new(11.0, 5.0));
    }

    #[test]
    fn rejects_fewer_than_two_waypoints() {
        let err = TrackingPass::from_request("p1".to_string(), request(vec![0], vec![10.0]))
            .unwrap_err();
        assert!(matches!(err, PassError::TooFewWaypoints(1)));

        let err =
            TrackingPass::from_request("p1".to_string(), request(vec![], vec![])).unwrap_err();
        assert!(matches!(err, PassError::TooFewWaypoints(0)));
    }

    #[test]
    fn rejects_equal_adjacent_times() {
        let err = TrackingPass::from_request(
            "p1".to_string(),
            request(vec![0, 5, 5, 10], vec![10.0, 11.0, 12.0, 13.0]),
        )
        .unwrap_err();
        assert!(matches!(err, PassError::NonMonotonicTimes(2)));
    }

    #[test]
    fn rejects_decreasing_times() {
        let err = TrackingPass::from_request(
            "p1".to_string(),
            request(vec![0, 10, 5], vec![10.0, 11.0, 12.0]),
        )
        .unwrap_err();
        assert!(matches!(err, PassError::NonMonotonicTimes(2)));
    }

    #[test]
    fn rejects_mismatched_array_lengths() {
        let err = TrackingPass::from_request(
            "p1".to_string(),
            request(vec![0, 5, 10], vec![10.0, 11.0]),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PassError::MismatchedLengths { times: 3, states: 2 }
        ));
    }
}
