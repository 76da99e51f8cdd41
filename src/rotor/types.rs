use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::Display;

/// A rotator pointing direction in degrees.
///
/// Angles are plain real numbers: trajectories that cross the 0/360 azimuth
/// boundary must be unwrapped by whatever produced them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AzEl {
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Axis {
    Azimuth,
    Elevation,
}

impl AzEl {
    pub fn new(azimuth_deg: f64, elevation_deg: f64) -> Self {
        AzEl {
            azimuth_deg,
            elevation_deg,
        }
    }

    pub fn axis_deg(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Azimuth => self.azimuth_deg,
            Axis::Elevation => self.elevation_deg,
        }
    }

    pub fn set_axis_deg(&mut self, axis: Axis, value_deg: f64) {
        match axis {
            Axis::Azimuth => self.azimuth_deg = value_deg,
            Axis::Elevation => self.elevation_deg = value_deg,
        }
    }
}

impl fmt::Display for AzEl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "az={:.1} el={:.1}", self.azimuth_deg, self.elevation_deg)
    }
}
