use chrono::{DateTime, Utc};

use crate::passes::Waypoint;
use crate::rotor::AzEl;

/// Linearly interpolates the rotator target between two waypoints.
///
/// Callers supply `t` within `[a.time, b.time]` and `a.time < b.time`;
/// both axes are interpolated independently as plain angles.
pub(crate) fn interpolate(a: &Waypoint, b: &Waypoint, t: DateTime<Utc>) -> AzEl {
    let span = b.time - a.time;
    let offset = t - a.time;
    // Waypoints can sit closer than one millisecond apart, so the ratio
    // is computed in nanoseconds. Spans past i64 nanoseconds fall back
    // to millisecond math.
    let ratio = match (offset.num_nanoseconds(), span.num_nanoseconds()) {
        (Some(offset_ns), Some(span_ns)) => offset_ns as f64 / span_ns as f64,
        _ => offset.num_milliseconds() as f64 / span.num_milliseconds() as f64,
    };
    AzEl {
        azimuth_deg: a.position.azimuth_deg
            + (b.position.azimuth_deg - a.position.azimuth_deg) * ratio,
        elevation_deg: a.position.elevation_deg
            + (b.position.elevation_deg - a.position.elevation_deg) * ratio,
    }
}
