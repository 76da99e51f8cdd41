mod pass;
mod store;

pub use pass::{PassError, PassRequest, TrackingPass, Waypoint};
pub use store::{PassQuery, PassSource, PassStore, StoreError};
