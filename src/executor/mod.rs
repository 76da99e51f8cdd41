mod executor;
mod interpolate;
mod signal;
mod tracker;


pub use executor::{Executor, ExecutorHandle, ExecutorMode, ExecutorStatus};
pub use signal::SignalSender;
pub use tracker::TrackerPhase;
