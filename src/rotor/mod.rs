mod error;
mod rotor;
mod types;

pub use error::RotorError;
pub use rotor::{Rotor, RotorDrive, SlewSim};
pub use types::{Axis, AzEl};
