use thiserror::Error;

use super::types::Axis;

#[derive(Debug, Error)]
pub enum RotorError {
    #[error("{axis} drive fault: {message}")]
    DriveFault { axis: Axis, message: String },
}
