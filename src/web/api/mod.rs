pub mod error;
pub mod executor;
pub mod passes;
pub mod rotor;
