//! Configuration types
//!
//! Thresholds, gain sets, calibration and the static profile table.

pub mod calibration;
pub mod profiles;
pub mod types;

pub use calibration::*;
pub use profiles::*;
pub use types::*;
