//! Hardware abstraction traits
//!
//! These traits define the interface between the station logic
//! and hardware-specific implementations.

pub mod display;
pub mod fan;
pub mod heater;
pub mod sensor;

pub use display::Frontend;
pub use fan::FanOutput;
pub use heater::{Channel, HeatSelection, HeaterOutput, CHANNEL_COUNT};
pub use sensor::{AdcError, AdcReader, SensorError};
