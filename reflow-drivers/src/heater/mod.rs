//! Heater control

pub mod gpio;
pub mod regulator;

pub use gpio::GpioHeater;
pub use regulator::{ChannelState, HeaterRegulator};
