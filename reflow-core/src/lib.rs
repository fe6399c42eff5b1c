//! Board-agnostic core logic for the reflow station firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware abstraction traits (heater, fan, ADC, frontend)
//! - Configuration, built-in profiles and calibration records
//! - Profile setpoint interpolation
//! - Cooling-mode and fan arbitration rules
//! - Mode, input and feedback vocabulary
//! - The render snapshot consumed by the display

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
#[macro_use]
extern crate std;

pub mod config;
pub mod profile;
pub mod render;
pub mod safety;
pub mod state;
pub mod traits;
