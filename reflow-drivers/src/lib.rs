//! Hardware driver implementations
//!
//! This crate provides concrete implementations on top of the traits
//! defined in reflow-core:
//!
//! - Heater regulation (dual-channel PID, time-proportioned SSR output)
//! - GPIO heater output
//! - NTC thermistor conversion and plate temperature estimation
//! - Rotary encoder and button decoding
//! - PWM fan output

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
#[macro_use]
extern crate std;

mod fmt;

pub mod fan;
pub mod heater;
pub mod input;
pub mod sensor;
