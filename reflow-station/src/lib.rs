//! Reflow station control loop
//!
//! Ties the drivers together behind the mode state machine:
//!
//! - [`StationController`]: menu, setup, run, test and cooling-test modes,
//!   fan arbitration and the feedback queue
//! - [`Station`]: per-tick wiring of sensors, input, controller and frontend
//!
//! Everything is synchronous and takes the current time as an argument,
//! so the whole station runs on the host under test.

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
#[macro_use]
extern crate std;

mod fmt;

pub mod controller;
pub mod cooling_test;
pub mod mode;
pub mod station;

pub use controller::StationController;
pub use mode::{ConstantRun, Mode, ProfileRun};
pub use station::{BootReport, Station};
