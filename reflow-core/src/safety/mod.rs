//! Thermal safety logic
//!
//! Cooling-mode hysteresis and fan arbitration for runs.

pub mod cooling;
pub mod fan;

pub use cooling::{CoolingAction, CoolingDecision, CoolingMonitor};
pub use fan::{FanArbiter, FanDecision, FanReason};
