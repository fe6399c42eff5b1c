//! Profile execution

mod interpolator;

pub use interpolator::{RunContext, Setpoint};
