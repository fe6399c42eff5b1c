//! Plate temperature sensing

pub mod estimator;
pub mod thermistor;

pub use estimator::SensorEstimator;
pub use thermistor::Thermistor;
