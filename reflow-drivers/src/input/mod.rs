//! Rotary encoder and push-button input

pub mod button;
pub mod decoder;
pub mod quadrature;

pub use button::{Debouncer, Release};
pub use decoder::EncoderDecoder;
pub use quadrature::QuadratureCounter;
