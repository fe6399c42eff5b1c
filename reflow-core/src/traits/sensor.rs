//! Analog input trait for thermistor sampling

/// Errors from an analog read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdcError {
    /// Conversion did not complete
    Timeout,
    /// Channel not configured or unavailable
    Unavailable,
}

/// Errors from a temperature conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// The underlying ADC read failed
    Adc(AdcError),
    /// Converted value is non-finite or outside the plausible band
    OutOfRange,
}

impl From<AdcError> for SensorError {
    fn from(e: AdcError) -> Self {
        SensorError::Adc(e)
    }
}

/// ADC reading trait for platform abstraction
pub trait AdcReader {
    /// Read one raw sample (12-bit on the stock board, 0-4095)
    ///
    /// Takes `&mut self` because ADC reads typically require mutable access.
    fn read(&mut self) -> Result<u16, AdcError>;
}
