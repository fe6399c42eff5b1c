//! Cooling fan trait

/// Trait for the plate cooling fan
///
/// The fan accepts a 0-100% duty request. Polarity and PWM resolution
/// are the implementation's concern.
pub trait FanOutput {
    /// Set fan duty in percent (values above 100 are clamped)
    fn set_duty_pct(&mut self, pct: u8);

    /// Current commanded duty in percent
    fn duty_pct(&self) -> u8;

    /// Check if the fan is running
    fn is_on(&self) -> bool {
        self.duty_pct() > 0
    }

    /// Switch the fan fully on or off
    fn set(&mut self, on: bool) {
        self.set_duty_pct(if on { 100 } else { 0 });
    }
}
