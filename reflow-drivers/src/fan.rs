//! PWM cooling fan
//!
//! The stock fan is driven through a low-side transistor, so a LOW level
//! at the fan means ON (active-low).

use embedded_hal::pwm::SetDutyCycle;
use reflow_core::traits::FanOutput;

/// Fan driven by an embedded-hal PWM channel
pub struct PwmFan<P> {
    pwm: P,
    active_low: bool,
    duty_pct: u8,
    fault: bool,
}

impl<P: SetDutyCycle> PwmFan<P> {
    /// Create a fan output, switched off
    pub fn new(pwm: P, active_low: bool) -> Self {
        let mut fan = Self {
            pwm,
            active_low,
            duty_pct: 0,
            fault: false,
        };
        fan.apply();
        fan
    }

    pub fn new_active_low(pwm: P) -> Self {
        Self::new(pwm, true)
    }

    /// A PWM write has failed since creation
    pub fn has_fault(&self) -> bool {
        self.fault
    }

    fn apply(&mut self) {
        let max = self.pwm.max_duty_cycle() as u32;
        let mut raw = (self.duty_pct as u32 * max + 50) / 100;
        if self.active_low {
            raw = max - raw;
        }
        if self.pwm.set_duty_cycle(raw as u16).is_err() {
            self.fault = true;
        }
    }
}

impl<P: SetDutyCycle> FanOutput for PwmFan<P> {
    fn set_duty_pct(&mut self, pct: u8) {
        self.duty_pct = pct.min(100);
        self.apply();
    }

    fn duty_pct(&self) -> u8 {
        self.duty_pct
    }
}
