//! GPIO heater output
//!
//! Drives one plate's SSR from an embedded-hal output pin.

use embedded_hal::digital::OutputPin;
use reflow_core::traits::HeaterOutput;

/// SSR driven by a GPIO pin
///
/// The pin can be active-high (default) or active-low. A pin write error
/// leaves the logical state at "off" and is reported by [`GpioHeater::has_fault`].
pub struct GpioHeater<P> {
    pin: P,
    /// If true, heater ON = pin LOW
    inverted: bool,
    /// Current logical state (true = heater on)
    on: bool,
    fault: bool,
}

impl<P: OutputPin> GpioHeater<P> {
    /// Create a new GPIO heater output, switched off
    ///
    /// # Arguments
    /// - `pin`: SSR control pin
    /// - `inverted`: heater is ON when the pin is LOW
    pub fn new(pin: P, inverted: bool) -> Self {
        let mut heater = Self {
            pin,
            inverted,
            on: false,
            fault: false,
        };
        heater.set_on(false);
        heater
    }

    pub fn new_active_high(pin: P) -> Self {
        Self::new(pin, false)
    }

    pub fn new_active_low(pin: P) -> Self {
        Self::new(pin, true)
    }

    /// A pin write has failed since creation
    pub fn has_fault(&self) -> bool {
        self.fault
    }

    /// Release the pin
    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P: OutputPin> HeaterOutput for GpioHeater<P> {
    fn set_on(&mut self, on: bool) {
        let result = if on != self.inverted {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };

        match result {
            Ok(()) => self.on = on,
            Err(_) => {
                self.fault = true;
                self.on = false;
            }
        }
    }

    fn is_on(&self) -> bool {
        self.on
    }
}
