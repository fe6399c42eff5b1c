//! Rotary encoder + button decoder polled from the control loop

use embedded_hal::digital::InputPin;
use reflow_core::config::InputConfig;
use reflow_core::state::InputEvents;

use super::button::Debouncer;
use super::quadrature::QuadratureCounter;

/// Turns the shared quarter-step count and the button level into
/// per-tick [`InputEvents`]
///
/// Only the [`QuadratureCounter`] is shared with the interrupt handler;
/// button state is owned here.
pub struct EncoderDecoder<'a, P> {
    counter: &'a QuadratureCounter,
    button: P,
    debouncer: Debouncer,
    config: InputConfig,
}

impl<'a, P: InputPin> EncoderDecoder<'a, P> {
    pub fn new(counter: &'a QuadratureCounter, button: P, config: InputConfig) -> Self {
        Self {
            counter,
            button,
            debouncer: Debouncer::new(config.debounce_ms, config.long_press_ms),
            config,
        }
    }

    /// Collect input since the previous poll
    pub fn poll(&mut self, now_ms: u32) -> InputEvents {
        let steps = self
            .counter
            .drain_detents(self.config.quarter_steps_per_detent);

        let level = if self.config.button_active_low {
            self.button.is_low()
        } else {
            self.button.is_high()
        };
        // A failed read keeps the previous debounced level
        let pressed = level.unwrap_or(self.debouncer.is_pressed());

        let mut events = InputEvents {
            steps,
            ..InputEvents::NONE
        };
        if let Some(release) = self.debouncer.update(now_ms, pressed) {
            events.click = true;
            events.long_press = release.long;
            debug!("button released after {}ms (long: {})", release.held_ms, release.long);
        }
        if steps != 0 {
            trace!("encoder {} detents", steps);
        }
        events
    }
}
