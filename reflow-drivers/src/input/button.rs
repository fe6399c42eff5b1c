//! Push-button debouncing and press classification

/// A completed press, reported on the debounced release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Release {
    /// Time between the raw press and raw release edges (ms)
    pub held_ms: u32,
    /// Held at least the long-press threshold
    pub long: bool,
}

/// Time-based debouncer
///
/// A raw level change is accepted only after it has persisted longer
/// than the debounce interval.
#[derive(Debug, Clone)]
pub struct Debouncer {
    debounce_ms: u32,
    long_press_ms: u32,
    /// Last sampled level
    raw: bool,
    /// When `raw` last changed (ms)
    raw_changed_ms: u32,
    /// Accepted level
    stable: bool,
    /// Raw edge of the accepted press (ms)
    pressed_at_ms: u32,
}

impl Debouncer {
    pub fn new(debounce_ms: u32, long_press_ms: u32) -> Self {
        Self {
            debounce_ms,
            long_press_ms,
            raw: false,
            raw_changed_ms: 0,
            stable: false,
            pressed_at_ms: 0,
        }
    }

    /// Debounced button state
    pub fn is_pressed(&self) -> bool {
        self.stable
    }

    /// Feed one sample of the button level
    ///
    /// Returns `Some` once per accepted press→release.
    pub fn update(&mut self, now_ms: u32, pressed: bool) -> Option<Release> {
        if pressed != self.raw {
            self.raw = pressed;
            self.raw_changed_ms = now_ms;
        }

        if self.raw == self.stable || now_ms.wrapping_sub(self.raw_changed_ms) <= self.debounce_ms {
            return None;
        }

        self.stable = self.raw;
        if self.stable {
            self.pressed_at_ms = self.raw_changed_ms;
            return None;
        }

        let held_ms = self.raw_changed_ms.wrapping_sub(self.pressed_at_ms);
        Some(Release {
            held_ms,
            long: held_ms >= self.long_press_ms,
        })
    }
}
