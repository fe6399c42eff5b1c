//! Input and feedback events
//!
//! `InputEvents` flows into the controller once per tick; `Feedback`
//! flows out to the frontend as a one-shot notification.

/// Decoded user input for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InputEvents {
    /// Whole detents turned since the last poll (positive = clockwise)
    pub steps: i32,
    /// Button was released after a debounced press
    pub click: bool,
    /// The released press was held at least the long-press threshold
    ///
    /// Always accompanied by `click`.
    pub long_press: bool,
}

impl InputEvents {
    /// No input this tick
    pub const NONE: Self = Self {
        steps: 0,
        click: false,
        long_press: false,
    };

    /// Rotation only
    pub const fn turn(steps: i32) -> Self {
        Self {
            steps,
            click: false,
            long_press: false,
        }
    }

    /// Short press
    pub const fn click() -> Self {
        Self {
            steps: 0,
            click: true,
            long_press: false,
        }
    }

    /// Long press (reported together with a click)
    pub const fn long_press() -> Self {
        Self {
            steps: 0,
            click: true,
            long_press: true,
        }
    }

    /// Anything happened this tick
    pub fn is_empty(&self) -> bool {
        self.steps == 0 && !self.click && !self.long_press
    }
}

/// Audible notification requested by a state transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Feedback {
    /// Menu selection or setting changed
    Select,
    /// Action refused (e.g. run start with no plate selected)
    Reject,
    /// Run aborted or left
    Acknowledge,
    /// Run finished
    Complete,
    /// Cooling test started
    CoolingTestStart,
    /// Cooling test finished
    CoolingTestDone,
    /// A plate was already hot at power-on
    HotPlateWarning,
}

/// Buzzer tone description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tone {
    /// Frequency (Hz)
    pub freq_hz: u16,
    /// Length of one beep (ms)
    pub duration_ms: u16,
    /// Number of beeps
    pub repeats: u8,
}

impl Feedback {
    /// Stock tone for this notification
    pub fn tone(self) -> Tone {
        let (freq_hz, duration_ms, repeats) = match self {
            Feedback::Select => (1500, 60, 1),
            Feedback::Reject => (800, 200, 1),
            Feedback::Acknowledge => (1200, 80, 1),
            Feedback::Complete => (600, 2000, 1),
            Feedback::CoolingTestStart => (1500, 200, 1),
            Feedback::CoolingTestDone => (600, 1000, 1),
            Feedback::HotPlateWarning => (800, 100, 3),
        };
        Tone {
            freq_hz,
            duration_ms,
            repeats,
        }
    }
}
