//! Piecewise-linear setpoint generation for profile runs

use crate::config::Profile;

/// Setpoint produced for one control tick
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Setpoint {
    /// Target temperature (°C)
    pub celsius: f32,
    /// Run time has passed the last waypoint
    pub finished: bool,
}

/// Snapshot of a profile run
///
/// Created when a run begins; duration and cooling-phase start are
/// derived once here and never change for the run's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RunContext {
    profile: &'static Profile,
    start_ms: u32,
    duration_s: u16,
    cooling_start_s: u16,
}

impl RunContext {
    /// Start a run of `profile` at `now_ms`
    pub fn begin(profile: &'static Profile, now_ms: u32) -> Self {
        Self {
            profile,
            start_ms: now_ms,
            duration_s: profile.duration_s(),
            cooling_start_s: profile.cooling_start_s(),
        }
    }

    /// Profile being run
    pub fn profile(&self) -> &'static Profile {
        self.profile
    }

    /// Run start timestamp (ms)
    pub fn start_ms(&self) -> u32 {
        self.start_ms
    }

    /// Total run duration (s)
    pub fn duration_s(&self) -> u16 {
        self.duration_s
    }

    /// Offset where the profile's declared cooling phase begins (s)
    pub fn cooling_start_s(&self) -> u16 {
        self.cooling_start_s
    }

    /// Whole seconds since start, not clamped
    fn raw_elapsed_s(&self, now_ms: u32) -> u32 {
        now_ms.wrapping_sub(self.start_ms) / 1000
    }

    /// Whole seconds since start, clamped to the duration
    pub fn elapsed_s(&self, now_ms: u32) -> u16 {
        self.raw_elapsed_s(now_ms).min(self.duration_s as u32) as u16
    }

    /// Seconds left in the run
    pub fn remaining_s(&self, now_ms: u32) -> u16 {
        self.duration_s - self.elapsed_s(now_ms)
    }

    /// Run time has reached the declared cooling phase
    pub fn in_cooling_phase(&self, now_ms: u32) -> bool {
        self.elapsed_s(now_ms) >= self.cooling_start_s
    }

    /// Setpoint for the current tick
    ///
    /// Once elapsed time passes the duration, `finished` is set and the
    /// value is evaluated one second before the end.
    pub fn advance(&self, now_ms: u32) -> Setpoint {
        let raw = self.raw_elapsed_s(now_ms);
        let finished = raw > self.duration_s as u32;
        let sec = if finished {
            self.duration_s.saturating_sub(1)
        } else {
            raw as u16
        };

        Setpoint {
            celsius: self.setpoint_at(sec),
            finished,
        }
    }

    /// Interpolated profile temperature at `sec` seconds into the run
    pub fn setpoint_at(&self, sec: u16) -> f32 {
        let mut prev_temp = self.profile.min_temp_c as f32;
        let mut prev_time: u16 = 0;

        for slot in self.profile.slots {
            let temp = slot.temp_c as f32;
            if sec <= slot.time_s {
                let span = slot.time_s - prev_time;
                if span == 0 {
                    return temp;
                }
                let frac = (sec - prev_time) as f32 / span as f32;
                return prev_temp + frac * (temp - prev_temp);
            }
            prev_temp = temp;
            prev_time = slot.time_s;
        }

        prev_temp
    }
}
