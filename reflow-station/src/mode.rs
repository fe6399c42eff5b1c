//! Controller mode with per-mode data
//!
//! Each variant carries only the data that belongs to it, so a profile
//! index cannot outlive profile setup and run flags cannot leak into
//! the menu.

use reflow_core::config::Profile;
use reflow_core::profile::RunContext;
use reflow_core::state::{ModeKind, SetupField};

use crate::cooling_test::CoolingTest;

/// A profile run in progress (or finished, awaiting a click)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProfileRun {
    /// Index into the profile table
    pub index: u8,
    pub context: RunContext,
    /// Setpoint of the latest tick (°C)
    pub setpoint_c: f32,
    /// Whole seconds into the run at the latest tick
    pub elapsed_s: u16,
    pub done: bool,
    pub aborted: bool,
}

impl ProfileRun {
    pub fn begin(index: u8, profile: &'static Profile, now_ms: u32) -> Self {
        let context = RunContext::begin(profile, now_ms);
        Self {
            index,
            setpoint_c: context.setpoint_at(0),
            context,
            elapsed_s: 0,
            done: false,
            aborted: false,
        }
    }

    /// Still regulating
    pub fn is_active(&self) -> bool {
        !self.done && !self.aborted
    }

    pub fn remaining_s(&self) -> u16 {
        self.context.duration_s().saturating_sub(self.elapsed_s)
    }
}

/// A constant-temperature run
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConstantRun {
    pub setpoint_c: f32,
    pub duration_s: u16,
    pub start_ms: u32,
    pub elapsed_s: u16,
    pub done: bool,
    pub aborted: bool,
}

impl ConstantRun {
    pub fn begin(setpoint_c: f32, duration_s: u16, now_ms: u32) -> Self {
        Self {
            setpoint_c,
            duration_s,
            start_ms: now_ms,
            elapsed_s: 0,
            done: false,
            aborted: false,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.done && !self.aborted
    }

    /// Refresh the elapsed time; returns true once the duration is reached
    pub fn advance(&mut self, now_ms: u32) -> bool {
        let elapsed = now_ms.wrapping_sub(self.start_ms) / 1000;
        self.elapsed_s = elapsed.min(self.duration_s as u32) as u16;
        elapsed >= self.duration_s as u32
    }

    pub fn remaining_s(&self) -> u16 {
        self.duration_s.saturating_sub(self.elapsed_s)
    }
}

/// Active controller mode
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    Menu,
    ProfileSetup {
        index: u8,
    },
    ConstantSetup {
        setpoint_c: i16,
        duration_s: u16,
        field: SetupField,
    },
    ProfileRun(ProfileRun),
    ConstantRun(ConstantRun),
    TestRun {
        duty_pct: u8,
    },
    CoolingTest(CoolingTest),
}

impl Mode {
    /// Data-free discriminant
    pub fn kind(&self) -> ModeKind {
        match self {
            Mode::Menu => ModeKind::Menu,
            Mode::ProfileSetup { .. } => ModeKind::ProfileSetup,
            Mode::ConstantSetup { .. } => ModeKind::ConstantSetup,
            Mode::ProfileRun(_) => ModeKind::ProfileRun,
            Mode::ConstantRun(_) => ModeKind::ConstantRun,
            Mode::TestRun { .. } => ModeKind::TestRun,
            Mode::CoolingTest(_) => ModeKind::CoolingTest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reflow_core::config::PROFILES;

    #[test]
    fn test_constant_run_finishes_at_duration() {
        let mut run = ConstantRun::begin(150.0, 60, 1_000);
        assert!(!run.advance(59_999));
        assert_eq!(run.elapsed_s, 58);
        assert_eq!(run.remaining_s(), 2);
        assert!(run.advance(61_000));
        assert_eq!(run.remaining_s(), 0);
    }

    #[test]
    fn test_constant_run_timer_wrap() {
        let start = u32::MAX - 5_000;
        let mut run = ConstantRun::begin(100.0, 30, start);
        assert!(!run.advance(start.wrapping_add(10_000)));
        assert_eq!(run.elapsed_s, 10);
    }

    #[test]
    fn test_profile_run_starts_at_floor() {
        let profile = &PROFILES[1];
        let run = ProfileRun::begin(1, profile, 0);
        assert!(run.is_active());
        assert_eq!(run.setpoint_c, profile.min_temp_c as f32);
        assert_eq!(run.remaining_s(), profile.duration_s());
        assert_eq!(Mode::ProfileRun(run).kind(), ModeKind::ProfileRun);
    }
}
