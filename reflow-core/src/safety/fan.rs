//! Fan arbitration
//!
//! Pure decision functions; the controller owns the fan and applies the
//! result. Manual fan mode suppresses every automatic rule except the
//! high-temperature safety override.

use crate::config::FanConfig;

/// Why the fan is being switched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FanReason {
    /// Cooling mode with a hot plate
    CoolingHot,
    /// Past the profile's cooling slot and above setpoint
    PhaseOvershoot,
    /// Cooling mode above the lower threshold
    CoolingMode,
    /// Plates are cool enough
    Cooled,
    /// Constant run above setpoint
    ConstantOvershoot,
    /// Constant run back at setpoint
    ConstantSettled,
    /// Absolute temperature ceiling exceeded
    Safety,
}

/// Fan command for this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FanDecision {
    On(FanReason),
    Off(FanReason),
    /// Leave the fan as it is
    Keep,
}

impl FanDecision {
    /// Requested fan state, if any
    pub fn target(&self) -> Option<bool> {
        match self {
            FanDecision::On(_) => Some(true),
            FanDecision::Off(_) => Some(false),
            FanDecision::Keep => None,
        }
    }
}

/// Fan rules for each mode
#[derive(Debug, Clone, Copy)]
pub struct FanArbiter {
    config: FanConfig,
}

impl FanArbiter {
    pub fn new(config: FanConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FanConfig {
        &self.config
    }

    /// Profile run, automatic fan
    pub fn profile_run(
        &self,
        cooling_mode: bool,
        in_cooling_phase: bool,
        max_temp: f32,
        setpoint: f32,
    ) -> FanDecision {
        let c = &self.config;
        if cooling_mode && max_temp > c.cooling_high_c {
            FanDecision::On(FanReason::CoolingHot)
        } else if in_cooling_phase && max_temp > setpoint + c.phase_overshoot_c {
            FanDecision::On(FanReason::PhaseOvershoot)
        } else if cooling_mode && max_temp > c.cooling_low_c {
            FanDecision::On(FanReason::CoolingMode)
        } else if max_temp < c.off_c {
            FanDecision::Off(FanReason::Cooled)
        } else {
            FanDecision::Keep
        }
    }

    /// Constant run, automatic fan
    pub fn constant_run(&self, max_temp: f32, setpoint: f32) -> FanDecision {
        if max_temp > setpoint + self.config.constant_tolerance_c {
            FanDecision::On(FanReason::ConstantOvershoot)
        } else if max_temp <= setpoint {
            FanDecision::Off(FanReason::ConstantSettled)
        } else {
            FanDecision::Keep
        }
    }

    /// Menu, automatic fan: only ever switches off
    pub fn menu(&self, max_temp: f32) -> FanDecision {
        if max_temp < self.config.menu_off_c {
            FanDecision::Off(FanReason::Cooled)
        } else {
            FanDecision::Keep
        }
    }

    /// Safety override, every mode, manual or not
    pub fn safety(&self, max_temp: f32) -> FanDecision {
        if max_temp >= self.config.safety_c {
            FanDecision::On(FanReason::Safety)
        } else {
            FanDecision::Keep
        }
    }
}
