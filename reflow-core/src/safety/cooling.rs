//! Cooling-mode hysteresis for profile runs
//!
//! A profile enters cooling mode when its setpoint starts to fall. While
//! cooling, the heaters are held off (ceiling 0, reset once on entry) until
//! the hottest plate has dropped a margin below the setpoint.

use crate::config::CoolingConfig;

/// What the regulator should do this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CoolingAction {
    /// Just entered cooling: reset the regulator and set its ceiling to 0
    Disable,
    /// Still cooling: leave the regulator off
    Hold,
    /// Run closed-loop control with this output ceiling (%)
    Regulate { max_output_pct: u8 },
}

/// Result of one monitor update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CoolingDecision {
    pub action: CoolingAction,
    /// Cooling mode was entered this tick
    pub entered: bool,
    /// Cooling mode was left this tick
    pub exited: bool,
}

/// Cooling-mode tracker
#[derive(Debug, Clone)]
pub struct CoolingMonitor {
    config: CoolingConfig,
    active: bool,
    reset_done: bool,
    last_setpoint: Option<f32>,
}

impl CoolingMonitor {
    pub fn new(config: CoolingConfig) -> Self {
        Self {
            config,
            active: false,
            reset_done: false,
            last_setpoint: None,
        }
    }

    /// Forget all run state (call when a run starts or ends)
    pub fn clear(&mut self) {
        self.active = false;
        self.reset_done = false;
        self.last_setpoint = None;
    }

    /// Cooling mode is active
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Setpoint seen on the previous tick
    pub fn last_setpoint(&self) -> Option<f32> {
        self.last_setpoint
    }

    /// Evaluate one tick
    ///
    /// # Arguments
    /// - `setpoint`: this tick's setpoint (°C)
    /// - `max_temp`: hottest plate (°C)
    /// - `in_cooling_phase`: run time has reached the profile's cooling slot
    /// - `full_ceiling_pct`: ceiling used when nothing restricts it (%)
    pub fn update(
        &mut self,
        setpoint: f32,
        max_temp: f32,
        in_cooling_phase: bool,
        full_ceiling_pct: u8,
    ) -> CoolingDecision {
        let mut entered = false;
        let mut exited = false;

        if let Some(last) = self.last_setpoint {
            if setpoint < last - self.config.entry_margin_c && !self.active {
                self.active = true;
                self.reset_done = false;
                entered = true;
            }
        }

        if self.active && max_temp < setpoint - self.config.exit_margin_c {
            self.active = false;
            exited = true;
        }

        self.last_setpoint = Some(setpoint);

        let action = if self.active {
            if self.reset_done {
                CoolingAction::Hold
            } else {
                self.reset_done = true;
                CoolingAction::Disable
            }
        } else {
            self.reset_done = false;
            let approaching = max_temp > setpoint - self.config.approach_margin_c;
            let max_output_pct = if approaching && !in_cooling_phase {
                self.config.approach_ceiling_pct.min(full_ceiling_pct)
            } else {
                full_ceiling_pct
            };
            CoolingAction::Regulate { max_output_pct }
        };

        CoolingDecision {
            action,
            entered,
            exited,
        }
    }
}
