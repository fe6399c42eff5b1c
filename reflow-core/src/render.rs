//! Read-only snapshot handed to the display each tick

use crate::state::{MenuItem, ModeKind, SetupField};
use crate::traits::{HeatSelection, CHANNEL_COUNT};

/// Fan status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FanStatus {
    /// Manual fan mode is active
    pub manual: bool,
    pub on: bool,
    pub duty_pct: u8,
}

/// What a run is following
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunKind {
    Profile { index: u8, name: &'static str },
    Constant,
}

/// Progress of a profile or constant run
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RunStatus {
    pub kind: RunKind,
    pub elapsed_s: u16,
    pub remaining_s: u16,
    /// Current setpoint (°C)
    pub setpoint_c: f32,
    pub done: bool,
    pub aborted: bool,
    /// Profile cooling mode is active
    pub cooling: bool,
}

/// Cooling test progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CoolingTestPhase {
    /// Driving both plates to the reference temperature
    Heating,
    /// Heat released, fan on
    Cooling,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CoolingTestStatus {
    pub phase: CoolingTestPhase,
    /// Hottest plate when cooling began (°C)
    pub start_c: f32,
    /// Time since cooling began (s)
    pub elapsed_s: u32,
    /// Latest logged cooling rate (°C/min)
    pub rate_c_per_min: f32,
}

/// Mode-specific part of the snapshot
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Detail {
    #[default]
    None,
    ProfileSetup {
        index: u8,
        name: &'static str,
    },
    ConstantSetup {
        setpoint_c: i16,
        duration_s: u16,
        field: SetupField,
    },
    Run(RunStatus),
    Test {
        duty_pct: u8,
    },
    CoolingTest(CoolingTestStatus),
}

/// Station snapshot for one tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RenderState {
    pub mode: ModeKind,
    /// Highlighted main-menu entry
    pub menu_item: MenuItem,
    /// Calibrated, smoothed plate temperatures (°C)
    pub temperatures_c: [f32; CHANNEL_COUNT],
    /// Commanded duty per channel (%)
    pub duty_pct: [u8; CHANNEL_COUNT],
    /// SSR output state per channel
    pub heater_on: [bool; CHANNEL_COUNT],
    pub selection: HeatSelection,
    pub fan: FanStatus,
    pub detail: Detail,
}

impl RenderState {
    /// Hottest plate (°C)
    pub fn max_temperature(&self) -> f32 {
        self.temperatures_c[0].max(self.temperatures_c[1])
    }
}
