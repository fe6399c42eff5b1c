//! Configuration type definitions
//!
//! Every timing threshold and temperature margin used by the station is a
//! named field here. Components receive their config at construction, so
//! nothing is re-derived or hardcoded at call sites.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// PID gain set
///
/// Replaced wholesale between modes; never mutated during a run.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PidGains {
    /// Proportional gain (% per °C)
    pub p: f32,
    /// Integral gain (% per °C·s)
    pub i: f32,
    /// Derivative gain (% per °C/s)
    pub d: f32,
    /// Integral clamp magnitude (°C·s)
    pub i_max: f32,
}

impl PidGains {
    /// Conservative power-on gains
    pub const DEFAULT: Self = Self::new(6.0, 0.15, 3.0, 150.0);
    /// Gains for profile runs (slow ramps, strong damping)
    pub const PROFILE: Self = Self::new(3.0, 0.13, 8.0, 150.0);
    /// Gains for constant-temperature runs
    pub const CONSTANT: Self = Self::new(10.0, 0.1, 100.0, 150.0);
    /// Gains for the cooling characterization heat-up
    pub const COOLING_TEST: Self = Self::new(6.0, 0.15, 8.0, 150.0);

    /// Create a gain set
    pub const fn new(p: f32, i: f32, d: f32, i_max: f32) -> Self {
        Self { p, i, d, i_max }
    }
}

impl Default for PidGains {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Gain sets applied by the station per run type
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GainSchedule {
    pub profile: PidGains,
    pub constant: PidGains,
    pub cooling_test: PidGains,
}

impl Default for GainSchedule {
    fn default() -> Self {
        Self {
            profile: PidGains::PROFILE,
            constant: PidGains::CONSTANT,
            cooling_test: PidGains::COOLING_TEST,
        }
    }
}

/// Heater regulator configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RegulatorConfig {
    /// Initial PID gains
    pub gains: PidGains,
    /// Time-proportioning window (ms)
    ///
    /// The SSR is on for `duty% × window` at the start of each window.
    pub window_ms: u32,
    /// Default output ceiling (%)
    ///
    /// Runtime-adjustable safety cap; the SSRs are never run at 100%.
    pub max_output_pct: u8,
    /// Output level treated as saturated for anti-windup (%)
    pub saturation_pct: f32,
    /// Substitute dt when the clock did not advance (s)
    pub dt_epsilon_s: f32,
    /// Largest dt accepted as genuine (s); larger values imply a timer wrap
    pub max_dt_s: f32,
    /// Band below setpoint in which no heat is added (°C)
    pub cooling_band_c: f32,
    /// Setpoint drop that clears PID state on all channels (°C)
    pub bumpless_threshold_c: f32,
}

impl Default for RegulatorConfig {
    fn default() -> Self {
        Self {
            gains: PidGains::DEFAULT,
            window_ms: 1000,
            max_output_pct: 90,
            saturation_pct: 100.0,
            dt_epsilon_s: 0.001,
            max_dt_s: 10.0,
            cooling_band_c: 0.5,
            bumpless_threshold_c: 0.5,
        }
    }
}

/// Which leg of the divider the thermistor sits in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DividerTopology {
    /// Vref ── NTC ──●── R_series ── GND (ADC at ●)
    #[default]
    NtcToSupply,
    /// Vref ── R_series ──●── NTC ── GND (ADC at ●)
    NtcToGround,
}

/// NTC thermistor and divider parameters
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ThermistorConfig {
    /// Resistance at the nominal temperature (Ω)
    pub nominal_ohms: f32,
    /// Nominal temperature (°C)
    pub nominal_temp_c: f32,
    /// Beta coefficient (K)
    pub beta: f32,
    /// Fixed divider resistor (Ω)
    pub series_ohms: f32,
    /// Divider wiring
    pub topology: DividerTopology,
}

impl Default for ThermistorConfig {
    fn default() -> Self {
        Self {
            nominal_ohms: 100_000.0,
            nominal_temp_c: 25.0,
            beta: 3950.0,
            series_ohms: 6_800.0,
            topology: DividerTopology::NtcToSupply,
        }
    }
}

/// Temperature estimator configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SensorConfig {
    /// Thermistor and divider
    pub thermistor: ThermistorConfig,
    /// ADC reference voltage (V)
    pub vref_v: f32,
    /// Full-scale ADC count (4095 for 12-bit)
    pub adc_max: u16,
    /// Raw samples averaged per channel per update
    pub oversample: u8,
    /// Raw samples averaged for room-temperature calibration
    pub calibration_samples: u8,
    /// Lowest plausible temperature (°C)
    pub min_plausible_c: f32,
    /// Highest plausible temperature (°C)
    pub max_plausible_c: f32,
    /// EMA weight of the newest sample (0-1)
    pub smoothing_alpha: f32,
    /// Reported temperature before the first valid sample (°C)
    pub initial_c: f32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            thermistor: ThermistorConfig::default(),
            vref_v: 3.30,
            adc_max: 4095,
            oversample: 32,
            calibration_samples: 32,
            min_plausible_c: -40.0,
            max_plausible_c: 350.0,
            smoothing_alpha: 0.15,
            initial_c: 25.0,
        }
    }
}

/// Encoder and button configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InputConfig {
    /// Quarter-step transitions per mechanical detent
    pub quarter_steps_per_detent: i32,
    /// A raw button change must persist longer than this (ms)
    pub debounce_ms: u32,
    /// Presses at least this long are long presses (ms)
    pub long_press_ms: u32,
    /// Button pulls the line low when pressed
    pub button_active_low: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            quarter_steps_per_detent: 4,
            debounce_ms: 100,
            long_press_ms: 1000,
            button_active_low: true,
        }
    }
}

/// Cooling-mode hysteresis during profile runs
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CoolingConfig {
    /// Setpoint drop per tick that enters cooling mode (°C)
    pub entry_margin_c: f32,
    /// Hottest plate must fall this far below setpoint to leave cooling mode (°C)
    pub exit_margin_c: f32,
    /// Within this distance of setpoint the ceiling is reduced (°C)
    pub approach_margin_c: f32,
    /// Output ceiling while approaching setpoint outside the cooling phase (%)
    pub approach_ceiling_pct: u8,
}

impl Default for CoolingConfig {
    fn default() -> Self {
        Self {
            entry_margin_c: 0.5,
            exit_margin_c: 3.0,
            approach_margin_c: 5.0,
            approach_ceiling_pct: 50,
        }
    }
}

/// Fan switching thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FanConfig {
    /// Cooling mode: fan on above this (°C)
    pub cooling_high_c: f32,
    /// Cooling mode: fan on above this as well (°C)
    pub cooling_low_c: f32,
    /// Past the cooling-phase start: fan on when this far above setpoint (°C)
    pub phase_overshoot_c: f32,
    /// Profile run: fan off below this (°C)
    pub off_c: f32,
    /// Fan forced on above this in every mode, manual or not (°C)
    pub safety_c: f32,
    /// Menu with automatic fan: fan off below this (°C)
    pub menu_off_c: f32,
    /// Constant run: fan on when this far above setpoint (°C)
    pub constant_tolerance_c: f32,
}

impl Default for FanConfig {
    fn default() -> Self {
        Self {
            cooling_high_c: 80.0,
            cooling_low_c: 60.0,
            phase_overshoot_c: 2.0,
            off_c: 50.0,
            safety_c: 80.0,
            menu_off_c: 35.0,
            constant_tolerance_c: 5.0,
        }
    }
}

/// Encoder-adjustable setup ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SetupLimits {
    /// Constant setpoint range (°C)
    pub setpoint_min_c: i16,
    pub setpoint_max_c: i16,
    /// Setpoint change per detent (°C)
    pub setpoint_step_c: i16,
    /// Setpoint offered when entering setup (°C)
    pub setpoint_default_c: i16,
    /// Constant run duration range (s)
    pub duration_min_s: u16,
    pub duration_max_s: u16,
    /// Duration change per detent (s)
    pub duration_step_s: u16,
    /// Duration offered when entering setup (s)
    pub duration_default_s: u16,
    /// Test-mode duty change per detent (%)
    pub test_duty_step_pct: u8,
}

impl Default for SetupLimits {
    fn default() -> Self {
        Self {
            setpoint_min_c: 0,
            setpoint_max_c: 220,
            setpoint_step_c: 1,
            setpoint_default_c: 150,
            duration_min_s: 30,
            duration_max_s: 3600,
            duration_step_s: 30,
            duration_default_s: 300,
            test_duty_step_pct: 5,
        }
    }
}

/// Cooling characterization routine
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CoolingTestConfig {
    /// Both plates are driven to this before heat is released (°C)
    pub reference_c: f32,
    /// Routine ends once the hottest plate is below this (°C)
    pub release_c: f32,
    /// Interval between logged samples (ms)
    pub log_interval_ms: u32,
}

impl Default for CoolingTestConfig {
    fn default() -> Self {
        Self {
            reference_c: 200.0,
            release_c: 40.0,
            log_interval_ms: 30_000,
        }
    }
}

/// Power-on checks
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BootConfig {
    /// Estimator updates before any decision is made
    pub priming_samples: u8,
    /// Self-calibrate only if the mean plate temperature is above this (°C)
    pub calibration_min_c: f32,
    /// ...and below this (°C)
    pub calibration_max_c: f32,
    /// Room temperature assumed for self-calibration (°C)
    pub calibration_reference_c: f32,
    /// Warn and start the fan if a plate is hotter than this (°C)
    pub hot_plate_c: f32,
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            priming_samples: 20,
            calibration_min_c: 20.0,
            calibration_max_c: 30.0,
            calibration_reference_c: 23.5,
            hot_plate_c: 40.0,
        }
    }
}

/// Station controller configuration
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StationConfig {
    pub gains: GainSchedule,
    pub cooling: CoolingConfig,
    pub fan: FanConfig,
    pub setup: SetupLimits,
    pub cooling_test: CoolingTestConfig,
    pub boot: BootConfig,
}
